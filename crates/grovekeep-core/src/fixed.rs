use fixed::types::I32F32;

/// Q32.32 fixed-point: 32 integer bits, 32 fractional bits. Used for growth
/// multipliers so repeated purchases price identically on every device.
pub type Fixed64 = I32F32;

/// Convert an f64 to Fixed64. Use only for initialization (data loading).
#[inline]
pub fn f64_to_fixed64(v: f64) -> Fixed64 {
    Fixed64::saturating_from_num(v)
}

/// Convert Fixed64 to f64. Use only for display.
#[inline]
pub fn fixed64_to_f64(v: Fixed64) -> f64 {
    v.to_num::<f64>()
}

/// Multiply a price by a fixed-point factor, rounding down.
///
/// Computed on the raw Q32.32 bits in 128-bit integer space, so prices far
/// beyond the Fixed64 integer range scale without overflow. Non-positive
/// factors yield 0; results clamp to `u64::MAX`.
pub fn scale_price(price: u64, factor: Fixed64) -> u64 {
    let bits = factor.to_bits();
    if bits <= 0 {
        return 0;
    }
    let scaled = (u128::from(price) * bits as u128) >> I32F32::FRAC_NBITS;
    u64::try_from(scaled).unwrap_or(u64::MAX)
}
