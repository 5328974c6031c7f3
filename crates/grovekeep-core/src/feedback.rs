use crate::id::NodeId;

/// Fire-and-forget hook for haptics and audio on a successful unlock.
/// Nothing it does feeds back into the progression state.
pub trait FeedbackSink {
    fn on_unlock(&mut self, node: &NodeId, level: u32);
}

impl<F> FeedbackSink for F
where
    F: FnMut(&NodeId, u32),
{
    fn on_unlock(&mut self, node: &NodeId, level: u32) {
        self(node, level)
    }
}
