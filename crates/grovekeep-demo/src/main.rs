//! Headless walkthrough of the three progression screens.
//!
//! ```text
//! grovekeep-demo [--data DIR] [--save DIR]
//! ```
//!
//! `--data` loads `research`, `skills` and `world_map` definitions from a
//! directory instead of the built-in ones. `--save` keeps progress on disk
//! between runs; without it everything lives in memory. Set `RUST_LOG` to
//! see the library's events (e.g. `RUST_LOG=grovekeep=debug`).

use grovekeep_core::event::ProgressionEvent;
use grovekeep_core::executor::UnlockResult;
use grovekeep_core::gate::PlayerLevel;
use grovekeep_core::id::NodeId;
use grovekeep_core::persist::{FileKeyValueStore, KeyValueStore, MemoryKeyValueStore};
use grovekeep_core::store::{ProgressionStore, StoreError};
use grovekeep_data::{DataLoadError, FeatureDefinition, builtin, load_feature_dir};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, thiserror::Error)]
enum DemoError {
    #[error("unknown argument '{0}'")]
    UnknownArgument(String),

    #[error("no built-in feature named '{0}'")]
    UnknownFeature(String),

    #[error("missing value for {0}")]
    MissingValue(&'static str),

    #[error(transparent)]
    Data(#[from] DataLoadError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Default)]
struct Options {
    data_dir: Option<PathBuf>,
    save_dir: Option<PathBuf>,
}

fn parse_args() -> Result<Options, DemoError> {
    let mut options = Options::default();
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--data" => {
                options.data_dir = Some(args.next().ok_or(DemoError::MissingValue("--data"))?.into())
            }
            "--save" => {
                options.save_dir = Some(args.next().ok_or(DemoError::MissingValue("--save"))?.into())
            }
            _ => return Err(DemoError::UnknownArgument(arg)),
        }
    }
    Ok(options)
}

fn definition(options: &Options, name: &str) -> Result<FeatureDefinition, DemoError> {
    let loaded = match &options.data_dir {
        Some(dir) => load_feature_dir(dir, name),
        None => match builtin::by_name(name) {
            Some(result) => result,
            None => return Err(DemoError::UnknownFeature(name.to_string())),
        },
    };
    Ok(loaded?)
}

fn open(options: &Options, name: &str) -> Result<ProgressionStore, DemoError> {
    let backend: Box<dyn KeyValueStore> = match &options.save_dir {
        Some(dir) => Box::new(FileKeyValueStore::new(dir)),
        None => Box::new(MemoryKeyValueStore::new()),
    };
    let mut store = definition(options, name)?.open_store(backend)?;

    let feature = name.to_string();
    store.subscribe(Box::new(move |event: &ProgressionEvent| match event {
        ProgressionEvent::NodeUnlocked { node, level, price } => {
            println!("  [{feature}] {node} -> level {level} for {price}")
        }
        ProgressionEvent::NodesRevealed { nodes } => {
            println!("  [{feature}] revealed {}", join(nodes))
        }
        ProgressionEvent::PersistFailed { reason } => {
            println!("  [{feature}] save failed: {reason}")
        }
        _ => {}
    }));
    store.set_feedback(|node: &NodeId, level: u32| {
        info!(target: "grovekeep_demo", node = %node, level, "feedback.haptic")
    });
    Ok(store)
}

fn join(ids: &[NodeId]) -> String {
    ids.iter().map(NodeId::as_str).collect::<Vec<_>>().join(", ")
}

fn attempt(store: &mut ProgressionStore, id: &str) {
    match store.request_unlock(id) {
        Ok(UnlockResult::NewLevel(_)) => {}
        Ok(UnlockResult::Rejected(reason)) => {
            println!("  [{}] {id} rejected: {reason:?}", store.feature())
        }
        Err(err) => println!("  [{}] {err}", store.feature()),
    }
}

fn print_board(store: &ProgressionStore) {
    let snapshot = store.snapshot();
    println!("{} (balance {})", snapshot.feature, snapshot.balance);
    for view in snapshot.nodes.iter().filter(|view| view.revealed) {
        let price = view
            .next_price
            .map_or_else(|| "-".to_string(), |price| price.to_string());
        println!(
            "  {:<16} {}/{}  next {:>6}  {:?}",
            view.id.as_str(),
            view.level,
            view.max_level,
            price,
            view.status
        );
    }
}

fn run(options: &Options) -> Result<(), DemoError> {
    println!("== research ==");
    let mut research = open(options, "research")?;
    research.credit(800);
    for id in ["repeater", "snow_pea", "wall_nut"] {
        attempt(&mut research, id);
    }
    print_board(&research);

    println!("== skills ==");
    let mut skills = open(options, "skills")?;
    skills.credit(600);
    for id in ["root_system", "root_system", "thick_bark", "thick_bark"] {
        attempt(&mut skills, id);
    }
    print_board(&skills);
    let summary = skills.reset();
    println!(
        "  reset {} nodes, refunded {}, balance {}",
        summary.nodes.len(),
        summary.refunded,
        summary.balance
    );

    println!("== world map ==");
    let player = PlayerLevel::new(2);
    let mut world = open(options, "world_map")?.with_gates(player.clone());
    world.credit(300);
    attempt(&mut world, "shady_grove");
    player.set(3);
    attempt(&mut world, "shady_grove");
    print_board(&world);

    for store in [&mut research, &mut skills, &mut world] {
        if let Err(err) = store.flush() {
            println!("  [{}] save still pending: {err}", store.feature());
        }
    }
    Ok(())
}

fn main() -> std::process::ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let result = parse_args().and_then(|options| run(&options));
    match result {
        Ok(()) => std::process::ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            std::process::ExitCode::FAILURE
        }
    }
}
