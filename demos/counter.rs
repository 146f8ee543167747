//! Counter driven by actions, with write failures reported on a channel

use std::sync::Arc;

use stashcan::{Action, MemoryStorage, StoreOptions, StoredReducer};
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

fn counter(state: Option<&i64>, action: Action) -> Option<i64> {
    let count = state.copied().unwrap_or(0);
    match action.kind.as_str() {
        "increment" => Some(count + action.payload_as::<i64>().unwrap_or(1)),
        "decrement" => Some(count - action.payload_as::<i64>().unwrap_or(1)),
        "reset" => Some(0),
        _ => Some(count),
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> stashcan::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    println!("=== Stored Counter ===\n");

    let storage = Arc::new(MemoryStorage::new());
    let (reports, mut rx) = mpsc::unbounded_channel();

    let count = StoredReducer::open_with(
        storage.clone(),
        "counter",
        counter,
        Some(0),
        StoreOptions::with_reports(reports),
    )?;
    let _subscription = count.subscribe(|value| {
        println!("   [Count] {value:?}");
    });
    count.wait_loaded().await;

    println!("1. Dispatching actions");
    for action in [
        Action::new("increment", 5),
        Action::new("increment", 5),
        Action::bare("decrement"),
    ] {
        if let Some(write) = count.dispatch(action)? {
            write.wait().await?;
        }
    }

    println!("\n2. Dispatching the reserved load action");
    if let Err(e) = count.dispatch(Action::new("load", 1000)) {
        println!("   rejected: {e}");
    }

    println!("\n3. Persisted value: {:?}", storage.raw("counter"));

    println!("\n4. Storage reports");
    drop(count);
    while let Ok(report) = rx.try_recv() {
        println!("   {} {} ok={}", report.operation, report.key, report.is_ok());
    }

    Ok(())
}
