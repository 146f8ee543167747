//! Shopping cart that survives restarts, backed by files on disk
//!
//! Run twice to see the cart reload:
//! `RUST_LOG=stashcan=debug cargo run --example cart -- /tmp/cart-demo`

use std::sync::Arc;

use stashcan::storage::{Backend, StorageConfig};
use stashcan::StoredState;
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> stashcan::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let dir = std::env::args()
        .nth(1)
        .unwrap_or_else(|| std::env::temp_dir().join("stashcan-cart").display().to_string());

    println!("=== Persistent Cart ===\n");

    let config = StorageConfig {
        backend: Backend::File { dir: dir.into() },
        namespace: Some("shop".to_string()),
    };
    let storage = config.build();

    let cart = StoredState::open(Arc::clone(&storage), "cart", Some(Vec::<String>::new()))?;
    let _subscription = cart.subscribe(|items| {
        println!("   [Cart] {:?}", items.map(Vec::as_slice).unwrap_or(&[]));
    });

    println!("1. Loading cart");
    cart.wait_loaded().await;

    println!("\n2. Adding an item");
    let mut items = cart.value().unwrap_or_default();
    items.push(format!("item #{}", items.len() + 1));
    cart.write(items)?.wait().await?;

    if cart.with(|items| items.map_or(0, Vec::len)) >= 3 {
        println!("\n3. Cart is full, emptying it");
        cart.remove().wait().await?;
    }

    println!("\nDone. Run again to watch the cart reload.");
    Ok(())
}
