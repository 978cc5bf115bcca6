//! Minimal tour: load, subscribe, mutate, inspect, clear.

use larder_store::{EnumerableExt, EventName, MapExt, MetadataExt, Store};
use larder_storage::MemoryProvider;
use serde_json::json;
use std::sync::Arc;

#[tokio::main(flavor = "current_thread")]
async fn main() -> larder_core::LarderResult<()> {
    let provider = Arc::new(MemoryProvider::new());
    let mut store = Store::new("inventory", provider.clone())?;

    store.on(EventName::Added, |event| println!("-> {event:?}"))?;
    store.on(EventName::Modified, |event| println!("-> {event:?}"))?;

    store.load().await?;

    store.set("apples", json!({"count": 12, "origin": "orchard"}))?;
    store.set("pears", json!({"count": 4}))?;

    // Object sets are patches: `origin` survives the count update.
    let result = store.set("apples", json!({"count": 11}))?;
    println!("apples now: {}", result.value);

    store.metadata("pears")?.set(json!({"checked": true}))?;

    for key in store.keys()? {
        println!("{key}: {:?}", store.get(&key)?);
    }

    // Wait for durability before reading the provider directly.
    store.set("plums", json!({"count": 7}))?.receipt.wait().await;
    println!("persisted plums: {:?}", provider.item("inventory:plums"));

    store.clear().await?.wait().await;
    println!("cleared; {} items left in provider", provider.item_count());
    Ok(())
}
