//! A third-party capability built against the store port.
//!
//! Exercises the extension contract end to end: a capability trait with
//! default method bodies over `StorePort`, a custom event registered
//! through the port, and the guarded entry views.

use larder_store::{
    EventName, LarderResult, MapExt, MemoryProvider, Store, StoreEvent, StorePort,
};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};

/// Tombstone capability: removing through it keeps a `{"deleted": true}`
/// marker instead of dropping the key, and announces it on a custom event.
trait TombstoneExt: StorePort {
    const EVENT: &'static str = "tombstoned";

    fn enable_tombstones(&mut self) {
        self.register_event(Self::EVENT);
    }

    fn bury(&mut self, key: &str) -> LarderResult<()> {
        let headstone = json!({"deleted": true});
        self.write(key, headstone.clone(), None)?;
        self.emit(&StoreEvent::Custom {
            name: Self::EVENT.to_string(),
            payload: json!({"key": key, "value": headstone}),
        })
    }

    fn buried(&self) -> LarderResult<Vec<String>> {
        Ok(self
            .entries()?
            .into_iter()
            .filter(|(_, value)| value.get("deleted") == Some(&Value::Bool(true)))
            .map(|(key, _)| key)
            .collect())
    }
}

impl<P: StorePort + ?Sized> TombstoneExt for P {}

#[tokio::test]
async fn capabilities_compose_through_the_port() {
    let provider = Arc::new(MemoryProvider::new());
    let mut store = Store::new("graveyard", provider).unwrap();
    store.enable_tombstones();

    let announced = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&announced);
    store
        .on(EventName::Custom("tombstoned".to_string()), move |event| {
            if let StoreEvent::Custom { payload, .. } = event {
                sink.lock().unwrap().push(payload.clone());
            }
        })
        .unwrap();

    store.load().await.unwrap();
    store.set("alice", json!({"name": "alice"})).unwrap();
    store.set("bob", json!({"name": "bob"})).unwrap();

    store.bury("bob").unwrap();

    assert_eq!(store.buried().unwrap(), vec!["bob".to_string()]);
    assert_eq!(
        *announced.lock().unwrap(),
        vec![json!({"key": "bob", "value": {"deleted": true}})]
    );
}

#[tokio::test]
async fn port_views_are_initialization_gated() {
    let provider = Arc::new(MemoryProvider::new());
    let mut store = Store::new("graveyard", provider).unwrap();

    // The guarded entry view enforces the check itself, so capability
    // code cannot sidestep the lifecycle.
    assert!(store.buried().is_err());
    assert!(store.bury("alice").is_err());

    store.load().await.unwrap();
    assert!(store.buried().unwrap().is_empty());
}
