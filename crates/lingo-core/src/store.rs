//! Seams to the extension host: the settings store and the auth gate.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use async_trait::async_trait;
use serde_json::Value;

use crate::settings::Settings;

/// Key-value settings storage with change notifications.
#[async_trait(?Send)]
pub trait SettingsStore {
    /// Dropping the subscription stops notifications.
    type Subscription;

    /// Current settings. Never fails: unreadable storage yields empty settings.
    async fn load(&self) -> Settings;

    /// Call `on_change` whenever stored settings change.
    fn subscribe(&self, on_change: Rc<dyn Fn()>) -> Self::Subscription;
}

/// Answers whether the current user may use the enhancer.
pub trait AuthGate {
    fn is_authenticated(&self) -> bool;
    fn user_email(&self) -> Option<String>;
}

type Listeners = RefCell<Vec<(u64, Rc<dyn Fn()>)>>;

/// In-process store holding a raw JSON settings object.
#[derive(Clone, Default)]
pub struct MemoryStore {
    value: Rc<RefCell<Value>>,
    listeners: Rc<Listeners>,
    next_id: Rc<RefCell<u64>>,
}

impl MemoryStore {
    pub fn new(value: Value) -> Self {
        Self {
            value: Rc::new(RefCell::new(value)),
            ..Default::default()
        }
    }

    /// Replace the stored object and notify subscribers.
    pub fn set(&self, value: Value) {
        *self.value.borrow_mut() = value;
        // Clone out so listeners may subscribe or unsubscribe re-entrantly.
        let listeners: Vec<_> = self
            .listeners
            .borrow()
            .iter()
            .map(|(_, f)| f.clone())
            .collect();
        for listener in listeners {
            listener();
        }
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.borrow().len()
    }
}

/// Subscription guard for [`MemoryStore`].
pub struct MemorySubscription {
    id: u64,
    listeners: Weak<Listeners>,
}

impl Drop for MemorySubscription {
    fn drop(&mut self) {
        if let Some(listeners) = self.listeners.upgrade() {
            listeners.borrow_mut().retain(|(id, _)| *id != self.id);
        }
    }
}

#[async_trait(?Send)]
impl SettingsStore for MemoryStore {
    type Subscription = MemorySubscription;

    async fn load(&self) -> Settings {
        Settings::from_json_or_default(self.value.borrow().clone())
    }

    fn subscribe(&self, on_change: Rc<dyn Fn()>) -> MemorySubscription {
        let id = {
            let mut next = self.next_id.borrow_mut();
            *next += 1;
            *next
        };
        self.listeners.borrow_mut().push((id, on_change));
        MemorySubscription {
            id,
            listeners: Rc::downgrade(&self.listeners),
        }
    }
}

/// Fixed answer, for hosts that authenticate elsewhere and for tests.
#[derive(Debug, Clone, Default)]
pub struct StaticAuth {
    pub email: Option<String>,
}

impl AuthGate for StaticAuth {
    fn is_authenticated(&self) -> bool {
        self.email.is_some()
    }

    fn user_email(&self) -> Option<String> {
        self.email.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::cell::Cell;

    #[test]
    fn test_load_falls_back_to_empty() {
        let store = MemoryStore::new(json!(["not", "an", "object"]));
        assert_eq!(pollster::block_on(store.load()), Settings::default());
    }

    #[test]
    fn test_subscription_notifies_until_dropped() {
        let store = MemoryStore::new(json!({}));
        let hits = Rc::new(Cell::new(0));
        let counter = hits.clone();
        let sub = store.subscribe(Rc::new(move || counter.set(counter.get() + 1)));

        store.set(json!({ "enabled": true }));
        assert_eq!(hits.get(), 1);
        assert!(pollster::block_on(store.load()).enabled);

        drop(sub);
        assert_eq!(store.listener_count(), 0);
        store.set(json!({}));
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn test_static_auth() {
        assert!(!StaticAuth::default().is_authenticated());
        let auth = StaticAuth {
            email: Some("user@example.com".into()),
        };
        assert!(auth.is_authenticated());
        assert_eq!(auth.user_email().as_deref(), Some("user@example.com"));
    }
}
