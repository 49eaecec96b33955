//! Host component lifecycle and one-time element registration.

use std::collections::HashSet;
use std::sync::{Mutex, OnceLock};

use async_trait::async_trait;

use crate::sync::lock;

/// Element name the follow button registers under.
pub const FOLLOW_BUTTON_ELEMENT: &str = "store-follow-button";

/// Lifecycle hooks the host page drives on an embedded component.
#[async_trait]
pub trait Component: Send + Sync {
    /// Component inserted into the page.
    async fn on_attach(&self);

    /// A watched host attribute changed value.
    async fn on_attribute_change(&self, name: &str, value: Option<&str>);

    /// Component removed from the page.
    async fn on_detach(&self);
}

fn registry() -> &'static Mutex<HashSet<String>> {
    static REGISTRY: OnceLock<Mutex<HashSet<String>>> = OnceLock::new();
    REGISTRY.get_or_init(|| Mutex::new(HashSet::new()))
}

/// Register `name` once per process. Returns false when the name was
/// already registered, mirroring host platforms that reject duplicate
/// element definitions.
pub fn register_component_once(name: &str) -> bool {
    lock(registry()).insert(name.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_registration_is_rejected() {
        // Use a name no other test registers; the registry is process-wide.
        assert!(register_component_once("component-registry-test-element"));
        assert!(!register_component_once("component-registry-test-element"));
    }
}
