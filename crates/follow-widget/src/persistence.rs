//! Follow-state persistence via a cookie seam.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use crate::sync::lock;

/// Cookie access on the host page.
pub trait CookieStore: Send + Sync {
    fn get(&self, name: &str) -> Option<String>;
    fn set(&self, name: &str, value: &str, ttl: Duration);
}

/// In-memory cookie store for hosts without a real cookie jar and for
/// tests.
#[derive(Default)]
pub struct MemoryCookieStore {
    entries: Mutex<HashMap<String, (String, Duration)>>,
}

impl MemoryCookieStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// TTL the named cookie was stored with, if present.
    pub fn ttl_of(&self, name: &str) -> Option<Duration> {
        lock(&self.entries).get(name).map(|(_, ttl)| *ttl)
    }
}

impl CookieStore for MemoryCookieStore {
    fn get(&self, name: &str) -> Option<String> {
        lock(&self.entries).get(name).map(|(value, _)| value.clone())
    }

    fn set(&self, name: &str, value: &str, ttl: Duration) {
        lock(&self.entries).insert(name.to_string(), (value.to_string(), ttl));
    }
}

/// True only when the named cookie holds the literal value `true`.
pub fn read_follow_state(cookies: &dyn CookieStore, name: &str) -> bool {
    cookies.get(name).as_deref() == Some("true")
}

/// Record a completed follow.
pub fn persist_follow_state(cookies: &dyn CookieStore, name: &str, ttl: Duration) {
    cookies.set(name, "true", ttl);
}
