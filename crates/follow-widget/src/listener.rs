//! Window message subscription and the typed frame listener.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use follow_protocol::{AllowedOrigins, FlowMessage};
use serde_json::Value;
use tracing::debug;

use crate::sync::lock;

/// Identity of an embedded frame within one host page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameId(u64);

impl FrameId {
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for FrameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "frame-{}", self.0)
    }
}

/// Raw cross-document message as delivered by the host platform. Carries no
/// protocol knowledge.
#[derive(Debug, Clone)]
pub struct RawMessage {
    pub origin: String,
    pub source: FrameId,
    pub data: Value,
}

/// Receiver of raw window messages.
#[async_trait]
pub trait RawMessageHandler: Send + Sync {
    async fn on_message(&self, message: &RawMessage);
}

/// Subscription surface of the window that receives cross-document
/// messages.
pub trait MessageWindow: Send + Sync {
    fn add_message_listener(&self, handler: Arc<dyn RawMessageHandler>) -> u64;
    fn remove_message_listener(&self, id: u64);
}

/// In-process message bus implementing the window surface. The host feeds
/// platform messages into [`MessageBus::dispatch`]; registered handlers see
/// them in dispatch order.
#[derive(Default)]
pub struct MessageBus {
    next_id: AtomicU64,
    handlers: Mutex<HashMap<u64, Arc<dyn RawMessageHandler>>>,
}

impl MessageBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliver one raw message to every registered handler.
    pub async fn dispatch(&self, message: RawMessage) {
        let handlers: Vec<Arc<dyn RawMessageHandler>> =
            lock(&self.handlers).values().cloned().collect();
        for handler in handlers {
            handler.on_message(&message).await;
        }
    }

    pub fn handler_count(&self) -> usize {
        lock(&self.handlers).len()
    }
}

impl MessageWindow for MessageBus {
    fn add_message_listener(&self, handler: Arc<dyn RawMessageHandler>) -> u64 {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        lock(&self.handlers).insert(id, handler);
        id
    }

    fn remove_message_listener(&self, id: u64) {
        lock(&self.handlers).remove(&id);
    }
}

/// Receiver of parsed, origin-checked frame messages.
#[async_trait]
pub trait FlowMessageHandler: Send + Sync {
    async fn handle_message(&self, message: FlowMessage);
}

struct ListenerDispatch {
    frame: FrameId,
    allowed: AllowedOrigins,
    handler: Arc<dyn FlowMessageHandler>,
}

#[async_trait]
impl RawMessageHandler for ListenerDispatch {
    async fn on_message(&self, message: &RawMessage) {
        if message.source != self.frame {
            return;
        }
        if !self.allowed.is_allowed(&message.origin) {
            debug!(origin = %message.origin, "dropping message from non-allow-listed origin");
            return;
        }
        match FlowMessage::from_value(message.data.clone()) {
            Ok(parsed) => self.handler.handle_message(parsed).await,
            Err(error) => debug!(%error, "dropping malformed frame message"),
        }
    }
}

/// Typed listener bound to one embedded frame. Messages from other frames,
/// from origins outside the allow-list, or with unparseable payloads are
/// silently dropped.
pub struct MessageListener {
    window: Arc<dyn MessageWindow>,
    registration: Mutex<Option<u64>>,
}

impl MessageListener {
    /// Subscribe to `window` and relay validated messages for `frame` to
    /// `handler`.
    pub fn attach(
        window: Arc<dyn MessageWindow>,
        frame: FrameId,
        allowed: AllowedOrigins,
        handler: Arc<dyn FlowMessageHandler>,
    ) -> Arc<Self> {
        let id = window.add_message_listener(Arc::new(ListenerDispatch {
            frame,
            allowed,
            handler,
        }));
        Arc::new(Self {
            window,
            registration: Mutex::new(Some(id)),
        })
    }

    /// Detach from the window. Calling more than once is a no-op.
    pub fn detach(&self) {
        if let Some(id) = lock(&self.registration).take() {
            self.window.remove_message_listener(id);
        }
    }

    pub fn is_attached(&self) -> bool {
        lock(&self.registration).is_some()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;

    use serde_json::json;

    use super::*;

    #[derive(Default)]
    struct CountingHandler {
        calls: AtomicUsize,
        last: Mutex<Option<FlowMessage>>,
    }

    #[async_trait]
    impl FlowMessageHandler for CountingHandler {
        async fn handle_message(&self, message: FlowMessage) {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *lock(&self.last) = Some(message);
        }
    }

    fn attach_counting(
        bus: &Arc<MessageBus>,
        frame: FrameId,
    ) -> (Arc<MessageListener>, Arc<CountingHandler>) {
        let handler = Arc::new(CountingHandler::default());
        let listener = MessageListener::attach(
            Arc::clone(bus) as Arc<dyn MessageWindow>,
            frame,
            AllowedOrigins::for_storefront("https://store.example"),
            Arc::clone(&handler) as Arc<dyn FlowMessageHandler>,
        );
        (listener, handler)
    }

    fn every_message_payload() -> Vec<Value> {
        vec![
            json!({"type": "loaded"}),
            json!({"type": "resize_iframe", "height": 1.0, "width": 1.0}),
            json!({"type": "completed", "loggedIn": true}),
            json!({"type": "error", "code": "c", "message": "m"}),
            json!({"type": "content", "title": "t"}),
            json!({"type": "processing_status_updated", "status": "s"}),
            json!({"type": "close_requested"}),
        ]
    }

    #[tokio::test]
    async fn delivers_allow_listed_messages_to_handler() {
        let bus = Arc::new(MessageBus::new());
        let frame = FrameId::new(7);
        let (_listener, handler) = attach_counting(&bus, frame);

        bus.dispatch(RawMessage {
            origin: "https://store.example".to_string(),
            source: frame,
            data: json!({"type": "close_requested"}),
        })
        .await;

        assert_eq!(handler.calls.load(Ordering::SeqCst), 1);
        assert_eq!(
            lock(&handler.last).clone(),
            Some(FlowMessage::CloseRequested)
        );
    }

    #[tokio::test]
    async fn off_list_origins_never_reach_the_handler() {
        let bus = Arc::new(MessageBus::new());
        let frame = FrameId::new(7);
        let (_listener, handler) = attach_counting(&bus, frame);

        for data in every_message_payload() {
            bus.dispatch(RawMessage {
                origin: "https://evil.example".to_string(),
                source: frame,
                data,
            })
            .await;
        }

        assert_eq!(handler.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn messages_from_other_frames_are_dropped() {
        let bus = Arc::new(MessageBus::new());
        let (_listener, handler) = attach_counting(&bus, FrameId::new(7));

        bus.dispatch(RawMessage {
            origin: "https://store.example".to_string(),
            source: FrameId::new(8),
            data: json!({"type": "close_requested"}),
        })
        .await;

        assert_eq!(handler.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn malformed_payloads_are_dropped_silently() {
        let bus = Arc::new(MessageBus::new());
        let frame = FrameId::new(7);
        let (_listener, handler) = attach_counting(&bus, frame);

        for data in [json!({"no": "type"}), json!("text"), json!(42)] {
            bus.dispatch(RawMessage {
                origin: "https://store.example".to_string(),
                source: frame,
                data,
            })
            .await;
        }

        assert_eq!(handler.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn detach_is_idempotent_and_stops_delivery() {
        let bus = Arc::new(MessageBus::new());
        let frame = FrameId::new(7);
        let (listener, handler) = attach_counting(&bus, frame);
        assert!(listener.is_attached());
        assert_eq!(bus.handler_count(), 1);

        listener.detach();
        listener.detach();
        assert!(!listener.is_attached());
        assert_eq!(bus.handler_count(), 0);

        bus.dispatch(RawMessage {
            origin: "https://store.example".to_string(),
            source: frame,
            data: json!({"type": "close_requested"}),
        })
        .await;
        assert_eq!(handler.calls.load(Ordering::SeqCst), 0);
    }
}
