//! Host-side orchestration for the embedded store-follow authorization flow.
//!
//! The controller drives a modal UI through its open/mount/close lifecycle
//! while a typed listener relays origin-checked messages from the
//! authorization frame. Everything the host platform owns (the visual
//! widgets, cookies, timers, the window message surface) is reached
//! through narrow trait seams so hosts and tests can supply their own
//! implementations.

pub mod component;
pub mod config;
pub mod controller;
pub mod error;
pub mod hub;
pub mod listener;
pub mod metadata;
pub mod persistence;
pub mod testing;
pub mod timeout;
pub mod translations;
pub mod widgets;

pub use component::{Component, FOLLOW_BUTTON_ELEMENT, register_component_once};
pub use config::WidgetConfig;
pub use controller::{ControllerDeps, ErrorCallback, FollowButtonController, ModalOpenStatus};
pub use error::{Result, WidgetError};
pub use hub::{HubTopic, NotificationHub};
pub use listener::{
    FlowMessageHandler, FrameId, MessageBus, MessageListener, MessageWindow, RawMessage,
    RawMessageHandler,
};
pub use metadata::{HttpStorefrontApi, MetadataCache, StorefrontApi, StorefrontMetadata};
pub use persistence::{CookieStore, MemoryCookieStore};
pub use timeout::{LoadTimeoutGuard, Scheduler, TimerHandle, TokioScheduler};
pub use translations::{StaticTranslationLoader, TranslationLoader, Translations};
pub use widgets::{
    CloseRequestHandler, EmbeddedFrame, FlowTracker, FollowButton, ModalContent, NoopTracker,
    SheetModal, StoreLogo, Tooltip, Viewport, WidgetFactory,
};

pub(crate) mod sync {
    use std::sync::{Mutex, MutexGuard, PoisonError};

    /// Lock a mutex, recovering the guard if a panicking holder poisoned it.
    pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
        mutex.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
