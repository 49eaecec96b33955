//! Trait seams for the host platform's visual widgets.
//!
//! The controller never touches a rendering surface directly; hosts supply
//! implementations of these traits and the integration tests supply fakes.

use std::sync::Arc;

use async_trait::async_trait;
use follow_protocol::ContentUpdate;

use crate::listener::FrameId;

/// The follow button itself.
pub trait FollowButton: Send + Sync {
    fn set_following(&self, following: bool);
    fn set_focused(&self);
}

/// Receiver of user-initiated close requests on a modal.
#[async_trait]
pub trait CloseRequestHandler: Send + Sync {
    async fn on_close_request(&self);
}

/// A bottom-sheet modal hosting flow content.
#[async_trait]
pub trait SheetModal: Send + Sync {
    fn open(&self);
    async fn close(&self);
    fn set_attribute(&self, name: &str, value: &str);
    fn set_close_request_handler(&self, handler: Arc<dyn CloseRequestHandler>);
    fn destroy(&self);
}

/// Text region inside a modal.
pub trait ModalContent: Send + Sync {
    fn update(&self, content: &ContentUpdate);
}

/// Store branding block shown above the flow content.
#[async_trait]
pub trait StoreLogo: Send + Sync {
    fn update(&self, name: Option<&str>, logo_src: Option<&str>);
    async fn set_favorited(&self);
    fn set_hidden(&self, hidden: bool);
}

/// The embedded authorization frame.
pub trait EmbeddedFrame: Send + Sync {
    fn id(&self) -> FrameId;
    fn set_src(&self, src: &str);
    fn src(&self) -> Option<String>;
    fn set_allow(&self, allow: &str);
    fn resize(&self, width: f64, height: f64);
}

/// Anchored tooltip, used for the desktop QR prompt.
pub trait Tooltip: Send + Sync {
    fn show(&self);
    fn hide(&self);
}

/// Viewport capabilities of the host page.
pub trait Viewport: Send + Sync {
    fn is_mobile(&self) -> bool;
}

/// Analytics events emitted by the widget.
pub trait FlowTracker: Send + Sync {
    fn follow_button_impression(&self, following: bool);
    fn follow_button_clicked(&self);
    fn following_modal_impression(&self);
}

/// Tracker that discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopTracker;

impl FlowTracker for NoopTracker {
    fn follow_button_impression(&self, _following: bool) {}
    fn follow_button_clicked(&self) {}
    fn following_modal_impression(&self) {}
}

/// Factory producing the host platform's widget implementations.
pub trait WidgetFactory: Send + Sync {
    fn create_follow_button(&self, following: bool) -> Arc<dyn FollowButton>;

    fn create_store_logo(&self) -> Arc<dyn StoreLogo>;

    fn create_modal_content(
        &self,
        initial: &ContentUpdate,
        hide_divider: bool,
    ) -> Arc<dyn ModalContent>;

    fn create_frame(&self) -> Arc<dyn EmbeddedFrame>;

    /// Modal wrapping the authorization frame with branding and live
    /// content.
    fn create_authorize_modal(
        &self,
        logo: &Arc<dyn StoreLogo>,
        content: &Arc<dyn ModalContent>,
        frame: &Arc<dyn EmbeddedFrame>,
    ) -> Arc<dyn SheetModal>;

    /// Modal confirming an already-followed store, with a continue link to
    /// the store page.
    fn create_following_modal(
        &self,
        content: &Arc<dyn ModalContent>,
        continue_link: &str,
        continue_label: &str,
    ) -> Arc<dyn SheetModal>;

    /// Desktop tooltip carrying a QR deep link to the store page.
    fn create_tooltip(&self, description: &str, qr_url: &str, qr_alt: &str) -> Arc<dyn Tooltip>;
}
