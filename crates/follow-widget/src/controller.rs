//! The follow-button controller: modal lifecycle, message handling, and
//! follow-state transitions.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};

use async_trait::async_trait;
use follow_protocol::{
    AllowedOrigins, AuthorizeUrlBuilder, AuthorizeUrlParams, ContentUpdate, ErrorNotice,
    FlowKind, FlowMessage, OAuthParams, TEMPORARILY_UNAVAILABLE, normalize_storefront_origin,
};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::component::Component;
use crate::config::{
    ATTRIBUTE_ANALYTICS_TRACE_ID, ATTRIBUTE_CLIENT_ID, ATTRIBUTE_DEV_MODE,
    ATTRIBUTE_STOREFRONT_ORIGIN, ATTRIBUTE_VERSION, DEFAULT_VERSION, FRAME_PERMISSIONS,
    WidgetConfig,
};
use crate::hub::{HubTopic, NotificationHub};
use crate::listener::{FlowMessageHandler, MessageListener, MessageWindow};
use crate::metadata::{MetadataCache, StorefrontApi};
use crate::persistence::{CookieStore, persist_follow_state, read_follow_state};
use crate::sync::lock;
use crate::timeout::{LoadTimeoutGuard, Scheduler};
use crate::translations::{
    KEY_FOLLOWING_CONTINUE, KEY_FOLLOWING_SUBTITLE, KEY_FOLLOWING_TITLE, KEY_QR_ALT,
    KEY_QR_HEADER, TranslationLoader, Translations,
};
use crate::widgets::{
    CloseRequestHandler, EmbeddedFrame, FlowTracker, FollowButton, ModalContent, SheetModal,
    StoreLogo, Tooltip, Viewport, WidgetFactory,
};

/// Lifecycle of the authorization modal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ModalOpenStatus {
    #[default]
    Closed,
    /// Modal created, waiting for the frame's `loaded` message.
    Mounting,
    Open,
}

impl ModalOpenStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Closed => "closed",
            Self::Mounting => "mounting",
            Self::Open => "open",
        }
    }
}

/// Callback invoked with each outward error notice.
pub type ErrorCallback = Arc<dyn Fn(&ErrorNotice) + Send + Sync>;

/// Everything the controller borrows from the host platform.
pub struct ControllerDeps {
    pub config: WidgetConfig,
    pub widgets: Arc<dyn WidgetFactory>,
    pub window: Arc<dyn MessageWindow>,
    pub cookies: Arc<dyn CookieStore>,
    pub hub: Arc<NotificationHub>,
    pub storefront: Arc<dyn StorefrontApi>,
    pub url_builder: Arc<dyn AuthorizeUrlBuilder>,
    pub translation_loader: Arc<dyn TranslationLoader>,
    pub viewport: Arc<dyn Viewport>,
    pub tracker: Arc<dyn FlowTracker>,
    pub scheduler: Arc<dyn Scheduler>,
}

struct AuthorizeSurface {
    modal: Arc<dyn SheetModal>,
    logo: Arc<dyn StoreLogo>,
    content: Arc<dyn ModalContent>,
    frame: Arc<dyn EmbeddedFrame>,
    listener: Option<Arc<MessageListener>>,
}

#[derive(Default)]
struct ControllerState {
    status: ModalOpenStatus,
    is_following: bool,
    dev_mode: bool,
    client_id: String,
    version: String,
    storefront_origin: String,
    translations: Translations,
    button: Option<Arc<dyn FollowButton>>,
    authorize: Option<AuthorizeSurface>,
    following_modal: Option<Arc<dyn SheetModal>>,
    tooltip: Option<Arc<dyn Tooltip>>,
    hub_subscription: Option<u64>,
}

/// Drives one follow button instance on the host page.
pub struct FollowButtonController {
    config: WidgetConfig,
    analytics_trace_id: String,
    widgets: Arc<dyn WidgetFactory>,
    window: Arc<dyn MessageWindow>,
    cookies: Arc<dyn CookieStore>,
    hub: Arc<NotificationHub>,
    storefront: Arc<dyn StorefrontApi>,
    url_builder: Arc<dyn AuthorizeUrlBuilder>,
    translation_loader: Arc<dyn TranslationLoader>,
    viewport: Arc<dyn Viewport>,
    tracker: Arc<dyn FlowTracker>,
    metadata: MetadataCache,
    load_timeout: LoadTimeoutGuard,
    state: Mutex<ControllerState>,
    next_error_id: AtomicU64,
    error_listeners: Mutex<Vec<(u64, ErrorCallback)>>,
    self_ref: Weak<Self>,
}

impl FollowButtonController {
    pub fn new(deps: ControllerDeps) -> Arc<Self> {
        let ControllerDeps {
            config,
            widgets,
            window,
            cookies,
            hub,
            storefront,
            url_builder,
            translation_loader,
            viewport,
            tracker,
            scheduler,
        } = deps;

        let is_following = read_follow_state(cookies.as_ref(), &config.cookie_name);
        let load_timeout = LoadTimeoutGuard::new(scheduler, config.load_timeout);
        let metadata = MetadataCache::new(Arc::clone(&storefront));
        let storefront_origin = config.storefront_origin.clone();

        Arc::new_cyclic(|self_ref| Self {
            config,
            analytics_trace_id: Uuid::new_v4().to_string(),
            widgets,
            window,
            cookies,
            hub,
            storefront,
            url_builder,
            translation_loader,
            viewport,
            tracker,
            metadata,
            load_timeout,
            state: Mutex::new(ControllerState {
                is_following,
                version: DEFAULT_VERSION.to_string(),
                storefront_origin,
                ..ControllerState::default()
            }),
            next_error_id: AtomicU64::new(0),
            error_listeners: Mutex::new(Vec::new()),
            self_ref: self_ref.clone(),
        })
    }

    pub fn modal_status(&self) -> ModalOpenStatus {
        lock(&self.state).status
    }

    pub fn is_following(&self) -> bool {
        lock(&self.state).is_following
    }

    pub fn analytics_trace_id(&self) -> &str {
        &self.analytics_trace_id
    }

    /// Register a callback for outward error notices.
    pub fn on_error(&self, callback: ErrorCallback) -> u64 {
        let id = self.next_error_id.fetch_add(1, Ordering::SeqCst);
        lock(&self.error_listeners).push((id, callback));
        id
    }

    pub fn remove_error_listener(&self, id: u64) {
        lock(&self.error_listeners).retain(|(entry_id, _)| *entry_id != id);
    }

    fn dispatch_error(&self, notice: &ErrorNotice) {
        let listeners: Vec<ErrorCallback> = lock(&self.error_listeners)
            .iter()
            .map(|(_, callback)| Arc::clone(callback))
            .collect();
        for listener in listeners {
            listener(notice);
        }
    }

    /// Button click entry point.
    pub async fn handle_click(&self) {
        let (dev_mode, is_following) = {
            let state = lock(&self.state);
            (state.dev_mode, state.is_following)
        };

        if dev_mode {
            self.toggle_dev_follow_state(is_following);
            return;
        }

        if is_following {
            if self.viewport.is_mobile() {
                self.open_following_modal().await;
            } else {
                self.show_following_tooltip().await;
            }
        } else {
            self.tracker.follow_button_clicked();
            self.open_follow_flow();
        }
    }

    // Dev mode flips the visual state locally without touching the frame
    // or the network.
    fn toggle_dev_follow_state(&self, is_following: bool) {
        let mut state = lock(&self.state);
        state.is_following = !is_following;
        if let Some(button) = &state.button {
            button.set_following(!is_following);
        }
    }

    fn open_follow_flow(&self) {
        let reopen = {
            let mut state = lock(&self.state);
            if let Some(surface) = &state.authorize {
                let modal = Arc::clone(&surface.modal);
                // The frame already loaded once; reopening shows it as-is.
                if state.status == ModalOpenStatus::Closed {
                    state.status = ModalOpenStatus::Open;
                }
                Some(modal)
            } else {
                None
            }
        };
        if let Some(modal) = reopen {
            modal.open();
            return;
        }

        let storefront_origin = {
            let state = lock(&self.state);
            state.storefront_origin.clone()
        };

        let logo = self.widgets.create_store_logo();
        self.spawn_logo_refresh(&logo, &storefront_origin);

        let content = self
            .widgets
            .create_modal_content(&ContentUpdate::default(), false);
        let frame = self.widgets.create_frame();
        frame.set_allow(FRAME_PERMISSIONS);

        let allowed = AllowedOrigins::new(
            self.config.auth_origin.clone(),
            self.config.auth_origin_alt.clone(),
            storefront_origin,
        );
        let listener = MessageListener::attach(
            Arc::clone(&self.window),
            frame.id(),
            allowed,
            Arc::new(ControllerMessageHandler(self.self_ref.clone())),
        );

        let modal = self.widgets.create_authorize_modal(&logo, &content, &frame);
        modal.set_attribute(ATTRIBUTE_ANALYTICS_TRACE_ID, &self.analytics_trace_id);
        modal.set_close_request_handler(Arc::new(AuthorizeCloseHandler(self.self_ref.clone())));

        {
            let mut state = lock(&self.state);
            state.authorize = Some(AuthorizeSurface {
                modal,
                logo,
                content,
                frame,
                listener: Some(listener),
            });
            state.status = ModalOpenStatus::Mounting;
        }
        self.update_src(false);
    }

    // Store metadata arrives out of band; the modal opens without waiting
    // for it.
    fn spawn_logo_refresh(&self, logo: &Arc<dyn StoreLogo>, storefront_origin: &str) {
        let weak = self.self_ref.clone();
        let logo = Arc::clone(logo);
        let origin = storefront_origin.to_string();
        tokio::spawn(async move {
            let Some(controller) = weak.upgrade() else {
                return;
            };
            if let Some(metadata) = controller.metadata.get(&origin).await {
                logo.update(metadata.name.as_deref(), None);
            }
        });
    }

    /// Rebuild the frame src from the current parameters. The load timer is
    /// re-armed on every call; an unchanged src is only re-assigned when
    /// `forced`.
    pub fn update_src(&self, forced: bool) {
        let (frame, version, client_id) = {
            let state = lock(&self.state);
            let Some(surface) = &state.authorize else {
                return;
            };
            (
                Arc::clone(&surface.frame),
                state.version.clone(),
                state.client_id.clone(),
            )
        };

        let url = self.url_builder.build_authorize_url(&AuthorizeUrlParams {
            version,
            analytics_trace_id: self.analytics_trace_id.clone(),
            flow: FlowKind::Follow,
            oauth: OAuthParams { client_id },
        });

        self.arm_load_timeout();
        if !forced && frame.src().as_deref() == Some(url.as_str()) {
            return;
        }
        frame.set_src(&url);
    }

    fn arm_load_timeout(&self) {
        let weak = self.self_ref.clone();
        self.load_timeout.arm(Box::new(move || {
            if let Some(controller) = weak.upgrade() {
                controller.dispatch_error(&ErrorNotice::from(TEMPORARILY_UNAVAILABLE));
            }
        }));
    }

    /// Handle one validated message from the authorization frame.
    pub async fn handle_message(&self, message: FlowMessage) {
        debug!(message_type = message.message_type(), "frame message");
        match message {
            FlowMessage::Loaded {
                client_name,
                logo_src,
            } => self.handle_loaded(client_name, logo_src),
            FlowMessage::ResizeIframe { height, width } => {
                let frame = lock(&self.state)
                    .authorize
                    .as_ref()
                    .map(|surface| Arc::clone(&surface.frame));
                if let Some(frame) = frame {
                    frame.resize(width, height);
                }
            }
            FlowMessage::Completed {
                logged_in,
                should_finalize_login,
            } => {
                self.handle_completed(logged_in, should_finalize_login)
                    .await;
            }
            FlowMessage::Error {
                code,
                message,
                email,
            } => {
                self.load_timeout.disarm();
                let mut notice = ErrorNotice::new(code, message);
                notice.email = email;
                self.dispatch_error(&notice);
            }
            FlowMessage::Content(update) | FlowMessage::ProcessingStatusUpdated(update) => {
                self.handle_content(&update);
            }
            FlowMessage::CloseRequested => self.request_close().await,
        }
    }

    fn handle_loaded(&self, client_name: Option<String>, logo_src: Option<String>) {
        self.load_timeout.disarm();
        let (logo, modal, was_mounting) = {
            let mut state = lock(&self.state);
            let Some(surface) = &state.authorize else {
                return;
            };
            let logo = Arc::clone(&surface.logo);
            let modal = Arc::clone(&surface.modal);
            let was_mounting = state.status == ModalOpenStatus::Mounting;
            if was_mounting {
                state.status = ModalOpenStatus::Open;
            }
            (logo, modal, was_mounting)
        };

        if client_name.is_some() || logo_src.is_some() {
            logo.update(client_name.as_deref(), logo_src.as_deref());
        }
        if was_mounting {
            modal.open();
        }
    }

    async fn handle_completed(&self, logged_in: bool, should_finalize_login: bool) {
        persist_follow_state(
            self.cookies.as_ref(),
            &self.config.cookie_name,
            self.config.cookie_ttl,
        );
        self.load_timeout.disarm();

        let surface = {
            let state = lock(&self.state);
            if !logged_in {
                return;
            }
            let Some(surface) = &state.authorize else {
                return;
            };
            (
                Arc::clone(&surface.modal),
                Arc::clone(&surface.logo),
                state.storefront_origin.clone(),
                state.hub_subscription,
            )
        };
        let (modal, logo, storefront_origin, hub_subscription) = surface;

        if should_finalize_login {
            if let Err(error) = self
                .storefront
                .exchange_login_cookie(&storefront_origin)
                .await
            {
                warn!(%error, "login cookie exchange failed");
            }
        }

        // Sibling widgets refresh their frames before this modal closes.
        // Our own subscription is skipped: the listener detaches below, so
        // nothing could ever disarm the timer a forced refresh would arm.
        match hub_subscription {
            Some(id) => self.hub.publish_except(HubTopic::UserIdentityChanged, id),
            None => self.hub.publish(HubTopic::UserIdentityChanged),
        }

        logo.set_favorited().await;
        modal.close().await;

        let (button, listener) = {
            let mut state = lock(&self.state);
            state.is_following = true;
            state.status = ModalOpenStatus::Closed;
            let listener = state
                .authorize
                .as_mut()
                .and_then(|surface| surface.listener.take());
            (state.button.clone(), listener)
        };
        if let Some(listener) = listener {
            listener.detach();
        }
        if let Some(button) = button {
            button.set_following(true);
        }
        self.tracker.follow_button_impression(true);
    }

    fn handle_content(&self, update: &ContentUpdate) {
        let surface = {
            let state = lock(&self.state);
            if state.status == ModalOpenStatus::Closed {
                return;
            }
            let Some(surface) = &state.authorize else {
                return;
            };
            (
                Arc::clone(&surface.modal),
                Arc::clone(&surface.content),
                Arc::clone(&surface.logo),
            )
        };
        let (modal, content, logo) = surface;

        if let Some(title) = &update.title {
            modal.set_attribute("title", title);
        }
        content.update(update);
        logo.set_hidden(update.signals_captcha());
    }

    /// Close the authorization modal and return focus to the button.
    pub async fn request_close(&self) {
        self.load_timeout.disarm();
        let (modal, button) = {
            let mut state = lock(&self.state);
            state.status = ModalOpenStatus::Closed;
            (
                state
                    .authorize
                    .as_ref()
                    .map(|surface| Arc::clone(&surface.modal)),
                state.button.clone(),
            )
        };
        if let Some(modal) = modal {
            modal.close().await;
        }
        if let Some(button) = button {
            button.set_focused();
        }
    }

    async fn open_following_modal(&self) {
        let existing = lock(&self.state).following_modal.clone();
        if let Some(modal) = existing {
            modal.open();
            self.tracker.following_modal_impression();
            return;
        }

        let (storefront_origin, translations) = {
            let state = lock(&self.state);
            (state.storefront_origin.clone(), state.translations.clone())
        };
        let metadata = self.metadata.get(&storefront_origin).await;
        let store_name = metadata
            .as_ref()
            .and_then(|m| m.name.clone())
            .unwrap_or_else(|| "the store".to_string());
        let continue_link = metadata
            .as_ref()
            .and_then(|m| m.id.as_ref())
            .map_or_else(
                || "#".to_string(),
                |id| format!("{}/store/{id}", self.config.website_origin),
            );

        let title = translations.translate_with(KEY_FOLLOWING_TITLE, &[("store", &store_name)]);
        let subtitle = translations.translate(KEY_FOLLOWING_SUBTITLE);
        let continue_label = translations.translate(KEY_FOLLOWING_CONTINUE);

        let content = self.widgets.create_modal_content(
            &ContentUpdate {
                title: Some(title.clone()),
                description: Some(subtitle),
                ..ContentUpdate::default()
            },
            true,
        );
        let modal = self
            .widgets
            .create_following_modal(&content, &continue_link, &continue_label);
        modal.set_attribute("title", &title);
        modal.set_attribute("disable-popup", "true");
        modal.set_close_request_handler(Arc::new(FollowingCloseHandler(self.self_ref.clone())));

        lock(&self.state).following_modal = Some(Arc::clone(&modal));
        modal.open();
        self.tracker.following_modal_impression();
    }

    async fn close_following_modal(&self) {
        let (modal, button) = {
            let state = lock(&self.state);
            (state.following_modal.clone(), state.button.clone())
        };
        if let Some(modal) = modal {
            modal.close().await;
        }
        if let Some(button) = button {
            button.set_focused();
        }
    }

    async fn show_following_tooltip(&self) {
        let existing = lock(&self.state).tooltip.clone();
        if let Some(tooltip) = existing {
            tooltip.show();
            return;
        }

        let (storefront_origin, translations) = {
            let state = lock(&self.state);
            (state.storefront_origin.clone(), state.translations.clone())
        };
        let qr_url = self
            .metadata
            .get(&storefront_origin)
            .await
            .and_then(|m| m.id)
            .map_or_else(
                || "#".to_string(),
                |id| format!("{}/qr/store/{id}", self.config.website_origin),
            );
        let description = translations.translate(KEY_QR_HEADER);
        let qr_alt = translations.translate(KEY_QR_ALT);

        let tooltip = self.widgets.create_tooltip(&description, &qr_url, &qr_alt);
        lock(&self.state).tooltip = Some(Arc::clone(&tooltip));
        tooltip.show();
    }

    fn apply_storefront_origin(&self, raw: &str) {
        match normalize_storefront_origin(raw) {
            Ok(origin) => lock(&self.state).storefront_origin = origin,
            Err(error) => warn!(%error, "ignoring invalid storefront origin"),
        }
    }
}

#[async_trait]
impl Component for FollowButtonController {
    async fn on_attach(&self) {
        let translations =
            Translations::load(self.translation_loader.as_ref(), &self.config.locale).await;

        let weak = self.self_ref.clone();
        let subscription = self.hub.subscribe(
            HubTopic::UserIdentityChanged,
            Arc::new(move || {
                if let Some(controller) = weak.upgrade() {
                    controller.update_src(true);
                }
            }),
        );

        let is_following = {
            let mut state = lock(&self.state);
            state.translations = translations;
            state.hub_subscription = Some(subscription);
            state.is_following
        };
        let button = self.widgets.create_follow_button(is_following);
        lock(&self.state).button = Some(button);

        self.tracker.follow_button_impression(is_following);
    }

    async fn on_attribute_change(&self, name: &str, value: Option<&str>) {
        match name {
            ATTRIBUTE_VERSION => {
                lock(&self.state).version = value.unwrap_or(DEFAULT_VERSION).to_string();
                self.update_src(false);
            }
            ATTRIBUTE_CLIENT_ID => {
                lock(&self.state).client_id = value.unwrap_or_default().to_string();
                self.update_src(false);
            }
            ATTRIBUTE_DEV_MODE => {
                lock(&self.state).dev_mode = value == Some("true");
                self.update_src(false);
            }
            ATTRIBUTE_STOREFRONT_ORIGIN => {
                if let Some(raw) = value {
                    self.apply_storefront_origin(raw);
                }
            }
            other => debug!(attribute = other, "ignoring unwatched attribute"),
        }
    }

    async fn on_detach(&self) {
        self.load_timeout.disarm();
        let (subscription, listener, authorize_modal, following_modal, tooltip) = {
            let mut state = lock(&self.state);
            state.status = ModalOpenStatus::Closed;
            let listener = state
                .authorize
                .as_mut()
                .and_then(|surface| surface.listener.take());
            let authorize_modal = state
                .authorize
                .take()
                .map(|surface| surface.modal);
            (
                state.hub_subscription.take(),
                listener,
                authorize_modal,
                state.following_modal.take(),
                state.tooltip.take(),
            )
        };

        if let Some(id) = subscription {
            self.hub.unsubscribe(HubTopic::UserIdentityChanged, id);
        }
        if let Some(listener) = listener {
            listener.detach();
        }
        if let Some(modal) = authorize_modal {
            modal.destroy();
        }
        if let Some(modal) = following_modal {
            modal.destroy();
        }
        if let Some(tooltip) = tooltip {
            tooltip.hide();
        }
    }
}

struct ControllerMessageHandler(Weak<FollowButtonController>);

#[async_trait]
impl FlowMessageHandler for ControllerMessageHandler {
    async fn handle_message(&self, message: FlowMessage) {
        if let Some(controller) = self.0.upgrade() {
            controller.handle_message(message).await;
        }
    }
}

struct AuthorizeCloseHandler(Weak<FollowButtonController>);

#[async_trait]
impl CloseRequestHandler for AuthorizeCloseHandler {
    async fn on_close_request(&self) {
        if let Some(controller) = self.0.upgrade() {
            controller.request_close().await;
        }
    }
}

struct FollowingCloseHandler(Weak<FollowButtonController>);

#[async_trait]
impl CloseRequestHandler for FollowingCloseHandler {
    async fn on_close_request(&self) {
        if let Some(controller) = self.0.upgrade() {
            controller.close_following_modal().await;
        }
    }
}
