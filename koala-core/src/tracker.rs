//! Semantic event tracker
//!
//! [`EventTracker`] turns application moments ("the login screen was shown",
//! "search returned page 3") into named events, merges the device/app default
//! properties underneath, and forwards the result to a [`TrackingBackend`].
//!
//! ```rust
//! use koala_core::{EventTracker, RecordingBackend, StaticHost};
//!
//! let backend = RecordingBackend::new();
//! let tracker = EventTracker::with_host(&backend, StaticHost::default());
//!
//! tracker.search_results("shoes", 1);
//! assert_eq!(backend.last().unwrap().name, "Discover Search Results");
//! ```

use std::sync::OnceLock;

use crate::backend::TrackingBackend;
use crate::device::{DefaultProperties, HostEnvironment, SystemHost};
use crate::types::{Properties, PropertyValue};

/// Every event the tracker knows how to emit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrackedEvent {
    AppOpen,
    AppClose,
    /// A discovery list was viewed, including pagination
    DiscoveryView,
    LoginTout {
        intent: String,
    },
    LoginSuccess,
    LoginError,
    ResetPasswordView,
    ResetPasswordSuccess,
    ResetPasswordError,
    SignupSuccess,
    SignupNewsletterToggle {
        send_newsletters: bool,
    },
    FacebookConfirmation,
    TwoFactorAuthView,
    TwoFactorAuthResendCode,
    /// Shown once when the search view first appears
    ProjectSearchView,
    /// Projects were obtained from a search; `page_count` starts at 1
    SearchResults {
        query: String,
        page_count: u32,
    },
}

impl TrackedEvent {
    /// Event name as reported to the backend
    pub fn name(&self) -> &'static str {
        match self {
            TrackedEvent::AppOpen => "App Open",
            TrackedEvent::AppClose => "App Close",
            TrackedEvent::DiscoveryView => "Discovery List View",
            TrackedEvent::LoginTout { .. } => "Application Login or Signup",
            TrackedEvent::LoginSuccess => "Login",
            TrackedEvent::LoginError => "Errored User Login",
            TrackedEvent::ResetPasswordView => "Forgot Password View",
            TrackedEvent::ResetPasswordSuccess => "Forgot Password Requested",
            TrackedEvent::ResetPasswordError => "Forgot Password Errored",
            TrackedEvent::SignupSuccess => "New User",
            TrackedEvent::SignupNewsletterToggle { .. } => "Signup Newsletter Toggle",
            TrackedEvent::FacebookConfirmation => "Facebook Confirm",
            TrackedEvent::TwoFactorAuthView => "Two-factor Authentication Confirm View",
            TrackedEvent::TwoFactorAuthResendCode => "Two-factor Authentication Resend Code",
            TrackedEvent::ProjectSearchView => "Discover Search",
            TrackedEvent::SearchResults { page_count: 1, .. } => "Discover Search Results",
            TrackedEvent::SearchResults { .. } => "Discover Search Results Load More",
        }
    }

    /// Event-specific properties, without defaults
    pub fn properties(&self) -> Properties {
        let mut props = Properties::new();
        match self {
            TrackedEvent::LoginTout { intent } => {
                props.insert("intent".into(), PropertyValue::String(intent.clone()));
            }
            TrackedEvent::SignupNewsletterToggle { send_newsletters } => {
                props.insert("send_newsletters".into(), PropertyValue::Bool(*send_newsletters));
            }
            TrackedEvent::SearchResults { query, page_count } => {
                props.insert("search_term".into(), PropertyValue::String(query.clone()));
                props.insert("page_count".into(), PropertyValue::from(*page_count));
            }
            _ => {}
        }
        props
    }
}

/// Emits semantic events to a backend.
///
/// Default properties are read from the host on the first event and reused
/// for the lifetime of the tracker.
pub struct EventTracker<B> {
    backend: B,
    host: Box<dyn HostEnvironment + Send + Sync>,
    defaults: OnceLock<Properties>,
}

impl<B: TrackingBackend> EventTracker<B> {
    /// Create a tracker that reads the live system for default properties
    pub fn new(backend: B) -> Self {
        Self::with_host(backend, SystemHost::default())
    }

    /// Create a tracker with a specific host environment
    pub fn with_host<H>(backend: B, host: H) -> Self
    where
        H: HostEnvironment + Send + Sync + 'static,
    {
        Self {
            backend,
            host: Box::new(host),
            defaults: OnceLock::new(),
        }
    }

    /// The backend events are forwarded to
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Default properties attached to every event
    pub fn default_properties(&self) -> &Properties {
        self.defaults
            .get_or_init(|| DefaultProperties::collect(self.host.as_ref()).to_properties())
    }

    /// Emit any known event
    pub fn emit(&self, event: &TrackedEvent) {
        self.track(event.name(), event.properties());
    }

    pub fn app_open(&self) {
        self.emit(&TrackedEvent::AppOpen);
    }

    pub fn app_close(&self) {
        self.emit(&TrackedEvent::AppClose);
    }

    /// Call when a discovery list is shown, including pagination.
    pub fn discovery_view(&self) {
        self.emit(&TrackedEvent::DiscoveryView);
    }

    pub fn login_tout(&self, intent: &str) {
        self.emit(&TrackedEvent::LoginTout {
            intent: intent.to_string(),
        });
    }

    pub fn login_success(&self) {
        self.emit(&TrackedEvent::LoginSuccess);
    }

    pub fn login_error(&self) {
        self.emit(&TrackedEvent::LoginError);
    }

    pub fn reset_password_view(&self) {
        self.emit(&TrackedEvent::ResetPasswordView);
    }

    pub fn reset_password_success(&self) {
        self.emit(&TrackedEvent::ResetPasswordSuccess);
    }

    pub fn reset_password_error(&self) {
        self.emit(&TrackedEvent::ResetPasswordError);
    }

    pub fn signup_success(&self) {
        self.emit(&TrackedEvent::SignupSuccess);
    }

    pub fn signup_newsletter_toggle(&self, send_newsletters: bool) {
        self.emit(&TrackedEvent::SignupNewsletterToggle { send_newsletters });
    }

    pub fn facebook_confirmation(&self) {
        self.emit(&TrackedEvent::FacebookConfirmation);
    }

    pub fn two_factor_auth_view(&self) {
        self.emit(&TrackedEvent::TwoFactorAuthView);
    }

    pub fn two_factor_auth_resend_code(&self) {
        self.emit(&TrackedEvent::TwoFactorAuthResendCode);
    }

    /// Call once when the search view is initially shown.
    pub fn project_search_view(&self) {
        self.emit(&TrackedEvent::ProjectSearchView);
    }

    /// Call when projects have been obtained from a search.
    ///
    /// Page 1 is reported as a fresh search, later pages as "load more".
    pub fn search_results(&self, query: &str, page_count: u32) {
        self.emit(&TrackedEvent::SearchResults {
            query: query.to_string(),
            page_count,
        });
    }

    /// Merge event properties over the defaults and hand off to the backend
    fn track(&self, event: &str, properties: Properties) {
        let mut merged = self.default_properties().clone();
        merged.extend(properties);

        tracing::debug!(event = %event, properties = merged.len(), "Tracking event");
        self.backend.track(event, &merged);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::RecordingBackend;
    use crate::device::{DeviceIdiom, StaticHost};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn test_host() -> StaticHost {
        StaticHost {
            manufacturer: "Apple".to_string(),
            app_version: Some("1042".to_string()),
            app_release: Some("2.3.0".to_string()),
            model: Some("iPhone10,3".to_string()),
            os_name: Some("iOS".to_string()),
            os_version: Some("17.1".to_string()),
            screen_size: Some((375.0, 812.0)),
            idiom: DeviceIdiom::Phone,
        }
    }

    fn tracker(backend: &RecordingBackend) -> EventTracker<&RecordingBackend> {
        EventTracker::with_host(backend, test_host())
    }

    /// Run one tracker call against a fresh backend and return what it emitted
    fn emitted_names(call: impl Fn(&EventTracker<&RecordingBackend>)) -> Vec<String> {
        let backend = RecordingBackend::new();
        call(&tracker(&backend));
        backend.events().into_iter().map(|e| e.name).collect()
    }

    #[test]
    fn test_every_method_emits_its_name_once() {
        assert_eq!(emitted_names(|t| t.app_open()), ["App Open"]);
        assert_eq!(emitted_names(|t| t.app_close()), ["App Close"]);
        assert_eq!(emitted_names(|t| t.discovery_view()), ["Discovery List View"]);
        assert_eq!(
            emitted_names(|t| t.login_tout("header_nav")),
            ["Application Login or Signup"]
        );
        assert_eq!(emitted_names(|t| t.login_success()), ["Login"]);
        assert_eq!(emitted_names(|t| t.login_error()), ["Errored User Login"]);
        assert_eq!(
            emitted_names(|t| t.reset_password_view()),
            ["Forgot Password View"]
        );
        assert_eq!(
            emitted_names(|t| t.reset_password_success()),
            ["Forgot Password Requested"]
        );
        assert_eq!(
            emitted_names(|t| t.reset_password_error()),
            ["Forgot Password Errored"]
        );
        assert_eq!(emitted_names(|t| t.signup_success()), ["New User"]);
        assert_eq!(
            emitted_names(|t| t.signup_newsletter_toggle(false)),
            ["Signup Newsletter Toggle"]
        );
        assert_eq!(emitted_names(|t| t.facebook_confirmation()), ["Facebook Confirm"]);
        assert_eq!(
            emitted_names(|t| t.two_factor_auth_view()),
            ["Two-factor Authentication Confirm View"]
        );
        assert_eq!(
            emitted_names(|t| t.two_factor_auth_resend_code()),
            ["Two-factor Authentication Resend Code"]
        );
        assert_eq!(emitted_names(|t| t.project_search_view()), ["Discover Search"]);
        assert_eq!(
            emitted_names(|t| t.search_results("q", 1)),
            ["Discover Search Results"]
        );
        assert_eq!(
            emitted_names(|t| t.search_results("q", 2)),
            ["Discover Search Results Load More"]
        );
    }

    #[test]
    fn test_search_results_first_page() {
        let backend = RecordingBackend::new();
        tracker(&backend).search_results("shoes", 1);

        let event = backend.last().unwrap();
        assert_eq!(event.name, "Discover Search Results");
        assert_eq!(event.properties["search_term"], PropertyValue::from("shoes"));
        assert_eq!(event.properties["page_count"], PropertyValue::Int(1));
    }

    #[test]
    fn test_search_results_load_more() {
        let backend = RecordingBackend::new();
        tracker(&backend).search_results("shoes", 3);

        let event = backend.last().unwrap();
        assert_eq!(event.name, "Discover Search Results Load More");
        assert_eq!(event.properties["search_term"], PropertyValue::from("shoes"));
        assert_eq!(event.properties["page_count"], PropertyValue::Int(3));
    }

    #[test]
    fn test_login_tout_intent() {
        let backend = RecordingBackend::new();
        tracker(&backend).login_tout("header_nav");

        let event = backend.last().unwrap();
        assert_eq!(event.name, "Application Login or Signup");
        assert_eq!(event.properties["intent"], PropertyValue::from("header_nav"));
    }

    #[test]
    fn test_newsletter_toggle_is_boolean() {
        let backend = RecordingBackend::new();
        tracker(&backend).signup_newsletter_toggle(true);

        let event = backend.last().unwrap();
        assert_eq!(event.properties["send_newsletters"], PropertyValue::Bool(true));

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["properties"]["send_newsletters"], serde_json::json!(true));
    }

    #[test]
    fn test_events_include_all_defaults() {
        let backend = RecordingBackend::new();
        let tracker = tracker(&backend);
        tracker.app_open();
        tracker.search_results("shoes", 2);

        let defaults = tracker.default_properties().clone();
        assert_eq!(defaults.len(), 12);

        for event in backend.events() {
            for (key, value) in &defaults {
                assert_eq!(event.properties.get(key), Some(value), "missing {key}");
            }
        }
    }

    #[test]
    fn test_event_properties_override_defaults() {
        let backend = RecordingBackend::new();
        let tracker = tracker(&backend);

        let mut props = Properties::new();
        props.insert("model".into(), PropertyValue::from("override"));
        tracker.track("Custom", props);

        let event = backend.last().unwrap();
        assert_eq!(event.properties["model"], PropertyValue::from("override"));
        // Cached defaults stay untouched
        assert_eq!(
            tracker.default_properties()["model"],
            PropertyValue::from("iPhone10,3")
        );
    }

    #[test]
    fn test_events_arrive_in_call_order() {
        let backend = RecordingBackend::new();
        let tracker = tracker(&backend);
        tracker.login_tout("signup_button");
        tracker.app_close();

        let events = backend.events();
        assert_eq!(events[0].name, "Application Login or Signup");
        assert_eq!(events[1].name, "App Close");
        assert!(!events[1].properties.contains_key("intent"));
    }

    struct CountingHost {
        host_calls: Arc<AtomicUsize>,
    }

    impl HostEnvironment for CountingHost {
        fn manufacturer(&self) -> String {
            self.host_calls.fetch_add(1, Ordering::SeqCst);
            "Apple".to_string()
        }
        fn app_version(&self) -> Option<String> {
            None
        }
        fn app_release(&self) -> Option<String> {
            None
        }
        fn model(&self) -> Option<String> {
            None
        }
        fn os_name(&self) -> Option<String> {
            None
        }
        fn os_version(&self) -> Option<String> {
            None
        }
        fn screen_size(&self) -> Option<(f64, f64)> {
            None
        }
        fn idiom(&self) -> DeviceIdiom {
            DeviceIdiom::Tv
        }
    }

    #[test]
    fn test_defaults_collected_once() {
        let host_calls = Arc::new(AtomicUsize::new(0));
        let backend = RecordingBackend::new();
        let tracker = EventTracker::with_host(
            &backend,
            CountingHost {
                host_calls: Arc::clone(&host_calls),
            },
        );

        assert_eq!(host_calls.load(Ordering::SeqCst), 0);
        tracker.app_open();
        tracker.app_close();
        tracker.discovery_view();
        assert_eq!(host_calls.load(Ordering::SeqCst), 1);

        let event = backend.last().unwrap();
        assert_eq!(event.properties["client_platform"], PropertyValue::from("tvos"));
    }

    #[test]
    #[should_panic(expected = "backend failure")]
    fn test_backend_panic_propagates() {
        struct FailingBackend;
        impl TrackingBackend for FailingBackend {
            fn track(&self, _event: &str, _properties: &Properties) {
                panic!("backend failure");
            }
        }

        EventTracker::with_host(FailingBackend, test_host()).app_open();
    }

    #[test]
    fn test_tracked_event_properties() {
        assert!(TrackedEvent::AppOpen.properties().is_empty());
        let props = TrackedEvent::SearchResults {
            query: "q".into(),
            page_count: 5,
        }
        .properties();
        assert_eq!(props.len(), 2);
    }
}
