//! Screen compositions
//!
//! A screen issues its queries through the shared client, exposes one async
//! method per user action, and reports each action's outcome as exactly one
//! [`Notification`]. Query failures become an error view; mutation failures only
//! notify and leave loaded data as it was. `render()` is the only place a screen
//! decides to navigate away.

pub mod access_point_details;
pub mod access_points;
pub mod add_profile;
pub mod client_devices;
pub mod network;
pub mod profile_details;

pub use access_point_details::{AccessPointDetails, AccessPointDetailsData, MetricsState};
pub use access_points::{format_uptime, AccessPointRow, AccessPoints};
pub use add_profile::AddProfile;
pub use client_devices::ClientDevices;
pub use network::Network;
pub use profile_details::{ProfileDetails, ProfileDetailsData};

use std::sync::{Arc, Mutex, PoisonError};

use serde_json::json;
use tracing::{info, warn};

use crate::client::GraphQLClient;
use crate::identity::{Identity, Session};
use crate::models::ProfileSummary;
use crate::pagination::Page;
use crate::queries::GET_ALL_PROFILES;
use crate::transport::Operation;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Success,
    Error,
}

/// Transient user-visible message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub kind: NotificationKind,
    pub message: String,
    pub description: String,
}

impl Notification {
    pub fn success(description: impl Into<String>) -> Self {
        Self {
            kind: NotificationKind::Success,
            message: "Success".to_string(),
            description: description.into(),
        }
    }

    pub fn error(description: impl Into<String>) -> Self {
        Self {
            kind: NotificationKind::Error,
            message: "Error".to_string(),
            description: description.into(),
        }
    }
}

/// Presentation collaborator showing notifications
pub trait Notifier: Send + Sync {
    fn notify(&self, notification: Notification);
}

/// Writes notifications to the log
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, notification: Notification) {
        match notification.kind {
            NotificationKind::Success => info!(description = %notification.description, "{}", notification.message),
            NotificationKind::Error => warn!(description = %notification.description, "{}", notification.message),
        }
    }
}

/// Keeps every notification, for callers that display them later
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    notifications: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    pub fn take(&self) -> Vec<Notification> {
        std::mem::take(
            &mut *self
                .notifications
                .lock()
                .unwrap_or_else(PoisonError::into_inner),
        )
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notification: Notification) {
        self.notifications
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(notification);
    }
}

/// Collaborators every screen is constructed with
#[derive(Clone)]
pub struct ScreenContext {
    pub client: GraphQLClient,
    pub identity: Identity,
    pub notifier: Arc<dyn Notifier>,
}

impl ScreenContext {
    /// Fails with `NotAuthenticated` until the session has an identity
    pub fn new(
        client: GraphQLClient,
        session: &Session,
        notifier: Arc<dyn Notifier>,
    ) -> crate::Result<Self> {
        Ok(Self {
            client,
            identity: session.require_identity()?,
            notifier,
        })
    }

    pub fn customer_id(&self) -> i64 {
        self.identity.customer_id
    }

    /// Emit the single notification for an action outcome
    pub(crate) fn report<T>(
        &self,
        result: crate::Result<T>,
        success: &str,
        failure: &str,
    ) -> Option<T> {
        match result {
            Ok(value) => {
                self.notifier.notify(Notification::success(success));
                Some(value)
            }
            Err(e) => {
                warn!(error = %e, "{failure}");
                self.notifier.notify(Notification::error(failure));
                None
            }
        }
    }

    /// First page of profiles of one type
    pub(crate) async fn profiles_of_type(
        &self,
        profile_type: &str,
        limit: Option<i64>,
    ) -> crate::Result<Vec<ProfileSummary>> {
        let mut variables = json!({ "customerId": self.customer_id(), "type": profile_type });
        if let Some(limit) = limit {
            variables["limit"] = json!(limit);
        }
        let operation = Operation::new(GET_ALL_PROFILES).variables(variables);
        let page: Option<Page<ProfileSummary>> =
            self.client.fetch(&operation, "getAllProfiles").await?;
        Ok(page.map(|p| p.items).unwrap_or_default())
    }
}

/// What a screen shows right now
#[derive(Debug, PartialEq)]
pub enum View<'a, T: ?Sized> {
    Loading,
    Error(&'static str),
    Redirect(&'static str),
    Page(&'a T),
}

/// Query-backed screen data
#[derive(Debug, Clone, PartialEq)]
pub enum LoadState<T> {
    Loading,
    Failed(&'static str),
    Loaded(T),
}

impl<T> LoadState<T> {
    pub fn view(&self) -> View<'_, T> {
        match self {
            LoadState::Loading => View::Loading,
            LoadState::Failed(message) => View::Error(*message),
            LoadState::Loaded(data) => View::Page(data),
        }
    }

    pub fn data(&self) -> Option<&T> {
        match self {
            LoadState::Loaded(data) => Some(data),
            _ => None,
        }
    }

    pub fn data_mut(&mut self) -> Option<&mut T> {
        match self {
            LoadState::Loaded(data) => Some(data),
            _ => None,
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::{MemoryTokenStore, TokenStore};
    use crate::ClientError;

    #[test]
    fn test_context_requires_identity() {
        let store: Arc<dyn TokenStore> = Arc::new(MemoryTokenStore::default());
        let session = Session::initialize(store);
        let backend = Arc::new(testing::CannedBackend::default());

        let result = ScreenContext::new(
            GraphQLClient::new(backend),
            &session,
            Arc::new(LogNotifier),
        );
        assert!(matches!(result, Err(ClientError::NotAuthenticated)));
    }

    #[test]
    fn test_report_emits_exactly_one_notification() {
        let backend = Arc::new(testing::CannedBackend::default());
        let (ctx, notifier) = testing::context(&backend);

        assert_eq!(ctx.report(Ok(1), "done", "failed"), Some(1));
        assert_eq!(notifier.take(), vec![Notification::success("done")]);

        let failed: crate::Result<()> = Err(ClientError::Transport("down".into()));
        assert_eq!(ctx.report(failed, "done", "failed"), None);
        assert_eq!(notifier.take(), vec![Notification::error("failed")]);
    }

    #[test]
    fn test_load_state_views() {
        let loading: LoadState<u8> = LoadState::Loading;
        assert_eq!(loading.view(), View::Loading);
        assert_eq!(LoadState::<u8>::Failed("boom").view(), View::Error("boom"));
        assert_eq!(LoadState::Loaded(3u8).view(), View::Page(&3));
    }
}
