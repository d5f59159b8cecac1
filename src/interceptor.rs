//! Reauthentication on `UNAUTHENTICATED`
//!
//! Wraps any [`Transport`]. When a response carries an `UNAUTHENTICATED` error
//! the stored refresh token is exchanged for a new access token and the original
//! operation is replayed once. The refresh mutation and the replay both go to the
//! inner transport, so neither can trigger another refresh.
//!
//! Refreshes are serialized. An operation rejected with a token that another
//! operation has already replaced skips the exchange and replays with the
//! stored token, so concurrent requests spend the refresh token once.
//!
//! ```text
//! Dispatched ──ok / other error──────────────────────────▶ Passthrough
//!     │ UNAUTHENTICATED
//!     ▼
//! Refreshing ──refresh failed────────────────────────────▶ Failed (original response)
//!     │ new access token stored
//!     ▼
//! Replaying ──any outcome────────────────────────────────▶ Done (replay response)
//! ```

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::identity::Session;
use crate::queries::UPDATE_TOKEN;
use crate::transport::{ErrorPolicy, Operation, Response, Transport};

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateTokenData {
    update_token: UpdatedToken,
}

#[derive(Deserialize)]
struct UpdatedToken {
    token: String,
}

/// Transport decorator performing at most one refresh and one replay per operation
pub struct ReauthInterceptor<T> {
    inner: T,
    session: Session,
    refreshing: Mutex<()>,
}

impl<T: Transport> ReauthInterceptor<T> {
    pub fn new(inner: T, session: Session) -> Self {
        Self {
            inner,
            session,
            refreshing: Mutex::new(()),
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn inner(&self) -> &T {
        &self.inner
    }

    fn current_access_token(&self) -> Option<String> {
        self.session.store().get().map(|pair| pair.access_token)
    }

    /// Exchange the stored refresh token and install the new access token
    async fn refresh(&self) -> crate::Result<()> {
        let pair = self
            .session
            .store()
            .get()
            .ok_or(crate::ClientError::NotAuthenticated)?;

        let operation = Operation::new(UPDATE_TOKEN)
            .variables(json!({ "refreshToken": pair.refresh_token }));
        let data = self
            .inner
            .send(&operation)
            .await?
            .into_result(ErrorPolicy::None)?;
        let refreshed: UpdateTokenData = serde_json::from_value(data)?;

        self.session
            .install_access_token(&refreshed.update_token.token)?;
        Ok(())
    }
}

#[async_trait]
impl<T: Transport> Transport for ReauthInterceptor<T> {
    async fn send(&self, operation: &Operation) -> crate::Result<Response> {
        let sent_with = self.current_access_token();
        let response = self.inner.send(operation).await?;
        if !response.is_unauthenticated() {
            return Ok(response);
        }

        {
            let _refreshing = self.refreshing.lock().await;
            let current = self.current_access_token();
            if current.is_some() && current != sent_with {
                debug!(operation = operation.label(), "access token already refreshed");
            } else {
                debug!(operation = operation.label(), "access token rejected, refreshing");
                if let Err(e) = self.refresh().await {
                    warn!(operation = operation.label(), error = %e, "token refresh failed");
                    return Ok(response);
                }
            }
        }

        info!(operation = operation.label(), "token refreshed, replaying");
        self.inner.send(operation).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::{MemoryTokenStore, TokenPair, TokenStore};
    use crate::transport::{ErrorCode, GraphQLError};
    use crate::ClientError;
    use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    /// Replies from a script and records every operation it receives
    #[derive(Default)]
    struct ScriptedTransport {
        replies: Mutex<VecDeque<crate::Result<Response>>>,
        sent: Mutex<Vec<Operation>>,
    }

    impl ScriptedTransport {
        fn new(replies: Vec<crate::Result<Response>>) -> Self {
            Self {
                replies: Mutex::new(replies.into()),
                sent: Mutex::default(),
            }
        }

        fn sent_labels(&self) -> Vec<String> {
            self.sent
                .lock()
                .unwrap()
                .iter()
                .map(|op| op.label().to_string())
                .collect()
        }
    }

    #[async_trait]
    impl Transport for ScriptedTransport {
        async fn send(&self, operation: &Operation) -> crate::Result<Response> {
            self.sent.lock().unwrap().push(operation.clone());
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(ClientError::Transport("script exhausted".into())))
        }
    }

    fn token(user_id: i64) -> String {
        let claims = json!({
            "userId": user_id,
            "userName": "admin",
            "role": "SuperUser",
            "customerId": 2
        });
        format!(
            "h.{}.s",
            URL_SAFE_NO_PAD.encode(claims.to_string())
        )
    }

    fn unauthenticated() -> crate::Result<Response> {
        Ok(Response::from_errors(vec![GraphQLError {
            message: "jwt expired".into(),
            path: vec![],
            code: ErrorCode::Unauthenticated,
        }]))
    }

    fn refreshed(token: &str) -> crate::Result<Response> {
        Ok(Response::from_data(json!({ "updateToken": { "token": token } })))
    }

    fn setup(replies: Vec<crate::Result<Response>>) -> (Arc<ScriptedTransport>, Session, ReauthInterceptor<Arc<ScriptedTransport>>) {
        let store: Arc<dyn TokenStore> =
            Arc::new(MemoryTokenStore::with_pair(TokenPair::new(token(1), "refresh-1")));
        let session = Session::initialize(store);
        let inner = Arc::new(ScriptedTransport::new(replies));
        let interceptor = ReauthInterceptor::new(inner.clone(), session.clone());
        (inner, session, interceptor)
    }

    fn get_profile() -> Operation {
        Operation::new("query GetProfile($id: ID!) { getProfile(id: $id) { id } }")
            .variables(json!({"id": "7"}))
    }

    #[tokio::test]
    async fn test_passthrough_on_success() {
        let (inner, _, interceptor) =
            setup(vec![Ok(Response::from_data(json!({"getProfile": {"id": "7"}})))]);

        let response = interceptor.send(&get_profile()).await.unwrap();
        assert!(response.errors.is_empty());
        assert_eq!(inner.sent_labels(), vec!["GetProfile"]);
    }

    #[tokio::test]
    async fn test_other_errors_are_not_retried() {
        let forbidden = Ok(Response::from_errors(vec![GraphQLError {
            message: "no".into(),
            path: vec![],
            code: ErrorCode::Forbidden,
        }]));
        let (inner, _, interceptor) = setup(vec![forbidden]);

        let response = interceptor.send(&get_profile()).await.unwrap();
        assert_eq!(response.errors[0].code, ErrorCode::Forbidden);
        assert_eq!(inner.sent_labels().len(), 1);
    }

    #[tokio::test]
    async fn test_single_refresh_and_single_replay() {
        let new_token = token(99);
        let (inner, session, interceptor) = setup(vec![
            unauthenticated(),
            refreshed(&new_token),
            Ok(Response::from_data(json!({"getProfile": {"id": "7"}}))),
        ]);

        let response = interceptor.send(&get_profile()).await.unwrap();
        assert_eq!(response.data.unwrap()["getProfile"]["id"], "7");
        assert_eq!(
            inner.sent_labels(),
            vec!["GetProfile", "UpdateToken", "GetProfile"]
        );

        let sent = inner.sent.lock().unwrap();
        assert_eq!(sent[1].variables, json!({"refreshToken": "refresh-1"}));
        assert_eq!(sent[2].variables, sent[0].variables);
        drop(sent);

        let stored = session.store().get().unwrap();
        assert_eq!(stored.access_token, new_token);
        assert_eq!(stored.refresh_token, "refresh-1");
        assert_eq!(session.identity().unwrap().user_id, 99);
    }

    #[tokio::test]
    async fn test_failed_refresh_surfaces_original_error() {
        let (inner, session, interceptor) = setup(vec![unauthenticated(), unauthenticated()]);

        let response = interceptor.send(&get_profile()).await.unwrap();
        assert!(response.is_unauthenticated());
        assert_eq!(inner.sent_labels(), vec!["GetProfile", "UpdateToken"]);
        assert_eq!(session.identity().unwrap().user_id, 1);
    }

    #[tokio::test]
    async fn test_refresh_transport_failure_surfaces_original_error() {
        let (inner, _, interceptor) = setup(vec![
            unauthenticated(),
            Err(ClientError::Transport("connection reset".into())),
        ]);

        let response = interceptor.send(&get_profile()).await.unwrap();
        assert!(response.is_unauthenticated());
        assert_eq!(inner.sent_labels().len(), 2);
    }

    #[tokio::test]
    async fn test_unauthenticated_replay_does_not_loop() {
        let (inner, _, interceptor) = setup(vec![
            unauthenticated(),
            refreshed(&token(5)),
            unauthenticated(),
        ]);

        let response = interceptor.send(&get_profile()).await.unwrap();
        assert!(response.is_unauthenticated());
        assert_eq!(
            inner.sent_labels(),
            vec!["GetProfile", "UpdateToken", "GetProfile"]
        );
    }

    #[tokio::test]
    async fn test_no_refresh_token_stored() {
        let (inner, session, interceptor) = setup(vec![unauthenticated()]);
        session.store().remove().unwrap();

        let response = interceptor.send(&get_profile()).await.unwrap();
        assert!(response.is_unauthenticated());
        assert_eq!(inner.sent_labels().len(), 1);
    }

    /// Rotates the stored token on the first call, as a concurrent refresh would
    struct RotatedElsewhere {
        store: Arc<dyn TokenStore>,
        rotated_to: String,
        scripted: ScriptedTransport,
    }

    #[async_trait]
    impl Transport for RotatedElsewhere {
        async fn send(&self, operation: &Operation) -> crate::Result<Response> {
            if self.scripted.sent.lock().unwrap().is_empty() {
                self.store
                    .set(&TokenPair::new(self.rotated_to.clone(), "refresh-1"))
                    .unwrap();
            }
            self.scripted.send(operation).await
        }
    }

    #[tokio::test]
    async fn test_token_replaced_meanwhile_replays_without_refresh() {
        let store: Arc<dyn TokenStore> =
            Arc::new(MemoryTokenStore::with_pair(TokenPair::new(token(1), "refresh-1")));
        let session = Session::initialize(store.clone());
        let inner = Arc::new(RotatedElsewhere {
            store,
            rotated_to: token(2),
            scripted: ScriptedTransport::new(vec![
                unauthenticated(),
                Ok(Response::from_data(json!({"getProfile": {"id": "7"}}))),
            ]),
        });
        let interceptor = ReauthInterceptor::new(inner.clone(), session);

        let response = interceptor.send(&get_profile()).await.unwrap();
        assert!(response.errors.is_empty());
        assert_eq!(inner.scripted.sent_labels(), vec!["GetProfile", "GetProfile"]);
    }

    #[tokio::test]
    async fn test_transport_error_propagates_without_refresh() {
        let (inner, _, interceptor) =
            setup(vec![Err(ClientError::Transport("timeout".into()))]);

        let err = interceptor.send(&get_profile()).await.unwrap_err();
        assert!(matches!(err, ClientError::Transport(_)));
        assert_eq!(inner.sent_labels().len(), 1);
    }
}
