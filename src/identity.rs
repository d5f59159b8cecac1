//! Session identity decoded from the access token
//!
//! The identity is never stored on its own: it is derived from whatever access
//! token the [`TokenStore`] currently holds and republished whenever that token
//! changes (login, reauthentication, logout).

use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use base64::{
    engine::general_purpose::{URL_SAFE, URL_SAFE_NO_PAD},
    Engine as _,
};
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::token::{TokenPair, TokenStore};

/// Role granted access to the accounts area
pub const SUPER_USER_ROLE: &str = "SuperUser";

/// Malformed access token
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("expected 3 token segments, found {0}")]
    SegmentCount(usize),

    #[error("payload is not base64url: {0}")]
    Base64(String),

    #[error("payload is not a valid claims document: {0}")]
    Claims(String),
}

/// Authenticated user, as carried in the access token claims
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    #[serde(deserialize_with = "numeric_claim")]
    pub user_id: i64,
    pub user_name: String,
    pub role: String,
    #[serde(deserialize_with = "numeric_claim")]
    pub customer_id: i64,
}

impl Identity {
    pub fn is_super_user(&self) -> bool {
        self.role == SUPER_USER_ROLE
    }
}

// Claims issued by older backends carry ids as strings.
fn numeric_claim<'de, D>(deserializer: D) -> std::result::Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Claim {
        Number(i64),
        Text(String),
    }

    match Claim::deserialize(deserializer)? {
        Claim::Number(n) => Ok(n),
        Claim::Text(s) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}

/// Decode the identity from an access token's payload segment
///
/// The signature is not verified here; the backend does that on every request.
pub fn derive_from_token(access_token: &str) -> Result<Identity, DecodeError> {
    let segments: Vec<&str> = access_token.split('.').collect();
    if segments.len() != 3 {
        return Err(DecodeError::SegmentCount(segments.len()));
    }

    let payload = segments[1];
    let bytes = if payload.ends_with('=') {
        URL_SAFE.decode(payload)
    } else {
        URL_SAFE_NO_PAD.decode(payload)
    }
    .map_err(|e| DecodeError::Base64(e.to_string()))?;

    serde_json::from_slice(&bytes).map_err(|e| DecodeError::Claims(e.to_string()))
}

/// Explicit session context shared by the transport stack and every screen
///
/// Cloning is cheap; all clones observe the same identity.
#[derive(Clone)]
pub struct Session {
    inner: Arc<SessionInner>,
}

struct SessionInner {
    store: Arc<dyn TokenStore>,
    identity: RwLock<Option<Identity>>,
}

impl Session {
    /// Read the stored token once and derive the starting identity
    ///
    /// An absent or undecodable token yields a logged-out session.
    pub fn initialize(store: Arc<dyn TokenStore>) -> Self {
        let identity = store.get().and_then(|pair| {
            derive_from_token(&pair.access_token)
                .map_err(|e| warn!(error = %e, "stored access token is not decodable"))
                .ok()
        });

        if let Some(identity) = &identity {
            debug!(user = %identity.user_name, customer_id = identity.customer_id, "session restored");
        }

        Self {
            inner: Arc::new(SessionInner {
                store,
                identity: RwLock::new(identity),
            }),
        }
    }

    pub fn store(&self) -> &Arc<dyn TokenStore> {
        &self.inner.store
    }

    /// Current identity snapshot, `None` when logged out
    pub fn identity(&self) -> Option<Identity> {
        self.inner
            .identity
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn require_identity(&self) -> crate::Result<Identity> {
        self.identity().ok_or(crate::ClientError::NotAuthenticated)
    }

    pub fn is_logged_in(&self) -> bool {
        self.identity().is_some()
    }

    /// Persist a freshly issued pair and publish its identity
    pub fn login(&self, pair: TokenPair) -> crate::Result<Identity> {
        let identity = derive_from_token(&pair.access_token)?;
        self.inner.store.set(&pair)?;
        self.publish(Some(identity.clone()));
        info!(user = %identity.user_name, "logged in");
        Ok(identity)
    }

    /// Replace the access token, keeping the stored refresh token
    pub fn install_access_token(&self, access_token: &str) -> crate::Result<Identity> {
        let current = self
            .inner
            .store
            .get()
            .ok_or(crate::ClientError::NotAuthenticated)?;
        let identity = derive_from_token(access_token)?;
        self.inner
            .store
            .set(&TokenPair::new(access_token, current.refresh_token))?;
        self.publish(Some(identity.clone()));
        debug!(user = %identity.user_name, "access token replaced");
        Ok(identity)
    }

    pub fn logout(&self) -> crate::Result<()> {
        self.inner.store.remove()?;
        self.publish(None);
        info!("logged out");
        Ok(())
    }

    fn publish(&self, identity: Option<Identity>) {
        *self
            .inner
            .identity
            .write()
            .unwrap_or_else(PoisonError::into_inner) = identity;
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("identity", &self.identity())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::MemoryTokenStore;

    fn token_for(claims: &serde_json::Value) -> String {
        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
        let payload = URL_SAFE_NO_PAD.encode(claims.to_string());
        format!("{header}.{payload}.signature")
    }

    fn identity(user_id: i64, role: &str) -> Identity {
        Identity {
            user_id,
            user_name: format!("user-{user_id}@example.com"),
            role: role.to_string(),
            customer_id: 2,
        }
    }

    #[test]
    fn test_round_trip_through_token() {
        for expected in [identity(1, "SuperUser"), identity(42, "CustomerIT")] {
            let mut claims = serde_json::to_value(&expected).unwrap();
            claims["exp"] = serde_json::json!(1_900_000_000);
            claims["iat"] = serde_json::json!(1_800_000_000);

            let derived = derive_from_token(&token_for(&claims)).unwrap();
            assert_eq!(derived.is_super_user(), expected.role == SUPER_USER_ROLE);
            assert_eq!(derived, expected);
        }
    }

    #[test]
    fn test_padded_payload_and_string_ids() {
        let claims = serde_json::json!({
            "userId": "7",
            "userName": "ops",
            "role": "CustomerIT",
            "customerId": "2",
        });
        let header = URL_SAFE.encode(br#"{"alg":"none"}"#);
        let payload = URL_SAFE.encode(claims.to_string());
        let token = format!("{header}.{payload}.");

        let identity = derive_from_token(&token).unwrap();
        assert_eq!(identity.user_id, 7);
        assert_eq!(identity.customer_id, 2);
        assert!(!identity.is_super_user());
    }

    #[test]
    fn test_malformed_tokens() {
        assert_eq!(
            derive_from_token("not-a-token"),
            Err(DecodeError::SegmentCount(1))
        );
        assert!(matches!(
            derive_from_token("a.%%%.c"),
            Err(DecodeError::Base64(_))
        ));

        let not_json = format!("a.{}.c", URL_SAFE_NO_PAD.encode("hello"));
        assert!(matches!(
            derive_from_token(&not_json),
            Err(DecodeError::Claims(_))
        ));

        let missing_fields = token_for(&serde_json::json!({"userId": 1}));
        assert!(matches!(
            derive_from_token(&missing_fields),
            Err(DecodeError::Claims(_))
        ));
    }

    #[test]
    fn test_session_lifecycle() {
        let store: Arc<dyn TokenStore> = Arc::new(MemoryTokenStore::default());
        let session = Session::initialize(store.clone());
        assert!(session.identity().is_none());
        assert!(matches!(
            session.require_identity(),
            Err(crate::ClientError::NotAuthenticated)
        ));

        let first = identity(1, "SuperUser");
        let token = token_for(&serde_json::to_value(&first).unwrap());
        session.login(TokenPair::new(token, "refresh")).unwrap();
        assert_eq!(session.identity(), Some(first));

        let second = identity(9, "CustomerIT");
        let token = token_for(&serde_json::to_value(&second).unwrap());
        session.install_access_token(&token).unwrap();
        assert_eq!(session.identity(), Some(second));
        assert_eq!(store.get().unwrap().refresh_token, "refresh");
        assert_eq!(store.get().unwrap().access_token, token);

        session.logout().unwrap();
        assert!(session.identity().is_none());
        assert!(store.get().is_none());
    }

    #[test]
    fn test_initialize_from_stored_token() {
        let expected = identity(3, "SuperUser");
        let token = token_for(&serde_json::to_value(&expected).unwrap());
        let store = Arc::new(MemoryTokenStore::with_pair(TokenPair::new(token, "r")));

        let session = Session::initialize(store);
        assert_eq!(session.identity(), Some(expected));
    }

    #[test]
    fn test_initialize_with_corrupt_token_is_logged_out() {
        let store = Arc::new(MemoryTokenStore::with_pair(TokenPair::new("garbage", "r")));
        let session = Session::initialize(store);
        assert!(!session.is_logged_in());
    }

    #[test]
    fn test_login_rejects_undecodable_token_without_writing() {
        let store: Arc<dyn TokenStore> = Arc::new(MemoryTokenStore::default());
        let session = Session::initialize(store.clone());

        let err = session.login(TokenPair::new("bad", "r")).unwrap_err();
        assert!(matches!(err, crate::ClientError::Decode(_)));
        assert!(store.get().is_none());
    }
}
