//! # wlan-portal-client
//!
//! Authenticated GraphQL data-access layer for the WLAN cloud portal.
//!
//! ## Features
//!
//! - **Token Store** - durable access/refresh token pair
//! - **Session Identity** - user identity decoded from the access token
//! - **HTTP Transport** - bearer-authenticated GraphQL over HTTP POST
//! - **Reauthentication** - refresh-token exchange and single replay on `UNAUTHENTICATED`
//! - **Cursor Pagination** - incremental "load more" over `{items, context}` pages
//! - **Screens** - profile, equipment and client-session compositions
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use wlan_portal_client::{
//!     GraphQLClient, HttpTransport, MemoryTokenStore, ReauthInterceptor, Session, TokenStore,
//! };
//!
//! # async fn example() -> wlan_portal_client::Result<()> {
//! let store: Arc<dyn TokenStore> = Arc::new(MemoryTokenStore::default());
//! let session = Session::initialize(store.clone());
//! let http = HttpTransport::new("http://localhost:4000/", store)?;
//! let client = GraphQLClient::new(ReauthInterceptor::new(http, session.clone()));
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod identity;
pub mod interceptor;
pub mod models;
pub mod pagination;
pub mod queries;
pub mod screens;
pub mod token;
pub mod transport;

pub use client::GraphQLClient;
pub use config::{ClientConfig, MetricsAnchor, MetricsWindow};
pub use identity::{derive_from_token, DecodeError, Identity, Session};
pub use interceptor::ReauthInterceptor;
pub use pagination::{Page, PageContext, PaginatedQuery};
pub use token::{FileTokenStore, MemoryTokenStore, TokenPair, TokenStore, AUTH_TOKEN};
pub use transport::{
    ErrorCode, ErrorPolicy, GraphQLError, HttpTransport, Operation, Response, Transport, Upload,
};

use thiserror::Error;

/// Client errors
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("GraphQL error: {}", join_messages(.0))]
    GraphQL(Vec<GraphQLError>),

    #[error("Token decode error: {0}")]
    Decode(#[from] DecodeError),

    #[error("No further page to load")]
    NotApplicable,

    #[error("Not authenticated")]
    NotAuthenticated,

    #[error("Storage error: {0}")]
    Storage(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl ClientError {
    /// True when any GraphQL error carries the `UNAUTHENTICATED` code
    pub fn is_unauthenticated(&self) -> bool {
        match self {
            ClientError::GraphQL(errors) => errors
                .iter()
                .any(|e| e.code == ErrorCode::Unauthenticated),
            _ => false,
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        ClientError::Transport(err.to_string())
    }
}

fn join_messages(errors: &[GraphQLError]) -> String {
    errors
        .iter()
        .map(|e| e.message.as_str())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Result type for client operations
pub type Result<T> = std::result::Result<T, ClientError>;
