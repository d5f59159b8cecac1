//! Typed access over a [`Transport`]

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tracing::debug;

use crate::identity::{Identity, Session};
use crate::queries::AUTHENTICATE_USER;
use crate::token::TokenPair;
use crate::transport::{Operation, Transport};
use crate::ClientError;

/// Cloneable handle issuing operations through a shared transport stack
#[derive(Clone)]
pub struct GraphQLClient {
    transport: Arc<dyn Transport>,
}

impl GraphQLClient {
    pub fn new(transport: impl Transport + 'static) -> Self {
        Self {
            transport: Arc::new(transport),
        }
    }

    pub fn from_shared(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    /// Send an operation and return its `data`, applying the operation's error policy
    pub async fn execute(&self, operation: &Operation) -> crate::Result<Value> {
        let response = self.transport.send(operation).await?;
        response.into_result(operation.error_policy).map_err(|e| {
            debug!(operation = operation.label(), error = %e, "operation failed");
            e
        })
    }

    /// Send an operation and decode one root field of its `data`
    pub async fn fetch<T: DeserializeOwned>(
        &self,
        operation: &Operation,
        field: &str,
    ) -> crate::Result<T> {
        let mut data = self.execute(operation).await?;
        let value = data
            .get_mut(field)
            .map(Value::take)
            .unwrap_or(Value::Null);
        Ok(serde_json::from_value(value)?)
    }

    /// Exchange credentials for a token pair and start the session
    pub async fn login(
        &self,
        session: &Session,
        email: &str,
        password: &str,
    ) -> crate::Result<Identity> {
        let operation = Operation::new(AUTHENTICATE_USER)
            .variables(json!({ "email": email, "password": password }));
        let pair: Option<TokenPair> = self.fetch(&operation, "authenticateUser").await?;
        let pair = pair.ok_or(ClientError::NotAuthenticated)?;
        session.login(pair)
    }
}
