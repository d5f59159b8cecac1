//! GraphQL over HTTP
//!
//! Every operation is POSTed as `{query, variables, operationName}` to a single
//! endpoint. The bearer token is read from the [`TokenStore`] on each call, so a
//! token replaced by reauthentication is picked up without rebuilding anything.
//! Error extensions are decoded here into [`ErrorCode`]; nothing downstream
//! inspects raw JSON error shapes.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use reqwest::multipart::{Form, Part};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::token::TokenStore;
use crate::ClientError;

/// Outcome classification carried in `errors[].extensions.code`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorCode {
    Unauthenticated,
    Forbidden,
    BadUserInput,
    InternalServerError,
    Other(String),
    Unknown,
}

impl ErrorCode {
    pub fn parse(code: Option<&str>) -> Self {
        match code {
            Some("UNAUTHENTICATED") => ErrorCode::Unauthenticated,
            Some("FORBIDDEN") => ErrorCode::Forbidden,
            Some("BAD_USER_INPUT") => ErrorCode::BadUserInput,
            Some("INTERNAL_SERVER_ERROR") => ErrorCode::InternalServerError,
            Some(other) => ErrorCode::Other(other.to_string()),
            None => ErrorCode::Unknown,
        }
    }
}

/// Application-level error returned by the backend
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "WireError")]
pub struct GraphQLError {
    pub message: String,
    pub path: Vec<Value>,
    pub code: ErrorCode,
}

#[derive(Deserialize)]
struct WireError {
    #[serde(default)]
    message: String,
    #[serde(default)]
    path: Option<Vec<Value>>,
    #[serde(default)]
    extensions: Option<WireExtensions>,
}

#[derive(Deserialize)]
struct WireExtensions {
    #[serde(default)]
    code: Option<String>,
}

impl From<WireError> for GraphQLError {
    fn from(wire: WireError) -> Self {
        let code = ErrorCode::parse(wire.extensions.as_ref().and_then(|e| e.code.as_deref()));
        Self {
            message: wire.message,
            path: wire.path.unwrap_or_default(),
            code,
        }
    }
}

/// How errors accompanying data are treated
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ErrorPolicy {
    /// Any error fails the operation
    #[default]
    None,
    /// Data is returned when present; errors are logged
    All,
}

/// File attached to an operation variable
#[derive(Debug, Clone)]
pub struct Upload {
    pub filename: String,
    pub content_type: String,
    pub data: Vec<u8>,
}

/// A query or mutation ready to send
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Operation {
    pub query: String,
    pub variables: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operation_name: Option<String>,
    #[serde(skip)]
    pub error_policy: ErrorPolicy,
    #[serde(skip)]
    pub uploads: Vec<(String, Upload)>,
}

impl Operation {
    pub fn new(query: impl Into<String>) -> Self {
        let query = query.into();
        let operation_name = parse_operation_name(&query);
        Self {
            query,
            variables: json!({}),
            operation_name,
            error_policy: ErrorPolicy::None,
            uploads: Vec::new(),
        }
    }

    pub fn variables(mut self, variables: Value) -> Self {
        self.variables = variables;
        self
    }

    pub fn error_policy(mut self, policy: ErrorPolicy) -> Self {
        self.error_policy = policy;
        self
    }

    /// Attach a file to a top-level variable, sent as a multipart request
    pub fn upload(mut self, variable: &str, file: Upload) -> Self {
        if let Value::Object(vars) = &mut self.variables {
            vars.insert(variable.to_string(), Value::Null);
        }
        self.uploads.push((format!("variables.{variable}"), file));
        self
    }

    /// Name used in logs
    pub fn label(&self) -> &str {
        self.operation_name.as_deref().unwrap_or("anonymous")
    }
}

fn parse_operation_name(query: &str) -> Option<String> {
    let rest = query
        .trim_start()
        .strip_prefix("query")
        .or_else(|| query.trim_start().strip_prefix("mutation"))?;
    let name: String = rest
        .trim_start()
        .chars()
        .take_while(|c| c.is_alphanumeric() || *c == '_')
        .collect();
    (!name.is_empty()).then_some(name)
}

/// GraphQL response envelope
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Response {
    #[serde(default)]
    pub data: Option<Value>,
    #[serde(default)]
    pub errors: Vec<GraphQLError>,
}

impl Response {
    pub fn from_data(data: Value) -> Self {
        Self {
            data: Some(data),
            errors: Vec::new(),
        }
    }

    pub fn from_errors(errors: Vec<GraphQLError>) -> Self {
        Self { data: None, errors }
    }

    pub fn is_unauthenticated(&self) -> bool {
        self.errors
            .iter()
            .any(|e| e.code == ErrorCode::Unauthenticated)
    }

    pub fn into_result(self, policy: ErrorPolicy) -> crate::Result<Value> {
        if self.errors.is_empty() {
            return Ok(self.data.unwrap_or(Value::Null));
        }
        match (policy, self.data) {
            (ErrorPolicy::All, Some(data)) if !data.is_null() => {
                for error in &self.errors {
                    warn!(message = %error.message, code = ?error.code, "partial response");
                }
                Ok(data)
            }
            _ => Err(ClientError::GraphQL(self.errors)),
        }
    }
}

/// Sends operations to the backend
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, operation: &Operation) -> crate::Result<Response>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Arc<T> {
    async fn send(&self, operation: &Operation) -> crate::Result<Response> {
        (**self).send(operation).await
    }
}

/// HTTP transport attaching the stored bearer token to every request
pub struct HttpTransport {
    client: reqwest::Client,
    endpoint: String,
    store: Arc<dyn TokenStore>,
}

impl HttpTransport {
    pub fn new(endpoint: impl Into<String>, store: Arc<dyn TokenStore>) -> crate::Result<Self> {
        Self::with_timeout(endpoint, store, Duration::from_secs(30))
    }

    pub fn with_timeout(
        endpoint: impl Into<String>,
        store: Arc<dyn TokenStore>,
        timeout: Duration,
    ) -> crate::Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(client, endpoint, store))
    }

    pub fn with_client(
        client: reqwest::Client,
        endpoint: impl Into<String>,
        store: Arc<dyn TokenStore>,
    ) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
            store,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn multipart(operation: &Operation) -> crate::Result<Form> {
        let mut map = serde_json::Map::new();
        for (index, (path, _)) in operation.uploads.iter().enumerate() {
            map.insert(index.to_string(), json!([path]));
        }

        let mut form = Form::new()
            .text("operations", serde_json::to_string(operation)?)
            .text("map", Value::Object(map).to_string());

        for (index, (_, file)) in operation.uploads.iter().enumerate() {
            let part = Part::bytes(file.data.clone())
                .file_name(file.filename.clone())
                .mime_str(&file.content_type)?;
            form = form.part(index.to_string(), part);
        }
        Ok(form)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, operation: &Operation) -> crate::Result<Response> {
        let mut request = self.client.post(&self.endpoint);

        let store = Arc::clone(&self.store);
        let pair = tokio::task::spawn_blocking(move || store.get())
            .await
            .map_err(|e| ClientError::Transport(format!("token store read failed: {e}")))?;
        if let Some(pair) = pair {
            request = request.header(AUTHORIZATION, format!("Bearer {}", pair.access_token));
        }

        request = if operation.uploads.is_empty() {
            request.json(operation)
        } else {
            request.multipart(Self::multipart(operation)?)
        };

        let response = request.send().await?;
        let status = response.status();
        let body = response.bytes().await?;
        debug!(operation = operation.label(), %status, bytes = body.len(), "graphql response");

        match serde_json::from_slice::<Response>(&body) {
            // Servers may answer auth and validation failures with a 4xx status
            // and a regular GraphQL error body.
            Ok(parsed) if parsed.data.is_some() || !parsed.errors.is_empty() => Ok(parsed),
            _ if !status.is_success() => Err(ClientError::Transport(format!(
                "{} returned HTTP {}",
                operation.label(),
                status
            ))),
            Ok(_) => Err(ClientError::Transport(format!(
                "{} returned neither data nor errors",
                operation.label()
            ))),
            Err(e) => Err(ClientError::Transport(format!(
                "{} returned an invalid body: {}",
                operation.label(),
                e
            ))),
        }
    }
}
