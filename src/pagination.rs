//! Cursor pagination over `{items, context {cursor, lastPage}}` lists

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::debug;

use crate::client::GraphQLClient;
use crate::transport::{ErrorPolicy, Operation};
use crate::ClientError;

/// Position returned with each page
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageContext {
    pub cursor: Option<String>,
    #[serde(default)]
    pub last_page: bool,
}

/// One page of a list query
#[derive(Debug, Clone, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct Page<T> {
    #[serde(default = "Vec::new")]
    pub items: Vec<T>,
    #[serde(default)]
    pub context: PageContext,
}

/// Incrementally loaded list
///
/// Pages are appended in fetch order; the backend guarantees that pages are
/// disjoint, so nothing is re-sorted or de-duplicated. Changing the filter
/// variables discards everything and starts again from the first page.
pub struct PaginatedQuery<T> {
    client: GraphQLClient,
    query: &'static str,
    field: &'static str,
    error_policy: ErrorPolicy,
    variables: Value,
    items: Vec<T>,
    context: Option<PageContext>,
}

impl<T: DeserializeOwned> PaginatedQuery<T> {
    /// Create a runner for `query`, whose page lives under the root `field`
    pub fn new(client: GraphQLClient, query: &'static str, field: &'static str) -> Self {
        Self {
            client,
            query,
            field,
            error_policy: ErrorPolicy::None,
            variables: json!({}),
            items: Vec::new(),
            context: None,
        }
    }

    pub fn with_error_policy(mut self, policy: ErrorPolicy) -> Self {
        self.error_policy = policy;
        self
    }

    /// Fetch the first page under `variables`, replacing anything accumulated
    pub async fn start(&mut self, variables: Value) -> crate::Result<&[T]> {
        self.variables = variables;
        self.items.clear();
        self.context = None;

        let page = self.fetch_page(None).await?;
        debug!(field = self.field, items = page.items.len(), last_page = page.context.last_page, "first page");
        self.items = page.items;
        self.context = Some(page.context);
        Ok(&self.items)
    }

    /// Restart pagination under new filter variables
    pub async fn set_filter(&mut self, variables: Value) -> crate::Result<&[T]> {
        self.start(variables).await
    }

    /// Append the next page
    ///
    /// Past the last page (or before `start`) this is a no-op returning the
    /// current items. A failed fetch leaves the accumulated items untouched.
    pub async fn load_more(&mut self) -> crate::Result<&[T]> {
        let cursor = match self.next_cursor() {
            Ok(cursor) => cursor,
            Err(ClientError::NotApplicable) => {
                debug!(field = self.field, "load more past the last page ignored");
                return Ok(&self.items);
            }
            Err(e) => return Err(e),
        };

        let page = self.fetch_page(Some(cursor)).await?;
        debug!(field = self.field, items = page.items.len(), last_page = page.context.last_page, "next page");
        self.items.extend(page.items);
        self.context = Some(page.context);
        Ok(&self.items)
    }

    /// Cursor for the next page, or `NotApplicable` when there is none
    pub fn next_cursor(&self) -> crate::Result<String> {
        match &self.context {
            Some(PageContext {
                cursor: Some(cursor),
                last_page: false,
            }) => Ok(cursor.clone()),
            _ => Err(ClientError::NotApplicable),
        }
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn into_items(self) -> Vec<T> {
        self.items
    }

    pub fn variables(&self) -> &Value {
        &self.variables
    }

    pub fn is_started(&self) -> bool {
        self.context.is_some()
    }

    pub fn is_last_page(&self) -> bool {
        self.context.as_ref().is_some_and(|c| c.last_page)
    }

    async fn fetch_page(&self, cursor: Option<String>) -> crate::Result<Page<T>> {
        let mut variables = self.variables.clone();
        if let (Value::Object(vars), Some(cursor)) = (&mut variables, cursor) {
            vars.insert("cursor".to_string(), Value::String(cursor));
        }

        let operation = Operation::new(self.query)
            .variables(variables)
            .error_policy(self.error_policy);
        let page: Option<Page<T>> = self.client.fetch(&operation, self.field).await?;
        Ok(page.unwrap_or(Page {
            items: Vec::new(),
            context: PageContext {
                cursor: None,
                last_page: true,
            },
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::{Response, Transport};
    use async_trait::async_trait;
    use std::sync::{Arc, Mutex};

    /// Serves `pages_per_filter` pages of three items for each `site` filter value
    struct PagedBackend {
        pages_per_filter: usize,
        requests: Mutex<Vec<Value>>,
    }

    impl PagedBackend {
        fn new(pages_per_filter: usize) -> Arc<Self> {
            Arc::new(Self {
                pages_per_filter,
                requests: Mutex::default(),
            })
        }

        fn request_count(&self) -> usize {
            self.requests.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl Transport for PagedBackend {
        async fn send(&self, operation: &Operation) -> crate::Result<Response> {
            self.requests.lock().unwrap().push(operation.variables.clone());

            let site = operation.variables["site"].as_str().unwrap_or("none").to_string();
            let page: usize = operation.variables["cursor"]
                .as_str()
                .and_then(|c| c.strip_prefix("page-"))
                .and_then(|n| n.parse().ok())
                .unwrap_or(0);

            if page >= self.pages_per_filter {
                return Ok(Response::from_errors(vec![crate::transport::GraphQLError {
                    message: "cursor out of range".into(),
                    path: vec![],
                    code: crate::transport::ErrorCode::BadUserInput,
                }]));
            }

            let items: Vec<String> = (0..3).map(|i| format!("{site}-{page}-{i}")).collect();
            let last_page = page + 1 == self.pages_per_filter;
            Ok(Response::from_data(json!({
                "filterEquipment": {
                    "items": items,
                    "context": {"cursor": format!("page-{}", page + 1), "lastPage": last_page}
                }
            })))
        }
    }

    fn runner(backend: Arc<PagedBackend>) -> PaginatedQuery<String> {
        PaginatedQuery::new(
            GraphQLClient::new(backend),
            "query FilterEquipment { x }",
            "filterEquipment",
        )
    }

    #[tokio::test]
    async fn test_load_more_concatenates_in_fetch_order() {
        let backend = PagedBackend::new(3);
        let mut list = runner(backend.clone());

        list.start(json!({"site": "a"})).await.unwrap();
        list.load_more().await.unwrap();
        let items = list.load_more().await.unwrap().to_vec();

        let expected: Vec<String> = (0..3)
            .flat_map(|p| (0..3).map(move |i| format!("a-{p}-{i}")))
            .collect();
        assert_eq!(items, expected);
        assert!(list.is_last_page());

        let requests = backend.requests.lock().unwrap();
        assert!(requests[0].get("cursor").is_none());
        assert_eq!(requests[1]["cursor"], "page-1");
        assert_eq!(requests[2]["cursor"], "page-2");
    }

    #[tokio::test]
    async fn test_load_more_after_last_page_is_noop() {
        let backend = PagedBackend::new(1);
        let mut list = runner(backend.clone());

        let first = list.start(json!({"site": "a"})).await.unwrap().to_vec();
        assert!(list.is_last_page());
        assert!(matches!(list.next_cursor(), Err(ClientError::NotApplicable)));

        for _ in 0..3 {
            assert_eq!(list.load_more().await.unwrap(), first.as_slice());
        }
        assert_eq!(backend.request_count(), 1);
    }

    #[tokio::test]
    async fn test_load_more_before_start_is_noop() {
        let backend = PagedBackend::new(2);
        let mut list = runner(backend.clone());

        assert!(list.load_more().await.unwrap().is_empty());
        assert!(!list.is_started());
        assert_eq!(backend.request_count(), 0);
    }

    #[tokio::test]
    async fn test_filter_change_resets_pagination() {
        let backend = PagedBackend::new(3);
        let mut list = runner(backend.clone());

        list.start(json!({"site": "a"})).await.unwrap();
        list.load_more().await.unwrap();
        assert_eq!(list.items().len(), 6);

        let items = list.set_filter(json!({"site": "b"})).await.unwrap().to_vec();
        assert_eq!(items, vec!["b-0-0", "b-0-1", "b-0-2"]);
        assert_eq!(list.variables(), &json!({"site": "b"}));

        let requests = backend.requests.lock().unwrap();
        assert!(requests[2].get("cursor").is_none());
    }

    #[tokio::test]
    async fn test_failed_load_more_keeps_items() {
        let backend = PagedBackend::new(1);
        let mut list = runner(backend.clone());
        list.start(json!({"site": "a"})).await.unwrap();

        // Force a cursor the backend rejects.
        list.context = Some(PageContext {
            cursor: Some("page-9".into()),
            last_page: false,
        });
        let err = list.load_more().await.unwrap_err();
        assert!(matches!(err, ClientError::GraphQL(_)));
        assert_eq!(list.items(), ["a-0-0", "a-0-1", "a-0-2"]);
    }

    #[test]
    fn test_page_decoding_defaults() {
        let page: Page<u32> = serde_json::from_value(json!({
            "items": [1, 2],
            "context": {"cursor": null}
        }))
        .unwrap();
        assert_eq!(page.items, vec![1, 2]);
        assert!(!page.context.last_page);

        let empty: Page<u32> = serde_json::from_value(json!({})).unwrap();
        assert!(empty.items.is_empty());
    }
}
