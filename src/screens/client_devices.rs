//! Connected client devices

use serde_json::json;

use super::{ScreenContext, View};
use crate::models::ClientSession;
use crate::pagination::PaginatedQuery;
use crate::queries::{FILTER_CLIENT_SESSIONS, GET_CLIENT_SESSION};
use crate::transport::Operation;

const LOAD_FAILED: &str = "Failed to load client devices.";

pub struct ClientDevices {
    ctx: ScreenContext,
    list: PaginatedQuery<ClientSession>,
    loading: bool,
    failed: bool,
}

impl ClientDevices {
    pub fn new(ctx: ScreenContext) -> Self {
        let list = PaginatedQuery::new(
            ctx.client.clone(),
            FILTER_CLIENT_SESSIONS,
            "getAllClientSessions",
        );
        Self {
            ctx,
            list,
            loading: true,
            failed: false,
        }
    }

    pub async fn load(&mut self) {
        let variables = json!({ "customerId": self.ctx.customer_id() });
        self.loading = true;
        let result = self.list.start(variables).await.map(|_| ());
        self.loading = false;
        self.failed = result.is_err();
    }

    pub async fn load_more(&mut self) {
        if let Err(e) = self.list.load_more().await {
            tracing::warn!(error = %e, "failed to load more client devices");
        }
    }

    pub fn is_last_page(&self) -> bool {
        self.list.is_last_page()
    }

    pub fn devices(&self) -> &[ClientSession] {
        self.list.items()
    }

    pub fn render(&self) -> View<'_, [ClientSession]> {
        if self.loading {
            View::Loading
        } else if self.failed && self.list.items().is_empty() {
            View::Error(LOAD_FAILED)
        } else {
            View::Page(self.list.items())
        }
    }

    /// Session details for one MAC address, `None` when the backend has none
    pub async fn client_session(&self, mac_address: &str) -> crate::Result<Option<ClientSession>> {
        let operation = Operation::new(GET_CLIENT_SESSION).variables(json!({
            "customerId": self.ctx.customer_id(),
            "macAddress": mac_address,
        }));
        self.ctx.client.fetch(&operation, "getClientSession").await
    }
}
