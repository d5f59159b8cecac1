//! Location tree of the customer's network

use serde_json::json;

use super::{LoadState, ScreenContext, View};
use crate::models::{int_id_values, Location};
use crate::queries::{GET_ALL_LOCATIONS, GET_LOCATION};
use crate::transport::Operation;

const LOAD_FAILED: &str = "Failed to load locations.";

pub struct Network {
    ctx: ScreenContext,
    state: LoadState<Vec<Location>>,
}

impl Network {
    pub fn new(ctx: ScreenContext) -> Self {
        Self {
            ctx,
            state: LoadState::Loading,
        }
    }

    pub async fn load(&mut self) {
        let operation = Operation::new(GET_ALL_LOCATIONS)
            .variables(json!({ "customerId": self.ctx.customer_id() }));
        self.state = match self
            .ctx
            .client
            .fetch::<Option<Vec<Location>>>(&operation, "getAllLocations")
            .await
        {
            Ok(locations) => LoadState::Loaded(locations.unwrap_or_default()),
            Err(e) => {
                tracing::warn!(error = %e, "locations query failed");
                LoadState::Failed(LOAD_FAILED)
            }
        };
    }

    pub fn render(&self) -> View<'_, Vec<Location>> {
        self.state.view()
    }

    pub fn locations(&self) -> &[Location] {
        self.state.data().map(Vec::as_slice).unwrap_or_default()
    }

    /// Direct children of `parent_id`; `None` selects the roots
    pub fn children(&self, parent_id: Option<&str>) -> Vec<&Location> {
        self.locations()
            .iter()
            .filter(|l| match (l.parent_id.as_deref(), parent_id) {
                (None | Some("0"), None) => true,
                (Some(own), Some(wanted)) => own == wanted,
                _ => false,
            })
            .collect()
    }

    pub async fn location(&self, id: &str) -> crate::Result<Option<Location>> {
        let id = int_id_values(&[id.to_string()]).remove(0);
        let operation = Operation::new(GET_LOCATION).variables(json!({ "id": id }));
        self.ctx.client.fetch(&operation, "getLocation").await
    }
}
