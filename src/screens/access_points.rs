//! Access point table for the checked locations

use serde_json::{json, Value};

use super::{ScreenContext, View};
use crate::models::{int_id_values, EquipmentSummary, StatusRecord};
use crate::pagination::PaginatedQuery;
use crate::queries::FILTER_EQUIPMENT;
use crate::transport::ErrorPolicy;

const LOAD_FAILED: &str = "Failed to load equipment.";

/// Render an uptime as `"{days}d {hours}h {minutes}m {seconds}s"`
pub fn format_uptime(seconds: u64) -> String {
    format!(
        "{}d {}h {:02}m {:02}s",
        seconds / 86_400,
        (seconds % 86_400) / 3_600,
        (seconds % 3_600) / 60,
        seconds % 60
    )
}

/// One table row derived from an equipment record and its status telemetry
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccessPointRow {
    pub id: String,
    pub name: String,
    pub alarms: Option<i64>,
    pub model: Option<String>,
    pub ip: Option<String>,
    pub mac: Option<String>,
    pub manufacturer: Option<String>,
    pub asset_id: Option<String>,
    pub up_time: Option<String>,
    pub profile: Option<String>,
    pub channel: Vec<String>,
    pub occupancy: Vec<String>,
    pub noise_floor: Vec<String>,
    pub devices: Vec<String>,
}

impl From<&EquipmentSummary> for AccessPointRow {
    fn from(equipment: &EquipmentSummary) -> Self {
        let status = equipment.status.clone().unwrap_or_default();
        let protocol = status.protocol.unwrap_or_default();
        let os = status.os_performance.unwrap_or_default();
        let radio = status.radio_utilization.unwrap_or_default();
        let clients = status.client_details.unwrap_or_default();

        Self {
            id: equipment.id.clone(),
            name: equipment.name.clone(),
            alarms: equipment.alarms_count,
            model: equipment.model.clone(),
            ip: text(&protocol, "reportedIpV4Addr"),
            mac: text(&protocol, "reportedMacAddr"),
            manufacturer: text(&protocol, "manufacturer"),
            asset_id: equipment.inventory_id.clone(),
            up_time: os.field("uptimeInSeconds").and_then(seconds).map(format_uptime),
            profile: equipment.profile.as_ref().map(|p| p.name.clone()),
            channel: cells(&equipment.channel),
            occupancy: record_cells(&radio, "capacityDetails"),
            noise_floor: record_cells(&radio, "noiseFloorDetails"),
            devices: record_cells(&clients, "numClientsPerRadio"),
        }
    }
}

fn display(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn text(record: &StatusRecord, field: &str) -> Option<String> {
    record.field(field).map(display)
}

/// Per-radio values become one cell each
fn cells(value: &Value) -> Vec<String> {
    match value {
        Value::Null => Vec::new(),
        Value::Array(items) => items.iter().filter(|v| !v.is_null()).map(display).collect(),
        Value::Object(map) => map.values().filter(|v| !v.is_null()).map(display).collect(),
        scalar => vec![display(scalar)],
    }
}

fn record_cells(record: &StatusRecord, field: &str) -> Vec<String> {
    record.field(field).map(cells).unwrap_or_default()
}

fn seconds(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64().or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

pub struct AccessPoints {
    ctx: ScreenContext,
    checked_locations: Vec<String>,
    list: PaginatedQuery<EquipmentSummary>,
    loading: bool,
    failed: bool,
}

impl AccessPoints {
    pub fn new(ctx: ScreenContext) -> Self {
        let list = PaginatedQuery::new(ctx.client.clone(), FILTER_EQUIPMENT, "filterEquipment")
            .with_error_policy(ErrorPolicy::All);
        Self {
            ctx,
            checked_locations: Vec::new(),
            list,
            loading: true,
            failed: false,
        }
    }

    /// Replace the location filter and reload from the first page
    pub async fn set_checked_locations(&mut self, location_ids: Vec<String>) {
        let variables = json!({
            "customerId": self.ctx.customer_id(),
            "locationIds": int_id_values(&location_ids),
            "equipmentType": "AP",
        });
        self.checked_locations = location_ids;
        self.loading = true;

        let result = self.list.set_filter(variables).await.map(|_| ());
        self.loading = false;
        self.failed = result.is_err();
    }

    pub async fn load_more(&mut self) {
        // Errors past the first page keep the rows already shown.
        if let Err(e) = self.list.load_more().await {
            tracing::warn!(error = %e, "failed to load more equipment");
        }
    }

    pub fn checked_locations(&self) -> &[String] {
        &self.checked_locations
    }

    pub fn is_last_page(&self) -> bool {
        self.list.is_last_page()
    }

    pub fn equipment(&self) -> &[EquipmentSummary] {
        self.list.items()
    }

    pub fn rows(&self) -> Vec<AccessPointRow> {
        self.list.items().iter().map(AccessPointRow::from).collect()
    }

    /// Errors are shown only when no rows were obtained
    pub fn render(&self) -> View<'_, [EquipmentSummary]> {
        if self.loading {
            View::Loading
        } else if self.failed && self.list.items().is_empty() {
            View::Error(LOAD_FAILED)
        } else {
            View::Page(self.list.items())
        }
    }
}
