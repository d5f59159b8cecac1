//! Single access point: settings, firmware, live metrics
//!
//! The equipment, its AP profiles and the firmware catalogue gate the page.
//! Service metrics load alongside but carry their own state, so a metrics
//! failure never hides the page.

use chrono::{DateTime, Utc};
use serde_json::json;

use super::{LoadState, ScreenContext, View};
use crate::config::{MetricsAnchor, MetricsWindow};
use crate::models::{
    Equipment, EquipmentUpdate, Firmware, FirmwareUpdateResult, Location, ProfileSummary,
    ServiceMetric, UpdatedEquipment,
};
use crate::pagination::Page;
use crate::queries::{
    FILTER_SERVICE_METRICS, GET_ALL_FIRMWARE, GET_ALL_LOCATIONS, GET_EQUIPMENT, UPDATE_EQUIPMENT,
    UPDATE_EQUIPMENT_FIRMWARE,
};
use crate::transport::Operation;
use crate::ClientError;

const EQUIPMENT_FAILED: &str = "Failed to load Access Point data.";
const PROFILES_FAILED: &str = "Failed to load Access Point profiles.";
const FIRMWARE_FAILED: &str = "Failed to load Access Point firmware.";
const METRICS_FAILED: &str = "Failed to load service metrics.";

const FIRMWARE_UPGRADE_FAILED: &str = "Equipment Firmware Upgrade could not be updated.";

#[derive(Debug, Clone, PartialEq)]
pub struct AccessPointDetailsData {
    pub equipment: Equipment,
    pub profiles: Vec<ProfileSummary>,
    /// Empty when the equipment reports no model
    pub firmware: Vec<Firmware>,
    pub locations: Vec<Location>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetricsState {
    pub loading: bool,
    pub error: Option<&'static str>,
    pub items: Vec<ServiceMetric>,
}

pub struct AccessPointDetails {
    ctx: ScreenContext,
    id: String,
    window: MetricsWindow,
    snapshot: (DateTime<Utc>, DateTime<Utc>),
    state: LoadState<AccessPointDetailsData>,
    metrics: MetricsState,
}

impl AccessPointDetails {
    pub fn new(ctx: ScreenContext, id: impl Into<String>, window: MetricsWindow) -> Self {
        Self {
            ctx,
            id: id.into(),
            window,
            snapshot: window.range_ending(Utc::now()),
            state: LoadState::Loading,
            metrics: MetricsState {
                loading: true,
                ..MetricsState::default()
            },
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub async fn load(&mut self) {
        let (state, metrics) = tokio::join!(self.fetch_page(), self.fetch_metrics());
        self.state = state;
        self.apply_metrics(metrics);
    }

    /// Refetch the equipment and the metrics; profiles and firmware are kept
    pub async fn refresh(&mut self) {
        let (equipment, metrics) = tokio::join!(self.fetch_equipment(), self.fetch_metrics());
        self.apply_metrics(metrics);

        match equipment {
            Ok(equipment) => {
                if let Some(data) = self.state.data_mut() {
                    data.equipment = equipment;
                } else {
                    self.state = self.fetch_page().await;
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, id = %self.id, "equipment refetch failed");
                self.state = LoadState::Failed(EQUIPMENT_FAILED);
            }
        }
    }

    pub fn render(&self) -> View<'_, AccessPointDetailsData> {
        self.state.view()
    }

    pub fn data(&self) -> Option<&AccessPointDetailsData> {
        self.state.data()
    }

    pub fn metrics(&self) -> &MetricsState {
        &self.metrics
    }

    pub async fn update_equipment(&mut self, update: EquipmentUpdate) -> Option<UpdatedEquipment> {
        let result = self.send_update(update).await;
        self.ctx.report(
            result,
            "Equipment settings successfully updated.",
            "Equipment settings could not be updated.",
        )
    }

    async fn send_update(&self, update: EquipmentUpdate) -> crate::Result<UpdatedEquipment> {
        let operation =
            Operation::new(UPDATE_EQUIPMENT).variables(serde_json::to_value(update)?);
        let updated: Option<UpdatedEquipment> =
            self.ctx.client.fetch(&operation, "updateEquipment").await?;
        updated.ok_or_else(|| ClientError::Transport("updateEquipment returned no equipment".into()))
    }

    /// Start a firmware upgrade; a `success: false` payload counts as a failure
    pub async fn update_equipment_firmware(&self, firmware_version_id: &str) -> bool {
        let operation = Operation::new(UPDATE_EQUIPMENT_FIRMWARE).variables(json!({
            "equipmentId": self.id,
            "firmwareVersionId": firmware_version_id,
        }));
        let result = self
            .ctx
            .client
            .fetch::<Option<FirmwareUpdateResult>>(&operation, "updateEquipmentFirmware")
            .await
            .and_then(|outcome| match outcome {
                Some(FirmwareUpdateResult { success: false }) => Err(ClientError::Transport(
                    "firmware upgrade rejected".into(),
                )),
                _ => Ok(()),
            });

        self.ctx
            .report(
                result,
                "Equipment Firmware Upgrade in progress",
                FIRMWARE_UPGRADE_FAILED,
            )
            .is_some()
    }

    async fn fetch_page(&self) -> LoadState<AccessPointDetailsData> {
        let (equipment, profiles, locations) = tokio::join!(
            self.fetch_equipment(),
            self.ctx.profiles_of_type("equipment_ap", Some(100)),
            self.fetch_locations(),
        );

        let equipment = match equipment {
            Ok(equipment) => equipment,
            Err(e) => {
                tracing::warn!(error = %e, id = %self.id, "equipment query failed");
                return LoadState::Failed(EQUIPMENT_FAILED);
            }
        };
        let profiles = match profiles {
            Ok(profiles) => profiles,
            Err(e) => {
                tracing::warn!(error = %e, "equipment_ap profiles query failed");
                return LoadState::Failed(PROFILES_FAILED);
            }
        };

        let firmware = match equipment.firmware_model_id() {
            Some(model_id) => match self.fetch_firmware(&model_id).await {
                Ok(firmware) => firmware,
                Err(_) => return LoadState::Failed(FIRMWARE_FAILED),
            },
            None => Vec::new(),
        };

        LoadState::Loaded(AccessPointDetailsData {
            equipment,
            profiles,
            firmware,
            locations: locations.unwrap_or_default(),
        })
    }

    async fn fetch_equipment(&self) -> crate::Result<Equipment> {
        let operation = Operation::new(GET_EQUIPMENT).variables(json!({ "id": self.id }));
        let equipment: Option<Equipment> = self.ctx.client.fetch(&operation, "getEquipment").await?;
        equipment.ok_or(ClientError::NotApplicable)
    }

    async fn fetch_firmware(&self, model_id: &str) -> crate::Result<Vec<Firmware>> {
        let operation = Operation::new(GET_ALL_FIRMWARE).variables(json!({ "modelId": model_id }));
        let firmware: Option<Vec<Firmware>> =
            self.ctx.client.fetch(&operation, "getAllFirmware").await?;
        Ok(firmware.unwrap_or_default())
    }

    async fn fetch_locations(&self) -> crate::Result<Vec<Location>> {
        let operation = Operation::new(GET_ALL_LOCATIONS)
            .variables(json!({ "customerId": self.ctx.customer_id() }));
        let locations: Option<Vec<Location>> =
            self.ctx.client.fetch(&operation, "getAllLocations").await?;
        Ok(locations.unwrap_or_default())
    }

    fn metrics_range(&self) -> (DateTime<Utc>, DateTime<Utc>) {
        match self.window.anchor {
            MetricsAnchor::Snapshot => self.snapshot,
            MetricsAnchor::Rolling => self.window.range_ending(Utc::now()),
        }
    }

    async fn fetch_metrics(&self) -> crate::Result<Vec<ServiceMetric>> {
        let (from, to) = self.metrics_range();
        let operation = Operation::new(FILTER_SERVICE_METRICS).variables(json!({
            "customerId": self.ctx.customer_id(),
            "fromTime": from.timestamp_millis().to_string(),
            "toTime": to.timestamp_millis().to_string(),
            "equipmentIds": [self.id],
            "dataTypes": ["ApNode"],
            "limit": 100,
        }));
        let page: Option<Page<ServiceMetric>> =
            self.ctx.client.fetch(&operation, "filterServiceMetrics").await?;
        Ok(page.map(|p| p.items).unwrap_or_default())
    }

    fn apply_metrics(&mut self, result: crate::Result<Vec<ServiceMetric>>) {
        self.metrics = match result {
            Ok(items) => MetricsState {
                loading: false,
                error: None,
                items,
            },
            Err(e) => {
                tracing::warn!(error = %e, id = %self.id, "service metrics query failed");
                MetricsState {
                    loading: false,
                    error: Some(METRICS_FAILED),
                    items: Vec::new(),
                }
            }
        };
    }
}
