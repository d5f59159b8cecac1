//! Backend entities and mutation inputs
//!
//! Identifiers and timestamps arrive as either JSON numbers or strings
//! depending on whether the schema types them `Int` or `ID`/`String`; they are
//! normalized to strings on decode. `details` documents are passed through
//! untouched.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

#[derive(Deserialize)]
#[serde(untagged)]
enum Scalar {
    Int(i64),
    Float(f64),
    Text(String),
}

impl From<Scalar> for String {
    fn from(scalar: Scalar) -> Self {
        match scalar {
            Scalar::Int(n) => n.to_string(),
            Scalar::Float(f) => f.to_string(),
            Scalar::Text(s) => s,
        }
    }
}

fn flex_string<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    Scalar::deserialize(d).map(String::from)
}

fn flex_opt_string<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    Ok(Option::<Scalar>::deserialize(d)?.map(String::from))
}

fn flex_strings<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<String>, D::Error> {
    Ok(Option::<Vec<Option<Scalar>>>::deserialize(d)?
        .unwrap_or_default()
        .into_iter()
        .flatten()
        .map(String::from)
        .collect())
}

/// Ids for `Int`-typed arguments: numeric ids go out as numbers
pub(crate) fn int_id_values(ids: &[String]) -> Vec<Value> {
    ids.iter()
        .map(|id| match id.parse::<i64>() {
            Ok(n) => Value::from(n),
            Err(_) => Value::from(id.as_str()),
        })
        .collect()
}

fn int_ids<S: Serializer>(ids: &[String], s: S) -> Result<S::Ok, S::Error> {
    int_id_values(ids).serialize(s)
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NamedRef {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    #[serde(deserialize_with = "flex_string")]
    pub id: String,
    pub name: String,
    #[serde(default, deserialize_with = "flex_opt_string")]
    pub parent_id: Option<String>,
    #[serde(default)]
    pub location_type: Option<String>,
    #[serde(default, deserialize_with = "flex_opt_string")]
    pub last_modified_timestamp: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChildProfile {
    #[serde(deserialize_with = "flex_string")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub profile_type: Option<String>,
    #[serde(default)]
    pub details: Value,
}

/// Entry of a profile list (`getAllProfiles`)
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileSummary {
    #[serde(deserialize_with = "flex_string")]
    pub id: String,
    pub name: String,
    pub profile_type: String,
    #[serde(default)]
    pub details: Value,
    #[serde(default)]
    pub child_profiles: Vec<ChildProfile>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    #[serde(deserialize_with = "flex_string")]
    pub id: String,
    pub profile_type: String,
    #[serde(deserialize_with = "flex_string")]
    pub customer_id: String,
    pub name: String,
    #[serde(default)]
    pub child_profiles: Vec<ChildProfile>,
    #[serde(default, deserialize_with = "flex_strings")]
    pub child_profile_ids: Vec<String>,
    #[serde(default, deserialize_with = "flex_opt_string")]
    pub created_timestamp: Option<String>,
    #[serde(default, deserialize_with = "flex_opt_string")]
    pub last_modified_timestamp: Option<String>,
    #[serde(default)]
    pub details: Value,
}

impl Profile {
    /// Update input carrying this profile's concurrency token
    pub fn to_update(&self) -> ProfileUpdate {
        ProfileUpdate {
            id: self.id.clone(),
            profile_type: self.profile_type.clone(),
            customer_id: self.customer_id.clone(),
            name: self.name.clone(),
            child_profile_ids: self.child_profile_ids.clone(),
            last_modified_timestamp: self.last_modified_timestamp.clone(),
            details: self.details.clone(),
        }
    }

    /// Merge an update result, keeping fields the mutation does not return
    pub fn apply(&mut self, updated: Profile) {
        let child_profiles = std::mem::take(&mut self.child_profiles);
        let created_timestamp = self.created_timestamp.take();
        *self = Profile {
            child_profiles,
            created_timestamp: updated.created_timestamp.or(created_timestamp),
            ..updated
        };
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    pub id: String,
    pub profile_type: String,
    pub customer_id: String,
    pub name: String,
    pub child_profile_ids: Vec<String>,
    pub last_modified_timestamp: Option<String>,
    pub details: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProfile {
    pub profile_type: String,
    pub customer_id: i64,
    pub name: String,
    #[serde(serialize_with = "int_ids")]
    pub child_profile_ids: Vec<String>,
    pub details: Value,
}

/// Result of `createProfile` (no id is selected)
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedProfile {
    pub profile_type: String,
    #[serde(deserialize_with = "flex_string")]
    pub customer_id: String,
    pub name: String,
    #[serde(default, deserialize_with = "flex_strings")]
    pub child_profile_ids: Vec<String>,
    #[serde(default)]
    pub details: Value,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DeletedEntity {
    #[serde(deserialize_with = "flex_string")]
    pub id: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadedFile {
    #[serde(default)]
    pub file_name: Option<String>,
    #[serde(default)]
    pub base_url: Option<String>,
}

/// One status record (`protocol`, `osPerformance`, ...)
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct StatusRecord {
    #[serde(default)]
    pub details: Option<Value>,
    #[serde(default, rename = "detailsJSON")]
    pub details_json: Option<Value>,
}

impl StatusRecord {
    /// Field of `details`, falling back to `detailsJSON`
    pub fn field(&self, name: &str) -> Option<&Value> {
        [self.details.as_ref(), self.details_json.as_ref()]
            .into_iter()
            .flatten()
            .find_map(|d| d.get(name).filter(|v| !v.is_null()))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EquipmentStatus {
    #[serde(default)]
    pub protocol: Option<StatusRecord>,
    #[serde(default)]
    pub os_performance: Option<StatusRecord>,
    #[serde(default)]
    pub radio_utilization: Option<StatusRecord>,
    #[serde(default)]
    pub client_details: Option<StatusRecord>,
    #[serde(default)]
    pub firmware: Option<StatusRecord>,
}

/// Entry of `filterEquipment`
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EquipmentSummary {
    #[serde(deserialize_with = "flex_string")]
    pub id: String,
    pub name: String,
    #[serde(default, deserialize_with = "flex_opt_string")]
    pub location_id: Option<String>,
    #[serde(default, deserialize_with = "flex_opt_string")]
    pub profile_id: Option<String>,
    #[serde(default)]
    pub inventory_id: Option<String>,
    #[serde(default)]
    pub channel: Value,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub alarms_count: Option<i64>,
    #[serde(default)]
    pub profile: Option<NamedRef>,
    #[serde(default)]
    pub status: Option<EquipmentStatus>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EquipmentProfile {
    #[serde(deserialize_with = "flex_string")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub child_profiles: Vec<ChildProfile>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Alarm {
    #[serde(default)]
    pub severity: Option<String>,
    #[serde(default)]
    pub alarm_code: Option<String>,
    #[serde(default)]
    pub details: Value,
    #[serde(default, deserialize_with = "flex_opt_string")]
    pub created_timestamp: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Equipment {
    #[serde(deserialize_with = "flex_string")]
    pub id: String,
    pub equipment_type: String,
    pub inventory_id: String,
    #[serde(deserialize_with = "flex_string")]
    pub customer_id: String,
    #[serde(deserialize_with = "flex_string")]
    pub profile_id: String,
    #[serde(deserialize_with = "flex_string")]
    pub location_id: String,
    pub name: String,
    #[serde(default, deserialize_with = "flex_opt_string")]
    pub latitude: Option<String>,
    #[serde(default, deserialize_with = "flex_opt_string")]
    pub longitude: Option<String>,
    #[serde(default)]
    pub serial: Option<String>,
    #[serde(default, deserialize_with = "flex_opt_string")]
    pub last_modified_timestamp: Option<String>,
    #[serde(default)]
    pub details: Value,
    #[serde(default)]
    pub profile: Option<EquipmentProfile>,
    #[serde(default)]
    pub status: Option<EquipmentStatus>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub alarms_count: Option<i64>,
    #[serde(default)]
    pub alarms: Vec<Alarm>,
}

impl Equipment {
    /// Firmware catalogue key, absent when the model is unknown
    pub fn firmware_model_id(&self) -> Option<String> {
        self.model
            .as_deref()
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .map(str::to_lowercase)
    }
}

/// Result of `updateEquipment`
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatedEquipment {
    #[serde(deserialize_with = "flex_string")]
    pub id: String,
    pub name: String,
    #[serde(default, deserialize_with = "flex_opt_string")]
    pub last_modified_timestamp: Option<String>,
    #[serde(default)]
    pub details: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EquipmentUpdate {
    pub id: String,
    pub equipment_type: String,
    pub inventory_id: String,
    pub customer_id: String,
    pub profile_id: String,
    pub location_id: String,
    pub name: String,
    pub latitude: Option<String>,
    pub longitude: Option<String>,
    pub serial: Option<String>,
    pub last_modified_timestamp: Option<String>,
    pub details: Value,
}

impl From<&Equipment> for EquipmentUpdate {
    fn from(equipment: &Equipment) -> Self {
        Self {
            id: equipment.id.clone(),
            equipment_type: equipment.equipment_type.clone(),
            inventory_id: equipment.inventory_id.clone(),
            customer_id: equipment.customer_id.clone(),
            profile_id: equipment.profile_id.clone(),
            location_id: equipment.location_id.clone(),
            name: equipment.name.clone(),
            latitude: equipment.latitude.clone(),
            longitude: equipment.longitude.clone(),
            serial: equipment.serial.clone(),
            last_modified_timestamp: equipment.last_modified_timestamp.clone(),
            details: equipment.details.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Firmware {
    #[serde(deserialize_with = "flex_string")]
    pub id: String,
    #[serde(default)]
    pub model_id: Option<String>,
    #[serde(default)]
    pub version_name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub filename: Option<String>,
    #[serde(default)]
    pub commit: Option<String>,
    #[serde(default, deserialize_with = "flex_opt_string")]
    pub release_date: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct FirmwareUpdateResult {
    pub success: bool,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceMetric {
    pub data_type: String,
    #[serde(default, deserialize_with = "flex_opt_string")]
    pub created_timestamp: Option<String>,
    #[serde(default, deserialize_with = "flex_opt_string")]
    pub equipment_id: Option<String>,
    #[serde(default)]
    pub details: Value,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientSession {
    #[serde(deserialize_with = "flex_string")]
    pub id: String,
    pub mac_address: String,
    #[serde(default)]
    pub ip_address: Option<String>,
    #[serde(default)]
    pub hostname: Option<String>,
    #[serde(default)]
    pub ssid: Option<String>,
    #[serde(default)]
    pub radio_type: Option<String>,
    #[serde(default)]
    pub signal: Value,
    #[serde(default)]
    pub equipment: Option<NamedRef>,
    #[serde(default)]
    pub details: Option<Value>,
}
