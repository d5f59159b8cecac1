//! New profile form

use serde_json::Value;

use super::ScreenContext;
use crate::models::{CreatedProfile, NewProfile, ProfileSummary};
use crate::queries::CREATE_PROFILE;
use crate::transport::Operation;
use crate::ClientError;

pub struct AddProfile {
    ctx: ScreenContext,
    ssid_profiles: Vec<ProfileSummary>,
}

impl AddProfile {
    pub fn new(ctx: ScreenContext) -> Self {
        Self {
            ctx,
            ssid_profiles: Vec::new(),
        }
    }

    /// Load SSID profiles offered as children; a failure leaves the list empty
    pub async fn load(&mut self) {
        self.ssid_profiles = self
            .ctx
            .profiles_of_type("ssid", None)
            .await
            .unwrap_or_default();
    }

    pub fn ssid_profiles(&self) -> &[ProfileSummary] {
        &self.ssid_profiles
    }

    pub async fn create_profile(
        &self,
        profile_type: &str,
        name: &str,
        details: Value,
        child_profile_ids: Vec<String>,
    ) -> Option<CreatedProfile> {
        let new = NewProfile {
            profile_type: profile_type.to_string(),
            customer_id: self.ctx.customer_id(),
            name: name.to_string(),
            child_profile_ids,
            details,
        };
        let result = self.send(new).await;

        self.ctx.report(
            result,
            "Profile successfully created.",
            "Profile could not be created.",
        )
    }

    async fn send(&self, new: NewProfile) -> crate::Result<CreatedProfile> {
        let operation = Operation::new(CREATE_PROFILE).variables(serde_json::to_value(new)?);
        let created: Option<CreatedProfile> =
            self.ctx.client.fetch(&operation, "createProfile").await?;
        created.ok_or_else(|| ClientError::Transport("createProfile returned no profile".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::screens::testing::{context, CannedBackend};
    use crate::screens::Notification;
    use serde_json::json;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_create_profile() {
        let backend = Arc::new(CannedBackend::default())
            .data(
                "GetAllProfiles",
                json!({ "getAllProfiles": {
                    "items": [{"id": "5", "name": "Corp", "profileType": "ssid"}],
                    "context": {"lastPage": true}
                }}),
            )
            .data(
                "CreateProfile",
                json!({ "createProfile": {
                    "profileType": "equipment_ap",
                    "customerId": 2,
                    "name": "Lobby APs",
                    "childProfileIds": [5],
                    "details": {}
                }}),
            );
        let (ctx, notifier) = context(&backend);
        let mut screen = AddProfile::new(ctx);

        screen.load().await;
        assert_eq!(screen.ssid_profiles().len(), 1);
        assert!(backend.calls("GetAllProfiles")[0].get("limit").is_none());

        let created = screen
            .create_profile("equipment_ap", "Lobby APs", json!({}), vec!["5".into()])
            .await
            .unwrap();
        assert_eq!(created.child_profile_ids, vec!["5"]);

        let sent = &backend.calls("CreateProfile")[0];
        assert_eq!(sent["customerId"], 2);
        assert_eq!(sent["childProfileIds"], json!([5]));
        assert_eq!(
            notifier.take(),
            vec![Notification::success("Profile successfully created.")]
        );
    }

    #[tokio::test]
    async fn test_create_failure_notifies_once() {
        let backend = Arc::new(CannedBackend::default()).fail("CreateProfile");
        let (ctx, notifier) = context(&backend);
        let mut screen = AddProfile::new(ctx);

        screen.load().await;
        assert!(screen.ssid_profiles().is_empty());

        assert!(screen
            .create_profile("ssid", "Guest", json!({}), vec![])
            .await
            .is_none());
        assert_eq!(
            notifier.take(),
            vec![Notification::error("Profile could not be created.")]
        );
    }
}
