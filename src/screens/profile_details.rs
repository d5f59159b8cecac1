//! Single profile: view, edit, delete, attach files

use serde_json::{json, Value};

use super::{LoadState, ScreenContext, View};
use crate::models::{DeletedEntity, Profile, ProfileSummary, UploadedFile};
use crate::queries::{DELETE_PROFILE, FILE_UPLOAD, GET_PROFILE, UPDATE_PROFILE};
use crate::transport::{Operation, Upload};
use crate::ClientError;

pub const PROFILES_PATH: &str = "/profiles";

const LOAD_FAILED: &str = "Failed to load profile data.";

#[derive(Debug, Clone, PartialEq)]
pub struct ProfileDetailsData {
    pub profile: Profile,
    pub ssid_profiles: Vec<ProfileSummary>,
    pub radius_profiles: Vec<ProfileSummary>,
}

pub struct ProfileDetails {
    ctx: ScreenContext,
    id: String,
    state: LoadState<ProfileDetailsData>,
    redirect: Option<&'static str>,
}

impl ProfileDetails {
    pub fn new(ctx: ScreenContext, id: impl Into<String>) -> Self {
        Self {
            ctx,
            id: id.into(),
            state: LoadState::Loading,
            redirect: None,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub async fn load(&mut self) {
        let profile_op = Operation::new(GET_PROFILE).variables(json!({ "id": self.id }));
        let (profile, ssid, radius) = tokio::join!(
            self.ctx
                .client
                .fetch::<Option<Profile>>(&profile_op, "getProfile"),
            self.ctx.profiles_of_type("ssid", Some(100)),
            self.ctx.profiles_of_type("radius", Some(100)),
        );

        self.state = match profile {
            Ok(Some(profile)) => LoadState::Loaded(ProfileDetailsData {
                profile,
                // Missing related lists only empty the pickers.
                ssid_profiles: ssid.unwrap_or_default(),
                radius_profiles: radius.unwrap_or_default(),
            }),
            Ok(None) | Err(_) => LoadState::Failed(LOAD_FAILED),
        };
    }

    pub fn render(&self) -> View<'_, ProfileDetailsData> {
        match (&self.state, self.redirect) {
            (LoadState::Loading, _) => View::Loading,
            (LoadState::Failed(message), _) => View::Error(*message),
            (_, Some(path)) => View::Redirect(path),
            (state, None) => state.view(),
        }
    }

    pub fn data(&self) -> Option<&ProfileDetailsData> {
        self.state.data()
    }

    /// Save name, details and (optionally) children; children default to the current set
    pub async fn update_profile(
        &mut self,
        name: &str,
        details: Value,
        child_profile_ids: Option<Vec<String>>,
    ) -> Option<Profile> {
        let result = self.send_update(name, details, child_profile_ids).await;
        let updated = self.ctx.report(
            result,
            "Profile successfully updated.",
            "Profile could not be updated.",
        )?;

        if let Some(data) = self.state.data_mut() {
            data.profile.apply(updated.clone());
        }
        Some(updated)
    }

    async fn send_update(
        &self,
        name: &str,
        details: Value,
        child_profile_ids: Option<Vec<String>>,
    ) -> crate::Result<Profile> {
        let current = &self
            .state
            .data()
            .ok_or(ClientError::NotApplicable)?
            .profile;

        let mut update = current.to_update();
        update.name = name.to_string();
        update.details = details;
        if let Some(ids) = child_profile_ids {
            update.child_profile_ids = ids;
        }

        let operation = Operation::new(UPDATE_PROFILE).variables(serde_json::to_value(update)?);
        let updated: Option<Profile> = self.ctx.client.fetch(&operation, "updateProfile").await?;
        updated.ok_or_else(|| ClientError::Transport("updateProfile returned no profile".into()))
    }

    /// Delete the profile; on success the next render redirects to the list
    pub async fn delete_profile(&mut self) -> bool {
        let operation = Operation::new(DELETE_PROFILE).variables(json!({ "id": self.id }));
        let result = self
            .ctx
            .client
            .fetch::<Option<DeletedEntity>>(&operation, "deleteProfile")
            .await;

        let deleted = self
            .ctx
            .report(
                result,
                "Profile successfully deleted.",
                "Profile could not be deleted.",
            )
            .is_some();
        if deleted {
            self.redirect = Some(PROFILES_PATH);
        }
        deleted
    }

    pub fn is_redirect_pending(&self) -> bool {
        self.redirect.is_some()
    }

    pub async fn upload_file(&self, file_name: &str, file: Upload) -> Option<UploadedFile> {
        let operation = Operation::new(FILE_UPLOAD)
            .variables(json!({ "fileName": file_name }))
            .upload("file", file);
        let result = self
            .ctx
            .client
            .fetch::<UploadedFile>(&operation, "fileUpload")
            .await;

        self.ctx.report(
            result,
            "File successfully uploaded.",
            "File could not be uploaded.",
        )
    }
}
