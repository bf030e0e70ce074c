//! Profile service
//!
//! Edits the signed-in user's directory profile and keeps the session's
//! copy of it current.

use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{debug, info, instrument};
use validator::Validate;

use messenger_core::entities::{
    FIELD_ID, FIELD_NOM, FIELD_PROFILE_IMAGE, FIELD_PSEUDO, FIELD_TELEPHONE,
};
use messenger_core::value_objects::PROFILE_KEY_PREFIX;
use messenger_core::{MediaKind, Profile, Snapshot};

use crate::dto::SaveProfileRequest;

use super::context::ServiceContext;
use super::error::{ServiceError, ServiceResult};
use super::listener::ActiveListener;
use super::session::Session;

/// Profile service
pub struct ProfileService<'a> {
    ctx: &'a ServiceContext,
    session: &'a Session,
}

impl<'a> ProfileService<'a> {
    /// Create a new ProfileService
    pub fn new(ctx: &'a ServiceContext, session: &'a Session) -> Self {
        Self { ctx, session }
    }

    /// Merge the editable fields into the caller's profile
    #[instrument(skip(self, request))]
    pub async fn save_profile(&self, request: SaveProfileRequest) -> ServiceResult<()> {
        request.validate()?;
        let user = self.session.require_user()?;

        let mut fields = Map::new();
        fields.insert(FIELD_ID.to_string(), Value::from(user.uid.as_str()));
        fields.insert(FIELD_NOM.to_string(), Value::from(request.nom));
        fields.insert(FIELD_PSEUDO.to_string(), Value::from(request.pseudo));
        fields.insert(FIELD_TELEPHONE.to_string(), Value::from(request.telephone));

        self.ctx
            .store()
            .update(&self.ctx.layout().profile(&user.uid), fields)
            .await
            .map_err(|e| ServiceError::write_failure("save profile", e))?;

        info!(user_id = %user.uid, "Profile saved");
        Ok(())
    }

    /// Pick or capture a new avatar and publish it on the profile
    ///
    /// Returns the public URL, or `None` when the user cancelled the picker.
    #[instrument(skip(self))]
    pub async fn change_profile_image(&self, kind: MediaKind) -> ServiceResult<Option<String>> {
        let user = self.session.require_user()?;
        let media = self.ctx.media_source();

        if !media.request_permission(kind).await {
            return Err(ServiceError::permission_denied(kind));
        }

        let Some(asset) = media.acquire(kind).await? else {
            debug!(user_id = %user.uid, "Image pick cancelled");
            return Ok(None);
        };

        let storage = &self.ctx.config().storage;
        if asset.bytes.len() > storage.max_image_bytes() {
            return Err(ServiceError::validation(format!(
                "Image is larger than {} MB",
                storage.max_image_mb
            )));
        }

        let key = format!("{PROFILE_KEY_PREFIX}{}", user.uid);
        let objects = self.ctx.object_store();
        objects
            .upload(&storage.bucket, &key, asset.bytes, &asset.content_type, true)
            .await
            .map_err(|e| ServiceError::write_failure("upload profile image", e))?;
        let url = objects
            .public_url(&storage.bucket, &key)
            .map_err(|e| ServiceError::write_failure("upload profile image", e))?;

        let mut fields = Map::new();
        fields.insert(FIELD_PROFILE_IMAGE.to_string(), Value::from(url.as_str()));
        self.ctx
            .store()
            .update(&self.ctx.layout().profile(&user.uid), fields)
            .await
            .map_err(|e| ServiceError::write_failure("update profile image", e))?;

        info!(user_id = %user.uid, url = %url, "Profile image updated");
        Ok(Some(url))
    }

    /// Follow the caller's own profile and mirror it into the session
    #[instrument(skip(self))]
    pub async fn watch_own_profile(&self) -> ServiceResult<()> {
        let user = self.session.require_user()?;
        let path = self.ctx.layout().profile(&user.uid);
        let sender = self.session.profile_sender();

        let on_change = move |snapshot: Snapshot| {
            let sender = Arc::clone(&sender);
            async move {
                sender.send_replace(decode_own_profile(&snapshot));
            }
        };

        let listener = ActiveListener::attach(self.ctx.store(), &path, on_change).await?;
        self.session.set_profile_listener(listener);
        Ok(())
    }
}

fn decode_own_profile(snapshot: &Snapshot) -> Option<Profile> {
    if !snapshot.exists() {
        return None;
    }
    let key = snapshot.key()?;
    match Profile::from_node(key, snapshot.value()) {
        Ok(profile) => Some(profile),
        Err(e) => {
            debug!(path = %snapshot.path(), error = %e, "Ignoring malformed profile");
            None
        }
    }
}
