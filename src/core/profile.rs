//! Business profile and local session.
//!
//! Creating a profile starts the subscription trial and stores the profile id as
//! the session token in a separate credential store. Biometric prompting is done
//! by an injected [`Authenticator`].

use crate::{
    core::{
        clock::Clock,
        entity_store::{new_record_id, non_blank, require_text},
        subscription::SubscriptionLifecycle,
    },
    errors::{Error, Result},
    storage::{KeyValueStore, PROFILE_KEY, SESSION_TOKEN_KEY},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// The business operating the app.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    /// Unique identifier, also the session token
    pub id: String,
    /// Owner's name
    pub owner_name: String,
    /// Business name printed on receipts
    pub business_name: String,
    /// Kind of business
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub business_type: Option<String>,
    /// Contact phone printed on receipts
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    /// Contact email
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Address printed on receipts
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    /// When the profile was created
    pub created_at: DateTime<Utc>,
}

/// Fields for a new profile. Owner and business name are required.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileDraft {
    /// Owner's name
    pub owner_name: String,
    /// Business name
    pub business_name: String,
    /// Kind of business
    #[serde(default)]
    pub business_type: Option<String>,
    /// Contact phone
    #[serde(default)]
    pub phone: Option<String>,
    /// Contact email
    #[serde(default)]
    pub email: Option<String>,
    /// Address
    #[serde(default)]
    pub address: Option<String>,
}

/// Device credential check, e.g. a biometric prompt.
#[allow(async_fn_in_trait)]
pub trait Authenticator {
    /// Whether the device has usable, enrolled hardware.
    fn is_available(&self) -> bool;

    /// Prompts the user; `true` on success.
    async fn authenticate(&self) -> bool;
}

/// Profile plus authentication state for this process.
pub struct Session<S, V> {
    storage: S,
    vault: V,
    clock: Arc<dyn Clock>,
    profile: Option<Profile>,
    authenticated: bool,
}

impl<S: KeyValueStore, V: KeyValueStore> Session<S, V> {
    /// Restores the session from storage.
    ///
    /// The session counts as authenticated when both the token and a readable
    /// profile exist. Corrupt profile data is cleared together with the token.
    ///
    /// # Errors
    /// [`Error::Persistence`] if either store cannot be read, or if clearing
    /// corrupt data fails.
    #[instrument(skip_all)]
    pub async fn restore(storage: S, vault: V, clock: Arc<dyn Clock>) -> Result<Self> {
        let token = vault.read(SESSION_TOKEN_KEY).await?;
        let raw_profile = storage.read(PROFILE_KEY).await?;

        let mut session = Self {
            storage,
            vault,
            clock,
            profile: None,
            authenticated: false,
        };

        if let (Some(_), Some(raw)) = (token, raw_profile) {
            match serde_json::from_str::<Profile>(&raw) {
                Ok(profile) => {
                    info!("Restored session for {}", profile.business_name);
                    session.profile = Some(profile);
                    session.authenticated = true;
                }
                Err(e) => {
                    warn!("Clearing corrupted profile data: {}", e);
                    session.vault.remove(SESSION_TOKEN_KEY).await?;
                    session.storage.remove(PROFILE_KEY).await?;
                }
            }
        }

        Ok(session)
    }

    /// The signed-in profile.
    #[must_use]
    pub const fn profile(&self) -> Option<&Profile> {
        self.profile.as_ref()
    }

    /// Whether the user has passed authentication in this process.
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    /// Creates the business profile, starts its trial and signs in.
    ///
    /// # Errors
    /// [`Error::Validation`] if owner or business name is blank, or
    /// [`Error::Persistence`] if any of the writes fail.
    #[instrument(skip_all)]
    pub async fn create_profile(
        &mut self,
        draft: ProfileDraft,
        subscription: &mut SubscriptionLifecycle<S>,
    ) -> Result<Profile> {
        require_text("Owner name", &draft.owner_name)?;
        require_text("Business name", &draft.business_name)?;

        let profile = Profile {
            id: new_record_id(),
            owner_name: draft.owner_name.trim().to_string(),
            business_name: draft.business_name.trim().to_string(),
            business_type: non_blank(draft.business_type),
            phone: non_blank(draft.phone),
            email: non_blank(draft.email),
            address: non_blank(draft.address),
            created_at: self.clock.now(),
        };

        let payload = serde_json::to_string(&profile)
            .map_err(|e| Error::persistence(format!("Failed to serialize profile: {e}")))?;
        self.storage.write(PROFILE_KEY, &payload).await?;
        subscription.start_trial().await?;
        self.vault.write(SESSION_TOKEN_KEY, &profile.id).await?;

        info!("Created profile for {}", profile.business_name);
        self.profile = Some(profile.clone());
        self.authenticated = true;
        Ok(profile)
    }

    /// Signs in.
    ///
    /// With usable device authentication its verdict decides; otherwise a stored
    /// token is enough. Either way a profile must exist. A failed attempt returns
    /// `false` and leaves an existing authenticated session in place.
    ///
    /// # Errors
    /// [`Error::Persistence`] if the credential store cannot be read.
    pub async fn login(&mut self, authenticator: &impl Authenticator) -> Result<bool> {
        if self.profile.is_none() {
            return Ok(false);
        }

        let success = if authenticator.is_available() {
            authenticator.authenticate().await
        } else {
            self.vault.read(SESSION_TOKEN_KEY).await?.is_some()
        };

        if success {
            self.authenticated = true;
        }
        Ok(success)
    }

    /// Signs out and removes the token, profile and subscription.
    ///
    /// The in-memory session is cleared before any storage is touched, so the
    /// process is signed out even if a removal fails.
    ///
    /// # Errors
    /// [`Error::Persistence`] if removing the token, profile or subscription fails.
    #[instrument(skip_all)]
    pub async fn logout(&mut self, subscription: &mut SubscriptionLifecycle<S>) -> Result<()> {
        self.authenticated = false;
        self.profile = None;

        self.vault.remove(SESSION_TOKEN_KEY).await?;
        self.storage.remove(PROFILE_KEY).await?;
        subscription.clear().await?;
        info!("Logged out");
        Ok(())
    }
}
