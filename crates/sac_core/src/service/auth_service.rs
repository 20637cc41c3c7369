//! Board-member login.
//!
//! Checks a name/password pair against the stored profiles and produces the
//! session user handed to the gate. The shared profile passwords keep
//! casual visitors out of the edit flow; they are not access control.

use crate::model::profile::BoardProfile;
use crate::store::person_store::StoreError;
use crate::store::profile_store::ProfileStore;
use crate::visibility::gate::{AuthorizationError, SessionUser};
use log::info;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Login failures.
#[derive(Debug)]
pub enum AuthError {
    Rejected(AuthorizationError),
    Store(StoreError),
}

impl Display for AuthError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Rejected(err) => write!(f, "{err}"),
            Self::Store(err) => write!(f, "{err}"),
        }
    }
}

impl Error for AuthError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Rejected(err) => Some(err),
            Self::Store(err) => Some(err),
        }
    }
}

impl From<AuthorizationError> for AuthError {
    fn from(value: AuthorizationError) -> Self {
        Self::Rejected(value)
    }
}

impl From<StoreError> for AuthError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

/// Login use-cases over a profile store.
pub struct AuthService<P: ProfileStore> {
    profiles: P,
}

impl<P: ProfileStore> AuthService<P> {
    pub fn new(profiles: P) -> Self {
        Self { profiles }
    }

    /// Resolves `name` (case-insensitive) and checks `password`.
    pub fn authenticate(&self, name: &str, password: &str) -> Result<SessionUser, AuthError> {
        let profile = self
            .profiles
            .find_by_name(name)?
            .ok_or_else(|| AuthorizationError::UnknownProfile(name.trim().to_string()))?;

        if profile.password != password {
            info!(
                "event=login module=auth status=error user_id={} error_code=wrong_password",
                profile.id
            );
            return Err(AuthorizationError::WrongProfilePassword(profile.name).into());
        }

        info!("event=login module=auth status=ok user_id={}", profile.id);
        Ok(SessionUser {
            user_id: profile.id,
            username: profile.name,
            emoji: profile.emoji,
        })
    }

    pub fn list_profiles(&self) -> Result<Vec<BoardProfile>, AuthError> {
        Ok(self.profiles.list()?)
    }

    /// Adds or replaces a profile.
    pub fn register_profile(&mut self, profile: &BoardProfile) -> Result<(), AuthError> {
        self.profiles.upsert(profile)?;
        info!("event=profile_upsert module=auth status=ok id={}", profile.id);
        Ok(())
    }
}
