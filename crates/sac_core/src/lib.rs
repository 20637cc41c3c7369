//! Core logic for the social acceptability chart.
//! Scores, layout, visibility gating and persistence live here; UI shells
//! only forward commands and paint surfaces.

pub mod avatar;
pub mod config;
pub mod db;
pub mod layout;
pub mod logging;
pub mod model;
pub mod render;
pub mod service;
pub mod store;
pub mod visibility;

pub use avatar::{resolve_avatar, AvatarSource, FileAvatarSource, ImageLoadError};
pub use config::{AppConfig, ConfigError};
pub use layout::{LayoutEngine, LayoutError, Placement, Viewport};
pub use logging::{default_log_level, init_from_config, init_logging, logging_status};
pub use model::person::{Person, PersonId, PersonValidationError};
pub use model::profile::BoardProfile;
pub use model::score::{compute_social_score, ScoreBand};
pub use render::{ChartRenderer, Surface, SvgSurface};
pub use service::auth_service::{AuthError, AuthService};
pub use service::chart_service::{
    ChartService, Collaborators, Command, Event, ListEntry, LoadReport, Outcome, PersonEdit,
    PersonInput, ServiceError,
};
pub use store::person_store::{
    MemoryPersonStore, PersonListing, PersonStore, StoreError, StoreResult,
};
pub use store::profile_store::{MemoryProfileStore, ProfileStore, SqliteProfileStore};
pub use store::sqlite_person_store::SqlitePersonStore;
pub use visibility::gate::{SessionUser, VisibilityGate, VisibilityMode};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
