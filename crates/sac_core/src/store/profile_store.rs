//! Board-member profile storage.

use super::person_store::{StoreError, StoreResult};
use crate::model::profile::{BoardProfile, ProfileValidationError};
use rusqlite::{params, Connection};

impl From<ProfileValidationError> for StoreError {
    fn from(value: ProfileValidationError) -> Self {
        Self::InvalidData(value.to_string())
    }
}

/// Persistent list of board-member profiles.
pub trait ProfileStore {
    /// Profiles sorted by id.
    fn list(&self) -> StoreResult<Vec<BoardProfile>>;
    /// Inserts or replaces the profile with the same id.
    fn upsert(&mut self, profile: &BoardProfile) -> StoreResult<()>;

    /// First profile whose name matches case-insensitively.
    fn find_by_name(&self, name: &str) -> StoreResult<Option<BoardProfile>> {
        Ok(self
            .list()?
            .into_iter()
            .find(|profile| profile.matches_name(name)))
    }
}

/// In-process profile list.
#[derive(Debug, Clone, Default)]
pub struct MemoryProfileStore {
    profiles: Vec<BoardProfile>,
}

impl MemoryProfileStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ProfileStore for MemoryProfileStore {
    fn list(&self) -> StoreResult<Vec<BoardProfile>> {
        let mut profiles = self.profiles.clone();
        profiles.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(profiles)
    }

    fn upsert(&mut self, profile: &BoardProfile) -> StoreResult<()> {
        profile.validate()?;
        match self.profiles.iter_mut().find(|existing| existing.id == profile.id) {
            Some(existing) => *existing = profile.clone(),
            None => self.profiles.push(profile.clone()),
        }
        Ok(())
    }
}

/// SQLite-backed profile list.
pub struct SqliteProfileStore<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteProfileStore<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl ProfileStore for SqliteProfileStore<'_> {
    fn list(&self) -> StoreResult<Vec<BoardProfile>> {
        let mut stmt = self
            .conn
            .prepare("SELECT document FROM board_profiles ORDER BY id ASC;")?;
        let mut rows = stmt.query([])?;
        let mut profiles = Vec::new();
        while let Some(row) = rows.next()? {
            let document: String = row.get(0)?;
            let profile: BoardProfile = serde_json::from_str(&document)
                .map_err(|err| StoreError::InvalidData(format!("board profile: {err}")))?;
            profiles.push(profile);
        }
        Ok(profiles)
    }

    fn upsert(&mut self, profile: &BoardProfile) -> StoreResult<()> {
        profile.validate()?;
        let document = serde_json::to_string(profile)?;
        self.conn.execute(
            "INSERT INTO board_profiles (id, name, document) VALUES (?1, ?2, ?3)
             ON CONFLICT(id) DO UPDATE SET name = excluded.name, document = excluded.document;",
            params![profile.id, profile.name, document],
        )?;
        Ok(())
    }
}
