//! People collection contract and in-memory implementation.
//!
//! # Responsibility
//! - Define the document shape persisted for each person.
//! - Provide CRUD over the collection in stable iteration order.
//!
//! # Invariants
//! - `list()` returns documents in creation order.
//! - A document that cannot be decoded is skipped and counted by `scan()`;
//!   it never hides the rest of the collection.
//! - Ids are assigned by the store and never reused.
//! - Stores do not validate axis ranges; the service does on both write and
//!   load.

use crate::db::DbError;
use crate::model::image::ImageRef;
use crate::model::person::{Person, PersonId};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub type StoreResult<T> = Result<T, StoreError>;

/// Persistence failures.
#[derive(Debug)]
pub enum StoreError {
    NotFound(PersonId),
    Db(DbError),
    Serialization(serde_json::Error),
    InvalidData(String),
    /// Remote store rejected or could not be reached.
    Unavailable(String),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound(id) => write!(f, "person not found: {id}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::Serialization(err) => write!(f, "document serialization failed: {err}"),
            Self::InvalidData(message) => write!(f, "invalid stored document: {message}"),
            Self::Unavailable(message) => write!(f, "store unavailable: {message}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Serialization(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serialization(value)
    }
}

/// Persisted person document.
///
/// Axis fields are plain integers so legacy or corrupt documents still
/// deserialize and can be rejected by validation with a precise reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonRecord {
    pub handle: String,
    pub food_score: i64,
    pub character: i64,
    pub social_score: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_data_url: Option<String>,
    /// RFC 3339 time of the last write; empty for documents written without one.
    #[serde(default)]
    pub timestamp: String,
}

impl PersonRecord {
    pub fn from_person(person: &Person, timestamp: impl Into<String>) -> Self {
        Self {
            handle: person.handle().to_string(),
            food_score: i64::from(person.food_score()),
            character: i64::from(person.character()),
            social_score: i64::from(person.social_score()),
            image_data_url: person.avatar.as_ref().map(|image| image.as_str().to_string()),
            timestamp: timestamp.into(),
        }
    }

    pub fn apply(&mut self, patch: &PersonPatch) {
        if let Some(handle) = &patch.handle {
            self.handle = handle.clone();
        }
        if let Some(food_score) = patch.food_score {
            self.food_score = food_score;
        }
        if let Some(character) = patch.character {
            self.character = character;
        }
        if let Some(social_score) = patch.social_score {
            self.social_score = social_score;
        }
        if let Some(image) = &patch.image_data_url {
            self.image_data_url = Some(image.clone());
        }
        if let Some(timestamp) = &patch.timestamp {
            self.timestamp = timestamp.clone();
        }
    }
}

/// Partial update; `None` fields are left as stored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub handle: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub food_score: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub character: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub social_score: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_data_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

impl PersonPatch {
    /// Patch carrying every editable field of `person`.
    pub fn from_person(person: &Person, timestamp: impl Into<String>) -> Self {
        Self {
            handle: Some(person.handle().to_string()),
            food_score: Some(i64::from(person.food_score())),
            character: Some(i64::from(person.character())),
            social_score: Some(i64::from(person.social_score())),
            image_data_url: person.avatar.as_ref().map(|image| image.as_str().to_string()),
            timestamp: Some(timestamp.into()),
        }
    }
}

/// One document as yielded by `list()`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredPerson {
    pub id: PersonId,
    pub record: PersonRecord,
}

impl StoredPerson {
    pub fn avatar(&self) -> Option<ImageRef> {
        self.record.image_data_url.clone().map(ImageRef::from_stored)
    }
}

/// Result of reading the whole collection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PersonListing {
    pub documents: Vec<StoredPerson>,
    /// Rows present in the store that could not be decoded.
    pub malformed: usize,
}

/// CRUD contract over the people collection.
pub trait PersonStore {
    /// Reads every decodable document, counting the ones that are not.
    fn scan(&self) -> StoreResult<PersonListing>;

    fn list(&self) -> StoreResult<Vec<StoredPerson>> {
        Ok(self.scan()?.documents)
    }

    fn create(&mut self, record: &PersonRecord) -> StoreResult<PersonId>;
    fn update(&mut self, id: PersonId, patch: &PersonPatch) -> StoreResult<()>;
    fn delete(&mut self, id: PersonId) -> StoreResult<()>;
}

impl<S: PersonStore + ?Sized> PersonStore for Box<S> {
    fn scan(&self) -> StoreResult<PersonListing> {
        (**self).scan()
    }

    fn create(&mut self, record: &PersonRecord) -> StoreResult<PersonId> {
        (**self).create(record)
    }

    fn update(&mut self, id: PersonId, patch: &PersonPatch) -> StoreResult<()> {
        (**self).update(id, patch)
    }

    fn delete(&mut self, id: PersonId) -> StoreResult<()> {
        (**self).delete(id)
    }
}

/// Vec-backed store for tests and store-less runs.
#[derive(Debug, Clone, Default)]
pub struct MemoryPersonStore {
    documents: Vec<StoredPerson>,
}

impl MemoryPersonStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds documents as if they had been created earlier.
    pub fn with_documents(documents: Vec<StoredPerson>) -> Self {
        Self { documents }
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

impl PersonStore for MemoryPersonStore {
    fn scan(&self) -> StoreResult<PersonListing> {
        Ok(PersonListing {
            documents: self.documents.clone(),
            malformed: 0,
        })
    }

    fn create(&mut self, record: &PersonRecord) -> StoreResult<PersonId> {
        let id = Uuid::new_v4();
        self.documents.push(StoredPerson {
            id,
            record: record.clone(),
        });
        Ok(id)
    }

    fn update(&mut self, id: PersonId, patch: &PersonPatch) -> StoreResult<()> {
        let document = self
            .documents
            .iter_mut()
            .find(|document| document.id == id)
            .ok_or(StoreError::NotFound(id))?;
        document.record.apply(patch);
        Ok(())
    }

    fn delete(&mut self, id: PersonId) -> StoreResult<()> {
        let index = self
            .documents
            .iter()
            .position(|document| document.id == id)
            .ok_or(StoreError::NotFound(id))?;
        self.documents.remove(index);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{MemoryPersonStore, PersonPatch, PersonRecord, PersonStore, StoreError};
    use crate::model::person::Person;
    use uuid::Uuid;

    fn record(handle: &str) -> PersonRecord {
        let person = Person::new(handle, 10, 90).unwrap();
        PersonRecord::from_person(&person, "2026-01-01T00:00:00.000Z")
    }

    #[test]
    fn record_uses_camel_case_wire_names() {
        let json = serde_json::to_value(record("@a")).unwrap();
        assert_eq!(json["foodScore"], 10);
        assert_eq!(json["socialScore"], 66);
        assert!(json.get("imageDataUrl").is_none());
    }

    #[test]
    fn record_without_timestamp_still_decodes() {
        let record: PersonRecord = serde_json::from_str(
            r#"{"handle":"@x","foodScore":5,"character":5,"socialScore":5}"#,
        )
        .unwrap();
        assert_eq!(record.handle, "@x");
        assert!(record.timestamp.is_empty());
    }

    #[test]
    fn memory_store_keeps_creation_order() {
        let mut store = MemoryPersonStore::new();
        let first = store.create(&record("@first")).unwrap();
        let second = store.create(&record("@second")).unwrap();

        let ids: Vec<_> = store.list().unwrap().into_iter().map(|doc| doc.id).collect();
        assert_eq!(ids, vec![first, second]);
    }

    #[test]
    fn patch_only_touches_present_fields() {
        let mut store = MemoryPersonStore::new();
        let id = store.create(&record("@a")).unwrap();
        let patch = PersonPatch {
            character: Some(20),
            ..PersonPatch::default()
        };
        store.update(id, &patch).unwrap();

        let doc = &store.list().unwrap()[0];
        assert_eq!(doc.record.character, 20);
        assert_eq!(doc.record.food_score, 10);
        assert_eq!(doc.record.handle, "@a");
    }

    #[test]
    fn missing_ids_are_not_found() {
        let mut store = MemoryPersonStore::new();
        let id = Uuid::new_v4();
        assert!(matches!(store.delete(id), Err(StoreError::NotFound(missing)) if missing == id));
        assert!(matches!(
            store.update(id, &PersonPatch::default()),
            Err(StoreError::NotFound(_))
        ));
    }
}
