//! SQLite-backed people collection.
//!
//! Each person is one JSON document in `people.document`; `people.seq`
//! keeps creation order. Rows whose id or document cannot be decoded are
//! skipped by `scan()` and reported in `PersonListing::malformed`.

use super::person_store::{
    PersonListing, PersonPatch, PersonRecord, PersonStore, StoreError, StoreResult, StoredPerson,
};
use crate::model::person::PersonId;
use log::{debug, error, warn};
use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

/// People store over a migrated connection (see `db::open_db`).
pub struct SqlitePersonStore<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqlitePersonStore<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    fn load_record(&self, id: PersonId) -> StoreResult<Option<PersonRecord>> {
        let document: Option<String> = self
            .conn
            .query_row(
                "SELECT document FROM people WHERE id = ?1;",
                [id.to_string()],
                |row| row.get(0),
            )
            .optional()?;
        document
            .map(|text| parse_document(id, &text))
            .transpose()
    }
}

impl PersonStore for SqlitePersonStore<'_> {
    fn scan(&self) -> StoreResult<PersonListing> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, document FROM people ORDER BY seq ASC;")?;
        let mut rows = stmt.query([])?;
        let mut listing = PersonListing::default();

        while let Some(row) = rows.next()? {
            let id_text: String = row.get("id")?;
            let document: String = row.get("document")?;
            match decode_row(&id_text, &document) {
                Ok(stored) => listing.documents.push(stored),
                Err(err) => {
                    warn!("event=store_list module=store status=skip id={id_text} error={err}");
                    listing.malformed += 1;
                }
            }
        }

        debug!(
            "event=store_list module=store status=ok count={} malformed={}",
            listing.documents.len(),
            listing.malformed
        );
        Ok(listing)
    }

    fn create(&mut self, record: &PersonRecord) -> StoreResult<PersonId> {
        let id = Uuid::new_v4();
        let document = serde_json::to_string(record)?;
        self.conn
            .execute(
                "INSERT INTO people (id, document) VALUES (?1, ?2);",
                params![id.to_string(), document],
            )
            .map_err(|err| {
                error!("event=store_create module=store status=error error={err}");
                err
            })?;
        Ok(id)
    }

    fn update(&mut self, id: PersonId, patch: &PersonPatch) -> StoreResult<()> {
        let mut record = self.load_record(id)?.ok_or(StoreError::NotFound(id))?;
        record.apply(patch);
        let document = serde_json::to_string(&record)?;

        let changed = self.conn.execute(
            "UPDATE people SET document = ?1 WHERE id = ?2;",
            params![document, id.to_string()],
        )?;
        if changed == 0 {
            return Err(StoreError::NotFound(id));
        }
        Ok(())
    }

    fn delete(&mut self, id: PersonId) -> StoreResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM people WHERE id = ?1;", [id.to_string()])?;
        if changed == 0 {
            return Err(StoreError::NotFound(id));
        }
        Ok(())
    }
}

fn decode_row(id_text: &str, document: &str) -> StoreResult<StoredPerson> {
    let id = Uuid::parse_str(id_text).map_err(|_| {
        StoreError::InvalidData(format!("invalid id `{id_text}` in people.id"))
    })?;
    let record = parse_document(id, document)?;
    Ok(StoredPerson { id, record })
}

fn parse_document(id: PersonId, text: &str) -> StoreResult<PersonRecord> {
    serde_json::from_str(text)
        .map_err(|err| StoreError::InvalidData(format!("person {id}: {err}")))
}
