use std::path::Path;

use rusqlite::{Connection, ErrorCode};

use super::{BulkOutcome, DocumentStore, Rejection};
use crate::error::StoreError;
use crate::record::Cable;

pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        init_schema(&conn)?;
        Ok(SqliteStore { conn })
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        init_schema(&conn)?;
        Ok(SqliteStore { conn })
    }

    #[cfg(test)]
    pub(crate) fn get(&self, id: &str) -> Result<Option<Cable>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, reference_id, date_time, classification, origin, header, body
             FROM cables WHERE id = ?1",
        )?;
        let mut rows = stmt.query_map([id], |row| {
            Ok(Cable {
                id: row.get(0)?,
                reference_id: row.get(1)?,
                date_time: row.get(2)?,
                classification: row.get(3)?,
                origin: row.get(4)?,
                header: row.get(5)?,
                body: row.get(6)?,
            })
        })?;
        Ok(rows.next().transpose()?)
    }
}

fn init_schema(conn: &Connection) -> Result<(), StoreError> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS cables (
            id             TEXT PRIMARY KEY,
            reference_id   TEXT NOT NULL,
            date_time      TEXT NOT NULL,
            classification TEXT NOT NULL,
            origin         TEXT NOT NULL,
            header         TEXT NOT NULL,
            body           TEXT NOT NULL,
            created_at     TEXT NOT NULL DEFAULT (datetime('now'))
        );
        ",
    )?;
    Ok(())
}

impl DocumentStore for SqliteStore {
    fn all_ids(&self) -> Result<Vec<String>, StoreError> {
        let mut stmt = self.conn.prepare("SELECT id FROM cables")?;
        let ids = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(ids)
    }

    /// One transaction per batch. Primary-key collisions are rejections;
    /// anything else rolls the batch back and is returned as an error.
    fn bulk_save(&self, docs: &[Cable]) -> Result<BulkOutcome, StoreError> {
        let tx = self.conn.unchecked_transaction()?;
        let mut outcome = BulkOutcome::default();
        {
            let mut stmt = tx.prepare(
                "INSERT INTO cables
                 (id, reference_id, date_time, classification, origin, header, body)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            )?;
            for c in docs {
                let res = stmt.execute(rusqlite::params![
                    c.id, c.reference_id, c.date_time, c.classification, c.origin, c.header, c.body,
                ]);
                match res {
                    Ok(_) => outcome.accepted += 1,
                    Err(rusqlite::Error::SqliteFailure(e, _)) if e.code == ErrorCode::ConstraintViolation => {
                        outcome.rejected.push(Rejection {
                            id: c.id.clone(),
                            reason: "conflict".to_string(),
                        });
                    }
                    Err(e) => return Err(e.into()),
                }
            }
        }
        tx.commit()?;
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{extract_cable, fixtures::cable_html};

    fn cable(id: &str) -> Cable {
        extract_cable(&cable_html(id)).unwrap()
    }

    #[test]
    fn saves_and_lists_ids() {
        let store = SqliteStore::open_in_memory().unwrap();
        let outcome = store.bulk_save(&[cable("A1"), cable("A2")]).unwrap();
        assert_eq!(outcome.accepted, 2);
        assert!(!outcome.is_partial());
        let mut ids = store.all_ids().unwrap();
        ids.sort();
        assert_eq!(ids, vec!["A1", "A2"]);
    }

    #[test]
    fn stored_document_round_trips() {
        let store = SqliteStore::open_in_memory().unwrap();
        let c = cable("A1");
        store.bulk_save(std::slice::from_ref(&c)).unwrap();
        assert_eq!(store.get("A1").unwrap(), Some(c));
        assert_eq!(store.get("nope").unwrap(), None);
    }

    #[test]
    fn conflicting_id_is_rejected_rest_committed() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.bulk_save(&[cable("A1")]).unwrap();

        let outcome = store.bulk_save(&[cable("A1"), cable("A2")]).unwrap();
        assert_eq!(outcome.accepted, 1);
        assert_eq!(
            outcome.rejected,
            vec![Rejection { id: "A1".into(), reason: "conflict".into() }]
        );
        assert!(store.get("A2").unwrap().is_some());
    }

    #[test]
    fn missing_table_is_fatal() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.conn.execute_batch("DROP TABLE cables;").unwrap();
        assert!(matches!(
            store.bulk_save(&[cable("A1")]),
            Err(StoreError::Sqlite(_))
        ));
    }

    #[test]
    fn reopening_file_keeps_documents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cables.sqlite");
        SqliteStore::open(&path).unwrap().bulk_save(&[cable("A1")]).unwrap();
        let again = SqliteStore::open(&path).unwrap();
        assert_eq!(again.all_ids().unwrap(), vec!["A1"]);
    }
}
