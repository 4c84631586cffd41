/// SQLite-backed store for merged ability records.
///
/// Records are keyed by `template_name`. Writing a record whose key already
/// exists merges it field by field instead of replacing the row, so a scan of
/// a partial mod set (one file updated, the rest untouched) cannot blank out
/// text discovered earlier:
///
/// | field | replaced when the incoming value is |
/// |---|---|
/// | `friendly_name` | non-empty and not `"Unknown"` |
/// | `description`, `help_text`, `promotion_text`, `flyover_text` | non-empty |
/// | `source_file` | always |
///
/// [`merge_record`] is the same rule as a plain function; the SQL in
/// [`UPSERT_SQL`] must agree with it.
///
/// The store has a single writer. It is used from one thread after the
/// parallel scan has finished.
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

use crate::errors::ScanResult;
use crate::results::{is_valid_friendly_name, AbilityRecord};

const SCHEMA_SQL: &str = r#"
    CREATE TABLE IF NOT EXISTS abilities (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        template_name TEXT UNIQUE NOT NULL,
        friendly_name TEXT,
        description TEXT,
        help_text TEXT,
        promotion_text TEXT,
        flyover_text TEXT,
        source_file TEXT
    );

    -- Reserved for linking soldier classes to abilities; nothing populates these yet
    CREATE TABLE IF NOT EXISTS character_templates (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        character_name TEXT NOT NULL,
        character_class TEXT
    );

    CREATE TABLE IF NOT EXISTS character_abilities (
        character_id INTEGER,
        ability_id INTEGER,
        FOREIGN KEY(character_id) REFERENCES character_templates(id),
        FOREIGN KEY(ability_id) REFERENCES abilities(id),
        PRIMARY KEY (character_id, ability_id)
    );
"#;

/// Insert-or-merge for one record; see the module docs for the per-field rule
pub const UPSERT_SQL: &str = r#"
    INSERT INTO abilities (
        template_name, friendly_name, description,
        help_text, promotion_text, flyover_text, source_file
    )
    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
    ON CONFLICT(template_name) DO UPDATE SET
        friendly_name = CASE
            WHEN excluded.friendly_name != 'Unknown' AND excluded.friendly_name != ''
            THEN excluded.friendly_name
            ELSE abilities.friendly_name
        END,
        description = CASE
            WHEN excluded.description != '' THEN excluded.description
            ELSE abilities.description
        END,
        help_text = CASE
            WHEN excluded.help_text != '' THEN excluded.help_text
            ELSE abilities.help_text
        END,
        promotion_text = CASE
            WHEN excluded.promotion_text != '' THEN excluded.promotion_text
            ELSE abilities.promotion_text
        END,
        flyover_text = CASE
            WHEN excluded.flyover_text != '' THEN excluded.flyover_text
            ELSE abilities.flyover_text
        END,
        source_file = excluded.source_file
"#;

const SELECT_COLUMNS: &str = "SELECT id, template_name, friendly_name, description, help_text, \
     promotion_text, flyover_text, source_file FROM abilities";

/// How a search term is matched against names
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchCase {
    /// ASCII case-insensitive substring match
    #[default]
    Insensitive,
    /// Exact substring match
    Sensitive,
}

/// A persisted ability together with its row id
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredAbility {
    pub id: i64,
    #[serde(flatten)]
    pub record: AbilityRecord,
}

/// Applies the merge rule to a stored record and an incoming one with the same key
pub fn merge_record(existing: &AbilityRecord, incoming: &AbilityRecord) -> AbilityRecord {
    fn keep_non_empty(old: &str, new: &str) -> String {
        let kept = if new.is_empty() { old } else { new };
        kept.to_string()
    }

    AbilityRecord {
        template_name: existing.template_name.clone(),
        friendly_name: if is_valid_friendly_name(&incoming.friendly_name) {
            incoming.friendly_name.clone()
        } else {
            existing.friendly_name.clone()
        },
        description: keep_non_empty(&existing.description, &incoming.description),
        help_text: keep_non_empty(&existing.help_text, &incoming.help_text),
        promotion_text: keep_non_empty(&existing.promotion_text, &incoming.promotion_text),
        flyover_text: keep_non_empty(&existing.flyover_text, &incoming.flyover_text),
        source_file: incoming.source_file.clone(),
    }
}

/// Persistent ability store
pub struct AbilityStore {
    conn: Connection,
    search_case: SearchCase,
}

impl AbilityStore {
    /// Opens (creating if needed) the database at `path` and ensures the schema exists
    pub fn open(path: &Path) -> ScanResult<Self> {
        debug!("Opening ability store at {}", path.display());
        Self::with_connection(Connection::open(path)?)
    }

    /// Opens a private in-memory database
    pub fn open_in_memory() -> ScanResult<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> ScanResult<Self> {
        let store = Self {
            conn,
            search_case: SearchCase::default(),
        };
        store.init_schema()?;
        Ok(store)
    }

    /// Sets how [`AbilityStore::query`] matches search terms
    pub fn with_search_case(mut self, search_case: SearchCase) -> Self {
        self.search_case = search_case;
        self
    }

    /// Creates the tables if they do not exist
    pub fn init_schema(&self) -> ScanResult<()> {
        self.conn.execute_batch(SCHEMA_SQL)?;
        Ok(())
    }

    /// Merges `records` into the store in one transaction.
    ///
    /// Either the whole batch commits or none of it does. Returns the number of
    /// records written; records with an empty template name are skipped.
    pub fn upsert(&mut self, records: &[AbilityRecord]) -> ScanResult<usize> {
        match self.upsert_batch(records) {
            Ok(written) => {
                info!("Committed {} records to the store", written);
                Ok(written)
            }
            Err(e) => {
                error!("Database error, batch of {} rolled back: {}", records.len(), e);
                Err(e.into())
            }
        }
    }

    fn upsert_batch(&mut self, records: &[AbilityRecord]) -> rusqlite::Result<usize> {
        let tx = self.conn.transaction()?;
        let mut written = 0;

        {
            let mut stmt = tx.prepare_cached(UPSERT_SQL)?;
            for record in records {
                if record.template_name.is_empty() {
                    warn!(
                        "Skipping record without template name from {}",
                        record.source_file.display()
                    );
                    continue;
                }
                stmt.execute(params![
                    record.template_name,
                    record.friendly_name,
                    record.description,
                    record.help_text,
                    record.promotion_text,
                    record.flyover_text,
                    record.source_file.to_string_lossy(),
                ])?;
                written += 1;
            }
        }

        tx.commit()?;
        Ok(written)
    }

    /// Returns records whose friendly or template name contains `search`, or all records.
    ///
    /// An empty search term is the same as none. Results are in insertion order.
    pub fn query(&self, search: Option<&str>) -> ScanResult<Vec<StoredAbility>> {
        let rows = match search.filter(|s| !s.is_empty()) {
            None => {
                let mut stmt = self.conn.prepare(&format!("{SELECT_COLUMNS} ORDER BY id"))?;
                let rows = stmt.query_map([], row_to_stored)?;
                rows.collect::<rusqlite::Result<Vec<_>>>()?
            }
            Some(term) => {
                // instr() keeps % and _ in the term literal, unlike LIKE
                let filter = match self.search_case {
                    SearchCase::Sensitive => {
                        "instr(friendly_name, ?1) > 0 OR instr(template_name, ?1) > 0"
                    }
                    SearchCase::Insensitive => {
                        "instr(lower(friendly_name), lower(?1)) > 0 \
                         OR instr(lower(template_name), lower(?1)) > 0"
                    }
                };
                let mut stmt = self
                    .conn
                    .prepare(&format!("{SELECT_COLUMNS} WHERE {filter} ORDER BY id"))?;
                let rows = stmt.query_map([term], row_to_stored)?;
                rows.collect::<rusqlite::Result<Vec<_>>>()?
            }
        };
        Ok(rows)
    }

    /// Looks up a single record by template name
    pub fn get(&self, template_name: &str) -> ScanResult<Option<StoredAbility>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{SELECT_COLUMNS} WHERE template_name = ?1"))?;
        Ok(stmt.query_row([template_name], row_to_stored).optional()?)
    }

    /// Number of stored records
    pub fn count(&self) -> ScanResult<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM abilities", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}

fn row_to_stored(row: &Row<'_>) -> rusqlite::Result<StoredAbility> {
    let text = |idx: usize| -> rusqlite::Result<String> {
        Ok(row.get::<_, Option<String>>(idx)?.unwrap_or_default())
    };

    Ok(StoredAbility {
        id: row.get(0)?,
        record: AbilityRecord {
            template_name: row.get(1)?,
            friendly_name: text(2)?,
            description: text(3)?,
            help_text: text(4)?,
            promotion_text: text(5)?,
            flyover_text: text(6)?,
            source_file: PathBuf::from(text(7)?),
        },
    })
}
