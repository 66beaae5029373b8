//! Loads a JSON word list into a SQLite dictionary store and reads it back.
//!
//! The input document is an array of `{ "word", "data": [{ "word", "definition" }] }`
//! objects. Each element becomes one row in `words` and each `data` entry one row
//! in `definitions`, whose `definition_header` column holds the entry's `word`.

// Declare modules
pub mod db;
pub mod error;
pub mod models;
pub mod parse;
pub mod progress;

// Re-export key types for easier use
pub use error::{LoaderError, Result};
pub use models::{
    Definition, DefinitionRecord, IngestSummary, StoreCounts, Word, WordRecord,
    render_definition,
};

use log::{debug, error, info};
use progress::ProgressCallback;
use rusqlite::{Connection, OpenFlags, OptionalExtension, params};
use std::fs;
use std::path::{Path, PathBuf};

// --- Constants ---

/// Store file written when no other location is configured.
pub const DEFAULT_DB_FILENAME: &str = "database.sqlite";

/// Options for opening the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadOptions {
    /// Where the store file is written. Relative paths resolve against the
    /// working directory.
    pub output_path: PathBuf,
}

impl Default for LoadOptions {
    fn default() -> Self {
        LoadOptions {
            output_path: PathBuf::from(DEFAULT_DB_FILENAME),
        }
    }
}

/// An open dictionary store.
pub struct Store {
    conn: Connection,
    db_file_path: PathBuf,
}

// Helper function to open/create the database connection
fn open_db_connection(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let conn = Connection::open_with_flags(
        path,
        OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_CREATE,
    )?;

    // Cascading deletes are only enforced with foreign keys switched on
    conn.pragma_update(None, "foreign_keys", "ON")?;
    conn.pragma_update(None, "synchronous", "NORMAL")?;

    Ok(conn)
}

/// Reads the document at `input` and appends its contents to the store
/// described by `options`.
///
/// The input is parsed before the store is touched, so a missing or malformed
/// file leaves no trace. Insert failures roll back the whole run.
pub fn ingest(
    input: &Path,
    options: &LoadOptions,
    reporter: Option<ProgressCallback>,
) -> Result<IngestSummary> {
    let records = parse::read_input(input)?;
    info!("Read {} word records from {:?}", records.len(), input);

    let mut store = Store::open(options)?;
    let summary = store.ingest_records(&records, reporter)?;
    store.close()?;
    Ok(summary)
}

impl Store {
    /// Opens or creates the store and ensures its schema.
    pub fn open(options: &LoadOptions) -> Result<Self> {
        let db_path = &options.output_path;
        info!("Using database path: {:?}", db_path);

        let mut conn = open_db_connection(db_path)?;
        db::initialize_database(&mut conn)?;

        Ok(Store {
            conn,
            db_file_path: db_path.clone(),
        })
    }

    /// Opens an existing store for queries without creating or altering it.
    pub fn open_existing(options: &LoadOptions) -> Result<Self> {
        let db_path = &options.output_path;
        if !db_path.exists() {
            return Err(LoaderError::StoreNotFound(db_path.clone()));
        }
        debug!("Opening existing database: {:?}", db_path);
        let conn = Connection::open_with_flags(db_path, OpenFlags::SQLITE_OPEN_READ_ONLY)?;
        Ok(Store {
            conn,
            db_file_path: db_path.clone(),
        })
    }

    /// Opens a schema-ready store that lives only in memory.
    pub fn open_in_memory() -> Result<Self> {
        let mut conn = Connection::open_in_memory()?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        db::initialize_database(&mut conn)?;
        Ok(Store {
            conn,
            db_file_path: PathBuf::from(":memory:"),
        })
    }

    /// Path of the backing database file.
    pub fn path(&self) -> &Path {
        &self.db_file_path
    }

    /// Inserts `records` in one transaction. See [`db::populate_database`].
    pub fn ingest_records(
        &mut self,
        records: &[WordRecord],
        mut reporter: Option<ProgressCallback>,
    ) -> Result<IngestSummary> {
        db::populate_database(&mut self.conn, records, &mut reporter)
    }

    /// Closes the connection, surfacing any error SQLite reports on close.
    pub fn close(self) -> Result<()> {
        self.conn.close().map_err(|(_, e)| {
            error!("Failed to close database {:?}: {}", self.db_file_path, e);
            LoaderError::Database(e)
        })
    }

    /// Clears the store file at `path`, along with its rollback journal.
    ///
    /// A missing file is not an error.
    pub fn clear_database(path: &Path) -> Result<()> {
        if !path.exists() {
            info!("Database file not found, nothing to clear: {:?}", path);
            return Ok(());
        }
        fs::remove_file(path).map_err(|e| {
            error!("Failed to delete database file {:?}: {}", path, e);
            LoaderError::Io(e)
        })?;
        info!("Deleted database file: {:?}", path);

        let mut journal = path.as_os_str().to_owned();
        journal.push("-journal");
        let journal_path = PathBuf::from(journal);
        if journal_path.exists() {
            let _ = fs::remove_file(journal_path); // Ignore error if deletion fails
        }
        Ok(())
    }

    // --- Query Methods ---

    /// Row counts of both tables.
    pub fn counts(&self) -> Result<StoreCounts> {
        db::count_rows(&self.conn)
    }

    /// Finds the first word whose text equals `word` exactly.
    pub fn find_word(&self, word: &str) -> Result<Option<Word>> {
        self.conn
            .query_row(
                "SELECT id, word FROM words WHERE word = ?1 ORDER BY id LIMIT 1",
                params![word],
                |row| {
                    Ok(Word {
                        id: row.get(0)?,
                        word: row.get(1)?,
                    })
                },
            )
            .optional()
            .map_err(LoaderError::from)
    }

    /// Retrieves the definitions of `word` in insertion order.
    pub fn definitions_for_word(&self, word: &Word) -> Result<Vec<Definition>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, word_id, definition, definition_header
             FROM definitions WHERE word_id = ?1 ORDER BY id",
        )?;
        let def_iter = stmt.query_map(params![word.id], |row| {
            Ok(Definition {
                id: row.get(0)?,
                word_id: row.get(1)?,
                definition: row.get(2)?,
                definition_header: row.get(3)?,
            })
        })?;
        def_iter
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(LoaderError::from)
    }

    /// Looks up a search term the way the dictionary front end does: trimmed,
    /// lowercased and matched exactly.
    pub fn lookup(&self, query: &str) -> Result<Option<(Word, Vec<Definition>)>> {
        let term = query.trim().to_lowercase();
        debug!("lookup: term='{}'", term);
        match self.find_word(&term)? {
            Some(word) => {
                let definitions = self.definitions_for_word(&word)?;
                Ok(Some((word, definitions)))
            }
            None => {
                debug!("No word found for '{}'", term);
                Ok(None)
            }
        }
    }
}
