use crate::error::{LoaderError, Result};
use crate::models::{DefinitionRecord, IngestSummary, StoreCounts, WordRecord};
use crate::progress::{ProgressCallback, ProgressUpdate};
use log::{debug, info, trace, warn};
use rusqlite::{Connection, Statement, params};
use std::time::Instant;

// --- Schema Definition ---

const CREATE_WORDS_TABLE: &str = "
CREATE TABLE IF NOT EXISTS words (
    id INTEGER PRIMARY KEY AUTOINCREMENT NOT NULL,
    word TEXT NOT NULL
);";

const CREATE_DEFINITIONS_TABLE: &str = "
CREATE TABLE IF NOT EXISTS definitions (
    id INTEGER PRIMARY KEY AUTOINCREMENT NOT NULL,
    word_id INTEGER NOT NULL,
    definition TEXT NOT NULL, -- JSON text of the definition body
    definition_header TEXT NOT NULL,
    FOREIGN KEY (word_id)
        REFERENCES words(id)
        ON DELETE CASCADE
);";

// --- Indices ---

const CREATE_WORD_INDEX: &str = "CREATE INDEX IF NOT EXISTS idx_words_word ON words (word);";
const CREATE_DEFINITION_WORD_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS idx_definitions_word_id ON definitions (word_id);";

const INSERT_WORD: &str = "INSERT INTO words (word) VALUES (?1)";
const INSERT_DEFINITION: &str =
    "INSERT INTO definitions (word_id, definition, definition_header) VALUES (?1, ?2, ?3)";

const INGEST_STAGE: &str = "Inserting words";

// --- Initialization Function ---

/// Creates both tables and their indices if they don't exist.
pub fn initialize_database(conn: &mut Connection) -> Result<()> {
    info!("Ensuring database schema...");
    let tx = conn.transaction()?;

    tx.execute(CREATE_WORDS_TABLE, [])?;
    tx.execute(CREATE_DEFINITIONS_TABLE, [])?;

    tx.execute(CREATE_WORD_INDEX, [])?;
    tx.execute(CREATE_DEFINITION_WORD_INDEX, [])?;

    tx.commit()?;
    info!("Database schema ready.");
    Ok(())
}

// --- Data Population Function ---

/// Inserts every record into the database inside a single transaction.
///
/// Each record yields one `words` row followed by one `definitions` row per
/// entry of its `data` array. The first failure aborts the run and the
/// transaction is rolled back when it goes out of scope, so either every
/// record is stored or none is.
pub fn populate_database(
    conn: &mut Connection,
    records: &[WordRecord],
    reporter: &mut Option<ProgressCallback>,
) -> Result<IngestSummary> {
    info!("Populating database from {} word records...", records.len());
    let start_time = Instant::now();
    let total_words = records.len() as u64;
    let mut summary = IngestSummary::default();

    report(
        reporter,
        ProgressUpdate::new_stage(INGEST_STAGE.to_string(), Some(total_words)),
    )?;

    let tx = conn.transaction()?;
    {
        let mut word_stmt = tx.prepare(INSERT_WORD)?;
        let mut def_stmt = tx.prepare(INSERT_DEFINITION)?;

        for (index, record) in records.iter().enumerate() {
            let word = record.word.as_deref().ok_or_else(|| LoaderError::MissingField {
                field: "word",
                context: format!("element {}", index),
            })?;
            let word_id = word_stmt.insert(params![word])?;
            trace!("Inserted word '{}' as id {}", word, word_id);

            let data = record.data.as_ref().ok_or_else(|| LoaderError::MissingField {
                field: "data",
                context: format!("element {} ('{}')", index, word),
            })?;
            for (def_index, entry) in data.iter().enumerate() {
                insert_definition(&mut def_stmt, word_id, entry).map_err(|e| {
                    warn!(
                        "Failed to insert definition {} of word '{}': {}",
                        def_index, word, e
                    );
                    match e {
                        LoaderError::MissingField { field, .. } => LoaderError::MissingField {
                            field,
                            context: format!("definition {} of word '{}'", def_index, word),
                        },
                        other => other,
                    }
                })?;
                summary.definitions_inserted += 1;
            }
            summary.words_inserted += 1;
            debug!("Inserted '{}' with {} definitions.", word, data.len());

            report(
                reporter,
                ProgressUpdate::item(
                    INGEST_STAGE,
                    summary.words_inserted,
                    Some(total_words),
                    Some(word.to_string()),
                ),
            )?;
        }
    }
    tx.commit()?;

    info!(
        "Database population complete: {} words, {} definitions. Took {:.2?}",
        summary.words_inserted,
        summary.definitions_inserted,
        start_time.elapsed()
    );
    Ok(summary)
}

/// Inserts one definition row for `word_id`, storing the body as JSON text.
fn insert_definition(stmt: &mut Statement<'_>, word_id: i64, entry: &DefinitionRecord) -> Result<()> {
    let header = entry.header.as_deref().ok_or(LoaderError::MissingField {
        field: "word",
        context: String::new(),
    })?;
    let body = entry.definition.as_ref().ok_or(LoaderError::MissingField {
        field: "definition",
        context: String::new(),
    })?;
    let definition = serde_json::to_string(body)?;
    stmt.execute(params![word_id, definition, header])?;
    Ok(())
}

fn report(reporter: &mut Option<ProgressCallback>, update: ProgressUpdate) -> Result<()> {
    if let Some(cb) = reporter.as_mut() {
        if !cb(update) {
            warn!("Ingestion cancelled by progress callback.");
            return Err(LoaderError::Cancelled);
        }
    }
    Ok(())
}

/// Counts the rows of both tables.
pub fn count_rows(conn: &Connection) -> Result<StoreCounts> {
    let words: i64 = conn.query_row("SELECT COUNT(*) FROM words", [], |row| row.get(0))?;
    let definitions: i64 =
        conn.query_row("SELECT COUNT(*) FROM definitions", [], |row| row.get(0))?;
    Ok(StoreCounts {
        words: words as u64,
        definitions: definitions as u64,
    })
}
