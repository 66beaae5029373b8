use dict_loader::{LoadOptions, LoaderError, Store, StoreCounts, ingest};
use rusqlite::{Connection, params};
use serde_json::{Value, json};
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::{TempDir, tempdir};

const CAT_DOCUMENT: &str = r#"[{"word":"cat","data":[{"word":"n","definition":"a feline"}]}]"#;

// Helper to write an input document into a fresh temporary directory
fn write_input(dir: &TempDir, content: &str) -> PathBuf {
    let path = dir.path().join("input.json");
    std::fs::write(&path, content).unwrap();
    path
}

fn options_in(dir: &TempDir) -> LoadOptions {
    LoadOptions {
        output_path: dir.path().join("database.sqlite"),
    }
}

fn counts(db_path: &Path) -> StoreCounts {
    let conn = Connection::open(db_path).unwrap();
    let words: i64 = conn
        .query_row("SELECT COUNT(*) FROM words", [], |row| row.get(0))
        .unwrap();
    let definitions: i64 = conn
        .query_row("SELECT COUNT(*) FROM definitions", [], |row| row.get(0))
        .unwrap();
    StoreCounts {
        words: words as u64,
        definitions: definitions as u64,
    }
}

fn run_cli(dir: &TempDir, args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_dict-loader"))
        .args(args)
        .current_dir(dir.path())
        .env("NO_COLOR", "1")
        .env("CLICOLOR", "0")
        .env_remove("CLICOLOR_FORCE")
        .output()
        .unwrap()
}

#[test]
fn test_row_counts_match_input() {
    let dir = tempdir().unwrap();
    let input = write_input(
        &dir,
        &json!([
            {"word": "cat", "data": [
                {"word": "n.", "definition": "a feline"},
                {"word": "v.", "definition": ["to ", {"type": "i", "children": ["vomit"]}]}
            ]},
            {"word": "dog", "data": [{"word": "n.", "definition": {"text": "a canine"}}]},
            {"word": "emu", "data": []}
        ])
        .to_string(),
    );
    let options = options_in(&dir);

    let summary = ingest(&input, &options, None).unwrap();
    assert_eq!(summary.words_inserted, 3);
    assert_eq!(summary.definitions_inserted, 3);
    assert_eq!(
        counts(&options.output_path),
        StoreCounts {
            words: 3,
            definitions: 3
        }
    );
}

#[test]
fn test_definitions_reference_their_word_and_round_trip() {
    let dir = tempdir().unwrap();
    let document = json!([
        {"word": "cat", "data": [
            {"word": "n.", "definition": "a feline"},
            {"word": "v.", "definition": [1, {"nested": [true, null]}, "x"]}
        ]},
        {"word": "dog", "data": [{"word": "n.", "definition": 3.5}]}
    ]);
    let input = write_input(&dir, &document.to_string());
    let options = options_in(&dir);
    ingest(&input, &options, None).unwrap();

    let conn = Connection::open(&options.output_path).unwrap();
    for element in document.as_array().unwrap() {
        let word = element["word"].as_str().unwrap();
        let word_id: i64 = conn
            .query_row(
                "SELECT id FROM words WHERE word = ?1",
                params![word],
                |row| row.get(0),
            )
            .unwrap();
        let mut stmt = conn
            .prepare(
                "SELECT definition, definition_header FROM definitions
                 WHERE word_id = ?1 ORDER BY id",
            )
            .unwrap();
        let stored: Vec<(String, String)> = stmt
            .query_map(params![word_id], |row| Ok((row.get(0)?, row.get(1)?)))
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();

        let expected = element["data"].as_array().unwrap();
        assert_eq!(stored.len(), expected.len());
        for ((definition, header), entry) in stored.iter().zip(expected) {
            assert_eq!(header, entry["word"].as_str().unwrap());
            let parsed: Value = serde_json::from_str(definition).unwrap();
            assert_eq!(parsed, entry["definition"]);
        }
    }
}

#[test]
fn test_rerun_appends_rows() {
    let dir = tempdir().unwrap();
    let input = write_input(&dir, CAT_DOCUMENT);
    let options = options_in(&dir);

    ingest(&input, &options, None).unwrap();
    assert_eq!(
        counts(&options.output_path),
        StoreCounts {
            words: 1,
            definitions: 1
        }
    );

    ingest(&input, &options, None).unwrap();
    assert_eq!(
        counts(&options.output_path),
        StoreCounts {
            words: 2,
            definitions: 2
        }
    );
}

#[test]
fn test_empty_document() {
    let dir = tempdir().unwrap();
    let input = write_input(&dir, "[]");
    let options = options_in(&dir);

    let summary = ingest(&input, &options, None).unwrap();
    assert_eq!(summary.words_inserted, 0);
    assert_eq!(counts(&options.output_path), StoreCounts::default());
}

#[test]
fn test_missing_definition_field_stores_nothing() {
    let dir = tempdir().unwrap();
    let input = write_input(
        &dir,
        r#"[{"word":"cat","data":[{"word":"n","definition":"a feline"}]},
            {"word":"dog","data":[{"word":"n"}]},
            {"word":"emu","data":[{"word":"n","definition":"a bird"}]}]"#,
    );
    let options = options_in(&dir);

    let err = ingest(&input, &options, None).unwrap_err();
    assert!(matches!(
        err,
        LoaderError::MissingField {
            field: "definition",
            ..
        }
    ));
    assert_eq!(counts(&options.output_path), StoreCounts::default());
}

#[test]
fn test_bad_input_does_not_create_store() {
    let dir = tempdir().unwrap();
    let options = options_in(&dir);

    let missing = dir.path().join("missing.json");
    assert!(matches!(
        ingest(&missing, &options, None),
        Err(LoaderError::InputFileNotFound(_))
    ));

    let malformed = write_input(&dir, "[{\"word\": ");
    assert!(matches!(
        ingest(&malformed, &options, None),
        Err(LoaderError::Json(_))
    ));
    assert!(!options.output_path.exists());
}

#[test]
fn test_existing_schema_is_reused() {
    let dir = tempdir().unwrap();
    let options = options_in(&dir);
    {
        let conn = Connection::open(&options.output_path).unwrap();
        conn.execute_batch(
            "CREATE TABLE words (
                id INTEGER PRIMARY KEY AUTOINCREMENT NOT NULL,
                word TEXT NOT NULL
            );
            CREATE TABLE definitions (
                id INTEGER PRIMARY KEY AUTOINCREMENT NOT NULL,
                word_id INTEGER NOT NULL,
                definition TEXT NOT NULL,
                definition_header TEXT NOT NULL,
                FOREIGN KEY (word_id) REFERENCES words(id) ON DELETE CASCADE
            );
            INSERT INTO words (word) VALUES ('old');
            INSERT INTO definitions (word_id, definition, definition_header)
                VALUES (1, '\"kept\"', 'n');",
        )
        .unwrap();
    }

    let input = write_input(&dir, CAT_DOCUMENT);
    ingest(&input, &options, None).unwrap();

    let store = Store::open(&options).unwrap();
    assert_eq!(
        store.counts().unwrap(),
        StoreCounts {
            words: 2,
            definitions: 2
        }
    );
    let (_, old_definitions) = store.lookup("old").unwrap().unwrap();
    assert_eq!(old_definitions[0].render_body(), "kept");
    store.close().unwrap();
}

#[test]
fn test_cli_loads_into_default_path() {
    let dir = tempdir().unwrap();
    write_input(&dir, CAT_DOCUMENT);

    let output = run_cli(&dir, &["input.json"]);
    assert!(output.status.success(), "{:?}", output);
    assert_eq!(
        counts(&dir.path().join("database.sqlite")),
        StoreCounts {
            words: 1,
            definitions: 1
        }
    );
}

#[test]
fn test_cli_missing_argument() {
    let dir = tempdir().unwrap();
    let output = run_cli(&dir, &[]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("no input file provided"), "{}", stderr);
    assert!(!dir.path().join("database.sqlite").exists());
}

#[test]
fn test_cli_insert_failure_exits_non_zero() {
    let dir = tempdir().unwrap();
    write_input(&dir, r#"[{"word":"cat","data":[{"definition":"a feline"}]}]"#);

    let output = run_cli(&dir, &["input.json"]);
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Error:"), "{}", stderr);
    assert!(stderr.contains("Missing field 'word'"), "{}", stderr);
    assert_eq!(
        counts(&dir.path().join("database.sqlite")),
        StoreCounts::default()
    );
}

#[test]
fn test_cli_define_and_stats() {
    let dir = tempdir().unwrap();
    write_input(&dir, CAT_DOCUMENT);
    assert!(run_cli(&dir, &["input.json"]).status.success());

    let define = run_cli(&dir, &["define", "Cat"]);
    assert!(define.status.success());
    let stdout = String::from_utf8_lossy(&define.stdout);
    assert!(stdout.contains("cat"), "{}", stdout);
    assert!(stdout.contains("a feline"), "{}", stdout);

    let unknown = run_cli(&dir, &["define", "emu"]);
    assert!(unknown.status.success());
    assert!(String::from_utf8_lossy(&unknown.stdout).contains("No definitions found"));

    let stats = run_cli(&dir, &["stats"]);
    let stdout = String::from_utf8_lossy(&stats.stdout);
    assert!(stdout.contains("Words: 1"), "{}", stdout);
    assert!(stdout.contains("Definitions: 1"), "{}", stdout);

    assert!(run_cli(&dir, &["clear-db"]).status.success());
    assert!(!dir.path().join("database.sqlite").exists());
}

#[test]
fn test_cli_queries_do_not_create_store() {
    let dir = tempdir().unwrap();

    for args in [&["define", "cat"][..], &["stats"][..]] {
        let output = run_cli(&dir, args);
        assert_eq!(output.status.code(), Some(1), "{:?}", output);
        let stderr = String::from_utf8_lossy(&output.stderr);
        assert!(stderr.contains("Database not found"), "{}", stderr);
    }
    assert!(!dir.path().join("database.sqlite").exists());
}
