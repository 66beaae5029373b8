use crate::error::{LoaderError, Result};
use crate::models::WordRecord;
use log::debug;
use serde::Deserialize;
use serde_json::Value;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

/// Reads the input document at `path` and parses it into word records.
pub fn read_input(path: &Path) -> Result<Vec<WordRecord>> {
    debug!("Reading input document {:?}", path);
    let content = fs::read_to_string(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => LoaderError::InputFileNotFound(path.to_path_buf()),
        _ => LoaderError::Io(e),
    })?;
    parse_document(&content)
}

/// Parses the text of an input document.
///
/// The top-level value must be an array of objects. Field presence is not
/// checked here; see [`WordRecord`].
pub fn parse_document(content: &str) -> Result<Vec<WordRecord>> {
    let value: Value = serde_json::from_str(content)?;
    let elements = match value {
        Value::Array(elements) => elements,
        other => {
            return Err(LoaderError::InvalidInput(format!(
                "top-level value must be an array, found {}",
                json_type_name(&other)
            )));
        }
    };

    let records = elements
        .iter()
        .enumerate()
        .map(|(index, element)| {
            WordRecord::deserialize(element)
                .map_err(|e| LoaderError::InvalidInput(format!("element {}: {}", index, e)))
        })
        .collect::<Result<Vec<_>>>()?;
    debug!("Parsed {} word records.", records.len());
    Ok(records)
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
