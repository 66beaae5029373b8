//! Defines structures and types for progress reporting.

/// Represents a snapshot of the progress during ingestion.
#[derive(Debug, Clone)]
pub struct ProgressUpdate {
    /// A description of the current stage (e.g., "Inserting words").
    pub stage_description: String,
    /// Number of items processed in the current stage.
    pub current_item: u64,
    /// Total number of items expected in the current stage (if known).
    pub total_items: Option<u64>,
    /// An optional message providing more context (e.g., the word just inserted).
    pub message: Option<String>,
}

/// Type alias for the progress callback function.
///
/// The callback receives a `ProgressUpdate` and returns `true` to continue,
/// or `false` to cancel. A cancelled ingestion is rolled back.
pub type ProgressCallback = Box<dyn FnMut(ProgressUpdate) -> bool>;

impl ProgressUpdate {
    /// Creates a new progress update for the start of a stage.
    pub fn new_stage(description: String, total_items: Option<u64>) -> Self {
        ProgressUpdate {
            stage_description: description,
            current_item: 0,
            total_items,
            message: None,
        }
    }

    /// Creates an update for an item within a stage.
    pub fn item(
        description: &str,
        current_item: u64,
        total_items: Option<u64>,
        message: Option<String>,
    ) -> Self {
        ProgressUpdate {
            stage_description: description.to_string(),
            current_item,
            total_items,
            message,
        }
    }

    /// Whether this update marks the end of its stage.
    pub fn is_finished(&self) -> bool {
        self.total_items
            .is_some_and(|total| self.current_item >= total)
    }
}
