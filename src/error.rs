use thiserror::Error;

/// Conditions the pipeline distinguishes from ordinary I/O or markup failures.
///
/// `EmptySchema`, `MixedKindSchema` are fatal for one category and travel inside
/// `anyhow::Error`; callers that need to branch on them can `downcast_ref`.
/// `MalformedCell` and `UnreadableCountryName` are recovered locally and only
/// reach the log.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ExtractError {
    #[error("No field in category '{category}' is present in more than {threshold} countries")]
    EmptySchema { category: String, threshold: usize },

    #[error(
        "Category '{}' mixes numeric fields [{}] and text fields [{}]; register a special parser for it",
        .category,
        .numeric.join(", "),
        .text.join(", ")
    )]
    MixedKindSchema {
        category: String,
        numeric: Vec<String>,
        text: Vec<String>,
    },

    #[error("Skipping malformed cell in row '{row}': {reason}")]
    MalformedCell { row: String, reason: String },

    #[error("Unknown country name '{name}' in alternate source for '{category}'")]
    UnreadableCountryName { category: String, name: String },
}
