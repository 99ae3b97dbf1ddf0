//! Errors raised by the monthly aligner.

/// Configuration errors in the requested output schema.
///
/// Data-quality problems (bad dates, missing values, empty inputs) are never
/// errors; they only shrink the output.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AlignError {
    /// Returned when a requested column is not produced by aggregation,
    /// i.e. the quantity is not declared by the water-quality table.
    #[error("column `{column}` is not produced by aggregation")]
    MissingColumn {
        /// Name of the requested column.
        column: String,
    },

    /// Returned when the same column is requested twice.
    #[error("column `{column}` requested more than once")]
    DuplicateColumn {
        /// Name of the repeated column.
        column: String,
    },

    /// Returned when the selection names no column at all.
    #[error("no output column selected")]
    EmptySelection,

    /// Returned when a column name matches nothing in the vocabulary.
    #[error("unknown column `{name}`")]
    UnknownColumn {
        /// The name as given by the caller.
        name: String,
    },
}
