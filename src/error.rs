use thiserror::Error;

/// Errors raised by queue operations.
///
/// Every failure is local to the call that raised it. Nothing is retried
/// internally and no partial state is left behind, so callers may fix their
/// arguments and try again.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QueueError {
    #[error("queue '{name}' doesn't exist")]
    NotFound { name: String },

    #[error("no store is assigned to queue '{name}'")]
    UnboundStore { name: String },

    /// A field name is not part of the bound store's schema.
    ///
    /// `item` is the position of the offending produced item, or `None` when
    /// the field came from the selection passed to `assign`.
    #[error("field '{field}' is not in the assigned store{}", item_suffix(.item))]
    UnknownField { field: String, item: Option<usize> },

    #[error("item {index}: {reason}")]
    MalformedItem { index: usize, reason: String },

    #[error("attribute '{attribute}' is read-only")]
    ReadOnly { attribute: String },

    #[error("index {index} is out of range for a trail of length {len}")]
    IndexOutOfRange { index: isize, len: usize },
}

fn item_suffix(item: &Option<usize>) -> String {
    item.map(|i| format!(" (item {i})")).unwrap_or_default()
}

pub type Result<T> = std::result::Result<T, QueueError>;
