use crate::{NodeId, Value, ValueKind};

/// Recoverable conditions hit while serving a request. Processing continued
/// with the documented fallback.
#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
pub enum Warning {
    #[error("Requested {requested} nodes but only {available} are available, returning all matches")]
    CapClamped { requested: usize, available: usize },

    #[error("No search criteria given, returning the first {cap} nodes")]
    NoCriteria { cap: usize },

    #[error("No index paths given, returning zero matches")]
    NoPaths,

    #[error("Duplicate match of node {node} for query set {set}, skipping")]
    DuplicateMatch { set: usize, node: NodeId },

    #[error("Index {index} at depth {depth} is out of range, keeping last valid node")]
    IndexOutOfRange { index: usize, depth: usize },

    #[error("Could not cast {value:?} to {to:?}, comparing uncast values")]
    CastFailed { value: Value, to: ValueKind },
}

impl Warning {
    /// Logs the warning and appends it to `sink`
    pub fn emit(self, sink: &mut Vec<Warning>) {
        tracing::warn!(warning = ?self, "{self}");
        sink.push(self);
    }
}
