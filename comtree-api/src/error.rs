use crate::NodeId;

#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
pub enum Error {
    #[error("Unsupported operator {0:?}, expected one of ==, !=, <, <=, >, >=")]
    UnsupportedOperator(String),

    #[error("Operator must accept exactly two parameters, got one accepting {0}")]
    InvalidOperatorArity(usize),

    #[error("Operator {0} cannot be used for ordering")]
    InvalidSortOperator(String),

    #[error("Query fields were given without target values")]
    MissingQueryValues,

    #[error("Target values were given without query fields")]
    MissingQueryFields,

    #[error("Got {fields} query sets of fields but {values} query sets of values")]
    QuerySetCountMismatch { fields: usize, values: usize },

    #[error("Query set {set} has {fields} fields but {values} values")]
    QuerySetLengthMismatch {
        set: usize,
        fields: usize,
        values: usize,
    },

    #[error("Node not found: {0}")]
    NodeNotFound(String),

    #[error("Node id already present in tree {0}")]
    DuplicateId(NodeId),

    #[error("Node {0} is already attached to a parent")]
    AlreadyAttached(NodeId),

    #[error("Node {child} is not a child of {parent}")]
    NotAChild { parent: NodeId, child: NodeId },

    #[error("Attaching {0} would create a cycle")]
    Cycle(NodeId),

    #[error("The sentinel root cannot be removed, replaced or attached")]
    RootOperation,

    #[error("Invalid node id {0:?}")]
    InvalidId(String),

    #[error("Unknown field {0:?}")]
    UnknownField(String),

    #[error("Unknown {kind} {name:?}")]
    UnknownVariant { kind: &'static str, name: String },

    #[error("Tree integrity violated: {0}")]
    Integrity(String),
}
