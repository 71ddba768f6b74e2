pub use uuid::{uuid, Uuid};

mod comment;
pub use comment::{Comment, CommentField};

mod error;
pub use error::Error;

pub mod operand;
pub use operand::{CmpOp, Comparator, OrderFn, Operator, Predicate, Relation};

mod profile;
pub use profile::{AccountType, Gender, Profile, ProfileField, UNKNOWN};

mod stamps;
pub use stamps::{now, Stamp, Stamps};

mod value;
pub use value::{CastError, Field, Value, ValueKind};

mod warning;
pub use warning::Warning;

pub const STUB_UUID: Uuid = uuid!("ffffffff-ffff-ffff-ffff-ffffffffffff");

#[derive(
    Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, serde::Deserialize, serde::Serialize,
)]
pub struct NodeId(pub Uuid);

impl NodeId {
    pub fn new() -> NodeId {
        NodeId(Uuid::new_v4())
    }

    pub fn stub() -> NodeId {
        NodeId(STUB_UUID)
    }

    /// 32 lowercase hex digits, no dashes
    pub fn hex(&self) -> String {
        self.0.simple().to_string()
    }

    pub fn parse_hex(s: &str) -> Result<NodeId, Error> {
        Uuid::try_parse(s.trim())
            .map(NodeId)
            .map_err(|_| Error::InvalidId(s.to_string()))
    }
}

impl Default for NodeId {
    fn default() -> NodeId {
        NodeId::new()
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.simple())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_form_round_trips() {
        let id = NodeId::new();
        let hex = id.hex();
        assert_eq!(hex.len(), 32);
        assert!(!hex.contains('-'));
        assert_eq!(NodeId::parse_hex(&hex), Ok(id));
        assert_eq!(NodeId::parse_hex(&id.0.to_string()), Ok(id));
    }

    #[test]
    fn rejects_garbage_ids() {
        assert_eq!(
            NodeId::parse_hex("not-an-id"),
            Err(Error::InvalidId(String::from("not-an-id")))
        );
    }
}
