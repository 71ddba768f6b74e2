use std::{cmp::Ordering, fmt, str::FromStr};

use crate::{AccountType, Error, Gender};

/// Flattened selector over a comment and its profile
#[derive(
    Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, serde::Deserialize, serde::Serialize,
)]
pub enum Field {
    Text,
    AuthorLink,
    Likes,
    ProfileName,
    ProfileLink,
    ProfileId,
    Region,
    Followers,
    Following,
    LikesReceived,
    VideoCount,
    Gender,
    Age,
    Bio,
    AccountType,
}

impl Field {
    pub const ALL: [Field; 15] = [
        Field::Text,
        Field::AuthorLink,
        Field::Likes,
        Field::ProfileName,
        Field::ProfileLink,
        Field::ProfileId,
        Field::Region,
        Field::Followers,
        Field::Following,
        Field::LikesReceived,
        Field::VideoCount,
        Field::Gender,
        Field::Age,
        Field::Bio,
        Field::AccountType,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Field::Text => "text",
            Field::AuthorLink => "author_link",
            Field::Likes => "likes",
            Field::ProfileName => "profile_name",
            Field::ProfileLink => "profile_link",
            Field::ProfileId => "profile_id",
            Field::Region => "region",
            Field::Followers => "followers",
            Field::Following => "following",
            Field::LikesReceived => "likes_received",
            Field::VideoCount => "video_count",
            Field::Gender => "gender",
            Field::Age => "age",
            Field::Bio => "bio",
            Field::AccountType => "account_type",
        }
    }

    /// Kind of the values this field holds
    pub fn kind(&self) -> ValueKind {
        match self {
            Field::Likes
            | Field::Followers
            | Field::Following
            | Field::LikesReceived
            | Field::VideoCount
            | Field::Age => ValueKind::Int,
            Field::Gender => ValueKind::Gender,
            Field::AccountType => ValueKind::AccountType,
            _ => ValueKind::Str,
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Field {
    type Err = Error;

    fn from_str(s: &str) -> Result<Field, Error> {
        Field::ALL
            .iter()
            .find(|f| f.name() == s)
            .copied()
            .ok_or_else(|| Error::UnknownField(s.to_string()))
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ValueKind {
    Str,
    Int,
    Gender,
    AccountType,
}

#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
#[error("Cannot cast {value:?} to {to:?}")]
pub struct CastError {
    pub value: Value,
    pub to: ValueKind,
}

#[derive(Clone, Debug, Eq, Hash, PartialEq, serde::Deserialize, serde::Serialize)]
pub enum Value {
    Str(String),
    Int(i64),
    Gender(Gender),
    AccountType(AccountType),
}

impl Value {
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Str(_) => ValueKind::Str,
            Value::Int(_) => ValueKind::Int,
            Value::Gender(_) => ValueKind::Gender,
            Value::AccountType(_) => ValueKind::AccountType,
        }
    }

    /// Coerce into `to`, the way a typed target value expects it
    pub fn cast_to(&self, to: ValueKind) -> Result<Value, CastError> {
        let fail = || CastError {
            value: self.clone(),
            to,
        };
        match (self, to) {
            (v, to) if v.kind() == to => Ok(v.clone()),
            (Value::Int(i), ValueKind::Str) => Ok(Value::Str(i.to_string())),
            (Value::Gender(g), ValueKind::Str) => Ok(Value::Str(g.to_string())),
            (Value::AccountType(a), ValueKind::Str) => Ok(Value::Str(a.to_string())),
            (Value::Str(s), ValueKind::Int) => {
                s.trim().parse().map(Value::Int).map_err(|_| fail())
            }
            (Value::Str(s), ValueKind::Gender) => {
                s.parse().map(Value::Gender).map_err(|_| fail())
            }
            (Value::Str(s), ValueKind::AccountType) => {
                s.parse().map(Value::AccountType).map_err(|_| fail())
            }
            _ => Err(fail()),
        }
    }

    /// Parses user input as a value for `field`
    pub fn parse_for(field: Field, s: &str) -> Result<Value, CastError> {
        Value::Str(s.to_string()).cast_to(field.kind())
    }
}

/// Values of one kind are totally ordered, values of different kinds are not
/// comparable at all.
impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Str(a), Value::Str(b)) => Some(a.cmp(b)),
            (Value::Int(a), Value::Int(b)) => Some(a.cmp(b)),
            (Value::Gender(a), Value::Gender(b)) => Some(a.cmp(b)),
            (Value::AccountType(a), Value::AccountType(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Str(s) => f.write_str(s),
            Value::Int(i) => write!(f, "{i}"),
            Value::Gender(g) => write!(f, "{g}"),
            Value::AccountType(a) => write!(f, "{a}"),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Value {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Value {
        Value::Str(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Value {
        Value::Int(i)
    }
}

impl From<Gender> for Value {
    fn from(g: Gender) -> Value {
        Value::Gender(g)
    }
}

impl From<AccountType> for Value {
    fn from(a: AccountType) -> Value {
        Value::AccountType(a)
    }
}
