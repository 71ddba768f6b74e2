use std::{fmt, str::FromStr};

use crate::{Error, Stamp, Stamps};

/// Sentinel for integer profile metrics that were never collected
pub const UNKNOWN: i64 = -1;

#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    Eq,
    Hash,
    Ord,
    PartialEq,
    PartialOrd,
    serde::Deserialize,
    serde::Serialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
    #[default]
    Unknown,
}

/// Verification tier of the account. Blue, red and yellow are the three
/// verified tiers.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    Eq,
    Hash,
    Ord,
    PartialEq,
    PartialOrd,
    serde::Deserialize,
    serde::Serialize,
)]
#[serde(rename_all = "lowercase")]
pub enum AccountType {
    Blue,
    Red,
    Yellow,
    Personal,
    #[default]
    Unknown,
}

macro_rules! named_enum {
    ($ty:ident, $kind:expr, { $($variant:ident => $name:literal),* $(,)? }) => {
        impl $ty {
            pub fn name(&self) -> &'static str {
                match self {
                    $($ty::$variant => $name,)*
                }
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.name())
            }
        }

        impl FromStr for $ty {
            type Err = Error;

            fn from_str(s: &str) -> Result<$ty, Error> {
                match s {
                    $($name => Ok($ty::$variant),)*
                    _ => Err(Error::UnknownVariant {
                        kind: $kind,
                        name: s.to_string(),
                    }),
                }
            }
        }
    };
}

named_enum!(Gender, "gender", {
    Male => "male",
    Female => "female",
    Unknown => "unknown",
});

named_enum!(AccountType, "account type", {
    Blue => "blue",
    Red => "red",
    Yellow => "yellow",
    Personal => "personal",
    Unknown => "unknown",
});

#[derive(
    Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, serde::Deserialize, serde::Serialize,
)]
pub enum ProfileField {
    Name,
    Link,
    ExternalId,
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

impl ProfileField {
    pub const ALL: [ProfileField; 12] = [
        ProfileField::Name,
        ProfileField::Link,
        ProfileField::ExternalId,
        ProfileField::Region,
        ProfileField::Followers,
        ProfileField::Following,
        ProfileField::LikesReceived,
        ProfileField::VideoCount,
        ProfileField::Gender,
        ProfileField::Age,
        ProfileField::Bio,
        ProfileField::AccountType,
    ];
}

/// Identity and metrics of a commenter
#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct Profile {
    name: String,
    link: String,
    external_id: String,
    region: String,
    followers: i64,
    following: i64,
    likes_received: i64,
    video_count: i64,
    gender: Gender,
    age: i64,
    bio: String,
    account_type: AccountType,

    stamps: Stamps<ProfileField>,
}

impl Default for Profile {
    fn default() -> Profile {
        Profile {
            name: String::new(),
            link: String::new(),
            external_id: String::new(),
            region: String::new(),
            followers: UNKNOWN,
            following: UNKNOWN,
            likes_received: UNKNOWN,
            video_count: UNKNOWN,
            gender: Gender::Unknown,
            age: UNKNOWN,
            bio: String::new(),
            account_type: AccountType::Unknown,
            stamps: Stamps::empty(&ProfileField::ALL),
        }
    }
}

macro_rules! stamped {
    ($($field:ident / $setter:ident: $ty:ty => $stamp:ident),* $(,)?) => {
        $(
            pub fn $setter(&mut self, value: $ty) {
                self.$field = value;
                self.stamps.touch(ProfileField::$stamp);
            }
        )*
    };
}

impl Profile {
    stamped! {
        name / set_name: String => Name,
        link / set_link: String => Link,
        external_id / set_external_id: String => ExternalId,
        region / set_region: String => Region,
        followers / set_followers: i64 => Followers,
        following / set_following: i64 => Following,
        likes_received / set_likes_received: i64 => LikesReceived,
        video_count / set_video_count: i64 => VideoCount,
        gender / set_gender: Gender => Gender,
        age / set_age: i64 => Age,
        bio / set_bio: String => Bio,
        account_type / set_account_type: AccountType => AccountType,
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn link(&self) -> &str {
        &self.link
    }

    pub fn external_id(&self) -> &str {
        &self.external_id
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    pub fn followers(&self) -> i64 {
        self.followers
    }

    pub fn following(&self) -> i64 {
        self.following
    }

    pub fn likes_received(&self) -> i64 {
        self.likes_received
    }

    pub fn video_count(&self) -> i64 {
        self.video_count
    }

    pub fn gender(&self) -> Gender {
        self.gender
    }

    pub fn age(&self) -> i64 {
        self.age
    }

    pub fn bio(&self) -> &str {
        &self.bio
    }

    pub fn account_type(&self) -> AccountType {
        self.account_type
    }

    pub fn stamps(&self) -> &Stamps<ProfileField> {
        &self.stamps
    }

    pub fn stamp(&self, field: ProfileField) -> Option<Stamp> {
        self.stamps.get(field)
    }

    /// Overrides every stamp, `None` clearing them
    pub fn restamp(&mut self, at: Option<Stamp>) {
        self.stamps.set_all(at);
    }

    /// Writes every field, then stamps them all with `at` (or now)
    #[allow(clippy::too_many_arguments)]
    pub fn set_all(
        &mut self,
        name: String,
        link: String,
        external_id: String,
        region: String,
        followers: i64,
        following: i64,
        likes_received: i64,
        video_count: i64,
        gender: Gender,
        age: i64,
        bio: String,
        account_type: AccountType,
        at: Option<Stamp>,
    ) {
        self.name = name;
        self.link = link;
        self.external_id = external_id;
        self.region = region;
        self.followers = followers;
        self.following = following;
        self.likes_received = likes_received;
        self.video_count = video_count;
        self.gender = gender;
        self.age = age;
        self.bio = bio;
        self.account_type = account_type;
        self.stamps.set_all(Some(at.unwrap_or_else(crate::now)));
    }

    /// Value equality, ignoring stamps
    pub fn shallow_eq(&self, other: &Profile) -> bool {
        self.name == other.name
            && self.link == other.link
            && self.external_id == other.external_id
            && self.region == other.region
            && self.followers == other.followers
            && self.following == other.following
            && self.likes_received == other.likes_received
            && self.video_count == other.video_count
            && self.gender == other.gender
            && self.age == other.age
            && self.bio == other.bio
            && self.account_type == other.account_type
    }
}
