use crate::{Field, Profile, Stamp, Stamps, Value};

#[derive(
    Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, serde::Deserialize, serde::Serialize,
)]
pub enum CommentField {
    Text,
    AuthorLink,
    Likes,
    /// The profile as a whole, not its individual fields
    Profile,
}

impl CommentField {
    pub const ALL: [CommentField; 4] = [
        CommentField::Text,
        CommentField::AuthorLink,
        CommentField::Likes,
        CommentField::Profile,
    ];
}

/// A collected comment together with its author's profile
#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct Comment {
    text: String,
    author_link: String,
    likes: u64,
    profile: Profile,

    stamps: Stamps<CommentField>,
}

impl Default for Comment {
    fn default() -> Comment {
        Comment {
            text: String::new(),
            author_link: String::new(),
            likes: 0,
            profile: Profile::default(),
            stamps: Stamps::empty(&CommentField::ALL),
        }
    }
}

impl Comment {
    /// Builds a fully-written comment, stamping every field with `at` (or now)
    pub fn new(
        text: impl Into<String>,
        author_link: impl Into<String>,
        likes: u64,
        profile: Profile,
        at: Option<Stamp>,
    ) -> Comment {
        let mut c = Comment::default();
        c.set_all(text.into(), author_link.into(), likes, profile, at);
        c
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn author_link(&self) -> &str {
        &self.author_link
    }

    pub fn likes(&self) -> u64 {
        self.likes
    }

    pub fn profile(&self) -> &Profile {
        &self.profile
    }

    /// Edits the nested profile in place. This does not restamp the comment's
    /// own `Profile` entry, the profile tracks its own fields.
    pub fn profile_mut(&mut self) -> &mut Profile {
        &mut self.profile
    }

    pub fn stamps(&self) -> &Stamps<CommentField> {
        &self.stamps
    }

    pub fn stamp(&self, field: CommentField) -> Option<Stamp> {
        self.stamps.get(field)
    }

    pub fn set_text(&mut self, text: String) {
        self.text = text;
        self.stamps.touch(CommentField::Text);
    }

    pub fn set_author_link(&mut self, link: String) {
        self.author_link = link;
        self.stamps.touch(CommentField::AuthorLink);
    }

    pub fn set_likes(&mut self, likes: u64) {
        self.likes = likes;
        self.stamps.touch(CommentField::Likes);
    }

    pub fn set_profile(&mut self, profile: Profile) {
        self.profile = profile;
        self.stamps.touch(CommentField::Profile);
    }

    pub fn set_all(
        &mut self,
        text: String,
        author_link: String,
        likes: u64,
        profile: Profile,
        at: Option<Stamp>,
    ) {
        self.text = text;
        self.author_link = author_link;
        self.likes = likes;
        self.profile = profile;
        self.stamps.set_all(Some(at.unwrap_or_else(crate::now)));
    }

    /// Overrides every stamp of the comment and of its profile
    pub fn restamp(&mut self, at: Option<Stamp>) {
        self.stamps.set_all(at);
        self.profile.restamp(at);
    }

    /// Most recent write across the comment and its profile
    pub fn latest_stamp(&self) -> Option<Stamp> {
        self.stamps.latest().max(self.profile.stamps().latest())
    }

    /// Flattened view of one field, as used by search and ordering
    pub fn value(&self, field: Field) -> Value {
        let p = &self.profile;
        match field {
            Field::Text => Value::Str(self.text.clone()),
            Field::AuthorLink => Value::Str(self.author_link.clone()),
            Field::Likes => Value::Int(i64::try_from(self.likes).unwrap_or(i64::MAX)),
            Field::ProfileName => Value::Str(p.name().to_string()),
            Field::ProfileLink => Value::Str(p.link().to_string()),
            Field::ProfileId => Value::Str(p.external_id().to_string()),
            Field::Region => Value::Str(p.region().to_string()),
            Field::Followers => Value::Int(p.followers()),
            Field::Following => Value::Int(p.following()),
            Field::LikesReceived => Value::Int(p.likes_received()),
            Field::VideoCount => Value::Int(p.video_count()),
            Field::Gender => Value::Gender(p.gender()),
            Field::Age => Value::Int(p.age()),
            Field::Bio => Value::Str(p.bio().to_string()),
            Field::AccountType => Value::AccountType(p.account_type()),
        }
    }

    /// Value equality including the nested profile, ignoring stamps
    pub fn shallow_eq(&self, other: &Comment) -> bool {
        self.text == other.text
            && self.author_link == other.author_link
            && self.likes == other.likes
            && self.profile.shallow_eq(&other.profile)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Gender;

    #[test]
    fn flattened_values() {
        let mut profile = Profile::default();
        profile.set_gender(Gender::Male);
        profile.set_followers(7);
        let c = Comment::new("hi", "https://example.org/u/1", 5, profile, None);
        assert_eq!(c.value(Field::Text), Value::Str(String::from("hi")));
        assert_eq!(c.value(Field::Likes), Value::Int(5));
        assert_eq!(c.value(Field::Followers), Value::Int(7));
        assert_eq!(c.value(Field::Gender), Value::Gender(Gender::Male));
        assert_eq!(c.value(Field::Age), Value::Int(crate::UNKNOWN));
    }

    #[test]
    fn deep_vs_shallow() {
        let at = crate::now();
        let a = Comment::new("a", "l", 1, Profile::default(), Some(at));
        let mut b = a.clone();
        assert_eq!(a, b);
        b.restamp(None);
        assert!(a.shallow_eq(&b));
        assert_ne!(a, b);
        b.set_likes(2);
        assert!(!a.shallow_eq(&b));
    }

    #[test]
    fn latest_stamp_covers_profile() {
        let at = crate::now();
        let mut c = Comment::new("a", "l", 1, Profile::default(), Some(at));
        let later = at + chrono::Duration::seconds(30);
        c.profile_mut().restamp(Some(later));
        assert_eq!(c.latest_stamp(), Some(later));
    }

    #[test]
    fn json_keeps_every_stamp() {
        let at = chrono::NaiveDate::from_ymd_opt(2024, 1, 2)
            .and_then(|d| d.and_hms_opt(3, 4, 5))
            .unwrap();
        let mut profile = Profile::default();
        profile.set_bio(String::from("bio"));
        let mut c = Comment::new("a", "l", 1, profile, Some(at));
        c.set_likes(2);
        c.profile_mut().restamp(None);
        assert_ne!(c.stamp(CommentField::Likes), c.stamp(CommentField::Text));

        let json = serde_json::to_string(&c).unwrap();
        let back: Comment = serde_json::from_str(&json).unwrap();
        assert_eq!(back, c);
        assert_eq!(back.stamp(CommentField::Text), Some(at));
        assert_eq!(back.profile().stamps().latest(), None);
    }
}
