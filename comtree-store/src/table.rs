//! Flat CSV form of a tree: one row per node, parents before children.
//!
//! Only the most recent stamp of every record survives the trip. Use
//! [`crate::snapshot`] for a lossless copy.

use std::{
    collections::HashMap,
    fs::File,
    io,
    path::Path,
};

use anyhow::{anyhow, Context};
use chrono::{NaiveDate, NaiveTime};

use crate::{
    api::{AccountType, Comment, Gender, NodeId, Profile, UNKNOWN},
    Node, NodeKey, NodeRef, Tree,
};

#[derive(Debug, Default, serde::Deserialize, serde::Serialize)]
struct Row {
    id: String,
    parent_id: Option<String>,
    index: Option<usize>,
    text: Option<String>,
    author_link: Option<String>,
    likes: Option<u64>,
    profile_name: Option<String>,
    profile_link: Option<String>,
    profile_id: Option<String>,
    region: Option<String>,
    followers: Option<i64>,
    following: Option<i64>,
    likes_received: Option<i64>,
    video_count: Option<i64>,
    gender: Option<Gender>,
    age: Option<i64>,
    bio: Option<String>,
    account_type: Option<AccountType>,
    collected_date: Option<NaiveDate>,
    collected_time: Option<NaiveTime>,
}

impl Row {
    fn root(id: NodeId) -> Row {
        Row {
            id: id.hex(),
            ..Row::default()
        }
    }

    fn from_node(n: &NodeRef<'_>) -> Row {
        let c = n.comment();
        let p = c.profile();
        let latest = c.latest_stamp();
        Row {
            id: n.id().hex(),
            parent_id: n.parent().map(|p| p.id().hex()),
            index: n.index(),
            text: Some(c.text().to_string()),
            author_link: Some(c.author_link().to_string()),
            likes: Some(c.likes()),
            profile_name: Some(p.name().to_string()),
            profile_link: Some(p.link().to_string()),
            profile_id: Some(p.external_id().to_string()),
            region: Some(p.region().to_string()),
            followers: Some(p.followers()),
            following: Some(p.following()),
            likes_received: Some(p.likes_received()),
            video_count: Some(p.video_count()),
            gender: Some(p.gender()),
            age: Some(p.age()),
            bio: Some(p.bio().to_string()),
            account_type: Some(p.account_type()),
            collected_date: latest.map(|s| s.date()),
            collected_time: latest.map(|s| s.time()),
        }
    }

    /// Returns the node, its parent's id and its stored index
    fn into_node(self) -> anyhow::Result<(Node, NodeId, usize)> {
        let id = NodeId::parse_hex(&self.id)?;
        let parent = self
            .parent_id
            .as_deref()
            .ok_or_else(|| anyhow!("node {id} has no parent id"))?;
        let parent = NodeId::parse_hex(parent)?;
        let index = self
            .index
            .ok_or_else(|| anyhow!("node {id} has no index"))?;
        let at = match (self.collected_date, self.collected_time) {
            (Some(d), Some(t)) => Some(d.and_time(t)),
            (Some(d), None) => d.and_hms_opt(0, 0, 0),
            (None, _) => None,
        };

        let mut profile = Profile::default();
        profile.set_all(
            self.profile_name.unwrap_or_default(),
            self.profile_link.unwrap_or_default(),
            self.profile_id.unwrap_or_default(),
            self.region.unwrap_or_default(),
            self.followers.unwrap_or(UNKNOWN),
            self.following.unwrap_or(UNKNOWN),
            self.likes_received.unwrap_or(UNKNOWN),
            self.video_count.unwrap_or(UNKNOWN),
            self.gender.unwrap_or_default(),
            self.age.unwrap_or(UNKNOWN),
            self.bio.unwrap_or_default(),
            self.account_type.unwrap_or_default(),
            at,
        );
        let mut comment = Comment::new(
            self.text.unwrap_or_default(),
            self.author_link.unwrap_or_default(),
            self.likes.unwrap_or(0),
            profile,
            at,
        );
        comment.restamp(at);
        Ok((Node::with_id(id, comment), parent, index))
    }
}

/// Writes the root row, then every node in depth-first order
pub fn write<W: io::Write>(tree: &Tree, w: W) -> anyhow::Result<()> {
    let mut writer = csv::Writer::from_writer(w);
    writer
        .serialize(Row::root(tree.root().id()))
        .context("writing root row")?;
    for n in tree.root().dfs().skip(1) {
        writer
            .serialize(Row::from_node(&n))
            .with_context(|| format!("writing row for node {}", n.id()))?;
    }
    writer.flush().context("flushing table")?;
    Ok(())
}

/// Rebuilds a tree. The root row must come first and every parent must come
/// before its children.
pub fn read<R: io::Read>(r: R) -> anyhow::Result<Tree> {
    let mut reader = csv::Reader::from_reader(r);
    let mut rows = reader.deserialize::<Row>();
    let root = rows
        .next()
        .ok_or_else(|| anyhow!("table has no root row"))?
        .context("parsing root row")?;
    if root.parent_id.is_some() {
        return Err(anyhow!("first row must be the root, but {} has a parent", root.id));
    }
    let mut tree = Tree::with_root_id(NodeId::parse_hex(&root.id).context("parsing root id")?);

    let mut stored = HashMap::<NodeKey, usize>::new();
    for (i, row) in rows.enumerate() {
        // header and root come first, lines count from 1
        let line = i + 3;
        let (node, parent_id, index) = row
            .map_err(anyhow::Error::from)
            .and_then(Row::into_node)
            .with_context(|| format!("parsing line {line}"))?;
        let parent = tree.key_of(parent_id).ok_or_else(|| {
            anyhow!("line {line}: parent {parent_id} does not appear before its child")
        })?;
        let key = tree
            .add_node_under(parent, node)
            .with_context(|| format!("attaching line {line}"))?;
        stored.insert(key, index);
    }

    let parents = tree.root().dfs().map(|n| n.key()).collect::<Vec<_>>();
    for p in parents {
        if let Some(n) = tree.nodes.get_mut(p.0).and_then(Option::as_mut) {
            n.children
                .sort_by_key(|c| stored.get(c).copied().unwrap_or(usize::MAX));
        }
        tree.revalidate(p)?;
    }
    tree.check_integrity()?;
    Ok(tree)
}

pub fn save(tree: &Tree, path: impl AsRef<Path>) -> anyhow::Result<()> {
    let path = path.as_ref();
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("creating directory {}", dir.display()))?;
    }
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    write(tree, file).with_context(|| format!("writing table to {}", path.display()))
}

pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Tree> {
    let path = path.as_ref();
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    read(file).with_context(|| format!("reading table from {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{CommentField, ProfileField};

    fn sample() -> Tree {
        let at = chrono::NaiveDate::from_ymd_opt(2024, 3, 9)
            .and_then(|d| d.and_hms_milli_opt(14, 30, 5, 250))
            .unwrap();
        let mut t = Tree::new();
        let mut profile = Profile::default();
        profile.set_all(
            String::from("Bob, \"the\" builder"),
            String::from("https://example.org/u/bob"),
            String::from("bob42"),
            String::from("Sichuan"),
            10,
            20,
            30,
            4,
            Gender::Male,
            UNKNOWN,
            String::from("likes long walks"),
            AccountType::Yellow,
            Some(at),
        );
        let a = Comment::new("first, with comma", "https://example.org/u/bob", 5, profile, Some(at));
        t.add_comment(a, None).unwrap();
        t.add_comment(Comment::new("second", "", 50, Profile::default(), None), None)
            .unwrap();
        t.add_comment(Comment::new("reply", "x", 1, Profile::default(), Some(at)), Some(&[1]))
            .unwrap();
        t
    }

    fn round_trip(t: &Tree) -> Tree {
        let mut buf = Vec::new();
        write(t, &mut buf).unwrap();
        read(&buf[..]).unwrap()
    }

    #[test]
    fn header_and_root_row() {
        let mut buf = Vec::new();
        write(&Tree::with_root_id(NodeId::stub()), &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next(),
            Some("id,parent_id,index,text,author_link,likes,profile_name,profile_link,profile_id,region,followers,following,likes_received,video_count,gender,age,bio,account_type,collected_date,collected_time")
        );
        assert_eq!(
            lines.next(),
            Some("ffffffffffffffffffffffffffffffff,,,,,,,,,,,,,,,,,,,")
        );
        assert_eq!(lines.next(), None);
    }

    #[test]
    fn round_trip_keeps_values_and_latest_stamp() {
        let t = sample();
        let back = round_trip(&t);
        back.check_integrity().unwrap();
        assert!(t.shallow_eq(&back));
        assert_eq!(back.root().id(), t.root().id());

        let orig = t.root().child(0).unwrap();
        let read = back.root().child(0).unwrap();
        assert_eq!(read.id(), orig.id());
        assert_eq!(read.comment().profile().link(), "https://example.org/u/bob");
        let latest = orig.comment().latest_stamp();
        assert_eq!(read.comment().stamp(CommentField::Text), latest);
        assert_eq!(read.comment().profile().stamp(ProfileField::Bio), latest);

        // stamped when it was created
        let unstamped = back.root().child(1).unwrap();
        assert!(unstamped.comment().latest_stamp().is_some());
    }

    #[test]
    fn unstamped_rows_stay_unstamped() {
        let mut t = Tree::new();
        let mut c = Comment::new("multi\nline, \"quoted\"", "", 0, Profile::default(), None);
        c.restamp(None);
        t.add_comment(c, None).unwrap();
        let back = round_trip(&t);
        assert_eq!(back.root().child(0).unwrap().comment().latest_stamp(), None);
        assert!(t.shallow_eq(&back));
    }

    #[test]
    fn stored_index_orders_siblings() {
        let t = sample();
        let mut buf = Vec::new();
        write(&t, &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let mut lines = text.lines().collect::<Vec<_>>();
        // children of the root listed in reverse
        lines.swap(2, 3);
        let second = lines.remove(3);
        lines.push(second);
        let back = read(lines.join("\n").as_bytes()).unwrap();
        assert!(t.shallow_eq(&back));
    }

    #[test]
    fn rejects_orphans() {
        let t = sample();
        let mut buf = Vec::new();
        write(&t, &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let mut lines = text.lines().collect::<Vec<_>>();
        let reply = lines.remove(4);
        lines.insert(2, reply);
        let err = read(lines.join("\n").as_bytes()).unwrap_err();
        assert!(format!("{err:#}").contains("does not appear before its child"));

        assert!(read(&b""[..]).is_err());
    }

    #[test]
    fn path_helpers() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("tree.csv");
        let t = sample();
        save(&t, &path).unwrap();
        let back = load(&path).unwrap();
        assert!(t.shallow_eq(&back));
        assert!(load(dir.path().join("missing.csv")).is_err());
    }
}
