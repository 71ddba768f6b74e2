//! Lossless JSON copy of a whole tree, every stamp and staged node included

use std::{
    fs::File,
    io::{self, BufReader, BufWriter, Write},
    path::Path,
};

use anyhow::{anyhow, Context};

use crate::Tree;

pub const VERSION: u32 = 1;

#[derive(serde::Serialize)]
struct SnapshotRef<'a> {
    version: u32,
    tree: &'a Tree,
}

#[derive(serde::Deserialize)]
struct Snapshot {
    version: u32,
    tree: Tree,
}

pub fn write<W: io::Write>(tree: &Tree, w: W) -> anyhow::Result<()> {
    serde_json::to_writer(
        w,
        &SnapshotRef {
            version: VERSION,
            tree,
        },
    )
    .context("serializing snapshot")
}

/// Reads a snapshot back, rebuilding the identity indices and checking the
/// structure
pub fn read<R: io::Read>(r: R) -> anyhow::Result<Tree> {
    let snap: Snapshot = serde_json::from_reader(r).context("parsing snapshot")?;
    if snap.version != VERSION {
        return Err(anyhow!(
            "unsupported snapshot version {}, expected {VERSION}",
            snap.version
        ));
    }
    let mut tree = snap.tree;
    tree.reindex().context("snapshot structure is inconsistent")?;
    Ok(tree)
}

pub fn save(tree: &Tree, path: impl AsRef<Path>) -> anyhow::Result<()> {
    let path = path.as_ref();
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("creating directory {}", dir.display()))?;
    }
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let mut w = BufWriter::new(file);
    write(tree, &mut w).with_context(|| format!("writing snapshot to {}", path.display()))?;
    w.flush()
        .with_context(|| format!("flushing snapshot to {}", path.display()))
}

pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Tree> {
    let path = path.as_ref();
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    read(BufReader::new(file)).with_context(|| format!("reading snapshot from {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        api::{Comment, Gender, Profile},
        Node,
    };

    fn sample() -> Tree {
        let mut t = Tree::new();
        let mut profile = Profile::default();
        profile.set_gender(Gender::Female);
        profile.set_bio(String::from("hi"));
        t.add_comment(Comment::new("a", "u1", 5, profile, None), None)
            .unwrap();
        t.add_comment(Comment::new("b", "u2", 50, Profile::default(), None), None)
            .unwrap();
        t.add_comment(Comment::new("b0", "u1", 1, Profile::default(), None), Some(&[1]))
            .unwrap();
        t.stage(Node::new(Comment::default()));
        t
    }

    #[test]
    fn round_trip_is_deep() {
        let t = sample();
        let mut buf = Vec::new();
        write(&t, &mut buf).unwrap();
        let back = read(&buf[..]).unwrap();
        assert!(t.deep_eq(&back));
        assert_eq!(back.nodes, t.nodes);
        let b0 = back.root().child(1).unwrap().child(0).unwrap();
        assert_eq!(back.key_of(b0.id()), Some(b0.key()));
    }

    #[test]
    fn rejects_unknown_versions() {
        let mut buf = Vec::new();
        write(&sample(), &mut buf).unwrap();
        let mut json: serde_json::Value = serde_json::from_slice(&buf).unwrap();
        json["version"] = serde_json::json!(VERSION + 1);
        let err = read(json.to_string().as_bytes()).unwrap_err();
        assert!(format!("{err:#}").contains("unsupported snapshot version"));
    }

    #[test]
    fn rejects_inconsistent_structure() {
        let mut buf = Vec::new();
        write(&sample(), &mut buf).unwrap();
        let mut json: serde_json::Value = serde_json::from_slice(&buf).unwrap();
        // link the first child twice
        let first = json["tree"]["nodes"][0]["children"][0].clone();
        json["tree"]["nodes"][0]["children"]
            .as_array_mut()
            .unwrap()
            .push(first);
        let err = read(json.to_string().as_bytes()).unwrap_err();
        assert!(format!("{err:#}").contains("inconsistent"));

        // staged node pointing at a parent that does not list it
        let mut json: serde_json::Value = serde_json::from_slice(&buf).unwrap();
        let staged = json["tree"]["nodes"].as_array().unwrap().len() - 1;
        json["tree"]["nodes"][staged]["parent"] = serde_json::json!(0);
        assert!(read(json.to_string().as_bytes()).is_err());
        json["tree"]["nodes"][staged]["index"] = serde_json::json!(0);
        let err = read(json.to_string().as_bytes()).unwrap_err();
        assert!(format!("{err:#}").contains("does not hold it"));
    }

    #[test]
    fn path_helpers() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a").join("b").join("tree.json");
        let t = sample();
        save(&t, &path).unwrap();
        assert!(t.deep_eq(&load(&path).unwrap()));
    }
}
