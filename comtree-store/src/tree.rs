use std::collections::{HashMap, HashSet};

use crate::{
    api::{Comment, Error, NodeId, Warning},
    Node, NodeKey, NodeRef,
};

/// The ways a caller can point at a node
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Locator {
    /// Position in the depth-first flattening, the root being 0
    Offset(usize),
    Hex(String),
    Id(NodeId),
    /// Sibling indices from the root
    Path(Vec<usize>),
}

impl From<NodeId> for Locator {
    fn from(id: NodeId) -> Locator {
        Locator::Id(id)
    }
}

/// An ordered comment tree below a sentinel root.
///
/// Nodes live in an arena and link to each other by [`NodeKey`]. A node can be
/// staged in the arena without being reachable from the root; only reachable
/// nodes are present in the identity indices.
#[derive(Clone, Debug, serde::Deserialize, serde::Serialize)]
pub struct Tree {
    pub(crate) nodes: Vec<Option<Node>>,
    pub(crate) root: NodeKey,

    #[serde(skip)]
    by_id: HashMap<NodeId, NodeKey>,
    #[serde(skip)]
    by_hex: HashMap<String, NodeKey>,
}

impl Default for Tree {
    fn default() -> Tree {
        Tree::new()
    }
}

impl Tree {
    pub fn new() -> Tree {
        Tree::with_root_id(NodeId::new())
    }

    pub fn with_root_id(id: NodeId) -> Tree {
        let mut root = Node::with_id(id, Comment::default());
        root.index = Some(0);
        let mut tree = Tree {
            nodes: vec![Some(root)],
            root: NodeKey(0),
            by_id: HashMap::new(),
            by_hex: HashMap::new(),
        };
        tree.register(NodeKey(0));
        tree
    }

    pub fn root_key(&self) -> NodeKey {
        self.root
    }

    pub fn root(&self) -> NodeRef<'_> {
        self.node_ref(self.root)
            .expect("the sentinel root is never purged")
    }

    pub fn node(&self, key: NodeKey) -> Option<&Node> {
        self.nodes.get(key.0).and_then(Option::as_ref)
    }

    pub fn node_ref(&self, key: NodeKey) -> Option<NodeRef<'_>> {
        self.node(key).map(|node| NodeRef {
            tree: self,
            key,
            node,
        })
    }

    fn get_node(&self, key: NodeKey) -> Result<&Node, Error> {
        self.node(key)
            .ok_or_else(|| Error::NodeNotFound(key.to_string()))
    }

    fn get_node_mut(&mut self, key: NodeKey) -> Result<&mut Node, Error> {
        self.nodes
            .get_mut(key.0)
            .and_then(Option::as_mut)
            .ok_or_else(|| Error::NodeNotFound(key.to_string()))
    }

    /// Number of comments, the sentinel root excluded
    pub fn len(&self) -> usize {
        self.root().size() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.root().is_leaf()
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.by_id.contains_key(&id)
    }

    pub fn key_of(&self, id: NodeId) -> Option<NodeKey> {
        self.by_id.get(&id).copied()
    }

    pub fn is_reachable(&self, key: NodeKey) -> bool {
        let mut cur = Some(key);
        for _ in 0..=self.nodes.len() {
            match cur {
                Some(k) if k == self.root => return true,
                Some(k) => cur = self.node(k).and_then(|n| n.parent),
                None => return false,
            }
        }
        false
    }

    fn subtree(&self, key: NodeKey) -> Vec<NodeKey> {
        self.node_ref(key)
            .map(|n| n.dfs().map(|n| n.key()).collect())
            .unwrap_or_default()
    }

    fn register(&mut self, key: NodeKey) {
        for k in self.subtree(key) {
            if let Some(id) = self.node(k).map(|n| n.id) {
                self.by_id.insert(id, k);
                self.by_hex.insert(id.hex(), k);
            }
        }
    }

    fn unregister(&mut self, key: NodeKey) {
        for k in self.subtree(key) {
            if let Some(id) = self.node(k).map(|n| n.id) {
                self.by_id.remove(&id);
                self.by_hex.remove(&id.hex());
            }
        }
    }

    /// Rebuilds both identity indices from the reachable nodes, then checks
    /// the whole structure
    pub(crate) fn reindex(&mut self) -> Result<(), Error> {
        self.by_id.clear();
        self.by_hex.clear();
        let mut seen = HashSet::new();
        let mut stack = vec![self.root];
        while let Some(k) = stack.pop() {
            if !seen.insert(k) {
                return Err(Error::Integrity(format!("node {k} is reachable twice")));
            }
            let n = self
                .nodes
                .get(k.0)
                .and_then(Option::as_ref)
                .ok_or_else(|| Error::Integrity(format!("node {k} is linked but missing")))?;
            if self.by_id.insert(n.id, k).is_some() {
                return Err(Error::DuplicateId(n.id));
            }
            self.by_hex.insert(n.id.hex(), k);
            stack.extend(n.children.iter().copied());
        }
        self.check_links()?;
        self.check_integrity()
    }

    /// Checks the links of every arena slot, staged nodes included
    fn check_links(&self) -> Result<(), Error> {
        for (i, n) in self.nodes.iter().enumerate() {
            let Some(n) = n else { continue };
            let k = NodeKey(i);
            if k == self.root {
                continue;
            }
            match (n.parent, n.index) {
                (None, None) => (),
                (Some(p), Some(index)) => {
                    let listed = self.node(p).and_then(|p| p.children.get(index));
                    if listed != Some(&k) {
                        return Err(Error::Integrity(format!(
                            "node {} claims slot {index} of {p}, which does not hold it",
                            n.id
                        )));
                    }
                }
                (parent, index) => {
                    return Err(Error::Integrity(format!(
                        "node {} has parent {parent:?} but index {index:?}",
                        n.id
                    )))
                }
            }
            for c in &n.children {
                if self.node(*c).and_then(|c| c.parent) != Some(k) {
                    return Err(Error::Integrity(format!(
                        "node {c} does not point back to its parent {}",
                        n.id
                    )));
                }
            }
        }
        Ok(())
    }

    pub(crate) fn revalidate(&mut self, parent: NodeKey) -> Result<(), Error> {
        let children = self.get_node(parent)?.children.clone();
        for (i, c) in children.into_iter().enumerate() {
            self.get_node_mut(c)?.index = Some(i);
        }
        Ok(())
    }

    /// Verifies that the identity indices match the reachable nodes exactly,
    /// that every child points back to its parent and that cached indices are
    /// up to date
    pub fn check_integrity(&self) -> Result<(), Error> {
        let root = self
            .node(self.root)
            .ok_or_else(|| Error::Integrity(String::from("the root is missing")))?;
        if root.parent.is_some() || root.index != Some(0) {
            return Err(Error::Integrity(String::from(
                "the root must have no parent and index 0",
            )));
        }
        let mut seen = HashSet::new();
        let mut stack = vec![self.root];
        while let Some(k) = stack.pop() {
            if !seen.insert(k) {
                return Err(Error::Integrity(format!("node {k} is reachable twice")));
            }
            let n = self
                .node(k)
                .ok_or_else(|| Error::Integrity(format!("node {k} is linked but missing")))?;
            if self.by_id.get(&n.id) != Some(&k) || self.by_hex.get(&n.id.hex()) != Some(&k) {
                return Err(Error::Integrity(format!("node {} is not indexed", n.id)));
            }
            for (i, c) in n.children.iter().enumerate() {
                let cn = self
                    .node(*c)
                    .ok_or_else(|| Error::Integrity(format!("node {c} is linked but missing")))?;
                if cn.parent != Some(k) {
                    return Err(Error::Integrity(format!(
                        "node {} does not point back to its parent {}",
                        cn.id, n.id
                    )));
                }
                if cn.index != Some(i) {
                    return Err(Error::Integrity(format!(
                        "node {} caches index {:?} but sits at {i}",
                        cn.id, cn.index
                    )));
                }
                stack.push(*c);
            }
        }
        if self.by_id.len() != seen.len() || self.by_hex.len() != seen.len() {
            return Err(Error::Integrity(format!(
                "{} nodes are reachable but {} are indexed by id and {} by hex",
                seen.len(),
                self.by_id.len(),
                self.by_hex.len()
            )));
        }
        Ok(())
    }

    pub fn shallow_eq(&self, other: &Tree) -> bool {
        self.root().shallow_eq(&other.root())
    }

    pub fn deep_eq(&self, other: &Tree) -> bool {
        self.root().deep_eq(&other.root())
    }
}

// Node-level mutation
impl Tree {
    /// Moves `node` into the arena, detached. Any links it carried are dropped.
    pub fn stage(&mut self, mut node: Node) -> NodeKey {
        node.parent = None;
        node.children.clear();
        node.index = None;
        self.nodes.push(Some(node));
        NodeKey(self.nodes.len() - 1)
    }

    fn check_attach(
        &self,
        parent: NodeKey,
        child: NodeKey,
        leaving: &HashSet<NodeId>,
        claimed: &mut HashSet<NodeId>,
    ) -> Result<(), Error> {
        self.get_node(parent)?;
        let c = self.get_node(child)?;
        if child == self.root {
            return Err(Error::RootOperation);
        }
        if c.parent.is_some() {
            return Err(Error::AlreadyAttached(c.id));
        }
        if std::iter::successors(Some(parent), |k| self.node(*k).and_then(|n| n.parent))
            .take(self.nodes.len())
            .any(|k| k == child)
        {
            return Err(Error::Cycle(c.id));
        }
        let reachable = self.is_reachable(parent);
        for n in self.subtree(child).into_iter().filter_map(|k| self.node(k)) {
            let taken = reachable && self.by_id.contains_key(&n.id) && !leaving.contains(&n.id);
            if taken || !claimed.insert(n.id) {
                return Err(Error::DuplicateId(n.id));
            }
        }
        Ok(())
    }

    fn link(&mut self, parent: NodeKey, child: NodeKey) -> Result<(), Error> {
        let p = self.get_node_mut(parent)?;
        p.children.push(child);
        let index = p.children.len() - 1;
        let c = self.get_node_mut(child)?;
        c.parent = Some(parent);
        c.index = Some(index);
        Ok(())
    }

    pub fn attach_child(&mut self, parent: NodeKey, child: NodeKey) -> Result<(), Error> {
        self.attach_children(parent, &[child])
    }

    /// Appends `children` in order. Either every child is attached or, on
    /// error, none is.
    pub fn attach_children(&mut self, parent: NodeKey, children: &[NodeKey]) -> Result<(), Error> {
        let mut keys = HashSet::new();
        let mut claimed = HashSet::new();
        for &c in children {
            if !keys.insert(c) {
                return Err(Error::AlreadyAttached(self.get_node(c)?.id));
            }
            self.check_attach(parent, c, &HashSet::new(), &mut claimed)?;
        }
        let reachable = self.is_reachable(parent);
        for &c in children {
            self.link(parent, c)?;
            if reachable {
                self.register(c);
            }
            tracing::debug!(?parent, child = ?c, reachable, "attached node");
        }
        Ok(())
    }

    pub fn detach_child(&mut self, parent: NodeKey, child: NodeKey) -> Result<(), Error> {
        self.detach_children(parent, Some(&[child])).map(|_| ())
    }

    /// Detaches the given children of `parent`, or all of them with `None`,
    /// and returns their keys. Detached subtrees stay staged in the arena.
    pub fn detach_children(
        &mut self,
        parent: NodeKey,
        which: Option<&[NodeKey]>,
    ) -> Result<Vec<NodeKey>, Error> {
        let p = self.get_node(parent)?;
        let targets = match which {
            None => p.children.clone(),
            Some(keys) => {
                for k in keys {
                    let c = self.get_node(*k)?;
                    if c.parent != Some(parent) {
                        return Err(Error::NotAChild {
                            parent: p.id,
                            child: c.id,
                        });
                    }
                }
                keys.to_vec()
            }
        };
        if self.is_reachable(parent) {
            for &k in &targets {
                self.unregister(k);
            }
        }
        self.get_node_mut(parent)?
            .children
            .retain(|c| !targets.contains(c));
        for &k in &targets {
            let c = self.get_node_mut(k)?;
            c.parent = None;
            c.index = None;
            tracing::debug!(?parent, child = ?k, "detached node");
        }
        self.revalidate(parent)?;
        Ok(targets)
    }

    /// Puts `new` in the slot of `old` under `parent`. `new` may reuse ids
    /// found in the subtree of `old`.
    pub fn replace_child(
        &mut self,
        parent: NodeKey,
        old: NodeKey,
        new: NodeKey,
    ) -> Result<(), Error> {
        let p = self.get_node(parent)?;
        let o = self.get_node(old)?;
        let slot = p
            .children
            .iter()
            .position(|c| *c == old)
            .ok_or(Error::NotAChild {
                parent: p.id,
                child: o.id,
            })?;
        let leaving = self
            .subtree(old)
            .into_iter()
            .filter_map(|k| self.node(k).map(|n| n.id))
            .collect::<HashSet<_>>();
        self.check_attach(parent, new, &leaving, &mut HashSet::new())?;

        let reachable = self.is_reachable(parent);
        if reachable {
            self.unregister(old);
        }
        let o = self.get_node_mut(old)?;
        o.parent = None;
        o.index = None;
        if let Some(c) = self.get_node_mut(parent)?.children.get_mut(slot) {
            *c = new;
        }
        let n = self.get_node_mut(new)?;
        n.parent = Some(parent);
        n.index = Some(slot);
        if reachable {
            self.register(new);
        }
        tracing::debug!(?parent, ?old, ?new, slot, "replaced node");
        Ok(())
    }

    pub fn set_comment(&mut self, key: NodeKey, comment: Comment) -> Result<(), Error> {
        if key == self.root {
            return Err(Error::RootOperation);
        }
        self.get_node_mut(key)?.comment = comment;
        Ok(())
    }

    /// Drops a detached subtree from the arena, returning how many nodes it held
    pub fn purge(&mut self, key: NodeKey) -> Result<usize, Error> {
        if key == self.root {
            return Err(Error::RootOperation);
        }
        let n = self.get_node(key)?;
        if n.parent.is_some() {
            return Err(Error::AlreadyAttached(n.id));
        }
        let keys = self.subtree(key);
        for k in &keys {
            if let Some(slot) = self.nodes.get_mut(k.0) {
                *slot = None;
            }
        }
        tracing::debug!(?key, count = keys.len(), "purged subtree");
        Ok(keys.len())
    }
}

// Tree-level mutation
impl Tree {
    pub fn add_top_node(&mut self, node: Node) -> Result<NodeKey, Error> {
        self.add_node_under(self.root, node)
    }

    pub fn add_node_under(&mut self, parent: NodeKey, node: Node) -> Result<NodeKey, Error> {
        self.get_node(parent)?;
        let key = self.stage(node);
        if let Err(e) = self.attach_child(parent, key) {
            self.purge(key)?;
            return Err(e);
        }
        Ok(key)
    }

    /// Attaches under the node found by following `path` from the root. An
    /// out-of-range index attaches under the last node reached and lands in
    /// `warnings`.
    pub fn add_node_at(
        &mut self,
        path: &[usize],
        node: Node,
        warnings: &mut Vec<Warning>,
    ) -> Result<NodeKey, Error> {
        let parent = self.root().find_node_by_index(path, warnings).key();
        self.add_node_under(parent, node)
    }

    /// Wraps `comment` into a fresh node, under the root or under `path`.
    /// Path warnings are only logged, use [`Tree::add_node_at`] to collect them.
    pub fn add_comment(&mut self, comment: Comment, path: Option<&[usize]>) -> Result<NodeKey, Error> {
        match path {
            None => self.add_top_node(Node::new(comment)),
            Some(path) => self.add_node_at(path, Node::new(comment), &mut Vec::new()),
        }
    }

    /// Path warnings are only logged, use [`Tree::resolve_with`] to collect them
    pub fn resolve(&self, loc: &Locator) -> Result<NodeKey, Error> {
        self.resolve_with(loc, &mut Vec::new())
    }

    pub fn resolve_with(&self, loc: &Locator, warnings: &mut Vec<Warning>) -> Result<NodeKey, Error> {
        match loc {
            Locator::Offset(i) => self
                .root()
                .dfs()
                .nth(*i)
                .map(|n| n.key())
                .ok_or_else(|| Error::NodeNotFound(format!("offset {i}"))),
            Locator::Hex(hex) => match self.by_hex.get(hex.as_str()) {
                Some(k) => Ok(*k),
                None => NodeId::parse_hex(hex)
                    .ok()
                    .and_then(|id| self.key_of(id))
                    .ok_or_else(|| Error::NodeNotFound(hex.clone())),
            },
            Locator::Id(id) => self
                .key_of(*id)
                .ok_or_else(|| Error::NodeNotFound(id.hex())),
            Locator::Path(path) => Ok(self.root().find_node_by_index(path, warnings).key()),
        }
    }

    pub fn get(&self, loc: &Locator) -> Result<NodeRef<'_>, Error> {
        let key = self.resolve(loc)?;
        self.node_ref(key)
            .ok_or_else(|| Error::NodeNotFound(key.to_string()))
    }

    /// Detaches the located node and its subtree from the tree, returning its
    /// key. The subtree stays staged until purged or attached again.
    pub fn remove(&mut self, loc: &Locator) -> Result<NodeKey, Error> {
        let key = self.resolve(loc)?;
        if key == self.root {
            return Err(Error::RootOperation);
        }
        let n = self.get_node(key)?;
        let parent = n.parent.ok_or(Error::NodeNotFound(n.id.hex()))?;
        self.detach_child(parent, key)?;
        Ok(key)
    }

    /// Puts `node` in the slot of the located node, returning the new key. The
    /// old node stays staged until purged.
    pub fn replace(&mut self, loc: &Locator, node: Node) -> Result<NodeKey, Error> {
        let old = self.resolve(loc)?;
        if old == self.root {
            return Err(Error::RootOperation);
        }
        let o = self.get_node(old)?;
        let parent = o.parent.ok_or(Error::NodeNotFound(o.id.hex()))?;
        let new = self.stage(node);
        if let Err(e) = self.replace_child(parent, old, new) {
            self.purge(new)?;
            return Err(e);
        }
        Ok(new)
    }
}
