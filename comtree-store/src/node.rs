use std::fmt;

use crate::{
    api::{Comment, Field, NodeId, Value},
    Tree,
};

/// Slot of a node in its tree's arena. Slots are never reused, so a key stays
/// unambiguous for the whole life of the tree.
#[derive(
    Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, serde::Deserialize, serde::Serialize,
)]
pub struct NodeKey(pub(crate) usize);

impl fmt::Display for NodeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct Node {
    pub(crate) id: NodeId,
    pub(crate) comment: Comment,
    pub(crate) parent: Option<NodeKey>,
    pub(crate) children: Vec<NodeKey>,
    /// Position among the parent's children, `None` while detached
    pub(crate) index: Option<usize>,
}

impl Node {
    pub fn new(comment: Comment) -> Node {
        Node::with_id(NodeId::new(), comment)
    }

    pub fn with_id(id: NodeId, comment: Comment) -> Node {
        Node {
            id,
            comment,
            parent: None,
            children: Vec::new(),
            index: None,
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn comment(&self) -> &Comment {
        &self.comment
    }

    pub fn parent(&self) -> Option<NodeKey> {
        self.parent
    }

    pub fn children(&self) -> &[NodeKey] {
        &self.children
    }

    pub fn index(&self) -> Option<usize> {
        self.index
    }

    pub fn value(&self, field: Field) -> Value {
        self.comment.value(field)
    }
}

/// Nested view of a subtree, for display and debugging
#[derive(Clone, Debug, Eq, PartialEq, serde::Serialize)]
pub struct LocalTree {
    pub id: NodeId,
    pub index: Option<usize>,
    pub text: String,
    pub children: Vec<LocalTree>,
}

/// Read-only cursor on a node that is present in `tree`
#[derive(Clone, Copy)]
pub struct NodeRef<'a> {
    pub(crate) tree: &'a Tree,
    pub(crate) key: NodeKey,
    pub(crate) node: &'a Node,
}

impl<'a> NodeRef<'a> {
    pub fn key(&self) -> NodeKey {
        self.key
    }

    pub fn tree(&self) -> &'a Tree {
        self.tree
    }

    pub fn node(&self) -> &'a Node {
        self.node
    }

    pub fn id(&self) -> NodeId {
        self.node.id
    }

    pub fn comment(&self) -> &'a Comment {
        &self.node.comment
    }

    pub fn index(&self) -> Option<usize> {
        self.node.index
    }

    pub fn parent(&self) -> Option<NodeRef<'a>> {
        self.node.parent.and_then(|p| self.tree.node_ref(p))
    }

    pub fn children(&self) -> impl Iterator<Item = NodeRef<'a>> + 'a {
        let tree = self.tree;
        self.node
            .children
            .iter()
            .filter_map(move |c| tree.node_ref(*c))
    }

    pub fn child(&self, i: usize) -> Option<NodeRef<'a>> {
        self.node
            .children
            .get(i)
            .and_then(|c| self.tree.node_ref(*c))
    }

    pub fn is_root(&self) -> bool {
        self.key == self.tree.root_key()
    }

    pub fn is_leaf(&self) -> bool {
        self.node.children.is_empty()
    }

    pub fn is_internal(&self) -> bool {
        !self.is_root() && !self.is_leaf()
    }

    /// Number of edges up to the topmost ancestor
    pub fn depth(&self) -> usize {
        std::iter::successors(self.parent(), |p| p.parent()).count()
    }

    /// Sibling indices leading from the topmost ancestor down to this node
    pub fn path(&self) -> Vec<usize> {
        let mut path = std::iter::successors(Some(*self), |n| n.parent())
            .filter(|n| n.node.parent.is_some())
            .filter_map(|n| n.index())
            .collect::<Vec<_>>();
        path.reverse();
        path
    }

    /// Depth-first pre-order walk of the subtree, starting with this node
    pub fn dfs(&self) -> Dfs<'a> {
        Dfs {
            tree: self.tree,
            stack: vec![self.key],
        }
    }

    pub fn flatten(&self) -> Vec<NodeRef<'a>> {
        self.dfs().collect()
    }

    /// Number of nodes in the subtree, this one included
    pub fn size(&self) -> usize {
        self.dfs().count()
    }

    /// Compares comments by value and cached indices, recursively
    pub fn shallow_eq(&self, other: &NodeRef<'_>) -> bool {
        self.comment().shallow_eq(other.comment())
            && self.index() == other.index()
            && self.node.children.len() == other.node.children.len()
            && self
                .children()
                .zip(other.children())
                .all(|(a, b)| a.shallow_eq(&b))
    }

    /// Like `shallow_eq`, but also compares ids and every stamp
    pub fn deep_eq(&self, other: &NodeRef<'_>) -> bool {
        self.id() == other.id()
            && self.comment() == other.comment()
            && self.index() == other.index()
            && self.node.children.len() == other.node.children.len()
            && self
                .children()
                .zip(other.children())
                .all(|(a, b)| a.deep_eq(&b))
    }

    pub fn local_tree(&self) -> LocalTree {
        LocalTree {
            id: self.id(),
            index: self.index(),
            text: self.comment().text().to_string(),
            children: self.children().map(|c| c.local_tree()).collect(),
        }
    }
}

impl fmt::Debug for NodeRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeRef")
            .field("key", &self.key)
            .field("id", &self.node.id)
            .field("index", &self.node.index)
            .finish()
    }
}

pub struct Dfs<'a> {
    tree: &'a Tree,
    stack: Vec<NodeKey>,
}

impl<'a> Iterator for Dfs<'a> {
    type Item = NodeRef<'a>;

    fn next(&mut self) -> Option<NodeRef<'a>> {
        loop {
            let key = self.stack.pop()?;
            if let Some(n) = self.tree.node_ref(key) {
                self.stack.extend(n.node.children.iter().rev().copied());
                return Some(n);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::Profile;

    fn comment(text: &str) -> Comment {
        Comment::new(text, "", 0, Profile::default(), None)
    }

    fn sample() -> (Tree, Vec<NodeKey>) {
        // root
        //  +- a
        //  |  +- a0
        //  |  +- a1
        //  |     +- a10
        //  +- b
        let mut t = Tree::new();
        let a = t.add_top_node(Node::new(comment("a"))).unwrap();
        let a0 = t.add_node_under(a, Node::new(comment("a0"))).unwrap();
        let a1 = t.add_node_under(a, Node::new(comment("a1"))).unwrap();
        let a10 = t.add_node_under(a1, Node::new(comment("a10"))).unwrap();
        let b = t.add_top_node(Node::new(comment("b"))).unwrap();
        (t, vec![a, a0, a1, a10, b])
    }

    #[test]
    fn navigation() {
        let (t, keys) = sample();
        let a10 = t.node_ref(keys[3]).unwrap();
        assert_eq!(a10.depth(), 3);
        assert_eq!(a10.path(), vec![0, 1, 0]);
        assert_eq!(a10.parent().map(|p| p.key()), Some(keys[2]));
        assert!(a10.is_leaf());
        assert!(t.node_ref(keys[2]).unwrap().is_internal());
        assert!(t.root().is_root());
        assert!(!t.root().is_internal());
        assert_eq!(t.root().depth(), 0);
        assert!(t.root().path().is_empty());
        assert_eq!(t.node_ref(keys[4]).unwrap().index(), Some(1));
    }

    #[test]
    fn preorder() {
        let (t, _) = sample();
        let texts = t
            .root()
            .dfs()
            .map(|n| n.comment().text().to_string())
            .collect::<Vec<_>>();
        assert_eq!(texts, vec!["", "a", "a0", "a1", "a10", "b"]);
        assert_eq!(t.root().size(), 6);
        assert_eq!(t.root().child(0).unwrap().size(), 4);
    }

    #[test]
    fn equalities() {
        let (t, _) = sample();
        let copy = t.clone();
        assert!(t.root().deep_eq(&copy.root()));

        let (other, _) = sample();
        assert!(t.root().shallow_eq(&other.root()));
        assert!(!t.root().deep_eq(&other.root()));

        let mut changed = t.clone();
        let b = changed.root().child(1).unwrap().key();
        changed.set_comment(b, comment("z")).unwrap();
        assert!(!t.root().shallow_eq(&changed.root()));
    }

    #[test]
    fn nested_view() {
        let (t, _) = sample();
        let local = t.root().local_tree();
        assert_eq!(local.children.len(), 2);
        assert_eq!(local.children[0].children[1].children[0].text, "a10");
        assert_eq!(local.children[1].index, Some(1));
    }
}
