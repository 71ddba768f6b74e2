use std::{cmp::Ordering, fmt, sync::Arc};

use crate::{
    api::{Comparator, Error, Field, Value},
    Node, NodeKey, Tree,
};

pub type KeyFn = Arc<dyn Fn(&Node) -> Value + Send + Sync>;

/// How to order siblings. Defaults to ascending like count.
#[derive(Clone)]
pub struct SortBy {
    field: Field,
    descending: bool,
    key: Option<KeyFn>,
    comparator: Comparator,
}

impl Default for SortBy {
    fn default() -> SortBy {
        SortBy {
            field: Field::Likes,
            descending: false,
            key: None,
            comparator: Comparator::default(),
        }
    }
}

impl fmt::Debug for SortBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SortBy")
            .field("field", &self.field)
            .field("descending", &self.descending)
            .field("key", &self.key.as_ref().map(|_| "<fn>"))
            .field("comparator", &self.comparator)
            .finish()
    }
}

impl SortBy {
    pub fn field(field: Field) -> SortBy {
        SortBy {
            field,
            ..SortBy::default()
        }
    }

    pub fn descending(mut self, descending: bool) -> SortBy {
        self.descending = descending;
        self
    }

    /// Replaces the field lookup with an arbitrary key
    pub fn key(mut self, key: impl Fn(&Node) -> Value + Send + Sync + 'static) -> SortBy {
        self.key = Some(Arc::new(key));
        self
    }

    pub fn comparator(mut self, comparator: Comparator) -> SortBy {
        self.comparator = comparator;
        self
    }

    fn key_of(&self, node: &Node) -> Value {
        match &self.key {
            Some(key) => key(node),
            None => node.value(self.field),
        }
    }

    /// Fails when the comparator cannot order anything
    pub fn validate(&self) -> Result<(), Error> {
        self.comparator.order_fn().map(drop)
    }

    fn order(&self) -> Result<impl Fn(&Value, &Value) -> Ordering, Error> {
        let base = self.comparator.order_fn()?;
        let descending = self.descending;
        Ok(move |a: &Value, b: &Value| {
            let o = base(a, b);
            if descending {
                o.reverse()
            } else {
                o
            }
        })
    }

    /// Stable sort of `keys`, looking nodes up in `tree`. Keys absent from
    /// the tree are dropped.
    fn sort_keys(&self, tree: &Tree, keys: &[NodeKey]) -> Result<Vec<NodeKey>, Error> {
        let order = self.order()?;
        let mut keyed = keys
            .iter()
            .filter_map(|k| tree.node(*k).map(|n| (self.key_of(n), *k)))
            .collect::<Vec<_>>();
        keyed.sort_by(|(a, _), (b, _)| order(a, b));
        Ok(keyed.into_iter().map(|(_, k)| k).collect())
    }
}

impl Tree {
    pub fn sort(&mut self, by: &SortBy) -> Result<(), Error> {
        self.sort_subtree(self.root, by)
    }

    /// Reorders the children of every node below `top`, then refreshes their
    /// cached indices
    pub fn sort_subtree(&mut self, top: NodeKey, by: &SortBy) -> Result<(), Error> {
        by.validate()?;
        let parents = self
            .node_ref(top)
            .ok_or_else(|| Error::NodeNotFound(top.to_string()))?
            .dfs()
            .map(|n| n.key())
            .collect::<Vec<_>>();
        for p in parents {
            let children = self.node(p).map(|n| n.children.clone()).unwrap_or_default();
            let sorted = by.sort_keys(self, &children)?;
            if let Some(n) = self.nodes.get_mut(p.0).and_then(Option::as_mut) {
                n.children = sorted;
            }
            self.revalidate(p)?;
        }
        tracing::debug!(?top, ?by, "sorted subtree");
        Ok(())
    }

    /// Sorted copy of the whole tree, leaving this one untouched
    pub fn sorted_copy(&self, by: &SortBy) -> Result<Tree, Error> {
        let mut copy = self.clone();
        copy.sort(by)?;
        Ok(copy)
    }

    /// Nodes of a sorted copy, in depth-first order and without the root
    pub fn iter_sorted(&self, by: &SortBy) -> Result<impl Iterator<Item = Node>, Error> {
        let copy = self.sorted_copy(by)?;
        let nodes = copy
            .root()
            .dfs()
            .skip(1)
            .map(|n| n.node().clone())
            .collect::<Vec<_>>();
        Ok(nodes.into_iter())
    }

    /// Every node but the root in one global order, ignoring the hierarchy
    pub fn flat_sorted(&self, by: &SortBy) -> Result<Vec<&Node>, Error> {
        let flat = self.root().dfs().skip(1).map(|n| n.key()).collect::<Vec<_>>();
        Ok(by
            .sort_keys(self, &flat)?
            .into_iter()
            .filter_map(|k| self.node(k))
            .collect())
    }
}
