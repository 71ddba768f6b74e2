#![cfg(test)]

use std::{cmp, collections::HashSet};

use bolero::generator::gen_with;

use crate::{
    api::{Comment, Field, Profile},
    snapshot, table, Locator, Node, NodeKey, SortBy, Tree,
};

#[derive(Clone, Debug, bolero::generator::TypeGenerator)]
enum FuzzOp {
    AddTop {
        likes: u8,
        #[generator(gen_with::<String>().len(0..20usize))]
        text: String,
    },
    AddUnder {
        parent: usize,
        likes: u8,
        #[generator(gen_with::<String>().len(0..20usize))]
        text: String,
    },
    Remove {
        node: usize,
    },
    Replace {
        node: usize,
        likes: u8,
    },
    Reattach {
        detached: usize,
        parent: usize,
    },
    Purge {
        detached: usize,
    },
    Sort {
        by_text: bool,
        descending: bool,
    },
}

/// Maps an arbitrary fuzzer-chosen number onto one of `from`
fn pick<T: Copy>(fuzz_id: usize, from: &[T]) -> Option<T> {
    if from.is_empty() {
        return None;
    }
    let bucket_size = cmp::max(1, usize::MAX / from.len());
    from.get(cmp::min(fuzz_id / bucket_size, from.len() - 1))
        .copied()
}

fn comment(text: String, likes: u8) -> Comment {
    Comment::new(text, "", u64::from(likes), Profile::default(), None)
}

fn check_invariants(t: &Tree) {
    t.check_integrity().expect("tree integrity");
    let flat = t.root().flatten();
    assert_eq!(t.len(), flat.len() - 1);
    let mut ids = HashSet::new();
    for n in &flat {
        assert!(ids.insert(n.id()), "node {} reachable twice", n.id());
        assert_eq!(t.key_of(n.id()), Some(n.key()));
        if let Some(p) = n.parent() {
            assert_eq!(p.node().children()[n.index().unwrap()], n.key());
        }
    }
}

struct Fuzzer {
    tree: Tree,
    detached: Vec<NodeKey>,
}

impl Fuzzer {
    fn attached(&self) -> Vec<NodeKey> {
        self.tree.root().dfs().map(|n| n.key()).collect()
    }

    fn execute(&mut self, op: FuzzOp) {
        match op {
            FuzzOp::AddTop { likes, text } => {
                self.tree.add_top_node(Node::new(comment(text, likes))).unwrap();
            }
            FuzzOp::AddUnder {
                parent,
                likes,
                text,
            } => {
                if let Some(parent) = pick(parent, &self.attached()) {
                    self.tree
                        .add_node_under(parent, Node::new(comment(text, likes)))
                        .unwrap();
                }
            }
            FuzzOp::Remove { node } => {
                if let Some(key) = pick(node, &self.attached()) {
                    let res = self.tree.remove(&Locator::Offset(self.offset_of(key)));
                    if key == self.tree.root_key() {
                        assert!(res.is_err());
                    } else {
                        assert_eq!(res, Ok(key));
                        self.detached.push(key);
                    }
                }
            }
            FuzzOp::Replace { node, likes } => {
                if let Some(key) = pick(node, &self.attached()) {
                    let id = self.tree.node(key).unwrap().id();
                    let res = self
                        .tree
                        .replace(&Locator::Id(id), Node::new(comment(String::new(), likes)));
                    if key == self.tree.root_key() {
                        assert!(res.is_err());
                    } else {
                        res.unwrap();
                        assert!(!self.tree.contains(id));
                        self.detached.push(key);
                    }
                }
            }
            FuzzOp::Reattach { detached, parent } => {
                let Some(d) = pick(detached, &self.detached) else {
                    return;
                };
                let Some(parent) = pick(parent, &self.attached()) else {
                    return;
                };
                // the detached subtree may carry ids that were added again since
                if self.tree.attach_child(parent, d).is_ok() {
                    self.detached.retain(|k| *k != d);
                }
            }
            FuzzOp::Purge { detached } => {
                if let Some(d) = pick(detached, &self.detached) {
                    assert!(self.tree.purge(d).unwrap() >= 1);
                    self.detached.retain(|k| *k != d);
                }
            }
            FuzzOp::Sort {
                by_text,
                descending,
            } => {
                let by = match by_text {
                    true => SortBy::field(Field::Text),
                    false => SortBy::default(),
                }
                .descending(descending);
                self.tree.sort(&by).unwrap();
                let once = self.tree.clone();
                self.tree.sort(&by).unwrap();
                assert!(once.deep_eq(&self.tree), "sorting is not idempotent");
            }
        }
    }

    fn offset_of(&self, key: NodeKey) -> usize {
        self.tree
            .root()
            .dfs()
            .position(|n| n.key() == key)
            .unwrap()
    }
}

#[test]
fn structural_invariants_hold() {
    bolero::check!()
        .with_generator(gen_with::<Vec<FuzzOp>>().len(1..60usize))
        .cloned()
        .for_each(|ops: Vec<FuzzOp>| {
            let mut fuzzer = Fuzzer {
                tree: Tree::new(),
                detached: Vec::new(),
            };
            for op in ops {
                fuzzer.execute(op);
                check_invariants(&fuzzer.tree);
            }

            let t = &fuzzer.tree;
            let mut buf = Vec::new();
            snapshot::write(t, &mut buf).unwrap();
            let back = snapshot::read(&buf[..]).unwrap();
            assert!(t.deep_eq(&back), "snapshot round trip is not deep-equal");

            let mut buf = Vec::new();
            table::write(t, &mut buf).unwrap();
            let back = table::read(&buf[..]).unwrap();
            assert!(t.shallow_eq(&back), "table round trip is not shallow-equal");
            check_invariants(&back);
        })
}

#[test]
fn ascending_then_descending_reverses_distinct_keys() {
    bolero::check!()
        .with_generator(gen_with::<Vec<u8>>().len(0..30usize))
        .cloned()
        .for_each(|likes: Vec<u8>| {
            let mut t = Tree::new();
            for (i, l) in likes.iter().enumerate() {
                t.add_top_node(Node::new(comment(i.to_string(), *l))).unwrap();
            }
            let keys = |t: &Tree| t.root().children().map(|n| n.key()).collect::<Vec<_>>();
            t.sort(&SortBy::default()).unwrap();
            let asc = keys(&t);
            t.sort(&SortBy::default().descending(true)).unwrap();
            let desc = keys(&t);

            let likes_of = |k: &NodeKey| t.node(*k).unwrap().comment().likes();
            let mut asc_likes = asc.iter().map(likes_of).collect::<Vec<_>>();
            let desc_likes = desc.iter().map(likes_of).collect::<Vec<_>>();
            asc_likes.reverse();
            assert_eq!(asc_likes, desc_likes);

            // ties keep the order they had before the descending sort
            for w in desc.windows(2) {
                if likes_of(&w[0]) == likes_of(&w[1]) {
                    let pos = |k: &NodeKey| asc.iter().position(|a| a == k);
                    assert!(pos(&w[0]) < pos(&w[1]));
                }
            }
        })
}
