use crate::{
    api::{Error, Field, Operator, Value, Warning},
    NodeKey, NodeRef, Tree,
};

/// Result of a search: one group per query set (or per index path), plus
/// every recoverable condition hit on the way
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Found {
    pub groups: Vec<Vec<NodeKey>>,
    pub warnings: Vec<Warning>,
}

impl Found {
    pub fn keys(&self) -> impl Iterator<Item = NodeKey> + '_ {
        self.groups.iter().flatten().copied()
    }
}

/// Search builder, see [`NodeRef::find_nodes`].
///
/// A query set pairs fields with target values positionally. A node hits a
/// set when every pair matches, and each set is satisfied by the first node
/// hitting it in depth-first order. A node satisfies at most one set.
#[must_use]
pub struct FindNodes<'a> {
    from: NodeRef<'a>,
    cap: Option<usize>,
    fields: Option<Vec<Vec<Field>>>,
    values: Option<Vec<Vec<Value>>>,
    operator: Operator,
    cast: bool,
    paths: Option<Vec<Vec<usize>>>,
}

impl<'a> NodeRef<'a> {
    pub fn find_nodes(&self) -> FindNodes<'a> {
        FindNodes {
            from: *self,
            cap: None,
            fields: None,
            values: None,
            operator: Operator::default(),
            cast: true,
            paths: None,
        }
    }

    /// Walks `path` down from this node. An out-of-range index stops the walk
    /// at the last node reached.
    pub fn find_node_by_index(&self, path: &[usize], warnings: &mut Vec<Warning>) -> NodeRef<'a> {
        let mut cur = *self;
        for (depth, &index) in path.iter().enumerate() {
            match cur.child(index) {
                Some(c) => cur = c,
                None => {
                    Warning::IndexOutOfRange { index, depth }.emit(warnings);
                    break;
                }
            }
        }
        cur
    }
}

impl Tree {
    pub fn find_nodes(&self) -> FindNodes<'_> {
        self.root().find_nodes()
    }
}

impl<'a> FindNodes<'a> {
    /// Maximum number of matched nodes, defaults to the subtree size
    pub fn cap(mut self, cap: usize) -> Self {
        self.cap = Some(cap);
        self
    }

    pub fn fields(mut self, fields: Vec<Vec<Field>>) -> Self {
        self.fields = Some(fields);
        self
    }

    pub fn values(mut self, values: Vec<Vec<Value>>) -> Self {
        self.values = Some(values);
        self
    }

    /// Appends one query set
    pub fn query(mut self, pairs: impl IntoIterator<Item = (Field, Value)>) -> Self {
        let (f, v): (Vec<Field>, Vec<Value>) = pairs.into_iter().unzip();
        self.fields.get_or_insert_with(Vec::new).push(f);
        self.values.get_or_insert_with(Vec::new).push(v);
        self
    }

    pub fn operator(mut self, operator: impl Into<Operator>) -> Self {
        self.operator = operator.into();
        self
    }

    /// Whether field values get coerced to the kind of their target first
    pub fn cast(mut self, cast: bool) -> Self {
        self.cast = cast;
        self
    }

    /// Direct index paths. When given, they replace the query sets and the cap.
    pub fn paths(mut self, paths: Vec<Vec<usize>>) -> Self {
        self.paths = Some(paths);
        self
    }

    pub fn run(self) -> Result<Found, Error> {
        let mut warnings = Vec::new();
        let sets = match (self.fields, self.values) {
            (None, None) => None,
            (Some(_), None) => return Err(Error::MissingQueryValues),
            (None, Some(_)) => return Err(Error::MissingQueryFields),
            (Some(fields), Some(values)) => {
                if fields.len() != values.len() {
                    return Err(Error::QuerySetCountMismatch {
                        fields: fields.len(),
                        values: values.len(),
                    });
                }
                for (set, (f, v)) in fields.iter().zip(values.iter()).enumerate() {
                    if f.len() != v.len() {
                        return Err(Error::QuerySetLengthMismatch {
                            set,
                            fields: f.len(),
                            values: v.len(),
                        });
                    }
                }
                Some(
                    fields
                        .into_iter()
                        .zip(values)
                        .map(|(f, v)| f.into_iter().zip(v).collect::<Vec<_>>())
                        .collect::<Vec<_>>(),
                )
            }
        };
        let predicate = self.operator.predicate(self.cast)?;

        if let Some(paths) = self.paths {
            if paths.is_empty() {
                Warning::NoPaths.emit(&mut warnings);
            }
            let groups: Vec<Vec<NodeKey>> = paths
                .iter()
                .map(|p| vec![self.from.find_node_by_index(p, &mut warnings).key()])
                .collect();
            return Ok(Found { groups, warnings });
        }

        let available = self.from.size();
        let cap = match self.cap {
            None => available,
            Some(requested) if requested > available => {
                Warning::CapClamped {
                    requested,
                    available,
                }
                .emit(&mut warnings);
                available
            }
            Some(cap) => cap,
        };

        let sets = match sets {
            Some(sets) if !sets.is_empty() => sets,
            _ => {
                Warning::NoCriteria { cap }.emit(&mut warnings);
                let first: Vec<NodeKey> = self.from.dfs().take(cap).map(|n| n.key()).collect();
                return Ok(Found {
                    groups: vec![first],
                    warnings,
                });
            }
        };

        let mut groups = vec![Vec::new(); sets.len()];
        let mut matched = 0;
        // The sentinel root holds no comment and never matches
        for node in self.from.dfs().filter(|n| !n.is_root()) {
            if matched >= cap || matched == sets.len() {
                break;
            }
            let comment = node.comment();
            let mut claimed = false;
            for (i, set) in sets.iter().enumerate() {
                let hit = set.iter().all(|(field, target)| {
                    predicate.test(&comment.value(*field), target, &mut warnings)
                });
                if !hit {
                    continue;
                }
                if !groups[i].is_empty() {
                    Warning::DuplicateMatch {
                        set: i,
                        node: node.id(),
                    }
                    .emit(&mut warnings);
                } else if !claimed {
                    groups[i].push(node.key());
                    claimed = true;
                    matched += 1;
                }
            }
        }
        Ok(Found { groups, warnings })
    }
}
