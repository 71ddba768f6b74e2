use std::collections::BTreeMap;

use crate::{api::Field, NodeRef, Tree};

impl<'a> NodeRef<'a> {
    /// Breadth-first rendering, one line per depth. Siblings are grouped in
    /// braces under their parent.
    pub fn level_order(&self, field: Field, extra: Option<Field>, debug: bool) -> String {
        let top = *self;
        let label = |n: &NodeRef<'_>| {
            if n.key() == top.key() {
                String::from("root")
            } else {
                n.comment().text().to_string()
            }
        };

        let mut lines = vec![format!("{} (root)", top.comment().value(field))];
        let mut level = top.children().map(|c| (c, top)).collect::<Vec<_>>();
        let mut depth = 1;
        while !level.is_empty() {
            let mut groups: Vec<Vec<String>> = Vec::new();
            let mut last_parent = None;
            let mut next = Vec::new();
            for (node, parent) in level {
                let mut repr = format!("{} (child of {})", node.comment().value(field), label(&parent));
                if let Some(extra) = extra {
                    repr += &format!(" (data = {})", node.comment().value(extra));
                }
                if debug {
                    repr += &format!(
                        " (parent = {}; index = {:?}; id = {})",
                        label(&parent),
                        node.index(),
                        node.id()
                    );
                }
                match groups.last_mut() {
                    Some(group) if last_parent == Some(parent.key()) => group.push(repr),
                    _ => groups.push(vec![repr]),
                }
                last_parent = Some(parent.key());
                next.extend(node.children().map(|c| (c, node)));
            }
            let groups = groups
                .into_iter()
                .map(|g| format!("{{{}}}", g.join(" | ")))
                .collect::<Vec<_>>();
            lines.push(format!("{}{}", " ".repeat(4 * depth), groups.join(" ")));
            level = next;
            depth += 1;
        }
        lines.join("\n")
    }
}

impl Tree {
    pub fn level_order(&self, field: Field, extra: Option<Field>, debug: bool) -> String {
        self.root().level_order(field, extra, debug)
    }

    /// Author link to the ids of every comment by that author, in depth-first
    /// order
    pub fn unique_authors(&self) -> BTreeMap<String, Vec<String>> {
        let mut authors = BTreeMap::<String, Vec<String>>::new();
        for n in self.root().dfs().skip(1) {
            authors
                .entry(n.comment().author_link().to_string())
                .or_default()
                .push(n.id().hex());
        }
        authors
    }
}
