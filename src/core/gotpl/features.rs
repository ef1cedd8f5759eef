//! Feature tags for run reports.

use std::collections::BTreeSet;

use ftl2gotpl_ast::{Document, Node};

use super::helpers::Helper;

/// Collect the sorted set of node, directive and helper tags used by `doc`.
pub fn detect_features(doc: &Document, helpers: &[Helper]) -> Vec<String> {
    let mut tags = BTreeSet::new();
    walk(&doc.nodes, &mut tags);
    tags.extend(helpers.iter().map(|h| format!("helper:{}", h.name())));
    tags.into_iter().collect()
}

fn walk(nodes: &[Node], tags: &mut BTreeSet<String>) {
    for node in nodes {
        match node {
            Node::Text(_) => {
                tags.insert("node:text".into());
            }
            Node::Interpolation(_) => {
                tags.insert("node:interpolation".into());
            }
            Node::If(n) => {
                tags.insert("directive:if".into());
                if !n.else_ifs.is_empty() {
                    tags.insert("directive:elseif".into());
                }
                if !n.else_body.is_empty() {
                    tags.insert("directive:else".into());
                }
                walk(&n.then_body, tags);
                for branch in &n.else_ifs {
                    walk(&branch.body, tags);
                }
                walk(&n.else_body, tags);
            }
            Node::List(n) => {
                tags.insert("directive:list".into());
                walk(&n.body, tags);
            }
            Node::Assign(n) => {
                let tag = if n.local {
                    "directive:local"
                } else {
                    "directive:assign"
                };
                tags.insert(tag.into());
            }
            Node::Setting(_) => {
                tags.insert("directive:setting".into());
            }
            Node::Function(n) => {
                tags.insert("directive:function".into());
                walk(&n.body, tags);
            }
            Node::BareDirective(n) => {
                tags.insert(format!("directive:{}", n.name));
            }
            Node::MacroCall(_) => {
                tags.insert("call:macro".into());
            }
        }
    }
}
