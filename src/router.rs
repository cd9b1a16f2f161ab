//! Templated path routing.
//!
//! Compiles `{name}` path templates into a per-segment trie. Static
//! segments take precedence over placeholder segments, with backtracking,
//! so `/pet/findByStatus` wins over `/pet/{petId}` for an exact match.
//! Matching is purely lexical on `/`-delimited segments: query strings are
//! the caller's problem and trailing slashes are not special, they simply
//! don't match.

use std::collections::{BTreeMap, HashMap};

/// Result of matching a concrete request path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteMatch<'r> {
    /// The template that matched, exactly as registered.
    pub template: &'r str,
    /// Raw segment values captured by the template's placeholders.
    pub params: HashMap<String, String>,
}

#[derive(Debug, Default)]
struct Node {
    /// Static children keyed by the literal segment.
    children: BTreeMap<String, Node>,
    /// At most one placeholder child per node. Placeholder names are not
    /// stored here; captures are recovered from the matched template.
    wildcard: Option<Box<Node>>,
    /// Template terminating at this node, if any.
    template: Option<String>,
}

/// Matches concrete request paths against `{name}` path templates.
#[derive(Debug, Default)]
pub struct PathRouter {
    root: Node,
}

impl PathRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a path template such as `/pet/{petId}`.
    pub fn register(&mut self, template: &str) {
        let mut node = &mut self.root;
        for segment in split(template) {
            node = if placeholder(segment).is_some() {
                node.wildcard.get_or_insert_with(Box::default).as_mut()
            } else {
                node.children.entry(segment.to_string()).or_default()
            };
        }
        node.template = Some(template.to_string());
    }

    /// Match a concrete request path against the registered templates.
    ///
    /// Returns `None` when no template matches; the caller reports the
    /// undocumented operation.
    pub fn lookup(&self, path: &str) -> Option<RouteMatch<'_>> {
        let segments: Vec<&str> = split(path).collect();
        let template = lookup_node(&self.root, &segments)?;

        let params = split(template)
            .zip(&segments)
            .filter_map(|(seg, value)| {
                placeholder(seg).map(|name| (name.to_string(), (*value).to_string()))
            })
            .collect();

        Some(RouteMatch { template, params })
    }
}

fn lookup_node<'r>(node: &'r Node, segments: &[&str]) -> Option<&'r str> {
    match segments {
        [] => node.template.as_deref(),
        [head, rest @ ..] => {
            if let Some(child) = node.children.get(*head) {
                if let Some(template) = lookup_node(child, rest) {
                    return Some(template);
                }
            }
            node.wildcard
                .as_deref()
                .and_then(|child| lookup_node(child, rest))
        }
    }
}

fn split(path: &str) -> impl Iterator<Item = &str> {
    path.strip_prefix('/').unwrap_or(path).split('/')
}

fn placeholder(segment: &str) -> Option<&str> {
    segment.strip_prefix('{')?.strip_suffix('}')
}
