//! Radix tree used for per-method route matching.
//!
//! Nodes live in an arena (`Vec<Node>`) and refer to each other by index.
//! Every node holds up to three kinds of children:
//!
//! - **static** children, keyed uniquely by the first byte of their label;
//!   labels are split on insertion so siblings never share a prefix
//! - one **parameter** child (`:name`), consuming a single path segment
//! - one **wildcard** child (`*`), consuming the rest of the path
//!
//! Lookup tries them in that order at every node and backtracks across all
//! three levels, at any ancestor, when a deeper branch dead-ends. A literal
//! `/users/new` therefore wins over `/users/:id`, yet `/users/new/settings`
//! still reaches `/users/:id/settings` if the static branch has no such
//! continuation.
//!
//! ## Example
//!
//! ```rust,ignore
//! let mut tree = RadixTree::new();
//! tree.insert("/users/:id", handler);
//! let mut values = Vec::new();
//! let ep = tree.find("/users/42", &mut values).unwrap();
//! assert_eq!(ep.param_names(), ["id"]);
//! assert_eq!(values, ["42"]);
//! ```

use std::sync::Arc;

use crate::middleware::Handler;

type NodeId = usize;

const ROOT: NodeId = 0;

/// Name bound to the remainder captured by a wildcard segment.
pub const WILDCARD_PARAM: &str = "*";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NodeKind {
    Static,
    Param,
    Any,
}

/// What a full pattern resolves to: the (middleware-wrapped) handler plus
/// the parameter names collected along the pattern, in order.
#[derive(Debug, Clone)]
pub struct Endpoint {
    handler: Handler,
    pnames: Arc<[String]>,
    pattern: String,
}

impl Endpoint {
    #[must_use]
    pub fn handler(&self) -> &Handler {
        &self.handler
    }

    #[must_use]
    pub fn param_names(&self) -> &Arc<[String]> {
        &self.pnames
    }

    #[must_use]
    pub fn pattern(&self) -> &str {
        &self.pattern
    }
}

#[derive(Debug)]
struct Node {
    kind: NodeKind,
    /// Literal bytes for static nodes, empty otherwise
    label: Vec<u8>,
    static_children: Vec<NodeId>,
    param_child: Option<NodeId>,
    any_child: Option<NodeId>,
    endpoint: Option<Endpoint>,
}

impl Node {
    fn new(kind: NodeKind, label: Vec<u8>) -> Self {
        Self {
            kind,
            label,
            static_children: Vec::new(),
            param_child: None,
            any_child: None,
            endpoint: None,
        }
    }
}

enum Token<'a> {
    Static(&'a [u8]),
    Param(&'a str),
    Any,
}

/// Break a pattern into static runs, `:name` parameters and a trailing `*`.
/// Anything after `*` is ignored.
fn tokenize(pattern: &str) -> Vec<Token<'_>> {
    let bytes = pattern.as_bytes();
    let mut tokens = Vec::new();
    let mut start = 0;
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b':' => {
                if start < i {
                    tokens.push(Token::Static(&bytes[start..i]));
                }
                let name_start = i + 1;
                let mut end = name_start;
                while end < bytes.len() && bytes[end] != b'/' {
                    end += 1;
                }
                tokens.push(Token::Param(&pattern[name_start..end]));
                start = end;
                i = end;
            }
            b'*' => {
                if start < i {
                    tokens.push(Token::Static(&bytes[start..i]));
                }
                tokens.push(Token::Any);
                return tokens;
            }
            _ => i += 1,
        }
    }

    if start < bytes.len() {
        tokens.push(Token::Static(&bytes[start..]));
    }
    tokens
}

fn common_prefix_len(a: &[u8], b: &[u8]) -> usize {
    a.iter().zip(b).take_while(|(x, y)| x == y).count()
}

/// Radix tree for a single HTTP method.
#[derive(Debug)]
pub struct RadixTree {
    nodes: Vec<Node>,
    routes: usize,
    max_params: usize,
}

impl Default for RadixTree {
    fn default() -> Self {
        Self::new()
    }
}

impl RadixTree {
    #[must_use]
    pub fn new() -> Self {
        Self {
            nodes: vec![Node::new(NodeKind::Static, Vec::new())],
            routes: 0,
            max_params: 0,
        }
    }

    /// Number of distinct patterns registered.
    #[must_use]
    pub fn len(&self) -> usize {
        self.routes
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.routes == 0
    }

    /// Largest parameter count among registered patterns.
    #[must_use]
    pub fn max_params(&self) -> usize {
        self.max_params
    }

    /// Register `handler` under `pattern`. Returns the handler it replaced
    /// when the same pattern was already present.
    pub fn insert(&mut self, pattern: &str, handler: Handler) -> Option<Handler> {
        let mut cur = ROOT;
        let mut pnames = Vec::new();

        for token in tokenize(pattern) {
            cur = match token {
                Token::Static(run) => self.insert_static(cur, run),
                Token::Param(name) => {
                    pnames.push(name.to_string());
                    self.special_child(cur, NodeKind::Param)
                }
                Token::Any => {
                    pnames.push(WILDCARD_PARAM.to_string());
                    self.special_child(cur, NodeKind::Any)
                }
            };
        }

        self.max_params = self.max_params.max(pnames.len());
        let endpoint = Endpoint {
            handler,
            pnames: Arc::from(pnames),
            pattern: pattern.to_string(),
        };
        let replaced = self.nodes[cur].endpoint.replace(endpoint).map(|e| e.handler);
        if replaced.is_none() {
            self.routes += 1;
        }
        replaced
    }

    /// Resolve `path`, pushing captured parameter values onto `values` in
    /// pattern order. On a miss `values` is left as it was found.
    #[must_use]
    pub fn find(&self, path: &str, values: &mut Vec<String>) -> Option<&Endpoint> {
        let mark = values.len();
        match self.match_node(ROOT, path.as_bytes(), values) {
            Some(id) => self.nodes[id].endpoint.as_ref(),
            None => {
                values.truncate(mark);
                None
            }
        }
    }

    fn push(&mut self, node: Node) -> NodeId {
        self.nodes.push(node);
        self.nodes.len() - 1
    }

    fn static_child(&self, id: NodeId, first: u8) -> Option<NodeId> {
        self.nodes[id]
            .static_children
            .iter()
            .copied()
            .find(|&c| self.nodes[c].label.first() == Some(&first))
    }

    fn insert_static(&mut self, mut cur: NodeId, mut run: &[u8]) -> NodeId {
        while let Some(&first) = run.first() {
            let Some(child) = self.static_child(cur, first) else {
                let id = self.push(Node::new(NodeKind::Static, run.to_vec()));
                self.nodes[cur].static_children.push(id);
                return id;
            };
            let shared = common_prefix_len(&self.nodes[child].label, run);
            if shared < self.nodes[child].label.len() {
                self.split(child, shared);
            }
            run = &run[shared..];
            cur = child;
        }
        cur
    }

    /// Split a static node so its label ends at `at`; the remainder, with all
    /// children and any endpoint, moves into a new child.
    fn split(&mut self, id: NodeId, at: usize) {
        let node = &mut self.nodes[id];
        let tail = Node {
            kind: NodeKind::Static,
            label: node.label.split_off(at),
            static_children: std::mem::take(&mut node.static_children),
            param_child: node.param_child.take(),
            any_child: node.any_child.take(),
            endpoint: node.endpoint.take(),
        };
        let tail_id = self.push(tail);
        self.nodes[id].static_children.push(tail_id);
    }

    fn special_child(&mut self, id: NodeId, kind: NodeKind) -> NodeId {
        let existing = match kind {
            NodeKind::Param => self.nodes[id].param_child,
            NodeKind::Any => self.nodes[id].any_child,
            NodeKind::Static => None,
        };
        if let Some(child) = existing {
            return child;
        }
        let child = self.push(Node::new(kind, Vec::new()));
        match kind {
            NodeKind::Param => self.nodes[id].param_child = Some(child),
            NodeKind::Any => self.nodes[id].any_child = Some(child),
            NodeKind::Static => self.nodes[id].static_children.push(child),
        }
        child
    }

    fn match_node(&self, id: NodeId, rest: &[u8], values: &mut Vec<String>) -> Option<NodeId> {
        let node = &self.nodes[id];

        let rest = match node.kind {
            NodeKind::Static => rest.strip_prefix(node.label.as_slice())?,
            NodeKind::Param => {
                let end = rest.iter().position(|&b| b == b'/').unwrap_or(rest.len());
                if end == 0 {
                    return None;
                }
                values.push(String::from_utf8_lossy(&rest[..end]).into_owned());
                &rest[end..]
            }
            NodeKind::Any => {
                values.push(String::from_utf8_lossy(rest).into_owned());
                return node.endpoint.as_ref().map(|_| id);
            }
        };

        if rest.is_empty() && node.endpoint.is_some() {
            return Some(id);
        }

        let mark = values.len();

        if let Some(&first) = rest.first() {
            if let Some(child) = self.static_child(id, first) {
                if let Some(found) = self.match_node(child, rest, values) {
                    return Some(found);
                }
                values.truncate(mark);
            }
        }

        if let Some(child) = node.param_child {
            if let Some(found) = self.match_node(child, rest, values) {
                return Some(found);
            }
            values.truncate(mark);
        }

        if let Some(child) = node.any_child {
            if let Some(found) = self.match_node(child, rest, values) {
                return Some(found);
            }
            values.truncate(mark);
        }

        None
    }
}
