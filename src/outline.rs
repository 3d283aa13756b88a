//! The hierarchical table-of-contents tree.
//!
//! Stage 3 of the conversion pipeline. Built from the canonical item list
//! in two sequential passes:
//!
//! 1. **Structural pass** — every item path is split into segments and a
//!    chain of nodes is walked/created from the root, reusing an existing
//!    child when its title matches. Because the item list is path-sorted,
//!    each parent's children end up in alphabetical insertion order.
//! 2. **Binding pass** — for each item that actually produced a page (in
//!    the same sorted order), the leaf node gets the page's output
//!    position. While walking back up from the leaf, any ancestor whose
//!    first child sits on the chain adopts that child's page if it has
//!    none of its own; the walk stops at the first ancestor where the
//!    first-child condition fails. The propagation is incremental, applied
//!    once per binding in left-to-right order — an already-bound ancestor
//!    is never retroactively changed.
//!
//! Net effect: a folder with no page of its own links to the first page
//! (in path order) found anywhere in its subtree.
//!
//! Nodes live in a flat arena (`Vec<Node>`) linked by index. The parent
//! edge is a plain index used only for the upward walk — ownership flows
//! strictly root → children.
//!
//! [`OutlineTree::export`] then produces the immutable bookmark tree for
//! the assembler: children sorted by title (independent of insertion
//! order), subtrees with no bound page anywhere omitted entirely.

use crate::paths;

/// Index into the tree's node arena.
type NodeId = usize;

#[derive(Debug)]
struct Node {
    /// The path segment this node represents. Unique among siblings.
    title: String,
    /// Output page position bound to this node, if any.
    page: Option<usize>,
    /// Back-reference for the propagation walk. Never an ownership edge.
    parent: Option<NodeId>,
    /// Insertion order = first-encounter order over the sorted item list.
    children: Vec<NodeId>,
}

/// Mutable TOC tree for one conversion run.
#[derive(Debug)]
pub struct OutlineTree {
    nodes: Vec<Node>,
}

/// One exported bookmark: title, a guaranteed-valid page target, children
/// sorted by title.
#[derive(Debug, Clone, PartialEq)]
pub struct Bookmark {
    pub title: String,
    pub page: usize,
    pub children: Vec<Bookmark>,
}

impl OutlineTree {
    pub fn new() -> Self {
        Self {
            nodes: vec![Node {
                title: String::new(),
                page: None,
                parent: None,
                children: Vec::new(),
            }],
        }
    }

    /// Build the full structure from the canonical item path list.
    pub fn from_paths<'a, I: IntoIterator<Item = &'a str>>(paths: I) -> Self {
        let mut tree = Self::new();
        for path in paths {
            tree.insert_path(path);
        }
        tree
    }

    /// Structural pass for one item: walk/create the segment chain.
    pub fn insert_path(&mut self, path: &str) -> NodeId {
        let mut current = 0;
        for segment in paths::segments(path) {
            current = self.child(current, segment);
        }
        current
    }

    /// Find or append the child of `parent` titled `segment`.
    fn child(&mut self, parent: NodeId, segment: &str) -> NodeId {
        let existing = self.nodes[parent]
            .children
            .iter()
            .copied()
            .find(|&c| self.nodes[c].title == segment);
        if let Some(id) = existing {
            return id;
        }
        let id = self.nodes.len();
        self.nodes.push(Node {
            title: segment.to_string(),
            page: None,
            parent: Some(parent),
            children: Vec::new(),
        });
        self.nodes[parent].children.push(id);
        id
    }

    /// Binding pass for one rendered page: bind the leaf at `path` to the
    /// page at output position `page`, then propagate upward along the
    /// first-child chain.
    ///
    /// Bindings must arrive in canonical (path-sorted) order; the
    /// propagation is deliberately incremental, not a global recompute.
    pub fn bind(&mut self, path: &str, page: usize) {
        let leaf = self.insert_path(path);
        self.nodes[leaf].page.get_or_insert(page);

        let mut child = leaf;
        while let Some(parent) = self.nodes[child].parent {
            if self.nodes[parent].children.first() != Some(&child) {
                break;
            }
            if self.nodes[parent].page.is_none() {
                self.nodes[parent].page = self.nodes[child].page;
            }
            child = parent;
        }
    }

    /// Export the immutable bookmark tree.
    ///
    /// Depth-first; each node's children sorted by title. A node whose
    /// subtree holds no bound page at all is omitted. A node with paged
    /// descendants but no page of its own (its first child's subtree never
    /// rendered, so propagation skipped it) falls back to the earliest
    /// page in its subtree rather than emitting a dangling bookmark.
    pub fn export(&self) -> Vec<Bookmark> {
        self.export_children(0)
    }

    fn export_children(&self, id: NodeId) -> Vec<Bookmark> {
        let mut ids: Vec<NodeId> = self.nodes[id].children.clone();
        ids.sort_by(|&a, &b| self.nodes[a].title.cmp(&self.nodes[b].title));
        ids.iter()
            .filter_map(|&c| self.export_node(c))
            .collect()
    }

    fn export_node(&self, id: NodeId) -> Option<Bookmark> {
        let children = self.export_children(id);
        let page = self.nodes[id]
            .page
            .or_else(|| children.iter().map(|c| c.page).min())?;
        Some(Bookmark {
            title: self.nodes[id].title.clone(),
            page,
            children,
        })
    }
}

impl Default for OutlineTree {
    fn default() -> Self {
        Self::new()
    }
}
