//! Abstract syntax tree for the template compiler.
//!
//! The whole fileset is stored in one arena keyed by node id. Ids are
//! allocated by a shared monotonic generator and are never reused, so a
//! released subtree leaves its ids retired. Every node records its
//! parent; the structural-edit API repairs that back-reference on every
//! edit, and `check_parent_links` asserts the invariant in tests.
//!
//! Expression subtrees are not arena entries; they are owned box trees
//! embedded in command payloads (see [`exprs`]). They draw ids from the
//! same generator, keeping ids unique across the entire fileset.

use hashbrown::HashMap;
use thin_vec::ThinVec;

/// Represents an interned string using symbol_table crate.
/// Alias for GlobalSymbol from symbol_table crate with global feature.
pub type Symbol = symbol_table::GlobalSymbol;

/// Node id, unique within one fileset.
pub type NodeId = std::num::NonZeroU32;

/// Intern a string as a [`Symbol`].
pub fn intern(s: &str) -> Symbol {
    Symbol::new(s)
}

pub use crate::source_manager::{SourceId, SourceLoc, SourceSpan};

pub mod dumper;
pub mod exprs;
pub mod nodes;

pub use exprs::{BinaryOp, Expr, ExprKind, VarDefn};
pub use nodes::*;

/// Monotonic source of node ids, shared across a fileset.
///
/// Thread-unsafe by contract: fileset passes are sequential with respect
/// to id allocation.
#[derive(Debug)]
pub struct NodeIdGen {
    next: u32,
}

impl Default for NodeIdGen {
    fn default() -> Self {
        Self::new()
    }
}

impl NodeIdGen {
    pub fn new() -> Self {
        NodeIdGen { next: 1 }
    }

    pub fn gen_id(&mut self) -> NodeId {
        let id = NodeId::new(self.next).expect("ICE: node id overflow");
        self.next += 1;
        id
    }
}

/// A single AST node: identity, location, the parent back-reference,
/// the ordered child list, and the kind payload.
#[derive(Debug)]
pub struct Node {
    pub id: NodeId,
    pub span: SourceSpan,
    pub parent: Option<NodeId>,
    pub children: ThinVec<NodeId>,
    pub kind: NodeKind,
}

/// The root of the fileset: owns every node of every file.
#[derive(Debug, Default)]
pub struct FileSetNode {
    nodes: HashMap<NodeId, Node>,
    files: Vec<NodeId>,
}

impl FileSetNode {
    pub fn new() -> Self {
        FileSetNode {
            nodes: HashMap::new(),
            files: Vec::new(),
        }
    }

    /// Allocate a node in the arena. Every node creation goes through
    /// the shared id generator.
    pub fn new_node(&mut self, kind: NodeKind, span: SourceSpan, id_gen: &mut NodeIdGen) -> NodeId {
        let id = id_gen.gen_id();
        self.nodes.insert(
            id,
            Node {
                id,
                span,
                parent: None,
                children: ThinVec::new(),
                kind,
            },
        );
        id
    }

    /// Register a file node as a child of the fileset, in order.
    pub fn add_file(&mut self, file: NodeId) {
        debug_assert!(
            matches!(self.node(file).kind, NodeKind::File(_)),
            "ICE: fileset child is not a file node"
        );
        self.files.push(file);
    }

    pub fn files(&self) -> &[NodeId] {
        &self.files
    }

    /// Files of kind `Src`, in fileset order.
    pub fn source_files(&self) -> Vec<NodeId> {
        self.files
            .iter()
            .copied()
            .filter(|&f| self.file_data(f).kind == FileKind::Src)
            .collect()
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    pub fn node(&self, id: NodeId) -> &Node {
        self.nodes.get(&id).expect("ICE: unknown node id")
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut Node {
        self.nodes.get_mut(&id).expect("ICE: unknown node id")
    }

    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.node(id).kind
    }

    pub fn span(&self, id: NodeId) -> SourceSpan {
        self.node(id).span
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.node(id).children
    }

    pub fn file_data(&self, file: NodeId) -> &FileData {
        match &self.node(file).kind {
            NodeKind::File(data) => data,
            _ => panic!("ICE: node is not a file"),
        }
    }

    pub fn template_data(&self, template: NodeId) -> &TemplateData {
        match &self.node(template).kind {
            NodeKind::Template(data) => data,
            _ => panic!("ICE: node is not a template"),
        }
    }

    pub fn template_data_mut(&mut self, template: NodeId) -> &mut TemplateData {
        match &mut self.node_mut(template).kind {
            NodeKind::Template(data) => data,
            _ => panic!("ICE: node is not a template"),
        }
    }

    /// Template children of a file, in declaration order.
    pub fn templates_of(&self, file: NodeId) -> Vec<NodeId> {
        self.children(file)
            .iter()
            .copied()
            .filter(|&c| matches!(self.node(c).kind, NodeKind::Template(_)))
            .collect()
    }

    /// The file that (transitively) contains this node.
    pub fn containing_file(&self, id: NodeId) -> NodeId {
        let mut cur = id;
        loop {
            if matches!(self.node(cur).kind, NodeKind::File(_)) {
                return cur;
            }
            cur = self.node(cur).parent.expect("ICE: node is not attached to a file");
        }
    }

    /// The template that contains this node, if any.
    pub fn containing_template(&self, id: NodeId) -> Option<NodeId> {
        let mut cur = Some(id);
        while let Some(c) = cur {
            if matches!(self.node(c).kind, NodeKind::Template(_)) {
                return Some(c);
            }
            cur = self.node(c).parent;
        }
        None
    }

    // --- structural edits; each repairs the parent back-reference ---

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        self.node_mut(child).parent = Some(parent);
        self.node_mut(parent).children.push(child);
    }

    pub fn insert_child(&mut self, parent: NodeId, index: usize, child: NodeId) {
        self.node_mut(child).parent = Some(parent);
        self.node_mut(parent).children.insert(index, child);
    }

    pub fn insert_children(&mut self, parent: NodeId, index: usize, children: &[NodeId]) {
        for (i, &child) in children.iter().enumerate() {
            self.insert_child(parent, index + i, child);
        }
    }

    pub fn child_index(&self, parent: NodeId, child: NodeId) -> Option<usize> {
        self.children(parent).iter().position(|&c| c == child)
    }

    /// Swap `new` into `old`'s slot. `old` is detached but stays in the
    /// arena; the caller decides whether to release it.
    pub fn replace_child(&mut self, parent: NodeId, old: NodeId, new: NodeId) {
        let index = self
            .child_index(parent, old)
            .expect("ICE: node is not a child of its parent");
        self.node_mut(parent).children[index] = new;
        self.node_mut(new).parent = Some(parent);
        self.node_mut(old).parent = None;
    }

    /// Detach a child from its parent's list. The subtree stays alive.
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) {
        self.node_mut(parent).children.retain(|&c| c != child);
        self.node_mut(child).parent = None;
    }

    /// Release a subtree: detach it if attached, then drop every node in
    /// it from the arena. Ids are retired, never reused.
    pub fn release_subtree(&mut self, id: NodeId) {
        if let Some(parent) = self.node(id).parent {
            self.remove_child(parent, id);
        }
        let mut stack = vec![id];
        while let Some(cur) = stack.pop() {
            if let Some(node) = self.nodes.remove(&cur) {
                stack.extend(node.children.iter().copied());
            }
        }
    }

    /// Replace a node with another of any kind; the parent's child slot
    /// is updated and the old subtree is released immediately.
    pub fn replace_node(&mut self, old: NodeId, new: NodeId) {
        let parent = self.node(old).parent.expect("ICE: cannot replace a detached node");
        self.replace_child(parent, old, new);
        self.release_subtree(old);
    }

    /// Replace a node with its own children, splicing them into the
    /// parent's child list at the node's position.
    pub fn replace_with_children(&mut self, id: NodeId) {
        let parent = self.node(id).parent.expect("ICE: cannot splice a detached node");
        let index = self
            .child_index(parent, id)
            .expect("ICE: node is not a child of its parent");
        let children = std::mem::take(&mut self.node_mut(id).children);
        self.node_mut(parent).children.remove(index);
        self.node_mut(id).parent = None;
        for (i, &child) in children.iter().enumerate() {
            self.insert_child(parent, index + i, child);
        }
        self.release_subtree(id);
    }

    /// Preorder (document order) ids of the subtree rooted at `root`.
    pub fn walk(&self, root: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        self.walk_into(root, &mut out);
        out
    }

    fn walk_into(&self, id: NodeId, out: &mut Vec<NodeId>) {
        out.push(id);
        for &child in self.children(id) {
            self.walk_into(child, out);
        }
    }

    /// Deep copy of a subtree. Every node in the clone, including the
    /// embedded expression nodes, gets a fresh id. The clone is detached.
    pub fn clone_subtree(&mut self, root: NodeId, id_gen: &mut NodeIdGen) -> NodeId {
        let (mut kind, span, children) = {
            let node = self.node(root);
            (node.kind.clone(), node.span, node.children.to_vec())
        };
        for expr in kind.exprs_mut() {
            let fresh = expr.clone_with_fresh_ids(id_gen);
            *expr = fresh;
        }
        let new_id = self.new_node(kind, span, id_gen);
        for child in children {
            let new_child = self.clone_subtree(child, id_gen);
            self.append_child(new_id, new_child);
        }
        new_id
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// All ids observable in the fileset: arena nodes plus embedded
    /// expression nodes.
    pub fn all_ids(&self) -> Vec<NodeId> {
        let mut ids = Vec::new();
        for &file in &self.files {
            for id in self.walk(file) {
                ids.push(id);
                for expr in self.node(id).kind.exprs() {
                    expr.for_each(&mut |e| ids.push(e.id));
                }
            }
        }
        ids
    }

    /// Validate that every node reachable from a file has a parent
    /// pointer consistent with its container. Panics on violation.
    pub fn check_parent_links(&self) {
        for &file in &self.files {
            for id in self.walk(file) {
                let node = self.node(id);
                for &child in node.children.iter() {
                    let child_parent = self.node(child).parent;
                    if child_parent != Some(id) {
                        panic!(
                            "ICE: parent link broken: node {} lists child {} whose parent is {:?}",
                            id, child, child_parent
                        );
                    }
                }
                if let Some(parent) = node.parent {
                    if self.child_index(parent, id).is_none() {
                        panic!(
                            "ICE: parent link broken: node {} claims parent {} which does not list it",
                            id, parent
                        );
                    }
                }
            }
        }
    }
}
