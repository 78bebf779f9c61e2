//! Merges runs of consecutive raw-text siblings into one node.
//!
//! The first node of a run absorbs the rest in place, so its id is
//! stable; the merged span covers the first through last node. This
//! pass runs last in the fileset phase (and once mid-phase, before the
//! autoescaper) because several rewrites fragment text.

use crate::ast::{FileSetNode, NodeId, NodeKind};
use crate::passes::{CompilerFileSetPass, PassCx, PassResult};
use crate::registry::TemplateRegistry;

pub struct CombineConsecutiveRawTextNodesPass;

impl CompilerFileSetPass for CombineConsecutiveRawTextNodesPass {
    fn name(&self) -> &'static str {
        "CombineConsecutiveRawText"
    }

    fn run(&self, tree: &mut FileSetNode, _registry: &mut TemplateRegistry, _cx: &mut PassCx<'_>) -> PassResult {
        for file in tree.source_files() {
            for parent in tree.walk(file) {
                if !tree.contains(parent) {
                    continue;
                }
                combine_children(tree, parent);
            }
        }
        PassResult::Continue
    }
}

fn combine_children(tree: &mut FileSetNode, parent: NodeId) {
    let children = tree.children(parent).to_vec();
    let mut run: Vec<NodeId> = Vec::new();
    for child in children {
        if tree.kind(child).is_raw_text() {
            run.push(child);
        } else {
            flush_run(tree, &run);
            run.clear();
        }
    }
    flush_run(tree, &run);
}

fn flush_run(tree: &mut FileSetNode, run: &[NodeId]) {
    if run.len() < 2 {
        return;
    }
    let mut text = String::new();
    let mut span = tree.span(run[0]);
    for &id in run {
        match tree.kind(id) {
            NodeKind::RawText(data) => text.push_str(&data.text),
            _ => unreachable!(),
        }
        span = span.merge(tree.span(id));
    }

    let first = run[0];
    match &mut tree.node_mut(first).kind {
        NodeKind::RawText(data) => data.text = text,
        _ => unreachable!(),
    }
    tree.node_mut(first).span = span;

    for &rest in &run[1..] {
        tree.release_subtree(rest);
    }
}
