//! Template registry: the cross-template index built between the
//! single-file and fileset pass phases.
//!
//! The registry is constructed once from the fileset and is read-only
//! for most passes. The only sanctioned mutation is the synthetic
//! template channel: a producing pass calls [`TemplateRegistry::add_synthetic`]
//! and then [`TemplateRegistry::reindex`] before dependent passes
//! observe the new templates.

use indexmap::IndexMap;

use crate::ast::{intern, FileSetNode, NodeId, Symbol, TemplateKind};
use crate::diagnostic::{ErrorReporter, SemanticError};

/// Identity of one delegate group bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DelTemplateKey {
    pub name: Symbol,
    pub variant: Option<Symbol>,
}

#[derive(Debug, Clone, Copy)]
pub struct DelegateEntry {
    pub template: NodeId,
    pub priority: u32,
}

#[derive(Debug, Default)]
pub struct TemplateRegistry {
    /// Basic (regular and element) templates by fully-qualified name.
    /// Insertion order follows file order, then in-file order.
    basic: IndexMap<Symbol, NodeId>,
    /// Delegate candidates per (name, variant), sorted by priority
    /// descending.
    delegates: IndexMap<DelTemplateKey, Vec<DelegateEntry>>,
    /// Templates queued through the synthetic channel, merged on the
    /// next reindex.
    pending_synthetic: Vec<NodeId>,
}

impl TemplateRegistry {
    /// Walk all files of the fileset and record every template.
    /// Duplicate fully-qualified names are reported at the second
    /// occurrence; the first one wins.
    pub fn new(tree: &FileSetNode, reporter: &mut ErrorReporter) -> Self {
        let mut registry = TemplateRegistry::default();
        for &file in tree.files() {
            for template in tree.templates_of(file) {
                registry.register(tree, template, reporter);
            }
        }
        registry.sort_delegates();
        registry
    }

    fn register(&mut self, tree: &FileSetNode, template: NodeId, reporter: &mut ErrorReporter) {
        let data = tree.template_data(template);
        match &data.kind {
            TemplateKind::Delegate {
                del_name,
                variant,
                priority,
            } => {
                let key = DelTemplateKey {
                    name: *del_name,
                    variant: *variant,
                };
                self.delegates.entry(key).or_default().push(DelegateEntry {
                    template,
                    priority: *priority,
                });
            }
            TemplateKind::Regular | TemplateKind::Element => {
                if self.basic.contains_key(&data.name) {
                    reporter.report(SemanticError::DuplicateTemplate(data.name), tree.span(template));
                } else {
                    self.basic.insert(data.name, template);
                }
            }
        }
    }

    fn sort_delegates(&mut self) {
        for entries in self.delegates.values_mut() {
            entries.sort_by(|a, b| b.priority.cmp(&a.priority));
        }
    }

    pub fn basic_template(&self, name: Symbol) -> Option<NodeId> {
        self.basic.get(&name).copied()
    }

    pub fn basic_templates(&self) -> impl Iterator<Item = (Symbol, NodeId)> + '_ {
        self.basic.iter().map(|(name, id)| (*name, *id))
    }

    /// Candidates for a delegate key, ordered by declared priority.
    pub fn delegate_candidates(&self, name: Symbol, variant: Option<Symbol>) -> &[DelegateEntry] {
        self.delegates
            .get(&DelTemplateKey { name, variant })
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// The raw delegate set for a name, across all variants, in
    /// registration order.
    pub fn delegates_by_name(&self, name: Symbol) -> Vec<DelegateEntry> {
        self.delegates
            .iter()
            .filter(|(key, _)| key.name == name)
            .flat_map(|(_, entries)| entries.iter().copied())
            .collect()
    }

    pub fn delegate_groups(&self) -> impl Iterator<Item = (&DelTemplateKey, &[DelegateEntry])> {
        self.delegates.iter().map(|(key, entries)| (key, entries.as_slice()))
    }

    /// Resolve a partial name (leading dot) through a file namespace.
    pub fn resolve_partial(namespace: Symbol, partial: Symbol) -> Symbol {
        intern(&format!("{}{}", namespace, partial))
    }

    /// Total number of registered templates, pending synthetics
    /// included. Used by the manager to assert that non-producing
    /// passes leave the registry alone.
    pub fn template_count(&self) -> usize {
        self.basic.len() + self.delegates.values().map(Vec::len).sum::<usize>() + self.pending_synthetic.len()
    }

    /// Queue a template synthesized by a producing fileset pass. Not
    /// observable by lookups until [`TemplateRegistry::reindex`] runs.
    pub fn add_synthetic(&mut self, template: NodeId) {
        self.pending_synthetic.push(template);
    }

    /// Merge pending synthetic templates into the index.
    pub fn reindex(&mut self, tree: &FileSetNode, reporter: &mut ErrorReporter) {
        let pending = std::mem::take(&mut self.pending_synthetic);
        for template in pending {
            self.register(tree, template, reporter);
        }
        self.sort_delegates();
    }
}
