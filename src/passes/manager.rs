//! Pass manager: assembles the pipeline from configuration, applies
//! continuation rules and drives the two phases.
//!
//! Phase one runs the single-file passes over each source file; phase
//! two builds the template registry and runs the fileset passes. A
//! STOP_AFTER_PASS rule is normalized into STOP_BEFORE_PASS on the
//! following pass at build time, so the run loops only ever check one
//! rule kind. If the pipeline stops during phase one, phase two is
//! skipped but a registry is still built and returned so callers can
//! introspect parse-level results.

use hashbrown::HashMap;
use indexmap::IndexMap;
use log::debug;

use crate::ast::{FileKind, FileSetNode, NodeId, NodeIdGen};
use crate::diagnostic::ErrorReporter;
use crate::options::{CompilerOptions, ValidatedConformanceConfig, ValidatedLoggingConfig};
use crate::passes::autoescape::{AssertStrictAutoescapingPass, AutoescaperPass, CheckBadContextualUsagePass};
use crate::passes::conformance::SoyConformancePass;
use crate::passes::cross_template::{
    CheckDelegatesPass, CheckTemplateCallsPass, CheckTemplateVisibilityPass, StrictDepsPass,
};
use crate::passes::debug_attributes::AddDebugAttributesPass;
use crate::passes::desugar_html::DesugarHtmlNodesPass;
use crate::passes::globals::{CheckGlobalsPass, RewriteGlobalsPass, V1ExpressionPass};
use crate::passes::html_rewrite::HtmlRewritePass;
use crate::passes::msg_placeholders::InsertMsgPlaceholdersPass;
use crate::passes::optimize::OptimizationPass;
use crate::passes::raw_text::CombineConsecutiveRawTextNodesPass;
use crate::passes::resolve_names::ResolveNamesPass;
use crate::passes::resolve_types::{CheckDeclaredTypesPass, ResolveExpressionTypesPass};
use crate::passes::soy_element::SoyElementPass;
use crate::passes::strict_html::{StrictHtmlValidationNewMatcherPass, StrictHtmlValidationPass};
use crate::passes::velog::VeLogValidationPass;
use crate::passes::{
    CompilerFilePass, CompilerFileSetPass, PassContinuationRule, PassCx, PassResult,
};
use crate::registry::TemplateRegistry;
use crate::types::TypeRegistry;

#[derive(Debug, thiserror::Error)]
pub enum PassManagerError {
    #[error("pass continuation rule names unknown pass '{0}'")]
    UnknownPass(String),
}

pub struct PassManager {
    single_file_passes: Vec<Box<dyn CompilerFilePass>>,
    fileset_passes: Vec<Box<dyn CompilerFileSetPass>>,
    /// Normalized at build time: holds only STOP_BEFORE_PASS rules.
    continuation_registry: HashMap<String, PassContinuationRule>,
    stopped: bool,
}

impl PassManager {
    pub fn builder() -> PassManagerBuilder {
        PassManagerBuilder::new()
    }

    /// Drive both phases: single-file passes over every source file,
    /// then the fileset passes. Returns the template registry for the
    /// backend.
    pub fn run(
        &mut self,
        tree: &mut FileSetNode,
        id_gen: &mut NodeIdGen,
        reporter: &mut ErrorReporter,
    ) -> TemplateRegistry {
        for file in tree.files().to_vec() {
            self.run_single_file_passes(tree, file, id_gen, reporter);
        }
        self.run_fileset_passes(tree, id_gen, reporter)
    }

    /// Phase one for a single file. Non-source files are skipped
    /// entirely.
    pub fn run_single_file_passes(
        &mut self,
        tree: &mut FileSetNode,
        file: NodeId,
        id_gen: &mut NodeIdGen,
        reporter: &mut ErrorReporter,
    ) {
        if self.stopped {
            return;
        }
        if tree.file_data(file).kind != FileKind::Src {
            return;
        }
        for i in 0..self.single_file_passes.len() {
            let name = self.single_file_passes[i].name();
            if self.stop_before(name) {
                self.stopped = true;
                break;
            }
            debug!("running file pass {} on {}", name, tree.file_data(file).path);
            let mut cx = PassCx {
                id_gen: &mut *id_gen,
                reporter: &mut *reporter,
            };
            self.single_file_passes[i].run(tree, file, &mut cx);
        }
    }

    /// Phase two. The registry is built from whatever templates were
    /// parsed and returned even when the pipeline has stopped.
    pub fn run_fileset_passes(
        &mut self,
        tree: &mut FileSetNode,
        id_gen: &mut NodeIdGen,
        reporter: &mut ErrorReporter,
    ) -> TemplateRegistry {
        let mut registry = TemplateRegistry::new(tree, reporter);
        if self.stopped {
            return registry;
        }

        for i in 0..self.fileset_passes.len() {
            let name = self.fileset_passes[i].name();
            if self.stop_before(name) {
                self.stopped = true;
            } else {
                debug!("running fileset pass {}", name);
                let count_before = registry.template_count();
                let mut cx = PassCx {
                    id_gen: &mut *id_gen,
                    reporter: &mut *reporter,
                };
                let result = self.fileset_passes[i].run(tree, &mut registry, &mut cx);
                if !self.fileset_passes[i].synthesizes_templates() {
                    debug_assert_eq!(
                        count_before,
                        registry.template_count(),
                        "ICE: pass {} mutated the template registry",
                        name
                    );
                }
                self.stopped = result == PassResult::Stop;
            }
            if self.stopped {
                break;
            }
        }
        registry
    }

    fn stop_before(&self, name: &str) -> bool {
        matches!(
            self.continuation_registry.get(name),
            Some(PassContinuationRule::StopBeforePass)
        )
    }

    /// Assemble a manager from explicit pass lists, bypassing the
    /// builder. Test-only.
    #[cfg(test)]
    pub(crate) fn with_passes(
        single_file_passes: Vec<Box<dyn CompilerFilePass>>,
        fileset_passes: Vec<Box<dyn CompilerFileSetPass>>,
    ) -> Self {
        PassManager {
            single_file_passes,
            fileset_passes,
            continuation_registry: HashMap::new(),
            stopped: false,
        }
    }
}

/// A builder for configuring the pass manager.
pub struct PassManagerBuilder {
    options: CompilerOptions,
    conformance_config: ValidatedConformanceConfig,
    logging_config: ValidatedLoggingConfig,
    type_registry: TypeRegistry,
    continuation_rules: IndexMap<String, PassContinuationRule>,
}

impl Default for PassManagerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl PassManagerBuilder {
    pub fn new() -> Self {
        PassManagerBuilder {
            options: CompilerOptions::default(),
            conformance_config: ValidatedConformanceConfig::empty(),
            logging_config: ValidatedLoggingConfig::empty(),
            type_registry: TypeRegistry::new(),
            continuation_rules: IndexMap::new(),
        }
    }

    pub fn options(mut self, options: CompilerOptions) -> Self {
        self.options = options;
        self
    }

    pub fn conformance_config(mut self, config: ValidatedConformanceConfig) -> Self {
        self.conformance_config = config;
        self
    }

    pub fn logging_config(mut self, config: ValidatedLoggingConfig) -> Self {
        self.logging_config = config;
        self
    }

    pub fn type_registry(mut self, registry: TypeRegistry) -> Self {
        self.type_registry = registry;
        self
    }

    /// Registers a pass continuation rule. Overwrites any previously
    /// registered rule for the same pass.
    pub fn add_pass_continuation_rule(mut self, pass_name: &str, rule: PassContinuationRule) -> Self {
        self.continuation_rules.insert(pass_name.to_string(), rule);
        self
    }

    pub fn build(self) -> Result<PassManager, PassManagerError> {
        let opts = &self.options;

        let mut single: Vec<Box<dyn CompilerFilePass>> = Vec::new();
        single.push(Box::new(HtmlRewritePass));
        // Conformance reads the rewritten html nodes, so it runs after
        // HtmlRewrite.
        single.push(Box::new(SoyConformancePass {
            config: self.conformance_config.clone(),
        }));
        // Needs the html tag nodes for placeholder naming.
        single.push(Box::new(InsertMsgPlaceholdersPass));
        single.push(Box::new(RewriteGlobalsPass {
            globals: opts.compile_time_globals.clone(),
        }));
        // Needs to be before ResolveNames.
        single.push(Box::new(V1ExpressionPass {
            allowed: opts.allow_v1_expression,
        }));
        single.push(Box::new(ResolveNamesPass));
        if opts.has_experimental_feature("new_html_matcher") {
            single.push(Box::new(StrictHtmlValidationNewMatcherPass));
        } else {
            single.push(Box::new(StrictHtmlValidationPass));
        }
        if opts.add_html_attributes_for_debugging {
            // After placeholder insertion (keeps generated names stable)
            // and before type resolution (it inserts nodes).
            single.push(Box::new(AddDebugAttributesPass));
        }
        if !opts.disable_all_type_checking {
            single.push(Box::new(CheckDeclaredTypesPass {
                types: self.type_registry.clone(),
            }));
            single.push(Box::new(ResolveExpressionTypesPass {
                types: self.type_registry.clone(),
            }));
            single.push(Box::new(VeLogValidationPass {
                config: self.logging_config.clone(),
            }));
        }
        if !opts.allow_unknown_globals {
            // Must come after RewriteGlobals, when values are
            // substituted.
            single.push(Box::new(CheckGlobalsPass));
        }
        if opts.strict_autoescaping_required {
            single.push(Box::new(AssertStrictAutoescapingPass));
        }
        single.push(Box::new(SoyElementPass));

        let mut fileset: Vec<Box<dyn CompilerFileSetPass>> = Vec::new();
        if !opts.disable_all_type_checking {
            fileset.push(Box::new(CheckTemplateCallsPass {
                types: self.type_registry.clone(),
            }));
        }
        fileset.push(Box::new(CheckTemplateVisibilityPass));
        fileset.push(Box::new(CheckDelegatesPass));
        if opts.allow_external_calls == Some(false) {
            fileset.push(Box::new(StrictDepsPass));
        }
        // The rewrites above fragment raw text; merge before the
        // autoescaper walks the tree.
        fileset.push(Box::new(CombineConsecutiveRawTextNodesPass));
        if opts.autoescaper_enabled {
            fileset.push(Box::new(AutoescaperPass));
            if !opts.disable_all_type_checking {
                fileset.push(Box::new(CheckBadContextualUsagePass));
            }
        }
        if opts.desugar_html_nodes {
            fileset.push(Box::new(DesugarHtmlNodesPass));
        }
        if opts.optimize {
            fileset.push(Box::new(OptimizationPass));
        }
        // Desugaring and optimization may fragment text again; stitch
        // it back together last.
        fileset.push(Box::new(CombineConsecutiveRawTextNodesPass));

        let continuation_registry =
            normalize_continuation_rules(self.continuation_rules, &single, &fileset)?;

        Ok(PassManager {
            single_file_passes: single,
            fileset_passes: fileset,
            continuation_registry,
            stopped: false,
        })
    }
}

/// Transform all the STOP_AFTER rules into STOP_BEFORE_PASS on the
/// following pass, dropping CONTINUE rules and STOP_AFTER on the final
/// pass. A rule naming a pass outside the assembled pipeline fails
/// construction.
pub(crate) fn normalize_continuation_rules(
    rules: IndexMap<String, PassContinuationRule>,
    single: &[Box<dyn CompilerFilePass>],
    fileset: &[Box<dyn CompilerFileSetPass>],
) -> Result<HashMap<String, PassContinuationRule>, PassManagerError> {
    let names: Vec<&'static str> = single
        .iter()
        .map(|p| p.name())
        .chain(fileset.iter().map(|p| p.name()))
        .collect();

    let mut normalized = HashMap::new();
    for (pass_name, rule) in rules {
        match rule {
            PassContinuationRule::Continue => {}
            PassContinuationRule::StopBeforePass => {
                if !names.iter().any(|n| *n == pass_name) {
                    return Err(PassManagerError::UnknownPass(pass_name));
                }
                normalized.insert(pass_name, PassContinuationRule::StopBeforePass);
            }
            PassContinuationRule::StopAfterPass => {
                let index = names
                    .iter()
                    .position(|n| *n == pass_name)
                    .ok_or(PassManagerError::UnknownPass(pass_name))?;
                // STOP_AFTER on the last pass is a no-op.
                if index + 1 < names.len() {
                    normalized.insert(names[index + 1].to_string(), PassContinuationRule::StopBeforePass);
                }
            }
        }
    }
    Ok(normalized)
}
