//! Compiler passes and the pass manager.
//!
//! A pass is the uniform unit of work over the AST. File passes run on
//! one source file at a time during phase one; fileset passes run once
//! per build with the template registry during phase two. Passes report
//! user errors into the shared sink and keep going; only a fileset pass
//! returning [`PassResult::Stop`] terminates the pipeline early.
//!
//! Passes keep no per-file state between invocations, so a phase-one
//! loop may be sharded across workers if the id generator and reporter
//! are made concurrency-safe.

use crate::ast::{FileSetNode, NodeId, NodeIdGen};
use crate::diagnostic::ErrorReporter;
use crate::registry::TemplateRegistry;

pub mod autoescape;
pub mod conformance;
pub mod cross_template;
pub mod debug_attributes;
pub mod desugar_html;
pub mod globals;
pub mod html_rewrite;
pub mod manager;
pub mod msg_placeholders;
pub mod optimize;
pub mod raw_text;
pub mod resolve_names;
pub mod resolve_types;
pub mod soy_element;
pub mod strict_html;
pub mod velog;

pub use manager::{PassManager, PassManagerBuilder, PassManagerError};

/// Collaborators handed to every pass invocation. Threaded explicitly;
/// there is no global state.
pub struct PassCx<'a> {
    pub id_gen: &'a mut NodeIdGen,
    pub reporter: &'a mut ErrorReporter,
}

/// Returned by fileset passes. `Stop` terminates the pipeline after the
/// current pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassResult {
    Continue,
    Stop,
}

/// Pass continuation rules.
///
/// These rules are used when running compiler passes. You can stop
/// compilation either before or after a pass. By default, compilation
/// continues after each pass without stopping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassContinuationRule {
    Continue,
    StopBeforePass,
    StopAfterPass,
}

/// A pass over a single source file.
pub trait CompilerFilePass {
    /// Stable short identifier used by continuation rules.
    fn name(&self) -> &'static str;

    fn run(&self, tree: &mut FileSetNode, file: NodeId, cx: &mut PassCx<'_>);
}

/// A pass over the whole fileset, with access to the template registry.
pub trait CompilerFileSetPass {
    /// Stable short identifier used by continuation rules.
    fn name(&self) -> &'static str;

    fn run(&self, tree: &mut FileSetNode, registry: &mut TemplateRegistry, cx: &mut PassCx<'_>) -> PassResult;

    /// True for passes allowed to add templates through the registry's
    /// synthetic channel.
    fn synthesizes_templates(&self) -> bool {
        false
    }
}
