use crate::ast::Symbol;
use crate::source_manager::{SourceManager, SourceSpan};
use crate::types::SoyType;
use annotate_snippets::{AnnotationKind, Group, Level, Renderer, Snippet};
use serde::Serialize;

/// Diagnostic severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DiagnosticLevel {
    Error,
    Warning,
    Note,
}

/// Individual diagnostic with its source location
#[derive(Debug, Clone, Serialize)]
pub struct Diagnostic {
    pub level: DiagnosticLevel,
    pub message: String,
    pub location: SourceSpan,
}

/// Semantic errors raised by compiler passes.
///
/// Every variant carries its positional parameters; the reported message
/// is built from the declared template of the kind.
#[derive(Debug, Clone, thiserror::Error)]
pub enum SemanticError {
    #[error("Unknown variable '${0}'.")]
    UndefinedVariable(Symbol),
    #[error("Template '{0}' already defined.")]
    DuplicateTemplate(Symbol),
    #[error("Param '{0}' is a duplicate of prop var '{0}'.")]
    DuplicateDeclaration(Symbol),
    #[error("Attribute '{0}' is not allowed on elements.")]
    BannedAttribute(Symbol),
    #[error("Unknown global '{0}'.")]
    UnknownGlobal(Symbol),
    #[error("v1 expression support is disabled: {0}.")]
    V1ExpressionNotAllowed(String),
    #[error("Type mismatch: expected {expected}, found {found}.")]
    TypeMismatch { expected: SoyType, found: SoyType },
    #[error("Operands of '{op}' have incompatible types {left} and {right}.")]
    IncompatibleOperands { op: &'static str, left: SoyType, right: SoyType },
    #[error("Unknown type '{0}'.")]
    UnknownType(Symbol),
    #[error("Unknown logging element '{0}'.")]
    UnknownLoggingElement(Symbol),
    #[error("Call to unknown template '{0}'.")]
    UnknownTemplate(Symbol),
    #[error("Param '{0}' is not declared by template '{1}'.")]
    UndeclaredCallParam(Symbol, Symbol),
    #[error("Required param '{0}' of template '{1}' is not passed.")]
    MissingRequiredParam(Symbol, Symbol),
    #[error("Template '{0}' has private visibility.")]
    CallToPrivateTemplate(Symbol),
    #[error("Delegate '{0}' has multiple implementations with equal priority.")]
    DuplicateDelegate(Symbol),
    #[error("Call to template '{0}' defined in an indirect dependency.")]
    IndirectDependencyCall(Symbol),
    #[error("Conformance violation: {0}.")]
    Conformance(String),
    #[error("Template is not strict autoescaping.")]
    NonStrictTemplate,
    #[error("Unexpected close tag '</{0}>'.")]
    UnexpectedCloseTag(Symbol),
    #[error("Unclosed tag '<{0}>'.")]
    UnclosedTag(Symbol),
    #[error("Close tag for void element '{0}'.")]
    CloseTagForVoidElement(Symbol),
    #[error("HTML value printed in attribute value context.")]
    BadContextualUsage,
}

/// An opaque position in the diagnostic stream. Taken with
/// [`ErrorReporter::checkpoint`] and consumed by
/// [`ErrorReporter::errors_since`].
#[derive(Debug, Clone, Copy)]
pub struct Checkpoint(usize);

/// Accumulates diagnostics from all passes, in insertion order.
///
/// Passes never abort on user errors: they report and continue. The
/// exploding variant is for subroutines that must not produce user
/// errors at all; it fails the process on the first report.
pub struct ErrorReporter {
    diagnostics: Vec<Diagnostic>,
    explode: bool,
}

impl Default for ErrorReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl ErrorReporter {
    pub fn new() -> Self {
        ErrorReporter {
            diagnostics: Vec::new(),
            explode: false,
        }
    }

    /// A reporter that panics on the first report. Used inside passes to
    /// assert the absence of errors during their own subroutines.
    pub fn exploding() -> Self {
        ErrorReporter {
            diagnostics: Vec::new(),
            explode: true,
        }
    }

    pub fn report(&mut self, error: SemanticError, location: SourceSpan) {
        if self.explode {
            panic!("ICE: unexpected error reported: {} at {}", error, location);
        }
        self.diagnostics.push(Diagnostic {
            level: DiagnosticLevel::Error,
            message: error.to_string(),
            location,
        });
    }

    pub fn report_warning(&mut self, message: String, location: SourceSpan) {
        if self.explode {
            panic!("ICE: unexpected warning reported: {} at {}", message, location);
        }
        self.diagnostics.push(Diagnostic {
            level: DiagnosticLevel::Warning,
            message,
            location,
        });
    }

    /// Take an opaque marker for the current end of the stream.
    pub fn checkpoint(&self) -> Checkpoint {
        Checkpoint(self.diagnostics.len())
    }

    /// Count of errors reported since the marker was taken.
    pub fn errors_since(&self, checkpoint: Checkpoint) -> usize {
        self.diagnostics[checkpoint.0..]
            .iter()
            .filter(|d| d.level == DiagnosticLevel::Error)
            .count()
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(|d| d.level == DiagnosticLevel::Error)
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }
}

/// Configurable diagnostic formatter using annotate_snippets
pub struct ErrorFormatter {
    pub show_source: bool,
    pub use_colors: bool,
}

impl Default for ErrorFormatter {
    fn default() -> Self {
        ErrorFormatter {
            show_source: true,
            use_colors: true,
        }
    }
}

impl ErrorFormatter {
    /// Format a single diagnostic with source context
    pub fn format_diagnostic(&self, diag: &Diagnostic, source_manager: &SourceManager) -> String {
        let renderer = if self.use_colors {
            Renderer::styled()
        } else {
            Renderer::plain()
        };

        let title = self.level(diag).primary_title(&diag.message);
        let group = if self.show_source {
            title.element(self.create_snippet(diag, source_manager))
        } else {
            Group::with_title(title)
        };

        let report = &[group];
        renderer.render(report).to_string()
    }

    fn level<'a>(&self, diag: &Diagnostic) -> Level<'a> {
        match diag.level {
            DiagnosticLevel::Error => Level::ERROR,
            DiagnosticLevel::Warning => Level::WARNING,
            DiagnosticLevel::Note => Level::NOTE,
        }
    }

    fn create_snippet<'a>(
        &self,
        diag: &'a Diagnostic,
        source_manager: &'a SourceManager,
    ) -> Snippet<'a, annotate_snippets::Annotation<'a>> {
        let source = source_manager.get_source(diag.location.source_id()).unwrap_or("");
        let path = source_manager
            .get_path(diag.location.source_id())
            .unwrap_or("<unknown>");

        Snippet::source(source).line_start(1).path(path).annotation(
            AnnotationKind::Primary
                .span(diag.location.start().offset() as usize..diag.location.end().offset() as usize),
        )
    }

    /// Format multiple diagnostics
    pub fn format_diagnostics(&self, diagnostics: &[Diagnostic], source_manager: &SourceManager) -> String {
        diagnostics
            .iter()
            .map(|diag| self.format_diagnostic(diag, source_manager))
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// Print all diagnostics to stderr
    pub fn print_diagnostics(&self, diagnostics: &[Diagnostic], source_manager: &SourceManager) {
        for diag in diagnostics {
            eprintln!("{}", self.format_diagnostic(diag, source_manager));
        }
    }
}
