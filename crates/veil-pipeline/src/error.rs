//! The pipeline's own error type.
//!
//! Every stage already reports failures as a [`Diagnostic`]; `PipelineError`
//! only adds which stage produced it, so a caller driving a batch of source
//! units can tell "this unit's resolver failed" from "this unit's type
//! checker failed" without re-deriving it from the `ErrorKind`.

use std::fmt;

use veil_base::Diagnostic;

/// Which pipeline stage a [`PipelineError`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Resolve,
    CheckReturns,
    HybridDetection,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Stage::Resolve => "resolve",
            Stage::CheckReturns => "check-returns",
            Stage::HybridDetection => "hybrid-detection",
        };
        f.write_str(s)
    }
}

/// A stage failure: the stage that raised it plus the underlying diagnostic.
#[derive(Debug, Clone)]
pub struct PipelineError {
    pub stage: Stage,
    pub diagnostic: Diagnostic,
}

impl PipelineError {
    pub fn new(stage: Stage, diagnostic: Diagnostic) -> Self {
        PipelineError { stage, diagnostic }
    }
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.stage, self.diagnostic)
    }
}

impl std::error::Error for PipelineError {}

#[cfg(test)]
mod tests {
    use super::*;
    use veil_base::{ErrorKind, Span};

    #[test]
    fn display_prefixes_the_diagnostic_with_its_stage() {
        let err = PipelineError::new(
            Stage::Resolve,
            Diagnostic::new(ErrorKind::UnknownIdentifier, "no such name", Span::new(0, 1)),
        );
        let s = err.to_string();
        assert!(s.starts_with("[resolve]"));
        assert!(s.contains("no such name"));
    }
}
