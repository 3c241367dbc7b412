#![cfg_attr(docsrs, feature(doc_cfg))]

//! # veil-pipeline
//!
//! Orchestrates the passes in `veil-ast` and `veil-analysis` into a single
//! run: set parents → resolve identifiers → check returns → analyze aliases
//! → check types → detect hybrid functions. Parsing itself is out of scope
//! (the caller hands this crate an already-built [`Ast`]); everything from
//! there on is ours.
//!
//! [`PipelineOptions`] lets a caller skip stages — an IDE running only
//! parent-setting and resolution for autocomplete has no use for a full type
//! check — but the toggles only ever skip work, never reorder it, and
//! [`run`] enforces that dependency order itself: type checking never runs
//! without alias analysis first, regardless of what the caller asked for.
//!
//! [`run_batch`] drives a batch of units and keeps going after one fails,
//! the same fail-fast-per-unit, continue-across-units behavior as a driver
//! iterating many source files one at a time.

pub mod config;
pub mod error;

pub use config::Config;
pub use error::{PipelineError, Stage};

use veil_ast::Ast;
use veil_base::{Diagnostic, Interner};

/// Which stages of [`run`] to execute.
///
/// All `true` by default. Setting an earlier stage to `false` implicitly
/// disables every stage that depends on it — see [`run`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineOptions {
    pub set_parents: bool,
    pub resolve: bool,
    pub check_returns: bool,
    pub alias_analysis: bool,
    pub type_check: bool,
    pub hybrid_detection: bool,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        PipelineOptions {
            set_parents: true,
            resolve: true,
            check_returns: true,
            alias_analysis: true,
            type_check: true,
            hybrid_detection: true,
        }
    }
}

/// The outcome of running the pipeline over one source unit.
#[derive(Debug, Default)]
pub struct UnitResult {
    /// Set if `set_parents`, `resolve`, `check_returns`, or
    /// `hybrid_detection` raised a fatal error — at most one of these ever
    /// fires, since each stage aborts the rest of the run for this unit.
    pub fatal: Option<PipelineError>,
    /// Every diagnostic the type checker produced. Non-fatal: the checker
    /// always finishes the whole AST and reports everything it found.
    pub type_diagnostics: Vec<Diagnostic>,
}

impl UnitResult {
    pub fn is_ok(&self) -> bool {
        self.fatal.is_none() && self.type_diagnostics.is_empty()
    }
}

/// Runs the enabled stages over `ast`, in dependency order, stopping at the
/// first fatal error.
///
/// A stage that depends on one the caller disabled is silently skipped too:
/// `type_check` never runs unless `alias_analysis` did, and `alias_analysis`
/// here unconditionally requires `resolve` and `check_returns` to have run
/// first, since the type checker reads bindings the resolver produced.
pub fn run(ast: &mut Ast, interner: &mut Interner, config: Config, options: PipelineOptions) -> UnitResult {
    let mut result = UnitResult::default();

    if options.set_parents {
        log::debug!("set_parents");
        veil_ast::set_parents(ast);
    } else {
        log::debug!("set_parents skipped");
    }

    let resolved = options.resolve && options.set_parents;
    if resolved {
        log::debug!("resolve");
        if let Err(d) = veil_ast::resolve(ast, interner) {
            log::warn!("resolve failed: {}", d);
            result.fatal = Some(PipelineError::new(Stage::Resolve, d));
            return result;
        }
    } else if options.resolve {
        log::debug!("resolve skipped: set_parents did not run");
    }

    if options.check_returns {
        log::debug!("check_returns");
        if let Err(d) = veil_ast::check_returns(ast) {
            log::warn!("check_returns failed: {}", d);
            result.fatal = Some(PipelineError::new(Stage::CheckReturns, d));
            return result;
        }
    }

    let aliased = options.alias_analysis && resolved && options.check_returns;
    if aliased {
        log::debug!("alias_analysis");
        veil_analysis::analyze_aliases(ast);
    } else if options.alias_analysis {
        log::debug!("alias_analysis skipped: resolve/check_returns did not both run");
    }

    if options.type_check && aliased {
        log::debug!("type_check");
        let diagnostics = veil_analysis::check_types(ast, config.uint_width);
        if !diagnostics.is_empty() {
            log::warn!("type_check found {} diagnostic(s)", diagnostics.len());
        }
        result.type_diagnostics = diagnostics;
    } else if options.type_check {
        log::debug!("type_check skipped: alias_analysis did not run");
    }

    let type_checked = options.type_check && aliased;
    if options.hybrid_detection && type_checked {
        log::debug!("hybrid_detection");
        if let Err(d) = veil_analysis::detect_hybrid_functions(ast) {
            log::warn!("hybrid_detection failed: {}", d);
            if config.reject_non_inlineable_recursion {
                result.fatal = Some(PipelineError::new(Stage::HybridDetection, d));
                return result;
            }
            log::debug!("non-inlineable recursion recorded but not rejected by config");
        }
    } else if options.hybrid_detection {
        log::debug!("hybrid_detection skipped: type_check did not run");
    }

    result
}

/// One source unit's [`Ast`] plus the [`Interner`] it was built against.
pub struct Unit<'a> {
    pub ast: &'a mut Ast,
    pub interner: &'a mut Interner,
}

/// Runs [`run`] over every unit in `units`, in order. A unit that fails does
/// not stop the batch — the next unit still runs with a fresh result.
pub fn run_batch(units: &mut [Unit<'_>], config: Config, options: PipelineOptions) -> Vec<UnitResult> {
    let mut results = Vec::with_capacity(units.len());
    for (i, unit) in units.iter_mut().enumerate() {
        log::debug!("running pipeline on unit {}", i);
        let result = run(unit.ast, unit.interner, config, options);
        if !result.is_ok() {
            log::warn!("unit {} finished with errors, continuing to next unit", i);
        }
        results.push(result);
    }
    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use veil_ast::{Ast, Constructor, Contract, Node, SourceUnit};
    use veil_base::Span;

    fn empty_contract(ast: &mut Ast, interner: &mut Interner) {
        let name = interner.intern("C");
        let ctor = ast.alloc(
            Node::Constructor(Constructor {
                params: vec![],
                body: ast.alloc(Node::Stmt(veil_ast::Stmt::Block(vec![])), Span::new(0, 1)),
                is_recursive: false,
                requires_verification: false,
                called_functions: vec![],
            }),
            Span::new(0, 1),
        );
        let contract = ast.alloc(
            Node::Contract(Contract {
                name,
                state_vars: vec![],
                constructor: Some(ctor),
                functions: vec![],
            }),
            Span::new(0, 1),
        );
        let unit = ast.alloc(Node::SourceUnit(SourceUnit { contracts: vec![contract] }), Span::new(0, 1));
        ast.root = Some(unit);
    }

    #[test]
    fn empty_contract_runs_the_full_pipeline_cleanly() {
        let mut ast = Ast::new();
        let mut interner = Interner::new();
        empty_contract(&mut ast, &mut interner);

        let result = run(&mut ast, &mut interner, Config::default(), PipelineOptions::default());
        assert!(result.is_ok());
    }

    #[test]
    fn disabling_set_parents_also_skips_resolve() {
        let mut ast = Ast::new();
        let mut interner = Interner::new();
        empty_contract(&mut ast, &mut interner);

        let options = PipelineOptions { set_parents: false, ..PipelineOptions::default() };
        let result = run(&mut ast, &mut interner, Config::default(), options);
        // Resolve never ran, so parents are never set either; nothing downstream
        // of resolve/alias/type-check can have run, but none of that is fatal
        // on an empty contract, so the unit still reports ok.
        assert!(result.is_ok());
    }

    #[test]
    fn unresolved_identifier_is_reported_as_a_resolve_stage_error() {
        let mut ast = Ast::new();
        let mut interner = Interner::new();
        let ghost = interner.intern("ghost");
        let use_ghost = ast.alloc(Node::Expr(veil_ast::Expr::Identifier(ghost)), Span::new(0, 1));
        let stmt = ast.alloc(Node::Stmt(veil_ast::Stmt::Expression { expr: use_ghost }), Span::new(0, 1));
        let body = ast.alloc(Node::Stmt(veil_ast::Stmt::Block(vec![stmt])), Span::new(0, 1));
        let name = interner.intern("C");
        let ctor = ast.alloc(
            Node::Constructor(Constructor {
                params: vec![],
                body,
                is_recursive: false,
                requires_verification: false,
                called_functions: vec![],
            }),
            Span::new(0, 1),
        );
        let contract = ast.alloc(
            Node::Contract(Contract { name, state_vars: vec![], constructor: Some(ctor), functions: vec![] }),
            Span::new(0, 1),
        );
        let unit = ast.alloc(Node::SourceUnit(SourceUnit { contracts: vec![contract] }), Span::new(0, 1));
        ast.root = Some(unit);

        let result = run(&mut ast, &mut interner, Config::default(), PipelineOptions::default());
        let fatal = result.fatal.expect("expected a fatal resolve error");
        assert_eq!(fatal.stage, Stage::Resolve);
    }

    #[test]
    fn batch_continues_past_a_failing_unit() {
        let mut bad_ast = Ast::new();
        let mut bad_interner = Interner::new();
        let ghost = bad_interner.intern("ghost");
        let use_ghost = bad_ast.alloc(Node::Expr(veil_ast::Expr::Identifier(ghost)), Span::new(0, 1));
        let stmt = bad_ast.alloc(Node::Stmt(veil_ast::Stmt::Expression { expr: use_ghost }), Span::new(0, 1));
        let body = bad_ast.alloc(Node::Stmt(veil_ast::Stmt::Block(vec![stmt])), Span::new(0, 1));
        let name = bad_interner.intern("C");
        let ctor = bad_ast.alloc(
            Node::Constructor(Constructor { params: vec![], body, is_recursive: false, requires_verification: false, called_functions: vec![] }),
            Span::new(0, 1),
        );
        let contract = bad_ast.alloc(
            Node::Contract(Contract { name, state_vars: vec![], constructor: Some(ctor), functions: vec![] }),
            Span::new(0, 1),
        );
        let root = bad_ast.alloc(Node::SourceUnit(SourceUnit { contracts: vec![contract] }), Span::new(0, 1));
        bad_ast.root = Some(root);

        let mut good_ast = Ast::new();
        let mut good_interner = Interner::new();
        empty_contract(&mut good_ast, &mut good_interner);

        let mut units = vec![
            Unit { ast: &mut bad_ast, interner: &mut bad_interner },
            Unit { ast: &mut good_ast, interner: &mut good_interner },
        ];
        let results = run_batch(&mut units, Config::default(), PipelineOptions::default());
        assert_eq!(results.len(), 2);
        assert!(!results[0].is_ok());
        assert!(results[1].is_ok());
    }
}
