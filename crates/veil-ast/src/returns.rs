//! Return checker.
//!
//! Every non-void function must have a `return` on every path through its
//! body. A statement is "terminating" if control can never fall off the end
//! of it: a bare `return`, or a `require(false)` (the one revert-shaped
//! construct this language surfaces — the back-end lowers it to an
//! unconditional abort, so the path needs no return of its own).

use veil_base::{Diagnostic, ErrorKind, NodeId, Result};

use crate::ast::{Ast, Expr, Function, Literal, Node, Stmt};

/// Checks every function in `ast`'s single source unit.
///
/// Requires `ast.root` to be a `SourceUnit`; a missing root is treated as
/// nothing-to-check rather than an error (mirrors `resolve::resolve`).
pub fn check_returns(ast: &Ast) -> Result<()> {
    let Some(root) = ast.root else { return Ok(()) };
    let Node::SourceUnit(unit) = ast.get(root) else { return Ok(()) };

    for &contract_id in &unit.contracts {
        let Node::Contract(contract) = ast.get(contract_id) else { continue };
        for &fn_id in &contract.functions {
            let Node::Function(f) = ast.get(fn_id) else { continue };
            check_function(ast, fn_id, f)?;
        }
    }
    Ok(())
}

fn check_function(ast: &Ast, fn_id: NodeId, f: &Function) -> Result<()> {
    if f.is_void() {
        return Ok(());
    }
    if !terminates(ast, f.body) {
        return Err(Diagnostic::new(
            ErrorKind::ReturnMissing,
            "function body does not return on every path",
            ast.span(fn_id),
        ));
    }
    Ok(())
}

/// Returns `true` if control can never fall off the end of the statement at
/// `id` — every path through it ends in a `return` or an unconditional
/// `require(false)`.
fn terminates(ast: &Ast, id: NodeId) -> bool {
    let Node::Stmt(stmt) = ast.get(id) else { return false };
    match stmt {
        Stmt::Return { .. } => true,
        Stmt::Require { cond } => is_false_literal(ast, *cond),
        Stmt::Block(stmts) => stmts.last().is_some_and(|&last| terminates(ast, last)),
        Stmt::If { then_branch, else_branch, .. } => match else_branch {
            Some(else_id) => terminates(ast, *then_branch) && terminates(ast, *else_id),
            None => false,
        },
        // Loops may execute zero times, so they never guarantee termination
        // of the enclosing function on their own.
        Stmt::While { .. } | Stmt::For { .. } => false,
        Stmt::VariableDeclaration { .. }
        | Stmt::Assignment { .. }
        | Stmt::Break
        | Stmt::Continue
        | Stmt::Expression { .. } => false,
    }
}

fn is_false_literal(ast: &Ast, id: NodeId) -> bool {
    match ast.get(id) {
        Node::Expr(Expr::Literal(Literal::Bool(false))) => true,
        Node::Expr(Expr::UnOp { op: crate::ast::UnOpKind::Not, operand }) => {
            matches!(ast.get(*operand), Node::Expr(Expr::Literal(Literal::Bool(true))))
        }
        _ => false,
    }
}
