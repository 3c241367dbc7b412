//! Symbol resolution.
//!
//! A scoped name -> declaration binder, grounded on the same scope-stack
//! shape as a standard lexical resolver: a stack of hash maps, innermost
//! scope last, searched from the top down. Two things get bound:
//!
//! - every [`Expr::Identifier`] use, recorded in [`Ast`]'s `bindings` table
//!   via [`Ast::bind`]
//! - every privacy label written as `Id(name)` (state variable, parameter,
//!   local declaration, or `reveal` target), checked against the same
//!   scopes without needing a declaration `NodeId` of its own
//!
//! `me` and `all` are pre-registered so that label positions referencing
//! them never raise `UnknownIdentifier`, matching their status as
//! reserved words rather than ordinary bindings.

use std::collections::HashMap;

use veil_base::{Diagnostic, ErrorKind, NodeId, Result, Symbol};
use veil_kernel::Label;

use crate::ast::{Ast, Contract, Expr, Node, Stmt};

#[derive(Debug, Default)]
struct ScopeStack {
    scopes: Vec<HashMap<Symbol, NodeId>>,
}

impl ScopeStack {
    fn push(&mut self) {
        self.scopes.push(HashMap::new());
    }

    fn pop(&mut self) {
        self.scopes.pop();
    }

    fn declare(&mut self, name: Symbol, decl: NodeId) {
        self.scopes
            .last_mut()
            .expect("scope stack must not be empty while resolving")
            .insert(name, decl);
    }

    fn lookup(&self, name: Symbol) -> Option<NodeId> {
        self.scopes.iter().rev().find_map(|scope| scope.get(&name).copied())
    }
}

/// Resolves every identifier and label in `ast`, starting from `ast.root`.
///
/// Requires `set_parents` to have already run: resolution reads
/// [`Ast::children`] directly rather than the parent table, but the rest of
/// the pipeline's ordering guarantee expects parents to be set first.
pub fn resolve(ast: &mut Ast, interner: &mut veil_base::Interner) -> Result<()> {
    let me = interner.intern("me");
    let all = interner.intern("all");
    let builtins = [me, all];

    let Some(root) = ast.root else { return Ok(()) };
    let Node::SourceUnit(unit) = ast.get(root).clone() else {
        return Ok(());
    };

    for &contract_id in &unit.contracts {
        resolve_contract(ast, contract_id, &builtins)?;
    }
    Ok(())
}

fn resolve_contract(ast: &mut Ast, contract_id: NodeId, builtins: &[Symbol; 2]) -> Result<()> {
    let Node::Contract(contract) = ast.get(contract_id).clone() else {
        return Ok(());
    };
    let Contract { state_vars, constructor, functions, .. } = contract;

    let mut scopes = ScopeStack::default();
    scopes.push();
    for &sym in builtins {
        scopes.declare(sym, contract_id);
    }

    for &sv_id in &state_vars {
        let Node::StateVar(sv) = ast.get(sv_id).clone() else { continue };
        check_label(ast, &scopes, sv.ty.label, sv_id)?;
        scopes.declare(sv.name, sv_id);
    }

    if let Some(ctor_id) = constructor {
        resolve_function_like(ast, ctor_id, &mut scopes)?;
    }
    for &fn_id in &functions {
        resolve_function_like(ast, fn_id, &mut scopes)?;
    }
    Ok(())
}

fn resolve_function_like(ast: &mut Ast, decl_id: NodeId, outer: &mut ScopeStack) -> Result<()> {
    let (params, body, span) = match ast.get(decl_id).clone() {
        Node::Function(f) => (f.params, f.body, ast.span(decl_id)),
        Node::Constructor(c) => (c.params, c.body, ast.span(decl_id)),
        _ => return Ok(()),
    };

    outer.push();
    for param in &params {
        check_label(ast, outer, param.ty.label, decl_id)?;
        outer.declare(param.name, decl_id);
    }
    let _ = span;
    resolve_stmt(ast, body, outer)?;
    outer.pop();
    Ok(())
}

fn resolve_stmt(ast: &mut Ast, stmt_id: NodeId, scopes: &mut ScopeStack) -> Result<()> {
    let Node::Stmt(stmt) = ast.get(stmt_id).clone() else {
        return Ok(());
    };
    match stmt {
        Stmt::Block(stmts) => {
            scopes.push();
            for s in stmts {
                resolve_stmt(ast, s, scopes)?;
            }
            scopes.pop();
        }
        Stmt::VariableDeclaration { name, ty, init } => {
            if let Some(init_id) = init {
                resolve_expr(ast, init_id, scopes)?;
            }
            check_label(ast, scopes, ty.label, stmt_id)?;
            scopes.declare(name, stmt_id);
        }
        Stmt::Assignment { lhs, rhs } => {
            resolve_expr(ast, lhs, scopes)?;
            resolve_expr(ast, rhs, scopes)?;
        }
        Stmt::If { cond, then_branch, else_branch } => {
            resolve_expr(ast, cond, scopes)?;
            resolve_stmt(ast, then_branch, scopes)?;
            if let Some(else_id) = else_branch {
                resolve_stmt(ast, else_id, scopes)?;
            }
        }
        Stmt::While { cond, body } => {
            resolve_expr(ast, cond, scopes)?;
            resolve_stmt(ast, body, scopes)?;
        }
        Stmt::For { init, cond, update, body } => {
            scopes.push();
            if let Some(init_id) = init {
                resolve_stmt(ast, init_id, scopes)?;
            }
            if let Some(cond_id) = cond {
                resolve_expr(ast, cond_id, scopes)?;
            }
            if let Some(update_id) = update {
                resolve_stmt(ast, update_id, scopes)?;
            }
            resolve_stmt(ast, body, scopes)?;
            scopes.pop();
        }
        Stmt::Require { cond } => resolve_expr(ast, cond, scopes)?,
        Stmt::Return { value } => {
            if let Some(v) = value {
                resolve_expr(ast, v, scopes)?;
            }
        }
        Stmt::Break | Stmt::Continue => {}
        Stmt::Expression { expr } => resolve_expr(ast, expr, scopes)?,
    }
    Ok(())
}

fn resolve_expr(ast: &mut Ast, expr_id: NodeId, scopes: &mut ScopeStack) -> Result<()> {
    let Node::Expr(expr) = ast.get(expr_id).clone() else {
        return Ok(());
    };
    match expr {
        Expr::Literal(_) => {}
        Expr::Identifier(name) => {
            let Some(decl) = scopes.lookup(name) else {
                return Err(unknown_identifier(ast, expr_id));
            };
            ast.bind(expr_id, decl);
        }
        Expr::BinOp { lhs, rhs, .. } => {
            resolve_expr(ast, lhs, scopes)?;
            resolve_expr(ast, rhs, scopes)?;
        }
        Expr::UnOp { operand, .. } => resolve_expr(ast, operand, scopes)?,
        Expr::Call { args, .. } => {
            for a in args {
                resolve_expr(ast, a, scopes)?;
            }
        }
        Expr::IndexAccess { base, index } => {
            resolve_expr(ast, base, scopes)?;
            resolve_expr(ast, index, scopes)?;
        }
        Expr::Reclassify { expr, label } => {
            resolve_expr(ast, expr, scopes)?;
            check_label(ast, scopes, label, expr_id)?;
        }
    }
    Ok(())
}

fn check_label(ast: &Ast, scopes: &ScopeStack, label: Label, at: NodeId) -> Result<()> {
    if let Label::Id(name) = label {
        if scopes.lookup(name).is_none() {
            return Err(Diagnostic::new(
                ErrorKind::UnknownIdentifier,
                "label does not refer to an in-scope name".to_string(),
                ast.span(at),
            ));
        }
    }
    Ok(())
}

fn unknown_identifier(ast: &Ast, at: NodeId) -> Diagnostic {
    Diagnostic::new(
        ErrorKind::UnknownIdentifier,
        "reference to an undeclared identifier".to_string(),
        ast.span(at),
    )
}
