//! Alias (equivalence) analysis.
//!
//! A flow-sensitive, intra-procedural forward analysis that threads a
//! [`PartitionState`] through every statement of a function body. Each
//! function is seeded independently with singletons for `me`, `all`, every
//! state variable, and every parameter, then the state is refined or
//! coarsened statement by statement in source order.
//!
//! The joins at `if`/`while`/`for` are deliberately imprecise — see the
//! module-level notes on each visitor below — this is not a bug to fix, it
//! is the documented tradeoff that keeps the analysis sound without full
//! abstract interpretation.

use veil_base::Symbol;
use veil_kernel::{Label, PartitionState, Type};
use veil_ast::{Ast, BinOpKind, Contract, Expr, Node, Stmt};

/// Runs alias analysis over every function and constructor reachable from
/// `ast.root`.
pub fn run(ast: &mut Ast) {
    let Some(root) = ast.root else { return };
    let Node::SourceUnit(unit) = ast.get(root).clone() else { return };

    for contract_id in unit.contracts {
        let Node::Contract(contract) = ast.get(contract_id).clone() else { continue };
        analyze_contract(ast, &contract);
    }
}

fn analyze_contract(ast: &mut Ast, contract: &Contract) {
    let state_var_names: Vec<Symbol> = contract
        .state_vars
        .iter()
        .filter_map(|&id| match ast.get(id) {
            Node::StateVar(sv) => Some(sv.name),
            _ => None,
        })
        .collect();

    if let Some(ctor_id) = contract.constructor {
        let Node::Constructor(ctor) = ast.get(ctor_id).clone() else { return };
        analyze_function_like(ast, &state_var_names, ctor.params.iter().map(|p| p.name), ctor.body);
    }
    for &fn_id in &contract.functions {
        let Node::Function(f) = ast.get(fn_id).clone() else { continue };
        analyze_function_like(ast, &state_var_names, f.params.iter().map(|p| p.name), f.body);
    }
}

fn analyze_function_like(
    ast: &mut Ast,
    state_vars: &[Symbol],
    params: impl Iterator<Item = Symbol>,
    body: veil_base::NodeId,
) {
    let mut seed = PartitionState::new();
    seed.insert(Label::All);
    seed.insert(Label::Me);
    for &name in state_vars {
        seed.insert(Label::Id(name));
    }
    for name in params {
        seed.insert(Label::Id(name));
    }
    analyze_stmt(ast, body, seed);
}

/// If `expr` is a bare identifier, the privacy-annotation label it denotes
/// when used in label position.
fn location_label(ast: &Ast, expr: veil_base::NodeId) -> Option<Label> {
    match ast.get(expr) {
        Node::Expr(Expr::Identifier(sym)) => Some(Label::Id(*sym)),
        _ => None,
    }
}

fn has_side_effects(ast: &Ast, expr: veil_base::NodeId) -> bool {
    match ast.get(expr) {
        Node::Expr(Expr::Literal(_)) | Node::Expr(Expr::Identifier(_)) => false,
        Node::Expr(Expr::Call { .. }) => true,
        Node::Expr(Expr::BinOp { lhs, rhs, .. }) => has_side_effects(ast, *lhs) || has_side_effects(ast, *rhs),
        Node::Expr(Expr::UnOp { operand, .. }) => has_side_effects(ast, *operand),
        Node::Expr(Expr::IndexAccess { base, index }) => has_side_effects(ast, *base) || has_side_effects(ast, *index),
        Node::Expr(Expr::Reclassify { expr, .. }) => has_side_effects(ast, *expr),
        _ => false,
    }
}

/// Visits the statement at `id`, records its `before`/`after` analysis, and
/// returns the post-state threaded to the next statement in the block.
fn analyze_stmt(ast: &mut Ast, id: veil_base::NodeId, pre: PartitionState) -> PartitionState {
    let Node::Stmt(stmt) = ast.get(id).clone() else {
        ast.set_before_analysis(id, pre.copy());
        ast.set_after_analysis(id, pre.copy());
        return pre;
    };
    match stmt {
        Stmt::Block(stmts) => analyze_block(ast, id, &stmts, pre),
        Stmt::VariableDeclaration { name, ty, init } => analyze_var_decl(ast, id, name, &ty.ty, init, pre),
        Stmt::Assignment { lhs, rhs } => analyze_assignment(ast, id, lhs, rhs, pre),
        Stmt::If { cond, then_branch, else_branch } => analyze_if(ast, id, cond, then_branch, else_branch, pre),
        Stmt::While { cond, body } => analyze_loop(ast, id, Some(cond), None, None, body, pre),
        Stmt::For { init, cond, update, body } => analyze_loop(ast, id, cond, init, update, body, pre),
        Stmt::Require { cond } => analyze_require(ast, id, cond, pre),
        Stmt::Return { .. } | Stmt::Break | Stmt::Continue => analyze_identity(ast, id, None, pre),
        Stmt::Expression { expr } => analyze_identity(ast, id, Some(expr), pre),
    }
}

fn analyze_block(ast: &mut Ast, id: veil_base::NodeId, stmts: &[veil_base::NodeId], pre: PartitionState) -> PartitionState {
    ast.set_before_analysis(id, pre.copy());
    let mut state = pre;
    let mut declared_here = Vec::new();
    for &s in stmts {
        if let Node::Stmt(Stmt::VariableDeclaration { name, .. }) = ast.get(s).clone() {
            declared_here.push(name);
        }
        state = analyze_stmt(ast, s, state);
    }
    for name in declared_here {
        state.remove(Label::Id(name));
    }
    ast.set_after_analysis(id, state.copy());
    state
}

fn analyze_var_decl(
    ast: &mut Ast,
    id: veil_base::NodeId,
    name: Symbol,
    ty: &Type,
    init: Option<veil_base::NodeId>,
    pre: PartitionState,
) -> PartitionState {
    ast.set_before_analysis(id, pre.copy());
    let mut state = pre;
    if let Some(init_id) = init {
        if has_side_effects(ast, init_id) {
            state = state.separate_all();
        }
    }
    state.insert(Label::Id(name));
    if matches!(ty, Type::Address) {
        if let Some(init_id) = init {
            if let Some(init_label) = location_label(ast, init_id) {
                if state.has(init_label) {
                    state.merge(Label::Id(name), init_label);
                }
            }
        }
    }
    ast.set_after_analysis(id, state.copy());
    state
}

fn analyze_assignment(
    ast: &mut Ast,
    id: veil_base::NodeId,
    lhs: veil_base::NodeId,
    rhs: veil_base::NodeId,
    pre: PartitionState,
) -> PartitionState {
    ast.set_before_analysis(id, pre.copy());
    let mut state = pre;
    if has_side_effects(ast, lhs) || has_side_effects(ast, rhs) {
        state = state.separate_all();
    }
    if let (Some(l), Some(r)) = (location_label(ast, lhs), location_label(ast, rhs)) {
        if state.has(l) && state.has(r) {
            state.move_to(l, r);
        }
    }
    ast.set_after_analysis(id, state.copy());
    state
}

fn analyze_if(
    ast: &mut Ast,
    id: veil_base::NodeId,
    cond: veil_base::NodeId,
    then_branch: veil_base::NodeId,
    else_branch: Option<veil_base::NodeId>,
    pre: PartitionState,
) -> PartitionState {
    ast.set_before_analysis(id, pre.copy());
    let branch_pre = if has_side_effects(ast, cond) { pre.separate_all() } else { pre };
    analyze_stmt(ast, then_branch, branch_pre.copy());
    if let Some(else_id) = else_branch {
        analyze_stmt(ast, else_id, branch_pre.copy());
    }
    // Imprecise join: both branches were explored for their side effects and
    // nested analysis slots, but the merge point forgets everything.
    let post = branch_pre.separate_all();
    ast.set_after_analysis(id, post.copy());
    post
}

fn analyze_loop(
    ast: &mut Ast,
    id: veil_base::NodeId,
    cond: Option<veil_base::NodeId>,
    init: Option<veil_base::NodeId>,
    update: Option<veil_base::NodeId>,
    body: veil_base::NodeId,
    pre: PartitionState,
) -> PartitionState {
    ast.set_before_analysis(id, pre.copy());
    let mut entry = pre;
    if let Some(init_id) = init {
        entry = analyze_stmt(ast, init_id, entry);
    }
    let _ = cond;
    let sep = entry.separate_all();
    analyze_stmt(ast, body, sep.copy());
    if let Some(update_id) = update {
        analyze_stmt(ast, update_id, sep.copy());
    }
    ast.set_after_analysis(id, sep.copy());
    sep
}

fn analyze_require(ast: &mut Ast, id: veil_base::NodeId, cond: veil_base::NodeId, pre: PartitionState) -> PartitionState {
    ast.set_before_analysis(id, pre.copy());
    let mut state = pre;
    if has_side_effects(ast, cond) {
        state = state.separate_all();
    }
    if let Node::Expr(Expr::BinOp { op: BinOpKind::Eq, lhs, rhs }) = ast.get(cond).clone() {
        if let (Some(l), Some(r)) = (location_label(ast, lhs), location_label(ast, rhs)) {
            if state.has(l) && state.has(r) {
                state.merge(l, r);
            }
        }
    }
    ast.set_after_analysis(id, state.copy());
    state
}

fn analyze_identity(
    ast: &mut Ast,
    id: veil_base::NodeId,
    expr: Option<veil_base::NodeId>,
    pre: PartitionState,
) -> PartitionState {
    ast.set_before_analysis(id, pre.copy());
    let state = match expr {
        Some(e) if has_side_effects(ast, e) => pre.separate_all(),
        _ => pre,
    };
    ast.set_after_analysis(id, state.copy());
    state
}

#[cfg(test)]
mod tests {
    use super::*;
    use veil_base::{Interner, Span};
    use veil_kernel::AnnotatedType;
    use veil_ast::{Contract, Function, Param, SourceUnit};

    fn build(ast: &mut Ast, interner: &mut Interner, body: veil_base::NodeId, params: Vec<Param>) -> veil_base::NodeId {
        let name = interner.intern("f");
        let f = ast.alloc(
            Node::Function(Function {
                name,
                params,
                returns: vec![],
                body,
                can_be_external: false,
                is_recursive: false,
                requires_verification: false,
                requires_verification_if_external: false,
                called_functions: vec![],
            }),
            Span::new(0, 1),
        );
        let contract = ast.alloc(
            Node::Contract(Contract { name, state_vars: vec![], constructor: None, functions: vec![f] }),
            Span::new(0, 1),
        );
        let unit = ast.alloc(Node::SourceUnit(SourceUnit { contracts: vec![contract] }), Span::new(0, 1));
        ast.root = Some(unit);
        f
    }

    #[test]
    fn every_statement_gets_before_and_after() {
        let mut ast = Ast::new();
        let mut interner = Interner::new();
        let expr = ast.alloc(Node::Expr(Expr::Literal(veil_ast::Literal::Bool(true))), Span::new(0, 1));
        let stmt = ast.alloc(Node::Stmt(Stmt::Expression { expr }), Span::new(0, 1));
        let block = ast.alloc(Node::Stmt(Stmt::Block(vec![stmt])), Span::new(0, 1));
        build(&mut ast, &mut interner, block, vec![]);
        run(&mut ast);
        assert!(ast.before_analysis(block).is_some());
        assert!(ast.after_analysis(block).is_some());
        assert!(ast.before_analysis(stmt).is_some());
        assert!(ast.after_analysis(stmt).is_some());
    }

    #[test]
    fn require_equality_merges_both_sides() {
        let mut ast = Ast::new();
        let mut interner = Interner::new();
        let a = interner.intern("a");
        let b = interner.intern("b");
        let lhs = ast.alloc(Node::Expr(Expr::Identifier(a)), Span::new(0, 1));
        let rhs = ast.alloc(Node::Expr(Expr::Identifier(b)), Span::new(0, 1));
        let cond = ast.alloc(Node::Expr(Expr::BinOp { op: BinOpKind::Eq, lhs, rhs }), Span::new(0, 1));
        let req = ast.alloc(Node::Stmt(Stmt::Require { cond }), Span::new(0, 1));
        let block = ast.alloc(Node::Stmt(Stmt::Block(vec![req])), Span::new(0, 1));
        let params = vec![
            Param { name: a, ty: AnnotatedType::public(Type::Address) },
            Param { name: b, ty: AnnotatedType::public(Type::Address) },
        ];
        build(&mut ast, &mut interner, block, params);
        run(&mut ast);
        let post = ast.after_analysis(req).unwrap();
        assert!(post.same_partition(Label::Id(a), Label::Id(b)));
    }

    #[test]
    fn assignment_moves_lhs_into_rhs_class() {
        let mut ast = Ast::new();
        let mut interner = Interner::new();
        let a = interner.intern("a");
        let b = interner.intern("b");
        let lhs = ast.alloc(Node::Expr(Expr::Identifier(a)), Span::new(0, 1));
        let rhs = ast.alloc(Node::Expr(Expr::Identifier(b)), Span::new(0, 1));
        let assign = ast.alloc(Node::Stmt(Stmt::Assignment { lhs, rhs }), Span::new(0, 1));
        let block = ast.alloc(Node::Stmt(Stmt::Block(vec![assign])), Span::new(0, 1));
        let params = vec![
            Param { name: a, ty: AnnotatedType::public(Type::Address) },
            Param { name: b, ty: AnnotatedType::public(Type::Address) },
        ];
        build(&mut ast, &mut interner, block, params);
        run(&mut ast);
        let post = ast.after_analysis(assign).unwrap();
        assert!(post.same_partition(Label::Id(a), Label::Id(b)));
    }

    #[test]
    fn if_join_forgets_equivalences_from_both_branches() {
        let mut ast = Ast::new();
        let mut interner = Interner::new();
        let a = interner.intern("a");
        let b = interner.intern("b");
        let lhs = ast.alloc(Node::Expr(Expr::Identifier(a)), Span::new(0, 1));
        let rhs = ast.alloc(Node::Expr(Expr::Identifier(b)), Span::new(0, 1));
        let assign = ast.alloc(Node::Stmt(Stmt::Assignment { lhs, rhs }), Span::new(0, 1));
        let then_block = ast.alloc(Node::Stmt(Stmt::Block(vec![assign])), Span::new(0, 1));
        let cond = ast.alloc(Node::Expr(Expr::Literal(veil_ast::Literal::Bool(true))), Span::new(0, 1));
        let if_stmt = ast.alloc(
            Node::Stmt(Stmt::If { cond, then_branch: then_block, else_branch: None }),
            Span::new(0, 1),
        );
        let block = ast.alloc(Node::Stmt(Stmt::Block(vec![if_stmt])), Span::new(0, 1));
        let params = vec![
            Param { name: a, ty: AnnotatedType::public(Type::Address) },
            Param { name: b, ty: AnnotatedType::public(Type::Address) },
        ];
        build(&mut ast, &mut interner, block, params);
        run(&mut ast);
        let post = ast.after_analysis(if_stmt).unwrap();
        assert!(!post.same_partition(Label::Id(a), Label::Id(b)));
    }

    #[test]
    fn block_local_declaration_is_removed_on_exit() {
        let mut ast = Ast::new();
        let mut interner = Interner::new();
        let x = interner.intern("x");
        let decl = ast.alloc(
            Node::Stmt(Stmt::VariableDeclaration { name: x, ty: AnnotatedType::public(Type::Address), init: None }),
            Span::new(0, 1),
        );
        let inner = ast.alloc(Node::Stmt(Stmt::Block(vec![decl])), Span::new(0, 1));
        let outer = ast.alloc(Node::Stmt(Stmt::Block(vec![inner])), Span::new(0, 1));
        build(&mut ast, &mut interner, outer, vec![]);
        run(&mut ast);
        let post = ast.after_analysis(outer).unwrap();
        assert!(!post.has(Label::Id(x)));
    }
}
