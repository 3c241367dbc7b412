//! Hybrid-function detector.
//!
//! Three fixed passes over the decorated AST, run once each in order:
//!
//! 1. **Direct** — mark a function `requires_verification` if its body
//!    contains a `reveal(...)`, a call to a privately-typed builtin, or
//!    (supplemented) a homomorphic operator applied to a privately-typed
//!    operand that the function never reclassifies.
//! 2. **Indirect** — propagate the mark across `called_functions` to a fixed
//!    point. Monotone, so this always terminates.
//! 3. **Non-inlineable** — reject any call whose callee both
//!    `requires_verification_if_external` and `is_recursive`: the back-end
//!    inlines every verified callee, and recursion can't be inlined.

use std::collections::HashMap;

use veil_base::{Diagnostic, ErrorKind, NodeId, Result, Symbol};
use veil_ast::{Ast, Expr, Node};

pub fn run(ast: &mut Ast) -> Result<()> {
    let Some(root) = ast.root else { return Ok(()) };
    let Node::SourceUnit(unit) = ast.get(root).clone() else { return Ok(()) };

    for &contract_id in &unit.contracts {
        direct_pass(ast, contract_id);
    }
    for &contract_id in &unit.contracts {
        propagate_to_fixed_point(ast, contract_id);
    }
    for &contract_id in &unit.contracts {
        reject_non_inlineable_calls(ast, contract_id)?;
    }
    Ok(())
}

fn direct_pass(ast: &mut Ast, contract_id: NodeId) {
    let Node::Contract(contract) = ast.get(contract_id).clone() else { return };

    if let Some(ctor_id) = contract.constructor {
        let Node::Constructor(ctor) = ast.get(ctor_id).clone() else { return };
        if body_requires_verification(ast, ctor.body) {
            if let Node::Constructor(c) = ast.get_mut(ctor_id) {
                c.requires_verification = true;
            }
        }
    }

    for &fn_id in &contract.functions {
        let Node::Function(f) = ast.get(fn_id).clone() else { continue };
        let requires = body_requires_verification(ast, f.body);
        let has_private_param = f.params.iter().any(|p| !p.ty.label.is_all());
        if let Node::Function(func) = ast.get_mut(fn_id) {
            if requires {
                func.requires_verification = true;
            }
            if func.requires_verification || (func.can_be_external && has_private_param) {
                func.requires_verification_if_external = true;
            }
        }
    }
}

fn body_requires_verification(ast: &Ast, id: NodeId) -> bool {
    let direct = match ast.get(id) {
        Node::Expr(Expr::Reclassify { .. }) => true,
        Node::Expr(Expr::Call { is_private_builtin: true, .. }) => true,
        Node::Expr(Expr::BinOp { op, lhs, rhs }) if op.is_homomorphic() => {
            is_private(ast, *lhs) || is_private(ast, *rhs)
        }
        _ => false,
    };
    direct || ast.children(id).into_iter().any(|c| body_requires_verification(ast, c))
}

fn is_private(ast: &Ast, id: NodeId) -> bool {
    ast.annotated_type(id).is_some_and(|t| !t.label.is_all())
}

fn propagate_to_fixed_point(ast: &mut Ast, contract_id: NodeId) {
    let Node::Contract(contract) = ast.get(contract_id).clone() else { return };

    let mut by_name: HashMap<Symbol, NodeId> = HashMap::new();
    for &fn_id in &contract.functions {
        if let Node::Function(f) = ast.get(fn_id) {
            by_name.insert(f.name, fn_id);
        }
    }

    let mut changed = true;
    while changed {
        changed = false;

        for &fn_id in &contract.functions {
            let Node::Function(f) = ast.get(fn_id).clone() else { continue };
            if f.requires_verification {
                continue;
            }
            if any_callee_requires_verification(ast, &f.called_functions, &by_name) {
                if let Node::Function(func) = ast.get_mut(fn_id) {
                    func.requires_verification = true;
                    func.requires_verification_if_external = true;
                }
                changed = true;
            }
        }

        if let Some(ctor_id) = contract.constructor {
            let Node::Constructor(c) = ast.get(ctor_id).clone() else { continue };
            if !c.requires_verification && any_callee_requires_verification(ast, &c.called_functions, &by_name) {
                if let Node::Constructor(ctor) = ast.get_mut(ctor_id) {
                    ctor.requires_verification = true;
                }
                changed = true;
            }
        }
    }
}

fn any_callee_requires_verification(ast: &Ast, called: &[Symbol], by_name: &HashMap<Symbol, NodeId>) -> bool {
    called.iter().any(|name| {
        by_name
            .get(name)
            .is_some_and(|&id| matches!(ast.get(id), Node::Function(f) if f.requires_verification))
    })
}

fn reject_non_inlineable_calls(ast: &Ast, contract_id: NodeId) -> Result<()> {
    let Node::Contract(contract) = ast.get(contract_id).clone() else { return Ok(()) };

    let mut by_name: HashMap<Symbol, NodeId> = HashMap::new();
    for &fn_id in &contract.functions {
        if let Node::Function(f) = ast.get(fn_id) {
            by_name.insert(f.name, fn_id);
        }
    }

    if let Some(ctor_id) = contract.constructor {
        if let Node::Constructor(c) = ast.get(ctor_id).clone() {
            check_calls(ast, c.body, &by_name)?;
        }
    }
    for &fn_id in &contract.functions {
        if let Node::Function(f) = ast.get(fn_id).clone() {
            check_calls(ast, f.body, &by_name)?;
        }
    }
    Ok(())
}

fn check_calls(ast: &Ast, id: NodeId, by_name: &HashMap<Symbol, NodeId>) -> Result<()> {
    if let Node::Expr(Expr::Call { callee, .. }) = ast.get(id) {
        if let Some(&target) = by_name.get(callee) {
            if let Node::Function(f) = ast.get(target) {
                if f.requires_verification_if_external && f.is_recursive {
                    return Err(Diagnostic::new(
                        ErrorKind::NonInlineableRecursion,
                        "call to a recursive function that requires external verification cannot be inlined",
                        ast.span(id),
                    ));
                }
            }
        }
    }
    for child in ast.children(id) {
        check_calls(ast, child, by_name)?;
    }
    Ok(())
}
