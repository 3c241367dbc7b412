//! Type checker.
//!
//! Bottom-up synthesis over expressions, with the privacy compatibility
//! checks interleaved: every expression's [`AnnotatedType`] is derived from
//! its operands' types and the partition state in force at that point in
//! the function (the alias analysis's result), never the other way around.
//!
//! Type checking halts on the first error within a function, but the driver
//! continues on to the next function — independent functions get
//! independent diagnostics rather than one failure aborting the whole
//! contract.

use std::collections::HashMap;

use veil_base::{Diagnostic, ErrorKind, NodeId, Result, Symbol};
use veil_kernel::{AnnotatedType, Label, PartitionState, Type};
use veil_ast::{Ast, BinOpKind, Expr, Node, Stmt, UnOpKind};

/// Runs the type checker over every function and constructor in `ast`.
///
/// Returns one [`Diagnostic`] per function that failed to check; functions
/// that type-check cleanly contribute nothing. An empty result means the
/// whole program is well-typed.
pub fn run(ast: &mut Ast, uint_width: u32) -> Vec<Diagnostic> {
    let Some(root) = ast.root else { return Vec::new() };
    let Node::SourceUnit(unit) = ast.get(root).clone() else { return Vec::new() };

    let mut callee_returns: HashMap<Symbol, Vec<AnnotatedType>> = HashMap::new();
    for &contract_id in &unit.contracts {
        let Node::Contract(contract) = ast.get(contract_id).clone() else { continue };
        for &fn_id in &contract.functions {
            if let Node::Function(f) = ast.get(fn_id).clone() {
                callee_returns.insert(f.name, f.returns.clone());
            }
        }
    }

    let checker = TypeChecker { uint_width, callee_returns };
    let mut failures = Vec::new();
    for &contract_id in &unit.contracts {
        let Node::Contract(contract) = ast.get(contract_id).clone() else { continue };
        if let Some(ctor_id) = contract.constructor {
            if let Node::Constructor(ctor) = ast.get(ctor_id).clone() {
                if let Err(e) = checker.check_stmt(ast, ctor.body) {
                    failures.push(e);
                }
            }
        }
        for &fn_id in &contract.functions {
            if let Node::Function(f) = ast.get(fn_id).clone() {
                if let Err(e) = checker.check_stmt(ast, f.body) {
                    failures.push(e);
                }
            }
        }
    }
    failures
}

struct TypeChecker {
    uint_width: u32,
    callee_returns: HashMap<Symbol, Vec<AnnotatedType>>,
}

impl TypeChecker {
    fn check_stmt(&self, ast: &mut Ast, id: NodeId) -> Result<()> {
        let Node::Stmt(stmt) = ast.get(id).clone() else { return Ok(()) };
        let partition = ast
            .before_analysis(id)
            .cloned()
            .unwrap_or_else(PartitionState::new);

        match stmt {
            Stmt::Block(stmts) => {
                for s in stmts {
                    self.check_stmt(ast, s)?;
                }
            }
            Stmt::VariableDeclaration { ty, init, .. } => {
                if let Some(init_id) = init {
                    let init_ty = self.type_of(ast, init_id, &partition, false)?;
                    if !init_ty.assignable_to(&ty, &partition) {
                        return Err(mismatch(ast, init_id, "initializer is not assignable to the declared type"));
                    }
                }
            }
            Stmt::Assignment { lhs, rhs } => {
                let lhs_ty = self.type_of(ast, lhs, &partition, false)?;
                let rhs_ty = self.type_of(ast, rhs, &partition, false)?;
                if !rhs_ty.assignable_to(&lhs_ty, &partition) {
                    return Err(mismatch(ast, rhs, "right-hand side is not assignable to the left-hand side"));
                }
            }
            Stmt::If { cond, then_branch, else_branch } => {
                self.type_of(ast, cond, &partition, false)?;
                self.check_stmt(ast, then_branch)?;
                if let Some(e) = else_branch {
                    self.check_stmt(ast, e)?;
                }
            }
            Stmt::While { cond, body } => {
                self.type_of(ast, cond, &partition, false)?;
                self.check_stmt(ast, body)?;
            }
            Stmt::For { init, cond, update, body } => {
                if let Some(i) = init {
                    self.check_stmt(ast, i)?;
                }
                if let Some(c) = cond {
                    self.type_of(ast, c, &partition, false)?;
                }
                self.check_stmt(ast, body)?;
                if let Some(u) = update {
                    self.check_stmt(ast, u)?;
                }
            }
            Stmt::Require { cond } => {
                let cond_ty = self.type_of(ast, cond, &partition, false)?;
                if cond_ty.ty != Type::Bool || !cond_ty.label.is_all() {
                    return Err(Diagnostic::new(
                        ErrorKind::Require,
                        "require condition must be a public bool",
                        ast.span(cond),
                    ));
                }
            }
            Stmt::Return { value } => {
                if let Some(v) = value {
                    self.type_of(ast, v, &partition, false)?;
                }
            }
            Stmt::Expression { expr } => {
                self.type_of(ast, expr, &partition, false)?;
            }
            Stmt::Break | Stmt::Continue => {}
        }
        Ok(())
    }

    /// Synthesizes the annotated type of `id`, recording it exactly once in
    /// `ast`. `inside_reveal` is true only for the direct argument of a
    /// `reveal(...)` call — a private operand reaching a non-homomorphic
    /// operator anywhere else is a hard error.
    fn type_of(&self, ast: &mut Ast, id: NodeId, partition: &PartitionState, inside_reveal: bool) -> Result<AnnotatedType> {
        if let Some(existing) = ast.annotated_type(id) {
            return Ok(existing.clone());
        }
        let ty = self.synthesize(ast, id, partition, inside_reveal)?;
        ast.set_annotated_type(id, ty.clone());
        Ok(ty)
    }

    fn synthesize(&self, ast: &mut Ast, id: NodeId, partition: &PartitionState, inside_reveal: bool) -> Result<AnnotatedType> {
        let Node::Expr(expr) = ast.get(id).clone() else {
            return Err(Diagnostic::new(ErrorKind::TypeOther, "not an expression", ast.span(id)));
        };
        match expr {
            Expr::Literal(lit) => Ok(match lit {
                veil_ast::Literal::Bool(_) => AnnotatedType::public(Type::Bool),
                veil_ast::Literal::Uint(_) => AnnotatedType::public(Type::Uint(self.uint_width)),
            }),
            Expr::Identifier(sym) => {
                let Some(decl) = ast.binding(id) else {
                    return Err(Diagnostic::new(ErrorKind::UnknownIdentifier, "unbound identifier reached the type checker", ast.span(id)));
                };
                self.type_of_declared(ast, decl, sym, id)
            }
            Expr::BinOp { op, lhs, rhs } => self.synthesize_binop(ast, id, op, lhs, rhs, partition, inside_reveal),
            Expr::UnOp { op, operand } => self.synthesize_unop(ast, id, op, operand, partition, inside_reveal),
            Expr::Call { callee, args, is_private_builtin } => {
                for a in &args {
                    self.type_of(ast, *a, partition, inside_reveal)?;
                }
                if is_private_builtin {
                    return Ok(AnnotatedType::new(Type::Uint(self.uint_width), Label::Me));
                }
                match self.callee_returns.get(&callee) {
                    Some(returns) if returns.len() == 1 => Ok(returns[0].clone()),
                    Some(returns) if returns.is_empty() => {
                        Err(Diagnostic::new(ErrorKind::TypeOther, "call to a void function used as a value", ast.span(id)))
                    }
                    Some(_) => Err(Diagnostic::new(ErrorKind::TypeOther, "multi-value call used in expression position", ast.span(id))),
                    None => Err(Diagnostic::new(ErrorKind::UnknownIdentifier, "call to an undeclared function", ast.span(id))),
                }
            }
            Expr::IndexAccess { base, index } => self.synthesize_index(ast, id, base, index, partition, inside_reveal),
            Expr::Reclassify { expr, label } => {
                let inner = self.type_of(ast, expr, partition, true)?;
                if inner.label.is_all() {
                    return Err(Diagnostic::new(
                        ErrorKind::Reclassify,
                        "reveal of an already-public expression is vacuous",
                        ast.span(id),
                    ));
                }
                Ok(AnnotatedType::new(inner.ty, label))
            }
        }
    }

    fn type_of_declared(&self, ast: &Ast, decl: NodeId, name: Symbol, at: NodeId) -> Result<AnnotatedType> {
        match ast.get(decl) {
            Node::StateVar(sv) => Ok(sv.ty.clone()),
            Node::Function(f) => f
                .params
                .iter()
                .find(|p| p.name == name)
                .map(|p| p.ty.clone())
                .ok_or_else(|| unknown(ast, at)),
            Node::Constructor(c) => c
                .params
                .iter()
                .find(|p| p.name == name)
                .map(|p| p.ty.clone())
                .ok_or_else(|| unknown(ast, at)),
            Node::Stmt(Stmt::VariableDeclaration { ty, .. }) => Ok(ty.clone()),
            _ => Err(unknown(ast, at)),
        }
    }

    fn synthesize_binop(
        &self,
        ast: &mut Ast,
        id: NodeId,
        op: BinOpKind,
        lhs: NodeId,
        rhs: NodeId,
        partition: &PartitionState,
        inside_reveal: bool,
    ) -> Result<AnnotatedType> {
        let lt = self.type_of(ast, lhs, partition, inside_reveal)?;
        let rt = self.type_of(ast, rhs, partition, inside_reveal)?;

        let result_ty = match op {
            BinOpKind::And | BinOpKind::Or => {
                if lt.ty != Type::Bool || rt.ty != Type::Bool {
                    return Err(mismatch(ast, id, "logical operator requires bool operands"));
                }
                Type::Bool
            }
            BinOpKind::Eq | BinOpKind::Neq | BinOpKind::Lt | BinOpKind::Le | BinOpKind::Gt | BinOpKind::Ge => {
                if lt.ty != rt.ty {
                    return Err(mismatch(ast, id, "comparison requires operands of the same type"));
                }
                Type::Bool
            }
            BinOpKind::Add | BinOpKind::Sub | BinOpKind::Mul => {
                if lt.ty != rt.ty || !matches!(lt.ty, Type::Uint(_)) {
                    return Err(mismatch(ast, id, "arithmetic requires two uints of the same width"));
                }
                lt.ty.clone()
            }
        };

        let label = self.join_operand_labels(ast, id, op.is_homomorphic(), &lt, &rt, partition, inside_reveal)?;
        Ok(AnnotatedType::new(result_ty, label))
    }

    fn synthesize_unop(
        &self,
        ast: &mut Ast,
        id: NodeId,
        op: UnOpKind,
        operand: NodeId,
        partition: &PartitionState,
        inside_reveal: bool,
    ) -> Result<AnnotatedType> {
        let ot = self.type_of(ast, operand, partition, inside_reveal)?;
        match op {
            UnOpKind::Not if ot.ty == Type::Bool => Ok(ot),
            UnOpKind::Neg if matches!(ot.ty, Type::Uint(_)) => Ok(ot),
            _ => Err(mismatch(ast, id, "unary operator does not apply to this type")),
        }
    }

    fn join_operand_labels(
        &self,
        ast: &Ast,
        at: NodeId,
        homomorphic: bool,
        lt: &AnnotatedType,
        rt: &AnnotatedType,
        partition: &PartitionState,
        inside_reveal: bool,
    ) -> Result<Label> {
        if lt.label.is_all() && rt.label.is_all() {
            return Ok(Label::All);
        }
        if !homomorphic && !inside_reveal {
            return Err(Diagnostic::new(
                ErrorKind::TypeOther,
                "private operand reaches a non-homomorphic operator without reveal",
                ast.span(at),
            ));
        }
        if !lt.label.is_all() && !rt.label.is_all() {
            let same = partition.has(lt.label) && partition.has(rt.label) && partition.same_partition(lt.label, rt.label);
            if !same {
                return Err(mismatch(ast, at, "operands are privately owned by different, unproven-equal principals"));
            }
            return Ok(lt.label);
        }
        Ok(if lt.label.is_all() { rt.label } else { lt.label })
    }

    fn synthesize_index(
        &self,
        ast: &mut Ast,
        id: NodeId,
        base: NodeId,
        index: NodeId,
        partition: &PartitionState,
        inside_reveal: bool,
    ) -> Result<AnnotatedType> {
        let base_ty = self.type_of(ast, base, partition, inside_reveal)?;
        let index_ty = self.type_of(ast, index, partition, inside_reveal)?;
        let Type::Mapping { tag, value } = base_ty.ty else {
            return Err(mismatch(ast, base, "indexing requires a mapping"));
        };
        if index_ty.ty != Type::Address {
            return Err(mismatch(ast, index, "mapping keys are addresses"));
        }
        // Owner-key tag substitution: if the mapping's declared value label
        // is literally the tag name, the actual owner at this access site is
        // whichever address was used as the key.
        let label = match value.label {
            Label::Id(sym) if sym == tag => match ast.get(index) {
                Node::Expr(Expr::Identifier(key_sym)) => Label::Id(*key_sym),
                _ => value.label,
            },
            other => other,
        };
        Ok(AnnotatedType::new(value.ty, label))
    }
}

fn mismatch(ast: &Ast, at: NodeId, message: &str) -> Diagnostic {
    Diagnostic::new(ErrorKind::TypeMismatch, message, ast.span(at))
}

fn unknown(ast: &Ast, at: NodeId) -> Diagnostic {
    Diagnostic::new(ErrorKind::UnknownIdentifier, "identifier does not match any parameter in scope", ast.span(at))
}
