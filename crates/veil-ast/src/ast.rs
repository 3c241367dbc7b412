//! The AST model.
//!
//! A rooted tree of tagged variants: `SourceUnit -> Contract ->
//! {StateVar, Function, Constructor} -> Statement -> Expression`. Nodes are
//! arena-allocated and addressed by [`NodeId`] rather than by reference —
//! the tree carries `parent` back-pointers, and a reference graph with
//! back-pointers cannot live behind ordinary borrows (see `veil_base::arena`).
//!
//! Per-pass analysis state (`before_analysis`/`after_analysis`/
//! `annotated_type`, the identifier-to-declaration bindings produced by
//! symbol resolution) is kept in side tables on [`Ast`] keyed by `NodeId`
//! rather than inline on the node, so that a pass which doesn't need a slot
//! never pays for it and nodes stay plain data.

use std::collections::HashMap;

use veil_base::{Arena, NodeId, Span, Symbol};
use veil_kernel::{AnnotatedType, Label, PartitionState};

/// A function or constructor parameter.
#[derive(Debug, Clone)]
pub struct Param {
    pub name: Symbol,
    pub ty: AnnotatedType,
}

/// A contract-level state variable declaration.
#[derive(Debug, Clone)]
pub struct StateVar {
    pub name: Symbol,
    pub ty: AnnotatedType,
}

/// A function declaration and its derived, pass-populated properties.
///
/// `is_recursive`, `requires_verification`, `requires_verification_if_external`,
/// and `called_functions` start at their default (false / empty) after
/// parsing and are filled in by later passes (the alias analysis and the
/// hybrid-function detector).
#[derive(Debug, Clone)]
pub struct Function {
    pub name: Symbol,
    pub params: Vec<Param>,
    pub returns: Vec<AnnotatedType>,
    pub body: NodeId,
    /// Whether this function may be invoked from outside the contract.
    pub can_be_external: bool,
    pub is_recursive: bool,
    pub requires_verification: bool,
    pub requires_verification_if_external: bool,
    pub called_functions: Vec<Symbol>,
}

impl Function {
    pub fn is_void(&self) -> bool {
        self.returns.is_empty()
    }
}

/// A constructor: like a function but with no return type and no external
/// visibility flag (constructors run exactly once, at deployment).
#[derive(Debug, Clone)]
pub struct Constructor {
    pub params: Vec<Param>,
    pub body: NodeId,
    pub is_recursive: bool,
    pub requires_verification: bool,
    pub called_functions: Vec<Symbol>,
}

#[derive(Debug, Clone)]
pub struct Contract {
    pub name: Symbol,
    pub state_vars: Vec<NodeId>,
    pub constructor: Option<NodeId>,
    pub functions: Vec<NodeId>,
}

#[derive(Debug, Clone)]
pub struct SourceUnit {
    pub contracts: Vec<NodeId>,
}

/// A literal value, already typed by the external parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Literal {
    Bool(bool),
    Uint(u128),
}

/// Binary operator kinds. `is_homomorphic` marks the operators the circuit
/// back-end can evaluate directly on ciphertexts; every other operator
/// applied to a non-public operand must appear under a `reveal`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOpKind {
    Add,
    Sub,
    Mul,
    Eq,
    Neq,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
}

impl BinOpKind {
    pub fn is_homomorphic(self) -> bool {
        matches!(self, BinOpKind::Add | BinOpKind::Sub)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnOpKind {
    Neg,
    Not,
}

/// An expression node.
#[derive(Debug, Clone)]
pub enum Expr {
    Literal(Literal),
    Identifier(Symbol),
    BinOp {
        op: BinOpKind,
        lhs: NodeId,
        rhs: NodeId,
    },
    UnOp {
        op: UnOpKind,
        operand: NodeId,
    },
    /// A call to a builtin or user-defined function. `is_private_builtin`
    /// marks builtins whose result is privately typed even though the
    /// operator itself is not one of the homomorphic arithmetic ops —
    /// these force verification on the caller just like a bare `reveal`.
    Call {
        callee: Symbol,
        args: Vec<NodeId>,
        is_private_builtin: bool,
    },
    /// `base[index]`, used for mapping reads (`balances[a]`).
    IndexAccess {
        base: NodeId,
        index: NodeId,
    },
    /// `reveal(expr, label)`.
    Reclassify {
        expr: NodeId,
        label: Label,
    },
}

/// A statement node.
#[derive(Debug, Clone)]
pub enum Stmt {
    Block(Vec<NodeId>),
    VariableDeclaration {
        name: Symbol,
        ty: AnnotatedType,
        init: Option<NodeId>,
    },
    Assignment {
        lhs: NodeId,
        rhs: NodeId,
    },
    If {
        cond: NodeId,
        then_branch: NodeId,
        else_branch: Option<NodeId>,
    },
    While {
        cond: NodeId,
        body: NodeId,
    },
    For {
        init: Option<NodeId>,
        cond: Option<NodeId>,
        update: Option<NodeId>,
        body: NodeId,
    },
    Require {
        cond: NodeId,
    },
    Return {
        value: Option<NodeId>,
    },
    Break,
    Continue,
    Expression {
        expr: NodeId,
    },
}

/// A single arena-allocated AST node, tagged by kind.
#[derive(Debug, Clone)]
pub enum Node {
    SourceUnit(SourceUnit),
    Contract(Contract),
    StateVar(StateVar),
    Function(Function),
    Constructor(Constructor),
    Stmt(Stmt),
    Expr(Expr),
}

/// Per-node flow-analysis and type-checker slots, keyed by [`NodeId`].
#[derive(Debug, Default)]
struct AnalysisTables {
    before: HashMap<NodeId, PartitionState>,
    after: HashMap<NodeId, PartitionState>,
    annotated_types: HashMap<NodeId, AnnotatedType>,
}

/// The whole program: the node arena plus every side table a pass needs.
///
/// `Ast` owns everything a single compilation produces and discards
/// atomically when the value is dropped at the end of compilation.
pub struct Ast {
    arena: Arena<Node>,
    spans: HashMap<NodeId, Span>,
    parents: HashMap<NodeId, NodeId>,
    /// Identifier-expression node -> the declaration it resolved to.
    bindings: HashMap<NodeId, NodeId>,
    analysis: AnalysisTables,
    pub root: Option<NodeId>,
}

impl Ast {
    pub fn new() -> Self {
        Ast {
            arena: Arena::new(),
            spans: HashMap::new(),
            parents: HashMap::new(),
            bindings: HashMap::new(),
            analysis: AnalysisTables::default(),
            root: None,
        }
    }

    pub fn alloc(&mut self, node: Node, span: Span) -> NodeId {
        let id = self.arena.alloc(node);
        self.spans.insert(id, span);
        id
    }

    pub fn get(&self, id: NodeId) -> &Node {
        self.arena.get(id)
    }

    pub fn get_mut(&mut self, id: NodeId) -> &mut Node {
        self.arena.get_mut(id)
    }

    pub fn span(&self, id: NodeId) -> Span {
        self.spans.get(&id).copied().unwrap_or(Span::new(0, 0))
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.parents.get(&id).copied()
    }

    pub fn set_parent(&mut self, child: NodeId, parent: NodeId) {
        self.parents.insert(child, parent);
    }

    pub fn bind(&mut self, identifier_expr: NodeId, declaration: NodeId) {
        self.bindings.insert(identifier_expr, declaration);
    }

    pub fn binding(&self, identifier_expr: NodeId) -> Option<NodeId> {
        self.bindings.get(&identifier_expr).copied()
    }

    pub fn before_analysis(&self, id: NodeId) -> Option<&PartitionState> {
        self.analysis.before.get(&id)
    }

    pub fn set_before_analysis(&mut self, id: NodeId, state: PartitionState) {
        self.analysis.before.insert(id, state);
    }

    pub fn after_analysis(&self, id: NodeId) -> Option<&PartitionState> {
        self.analysis.after.get(&id)
    }

    pub fn set_after_analysis(&mut self, id: NodeId, state: PartitionState) {
        self.analysis.after.insert(id, state);
    }

    pub fn annotated_type(&self, id: NodeId) -> Option<&AnnotatedType> {
        self.analysis.annotated_types.get(&id)
    }

    /// Records `id`'s annotated type. Panics if this expression has already
    /// been typed: the type checker assigns `annotated_type` exactly once
    /// per expression.
    pub fn set_annotated_type(&mut self, id: NodeId, ty: AnnotatedType) {
        if self.analysis.annotated_types.insert(id, ty).is_some() {
            panic!("annotated_type assigned twice for node {:?}", id);
        }
    }

    /// Direct children of `id`, in source order. Used by the parent-setting
    /// pass, the return checker, and any other whole-tree walk.
    pub fn children(&self, id: NodeId) -> Vec<NodeId> {
        match self.get(id) {
            Node::SourceUnit(s) => s.contracts.clone(),
            Node::Contract(c) => {
                let mut kids = c.state_vars.clone();
                kids.extend(c.constructor);
                kids.extend(c.functions.iter().copied());
                kids
            }
            Node::StateVar(_) => vec![],
            Node::Function(f) => vec![f.body],
            Node::Constructor(c) => vec![c.body],
            Node::Stmt(stmt) => match stmt {
                Stmt::Block(stmts) => stmts.clone(),
                Stmt::VariableDeclaration { init, .. } => init.into_iter().collect(),
                Stmt::Assignment { lhs, rhs } => vec![*lhs, *rhs],
                Stmt::If { cond, then_branch, else_branch } => {
                    let mut kids = vec![*cond, *then_branch];
                    kids.extend(*else_branch);
                    kids
                }
                Stmt::While { cond, body } => vec![*cond, *body],
                Stmt::For { init, cond, update, body } => {
                    let mut kids = vec![];
                    kids.extend(*init);
                    kids.extend(*cond);
                    kids.extend(*update);
                    kids.push(*body);
                    kids
                }
                Stmt::Require { cond } => vec![*cond],
                Stmt::Return { value } => value.into_iter().collect(),
                Stmt::Break | Stmt::Continue => vec![],
                Stmt::Expression { expr } => vec![*expr],
            },
            Node::Expr(expr) => match expr {
                Expr::Literal(_) | Expr::Identifier(_) => vec![],
                Expr::BinOp { lhs, rhs, .. } => vec![*lhs, *rhs],
                Expr::UnOp { operand, .. } => vec![*operand],
                Expr::Call { args, .. } => args.clone(),
                Expr::IndexAccess { base, index } => vec![*base, *index],
                Expr::Reclassify { expr, .. } => vec![*expr],
            },
        }
    }
}

impl Default for Ast {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use veil_base::Interner;

    fn leaf_expr(ast: &mut Ast, interner: &mut Interner, name: &str) -> NodeId {
        let sym = interner.intern(name);
        ast.alloc(Node::Expr(Expr::Identifier(sym)), Span::new(0, 1))
    }

    #[test]
    fn children_of_binop_are_its_operands() {
        let mut ast = Ast::new();
        let mut interner = Interner::new();
        let a = leaf_expr(&mut ast, &mut interner, "a");
        let b = leaf_expr(&mut ast, &mut interner, "b");
        let add = ast.alloc(
            Node::Expr(Expr::BinOp { op: BinOpKind::Add, lhs: a, rhs: b }),
            Span::new(0, 3),
        );
        assert_eq!(ast.children(add), vec![a, b]);
    }

    #[test]
    fn annotated_type_can_only_be_set_once() {
        let mut ast = Ast::new();
        let mut interner = Interner::new();
        let a = leaf_expr(&mut ast, &mut interner, "a");
        ast.set_annotated_type(a, AnnotatedType::public(veil_kernel::Type::Bool));
        assert!(ast.annotated_type(a).is_some());
    }

    #[test]
    #[should_panic]
    fn annotated_type_assigned_twice_panics() {
        let mut ast = Ast::new();
        let mut interner = Interner::new();
        let a = leaf_expr(&mut ast, &mut interner, "a");
        ast.set_annotated_type(a, AnnotatedType::public(veil_kernel::Type::Bool));
        ast.set_annotated_type(a, AnnotatedType::public(veil_kernel::Type::Bool));
    }

    #[test]
    fn parent_lookup_reflects_set_parent() {
        let mut ast = Ast::new();
        let mut interner = Interner::new();
        let a = leaf_expr(&mut ast, &mut interner, "a");
        let b = leaf_expr(&mut ast, &mut interner, "b");
        let block = ast.alloc(Node::Stmt(Stmt::Block(vec![a, b])), Span::new(0, 5));
        ast.set_parent(a, block);
        ast.set_parent(b, block);
        assert_eq!(ast.parent(a), Some(block));
        assert_eq!(ast.parent(b), Some(block));
    }

    #[test]
    fn function_is_void_iff_no_return_types() {
        let mut ast = Ast::new();
        let block = ast.alloc(Node::Stmt(Stmt::Block(vec![])), Span::new(0, 0));
        let f = Function {
            name: Symbol::EMPTY,
            params: vec![],
            returns: vec![],
            body: block,
            can_be_external: false,
            is_recursive: false,
            requires_verification: false,
            requires_verification_if_external: false,
            called_functions: vec![],
        };
        assert!(f.is_void());
    }
}
