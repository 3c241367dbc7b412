//! Parent-pointer pass.
//!
//! Runs once, immediately after parsing, and before every later pass: a
//! plain depth-first walk from the root that records each child's parent in
//! [`Ast`]'s side table. Walk order is always child-first from the arena
//! root, so the walk itself never has to contend with the cycle the
//! `parent` back-edges introduce into the reference graph.

use veil_base::NodeId;

use crate::ast::Ast;

/// Walks `ast` from `ast.root` and records a parent for every reachable
/// non-root node.
///
/// # Panics
///
/// Panics if `ast.root` is `None`.
pub fn set_parents(ast: &mut Ast) {
    let root = ast.root.expect("set_parents requires a root node");
    let mut stack = vec![root];
    while let Some(id) = stack.pop() {
        let children = ast.children(id);
        for child in children {
            ast.set_parent(child, id);
            stack.push(child);
        }
    }
}

/// Returns true if the graph induced by `parent` is a tree rooted at
/// `ast.root`: every reachable node has exactly one parent (the root has
/// none), and following `parent` from any node eventually reaches the root.
pub fn is_tree(ast: &Ast) -> bool {
    let Some(root) = ast.root else { return true };
    let mut stack = vec![root];
    let mut visited = std::collections::HashSet::new();
    while let Some(id) = stack.pop() {
        if !visited.insert(id) {
            return false;
        }
        for child in ast.children(id) {
            if ast.parent(child) != Some(id) {
                return false;
            }
            stack.push(child);
        }
    }
    true
}
