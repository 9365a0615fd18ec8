//! Composite visitor framework
//!
//! A [`Composition`] is an ordered registry of [`VisitorModule`]s over the
//! query AST. Dispatch asks modules in registration order and the first one
//! that claims a node rewrites it; modules recurse through the [`Visitor`]
//! cursor they are handed, so every sub-expression goes back through the
//! whole composition.

pub mod context;

use crate::ast::{Expr, ExprRef};
use crate::error::{EvalError, NormalizeError, NormalizeResult};
use context::{VisitContext, DIAGNOSTICS};
use relq_core::config::DEFAULT_MAX_DEPTH;
use std::sync::Arc;

/// One rewrite module of a composition
pub trait VisitorModule: Send + Sync {
    /// Module name (used in logs)
    fn name(&self) -> &'static str;

    /// Cheap structural test: does this module handle `node`?
    fn claims(&self, node: &Expr, context: &VisitContext) -> bool;

    /// Rewrite a claimed node
    fn visit(&self, node: &ExprRef, visitor: &Visitor<'_>) -> NormalizeResult<ExprRef>;
}

/// Ordered module registry
pub struct Composition {
    modules: Vec<Box<dyn VisitorModule>>,
    max_depth: usize,
}

impl Default for Composition {
    fn default() -> Self {
        Self::new()
    }
}

impl Composition {
    pub fn new() -> Self {
        Self {
            modules: Vec::new(),
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    /// Limit nested dispatch to `max_depth` levels
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Append a module; earlier modules take priority
    pub fn register(mut self, module: impl VisitorModule + 'static) -> Self {
        self.modules.push(Box::new(module));
        self
    }

    pub fn register_boxed(&mut self, module: Box<dyn VisitorModule>) {
        self.modules.push(module);
    }

    /// Module names in priority order
    pub fn module_names(&self) -> Vec<&'static str> {
        self.modules.iter().map(|m| m.name()).collect()
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Rewrite `node` under `context`
    pub fn visit(&self, node: &ExprRef, context: &VisitContext) -> NormalizeResult<ExprRef> {
        Visitor {
            composition: self,
            context,
            depth: 0,
        }
        .visit(node)
    }
}

/// Dispatch cursor handed to modules
#[derive(Clone, Copy)]
pub struct Visitor<'a> {
    composition: &'a Composition,
    context: &'a VisitContext,
    depth: usize,
}

impl<'a> Visitor<'a> {
    pub fn context(&self) -> &'a VisitContext {
        self.context
    }

    /// Nesting level of the node this cursor's children are visited at
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Dispatch `node` to the first module that claims it
    pub fn visit(&self, node: &ExprRef) -> NormalizeResult<ExprRef> {
        if self.depth >= self.composition.max_depth {
            return Err(NormalizeError::DepthExceeded {
                limit: self.composition.max_depth,
            });
        }
        let inner = Visitor {
            depth: self.depth + 1,
            ..*self
        };
        for module in &self.composition.modules {
            if module.claims(node, self.context) {
                log::trace!("{} claims {} node", module.name(), node.kind());
                return module.visit(node, &inner);
            }
        }
        Err(NormalizeError::NoHandler { kind: node.kind() })
    }

    /// Visit every child of `node`; rebuild it only if a child changed
    pub fn visit_children(&self, node: &ExprRef) -> NormalizeResult<ExprRef> {
        let children = node.children();
        if children.is_empty() {
            return Ok(node.clone());
        }
        let mut changed = false;
        let mut visited = Vec::with_capacity(children.len());
        for child in &children {
            let rewritten = self.visit(child)?;
            changed |= !Arc::ptr_eq(&rewritten, child);
            visited.push(rewritten);
        }
        if changed {
            Ok(node.with_children(visited))
        } else {
            Ok(node.clone())
        }
    }

    /// A cursor over an extended context at the same depth
    pub fn with_context<'b>(&'b self, context: &'b VisitContext) -> Visitor<'b>
    where
        'a: 'b,
    {
        Visitor {
            composition: self.composition,
            context,
            depth: self.depth,
        }
    }

    /// Hand a recovered evaluation error to the diagnostic hook, if any
    pub fn report(&self, error: &EvalError, node: &Expr) {
        if let Ok(hook) = self.context.get(&DIAGNOSTICS) {
            hook(error, node);
        }
    }
}

/// Structural fallback: claims every node and rewrites its children
#[derive(Debug, Default, Clone, Copy)]
pub struct ChildVisitor;

impl VisitorModule for ChildVisitor {
    fn name(&self) -> &'static str {
        "child_visitor"
    }

    fn claims(&self, _node: &Expr, _context: &VisitContext) -> bool {
        true
    }

    fn visit(&self, node: &ExprRef, visitor: &Visitor<'_>) -> NormalizeResult<ExprRef> {
        visitor.visit_children(node)
    }
}

#[cfg(test)]
#[path = "visitor_test.rs"]
mod tests;
