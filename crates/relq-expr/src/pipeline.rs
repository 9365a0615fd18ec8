//! The normalization pipeline
//!
//! Registers the five passes in their fixed order over the structural
//! fallback and runs the composition under a context carrying the driving
//! provider.

use crate::ast::ExprRef;
use crate::error::NormalizeResult;
use crate::eval::{Evaluate, Interpreter};
use crate::operators::OperatorCatalog;
use crate::pass::{
    ClosureExpander, EnumerableMethodsReducer, PartialEvaluator, QueryableConstantResolver,
    QueryableMethodsReducer,
};
use crate::source::ProviderRef;
use crate::visitor::context::VisitContext;
use crate::visitor::{ChildVisitor, Composition};
use relq_core::NormalizeConfig;
use std::path::Path;
use std::sync::{Arc, OnceLock};

/// A configured normalization pipeline
pub struct Normalizer {
    composition: Composition,
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Normalizer {
    /// Pipeline with every pass enabled
    pub fn new() -> Self {
        Self::from_config(&NormalizeConfig::default())
    }

    /// Pipeline honouring the depth limit and pass switches of `config`
    pub fn from_config(config: &NormalizeConfig) -> Self {
        Self::with_parts(
            config,
            Arc::new(Interpreter::with_max_depth(config.max_depth)),
            OperatorCatalog::standard(),
        )
    }

    /// Pipeline configured from `relq.yml` in `dir`
    pub fn from_config_dir(dir: &Path) -> NormalizeResult<Self> {
        let config = NormalizeConfig::load_from_dir(dir)?;
        Ok(Self::from_config(&config))
    }

    /// Pipeline over a custom evaluator and operator catalog
    pub fn with_parts(
        config: &NormalizeConfig,
        evaluator: Arc<dyn Evaluate>,
        catalog: Arc<OperatorCatalog>,
    ) -> Self {
        let passes = &config.passes;
        let mut composition = Composition::new().with_max_depth(config.max_depth);
        if passes.partial_evaluation {
            composition.register_boxed(Box::new(PartialEvaluator::new(evaluator.clone())));
        }
        if passes.constant_resolution {
            composition.register_boxed(Box::new(QueryableConstantResolver));
        }
        if passes.queryable_reduction {
            composition.register_boxed(Box::new(QueryableMethodsReducer::new(
                catalog.clone(),
                evaluator.clone(),
            )));
        }
        if passes.enumerable_reduction {
            composition.register_boxed(Box::new(EnumerableMethodsReducer::new(
                catalog,
                evaluator.clone(),
            )));
        }
        if passes.closure_expansion {
            composition.register_boxed(Box::new(ClosureExpander::new(evaluator)));
        }
        composition.register_boxed(Box::new(ChildVisitor));
        Self { composition }
    }

    pub fn composition(&self) -> &Composition {
        &self.composition
    }

    /// Normalize `tree` with `provider` as the driving provider
    pub fn normalize(&self, tree: &ExprRef, provider: &ProviderRef) -> NormalizeResult<ExprRef> {
        let context = VisitContext::for_provider(provider.clone());
        self.normalize_in(tree, &context)
    }

    /// Normalize `tree` under an explicit context
    pub fn normalize_in(&self, tree: &ExprRef, context: &VisitContext) -> NormalizeResult<ExprRef> {
        log::debug!(
            "Normalizing {} node with modules {:?}",
            tree.kind(),
            self.composition.module_names()
        );
        let normalized = self.composition.visit(tree, context)?;
        log::debug!(
            "Normalized to {} node (changed: {})",
            normalized.kind(),
            !Arc::ptr_eq(&normalized, tree)
        );
        Ok(normalized)
    }
}

/// Normalize `tree` with the default pipeline
pub fn normalize(tree: &ExprRef, provider: &ProviderRef) -> NormalizeResult<ExprRef> {
    static DEFAULT: OnceLock<Normalizer> = OnceLock::new();
    DEFAULT.get_or_init(Normalizer::new).normalize(tree, provider)
}
