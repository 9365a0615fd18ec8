//! Visit context: an immutable, append-only store keyed by typed keys

use crate::ast::Expr;
use crate::error::{ContextError, EvalError};
use crate::source::ProviderRef;
use std::any::Any;
use std::marker::PhantomData;
use std::sync::Arc;

/// Typed key into a [`VisitContext`]
pub struct ContextKey<T> {
    name: &'static str,
    _marker: PhantomData<fn() -> T>,
}

impl<T> ContextKey<T> {
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            _marker: PhantomData,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

/// Observer for evaluation errors the passes recover from
pub type DiagnosticHook = Arc<dyn Fn(&EvalError, &Expr) + Send + Sync>;

/// The provider driving the current compilation
pub const PROVIDER: ContextKey<ProviderRef> = ContextKey::new("provider");

/// Optional hook receiving recovered evaluation errors
pub const DIAGNOSTICS: ContextKey<DiagnosticHook> = ContextKey::new("diagnostics");

struct Entry {
    name: &'static str,
    value: Arc<dyn Any + Send + Sync>,
    next: Option<Arc<Entry>>,
}

/// Immutable context threaded through a normalization run.
///
/// Adding a key returns a new context sharing all existing entries. Keys are
/// never shadowed: adding a present key is an error.
#[derive(Clone, Default)]
pub struct VisitContext {
    head: Option<Arc<Entry>>,
    len: usize,
}

impl VisitContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// A context holding only the driving provider
    pub fn for_provider(provider: ProviderRef) -> Self {
        Self {
            head: Some(Arc::new(Entry {
                name: PROVIDER.name(),
                value: Arc::new(provider),
                next: None,
            })),
            len: 1,
        }
    }

    /// A copy of this context with `key` bound to `value`
    pub fn with<T: Any + Send + Sync>(
        &self,
        key: &ContextKey<T>,
        value: T,
    ) -> Result<Self, ContextError> {
        if self.contains(key.name()) {
            return Err(ContextError::DuplicateKey { key: key.name() });
        }
        Ok(Self {
            head: Some(Arc::new(Entry {
                name: key.name(),
                value: Arc::new(value),
                next: self.head.clone(),
            })),
            len: self.len + 1,
        })
    }

    /// Look up `key`, distinguishing an absent key from a value of another type
    pub fn get<T: Any + Send + Sync>(&self, key: &ContextKey<T>) -> Result<&T, ContextError> {
        let entry = self
            .entries()
            .find(|e| e.name == key.name())
            .ok_or(ContextError::Missing { key: key.name() })?;
        entry
            .value
            .downcast_ref::<T>()
            .ok_or(ContextError::WrongType {
                key: key.name(),
                expected: std::any::type_name::<T>(),
            })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries().any(|e| e.name == name)
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Key names in insertion order
    pub fn keys(&self) -> Vec<&'static str> {
        let mut keys: Vec<&'static str> = self.entries().map(|e| e.name).collect();
        keys.reverse();
        keys
    }

    fn entries(&self) -> impl Iterator<Item = &Entry> {
        std::iter::successors(self.head.as_deref(), |e| e.next.as_deref())
    }
}

impl std::fmt::Debug for VisitContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VisitContext")
            .field("keys", &self.keys())
            .finish()
    }
}
