//! The collected suite definition and the builder that collects it.
//!
//! [`SuiteBuilder`] is the group-builder side of the engine: it creates nested
//! scopes and records `subject`/`let` declarations, hooks and examples in
//! declaration order. [`SuiteBuilder::build`] freezes everything into a
//! [`Suite`], which is never mutated again and can be shared by examples
//! running on any number of threads.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::ds::error::HelperResult;
use crate::ds::scope::{Scope, ScopeId};
use crate::ds::value::helper_value;
use crate::helper::config::ResolverConfig;
use crate::helper::declaration::{DeclarationId, DefinitionBlock, HelperKind};
use crate::runner::context::ExampleContext;
use crate::runner::eager::{ExampleAction, Hook};

/// The body of one example.
pub type ExampleBody = Arc<dyn Fn(&mut ExampleContext) -> HelperResult<()> + Send + Sync>;

pub struct ExampleDefinition {
    description: String,
    scope: ScopeId,
    body: ExampleBody,
}

impl ExampleDefinition {
    pub fn description(&self) -> &str {
        &self.description
    }

    /// The example's immediately enclosing scope.
    pub fn scope(&self) -> ScopeId {
        self.scope
    }

    pub fn body(&self) -> &ExampleBody {
        &self.body
    }
}

impl fmt::Debug for ExampleDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExampleDefinition")
            .field("description", &self.description)
            .field("scope", &self.scope)
            .finish()
    }
}

/// An immutable, collected suite: every scope, its declarations and hooks,
/// and the examples in declaration order.
pub struct Suite {
    scopes: Vec<Scope>,
    examples: Vec<ExampleDefinition>,
    config: ResolverConfig,
}

impl Suite {
    pub fn root(&self) -> ScopeId {
        ScopeId::ROOT
    }

    pub fn scope(&self, id: ScopeId) -> Option<&Scope> {
        self.scopes.get(id.index())
    }

    pub fn scope_count(&self) -> usize {
        self.scopes.len()
    }

    pub fn examples(&self) -> &[ExampleDefinition] {
        &self.examples
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }
}

/// Collects groups, helpers, hooks and examples.
///
/// # Panics
///
/// Every method taking a [`ScopeId`] panics if the id was not produced by
/// this builder.
pub struct SuiteBuilder {
    scopes: Vec<Scope>,
    examples: Vec<ExampleDefinition>,
    config: ResolverConfig,
}

impl SuiteBuilder {
    /// Start a suite whose root group has the given description.
    pub fn new(description: impl Into<String>) -> Self {
        Self::with_config(description, ResolverConfig::default())
    }

    pub fn with_config(description: impl Into<String>, config: ResolverConfig) -> Self {
        let root = Scope::new(ScopeId::ROOT, None, description.into(), config.redeclaration);
        SuiteBuilder {
            scopes: vec![root],
            examples: Vec::new(),
            config,
        }
    }

    pub fn root(&self) -> ScopeId {
        ScopeId::ROOT
    }

    /// Open a nested group under `parent`.
    pub fn group(&mut self, parent: ScopeId, description: impl Into<String>) -> ScopeId {
        self.check_scope(parent);
        let id = ScopeId::new(self.scopes.len());
        self.scopes.push(Scope::new(
            id,
            Some(parent),
            description.into(),
            self.config.redeclaration,
        ));
        id
    }

    /// Record a declaration. Eager declarations also register their
    /// pre-example action here, at the point of declaration.
    pub fn declare_helper(
        &mut self,
        scope: ScopeId,
        kind: HelperKind,
        block: DefinitionBlock,
        eager: bool,
    ) -> DeclarationId {
        let target = self.scope_mut(scope);
        let declaration = target.registry_mut().declare(kind, block, eager);
        debug!(
            scope = %scope,
            kind = ?declaration.kind(),
            eager,
            declaration = %declaration.id(),
            "helper declared"
        );
        if eager {
            target.push_action(ExampleAction::Eager(declaration.clone()));
        }
        declaration.id()
    }

    /// Typed convenience over [`declare_helper`](Self::declare_helper).
    pub fn declare<T, F>(&mut self, scope: ScopeId, kind: HelperKind, block: F, eager: bool) -> DeclarationId
    where
        T: Any,
        F: Fn(&mut ExampleContext) -> HelperResult<T> + Send + Sync + 'static,
    {
        let block: DefinitionBlock =
            Arc::new(move |ctx: &mut ExampleContext| block(ctx).map(|v| helper_value(v)));
        self.declare_helper(scope, kind, block, eager)
    }

    /// `subject { ... }`
    pub fn subject<T, F>(&mut self, scope: ScopeId, block: F) -> DeclarationId
    where
        T: Any,
        F: Fn(&mut ExampleContext) -> HelperResult<T> + Send + Sync + 'static,
    {
        self.declare(scope, HelperKind::Subject(None), block, false)
    }

    /// `subject(:name) { ... }`
    pub fn subject_named<T, F>(&mut self, scope: ScopeId, name: &str, block: F) -> DeclarationId
    where
        T: Any,
        F: Fn(&mut ExampleContext) -> HelperResult<T> + Send + Sync + 'static,
    {
        self.declare(scope, HelperKind::Subject(Some(name.to_string())), block, false)
    }

    /// `subject! { ... }`
    pub fn subject_eager<T, F>(&mut self, scope: ScopeId, block: F) -> DeclarationId
    where
        T: Any,
        F: Fn(&mut ExampleContext) -> HelperResult<T> + Send + Sync + 'static,
    {
        self.declare(scope, HelperKind::Subject(None), block, true)
    }

    /// `subject!(:name) { ... }`
    pub fn subject_named_eager<T, F>(&mut self, scope: ScopeId, name: &str, block: F) -> DeclarationId
    where
        T: Any,
        F: Fn(&mut ExampleContext) -> HelperResult<T> + Send + Sync + 'static,
    {
        self.declare(scope, HelperKind::Subject(Some(name.to_string())), block, true)
    }

    /// `let(:name) { ... }`
    pub fn let_helper<T, F>(&mut self, scope: ScopeId, name: &str, block: F) -> DeclarationId
    where
        T: Any,
        F: Fn(&mut ExampleContext) -> HelperResult<T> + Send + Sync + 'static,
    {
        self.declare(scope, HelperKind::Let(name.to_string()), block, false)
    }

    /// `let!(:name) { ... }`
    pub fn let_eager<T, F>(&mut self, scope: ScopeId, name: &str, block: F) -> DeclarationId
    where
        T: Any,
        F: Fn(&mut ExampleContext) -> HelperResult<T> + Send + Sync + 'static,
    {
        self.declare(scope, HelperKind::Let(name.to_string()), block, true)
    }

    /// Pre-example hook, run in declaration order with eager evaluations.
    pub fn before<F>(&mut self, scope: ScopeId, hook: F)
    where
        F: Fn(&mut ExampleContext) -> HelperResult<()> + Send + Sync + 'static,
    {
        let hook: Hook = Arc::new(hook);
        self.scope_mut(scope).push_action(ExampleAction::Before(hook));
    }

    /// Post-example hook. Runs after the body, innermost group first.
    pub fn after<F>(&mut self, scope: ScopeId, hook: F)
    where
        F: Fn(&mut ExampleContext) -> HelperResult<()> + Send + Sync + 'static,
    {
        self.scope_mut(scope).push_after_hook(Arc::new(hook));
    }

    pub fn example<F>(&mut self, scope: ScopeId, description: impl Into<String>, body: F)
    where
        F: Fn(&mut ExampleContext) -> HelperResult<()> + Send + Sync + 'static,
    {
        self.check_scope(scope);
        self.examples.push(ExampleDefinition {
            description: description.into(),
            scope,
            body: Arc::new(body),
        });
    }

    fn check_scope(&self, scope: ScopeId) {
        assert!(
            scope.index() < self.scopes.len(),
            "unknown scope {}: not created by this builder",
            scope
        );
    }

    fn scope_mut(&mut self, scope: ScopeId) -> &mut Scope {
        self.check_scope(scope);
        &mut self.scopes[scope.index()]
    }

    /// Freeze the collected definitions.
    pub fn build(self) -> Arc<Suite> {
        debug!(
            scopes = self.scopes.len(),
            examples = self.examples.len(),
            "suite collected"
        );
        Arc::new(Suite {
            scopes: self.scopes,
            examples: self.examples,
            config: self.config,
        })
    }
}
