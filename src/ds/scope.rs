use std::fmt;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

use crate::ds::error::{HelperError, HelperResult};
use crate::ds::suite::Suite;
use crate::helper::config::RedeclarationPolicy;
use crate::helper::registry::HelperRegistry;
use crate::runner::eager::{ExampleAction, Hook};

/// Index of a scope inside its [`Suite`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScopeId(usize);

impl ScopeId {
    pub const ROOT: ScopeId = ScopeId(0);

    pub(crate) fn new(index: usize) -> Self {
        ScopeId(index)
    }

    pub fn index(self) -> usize {
        self.0
    }
}

impl Display for ScopeId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One group scope. Read-only once the suite is built.
pub struct Scope {
    id: ScopeId,
    /// Enclosing scope. A back-reference by id; the suite owns every scope.
    parent: Option<ScopeId>,
    description: String,
    registry: HelperRegistry,
    /// `before` hooks and eager evaluations, in declaration order.
    actions: Vec<ExampleAction>,
    after_hooks: Vec<Hook>,
}

impl Scope {
    pub(crate) fn new(
        id: ScopeId,
        parent: Option<ScopeId>,
        description: String,
        policy: RedeclarationPolicy,
    ) -> Self {
        Scope {
            id,
            parent,
            description,
            registry: HelperRegistry::new(id, policy),
            actions: Vec::new(),
            after_hooks: Vec::new(),
        }
    }

    pub fn id(&self) -> ScopeId {
        self.id
    }

    pub fn parent(&self) -> Option<ScopeId> {
        self.parent
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn registry(&self) -> &HelperRegistry {
        &self.registry
    }

    pub fn actions(&self) -> &[ExampleAction] {
        &self.actions
    }

    pub fn after_hooks(&self) -> &[Hook] {
        &self.after_hooks
    }

    pub(crate) fn registry_mut(&mut self) -> &mut HelperRegistry {
        &mut self.registry
    }

    pub(crate) fn push_action(&mut self, action: ExampleAction) {
        self.actions.push(action);
    }

    pub(crate) fn push_after_hook(&mut self, hook: Hook) {
        self.after_hooks.push(hook);
    }
}

/// The scopes an example executes within, outermost first.
#[derive(Clone)]
pub struct ScopeChain {
    suite: Arc<Suite>,
    scopes: Vec<ScopeId>,
}

impl ScopeChain {
    /// Build the chain from the suite root down to `leaf`.
    pub fn new(suite: &Arc<Suite>, leaf: ScopeId) -> HelperResult<Self> {
        let mut scopes = Vec::new();
        let mut current = Some(leaf);
        while let Some(id) = current {
            let scope = suite.scope(id).ok_or(HelperError::UnknownScope(id))?;
            scopes.push(id);
            current = scope.parent();
        }
        scopes.reverse();

        Ok(ScopeChain {
            suite: suite.clone(),
            scopes,
        })
    }

    pub fn suite(&self) -> &Arc<Suite> {
        &self.suite
    }

    pub fn len(&self) -> usize {
        self.scopes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scopes.is_empty()
    }

    /// The example's immediately enclosing scope.
    pub fn leaf(&self) -> Option<ScopeId> {
        self.scopes.last().copied()
    }

    pub fn ids(&self) -> &[ScopeId] {
        &self.scopes
    }

    /// Position of `scope` in the chain, 0 being the root.
    pub fn depth_of(&self, scope: ScopeId) -> Option<usize> {
        self.scopes.iter().position(|s| *s == scope)
    }

    pub fn scope_at(&self, depth: usize) -> Option<&Scope> {
        self.scopes.get(depth).and_then(|id| self.suite.scope(*id))
    }

    /// Scopes outermost first.
    pub fn scopes(&self) -> impl DoubleEndedIterator<Item = &Scope> + '_ {
        self.scopes.iter().filter_map(move |id| self.suite.scope(*id))
    }

    /// Group descriptions joined the way a runner prints a full example name.
    pub fn describe(&self) -> String {
        self.scopes()
            .map(|s| s.description())
            .filter(|d| !d.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl fmt::Debug for ScopeChain {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScopeChain")
            .field("scopes", &self.scopes)
            .finish()
    }
}
