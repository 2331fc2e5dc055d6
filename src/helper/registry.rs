//! Per-scope helper registry.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::trace;

use super::config::RedeclarationPolicy;
use super::declaration::{DeclarationId, DefinitionBlock, HelperDeclaration, HelperId, HelperKind};
use crate::ds::scope::ScopeId;

/// Declarations made directly in one scope.
///
/// Lookups never walk to enclosing scopes; that is [`HelperResolver`](super::resolver::HelperResolver)'s job.
pub struct HelperRegistry {
    scope: ScopeId,
    policy: RedeclarationPolicy,
    /// Slot → declaration. Aliases of one declaration share the same `Arc`.
    slots: HashMap<HelperId, Arc<HelperDeclaration>>,
    /// Declaration ids in the order they were declared, replaced ones included.
    order: Vec<DeclarationId>,
}

impl HelperRegistry {
    pub fn new(scope: ScopeId, policy: RedeclarationPolicy) -> Self {
        HelperRegistry {
            scope,
            policy,
            slots: HashMap::new(),
            order: Vec::new(),
        }
    }

    /// Declare a helper. Any declaration already holding one of its slots is
    /// overwritten; under [`RedeclarationPolicy::Replace`] the overwritten
    /// declaration also loses every other alias it held here.
    pub fn declare(
        &mut self,
        kind: HelperKind,
        block: DefinitionBlock,
        eager: bool,
    ) -> Arc<HelperDeclaration> {
        let declaration = Arc::new(HelperDeclaration::new(kind, self.scope, block, eager));
        let mut replaced = Vec::new();

        for slot in declaration.kind().slots() {
            if let Some(previous) = self.slots.insert(slot.clone(), declaration.clone()) {
                trace!(scope = %self.scope, helper = %slot, "helper redeclared");
                replaced.push(previous.id());
            }
        }

        if self.policy == RedeclarationPolicy::Replace && !replaced.is_empty() {
            self.slots.retain(|_, d| !replaced.contains(&d.id()));
        }

        self.order.push(declaration.id());
        declaration
    }

    /// Scope-local lookup.
    pub fn lookup(&self, id: &HelperId) -> Option<&Arc<HelperDeclaration>> {
        self.slots.get(id)
    }

    pub fn has_helper(&self, id: &HelperId) -> bool {
        self.slots.contains_key(id)
    }

    /// Is this declaration still reachable under at least one slot?
    pub fn is_live(&self, declaration: DeclarationId) -> bool {
        self.slots.values().any(|d| d.id() == declaration)
    }

    /// Identifiers currently declared in this scope.
    pub fn identifiers(&self) -> Vec<&HelperId> {
        self.slots.keys().collect()
    }

    /// Live declarations in declaration order, each once.
    pub fn declarations(&self) -> Vec<Arc<HelperDeclaration>> {
        let mut out: Vec<Arc<HelperDeclaration>> = Vec::new();
        for id in &self.order {
            if let Some(d) = self.slots.values().find(|d| d.id() == *id) {
                out.push(d.clone());
            }
        }
        out
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ds::error::HelperResult;
    use crate::ds::value::{helper_value, HelperValue};
    use crate::runner::context::ExampleContext;

    fn block(n: i32) -> DefinitionBlock {
        Arc::new(move |_ctx: &mut ExampleContext| -> HelperResult<HelperValue> {
            Ok(helper_value(n))
        })
    }

    #[test]
    fn test_named_subject_occupies_both_slots() {
        let mut registry = HelperRegistry::new(ScopeId::ROOT, RedeclarationPolicy::Replace);
        let d = registry.declare(HelperKind::Subject(Some("count".to_string())), block(1), false);

        let by_default = registry.lookup(&HelperId::Default).unwrap();
        let by_name = registry.lookup(&HelperId::named("count")).unwrap();
        assert_eq!(by_default.id(), d.id());
        assert_eq!(by_name.id(), d.id());
        assert_eq!(registry.declarations().len(), 1);
    }

    #[test]
    fn test_let_does_not_touch_default_slot() {
        let mut registry = HelperRegistry::new(ScopeId::ROOT, RedeclarationPolicy::Replace);
        registry.declare(HelperKind::Let("user".to_string()), block(1), false);
        assert!(registry.lookup(&HelperId::Default).is_none());
        assert!(registry.has_helper(&HelperId::named("user")));
    }

    #[test]
    fn test_replace_policy_drops_old_aliases() {
        let mut registry = HelperRegistry::new(ScopeId::ROOT, RedeclarationPolicy::Replace);
        let old = registry.declare(HelperKind::Subject(Some("count".to_string())), block(1), false);
        let new = registry.declare(HelperKind::Subject(None), block(2), false);

        assert_eq!(registry.lookup(&HelperId::Default).unwrap().id(), new.id());
        assert!(registry.lookup(&HelperId::named("count")).is_none());
        assert!(!registry.is_live(old.id()));
    }

    #[test]
    fn test_keep_aliases_policy_leaves_other_names_bound() {
        let mut registry = HelperRegistry::new(ScopeId::ROOT, RedeclarationPolicy::KeepAliases);
        let old = registry.declare(HelperKind::Subject(Some("count".to_string())), block(1), false);
        let new = registry.declare(HelperKind::Subject(None), block(2), false);

        assert_eq!(registry.lookup(&HelperId::Default).unwrap().id(), new.id());
        assert_eq!(registry.lookup(&HelperId::named("count")).unwrap().id(), old.id());
        assert!(registry.is_live(old.id()));
        assert_eq!(registry.declarations().len(), 2);
    }

    #[test]
    fn test_same_identifier_last_write_wins() {
        let mut registry = HelperRegistry::new(ScopeId::ROOT, RedeclarationPolicy::Replace);
        registry.declare(HelperKind::Let("x".to_string()), block(1), true);
        let second = registry.declare(HelperKind::Let("x".to_string()), block(2), false);
        let found = registry.lookup(&HelperId::named("x")).unwrap();
        assert_eq!(found.id(), second.id());
        assert!(!found.is_eager());
    }
}
