//! Nearest-declaration lookup across a scope chain.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::trace;

use super::declaration::{HelperDeclaration, HelperId};
use crate::ds::error::{HelperError, HelperResult};
use crate::ds::scope::ScopeChain;

/// A declaration found for an identifier, and where in the chain it was found.
#[derive(Debug, Clone)]
pub struct Resolution {
    pub declaration: Arc<HelperDeclaration>,
    /// Chain depth of the declaring scope, 0 being the root.
    pub depth: usize,
}

/// Walks a [`ScopeChain`] innermost to outermost; the first scope declaring
/// the identifier wins. Nothing is cached here: every read resolves afresh so
/// one suite can serve any number of independent example instances.
pub struct HelperResolver;

impl HelperResolver {
    pub fn resolve(chain: &ScopeChain, id: &HelperId) -> HelperResult<Resolution> {
        Self::find(chain, id, chain.len())
            .ok_or_else(|| HelperError::NoSuchHelper { id: id.clone() })
    }

    /// Like [`resolve`](Self::resolve), but only considers scopes strictly
    /// outside `depth`. Used to reach a definition an inner group overrides.
    pub fn resolve_outer(chain: &ScopeChain, id: &HelperId, depth: usize) -> HelperResult<Resolution> {
        Self::find(chain, id, depth)
            .ok_or_else(|| HelperError::NoOuterDefinition { id: id.clone() })
    }

    /// Every identifier visible from the innermost scope of the chain.
    pub fn reachable(chain: &ScopeChain) -> Vec<HelperId> {
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for scope in chain.scopes().rev() {
            for d in scope.registry().declarations() {
                for slot in d.kind().slots() {
                    if scope.registry().lookup(&slot).map(|live| live.id()) == Some(d.id())
                        && seen.insert(slot.clone())
                    {
                        out.push(slot);
                    }
                }
            }
        }
        out
    }

    fn find(chain: &ScopeChain, id: &HelperId, below: usize) -> Option<Resolution> {
        let below = below.min(chain.len());
        let found = (0..below).rev().find_map(|depth| {
            chain
                .scope_at(depth)
                .and_then(|scope| scope.registry().lookup(id))
                .map(|declaration| Resolution {
                    declaration: declaration.clone(),
                    depth,
                })
        });
        match &found {
            Some(r) => trace!(
                helper = %id,
                depth = r.depth,
                declaration = %r.declaration.id(),
                "helper resolved"
            ),
            None => trace!(helper = %id, below, "helper not found"),
        }
        found
    }
}
