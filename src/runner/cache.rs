//! Per-example memoization of helper values.
//!
//! ## Caching Strategy
//!
//! - **Key**: the resolved declaration's [`DeclarationId`], never the
//!   identifier string. Aliases of one declaration share an entry; two
//!   declarations that happen to share a name do not.
//! - **First read**: run the definition block against the example, store the
//!   value, hand it out.
//! - **Later reads**: hand out the same `Rc`, so in-place mutation through a
//!   `RefCell` is visible to every reader.
//! - **Failure**: the block's error goes back to the caller as-is and the
//!   declaration is marked failed; it is never run a second time in the same
//!   example.
//! - **Re-entry**: a declaration still being computed cannot be requested
//!   again; that is a [`HelperError::CircularHelperEvaluation`]. A block that
//!   fails with a cycle error is discarded but not marked failed, so it runs
//!   again if read once the cycle is broken.
//!
//! A cache belongs to exactly one [`ExampleContext`] and is dropped with it.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, trace};

use crate::ds::error::{HelperError, HelperResult};
use crate::ds::value::HelperValue;
use crate::helper::declaration::{DeclarationId, HelperDeclaration, HelperId};
use crate::runner::context::ExampleContext;

enum CacheSlot {
    Ready(HelperValue),
    Failed,
}

pub struct MemoizationCache {
    slots: HashMap<DeclarationId, CacheSlot>,
    /// Declarations whose blocks are running, outermost first, with the
    /// identifier each was requested under.
    in_flight: Vec<(Arc<HelperDeclaration>, HelperId)>,
}

impl MemoizationCache {
    pub fn new() -> Self {
        MemoizationCache {
            slots: HashMap::new(),
            in_flight: Vec::new(),
        }
    }

    /// Number of successfully computed values.
    pub fn len(&self) -> usize {
        self.slots
            .values()
            .filter(|s| matches!(s, CacheSlot::Ready(_)))
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, declaration: DeclarationId) -> Option<&HelperValue> {
        match self.slots.get(&declaration) {
            Some(CacheSlot::Ready(value)) => Some(value),
            _ => None,
        }
    }

    pub fn contains(&self, declaration: DeclarationId) -> bool {
        self.get(declaration).is_some()
    }

    pub fn has_failed(&self, declaration: DeclarationId) -> bool {
        matches!(self.slots.get(&declaration), Some(CacheSlot::Failed))
    }

    /// The innermost in-flight declaration answering to `id`, if any.
    pub fn computing(&self, id: &HelperId) -> Option<&Arc<HelperDeclaration>> {
        self.in_flight
            .iter()
            .rev()
            .map(|(declaration, _)| declaration)
            .find(|declaration| declaration.answers_to(id))
    }

    /// Forget every in-flight computation. Called after a panic unwound
    /// through one or more blocks.
    pub(crate) fn abandon_in_flight(&mut self) {
        self.in_flight.clear();
    }

    /// Return the memoized value of `declaration` for this example, running
    /// its block first if this is the first request.
    pub fn get_or_compute(
        ctx: &mut ExampleContext,
        declaration: &Arc<HelperDeclaration>,
        requested: &HelperId,
    ) -> HelperResult<HelperValue> {
        let key = declaration.id();

        match ctx.cache.slots.get(&key) {
            Some(CacheSlot::Ready(value)) => {
                trace!(helper = %requested, declaration = %key, "helper cache hit");
                return Ok(value.clone());
            }
            Some(CacheSlot::Failed) => {
                return Err(HelperError::PreviouslyFailed {
                    id: requested.clone(),
                });
            }
            None => {}
        }

        if let Some(start) = ctx.cache.in_flight.iter().position(|(d, _)| d.id() == key) {
            let mut cycle: Vec<HelperId> = ctx.cache.in_flight[start..]
                .iter()
                .map(|(_, id)| id.clone())
                .collect();
            cycle.push(requested.clone());
            debug!(helper = %requested, depth = cycle.len(), "circular helper evaluation");
            return Err(HelperError::CircularHelperEvaluation {
                id: requested.clone(),
                cycle,
            });
        }

        trace!(helper = %requested, declaration = %key, "computing helper");
        ctx.cache.in_flight.push((declaration.clone(), requested.clone()));
        let block = declaration.block().clone();
        let result = (*block)(ctx);
        ctx.cache.in_flight.pop();

        match &result {
            Ok(value) => {
                ctx.cache.slots.insert(key, CacheSlot::Ready(value.clone()));
            }
            Err(HelperError::CircularHelperEvaluation { .. }) => {
                trace!(helper = %requested, declaration = %key, "helper discarded after cycle");
            }
            Err(err) => {
                debug!(helper = %requested, error = %err, "helper definition failed");
                ctx.cache.slots.insert(key, CacheSlot::Failed);
            }
        }
        result
    }
}

impl Default for MemoizationCache {
    fn default() -> Self {
        Self::new()
    }
}
