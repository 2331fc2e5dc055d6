//! The object an example body runs against.
//!
//! One [`ExampleContext`] exists per example run. It owns the example's
//! [`MemoizationCache`], so nothing computed in one example is ever visible in
//! another, even for the same declaration.
//!
//! ## Lifecycle
//!
//! ```text
//! ExampleContext::new(chain)      Uninitialized → ScopeBound
//! run_eager_phase()               ScopeBound    → EagerPhase  (never skipped)
//! run_body(body)                  EagerPhase    → Running     (only if every action passed)
//! run_after_hooks()               (EagerPhase | Running) → TearingDown, once
//! discard()                       → Finished, cache dropped
//! ```

use std::any::Any;
use std::fmt;
use std::fmt::{Debug, Display, Formatter};
use std::rc::Rc;
use std::sync::Arc;

use tracing::debug;

use crate::ds::error::{HelperError, HelperResult};
use crate::ds::scope::ScopeChain;
use crate::ds::value::{downcast_value, HelperValue};
use crate::helper::config::ResolverConfig;
use crate::helper::declaration::{HelperDeclaration, HelperId};
use crate::helper::resolver::HelperResolver;
use crate::runner::cache::MemoizationCache;
use crate::runner::eager::{EagerBinder, Hook};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExamplePhase {
    /// Chain assigned, cache empty.
    ScopeBound,
    /// Pre-example actions (eager evaluations and `before` hooks) running.
    EagerPhase,
    /// Example body running; lazy reads fill the cache on demand.
    Running,
    /// `after` hooks running. Helpers stay readable.
    TearingDown,
    /// Terminal. The cache has been discarded.
    Finished,
}

impl Display for ExamplePhase {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let name = match self {
            ExamplePhase::ScopeBound => "scope-bound",
            ExamplePhase::EagerPhase => "in its eager phase",
            ExamplePhase::Running => "running",
            ExamplePhase::TearingDown => "tearing down",
            ExamplePhase::Finished => "finished",
        };
        f.write_str(name)
    }
}

pub struct ExampleContext {
    chain: ScopeChain,
    pub(crate) cache: MemoizationCache,
    phase: ExamplePhase,
    eager_complete: bool,
}

impl ExampleContext {
    /// Bind a fresh example instance to its scope chain, with an empty cache.
    pub fn new(chain: ScopeChain) -> Self {
        debug!(group = %chain.describe(), depth = chain.len(), "example context created");
        ExampleContext {
            chain,
            cache: MemoizationCache::new(),
            phase: ExamplePhase::ScopeBound,
            eager_complete: false,
        }
    }

    pub fn phase(&self) -> ExamplePhase {
        self.phase
    }

    pub fn chain(&self) -> &ScopeChain {
        &self.chain
    }

    pub fn config(&self) -> ResolverConfig {
        *self.chain.suite().config()
    }

    /// Run every pre-example action of the chain, in order. Stops at the
    /// first failing action.
    pub fn run_eager_phase(&mut self) -> HelperResult<()> {
        self.require_phase(ExamplePhase::ScopeBound, "run the eager phase")?;
        self.transition(ExamplePhase::EagerPhase);

        let actions = EagerBinder::bind(&self.chain);
        for action in &actions {
            EagerBinder::run(self, action)?;
        }
        self.eager_complete = true;
        Ok(())
    }

    pub fn run_body<F>(&mut self, body: F) -> HelperResult<()>
    where
        F: FnOnce(&mut ExampleContext) -> HelperResult<()>,
    {
        self.require_phase(ExamplePhase::EagerPhase, "run the example body")?;
        if !self.eager_complete {
            return Err(HelperError::EagerPhaseFailed);
        }
        self.transition(ExamplePhase::Running);
        body(self)
    }

    /// Run `after` hooks, innermost scope first and in reverse declaration
    /// order within a scope. Every hook runs; the first failure is returned.
    /// Runs at most once per example.
    pub fn run_after_hooks(&mut self) -> HelperResult<()> {
        if !matches!(self.phase, ExamplePhase::EagerPhase | ExamplePhase::Running) {
            return Err(HelperError::PhaseViolation {
                operation: "run after hooks",
                phase: self.phase,
            });
        }
        self.transition(ExamplePhase::TearingDown);

        let hooks: Vec<Hook> = self
            .chain
            .scopes()
            .rev()
            .flat_map(|scope| scope.after_hooks().iter().rev().cloned())
            .collect();

        let mut first_error = None;
        for hook in &hooks {
            if let Err(err) = (**hook)(self) {
                debug!(error = %err, "after hook failed");
                first_error.get_or_insert(err);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    /// Finish the example. The cache goes with it.
    pub fn discard(mut self) {
        let computed = self.cache.len();
        self.transition(ExamplePhase::Finished);
        debug!(computed, "example context discarded");
    }

    /// `subject`
    pub fn subject<T: Any>(&mut self) -> HelperResult<Rc<T>> {
        self.helper(HelperId::Default)
    }

    /// The accessor for a named helper (`let(:name)` or `subject(:name)`).
    pub fn helper<T: Any>(&mut self, id: impl Into<HelperId>) -> HelperResult<Rc<T>> {
        let id = id.into();
        let value = self.value_of(&id)?;
        downcast_value(&id, value)
    }

    /// Untyped read of a helper.
    pub fn value_of(&mut self, id: &HelperId) -> HelperResult<HelperValue> {
        self.require_readable()?;
        let resolution = HelperResolver::resolve(&self.chain, id)?;
        self.evaluate(&resolution.declaration, id)
    }

    /// The definition that the nearest declaration of `id` overrides, i.e.
    /// `super()` from inside an overriding block. Outside a block of `id` it
    /// reads the definition shadowed by the nearest one.
    pub fn super_helper<T: Any>(&mut self, id: impl Into<HelperId>) -> HelperResult<Rc<T>> {
        let id = id.into();
        self.require_readable()?;

        let depth = match self.cache.computing(&id) {
            Some(current) => {
                self.chain
                    .depth_of(current.scope())
                    .ok_or_else(|| HelperError::NoOuterDefinition { id: id.clone() })?
            }
            None => HelperResolver::resolve(&self.chain, &id)?.depth,
        };
        let outer = HelperResolver::resolve_outer(&self.chain, &id, depth)?;
        let value = self.evaluate(&outer.declaration, &id)?;
        downcast_value(&id, value)
    }

    /// One-liner expectation on `subject`.
    pub fn is_expected<T: Any>(&mut self) -> HelperResult<Expectation<T>> {
        let actual = self.subject::<T>()?;
        Ok(Expectation {
            id: HelperId::Default,
            actual,
        })
    }

    /// Has the declaration `id` currently resolves to been computed yet?
    pub fn is_memoized(&self, id: &HelperId) -> bool {
        HelperResolver::resolve(&self.chain, id)
            .map(|r| self.cache.contains(r.declaration.id()))
            .unwrap_or(false)
    }

    pub fn computed_count(&self) -> usize {
        self.cache.len()
    }

    pub(crate) fn abandon_in_flight(&mut self) {
        self.cache.abandon_in_flight();
    }

    pub(crate) fn evaluate(
        &mut self,
        declaration: &Arc<HelperDeclaration>,
        requested: &HelperId,
    ) -> HelperResult<HelperValue> {
        self.require_readable()?;
        MemoizationCache::get_or_compute(self, declaration, requested)
    }

    fn require_phase(&self, expected: ExamplePhase, operation: &'static str) -> HelperResult<()> {
        if self.phase == expected {
            Ok(())
        } else {
            Err(HelperError::PhaseViolation {
                operation,
                phase: self.phase,
            })
        }
    }

    fn require_readable(&self) -> HelperResult<()> {
        match self.phase {
            ExamplePhase::EagerPhase | ExamplePhase::Running | ExamplePhase::TearingDown => Ok(()),
            phase => Err(HelperError::PhaseViolation {
                operation: "read a helper",
                phase,
            }),
        }
    }

    fn transition(&mut self, next: ExamplePhase) {
        debug!(from = %self.phase, to = %next, "example phase");
        self.phase = next;
    }
}

/// Result of [`ExampleContext::is_expected`]: assertions against `subject`.
pub struct Expectation<T> {
    id: HelperId,
    actual: Rc<T>,
}

impl<T: Debug> Expectation<T> {
    pub fn actual(&self) -> &Rc<T> {
        &self.actual
    }

    pub fn to_equal<U>(&self, expected: U) -> HelperResult<()>
    where
        T: PartialEq<U>,
        U: Debug,
    {
        if *self.actual == expected {
            Ok(())
        } else {
            Err(HelperError::expectation(format!(
                "expected {} to equal {:?}, got {:?}",
                self.id, expected, self.actual
            )))
        }
    }

    pub fn to_satisfy<F>(&self, description: &str, predicate: F) -> HelperResult<()>
    where
        F: FnOnce(&T) -> bool,
    {
        if predicate(self.actual.as_ref()) {
            Ok(())
        } else {
            Err(HelperError::expectation(format!(
                "expected {} to {}, got {:?}",
                self.id, description, self.actual
            )))
        }
    }
}
