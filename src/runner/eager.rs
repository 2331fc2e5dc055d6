//! Pre-example actions and eager (`subject!` / `let!`) binding.
//!
//! An eager declaration does not get a phase of its own. Declaring it pushes
//! an [`ExampleAction::Eager`] onto its scope's action list at that point, next
//! to any `before` hooks, so eager evaluations and hooks interleave exactly in
//! declaration order:
//!
//! ```text
//! group "Stack"
//!   before  { log << :outer_hook }     → action 1
//!   subject! { log << :subject }       → action 2
//!   group "when empty"
//!     before { log << :inner_hook }    → action 3
//!     it { log << :example }           → body, after every action
//! ```

use std::fmt;
use std::sync::Arc;

use tracing::trace;

use crate::ds::error::HelperResult;
use crate::ds::scope::ScopeChain;
use crate::helper::config::EagerTarget;
use crate::helper::declaration::HelperDeclaration;
use crate::runner::context::ExampleContext;

/// A `before`/`after` hook.
pub type Hook = Arc<dyn Fn(&mut ExampleContext) -> HelperResult<()> + Send + Sync>;

#[derive(Clone)]
pub enum ExampleAction {
    /// Force evaluation of an eager declaration.
    Eager(Arc<HelperDeclaration>),
    Before(Hook),
}

impl fmt::Debug for ExampleAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExampleAction::Eager(d) => f.debug_tuple("Eager").field(d).finish(),
            ExampleAction::Before(_) => f.write_str("Before(..)"),
        }
    }
}

/// Collects and runs the pre-example actions of a chain.
pub struct EagerBinder;

impl EagerBinder {
    /// Every pre-example action for `chain`: outermost scope first, then
    /// declaration order within each scope. Eager declarations that a later
    /// same-scope declaration fully replaced are dropped.
    pub fn bind(chain: &ScopeChain) -> Vec<ExampleAction> {
        chain
            .scopes()
            .flat_map(|scope| {
                scope.actions().iter().filter(move |action| match action {
                    ExampleAction::Eager(d) => scope.registry().is_live(d.id()),
                    ExampleAction::Before(_) => true,
                })
            })
            .cloned()
            .collect()
    }

    pub fn run(ctx: &mut ExampleContext, action: &ExampleAction) -> HelperResult<()> {
        match action {
            ExampleAction::Eager(declaration) => {
                let id = declaration.kind().primary();
                trace!(helper = %id, declaration = %declaration.id(), "eager evaluation");
                match ctx.config().eager_target {
                    EagerTarget::Declared => ctx.evaluate(declaration, &id).map(|_| ()),
                    EagerTarget::Resolved => ctx.value_of(&id).map(|_| ()),
                }
            }
            ExampleAction::Before(hook) => (**hook)(ctx),
        }
    }
}
