//! Runner-facing entry points.
//!
//! Drives one example through its whole lifecycle:
//!
//! ```text
//! create context → eager phase → body → after hooks → discard
//! ```
//!
//! A failure anywhere is recorded as that example's outcome; it never stops
//! the remaining examples. A panic in a block, hook or body counts as a
//! failure of that step.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use tracing::{debug, debug_span};

use crate::ds::error::{HelperError, HelperResult};
use crate::ds::scope::ScopeChain;
use crate::ds::suite::{ExampleDefinition, Suite};
use crate::runner::context::ExampleContext;

#[derive(Debug)]
pub enum ExampleOutcome {
    Passed,
    Failed(HelperError),
}

impl ExampleOutcome {
    pub fn is_passed(&self) -> bool {
        matches!(self, ExampleOutcome::Passed)
    }

    pub fn error(&self) -> Option<&HelperError> {
        match self {
            ExampleOutcome::Passed => None,
            ExampleOutcome::Failed(err) => Some(err),
        }
    }
}

#[derive(Debug)]
pub struct ExampleResult {
    /// Group descriptions followed by the example's own description.
    pub full_description: String,
    pub outcome: ExampleOutcome,
}

#[derive(Debug, Default)]
pub struct ExampleReport {
    results: Vec<ExampleResult>,
}

impl ExampleReport {
    pub fn results(&self) -> &[ExampleResult] {
        &self.results
    }

    pub fn passed(&self) -> usize {
        self.results.iter().filter(|r| r.outcome.is_passed()).count()
    }

    pub fn failed(&self) -> usize {
        self.results.len() - self.passed()
    }

    pub fn is_success(&self) -> bool {
        self.failed() == 0
    }

    pub fn get(&self, full_description: &str) -> Option<&ExampleResult> {
        self.results
            .iter()
            .find(|r| r.full_description == full_description)
    }
}

pub struct ExampleRunner;

impl ExampleRunner {
    /// Run `body` as a single example within `chain`.
    pub fn run<F>(chain: ScopeChain, body: F) -> ExampleOutcome
    where
        F: FnOnce(&mut ExampleContext) -> HelperResult<()>,
    {
        let mut ctx = ExampleContext::new(chain);

        let mut result = contain(&mut ctx, |ctx| ctx.run_eager_phase());
        if result.is_ok() {
            result = contain(&mut ctx, |ctx| ctx.run_body(body));
        }
        let after = contain(&mut ctx, |ctx| ctx.run_after_hooks());
        ctx.discard();

        match result.and(after) {
            Ok(()) => ExampleOutcome::Passed,
            Err(err) => ExampleOutcome::Failed(err),
        }
    }

    pub fn run_example(suite: &Arc<Suite>, example: &ExampleDefinition) -> ExampleOutcome {
        let chain = match ScopeChain::new(suite, example.scope()) {
            Ok(chain) => chain,
            Err(err) => return ExampleOutcome::Failed(err),
        };
        let body = example.body().clone();
        Self::run(chain, move |ctx| (*body)(ctx))
    }

    /// Run every example of the suite in declaration order.
    pub fn run_suite(suite: &Arc<Suite>) -> ExampleReport {
        let mut report = ExampleReport::default();
        for example in suite.examples() {
            let full_description = match ScopeChain::new(suite, example.scope()) {
                Ok(chain) => join_description(&chain.describe(), example.description()),
                Err(_) => example.description().to_string(),
            };
            let span = debug_span!("example", name = %full_description);
            let _enter = span.enter();

            let outcome = Self::run_example(suite, example);
            debug!(passed = outcome.is_passed(), "example finished");
            report.results.push(ExampleResult {
                full_description,
                outcome,
            });
        }
        report
    }
}

/// Run one lifecycle step, turning a panic into [`HelperError::Panicked`].
fn contain<F>(ctx: &mut ExampleContext, step: F) -> HelperResult<()>
where
    F: FnOnce(&mut ExampleContext) -> HelperResult<()>,
{
    match panic::catch_unwind(AssertUnwindSafe(|| step(ctx))) {
        Ok(result) => result,
        Err(payload) => {
            ctx.abandon_in_flight();
            let message = panic_message(payload.as_ref());
            debug!(%message, "example step panicked");
            Err(HelperError::Panicked { message })
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

fn join_description(group: &str, example: &str) -> String {
    match (group.is_empty(), example.is_empty()) {
        (true, _) => example.to_string(),
        (_, true) => group.to_string(),
        _ => format!("{} {}", group, example),
    }
}
