//! Example execution: per-example context, memoization and eager binding.
//!
//! ### Key Components
//!
//! - **[`ExampleContext`]**: what an example body and its hooks run against
//! - **[`MemoizationCache`]**: at most one evaluation per declaration per example
//! - **[`EagerBinder`]**: turns `subject!`/`let!` into ordered pre-example actions
//! - **[`ExampleRunner`]**: drives the lifecycle and collects outcomes
//!
//! ### Resolution Flow
//!
//! When an example reads `subject` (or any named helper):
//!
//! 1. **Resolve**: find the nearest declaration in the example's scope chain
//! 2. **Check cache**: has this declaration been computed in this example?
//! 3. **Compute**: if not, run its block against the same context
//! 4. **Cache result**: keep it for every later read in this example only

pub mod api;
pub mod cache;
pub mod context;
pub mod eager;

pub use api::{ExampleOutcome, ExampleReport, ExampleResult, ExampleRunner};
pub use cache::MemoizationCache;
pub use context::{ExampleContext, ExamplePhase, Expectation};
pub use eager::{EagerBinder, ExampleAction, Hook};
