//! # scoped_helpers - memoized `subject`/`let` helpers for nested test groups
//!
//! The resolution engine behind a test framework's `subject`, `subject!`,
//! `let` and `let!`:
//! - Helpers are declared on nested groups and inherited by inner groups
//! - An inner declaration overrides (shadows) an outer one of the same name
//! - Values are computed lazily, at most once per example, and never shared
//!   between examples
//! - Eager declarations are forced before the example body, in declaration
//!   order with the other `before` hooks
//!
//! ## Quick Start
//!
//! ```
//! use std::cell::RefCell;
//! use scoped_helpers::ds::SuiteBuilder;
//! use scoped_helpers::runner::ExampleRunner;
//!
//! let mut builder = SuiteBuilder::new("Stack");
//! let root = builder.root();
//! builder.subject(root, |_ctx| Ok(RefCell::new(Vec::<i32>::new())));
//! builder.before(root, |ctx| {
//!     ctx.subject::<RefCell<Vec<i32>>>()?.borrow_mut().extend([1, 2, 3]);
//!     Ok(())
//! });
//! builder.example(root, "holds what was pushed", |ctx| {
//!     ctx.is_expected::<RefCell<Vec<i32>>>()?
//!         .to_equal(RefCell::new(vec![1, 2, 3]))
//! });
//!
//! let suite = builder.build();
//! let report = ExampleRunner::run_suite(&suite);
//! assert!(report.is_success());
//! ```
//!
//! ## Architecture
//!
//! - **[`ds`]** - Suite, scopes, scope chains, errors and helper values
//! - **[`helper`]** - Declarations, per-scope registries and the resolver
//! - **[`runner`]** - Example contexts, memoization, eager binding, runner API

pub mod ds;
pub mod helper;
pub mod runner;
