//! Data structures shared by the builder and the runner.

pub mod error;
pub mod scope;
pub mod suite;
pub mod value;

pub use error::{BoxError, HelperError, HelperResult};
pub use scope::{Scope, ScopeChain, ScopeId};
pub use suite::{ExampleBody, ExampleDefinition, Suite, SuiteBuilder};
pub use value::{downcast_value, helper_value, same_value, HelperValue};
