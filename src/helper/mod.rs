//! Helper declarations and their resolution.
//!
//! A group declares helpers in its own [`HelperRegistry`]; an example sees the
//! declarations of every group it is nested in, through its
//! [`ScopeChain`](crate::ds::scope::ScopeChain):
//!
//! ```text
//! Lookup order for `subject` inside "Stack when empty":
//! 1. "when empty"   ← innermost, wins if it declares `subject`
//! 2. "Stack"
//! 3. root
//! ```
//!
//! ### Key Components
//!
//! - **[`HelperDeclaration`]**: one `subject`/`let` declaration, identified by
//!   a [`DeclarationId`] rather than by its name
//! - **[`HelperRegistry`]**: the declarations of one scope; same-scope
//!   redeclaration is last-write-wins
//! - **[`HelperResolver`]**: the override rule, nearest declaration first
//! - **[`ResolverConfig`]**: redeclaration and eager-target policies
//!
//! ### Aliases
//!
//! `subject(:count)` is a single declaration stored under two slots, the
//! default slot and `count`. Both resolve to the same declaration, so both
//! read the same memoized value.

pub mod config;
pub mod declaration;
pub mod registry;
pub mod resolver;

pub use config::{EagerTarget, RedeclarationPolicy, ResolverConfig};
pub use declaration::{DeclarationId, DefinitionBlock, HelperDeclaration, HelperId, HelperKind};
pub use registry::HelperRegistry;
pub use resolver::{HelperResolver, Resolution};
