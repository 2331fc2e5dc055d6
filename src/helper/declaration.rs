//! Helper declarations: what a group declares with `subject`, `subject!`,
//! `let` and `let!`.

use std::fmt;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

use uuid::Uuid;

use crate::ds::error::HelperResult;
use crate::ds::scope::ScopeId;
use crate::ds::value::HelperValue;
use crate::runner::context::ExampleContext;

/// The identifier a helper is looked up by.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum HelperId {
    /// The unnamed `subject` slot.
    Default,
    Named(String),
}

impl HelperId {
    pub fn named(name: impl Into<String>) -> Self {
        HelperId::Named(name.into())
    }

    pub fn is_default(&self) -> bool {
        matches!(self, HelperId::Default)
    }
}

impl Display for HelperId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            HelperId::Default => write!(f, "subject"),
            HelperId::Named(name) => write!(f, "{}", name),
        }
    }
}

impl From<&str> for HelperId {
    fn from(name: &str) -> Self {
        HelperId::Named(name.to_string())
    }
}

impl From<String> for HelperId {
    fn from(name: String) -> Self {
        HelperId::Named(name)
    }
}

/// Identity of one declaration. Two declarations sharing an identifier at
/// different depths have different ids; aliases of one declaration share it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeclarationId(Uuid);

impl DeclarationId {
    pub fn new() -> Self {
        DeclarationId(Uuid::new_v4())
    }
}

impl Default for DeclarationId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for DeclarationId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

/// Which declaration form created a helper.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HelperKind {
    /// `subject` / `subject(:name)`. Always occupies the default slot.
    Subject(Option<String>),
    /// `let(:name)`. Occupies only its name.
    Let(String),
}

impl HelperKind {
    /// Every identifier this declaration answers to in its scope.
    pub fn slots(&self) -> Vec<HelperId> {
        match self {
            HelperKind::Subject(None) => vec![HelperId::Default],
            HelperKind::Subject(Some(name)) => vec![HelperId::Default, HelperId::named(name)],
            HelperKind::Let(name) => vec![HelperId::named(name)],
        }
    }

    /// The identifier an eager evaluation requests.
    pub fn primary(&self) -> HelperId {
        match self {
            HelperKind::Subject(_) => HelperId::Default,
            HelperKind::Let(name) => HelperId::named(name),
        }
    }
}

/// Zero-argument computation producing a helper's value. It receives the
/// running example so it can read other helpers and per-example state.
pub type DefinitionBlock =
    Arc<dyn Fn(&mut ExampleContext) -> HelperResult<HelperValue> + Send + Sync>;

/// One declaration, immutable once made.
pub struct HelperDeclaration {
    id: DeclarationId,
    kind: HelperKind,
    scope: ScopeId,
    eager: bool,
    block: DefinitionBlock,
}

impl HelperDeclaration {
    pub fn new(kind: HelperKind, scope: ScopeId, block: DefinitionBlock, eager: bool) -> Self {
        HelperDeclaration {
            id: DeclarationId::new(),
            kind,
            scope,
            eager,
            block,
        }
    }

    pub fn id(&self) -> DeclarationId {
        self.id
    }

    pub fn kind(&self) -> &HelperKind {
        &self.kind
    }

    /// The scope this was declared in.
    pub fn scope(&self) -> ScopeId {
        self.scope
    }

    pub fn is_eager(&self) -> bool {
        self.eager
    }

    pub fn answers_to(&self, id: &HelperId) -> bool {
        self.kind.slots().contains(id)
    }

    pub fn block(&self) -> &DefinitionBlock {
        &self.block
    }
}

impl fmt::Debug for HelperDeclaration {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("HelperDeclaration")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("scope", &self.scope)
            .field("eager", &self.eager)
            .finish()
    }
}
