use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::types::Scope;

/// Scope restriction applied to every externally reachable query.
///
/// An entity tagged with scope `s` is visible iff `s == scope` or
/// `s` is contained in `read_scope`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Visibility {
    /// The caller's own scope.
    pub scope: Scope,
    /// Additional scopes the caller may read.
    #[serde(default)]
    pub read_scope: BTreeSet<Scope>,
}

impl Visibility {
    /// Build a visibility filter from a scope and its extra readable scopes.
    pub fn new(scope: impl Into<Scope>, read_scope: impl IntoIterator<Item = Scope>) -> Self {
        Self {
            scope: scope.into(),
            read_scope: read_scope.into_iter().collect(),
        }
    }

    /// Whether an entity tagged with `scope` may be observed.
    pub fn allows(&self, scope: &str) -> bool {
        self.scope.as_str() == scope || self.read_scope.contains(scope)
    }
}

/// Immutable caller identity resolved once per request.
///
/// Every downstream call receives this value explicitly; nothing looks the
/// caller up again.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Caller {
    /// Login name reported by the authenticating front end.
    pub login: String,
    /// Scope the caller creates entities in.
    pub scope: Scope,
    /// Additional scopes the caller may read.
    #[serde(default)]
    pub read_scope: BTreeSet<Scope>,
}

impl Caller {
    /// Create a caller with the given login, scope and readable scopes.
    pub fn new(
        login: impl Into<String>,
        scope: impl Into<Scope>,
        read_scope: impl IntoIterator<Item = Scope>,
    ) -> Self {
        Self {
            login: login.into(),
            scope: scope.into(),
            read_scope: read_scope.into_iter().collect(),
        }
    }

    /// Whether the caller may observe an entity tagged with `scope`.
    pub fn can_see(&self, scope: &str) -> bool {
        self.scope.as_str() == scope || self.read_scope.contains(scope)
    }

    /// The visibility filter for queries made on behalf of this caller.
    pub fn visibility(&self) -> Visibility {
        Visibility {
            scope: self.scope.clone(),
            read_scope: self.read_scope.clone(),
        }
    }
}
