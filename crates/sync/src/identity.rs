use std::collections::HashMap;

use marti_core::Caller;

/// Resolves an authenticated login to the caller it acts as.
///
/// Authentication itself happens in front of this service; the directory
/// only maps an already-trusted login to its scope and read scope.
pub trait UserDirectory: Send + Sync {
    /// The caller for `login`, or `None` when the request must be refused.
    fn resolve(&self, login: Option<&str>) -> Option<Caller>;
}

/// A fixed set of users, with an optional anonymous fallback.
#[derive(Debug, Clone, Default)]
pub struct StaticUserDirectory {
    users: HashMap<String, Caller>,
    anonymous: Option<Caller>,
}

impl StaticUserDirectory {
    pub fn new(users: impl IntoIterator<Item = Caller>) -> Self {
        Self {
            users: users.into_iter().map(|u| (u.login.clone(), u)).collect(),
            anonymous: None,
        }
    }

    /// Unknown or missing logins resolve to `caller` instead of being refused.
    #[must_use]
    pub fn with_anonymous(mut self, caller: Caller) -> Self {
        self.anonymous = Some(caller);
        self
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

impl UserDirectory for StaticUserDirectory {
    fn resolve(&self, login: Option<&str>) -> Option<Caller> {
        login
            .and_then(|l| self.users.get(l))
            .or(self.anonymous.as_ref())
            .cloned()
    }
}
