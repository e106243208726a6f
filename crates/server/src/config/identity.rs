use serde::Deserialize;

use marti_core::{Caller, Scope};
use marti_sync::StaticUserDirectory;

/// How requests are mapped to callers.
#[derive(Debug, Deserialize)]
pub struct IdentityConfig {
    /// Header carrying the login set by the authenticating front end.
    #[serde(default = "default_header")]
    pub header: String,
    /// Serve unknown or missing logins as an anonymous caller instead of 401.
    #[serde(default = "default_allow_anonymous")]
    pub allow_anonymous: bool,
    /// Scope of the anonymous caller.
    #[serde(default = "default_anonymous_scope")]
    pub anonymous_scope: String,
    #[serde(default)]
    pub users: Vec<UserConfig>,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            header: default_header(),
            allow_anonymous: default_allow_anonymous(),
            anonymous_scope: default_anonymous_scope(),
            users: Vec::new(),
        }
    }
}

/// A known login and the scopes it acts in.
#[derive(Debug, Deserialize)]
pub struct UserConfig {
    pub login: String,
    pub scope: String,
    /// Additional scopes this login may read.
    #[serde(default)]
    pub read_scope: Vec<String>,
}

impl IdentityConfig {
    /// Build the directory that resolves logins for the identity middleware.
    pub fn directory(&self) -> StaticUserDirectory {
        let users = self.users.iter().map(|u| {
            Caller::new(
                u.login.as_str(),
                u.scope.as_str(),
                u.read_scope.iter().map(|s| Scope::from(s.as_str())),
            )
        });
        let directory = StaticUserDirectory::new(users);
        if self.allow_anonymous {
            directory.with_anonymous(Caller::new(
                "anonymous",
                self.anonymous_scope.as_str(),
                [],
            ))
        } else {
            directory
        }
    }
}

fn default_header() -> String {
    "x-marti-user".to_owned()
}

fn default_allow_anonymous() -> bool {
    true
}

fn default_anonymous_scope() -> String {
    "public".to_owned()
}
