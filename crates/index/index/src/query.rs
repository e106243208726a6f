use std::collections::BTreeSet;

use marti_core::{Caller, ContentHash, FeedConnection, Resource, Scope, Visibility};

/// Filter criteria for [`ResourceIndex::query`](crate::ResourceIndex::query).
///
/// Every field left as `None` matches everything. Criteria are built once and
/// passed by reference; they carry no state between queries.
///
/// The scope filters combine as an authorization rule: when both `scope` and
/// `read_scope` are set, a record matches if its scope equals `scope` or is a
/// member of `read_scope`. Queries reachable from callers are always built
/// with [`ResourceQuery::visible_to`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourceQuery {
    pub hash: Option<ContentHash>,
    pub uid: Option<String>,
    pub scope: Option<Scope>,
    pub read_scope: Option<BTreeSet<Scope>>,
    pub tool: Option<String>,
    pub keyword: Option<String>,
}

/// Turn an empty or whitespace-only filter value into "no filter".
fn present(value: impl Into<String>) -> Option<String> {
    let value = value.into();
    if value.trim().is_empty() { None } else { Some(value) }
}

impl ResourceQuery {
    /// Criteria restricted to what `caller` may observe.
    pub fn visible_to(caller: &Caller) -> Self {
        Self {
            scope: Some(caller.scope.clone()),
            read_scope: Some(caller.read_scope.clone()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_hash(mut self, hash: impl Into<String>) -> Self {
        self.hash = present(hash).map(ContentHash::from);
        self
    }

    #[must_use]
    pub fn with_uid(mut self, uid: impl Into<String>) -> Self {
        self.uid = present(uid);
        self
    }

    #[must_use]
    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = present(scope).map(Scope::from);
        self
    }

    #[must_use]
    pub fn with_read_scope(mut self, read_scope: impl IntoIterator<Item = Scope>) -> Self {
        self.read_scope = Some(read_scope.into_iter().collect());
        self
    }

    #[must_use]
    pub fn with_tool(mut self, tool: impl Into<String>) -> Self {
        self.tool = present(tool);
        self
    }

    #[must_use]
    pub fn with_keyword(mut self, keyword: impl Into<String>) -> Self {
        self.keyword = present(keyword).map(|k| k.trim().to_owned());
        self
    }

    fn scope_allows(&self, scope: &Scope) -> bool {
        match (&self.scope, &self.read_scope) {
            (Some(own), Some(read)) => own == scope || read.contains(scope),
            (Some(own), None) => own == scope,
            (None, Some(read)) => read.contains(scope),
            (None, None) => true,
        }
    }

    /// Whether `resource` satisfies every criterion.
    pub fn matches(&self, resource: &Resource) -> bool {
        if !self.scope_allows(&resource.scope) {
            return false;
        }
        if let Some(hash) = &self.hash
            && *hash != resource.hash
        {
            return false;
        }
        if let Some(uid) = &self.uid
            && *uid != resource.uid
        {
            return false;
        }
        if let Some(tool) = &self.tool
            && *tool != resource.tool
        {
            return false;
        }
        if let Some(keyword) = &self.keyword
            && !resource.keywords.contains(keyword)
        {
            return false;
        }
        true
    }
}

/// Filter criteria for [`FeedStore::list`](crate::FeedStore::list).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedQuery {
    pub visibility: Option<Visibility>,
}

impl FeedQuery {
    pub fn visible_to(caller: &Caller) -> Self {
        Self {
            visibility: Some(caller.visibility()),
        }
    }

    pub fn matches(&self, feed: &FeedConnection) -> bool {
        self.visibility
            .as_ref()
            .is_none_or(|v| v.allows(feed.scope.as_str()))
    }
}

/// Post-creation metadata change. Only the producer tag is mutable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourcePatch {
    pub tool: Option<String>,
}

impl ResourcePatch {
    pub fn tool(tool: impl Into<String>) -> Self {
        Self {
            tool: Some(tool.into()),
        }
    }

    pub fn apply(&self, resource: &mut Resource) {
        if let Some(tool) = &self.tool {
            resource.tool.clone_from(tool);
        }
    }
}
