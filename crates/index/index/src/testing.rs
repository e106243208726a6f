use chrono::Utc;

use marti_core::{
    Addressing, Caller, FeedConnection, FeedTransport, Keywords, NEVER_EXPIRES, Resource, Scope,
};

use crate::error::IndexError;
use crate::query::{FeedQuery, ResourcePatch, ResourceQuery};
use crate::store::{FeedStore, ResourceIndex};

fn record(hash: &str, scope: &str, uid: &str, keywords: &str) -> Resource {
    Resource {
        id: 0,
        hash: hash.into(),
        scope: scope.into(),
        uid: uid.into(),
        name: format!("{hash}.bin"),
        file_name: format!("{hash}.bin"),
        mime_type: "application/octet-stream".into(),
        size: 4,
        created_at: Utc::now(),
        submission_user: "conformance".into(),
        creator_uid: String::new(),
        tool: String::new(),
        keywords: Keywords::parse(keywords),
        expiration: NEVER_EXPIRES,
        addressing: Addressing::ContentAddressed,
    }
}

/// Run the full resource index conformance test suite.
///
/// Call this from your backend's test module with a fresh index instance.
///
/// # Errors
///
/// Returns an error if any conformance test fails.
pub async fn run_index_conformance_tests(index: &dyn ResourceIndex) -> Result<(), IndexError> {
    test_create_assigns_ids(index).await?;
    test_duplicate_rejected(index).await?;
    test_same_hash_other_scope(index).await?;
    test_visibility(index).await?;
    test_keyword_and_tool_filters(index).await?;
    test_query_one_is_earliest(index).await?;
    test_update(index).await?;
    Ok(())
}

async fn test_create_assigns_ids(index: &dyn ResourceIndex) -> Result<(), IndexError> {
    let a = index.create(record("ids-a", "conf", "", "")).await?;
    let b = index.create(record("ids-b", "conf", "", "")).await?;
    assert!(a.id > 0, "ids start above zero");
    assert!(b.id > a.id, "ids increase with creation order");
    Ok(())
}

async fn test_duplicate_rejected(index: &dyn ResourceIndex) -> Result<(), IndexError> {
    index.create(record("dup", "conf", "", "")).await?;
    let again = index.create(record("dup", "conf", "", "")).await;
    assert!(
        matches!(again, Err(IndexError::Duplicate { .. })),
        "duplicate (hash, scope) must be rejected"
    );
    let found = index
        .query(&ResourceQuery::default().with_hash("dup").with_scope("conf"))
        .await?;
    assert_eq!(found.len(), 1);
    Ok(())
}

async fn test_same_hash_other_scope(index: &dyn ResourceIndex) -> Result<(), IndexError> {
    index.create(record("shared", "conf-x", "", "")).await?;
    index.create(record("shared", "conf-y", "", "")).await?;
    let all = index
        .query(&ResourceQuery::default().with_hash("shared"))
        .await?;
    assert_eq!(all.len(), 2, "one record per scope");
    Ok(())
}

async fn test_visibility(index: &dyn ResourceIndex) -> Result<(), IndexError> {
    index.create(record("vis", "conf-b", "", "")).await?;

    let outsider = Caller::new("a", "conf-a", []);
    let q = ResourceQuery::visible_to(&outsider).with_hash("vis");
    assert!(index.query_one(&q).await?.is_none(), "other scope is invisible");

    let reader = Caller::new("a", "conf-a", [Scope::from("conf-b")]);
    let q = ResourceQuery::visible_to(&reader).with_hash("vis");
    assert!(index.query_one(&q).await?.is_some(), "read scope grants visibility");
    Ok(())
}

async fn test_keyword_and_tool_filters(index: &dyn ResourceIndex) -> Result<(), IndexError> {
    let mut tagged = record("kw", "conf-kw", "", "alpha,beta");
    tagged.tool = "public".into();
    index.create(tagged).await?;
    index.create(record("kw-other", "conf-kw", "", "delta")).await?;

    let base = ResourceQuery::default().with_scope("conf-kw");
    for (keyword, expected) in [("alpha", 1), ("beta", 1), ("gamma", 0), ("", 2)] {
        let found = index.query(&base.clone().with_keyword(keyword)).await?;
        assert_eq!(found.len(), expected, "keyword filter {keyword:?}");
    }
    let public = index.query(&base.clone().with_tool("public")).await?;
    assert_eq!(public.len(), 1);
    Ok(())
}

async fn test_query_one_is_earliest(index: &dyn ResourceIndex) -> Result<(), IndexError> {
    let first = index.create(record("one-a", "conf-one", "device-1", "")).await?;
    index.create(record("one-b", "conf-one", "device-1", "")).await?;
    let q = ResourceQuery::default().with_scope("conf-one").with_uid("device-1");
    let found = index.query_one(&q).await?;
    assert_eq!(found.map(|r| r.id), Some(first.id));
    Ok(())
}

async fn test_update(index: &dyn ResourceIndex) -> Result<(), IndexError> {
    let created = index.create(record("upd", "conf-upd", "", "")).await?;
    let updated = index.update(created.id, &ResourcePatch::tool("X")).await?;
    assert_eq!(updated.tool, "X");
    let q = ResourceQuery::default().with_hash("upd").with_scope("conf-upd");
    assert_eq!(index.query_one(&q).await?.map(|r| r.tool), Some("X".into()));

    assert!(matches!(
        index.update(u64::MAX, &ResourcePatch::tool("Y")).await,
        Err(IndexError::NotFound(_))
    ));
    Ok(())
}

fn feed(uid: &str, scope: &str, alias: &str) -> FeedConnection {
    FeedConnection {
        uid: uid.into(),
        scope: scope.into(),
        owner_user: "conformance".into(),
        active: true,
        alias: alias.into(),
        transport: FeedTransport {
            protocol: "rtsp".into(),
            address: "10.0.0.1".into(),
            port: 554,
            path: "/live".into(),
            ..FeedTransport::default()
        },
    }
}

/// Run the feed store conformance test suite.
///
/// # Errors
///
/// Returns an error if any conformance test fails.
pub async fn run_feed_conformance_tests(store: &dyn FeedStore) -> Result<(), IndexError> {
    store.save(feed("cam-1", "feed-a", "first")).await?;
    store.save(feed("cam-1", "feed-a", "replaced")).await?;
    store.save(feed("cam-1", "feed-b", "other scope")).await?;

    let a = store
        .list(&FeedQuery::visible_to(&Caller::new("u", "feed-a", [])))
        .await?;
    assert_eq!(a.len(), 1, "save replaces by (scope, uid)");
    assert_eq!(a[0].alias, "replaced");

    let both = store
        .list(&FeedQuery::visible_to(&Caller::new(
            "u",
            "feed-a",
            [Scope::from("feed-b")],
        )))
        .await?;
    assert_eq!(both.len(), 2);

    let none = store
        .list(&FeedQuery::visible_to(&Caller::new("u", "feed-c", [])))
        .await?;
    assert!(none.is_empty());
    Ok(())
}
