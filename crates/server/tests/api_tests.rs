use std::sync::Arc;

use axum::Router;
use axum::body::{Body, Bytes};
use axum::http::{HeaderMap, Request, StatusCode, header};
use chrono::{Duration, Utc};
use sha2::{Digest, Sha256};
use tower::ServiceExt;

use marti_blob_memory::{MemoryBlobStore, MemoryRecordingArea};
use marti_core::{Caller, CotEvent, Point, Scope, TrackedItem};
use marti_index_memory::MemoryIndex;
use marti_server::api::AppState;
use marti_sync::{MemoryItemTracker, MemoryPointStore, StaticUserDirectory, SyncServiceBuilder};

const BOUNDARY: &str = "marti-test-boundary";

// -- Helpers --------------------------------------------------------------

struct TestServer {
    app: Router,
    tracker: Arc<MemoryItemTracker>,
    points: Arc<MemoryPointStore>,
}

fn directory() -> StaticUserDirectory {
    StaticUserDirectory::new([
        Caller::new("alice", "blue", [Scope::from("red")]),
        Caller::new("bob", "red", []),
        Caller::new("carol", "blue", []),
    ])
}

fn build_server_with(directory: StaticUserDirectory, path_prefix: &str) -> TestServer {
    let index = Arc::new(MemoryIndex::new());
    let tracker = Arc::new(MemoryItemTracker::new());
    let points = Arc::new(MemoryPointStore::new());
    let sync = SyncServiceBuilder::new()
        .blobs(Arc::new(MemoryBlobStore::new()))
        .recordings(Arc::new(MemoryRecordingArea::new()))
        .index(Arc::clone(&index) as _)
        .feeds(index as _)
        .tracker(Arc::clone(&tracker) as _)
        .points(Arc::clone(&points) as _)
        .recording_marker("webcam-recording")
        .blocked_uids(["blocked-device".to_owned()])
        .build()
        .expect("service should build");

    let state = AppState {
        sync: Arc::new(sync),
        directory: Arc::new(directory),
        identity_header: "x-marti-user".to_owned(),
        upstream_contacts: None,
        external_url: None,
        path_prefix: path_prefix.to_owned(),
        body_limit: 16 * 1024 * 1024,
    };
    TestServer {
        app: marti_server::api::router(state),
        tracker,
        points,
    }
}

fn build_server() -> TestServer {
    build_server_with(directory(), "/Marti")
}

fn sha256(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

fn get(user: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header(header::HOST, "marti.test")
        .header("x-marti-user", user)
        .body(Body::empty())
        .unwrap()
}

fn put_text(user: &str, uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("PUT")
        .uri(uri)
        .header("x-marti-user", user)
        .body(Body::from(body.to_owned()))
        .unwrap()
}

fn post(user: &str, uri: &str, content_type: &str, body: impl Into<Body>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::HOST, "marti.test")
        .header(header::CONTENT_TYPE, content_type)
        .header("x-marti-user", user)
        .body(body.into())
        .unwrap()
}

fn multipart_body(file_name: &str, contents: &[u8], keywords: Option<&str>) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"assetfile\"; filename=\"{file_name}\"\r\nContent-Type: application/zip\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(contents);
    body.extend_from_slice(b"\r\n");
    if let Some(keywords) = keywords {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"keywords\"\r\n\r\n{keywords}\r\n"
            )
            .as_bytes(),
        );
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

fn multipart_type() -> String {
    format!("multipart/form-data; boundary={BOUNDARY}")
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, HeaderMap, Bytes) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, headers, body)
}

fn text(body: &Bytes) -> String {
    String::from_utf8(body.to_vec()).unwrap()
}

/// Raw upload; returns the resource URL.
async fn upload_raw(app: &Router, user: &str, name: &str, query: &str, contents: &[u8]) -> String {
    let uri = format!("/Marti/upload?name={name}{query}");
    let (status, _, body) = send(
        app,
        post(user, &uri, "application/octet-stream", contents.to_vec()),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "upload failed: {}", text(&body));
    text(&body)
}

fn tracked(uid: &str, scope: &str, online: bool) -> TrackedItem {
    let now = Utc::now();
    TrackedItem {
        uid: uid.to_owned(),
        scope: Scope::from(scope),
        callsign: format!("{uid}-callsign"),
        team: "Cyan".to_owned(),
        role: "Team Member".to_owned(),
        is_contact: true,
        online,
        last_seen: now,
        event: CotEvent {
            uid: uid.to_owned(),
            event_type: "a-f-G-U-C".to_owned(),
            how: "m-g".to_owned(),
            time: now,
            start: now,
            stale: now + Duration::minutes(5),
            point: Point::default(),
            detail: None,
        },
    }
}

// -- Identity and info ----------------------------------------------------

#[tokio::test]
async fn unknown_login_is_unauthorized() {
    let server = build_server();
    let (status, _, _) = send(&server.app, get("mallory", "/Marti/api/version")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn anonymous_caller_when_allowed() {
    let directory = directory().with_anonymous(Caller::new("anonymous", "public", []));
    let server = build_server_with(directory, "/Marti");
    let request = Request::builder()
        .uri("/Marti/sync/search")
        .body(Body::empty())
        .unwrap();
    let (status, _, body) = send(&server.app, request).await;
    assert_eq!(status, StatusCode::OK);
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["resultCount"], 0);
}

#[tokio::test]
async fn version_endpoints() {
    let server = build_server();
    let (status, _, body) = send(&server.app, get("alice", "/Marti/api/version")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(text(&body).starts_with("Marti sync server "));

    let (status, _, body) = send(&server.app, get("alice", "/Marti/api/version/config")).await;
    assert_eq!(status, StatusCode::OK);
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["type"], "ServerConfig");
    assert_eq!(json["nodeId"], "main");
    assert_eq!(json["data"]["api"], "3");
}

async fn get_json(app: &Router, uri: &str) -> serde_json::Value {
    let (status, _, body) = send(app, get("alice", uri)).await;
    assert_eq!(status, StatusCode::OK, "{uri}");
    serde_json::from_slice(&body).unwrap()
}

#[tokio::test]
async fn client_bootstrap_endpoints() {
    let server = build_server();

    let roles = get_json(&server.app, "/Marti/api/util/user/roles").await;
    assert_eq!(roles, serde_json::json!(["user", "webuser"]));

    let groups = get_json(&server.app, "/Marti/api/groups/all").await;
    assert_eq!(groups["type"], "com.bbn.marti.remote.groups.Group");
    assert_eq!(groups["data"][0]["name"], "__ANON__");
    assert_eq!(groups["data"][0]["type"], "SYSTEM");
    assert_eq!(groups["data"][0]["bitpos"], 2);
    assert_eq!(groups["data"][0]["active"], true);

    let cache = get_json(&server.app, "/Marti/api/groups/groupCacheEnabled").await;
    assert_eq!(cache["type"], "java.lang.Boolean");
    assert_eq!(cache["data"], true);

    let cops = get_json(&server.app, "/Marti/api/cops/hierarchy").await;
    assert_eq!(cops["type"], "CopHierarchyNode");
    assert_eq!(cops["data"], serde_json::json!([]));
}

#[tokio::test]
async fn routes_mount_at_root_without_prefix() {
    let server = build_server_with(directory(), "");
    let (status, _, _) = send(&server.app, get("alice", "/sync/search")).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _, _) = send(&server.app, get("alice", "/Marti/sync/search")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// -- Upload and content ---------------------------------------------------

#[tokio::test]
async fn raw_upload_then_content() {
    let server = build_server();
    let contents = b"hello marti";
    let hash = sha256(contents);

    let url = upload_raw(&server.app, "alice", "hello.txt", "&uid=u-1", contents).await;
    assert_eq!(url, format!("http://marti.test/Marti/sync/content?hash={hash}"));

    let (status, headers, body) = send(
        &server.app,
        get("alice", &format!("/Marti/sync/content?hash={hash}")),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(&body[..], contents);
    assert_eq!(headers[header::ETAG], hash.as_str());
    assert_eq!(headers[header::CONTENT_TYPE], "application/octet-stream");
    assert_eq!(headers[header::CONTENT_LENGTH], contents.len().to_string().as_str());
    assert!(headers[header::LAST_MODIFIED].to_str().unwrap().ends_with(" GMT"));

    let (status, _, body) = send(&server.app, get("alice", "/Marti/sync/content?uid=u-1")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(&body[..], contents);
}

#[tokio::test]
async fn upload_alias_route() {
    let server = build_server();
    let (status, _, _) = send(
        &server.app,
        post("alice", "/Marti/sync/upload?name=a.bin", "application/octet-stream", b"abc".to_vec()),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn upload_without_name_is_not_acceptable() {
    let server = build_server();
    let (status, _, body) = send(
        &server.app,
        post("alice", "/Marti/upload?uid=x", "application/octet-stream", b"abc".to_vec()),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_ACCEPTABLE);
    assert_eq!(text(&body), "no name");
}

#[tokio::test]
async fn duplicate_upload_conflicts() {
    let server = build_server();
    upload_raw(&server.app, "alice", "a.bin", "", b"same bytes").await;
    let (status, _, _) = send(
        &server.app,
        post("alice", "/Marti/upload?name=b.bin", "application/octet-stream", b"same bytes".to_vec()),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (_, _, body) = send(&server.app, get("alice", "/Marti/sync/search")).await;
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["resultCount"], 1);
}

#[tokio::test]
async fn multipart_upload_reads_keywords() {
    let server = build_server();
    let body = multipart_body("route.kml", b"<kml/>", Some("alpha,beta"));
    let (status, _, _) = send(
        &server.app,
        post("alice", "/Marti/upload?name=route", &multipart_type(), body),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    for keyword in ["alpha", "beta"] {
        let (_, _, body) = send(
            &server.app,
            get("alice", &format!("/Marti/sync/search?keywords={keyword}")),
        )
        .await;
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["resultCount"], 1, "keyword {keyword}");
        assert_eq!(json["results"][0]["Name"], "route");
    }
    let (_, _, body) = send(&server.app, get("alice", "/Marti/sync/search?keywords=gamma")).await;
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["resultCount"], 0);
}

#[tokio::test]
async fn recording_upload_is_served_by_name() {
    let server = build_server();
    let body = multipart_body("cam.webm", b"webm bytes", None);
    let (status, _, url) = send(
        &server.app,
        post("alice", "/Marti/upload?name=webcam-recording-1.webm", &multipart_type(), body),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(text(&url).ends_with("?hash=video-webcam-recording-1.webm"));

    let (status, headers, body) = send(
        &server.app,
        get("alice", "/Marti/sync/content?hash=video-webcam-recording-1.webm"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(&body[..], b"webm bytes");
    assert_eq!(headers[header::CONTENT_TYPE], "video/webm");
}

#[tokio::test]
async fn same_recording_name_in_other_scope_does_not_replace_content() {
    let server = build_server();
    let uri = "/Marti/upload?name=webcam-recording-2.webm";
    for (user, bytes) in [("carol", &b"blue clip"[..]), ("bob", &b"red clip, much longer"[..])] {
        let body = multipart_body("cam.webm", bytes, None);
        let (status, _, _) = send(&server.app, post(user, uri, &multipart_type(), body)).await;
        assert_eq!(status, StatusCode::OK, "{user}");
    }

    let content = "/Marti/sync/content?hash=video-webcam-recording-2.webm";
    let (status, headers, body) = send(&server.app, get("carol", content)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(&body[..], b"blue clip");
    assert_eq!(headers[header::CONTENT_LENGTH], "9");

    let (_, _, body) = send(&server.app, get("bob", content)).await;
    assert_eq!(&body[..], b"red clip, much longer");
}

#[tokio::test]
async fn second_recording_upload_with_same_name_is_rejected() {
    let server = build_server();
    let uri = "/Marti/upload?name=webcam-recording-3.webm";
    let body = multipart_body("cam.webm", b"first", None);
    let (status, _, _) = send(&server.app, post("alice", uri, &multipart_type(), body)).await;
    assert_eq!(status, StatusCode::OK);

    let body = multipart_body("cam.webm", b"second and longer", None);
    let (status, _, _) = send(&server.app, post("carol", uri, &multipart_type(), body)).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (_, headers, body) = send(
        &server.app,
        get("alice", "/Marti/sync/content?hash=video-webcam-recording-3.webm"),
    )
    .await;
    assert_eq!(&body[..], b"first");
    assert_eq!(headers[header::CONTENT_LENGTH], "5");
}

#[tokio::test]
async fn concurrent_uploads_are_all_retrievable() {
    let server = build_server();
    let mut tasks = Vec::new();
    for i in 0..16 {
        let app = server.app.clone();
        tasks.push(tokio::spawn(async move {
            let contents = format!("payload {i}");
            upload_raw(&app, "alice", &format!("f{i}.txt"), "", contents.as_bytes()).await;
            contents
        }));
    }

    for task in tasks {
        let contents = task.await.unwrap();
        let hash = sha256(contents.as_bytes());
        let (status, _, body) = send(
            &server.app,
            get("alice", &format!("/Marti/sync/content?hash={hash}")),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(&body[..], contents.as_bytes());
    }
}

// -- Mission packages -----------------------------------------------------

#[tokio::test]
async fn mission_query_status_codes() {
    let server = build_server();
    let (status, _, body) = send(&server.app, get("alice", "/Marti/sync/missionquery")).await;
    assert_eq!(status, StatusCode::NOT_ACCEPTABLE);
    assert_eq!(text(&body), "no hash");

    let (status, _, _) = send(&server.app, get("alice", "/Marti/sync/missionquery?hash=abc")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn mission_upload_requires_hash_and_filename() {
    let server = build_server();
    let body = multipart_body("p.zip", b"zip", None);
    let (status, _, _) = send(
        &server.app,
        post("alice", "/Marti/sync/missionupload?filename=p.zip", &multipart_type(), body.clone()),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_ACCEPTABLE);

    let (status, _, _) = send(
        &server.app,
        post("alice", "/Marti/sync/missionupload?hash=abc", &multipart_type(), body),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_ACCEPTABLE);
}

#[tokio::test]
async fn mission_upload_with_wrong_hash_stores_nothing() {
    let server = build_server();
    let body = multipart_body("p.zip", b"package bytes", None);
    let wrong = sha256(b"other bytes");
    let (status, _, _) = send(
        &server.app,
        post(
            "alice",
            &format!("/Marti/sync/missionupload?hash={wrong}&filename=p.zip"),
            &multipart_type(),
            body,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_ACCEPTABLE);

    let (_, _, body) = send(&server.app, get("alice", "/Marti/sync/search")).await;
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["resultCount"], 0);
    let (status, _, _) = send(
        &server.app,
        get("alice", &format!("/Marti/sync/content?hash={wrong}")),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn mission_upload_is_tagged_and_queryable() {
    let server = build_server();
    let contents = b"package bytes";
    let hash = sha256(contents);
    let (status, _, url) = send(
        &server.app,
        post(
            "alice",
            &format!("/Marti/sync/missionupload?hash={hash}&filename=mission.zip"),
            &multipart_type(),
            multipart_body("mission.zip", contents, None),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _, found) = send(
        &server.app,
        get("alice", &format!("/Marti/sync/missionquery?hash={hash}")),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(found, url);

    let (_, _, body) = send(
        &server.app,
        get("alice", "/Marti/sync/search?keywords=missionpackage&tool=public"),
    )
    .await;
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["resultCount"], 1);
    assert_eq!(json["results"][0]["Hash"], hash.as_str());
    assert_eq!(json["results"][0]["Name"], "mission.zip");
}

// -- Scopes and metadata --------------------------------------------------

#[tokio::test]
async fn scope_isolation_and_read_scope() {
    let server = build_server();
    let contents = b"red team data";
    let hash = sha256(contents);
    upload_raw(&server.app, "bob", "red.bin", "", contents).await;

    let uri = format!("/Marti/sync/content?hash={hash}");
    let (status, _, _) = send(&server.app, get("carol", &uri)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _, body) = send(&server.app, get("alice", &uri)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(&body[..], contents);

    let (_, _, body) = send(&server.app, get("alice", "/Marti/sync/search")).await;
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["results"][0]["Name"], "red.bin [red]");

    let (_, _, body) = send(&server.app, get("bob", "/Marti/sync/search")).await;
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["results"][0]["Name"], "red.bin");
}

#[tokio::test]
async fn metadata_round_trip() {
    let server = build_server();
    let hash = sha256(b"tooling");
    upload_raw(&server.app, "alice", "t.bin", "", b"tooling").await;

    let uri = format!("/Marti/sync/metadata/{hash}/tool");
    let (status, _, _) = send(&server.app, put_text("alice", &uri, "private")).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _, body) = send(&server.app, get("alice", &uri)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(text(&body), "private");

    let alias = format!("/Marti/api/sync/metadata/{hash}/tool");
    let (_, _, body) = send(&server.app, get("alice", &alias)).await;
    assert_eq!(text(&body), "private");

    let (status, _, _) = send(&server.app, put_text("alice", &uri, " team tool\n")).await;
    assert_eq!(status, StatusCode::OK);
    let (_, _, body) = send(&server.app, get("alice", &uri)).await;
    assert_eq!(text(&body), " team tool\n", "value is stored as sent");

    let other = format!("/Marti/sync/metadata/{hash}/color");
    let (status, _, _) = send(&server.app, put_text("alice", &other, "green")).await;
    assert_eq!(status, StatusCode::OK);
    let (_, _, body) = send(&server.app, get("alice", &other)).await;
    assert_eq!(text(&body), "");

    let (status, _, _) = send(&server.app, get("carol", "/Marti/sync/metadata/nope/tool")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// -- Video feeds ----------------------------------------------------------

#[tokio::test]
async fn json_feeds_appear_in_both_shapes() {
    let server = build_server();
    let feeds = serde_json::json!([
        {"uid": "feed-1", "alias": "Gate", "protocol": "rtsp", "address": "10.0.0.5", "port": 554, "path": "/live"},
        {"uid": "feed-2", "alias": "Roof", "protocol": "udp", "address": "239.1.1.1", "port": 1234}
    ]);
    let (status, _, _) = send(
        &server.app,
        post("alice", "/Marti/vcm", "application/json", feeds.to_string()),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, headers, body) = send(&server.app, get("alice", "/Marti/vcm")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers[header::CONTENT_TYPE], "application/xml");
    let xml = text(&body);
    assert!(xml.starts_with("<videoConnections>"));
    assert!(xml.contains("<uid>feed-1</uid>"));
    assert!(xml.contains("<active>true</active>"));

    let (_, _, body) = send(&server.app, get("alice", "/Marti/api/video")).await;
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    let groups = json["videoConnections"].as_array().unwrap();
    assert_eq!(groups.len(), 2);
    assert_eq!(groups[0]["feeds"].as_array().unwrap().len(), 1);
    assert_eq!(groups[0]["feeds"][0]["uid"], "feed-1");

    let (_, _, body) = send(&server.app, get("bob", "/Marti/api/video")).await;
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert!(json["videoConnections"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn xml_feed_document_is_accepted() {
    let server = build_server();
    let xml = "<videoConnections><feed><uid>feed-x</uid><alias>Dock</alias><protocol>rtsp</protocol></feed></videoConnections>";
    let (status, _, _) = send(&server.app, post("bob", "/Marti/vcm", "application/xml", xml)).await;
    assert_eq!(status, StatusCode::OK);

    let (_, _, body) = send(&server.app, get("bob", "/Marti/api/video")).await;
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["videoConnections"][0]["feeds"][0]["alias"], "Dock");
}

#[tokio::test]
async fn malformed_feed_body_is_bad_request() {
    let server = build_server();
    let (status, _, _) = send(
        &server.app,
        post("alice", "/Marti/vcm", "application/json", "{not json"),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

// -- Live items -----------------------------------------------------------

#[tokio::test]
async fn event_xml_from_tracker_then_points() {
    let server = build_server();
    server.tracker.upsert(tracked("ANDROID-1", "blue", true));

    let (status, headers, body) = send(&server.app, get("alice", "/Marti/api/cot/xml/ANDROID-1")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers[header::CONTENT_TYPE], "application/xml");
    assert!(text(&body).contains("uid=\"ANDROID-1\""));

    let mut stored = tracked("ANDROID-2", "blue", false).event;
    stored.event_type = "b-m-p-s-p-i".to_owned();
    server.points.record(stored);
    let (status, _, body) = send(&server.app, get("alice", "/Marti/api/cot/xml/ANDROID-2")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(text(&body).contains("b-m-p-s-p-i"));

    let (status, _, _) = send(&server.app, get("alice", "/Marti/api/cot/xml/missing")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn contacts_follow_scope() {
    let server = build_server();
    server.tracker.upsert(tracked("blue-1", "blue", true));
    server.tracker.upsert(tracked("red-1", "red", false));

    let (_, _, body) = send(&server.app, get("carol", "/Marti/api/contacts/all")).await;
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    let contacts = json.as_array().unwrap();
    assert_eq!(contacts.len(), 1);
    assert_eq!(contacts[0]["uid"], "blue-1");

    let (_, _, body) = send(&server.app, get("alice", "/Marti/api/clientEndPoints")).await;
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["type"], "com.bbn.marti.remote.ClientEndpoint");
    let endpoints = json["data"].as_array().unwrap();
    assert_eq!(endpoints.len(), 2);
    let red = endpoints.iter().find(|e| e["uid"] == "red-1").unwrap();
    assert_eq!(red["lastStatus"], "Disconnected");
}

// -- Device profiles ------------------------------------------------------

#[tokio::test]
async fn connection_profile_status_codes() {
    let server = build_server();
    let (status, _, _) = send(&server.app, get("alice", "/Marti/api/device/profile/connection")).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _, _) = send(
        &server.app,
        get("alice", "/Marti/api/device/profile/connection?clientUid=blocked-device"),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _, _) = send(
        &server.app,
        get("alice", "/Marti/api/device/profile/connection?clientUid=device-1"),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    server.tracker.upsert(tracked("device-red", "red", true));
    let (status, _, _) = send(
        &server.app,
        get("carol", "/Marti/api/device/profile/connection?clientUid=device-red"),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn connection_profile_is_a_zip() {
    let server = build_server();
    upload_raw(&server.app, "alice", "pref.xml", "&uid=device-1", b"<preferences/>").await;

    let (status, headers, body) = send(
        &server.app,
        get("alice", "/Marti/api/device/profile/connection?clientuid=device-1"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers[header::CONTENT_TYPE], "application/zip");
    assert_eq!(
        headers[header::CONTENT_DISPOSITION],
        "attachment; filename=profile.zip"
    );

    let mut archive = zip::ZipArchive::new(std::io::Cursor::new(body.to_vec())).unwrap();
    let names: Vec<String> = archive.file_names().map(str::to_owned).collect();
    assert!(names.iter().any(|n| n == "MANIFEST/manifest.xml"));
    assert!(names.iter().any(|n| n.ends_with("/pref.xml")));
    let manifest = archive.by_name("MANIFEST/manifest.xml").unwrap();
    assert!(manifest.size() > 0);
}

#[tokio::test]
async fn tool_profile_is_empty_or_forbidden() {
    let server = build_server();
    let (status, _, _) = send(
        &server.app,
        get("alice", "/Marti/api/device/profile/tool/video?clientUid=device-1"),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _, _) = send(&server.app, get("alice", "/Marti/api/device/profile/tool/video")).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}
