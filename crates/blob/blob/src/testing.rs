use tokio::io::AsyncReadExt;

use marti_core::{ContentHash, Scope};

use crate::error::BlobError;
use crate::store::{BlobStore, RecordingArea};

async fn read_all(store: &dyn BlobStore, scope: &Scope, hash: &ContentHash) -> Result<Vec<u8>, BlobError> {
    let mut reader = store.get(scope, hash).await?;
    let mut out = Vec::new();
    reader.read_to_end(&mut out).await?;
    Ok(out)
}

/// Run the full blob store conformance test suite.
///
/// Call this from your backend's test module with a fresh store instance.
///
/// # Errors
///
/// Returns an error if any conformance test fails.
pub async fn run_store_conformance_tests(store: &dyn BlobStore) -> Result<(), BlobError> {
    test_put_and_get(store).await?;
    test_idempotent_put(store).await?;
    test_hash_mismatch_not_committed(store).await?;
    test_matching_declared_hash(store).await?;
    test_get_missing(store).await?;
    test_scope_isolation(store).await?;
    test_invalid_scope(store).await?;
    Ok(())
}

async fn test_put_and_get(store: &dyn BlobStore) -> Result<(), BlobError> {
    let scope = Scope::from("conf-a");
    let mut input: &[u8] = b"mission package bytes";
    let stored = store.put(&scope, None, &mut input).await?;
    assert_eq!(stored.size, 21);
    assert_eq!(stored.hash.len(), 64, "hash should be hex sha-256");
    assert_eq!(read_all(store, &scope, &stored.hash).await?, b"mission package bytes");
    assert!(store.exists(&scope, &stored.hash).await?);
    Ok(())
}

async fn test_idempotent_put(store: &dyn BlobStore) -> Result<(), BlobError> {
    let scope = Scope::from("conf-a");
    let mut first: &[u8] = b"same bytes";
    let mut second: &[u8] = b"same bytes";
    let a = store.put(&scope, None, &mut first).await?;
    let b = store.put(&scope, None, &mut second).await?;
    assert_eq!(a, b, "identical content should yield the same hash");
    assert_eq!(read_all(store, &scope, &a.hash).await?, b"same bytes");
    Ok(())
}

async fn test_hash_mismatch_not_committed(store: &dyn BlobStore) -> Result<(), BlobError> {
    let scope = Scope::from("conf-a");
    let mut input: &[u8] = b"tampered";
    let wrong = ContentHash::from("0000000000000000000000000000000000000000000000000000000000000000");
    let result = store.put(&scope, Some(&wrong), &mut input).await;
    assert!(
        matches!(result, Err(BlobError::HashMismatch { .. })),
        "mismatched declared hash should be rejected"
    );
    assert!(!store.exists(&scope, &wrong).await?, "nothing stored under the declared hash");

    let mut again: &[u8] = b"tampered";
    let computed = crate::hashing::copy_hashed(&mut again, &mut tokio::io::sink()).await?;
    assert!(
        !store.exists(&scope, &computed.hash).await?,
        "nothing stored under the computed hash either"
    );
    Ok(())
}

async fn test_matching_declared_hash(store: &dyn BlobStore) -> Result<(), BlobError> {
    let scope = Scope::from("conf-a");
    let mut sample: &[u8] = b"declared";
    let expected = crate::hashing::copy_hashed(&mut sample, &mut tokio::io::sink()).await?;
    let mut input: &[u8] = b"declared";
    let stored = store.put(&scope, Some(&expected.hash), &mut input).await?;
    assert_eq!(stored.hash, expected.hash);
    Ok(())
}

async fn test_get_missing(store: &dyn BlobStore) -> Result<(), BlobError> {
    let scope = Scope::from("conf-a");
    let hash = ContentHash::from("feedface");
    match store.get(&scope, &hash).await {
        Err(BlobError::NotFound { .. }) => {}
        Err(e) => return Err(e),
        Ok(_) => panic!("get on missing key should fail with NotFound"),
    }
    assert!(!store.exists(&scope, &hash).await?);
    Ok(())
}

async fn test_scope_isolation(store: &dyn BlobStore) -> Result<(), BlobError> {
    let mut input: &[u8] = b"scoped content";
    let stored = store.put(&Scope::from("conf-b"), None, &mut input).await?;
    assert!(
        !store.exists(&Scope::from("conf-c"), &stored.hash).await?,
        "same hash in another scope must not resolve"
    );
    Ok(())
}

async fn test_invalid_scope(store: &dyn BlobStore) -> Result<(), BlobError> {
    let mut input: &[u8] = b"x";
    let result = store.put(&Scope::from("../escape"), None, &mut input).await;
    assert!(matches!(result, Err(BlobError::InvalidKey(_))));
    Ok(())
}

async fn read_recording(area: &dyn RecordingArea, scope: &Scope, name: &str) -> Result<Vec<u8>, BlobError> {
    let mut out = Vec::new();
    area.get(scope, name).await?.read_to_end(&mut out).await?;
    Ok(out)
}

/// Run the recording area conformance test suite.
///
/// # Errors
///
/// Returns an error if any conformance test fails.
pub async fn run_recording_conformance_tests(area: &dyn RecordingArea) -> Result<(), BlobError> {
    let blue = Scope::from("conf-blue");
    let red = Scope::from("conf-red");

    let mut input: &[u8] = b"webm data";
    let n = area.put(&blue, "webcam-recording-1.webm", &mut input).await?;
    assert_eq!(n, 9);
    assert_eq!(read_recording(area, &blue, "webcam-recording-1.webm").await?, b"webm data");

    let mut replacement: &[u8] = b"newer and longer";
    assert!(
        matches!(
            area.put(&blue, "webcam-recording-1.webm", &mut replacement).await,
            Err(BlobError::AlreadyExists { .. })
        ),
        "second writer of a name is rejected"
    );
    assert_eq!(
        read_recording(area, &blue, "webcam-recording-1.webm").await?,
        b"webm data",
        "first writer's bytes survive"
    );

    let mut other: &[u8] = b"red bytes";
    area.put(&red, "webcam-recording-1.webm", &mut other).await?;
    assert_eq!(read_recording(area, &red, "webcam-recording-1.webm").await?, b"red bytes");
    assert_eq!(
        read_recording(area, &blue, "webcam-recording-1.webm").await?,
        b"webm data",
        "same name in another scope is a different key"
    );

    area.remove(&red, "webcam-recording-1.webm").await?;
    assert!(matches!(
        area.get(&red, "webcam-recording-1.webm").await,
        Err(BlobError::NotFound { .. })
    ));
    area.remove(&red, "webcam-recording-1.webm").await?;
    let mut again: &[u8] = b"red again";
    area.put(&red, "webcam-recording-1.webm", &mut again).await?;

    assert!(matches!(
        area.get(&blue, "missing.webm").await,
        Err(BlobError::NotFound { .. })
    ));

    let mut input: &[u8] = b"x";
    assert!(matches!(
        area.put(&blue, "..", &mut input).await,
        Err(BlobError::InvalidKey(_))
    ));
    let mut input: &[u8] = b"x";
    assert!(matches!(
        area.put(&Scope::from("../escape"), "clip.webm", &mut input).await,
        Err(BlobError::InvalidKey(_))
    ));
    Ok(())
}
