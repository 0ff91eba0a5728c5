//! License acquisition against a mock acquisition server

mod helpers;

use helpers::*;
use odm_core::api::license::auth_hash;
use odm_core::{LicenseAgent, Manifest, OdmError};
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn manifest_for(server: &MockServer) -> Manifest {
    Manifest::parse(&sample_manifest_xml(&server.uri(), &[part("a.mp3", 10)])).unwrap()
}

#[tokio::test]
async fn test_license_request_shape() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/license/acquire"))
        .and(query_param("MediaID", MEDIA_ID))
        .and(query_param("OMC", "1.2.0"))
        .and(query_param("OS", "10.11.6"))
        .and(header("User-Agent", "OverDrive Media Console"))
        .respond_with(EchoLicense)
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let manifest = manifest_for(&server).await;
    let license = LicenseAgent::new(client())
        .acquire(&manifest, &dir.path().join("book.license"))
        .await
        .unwrap();

    let requests = server.received_requests().await.unwrap();
    let request = &requests[0];
    let client_id = query_value(request, "ClientID").unwrap();
    let hash = query_value(request, "Hash").unwrap();

    // The issued license binds the identifier the request was signed with
    assert_eq!(license.client_id(), client_id);
    assert_eq!(hash, auth_hash(&client_id, "1.2.0", "10.11.6"));
    assert_eq!(uuid_version(&client_id), Some('4'));
}

fn uuid_version(id: &str) -> Option<char> {
    // xxxxxxxx-xxxx-Vxxx-...
    (id.len() == 36).then(|| id.as_bytes()[14] as char)
}

#[tokio::test]
async fn test_second_acquisition_uses_cache() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/license/acquire"))
        .respond_with(EchoLicense)
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let cache = dir.path().join("book.license");
    let manifest = manifest_for(&server).await;
    let agent = LicenseAgent::new(client());

    let first = agent.acquire(&manifest, &cache).await.unwrap();
    assert!(cache.is_file());
    let second = agent.acquire(&manifest, &cache).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(std::fs::read_to_string(&cache).unwrap(), first.raw_xml());
}

#[tokio::test]
async fn test_agent_without_persistence_leaves_no_cache() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/license/acquire"))
        .respond_with(EchoLicense)
        .expect(2)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let cache = dir.path().join("book.license");
    let manifest = manifest_for(&server).await;
    let agent = LicenseAgent::new(client()).persist_cache(false);

    agent.acquire(&manifest, &cache).await.unwrap();
    agent.acquire(&manifest, &cache).await.unwrap();
    assert!(!cache.exists());
}

#[tokio::test]
async fn test_rejected_license_request() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/license/acquire"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let cache = dir.path().join("book.license");
    let err = LicenseAgent::new(client())
        .acquire(&manifest_for(&server).await, &cache)
        .await
        .unwrap_err();

    assert!(matches!(err, OdmError::LicenseStatus { status: 403 }));
    assert!(!cache.exists());
}

#[tokio::test]
async fn test_license_for_other_client_is_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/license/acquire"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(sample_license_xml("22222222-2222-4222-8222-222222222222")),
        )
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let cache = dir.path().join("book.license");
    let err = LicenseAgent::new(client())
        .acquire(&manifest_for(&server).await, &cache)
        .await
        .unwrap_err();

    match err {
        OdmError::ClientIdMismatch { actual, .. } => {
            assert_eq!(actual, "22222222-2222-4222-8222-222222222222");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(!cache.exists());
}

#[tokio::test]
async fn test_cached_license_for_other_media_is_used_silently() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/license/acquire"))
        .respond_with(EchoLicense)
        .expect(0)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let cache = dir.path().join("book.license");
    let cached = sample_license_xml("cached-client").replace(MEDIA_ID, "SOME-OTHER-TITLE");
    std::fs::write(&cache, &cached).unwrap();

    let license = LicenseAgent::new(client())
        .acquire(&manifest_for(&server).await, &cache)
        .await
        .unwrap();

    assert_eq!(license.content_id(), Some("SOME-OTHER-TITLE"));
    assert_eq!(license.raw_xml(), cached);
}
