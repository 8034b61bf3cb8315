//! Tests for the Nest HTTP client.
//!
//! These tests use mock servers to verify request shapes and error mapping
//! without requiring a real server.

use nest_client::{ClientConfig, ClientError, NestClient, TreeRemote};
use nest_core::{
    ErrorKind, ItemRef, MembershipId, NewNode, NodeId, OwnerId, PlaylistNode,
};
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> NestClient {
    NestClient::new(ClientConfig::with_token(server.uri(), "test-token")).unwrap()
}

// =============================================================================
// Client Creation Tests
// =============================================================================

mod client_creation {
    use super::*;

    #[test]
    fn test_valid_urls() {
        assert!(NestClient::new(ClientConfig::new("https://nest.example.com")).is_ok());
        assert!(NestClient::new(ClientConfig::new("http://localhost:3001")).is_ok());
    }

    #[test]
    fn test_empty_url_rejected() {
        match NestClient::new(ClientConfig::new("")) {
            Err(ClientError::InvalidUrl(msg)) => assert!(msg.contains("empty")),
            other => panic!("Expected InvalidUrl error, got {:?}", other.err()),
        }
    }

    #[test]
    fn test_non_http_scheme_rejected() {
        assert!(matches!(
            NestClient::new(ClientConfig::new("ftp://nest.example.com")),
            Err(ClientError::InvalidUrl(_))
        ));
    }

    #[test]
    fn test_trailing_slash_trimmed() {
        let client = NestClient::new(ClientConfig::new("http://localhost:3001/")).unwrap();
        assert_eq!(client.url(), "http://localhost:3001");
    }

    #[tokio::test]
    async fn test_requests_without_token_fail_fast() {
        let client = NestClient::new(ClientConfig::new("http://localhost:3001")).unwrap();
        assert!(!client.is_authenticated().await);
        assert!(matches!(
            client.get_tree().await,
            Err(ClientError::AuthRequired)
        ));
    }
}

// =============================================================================
// Request Tests
// =============================================================================

mod requests {
    use super::*;

    #[tokio::test]
    async fn test_health_needs_no_token() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/health"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "status": "ok",
                "version": "0.1.0"
            })))
            .mount(&server)
            .await;

        let client = NestClient::new(ClientConfig::new(server.uri())).unwrap();
        let health = client.health().await.unwrap();
        assert_eq!(health.status, "ok");
    }

    #[tokio::test]
    async fn test_create_playlist_sends_bearer_and_body() {
        let server = MockServer::start().await;
        let parent = NodeId::new("parent-1");
        let created = PlaylistNode::new(
            OwnerId::new("alice"),
            Some(parent.clone()),
            0,
            NewNode::named("Focus"),
        );

        Mock::given(method("POST"))
            .and(path("/playlists"))
            .and(header("authorization", "Bearer test-token"))
            .and(body_json(serde_json::json!({
                "name": "Focus",
                "icon": null,
                "color": null,
                "cover_image_url": null,
                "external_playlist_id": null,
                "parent_id": "parent-1"
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(&created))
            .mount(&server)
            .await;

        let node = client_for(&server)
            .create_playlist(Some(&parent), NewNode::named("Focus"))
            .await
            .unwrap();
        assert_eq!(node, created);
    }

    #[tokio::test]
    async fn test_reorder_uses_tagged_items() {
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .and(path("/playlists/p1/items/reorder"))
            .and(body_json(serde_json::json!({
                "items": [
                    {"type": "playlist", "id": "child"},
                    {"type": "track", "id": "m1"}
                ]
            })))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"reordered": true})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let items = [
            ItemRef::Node(NodeId::new("child")),
            ItemRef::Track(MembershipId::new("m1")),
        ];
        let ack = client.reorder_items(&NodeId::new("p1"), &items).await.unwrap();
        assert!(ack.reordered);
    }

    #[tokio::test]
    async fn test_move_track_addresses_source_playlist() {
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .and(path("/playlists/src/tracks/m1/move"))
            .and(body_json(serde_json::json!({
                "target_playlist_id": "dst",
                "order": 2
            })))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"moved": true})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        TreeRemote::move_track(
            &client,
            &MembershipId::new("m1"),
            &NodeId::new("src"),
            &NodeId::new("dst"),
            2,
        )
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn test_items_map_is_decoded() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/playlists/root/items"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "root": [{"type": "playlist", "id": "a"}, {"type": "track", "id": "t"}],
                "a": []
            })))
            .mount(&server)
            .await;

        let items = client_for(&server)
            .get_items(&NodeId::new("root"))
            .await
            .unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(
            items[&NodeId::new("root")][1],
            ItemRef::Track(MembershipId::new("t"))
        );
    }
}

// =============================================================================
// Error Mapping Tests
// =============================================================================

mod errors {
    use super::*;

    #[tokio::test]
    async fn test_structured_error_keeps_kind() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/playlists/root/reparent"))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "error": "Cannot move a playlist into its own sub-playlist (root under child)",
                "kind": "invalid_operation"
            })))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .reparent_playlist(&NodeId::new("root"), Some(&NodeId::new("child")), None)
            .await
            .unwrap_err();

        match &err {
            ClientError::Api {
                status,
                kind,
                message,
            } => {
                assert_eq!(*status, 400);
                assert_eq!(*kind, Some(ErrorKind::InvalidOperation));
                assert!(message.contains("own sub-playlist"));
            }
            other => panic!("Expected Api error, got {:?}", other),
        }
        assert!(!err.needs_refresh());
    }

    #[tokio::test]
    async fn test_stale_move_asks_for_refresh() {
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .and(path("/playlists/wrong/tracks/m1/move"))
            .respond_with(ResponseTemplate::new(404).set_body_json(serde_json::json!({
                "error": "Track m1 is not in playlist wrong; refresh and try again",
                "kind": "not_found"
            })))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .move_track(
                &NodeId::new("wrong"),
                &MembershipId::new("m1"),
                &NodeId::new("dst"),
                0,
            )
            .await
            .unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::NotFound));
        assert!(err.needs_refresh());
    }

    #[tokio::test]
    async fn test_unauthorized_maps_to_auth_required() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/playlists"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        assert!(matches!(
            client_for(&server).get_tree().await,
            Err(ClientError::AuthRequired)
        ));
    }

    #[tokio::test]
    async fn test_plain_text_error_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/playlists/x"))
            .respond_with(ResponseTemplate::new(500).set_body_string("Internal Server Error"))
            .mount(&server)
            .await;

        match client_for(&server).get_playlist(&NodeId::new("x")).await {
            Err(ClientError::Api { status, kind, message }) => {
                assert_eq!(status, 500);
                assert_eq!(kind, None);
                assert_eq!(message, "Internal Server Error");
            }
            other => panic!("Expected Api error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_invalid_json_is_parse_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/playlists"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not valid json"))
            .mount(&server)
            .await;

        assert!(matches!(
            client_for(&server).get_tree().await,
            Err(ClientError::ParseError(_))
        ));
    }

    #[tokio::test]
    async fn test_unreachable_server() {
        let client =
            NestClient::new(ClientConfig::with_token("http://127.0.0.1:1", "token")).unwrap();
        match client.get_tree().await {
            Err(ClientError::ServerUnreachable(_) | ClientError::Request(_)) => {}
            other => panic!("Expected unreachable error, got {:?}", other),
        }
    }
}
