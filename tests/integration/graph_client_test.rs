//! Integration tests for the Graph client against a mock server

use appcensus::error::AppError;
use appcensus::graph::GraphClient;
use chrono::{Duration, Utc};
use futures_util::TryStreamExt;
use serde_json::json;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::common::{
    graph_config, mount_token_endpoint, odata_count, odata_error, odata_page, sync_config,
    ServicePrincipalBuilder, TEST_TENANT_ID,
};

#[tokio::test]
async fn listing_follows_continuation_links() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server).await;

    let page2_link = format!("{}/v1.0/servicePrincipals?cursor=2", server.uri());
    let page1 = odata_page(
        &[
            ServicePrincipalBuilder::new("sp-1").build(),
            ServicePrincipalBuilder::new("sp-2").build(),
        ],
        Some(&page2_link),
    );
    let page2 = odata_page(&[ServicePrincipalBuilder::new("sp-3").build()], None);

    // First request carries the $top hint; the continuation request replays
    // the server-provided link verbatim.
    Mock::given(method("GET"))
        .and(path("/v1.0/servicePrincipals"))
        .and(query_param("$top", "2"))
        .and(header("authorization", "Bearer test-access-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page1))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v1.0/servicePrincipals"))
        .and(query_param("cursor", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page2))
        .mount(&server)
        .await;

    let client = GraphClient::new(graph_config(&server), sync_config(2)).unwrap();
    let records: Vec<_> = client
        .list_service_principals()
        .try_collect()
        .await
        .unwrap();

    assert_eq!(records.len(), 3);
    assert_eq!(records[0].id, "sp-1");
    assert_eq!(records[1].id, "sp-2");
    assert_eq!(records[2].id, "sp-3");
}

#[tokio::test]
async fn listing_accepts_a_server_chosen_page_size() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server).await;

    // Client hinted $top=100 but the server returns a single record
    let page = odata_page(&[ServicePrincipalBuilder::new("sp-1").build()], None);
    Mock::given(method("GET"))
        .and(path("/v1.0/servicePrincipals"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page))
        .mount(&server)
        .await;

    let client = GraphClient::new(graph_config(&server), sync_config(100)).unwrap();
    let records: Vec<_> = client
        .list_service_principals()
        .try_collect()
        .await
        .unwrap();

    assert_eq!(records.len(), 1);
}

#[tokio::test]
async fn rejected_token_exchange_is_an_auth_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(format!("/{}/oauth2/v2.0/token", TEST_TENANT_ID)))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": "invalid_client",
            "error_description": "AADSTS7000215: Invalid client secret provided."
        })))
        .mount(&server)
        .await;

    let client = GraphClient::new(graph_config(&server), sync_config(100)).unwrap();
    let result: Result<Vec<_>, _> = client.list_service_principals().try_collect().await;

    assert!(matches!(result, Err(AppError::Auth(_))));
}

#[tokio::test]
async fn signin_count_prefers_the_server_count() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server).await;

    Mock::given(method("GET"))
        .and(path("/v1.0/auditLogs/signIns"))
        .and(query_param("$count", "true"))
        .and(header("ConsistencyLevel", "eventual"))
        .respond_with(ResponseTemplate::new(200).set_body_json(odata_count(5)))
        .mount(&server)
        .await;

    let client = GraphClient::new(graph_config(&server), sync_config(100)).unwrap();
    let count = client
        .signin_count("app-1", Utc::now() - Duration::days(30))
        .await
        .unwrap();

    assert_eq!(count, 5);
}

#[tokio::test]
async fn signin_count_walks_pages_when_the_count_is_missing() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server).await;

    let page2_link = format!("{}/v1.0/auditLogs/signIns?cursor=2", server.uri());
    let page1 = odata_page(
        &[json!({ "id": "evt-1" }), json!({ "id": "evt-2" })],
        Some(&page2_link),
    );
    let page2 = odata_page(&[json!({ "id": "evt-3" })], None);

    Mock::given(method("GET"))
        .and(path("/v1.0/auditLogs/signIns"))
        .and(query_param("$count", "true"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page1))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v1.0/auditLogs/signIns"))
        .and(query_param("cursor", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page2))
        .mount(&server)
        .await;

    let client = GraphClient::new(graph_config(&server), sync_config(100)).unwrap();
    let count = client
        .signin_count("app-1", Utc::now() - Duration::days(30))
        .await
        .unwrap();

    assert_eq!(count, 3);
}

#[tokio::test]
async fn denied_signin_query_reads_as_permission_denied() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server).await;

    Mock::given(method("GET"))
        .and(path("/v1.0/auditLogs/signIns"))
        .respond_with(ResponseTemplate::new(403).set_body_json(odata_error(
            "Authorization_RequestDenied",
            "Insufficient privileges to complete the operation.",
        )))
        .mount(&server)
        .await;

    let client = GraphClient::new(graph_config(&server), sync_config(100)).unwrap();
    let err = client
        .signin_count("app-1", Utc::now() - Duration::days(30))
        .await
        .unwrap_err();

    assert!(err.is_permission_denied());
}

#[tokio::test]
async fn odata_error_bodies_surface_the_graph_code() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server).await;

    Mock::given(method("GET"))
        .and(path("/v1.0/servicePrincipals"))
        .respond_with(ResponseTemplate::new(400).set_body_json(odata_error(
            "Request_BadRequest",
            "Invalid filter clause.",
        )))
        .mount(&server)
        .await;

    let client = GraphClient::new(graph_config(&server), sync_config(100)).unwrap();
    let result: Result<Vec<_>, _> = client.list_service_principals().try_collect().await;

    match result {
        Err(AppError::Graph { code, message }) => {
            assert_eq!(code, "Request_BadRequest");
            assert_eq!(message, "Invalid filter clause.");
        }
        other => panic!("Expected a Graph error, got {:?}", other.map(|v| v.len())),
    }
}
