//! Graph client unit tests (using WireMock)
//! These tests are fast and don't require a real Graph tenant.

use serde_json::json;
use user_provisioner::config::GraphConfig;
use user_provisioner::error::AppError;
use user_provisioner::graph::{DirectoryApi, GraphClient, NewDirectoryUser, PasswordProfile};
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TENANT: &str = "7f6e5d4c-0000-0000-0000-00000000abcd";

fn create_test_config(base_url: &str) -> GraphConfig {
    GraphConfig {
        tenant_id: TENANT.to_string(),
        client_id: "app-id".to_string(),
        client_secret: "app-secret".to_string(),
        base_url: base_url.to_string(),
        login_url: base_url.to_string(),
    }
}

fn create_test_client(base_url: &str) -> GraphClient {
    GraphClient::new(create_test_config(base_url)).unwrap()
}

async fn mock_token_endpoint(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path(format!("/{}/oauth2/v2.0/token", TENANT)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "mock-token",
            "expires_in": 3600
        })))
        .mount(server)
        .await;
}

fn new_user_input() -> NewDirectoryUser {
    NewDirectoryUser {
        account_enabled: true,
        display_name: "Ada Lovelace".to_string(),
        given_name: "Ada".to_string(),
        surname: "Lovelace".to_string(),
        mail_nickname: "ada".to_string(),
        user_principal_name: "ada@contoso.com".to_string(),
        usage_location: "US".to_string(),
        password_profile: PasswordProfile {
            password: "Temp-Passw0rd!".to_string(),
            force_change_password_next_sign_in: true,
        },
    }
}

#[tokio::test]
async fn test_find_user_success() {
    let mock_server = MockServer::start().await;
    mock_token_endpoint(&mock_server).await;

    Mock::given(method("GET"))
        .and(path("/users/ref@contoso.com"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "ref-id",
            "displayName": "Reference User",
            "userPrincipalName": "ref@contoso.com",
            "assignedLicenses": [
                { "skuId": "sku-1" },
                { "skuId": "sku-2" }
            ]
        })))
        .mount(&mock_server)
        .await;

    let client = create_test_client(&mock_server.uri());

    let user = client.find_user(TENANT, "ref@contoso.com").await.unwrap();
    assert_eq!(user.id, "ref-id");
    assert_eq!(user.assigned_licenses.len(), 2);
    assert_eq!(user.assigned_licenses[0].sku_id, "sku-1");
}

#[tokio::test]
async fn test_find_user_not_found() {
    let mock_server = MockServer::start().await;
    mock_token_endpoint(&mock_server).await;

    Mock::given(method("GET"))
        .and(path("/users/ghost@contoso.com"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "error": { "code": "Request_ResourceNotFound", "message": "Resource does not exist" }
        })))
        .mount(&mock_server)
        .await;

    let client = create_test_client(&mock_server.uri());

    let result = client.find_user(TENANT, "ghost@contoso.com").await;
    match result {
        Err(AppError::NotFound(msg)) => assert!(msg.contains("ghost@contoso.com")),
        other => panic!("expected NotFound, got {:?}", other.map(|u| u.id)),
    }
}

#[tokio::test]
async fn test_create_user_success() {
    let mock_server = MockServer::start().await;
    mock_token_endpoint(&mock_server).await;

    Mock::given(method("POST"))
        .and(path("/users"))
        .and(body_partial_json(json!({
            "accountEnabled": true,
            "userPrincipalName": "ada@contoso.com",
            "passwordProfile": { "forceChangePasswordNextSignIn": true }
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": "new-id",
            "displayName": "Ada Lovelace",
            "userPrincipalName": "ada@contoso.com"
        })))
        .mount(&mock_server)
        .await;

    let client = create_test_client(&mock_server.uri());

    let created = client.create_user(TENANT, &new_user_input()).await.unwrap();
    assert_eq!(created.id, "new-id");
    assert!(created.assigned_licenses.is_empty());
}

#[tokio::test]
async fn test_create_user_duplicate_principal_surfaces_error_text() {
    let mock_server = MockServer::start().await;
    mock_token_endpoint(&mock_server).await;

    Mock::given(method("POST"))
        .and(path("/users"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": {
                "code": "Request_BadRequest",
                "message": "Another object with the same value for property userPrincipalName already exists."
            }
        })))
        .mount(&mock_server)
        .await;

    let client = create_test_client(&mock_server.uri());

    let result = client.create_user(TENANT, &new_user_input()).await;
    match result {
        Err(AppError::Graph(msg)) => assert!(msg.contains("userPrincipalName")),
        other => panic!("expected Graph error, got {:?}", other.map(|u| u.id)),
    }
}

#[tokio::test]
async fn test_assign_license_rejected() {
    let mock_server = MockServer::start().await;
    mock_token_endpoint(&mock_server).await;

    Mock::given(method("POST"))
        .and(path("/users/new-id/assignLicense"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": { "code": "CountViolation", "message": "No available licenses" }
        })))
        .mount(&mock_server)
        .await;

    let client = create_test_client(&mock_server.uri());

    let result = client.assign_license(TENANT, "new-id", "sku-1").await;
    match result {
        Err(AppError::Graph(msg)) => {
            assert!(msg.contains("sku-1"));
            assert!(msg.contains("CountViolation"));
        }
        other => panic!("expected Graph error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_list_memberships_follows_paging() {
    let mock_server = MockServer::start().await;
    mock_token_endpoint(&mock_server).await;

    Mock::given(method("GET"))
        .and(path("/users/ref-id/memberOf"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "value": [
                {
                    "@odata.type": "#microsoft.graph.group",
                    "id": "g-1",
                    "displayName": "Engineering",
                    "mailEnabled": false,
                    "securityEnabled": true
                },
                {
                    "@odata.type": "#microsoft.graph.directoryRole",
                    "id": "r-1",
                    "displayName": "Global Reader"
                }
            ],
            "@odata.nextLink": format!("{}/page2", mock_server.uri())
        })))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/page2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "value": [
                {
                    "@odata.type": "#microsoft.graph.group",
                    "id": "g-2",
                    "displayName": "All Staff",
                    "mail": "all-staff@contoso.com",
                    "mailEnabled": true,
                    "securityEnabled": false
                }
            ]
        })))
        .mount(&mock_server)
        .await;

    let client = create_test_client(&mock_server.uri());

    let memberships = client.list_memberships(TENANT, "ref-id").await.unwrap();
    assert_eq!(memberships.len(), 3);
    // Directory ordering is preserved across pages.
    assert_eq!(memberships[0].id, "g-1");
    assert_eq!(memberships[1].id, "r-1");
    assert_eq!(memberships[2].id, "g-2");
    assert!(memberships[0].is_group());
    assert!(!memberships[1].is_group());
}

#[tokio::test]
async fn test_add_group_member() {
    let mock_server = MockServer::start().await;
    mock_token_endpoint(&mock_server).await;

    Mock::given(method("POST"))
        .and(path("/groups/g-1/members/$ref"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&mock_server)
        .await;

    let client = create_test_client(&mock_server.uri());

    let result = client.add_group_member(TENANT, "g-1", "new-id").await;
    assert!(result.is_ok());
}

#[tokio::test]
async fn test_token_is_cached_across_calls() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(format!("/{}/oauth2/v2.0/token", TENANT)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "mock-token",
            "expires_in": 3600
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/users/ref@contoso.com"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "ref-id",
            "displayName": "Reference User",
            "userPrincipalName": "ref@contoso.com"
        })))
        .mount(&mock_server)
        .await;

    let client = create_test_client(&mock_server.uri());

    client.find_user(TENANT, "ref@contoso.com").await.unwrap();
    client.find_user(TENANT, "ref@contoso.com").await.unwrap();
}
