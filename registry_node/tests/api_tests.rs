//! HTTP surface tests: auth boundary, owner ambiguity, upload cleanup and
//! the full lifecycle over the wire.

use anyhow::Result;
use reqwest::multipart::{Form, Part};
use reqwest::StatusCode;
use serde_json::{json, Value};
use std::sync::Arc;

use deedchain_node::api::{build_router, AppState};
use deedchain_node::artifacts::ArtifactStore;
use deedchain_node::consent::{ConsentVerifier, FailingConsentVerifier, MockConsentVerifier};
use deedchain_node::finalization::MockFinalizationLedger;
use deedchain_node::identity::IdentityManager;
use deedchain_node::ledger::TransactionStore;
use deedchain_node::storage::{MemoryStorage, Storage};
use deedchain_node::workflow::WorkflowEngine;

struct TestServer {
    base: String,
    state: AppState,
    _dir: tempfile::TempDir,
}

impl TestServer {
    fn temp_file_count(&self) -> usize {
        std::fs::read_dir(self.state.artifacts.temp_dir())
            .unwrap()
            .count()
    }

    fn archive_file_count(&self) -> usize {
        std::fs::read_dir(self.state.artifacts.archive_dir())
            .unwrap()
            .count()
    }
}

async fn spawn_server(consent: Arc<dyn ConsentVerifier>) -> Result<TestServer> {
    let dir = tempfile::tempdir()?;
    let storage: Arc<dyn Storage> = Arc::new(MemoryStorage::new());

    let engine = WorkflowEngine::new(
        TransactionStore::new(storage.clone()),
        consent,
        Arc::new(MockFinalizationLedger),
    );
    let identity = IdentityManager::new(storage, "test-secret", 3600);
    let artifacts = ArtifactStore::open(dir.path().join("tmp"), dir.path().join("archive"))?;

    let state = AppState {
        engine: Arc::new(engine),
        identity: Arc::new(identity),
        artifacts: Arc::new(artifacts),
    };

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let router = build_router(state.clone());
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    Ok(TestServer {
        base: format!("http://{}", addr),
        state,
        _dir: dir,
    })
}

async fn register_user(
    client: &reqwest::Client,
    base: &str,
    mobile: &str,
    email: &str,
    aadhaar: &str,
) -> Result<String> {
    let res = client
        .post(format!("{}/api/auth/register", base))
        .json(&json!({
            "name": "Test User",
            "mobile": mobile,
            "email": email,
            "password": "s3cret-pass",
            "aadhaarNo": aadhaar,
            "address": "Pune",
        }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::CREATED);
    let body: Value = res.json().await?;
    Ok(body["token"].as_str().unwrap().to_string())
}

fn create_payload() -> Value {
    json!({
        "sellerName": "Asha Rao",
        "sellerId": "430156789012",
        "buyerName": "Vikram Shah",
        "buyerId": "981234567890",
        "propertyType": "Apartment",
        "propertyDescription": "2BHK, 4th floor, Sunrise Residency",
        "propertyAddress": "12 MG Road, Pune",
        "salePrice": 500000u64,
        "advancePaid": 50000u64,
        "paymentMode": "Bank Transfer",
        "ownershipConfirmed": true,
        "noLegalDisputes": true,
        "noEncumbrances": true,
    })
}

async fn create_transaction(
    client: &reqwest::Client,
    base: &str,
    token: &str,
) -> Result<String> {
    let res = client
        .post(format!("{}/api/transactions", base))
        .bearer_auth(token)
        .json(&create_payload())
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::CREATED);
    let body: Value = res.json().await?;
    assert_eq!(body["data"]["status"], "consent-pending");
    Ok(body["data"]["id"].as_str().unwrap().to_string())
}

fn video_form() -> Form {
    Form::new().part(
        "video",
        Part::bytes(b"fake webm bytes".to_vec())
            .file_name("consent.webm")
            .mime_str("video/webm")
            .unwrap(),
    )
}

fn signature_form() -> Form {
    Form::new().part(
        "signature",
        Part::bytes(b"fake png bytes".to_vec())
            .file_name("signature.png")
            .mime_str("image/png")
            .unwrap(),
    )
}

#[tokio::test]
async fn requests_without_token_are_rejected() -> Result<()> {
    let server = spawn_server(Arc::new(MockConsentVerifier::instant())).await?;
    let client = reqwest::Client::new();

    let res = client
        .get(format!("{}/api/transactions", server.base))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = client
        .get(format!("{}/api/transactions", server.base))
        .bearer_auth("not-a-real-token")
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn non_owner_cannot_tell_absent_from_not_owned() -> Result<()> {
    let server = spawn_server(Arc::new(MockConsentVerifier::instant())).await?;
    let client = reqwest::Client::new();

    let owner = register_user(&client, &server.base, "9876543210", "a@example.in", "430156789012").await?;
    let intruder =
        register_user(&client, &server.base, "9876543211", "b@example.in", "981234567890").await?;
    let tx_id = create_transaction(&client, &server.base, &owner).await?;

    let mut bodies = Vec::new();
    for id in [tx_id.as_str(), "0000-no-such-id"] {
        let res = client
            .get(format!("{}/api/transactions/{}", server.base, id))
            .bearer_auth(&intruder)
            .send()
            .await?;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
        let body: Value = res.json().await?;
        bodies.push(body);
    }
    // same code, same message, no hint of existence
    assert_eq!(bodies[0]["code"], bodies[1]["code"]);
    assert_eq!(bodies[0]["message"], bodies[1]["message"]);
    assert_eq!(bodies[0]["details"], bodies[1]["details"]);

    // mutating operations behave the same way
    let res = client
        .put(format!("{}/api/transactions/{}/approve", server.base, tx_id))
        .bearer_auth(&intruder)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let body: Value = res.json().await?;
    assert_eq!(body["message"], bodies[0]["message"]);

    // the owner still sees the record untouched
    let res = client
        .get(format!("{}/api/transactions/{}", server.base, tx_id))
        .bearer_auth(&owner)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn failed_verification_leaves_no_artifacts_behind() -> Result<()> {
    let server = spawn_server(Arc::new(FailingConsentVerifier)).await?;
    let client = reqwest::Client::new();
    let token =
        register_user(&client, &server.base, "9876543210", "a@example.in", "430156789012").await?;
    let tx_id = create_transaction(&client, &server.base, &token).await?;

    let res = client
        .put(format!("{}/api/transactions/{}/consent", server.base, tx_id))
        .bearer_auth(&token)
        .multipart(video_form())
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_GATEWAY);

    assert_eq!(server.temp_file_count(), 0);
    assert_eq!(server.archive_file_count(), 0);

    // the transaction is still waiting on consent
    let res = client
        .get(format!("{}/api/transactions/{}", server.base, tx_id))
        .bearer_auth(&token)
        .send()
        .await?;
    let body: Value = res.json().await?;
    assert_eq!(body["data"]["status"], "consent-pending");
    assert_eq!(body["data"]["consentVerified"], false);
    Ok(())
}

#[tokio::test]
async fn upload_to_missing_transaction_leaves_no_artifacts() -> Result<()> {
    let server = spawn_server(Arc::new(MockConsentVerifier::instant())).await?;
    let client = reqwest::Client::new();
    let token =
        register_user(&client, &server.base, "9876543210", "a@example.in", "430156789012").await?;

    let res = client
        .put(format!(
            "{}/api/transactions/no-such-id/consent",
            server.base
        ))
        .bearer_auth(&token)
        .multipart(video_form())
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(server.temp_file_count(), 0);

    // wrong content type is refused before anything touches the engine
    let res = client
        .put(format!(
            "{}/api/transactions/no-such-id/consent",
            server.base
        ))
        .bearer_auth(&token)
        .multipart(Form::new().part(
            "video",
            Part::bytes(b"plain text".to_vec())
                .file_name("notes.txt")
                .mime_str("text/plain")
                .unwrap(),
        ))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(server.temp_file_count(), 0);
    Ok(())
}

#[tokio::test]
async fn full_lifecycle_over_http() -> Result<()> {
    let server = spawn_server(Arc::new(MockConsentVerifier::instant())).await?;
    let client = reqwest::Client::new();
    let token =
        register_user(&client, &server.base, "9876543210", "a@example.in", "430156789012").await?;
    let tx_id = create_transaction(&client, &server.base, &token).await?;

    // consent video
    let res = client
        .put(format!("{}/api/transactions/{}/consent", server.base, tx_id))
        .bearer_auth(&token)
        .multipart(video_form())
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await?;
    assert_eq!(body["verified"], true);
    assert_eq!(body["transaction"]["status"], "signature-pending");
    assert_eq!(body["transaction"]["consentVerified"], true);

    // signature image
    let res = client
        .put(format!("{}/api/transactions/{}/sign", server.base, tx_id))
        .bearer_auth(&token)
        .multipart(signature_form())
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await?;
    assert_eq!(body["transaction"]["status"], "approval-pending");

    // both artifacts archived, spool empty
    assert_eq!(server.temp_file_count(), 0);
    assert_eq!(server.archive_file_count(), 2);

    // approval
    let res = client
        .put(format!("{}/api/transactions/{}/approve", server.base, tx_id))
        .bearer_auth(&token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await?;
    assert_eq!(body["data"]["status"], "payment-pending");

    // payment
    let res = client
        .put(format!(
            "{}/api/transactions/{}/confirm-payment",
            server.base, tx_id
        ))
        .bearer_auth(&token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await?;
    assert_eq!(body["data"]["status"], "processing");

    // finalize with an incomplete proof pair first
    let res = client
        .put(format!("{}/api/transactions/{}/finalize", server.base, tx_id))
        .bearer_auth(&token)
        .json(&json!({ "ipfsCid": "bafybeigdyrhexample" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = client
        .put(format!("{}/api/transactions/{}/finalize", server.base, tx_id))
        .bearer_auth(&token)
        .json(&json!({
            "ipfsCid": "bafybeigdyrhexample",
            "transactionHash": "0xabc123",
        }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await?;
    assert_eq!(body["data"]["status"], "completed");
    assert_eq!(body["data"]["ipfsCid"], "bafybeigdyrhexample");
    assert_eq!(body["data"]["transactionHash"], "0xabc123");
    assert!(!body["data"]["completedAt"].is_null());

    // repeating the transition is rejected, not re-applied
    let res = client
        .put(format!("{}/api/transactions/{}/finalize", server.base, tx_id))
        .bearer_auth(&token)
        .json(&json!({
            "ipfsCid": "bafybeigdyrhexample",
            "transactionHash": "0xabc123",
        }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::CONFLICT);
    Ok(())
}

#[tokio::test]
async fn generic_update_cannot_move_status() -> Result<()> {
    let server = spawn_server(Arc::new(MockConsentVerifier::instant())).await?;
    let client = reqwest::Client::new();
    let token =
        register_user(&client, &server.base, "9876543210", "a@example.in", "430156789012").await?;
    let tx_id = create_transaction(&client, &server.base, &token).await?;

    // editing a status-bearing field is a validation error
    for payload in [
        json!({ "status": "completed" }),
        json!({ "adminApproved": true }),
        json!({ "ipfsCid": "bafyforged" }),
    ] {
        let res = client
            .put(format!("{}/api/transactions/{}", server.base, tx_id))
            .bearer_auth(&token)
            .json(&payload)
            .send()
            .await?;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }

    // ordinary detail edits still work
    let res = client
        .put(format!("{}/api/transactions/{}", server.base, tx_id))
        .bearer_auth(&token)
        .json(&json!({ "propertyDescription": "2BHK with covered parking" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await?;
    assert_eq!(body["data"]["propertyDescription"], "2BHK with covered parking");
    assert_eq!(body["data"]["status"], "consent-pending");

    // skipping ahead from the wrong state is refused
    let res = client
        .put(format!("{}/api/transactions/{}/finalize", server.base, tx_id))
        .bearer_auth(&token)
        .json(&json!({ "ipfsCid": "bafy", "transactionHash": "0x1" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::CONFLICT);
    Ok(())
}

#[tokio::test]
async fn auth_flow_and_owner_listing() -> Result<()> {
    let server = spawn_server(Arc::new(MockConsentVerifier::instant())).await?;
    let client = reqwest::Client::new();
    register_user(&client, &server.base, "9876543210", "a@example.in", "430156789012").await?;

    // OTP stub accepts the fixed code only
    let res = client
        .post(format!("{}/api/auth/verify-otp", server.base))
        .json(&json!({ "mobile": "9876543210", "otp": "123456" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let res = client
        .post(format!("{}/api/auth/verify-otp", server.base))
        .json(&json!({ "mobile": "9876543210", "otp": "999999" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    // login and list own transactions through /me
    let res = client
        .post(format!("{}/api/auth/login", server.base))
        .json(&json!({ "mobile": "9876543210", "password": "s3cret-pass" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await?;
    let token = body["token"].as_str().unwrap().to_string();

    create_transaction(&client, &server.base, &token).await?;
    create_transaction(&client, &server.base, &token).await?;

    let res = client
        .get(format!("{}/api/transactions", server.base))
        .bearer_auth(&token)
        .send()
        .await?;
    let body: Value = res.json().await?;
    assert_eq!(body["count"], 2);

    let res = client
        .get(format!("{}/api/auth/me", server.base))
        .bearer_auth(&token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await?;
    assert_eq!(body["data"]["transactions"].as_array().unwrap().len(), 2);

    // delete one; the record vanishes behind the ambiguity rule
    let tx_id = body["data"]["transactions"][0]["id"].as_str().unwrap().to_string();
    let res = client
        .delete(format!("{}/api/transactions/{}", server.base, tx_id))
        .bearer_auth(&token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let res = client
        .get(format!("{}/api/transactions/{}", server.base, tx_id))
        .bearer_auth(&token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    Ok(())
}
