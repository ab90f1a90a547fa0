//! End-to-end payment flow against a mock resource server.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as b64;
use serde_json::{Value, json};
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use molty::config::Config;
use molty_a2a::A2aClient;
use molty_x402::proto::X402_EXTENSION_URI;

// Throwaway key, never funded.
const TEST_EVM_KEY: &str = "0x59c6995e998f97a5a0044966f0945389dc9e86dae88c7a8412f4603b6b78690d";

fn test_config(server: &MockServer) -> Config {
    Config {
        evm_private_key: Some(TEST_EVM_KEY.to_string()),
        svm_private_key: None,
        identity_token: Some("test-token".to_string()),
        resource_server_url: server.uri(),
        svm_rpc_url: "http://localhost:8899".to_string(),
    }
}

fn client(server: &MockServer) -> A2aClient {
    A2aClient::new(&server.uri(), Some("test-token".to_string()))
        .unwrap()
        .with_extensions([X402_EXTENSION_URI.to_string()])
}

fn payment_required_response() -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "jsonrpc": "2.0",
        "id": 1,
        "result": {
            "id": "task-123",
            "status": {
                "state": "input-required",
                "message": {
                    "role": "agent",
                    "parts": [{ "kind": "text", "text": "Payment required." }],
                    "metadata": {
                        "x402.payment.required": {
                            "x402Version": 1,
                            "accepts": [{
                                "scheme": "exact",
                                "network": "base",
                                "maxAmountRequired": "500000",
                                "resource": "https://api.molty.cash/a2a",
                                "description": "USDC transfer",
                                "mimeType": "application/json",
                                "payTo": "0x209693Bc6afc0C5328bA36FaF03C514EF312287C",
                                "maxTimeoutSeconds": 600,
                                "asset": "0x833589fCD6eDb6E08f4c7C32D4f71b54bdA02913",
                                "extra": { "name": "USD Coin", "version": "2" }
                            }]
                        }
                    }
                }
            }
        }
    }))
}

fn settled_response() -> ResponseTemplate {
    let receipt = json!({
        "success": true,
        "amount": 0.5,
        "transaction": "0xabc123",
        "network": "base"
    });
    let encoded = b64.encode(serde_json::to_vec(&receipt).unwrap());
    ResponseTemplate::new(200).set_body_json(json!({
        "jsonrpc": "2.0",
        "id": 2,
        "result": {
            "id": "task-123",
            "status": { "state": "completed" },
            "artifacts": [{
                "artifactId": "receipt-1",
                "name": "receipt",
                "parts": [{ "kind": "text", "text": encoded }]
            }]
        }
    }))
}

#[tokio::test]
async fn send_pays_in_two_phases() {
    let server = MockServer::start().await;

    // Phase 2: the resubmission carries the phase-1 task id.
    Mock::given(method("POST"))
        .and(path("/a2a"))
        .and(body_partial_json(json!({"params": {"taskId": "task-123"}})))
        .respond_with(settled_response())
        .expect(1)
        .mount(&server)
        .await;
    // Phase 1: everything else.
    Mock::given(method("POST"))
        .and(path("/a2a"))
        .and(header("X-A2A-Extensions", X402_EXTENSION_URI))
        .respond_with(payment_required_response())
        .expect(1)
        .mount(&server)
        .await;

    let config = test_config(&server);
    molty::send::run(&config, &client(&server), "x/someone", "50¢", None)
        .await
        .unwrap();

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 2);

    let second: Value = serde_json::from_slice(&requests[1].body).unwrap();
    assert_eq!(second["method"], "molty.send");
    assert_eq!(second["params"]["taskId"], "task-123");
    assert_eq!(second["params"]["amount"], 0.5);
    assert_eq!(second["params"]["recipient"]["platform"], "x");

    // The attached payload decodes to a v1 exact payment on base.
    let payload_b64 = second["params"]["metadata"]["x402.payment.payload"]
        .as_str()
        .unwrap();
    let payload: Value = serde_json::from_slice(&b64.decode(payload_b64).unwrap()).unwrap();
    assert_eq!(payload["x402Version"], 1);
    assert_eq!(payload["scheme"], "exact");
    assert_eq!(payload["network"], "base");
    assert_eq!(
        payload["payload"]["authorization"]["to"].as_str().unwrap().to_lowercase(),
        "0x209693bc6afc0c5328ba36faf03c514ef312287c"
    );
    assert!(payload["payload"]["signature"].as_str().unwrap().starts_with("0x"));
}

#[tokio::test]
async fn rpc_error_aborts_after_one_call() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/a2a"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "jsonrpc": "2.0",
            "id": 1,
            "error": { "code": -32000, "message": "insufficient funds" }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let config = test_config(&server);
    let err = molty::send::run(&config, &client(&server), "x/someone", "50¢", None)
        .await
        .unwrap_err();
    assert!(err.to_string().contains("insufficient funds"));
    assert_eq!(server.received_requests().await.unwrap().len(), 1);
}

#[tokio::test]
async fn repeated_payment_demand_is_an_error() {
    let server = MockServer::start().await;
    // Both phases answer with payment-required.
    Mock::given(method("POST"))
        .and(path("/a2a"))
        .respond_with(payment_required_response())
        .expect(2)
        .mount(&server)
        .await;

    let config = test_config(&server);
    let err = molty::send::run(&config, &client(&server), "x/someone", "50¢", None)
        .await
        .unwrap_err();
    assert!(err.to_string().contains("payment"));
    assert_eq!(server.received_requests().await.unwrap().len(), 2);
}

#[tokio::test]
async fn failed_task_state_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/a2a"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "jsonrpc": "2.0",
            "id": 1,
            "result": {
                "id": "task-9",
                "status": {
                    "state": "failed",
                    "message": { "parts": [{ "kind": "text", "text": "recipient has no wallet" }] }
                }
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let config = test_config(&server);
    let err = molty::send::run(&config, &client(&server), "x/someone", "50¢", None)
        .await
        .unwrap_err();
    assert!(err.to_string().contains("recipient has no wallet"));
}
