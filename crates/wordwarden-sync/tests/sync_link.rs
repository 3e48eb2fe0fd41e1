//! End-to-end exercise of the sync client against scripted servers.

use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde_json::json;
use tokio::net::TcpListener;
use tokio::sync::{mpsc, watch};
use tokio_tungstenite::tungstenite::Message;
use wordwarden_sync::{SyncClient, SyncClientConfig};
use wordwarden_types::WhitelistUpdate;

fn test_config(port: u16) -> SyncClientConfig {
    SyncClientConfig {
        server_url: format!("ws://127.0.0.1:{port}"),
        client_id: "client-1".into(),
        server_id: "server-1".into(),
        channel_name: "somechannel".into(),
        reconnect_interval: Duration::from_millis(50),
        response_poll_interval: Duration::from_millis(20),
        response_poll_attempts: 10,
        username_live_attempts: 3,
    }
}

struct Harness {
    client: Arc<SyncClient>,
    update_rx: mpsc::Receiver<WhitelistUpdate>,
    announce_rx: mpsc::Receiver<String>,
    shutdown_tx: watch::Sender<bool>,
    runner: tokio::task::JoinHandle<()>,
}

fn start_client(port: u16) -> Harness {
    let (update_tx, update_rx) = mpsc::channel(16);
    let (announce_tx, announce_rx) = mpsc::channel(16);
    let client = Arc::new(SyncClient::new(test_config(port), update_tx, announce_tx));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let runner = {
        let client = Arc::clone(&client);
        tokio::spawn(async move { client.run(shutdown_rx).await })
    };

    Harness {
        client,
        update_rx,
        announce_rx,
        shutdown_tx,
        runner,
    }
}

async fn wait_live(client: &SyncClient) {
    for _ in 0..100 {
        if client.is_live() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("sync link never went live");
}

#[tokio::test]
async fn authenticates_completes_request_and_accepts_push() {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let port = listener.local_addr().expect("addr").port();

    let server = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.expect("accept");
        let mut ws = tokio_tungstenite::accept_async(stream).await.expect("ws");

        // Handshake.
        let frame = ws.next().await.expect("auth frame").expect("auth ok");
        let auth: serde_json::Value =
            serde_json::from_str(frame.to_text().expect("text")).expect("json");
        assert_eq!(auth["function"], "AUTH");
        assert_eq!(auth["id"], "client-1");
        ws.send(Message::Text(
            json!({"id": "client-1", "message": "AUTH_SUCCESS"}).to_string(),
        ))
        .await
        .expect("send auth reply");

        // One whitelist request, acknowledged with its own token.
        let frame = ws.next().await.expect("request frame").expect("request ok");
        let request: serde_json::Value =
            serde_json::from_str(frame.to_text().expect("text")).expect("json");
        assert_eq!(request["function"], "WHITELIST_REQUEST");
        assert_eq!(request["data"]["requests"][0], "zorgon");
        assert_eq!(request["data"]["is_username_req"], false);
        assert_eq!(request["data"]["channel_name"], "somechannel");
        let token = request["timestamp"].as_str().expect("token").to_string();
        ws.send(Message::Text(
            json!({"id": "client-1", "timestamp": token, "message": "COMPLETE"}).to_string(),
        ))
        .await
        .expect("send completion");

        // Unsolicited push after the request completes.
        ws.send(Message::Text(
            json!({
                "id": "server-1",
                "message": "WHITELIST_UPDATE",
                "data": {"word": "fresh", "is_username": true}
            })
            .to_string(),
        ))
        .await
        .expect("send push");

        // Keep the connection open while the client drains.
        tokio::time::sleep(Duration::from_millis(300)).await;
    });

    let mut harness = start_client(port);
    wait_live(&harness.client).await;

    let result = harness
        .client
        .whitelist_request(&["zorgon".into()], "the zorgon returns", "someuser", false)
        .await;
    assert!(result.is_ok(), "request failed: {result:?}");

    let update = tokio::time::timeout(Duration::from_secs(2), harness.update_rx.recv())
        .await
        .expect("push arrived in time")
        .expect("channel open");
    assert_eq!(update.word, "fresh");
    assert!(update.is_username);

    let line = tokio::time::timeout(Duration::from_secs(2), harness.announce_rx.recv())
        .await
        .expect("announcement arrived in time")
        .expect("channel open");
    assert_eq!(line, "[The username \"fresh\" has been approved.]");

    let _ = harness.shutdown_tx.send(true);
    let _ = harness.runner.await;
    let _ = server.await;
}

#[tokio::test]
async fn auth_failure_keeps_client_down() {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let port = listener.local_addr().expect("addr").port();

    let server = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.expect("accept");
        let mut ws = tokio_tungstenite::accept_async(stream).await.expect("ws");

        let _ = ws.next().await;
        ws.send(Message::Text(
            json!({"id": "client-1", "message": "AUTH_FAIL"}).to_string(),
        ))
        .await
        .expect("send rejection");
        tokio::time::sleep(Duration::from_millis(100)).await;
    });

    let harness = start_client(port);

    // The rejected handshake must never flip the client live, and a
    // bounded username request gives up instead of hanging.
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(!harness.client.is_live());

    let result = harness
        .client
        .whitelist_request(&["someuser".into()], "hello", "someuser", true)
        .await;
    assert!(result.is_err());

    let _ = harness.shutdown_tx.send(true);
    let _ = harness.runner.await;
    let _ = server.await;
}

#[tokio::test]
async fn missing_completion_times_out_request() {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let port = listener.local_addr().expect("addr").port();

    let server = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.expect("accept");
        let mut ws = tokio_tungstenite::accept_async(stream).await.expect("ws");

        let _ = ws.next().await;
        ws.send(Message::Text(
            json!({"id": "client-1", "message": "AUTH_SUCCESS"}).to_string(),
        ))
        .await
        .expect("send auth reply");

        // Read the request, then answer under the WRONG token: the
        // waiter must never claim it.
        let frame = ws.next().await.expect("request frame").expect("request ok");
        let request: serde_json::Value =
            serde_json::from_str(frame.to_text().expect("text")).expect("json");
        assert_eq!(request["function"], "WHITELIST_REQUEST");
        ws.send(Message::Text(
            json!({"id": "client-1", "timestamp": "msg_unrelated", "message": "COMPLETE"})
                .to_string(),
        ))
        .await
        .expect("send mismatched completion");

        tokio::time::sleep(Duration::from_millis(500)).await;
    });

    let harness = start_client(port);
    wait_live(&harness.client).await;

    let result = harness
        .client
        .whitelist_request(&["zorgon".into()], "msg", "someuser", false)
        .await;
    assert!(result.is_err());

    let _ = harness.shutdown_tx.send(true);
    let _ = harness.runner.await;
    let _ = server.await;
}

#[tokio::test]
async fn reconnects_after_server_restart() {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let port = listener.local_addr().expect("addr").port();

    let server = tokio::spawn(async move {
        // First connection: authenticate, then drop immediately.
        {
            let (stream, _) = listener.accept().await.expect("accept");
            let mut ws = tokio_tungstenite::accept_async(stream).await.expect("ws");
            let _ = ws.next().await;
            ws.send(Message::Text(
                json!({"id": "client-1", "message": "AUTH_SUCCESS"}).to_string(),
            ))
            .await
            .expect("send auth reply");
            // Dropping ws closes the connection.
        }

        // Second connection: authenticate and stay up.
        let (stream, _) = listener.accept().await.expect("accept again");
        let mut ws = tokio_tungstenite::accept_async(stream).await.expect("ws");
        let _ = ws.next().await;
        ws.send(Message::Text(
            json!({"id": "client-1", "message": "AUTH_SUCCESS"}).to_string(),
        ))
        .await
        .expect("send auth reply");
        tokio::time::sleep(Duration::from_millis(300)).await;
    });

    let harness = start_client(port);

    // Survive the first drop and come back live on the second accept.
    wait_live(&harness.client).await;
    tokio::time::sleep(Duration::from_millis(150)).await;
    wait_live(&harness.client).await;

    let _ = harness.shutdown_tx.send(true);
    let _ = harness.runner.await;
    let _ = server.await;
}
