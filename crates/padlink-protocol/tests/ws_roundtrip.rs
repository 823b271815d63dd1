//! Integration test: WebSocket transport roundtrip on loopback.

use std::net::SocketAddr;

use padlink_protocol::{wire, ClientConnection, WsTransport};
use padlink_types::{ClientId, ClientMessage, ControlCommand, ProcessStatus, ServerMessage};

#[tokio::test]
async fn welcome_and_status_roundtrip_on_loopback() {
    let bind_addr: SocketAddr = "127.0.0.1:0".parse().unwrap();
    let transport = WsTransport::bind(bind_addr).await.unwrap();
    let server_addr = transport.local_addr().unwrap();

    let server = tokio::spawn(async move {
        let conn = transport.accept().await.unwrap();
        let (mut tx, mut rx) = conn.split();

        tx.send(&ServerMessage::welcome(ClientId::new()))
            .await
            .unwrap();

        // Receive a status query
        let text = rx.recv_text().await.unwrap().expect("client closed early");
        let msg: ClientMessage = wire::decode_message(&text).unwrap();
        match msg {
            ClientMessage::Control { command } => assert_eq!(command, ControlCommand::Status),
            other => panic!("expected status command, got {other:?}"),
        }

        tx.send(&ServerMessage::Status {
            status: ProcessStatus::Stopped,
        })
        .await
        .unwrap();

        // Drain until the client closes
        while rx.recv_text().await.unwrap().is_some() {}
    });

    let conn = ClientConnection::connect(&format!("ws://{server_addr}"))
        .await
        .unwrap();
    let (mut tx, mut rx) = conn.split();

    let welcome = rx.recv_text().await.unwrap().expect("no welcome");
    let welcome: ServerMessage = wire::decode_message(&welcome).unwrap();
    assert!(matches!(welcome, ServerMessage::Welcome { .. }));

    tx.send(&serde_json::json!({"command": "status"})).await.unwrap();

    let status = rx.recv_text().await.unwrap().expect("no status reply");
    let status: ServerMessage = wire::decode_message(&status).unwrap();
    assert_eq!(
        status,
        ServerMessage::Status {
            status: ProcessStatus::Stopped
        }
    );

    tx.close().await.unwrap();
    server.await.unwrap();
}
