//! Integration tests exercising the full relay on loopback.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use padlink_daemon::config::{Config, DaemonConfig, EmulatorConfig};
use padlink_daemon::Daemon;
use padlink_input::mock::{MockSink, MockSinkHandle};
use padlink_protocol::{wire, ClientConnection, MessageReceiver, MessageSender, WsTransport};
use padlink_types::{ClientId, InputValue, ProcessStatus, ServerMessage};
use tracing_subscriber::EnvFilter;

const RECV_TIMEOUT: Duration = Duration::from_secs(5);

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_test_writer()
        .try_init();
}

/// A running relay on loopback plus the handles tests observe it through.
struct TestServer {
    addr: SocketAddr,
    sink: MockSinkHandle,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn start(max_clients: usize) -> Self {
        Self::start_with_executable(max_clients, "/nonexistent/padlink-test-dolphin").await
    }

    async fn start_with_executable(max_clients: usize, executable: &str) -> Self {
        init_tracing();
        let config = Config {
            daemon: DaemonConfig {
                bind: "127.0.0.1".to_string(),
                port: 0,
                max_clients,
                ..DaemonConfig::default()
            },
            emulator: EmulatorConfig {
                executable: PathBuf::from(executable),
                // A name no process table will ever contain, so the
                // fallback scan reports Stopped.
                process_name: format!("padlink-int-test-{}", std::process::id()),
                stop_grace_secs: 2,
                pipe_dir: None,
            },
        };

        let sink_backend = MockSink::new();
        let sink = sink_backend.handle();
        let daemon = Daemon::new(config, Box::new(sink_backend));

        let bind: SocketAddr = "127.0.0.1:0".parse().unwrap();
        let transport = WsTransport::bind(bind).await.unwrap();
        let addr = transport.local_addr().unwrap();

        let handle = tokio::spawn(async move {
            if let Err(e) = daemon.serve(transport).await {
                eprintln!("daemon error: {e}");
            }
        });

        Self { addr, sink, handle }
    }

    fn shutdown(self) {
        self.handle.abort();
    }
}

/// A connected client with its welcome already consumed.
struct TestClient {
    id: ClientId,
    tx: MessageSender,
    rx: MessageReceiver,
}

impl TestClient {
    /// Connect and expect a welcome.
    async fn connect(addr: SocketAddr) -> Self {
        let conn = ClientConnection::connect(&format!("ws://{addr}"))
            .await
            .unwrap();
        let (tx, mut rx) = conn.split();
        match recv_msg(&mut rx).await {
            ServerMessage::Welcome { message, client_id } => {
                assert_eq!(message, "Connected to Dolphin Controller Server");
                Self {
                    id: client_id,
                    tx,
                    rx,
                }
            }
            other => panic!("expected welcome, got {other:?}"),
        }
    }

    /// Connect expecting a capacity rejection followed by a close.
    async fn connect_expecting_rejection(addr: SocketAddr) {
        let conn = ClientConnection::connect(&format!("ws://{addr}"))
            .await
            .unwrap();
        let (_tx, mut rx) = conn.split();
        match recv_msg(&mut rx).await {
            ServerMessage::Error { error } => assert_eq!(error, "Too many clients"),
            other => panic!("expected rejection, got {other:?}"),
        }
        let closed = tokio::time::timeout(RECV_TIMEOUT, rx.recv_text())
            .await
            .expect("timed out waiting for close")
            .unwrap();
        assert!(closed.is_none(), "expected connection close after rejection");
    }

    async fn send_json(&mut self, value: serde_json::Value) {
        self.tx.send(&value).await.unwrap();
    }

    async fn recv(&mut self) -> ServerMessage {
        recv_msg(&mut self.rx).await
    }

    /// Expect silence on this client's channel.
    async fn assert_no_message(&mut self) {
        let result = tokio::time::timeout(Duration::from_millis(300), self.rx.recv_text()).await;
        assert!(result.is_err(), "expected no message, got {result:?}");
    }
}

async fn recv_msg(rx: &mut MessageReceiver) -> ServerMessage {
    let text = tokio::time::timeout(RECV_TIMEOUT, rx.recv_text())
        .await
        .expect("timed out waiting for message")
        .unwrap()
        .expect("connection closed unexpectedly");
    wire::decode_message(&text).unwrap()
}

/// Poll the mock sink until `pred` holds or the timeout hits.
async fn wait_for_sink(sink: &MockSinkHandle, pred: impl Fn(&MockSinkHandle) -> bool) {
    tokio::time::timeout(RECV_TIMEOUT, async {
        while !pred(sink) {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("timed out waiting for sink state");
}

#[tokio::test]
async fn welcome_carries_unique_client_ids() {
    let server = TestServer::start(4).await;

    let a = TestClient::connect(server.addr).await;
    let b = TestClient::connect(server.addr).await;
    assert_ne!(a.id, b.id);

    server.shutdown();
}

#[tokio::test]
async fn capacity_rejection_and_recovery() {
    let server = TestServer::start(1).await;

    let first = TestClient::connect(server.addr).await;
    TestClient::connect_expecting_rejection(server.addr).await;

    // Once the admitted client leaves, its slot opens up again.
    drop(first);
    let retry = tokio::time::timeout(RECV_TIMEOUT, async {
        loop {
            let conn = ClientConnection::connect(&format!("ws://{}", server.addr))
                .await
                .unwrap();
            let (_tx, mut rx) = conn.split();
            if let ServerMessage::Welcome { .. } = recv_msg(&mut rx).await {
                return;
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
    })
    .await;
    assert!(retry.is_ok(), "slot was never freed after disconnect");

    server.shutdown();
}

#[tokio::test]
async fn status_before_any_start_is_stopped() {
    let server = TestServer::start(4).await;
    let mut client = TestClient::connect(server.addr).await;

    client.send_json(serde_json::json!({"command": "status"})).await;
    assert_eq!(
        client.recv().await,
        ServerMessage::Status {
            status: ProcessStatus::Stopped
        }
    );

    server.shutdown();
}

#[tokio::test]
async fn status_reply_is_unicast() {
    let server = TestServer::start(4).await;
    let mut asker = TestClient::connect(server.addr).await;
    let mut bystander = TestClient::connect(server.addr).await;

    asker.send_json(serde_json::json!({"command": "status"})).await;
    assert!(matches!(asker.recv().await, ServerMessage::Status { .. }));
    bystander.assert_no_message().await;

    server.shutdown();
}

#[tokio::test]
async fn controller_input_is_translated_and_keyed_by_session() {
    let server = TestServer::start(4).await;
    let mut client = TestClient::connect(server.addr).await;

    client
        .send_json(serde_json::json!({
            "type": "controller_input",
            "input": {"A": true, "UNKNOWN": 1.0}
        }))
        .await;

    wait_for_sink(&server.sink, |s| !s.delivered().is_empty()).await;
    let frames = server.sink.frames_for(client.id);
    assert_eq!(frames.len(), 1);
    assert_eq!(frames[0].len(), 1);
    assert_eq!(frames[0].get("a"), Some(&InputValue::Button(true)));

    server.shutdown();
}

#[tokio::test]
async fn fully_unknown_input_is_dropped_without_delivery() {
    let server = TestServer::start(4).await;
    let mut client = TestClient::connect(server.addr).await;

    client
        .send_json(serde_json::json!({
            "type": "controller_input",
            "input": {"HOME": true, "CAPTURE": false}
        }))
        .await;

    // A status roundtrip proves the input was processed before we look.
    client.send_json(serde_json::json!({"command": "status"})).await;
    client.recv().await;
    assert!(server.sink.delivered().is_empty());

    server.shutdown();
}

#[tokio::test]
async fn malformed_messages_do_not_close_the_connection() {
    let server = TestServer::start(4).await;
    let mut client = TestClient::connect(server.addr).await;

    // Valid JSON, but not a message the relay understands.
    client.send_json(serde_json::json!("just a string")).await;
    client.send_json(serde_json::json!({"command": "reboot"})).await;
    client.send_json(serde_json::json!({"type": "keyboard", "input": {}})).await;

    client.send_json(serde_json::json!({"command": "status"})).await;
    assert!(matches!(client.recv().await, ServerMessage::Status { .. }));

    server.shutdown();
}

#[tokio::test]
async fn sink_failure_does_not_break_the_session() {
    let server = TestServer::start(4).await;
    let mut client = TestClient::connect(server.addr).await;

    server.sink.set_fail(true);
    client
        .send_json(serde_json::json!({
            "type": "controller_input",
            "input": {"A": true}
        }))
        .await;

    client.send_json(serde_json::json!({"command": "status"})).await;
    assert!(matches!(client.recv().await, ServerMessage::Status { .. }));
    assert!(server.sink.delivered().is_empty());

    server.shutdown();
}

#[tokio::test]
async fn start_failure_is_broadcast_to_every_session() {
    let server = TestServer::start(4).await;
    let mut requester = TestClient::connect(server.addr).await;
    let mut other = TestClient::connect(server.addr).await;

    requester
        .send_json(serde_json::json!({"command": "start_dolphin"}))
        .await;

    for client in [&mut requester, &mut other] {
        match client.recv().await {
            ServerMessage::Error { error } => {
                assert_eq!(error, "Dolphin executable not found");
            }
            other => panic!("expected broadcast error, got {other:?}"),
        }
    }

    // The handle stays Absent: status still reports Stopped.
    requester
        .send_json(serde_json::json!({"command": "status"}))
        .await;
    assert_eq!(
        requester.recv().await,
        ServerMessage::Status {
            status: ProcessStatus::Stopped
        }
    );

    server.shutdown();
}

#[tokio::test]
async fn stop_when_not_running_is_a_quiet_noop() {
    let server = TestServer::start(4).await;
    let mut client = TestClient::connect(server.addr).await;

    client.send_json(serde_json::json!({"command": "stop_dolphin"})).await;
    // No error notification follows; the next reply is the status.
    client.send_json(serde_json::json!({"command": "status"})).await;
    assert_eq!(
        client.recv().await,
        ServerMessage::Status {
            status: ProcessStatus::Stopped
        }
    );

    server.shutdown();
}

#[cfg(unix)]
#[tokio::test]
async fn start_and_stop_drive_a_real_process() {
    use std::os::unix::fs::PermissionsExt;

    let script = std::env::temp_dir().join(format!(
        "padlink-int-dolphin-{}.sh",
        std::process::id()
    ));
    std::fs::write(&script, "#!/bin/sh\nsleep 30\n").unwrap();
    std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();

    let server = TestServer::start_with_executable(4, script.to_str().unwrap()).await;
    let mut client = TestClient::connect(server.addr).await;

    client.send_json(serde_json::json!({"command": "start_dolphin"})).await;
    client.send_json(serde_json::json!({"command": "status"})).await;
    assert_eq!(
        client.recv().await,
        ServerMessage::Status {
            status: ProcessStatus::Running
        }
    );

    client.send_json(serde_json::json!({"command": "stop_dolphin"})).await;
    client.send_json(serde_json::json!({"command": "status"})).await;
    assert_eq!(
        client.recv().await,
        ServerMessage::Status {
            status: ProcessStatus::Stopped
        }
    );

    server.shutdown();
    let _ = std::fs::remove_file(script);
}
