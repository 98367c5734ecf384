//! WebSocket session handler tests.

use super::*;
use crate::domain::ports::NotificationRelay;
use crate::domain::{Notification, SubmissionId, SubmissionStatus};
use crate::inbound::ws;
use crate::inbound::ws::state::WsState;
use crate::test_support::{MutableClock, fixed_now};
use actix_web::{App, HttpServer, dev::Server, dev::ServerHandle, http::header};
use awc::{BoxedSocket, ws::Codec, ws::Frame};
use futures_util::{SinkExt, StreamExt};
use rstest::{fixture, rstest};
use serde_json::{Value, json};

type Socket = actix_codec::Framed<BoxedSocket, Codec>;

#[fixture]
fn registry() -> Arc<WsRegistry> {
    Arc::new(WsRegistry::new(Arc::new(MutableClock::new(fixed_now()))))
}

async fn start_ws_server(registry: Arc<WsRegistry>) -> (String, Server) {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind test listener");
    let addr = listener.local_addr().expect("listener addr");
    let ws_state = WsState::new(registry, None);
    let server = HttpServer::new(move || {
        App::new()
            .app_data(actix_web::web::Data::new(ws_state.clone()))
            .service(ws::ws_entry)
    })
    .listen(listener)
    .expect("bind test server")
    .disable_signals()
    .run();
    (format!("http://{addr}"), server)
}

async fn connect(registry: Arc<WsRegistry>) -> (Socket, ServerHandle) {
    let (url, server) = start_ws_server(registry).await;
    let handle = server.handle();
    actix_web::rt::spawn(server);

    let (_resp, socket) = awc::Client::default()
        .ws(format!("{url}/ws"))
        .set_header(header::ORIGIN, "http://localhost:3000")
        .connect()
        .await
        .expect("websocket connect");

    (socket, handle)
}

async fn next_text_frame(socket: &mut Socket) -> Value {
    loop {
        let frame = socket.next().await.expect("response frame").expect("frame");
        match frame {
            Frame::Text(bytes) => return serde_json::from_slice(&bytes).expect("json"),
            Frame::Ping(_) | Frame::Pong(_) => continue,
            other => panic!("expected text frame, got {other:?}"),
        }
    }
}

async fn wait_for_connections(registry: &WsRegistry, expected: usize) {
    for _ in 0..50 {
        if registry.len().await == expected {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("registry never reached {expected} connections");
}

#[rstest]
#[actix_rt::test]
async fn echoes_json_messages_as_ack(registry: Arc<WsRegistry>) {
    let (mut socket, _server) = connect(registry).await;
    socket
        .send(awc::ws::Message::Text(
            json!({"hello": "podium"}).to_string().into(),
        ))
        .await
        .expect("send text");

    let value = next_text_frame(&mut socket).await;
    assert_eq!(value, json!({"type": "ACK", "data": {"hello": "podium"}}));
}

#[rstest]
#[actix_rt::test]
async fn ignores_non_json_and_keeps_the_connection(registry: Arc<WsRegistry>) {
    let (mut socket, _server) = connect(registry).await;
    socket
        .send(awc::ws::Message::Text("not-json".into()))
        .await
        .expect("send text");
    socket
        .send(awc::ws::Message::Text("42".into()))
        .await
        .expect("send text");

    let value = next_text_frame(&mut socket).await;
    assert_eq!(value, json!({"type": "ACK", "data": 42}));
}

#[rstest]
#[actix_rt::test]
async fn broadcasts_reach_connected_clients(registry: Arc<WsRegistry>) {
    let (mut socket, _server) = connect(registry.clone()).await;
    wait_for_connections(&registry, 1).await;

    let submission_id = SubmissionId::random();
    registry
        .broadcast(Notification::CiResult {
            submission_id,
            ci_run_id: "run-7".into(),
            status: SubmissionStatus::Approved,
        })
        .await;

    let value = next_text_frame(&mut socket).await;
    assert_eq!(value["type"], "CI_RESULT");
    assert_eq!(value["data"]["submissionId"], submission_id.to_string());
    assert_eq!(value["data"]["status"], "APPROVED");
    assert!(value["timestamp"].is_string());
}

#[rstest]
#[actix_rt::test]
async fn closed_connections_leave_the_registry(registry: Arc<WsRegistry>) {
    let (mut socket, _server) = connect(registry.clone()).await;
    wait_for_connections(&registry, 1).await;

    socket
        .send(awc::ws::Message::Close(None))
        .await
        .expect("send close");

    wait_for_connections(&registry, 0).await;
}

#[rstest]
#[actix_rt::test]
async fn closes_after_timeout_without_client_messages(registry: Arc<WsRegistry>) {
    let (mut socket, _server) = connect(registry).await;
    tokio::time::sleep(CLIENT_TIMEOUT + HEARTBEAT_INTERVAL * 3).await;

    let observed_close = tokio::time::timeout(Duration::from_secs(2), async {
        let mut observed = None;
        while let Some(frame) = socket.next().await {
            let frame = frame.expect("frame");
            match frame {
                Frame::Ping(_) | Frame::Pong(_) => continue,
                Frame::Close(reason) => {
                    observed = reason;
                    break;
                }
                other => panic!("unexpected frame before close: {other:?}"),
            }
        }
        observed
    })
    .await
    .expect("close frame missing within timeout")
    .expect("close frame missing after timeout");

    assert_eq!(observed_close.code, CloseCode::Normal);
    assert_eq!(
        observed_close.description.as_deref(),
        Some("heartbeat timeout")
    );
}
