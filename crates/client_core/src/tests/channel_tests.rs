use super::*;
use std::time::Duration;

use axum::{
    extract::{
        ws::{CloseFrame as WsCloseFrame, Message as WsMessage, WebSocket},
        State, WebSocketUpgrade,
    },
    response::IntoResponse,
    routing::get,
    Router,
};
use tokio::{net::TcpListener, sync::mpsc::UnboundedReceiver, time::timeout};

#[derive(Clone)]
struct ServerState {
    received: mpsc::UnboundedSender<String>,
    hang_up: bool,
}

async fn ws_handler(State(state): State<ServerState>, ws: WebSocketUpgrade) -> impl IntoResponse {
    ws.on_upgrade(move |socket| surface_session(state, socket))
}

async fn surface_session(state: ServerState, mut socket: WebSocket) {
    if state.hang_up {
        drop(socket);
        return;
    }
    let hello = r#"{"type":"INIT_DATA","software_id":"s1"}"#.to_string();
    if socket.send(WsMessage::Text(hello)).await.is_err() {
        return;
    }
    if let Some(Ok(WsMessage::Text(text))) = socket.recv().await {
        let _ = state.received.send(text);
    }
    let _ = socket
        .send(WsMessage::Close(Some(WsCloseFrame {
            code: 1000,
            reason: "bye".into(),
        })))
        .await;
}

async fn spawn_surface_server(hang_up: bool) -> (Url, UnboundedReceiver<String>) {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");
    let (received, received_rx) = mpsc::unbounded_channel();
    let app = Router::new()
        .route("/ws_gui", get(ws_handler))
        .with_state(ServerState { received, hang_up });
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    let url = Url::parse(&format!("ws://{addr}/ws_gui")).expect("url");
    (url, received_rx)
}

fn collector() -> (
    impl Fn(ChannelEvent) + Send + Sync + 'static,
    UnboundedReceiver<ChannelEvent>,
) {
    let (tx, rx) = mpsc::unbounded_channel();
    (
        move |event| {
            let _ = tx.send(event);
        },
        rx,
    )
}

async fn next_event(events: &mut UnboundedReceiver<ChannelEvent>) -> ChannelEvent {
    timeout(Duration::from_secs(5), events.recv())
        .await
        .expect("event before timeout")
        .expect("event stream open")
}

async fn closure(events: &mut UnboundedReceiver<ChannelEvent>) -> ChannelClosure {
    loop {
        if let ChannelEvent::Closed(closure) = next_event(events).await {
            return closure;
        }
    }
}

#[tokio::test]
async fn frames_flow_both_ways_and_close_frame_is_clean() {
    let (url, mut received) = spawn_surface_server(false).await;
    let (on_event, mut events) = collector();

    let channel = WsChannel::connect(&url, on_event).await.expect("connect");
    assert_eq!(next_event(&mut events).await, ChannelEvent::Opened);
    assert_eq!(
        next_event(&mut events).await,
        ChannelEvent::Frame(r#"{"type":"INIT_DATA","software_id":"s1"}"#.to_string())
    );

    assert!(channel.is_open());
    channel
        .send_text(r#"{"type":"USER_ACTION"}"#.to_string())
        .expect("send");
    let echoed = timeout(Duration::from_secs(5), received.recv())
        .await
        .expect("server received before timeout");
    assert_eq!(echoed.as_deref(), Some(r#"{"type":"USER_ACTION"}"#));

    let closure = closure(&mut events).await;
    assert!(closure.clean);
    assert_eq!(closure.code, ChannelClosure::NORMAL);
    assert_eq!(closure.reason, "bye");
    assert!(!closure.is_abnormal());
    assert!(!channel.is_open());
    assert!(matches!(
        channel.send_text("late".to_string()),
        Err(ChannelError::NotOpen)
    ));
}

#[tokio::test]
async fn dropped_connection_is_abnormal() {
    let (url, _received) = spawn_surface_server(true).await;
    let (on_event, mut events) = collector();

    let _channel = WsChannel::connect(&url, on_event).await.expect("connect");
    assert_eq!(next_event(&mut events).await, ChannelEvent::Opened);

    let closure = closure(&mut events).await;
    assert!(!closure.clean);
    assert_eq!(closure.code, ChannelClosure::ABNORMAL);
    assert!(closure.is_abnormal());
}

#[tokio::test]
async fn refused_connection_reports_error_then_abnormal_close() {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");
    drop(listener);
    let url = Url::parse(&format!("ws://{addr}/ws_gui")).expect("url");
    let (on_event, mut events) = collector();

    let result = WsChannel::connect(&url, on_event).await;

    assert!(matches!(result, Err(ChannelError::Connect { .. })));
    assert!(matches!(next_event(&mut events).await, ChannelEvent::Error(_)));
    assert!(closure(&mut events).await.is_abnormal());
}

#[test]
fn alert_text_falls_back_to_the_close_code() {
    let closure = ChannelClosure::abnormal("");
    assert_eq!(
        closure.alert_text(),
        "Connection to server lost unexpectedly. Please refresh. Reason: Code 1006"
    );

    let going_away = ChannelClosure {
        clean: false,
        code: ChannelClosure::GOING_AWAY,
        reason: "server restart".into(),
    };
    assert!(!going_away.is_abnormal());
    assert!(going_away.alert_text().ends_with("Reason: server restart"));
}

#[test]
fn disconnected_channel_rejects_sends() {
    let channel = WsChannel::disconnected();
    assert!(!channel.is_open());
    assert!(matches!(
        channel.send_text("{}".to_string()),
        Err(ChannelError::NotOpen)
    ));
    channel.close();
}

#[test]
fn memory_channel_records_and_closes() {
    let channel = MemoryChannel::open();
    channel.send_text("a".to_string()).expect("send");
    assert_eq!(channel.take_sent(), ["a"]);
    assert!(channel.sent().is_empty());

    channel.close();
    assert!(!channel.is_open());
    assert_eq!(channel.close_requests(), 1);
    assert!(matches!(
        channel.send_text("b".to_string()),
        Err(ChannelError::NotOpen)
    ));
}
