use super::*;
use crate::{
    action_log::LogLevel,
    channel::{ChannelClosure, MemoryChannel},
};
use tokio::time::Instant;

const SEARCH: &str = r#"{"type":"UPDATE_CAPABILITIES","payload":{"current_view":"waimai_page","elements":[
    {"id":"search_input","type":"text_input","label":"Search food"},
    {"id":"wm_view_cart_button","type":"button","label":"Cart"}
]}}"#;

const TYPE_PIZZA: &str = r#"{"type":"EXECUTE_ACTION_VISUALIZATION","payload":{"command":"TYPE_TEXT","element_id":"search_input","text":"pizza"}}"#;

fn emphasis_count(engine: &SessionEngine<MemoryChannel>) -> usize {
    engine
        .surface()
        .element("search_input")
        .map(|node| node.emphasis.len())
        .unwrap_or_default()
}

#[tokio::test(start_paused = true)]
async fn visualization_emphasis_clears_after_effect_duration() {
    let (handle, queue) = session_queue();
    let channel = MemoryChannel::open();
    let session = Session::new(channel, EngineConfig::default(), &handle, queue);

    let sink = handle.channel_sink();
    sink(ChannelEvent::Opened);
    sink(ChannelEvent::Frame(SEARCH.to_string()));
    sink(ChannelEvent::Frame(TYPE_PIZZA.to_string()));

    let stopper = handle.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(1)).await;
        stopper.shutdown();
    });

    let start = Instant::now();
    let mut timeline = Vec::new();
    let engine = session
        .run_with(|engine| timeline.push((start.elapsed(), emphasis_count(engine))))
        .await;

    let emphasised: Vec<_> = timeline.iter().filter(|(_, count)| *count == 2).collect();
    assert!(!emphasised.is_empty());
    assert!(emphasised
        .iter()
        .all(|(at, _)| *at < Duration::from_millis(700)));

    let cleared_at = timeline
        .iter()
        .skip_while(|(_, count)| *count != 2)
        .find(|(_, count)| *count == 0)
        .map(|(at, _)| *at)
        .expect("emphasis cleared");
    assert!(cleared_at >= Duration::from_millis(700));
    assert!(cleared_at < Duration::from_secs(1));

    assert_eq!(emphasis_count(&engine), 0);
    let value = engine
        .surface()
        .element("search_input")
        .and_then(|node| node.input.as_ref())
        .map(|input| input.value.clone());
    assert_eq!(value.as_deref(), Some("pizza"));
}

#[tokio::test(start_paused = true)]
async fn operator_events_flow_through_the_queue_until_connection_loss() {
    let (handle, queue) = session_queue();
    let channel = MemoryChannel::open();
    let session = Session::new(channel.clone(), EngineConfig::default(), &handle, queue);

    let sink = handle.channel_sink();
    sink(ChannelEvent::Frame(SEARCH.to_string()));
    assert!(handle.operator(OperatorEvent::Click {
        element_id: "wm_view_cart_button".into(),
    }));
    assert!(handle.operator(OperatorEvent::Click {
        element_id: "missing".into(),
    }));
    sink(ChannelEvent::Closed(ChannelClosure::abnormal("")));
    sink(ChannelEvent::Frame(r#"{"type":"LOG_MESSAGE","message":"too late"}"#.to_string()));

    let engine = session.run().await;

    assert_eq!(channel.sent().len(), 1);
    assert_eq!(engine.log().count(LogLevel::Warn), 1);
    assert_eq!(engine.alerts().len(), 1);
    assert!(!engine
        .log()
        .entries()
        .iter()
        .any(|entry| entry.message.contains("too late")));
}

#[tokio::test(start_paused = true)]
async fn shutdown_closes_an_open_channel() {
    let (handle, queue) = session_queue();
    let channel = MemoryChannel::open();
    let session = Session::new(channel.clone(), EngineConfig::default(), &handle, queue);

    handle.channel_sink()(ChannelEvent::Opened);
    handle.shutdown();
    let engine = session.run().await;

    assert_eq!(channel.close_requests(), 1);
    assert!(!channel.is_open());
    assert_eq!(
        engine.log().last().map(|entry| entry.message.as_str()),
        Some("Session closed by operator.")
    );
}

#[tokio::test(start_paused = true)]
async fn expiry_after_the_session_ended_is_dropped() {
    let (handle, queue) = session_queue();
    let mut scheduler = handle.effect_scheduler();
    drop(queue);

    let token = EffectToken {
        node: crate::surface::NodeKey(1),
        emphasis: crate::surface::Emphasis::Action,
        generation: 0,
    };
    scheduler.schedule(token, Duration::from_millis(700));
    tokio::time::sleep(Duration::from_secs(1)).await;

    assert!(!handle.shutdown());
}
