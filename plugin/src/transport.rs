use bf6_stats_shared::{InboundEvent, OutboundMessage, Registration};
use futures::{Sink, SinkExt, Stream, StreamExt};
use thiserror::Error;
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::{self, Message};
use tracing::{debug, info, trace, warn};

use crate::config::LaunchArgs;
use crate::controller::ControllerEvent;

const MESSAGE_PREVIEW_CHARS: usize = 200;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("failed to connect to host at {url}: {source}")]
    Connect {
        url: String,
        #[source]
        source: tungstenite::Error,
    },
    #[error("host websocket error: {0}")]
    Socket(#[from] tungstenite::Error),
    #[error("failed to encode registration: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Connect to the host, register, then pump host events into the controller
/// queue and controller output back to the host. Returns once the host closes
/// the socket or the controller stops producing output.
pub async fn run(
    args: &LaunchArgs,
    events: mpsc::UnboundedSender<ControllerEvent>,
    outbound: mpsc::UnboundedReceiver<OutboundMessage>,
) -> Result<(), TransportError> {
    let url = args.websocket_url();
    let (socket, _) = connect_async(url.as_str())
        .await
        .map_err(|source| TransportError::Connect {
            url: url.clone(),
            source,
        })?;
    info!(%url, "connected to Stream Deck host");

    let (mut sink, mut stream) = socket.split();

    let registration = Registration {
        event: args.register_event.clone(),
        uuid: args.plugin_uuid.clone(),
    };
    sink.send(Message::text(serde_json::to_string(&registration)?))
        .await?;
    debug!(event = %args.register_event, "registration sent");

    let result = tokio::select! {
        result = write_loop(&mut sink, outbound) => result,
        result = read_loop(&mut stream, &events) => result,
    };

    // Flushes the queued close reply when the host initiated the close.
    if let Err(e) = sink.close().await {
        debug!(error = %e, "host socket already closed");
    }
    result
}

async fn write_loop<S>(
    sink: &mut S,
    mut outbound: mpsc::UnboundedReceiver<OutboundMessage>,
) -> Result<(), TransportError>
where
    S: Sink<Message, Error = tungstenite::Error> + Unpin,
{
    while let Some(message) = outbound.recv().await {
        let json = match message.to_json() {
            Ok(json) => json,
            Err(e) => {
                warn!(error = %e, "failed to encode host message, skipping");
                continue;
            }
        };
        sink.send(Message::text(json)).await?;
    }
    debug!("controller output closed");
    Ok(())
}

async fn read_loop<S>(
    stream: &mut S,
    events: &mpsc::UnboundedSender<ControllerEvent>,
) -> Result<(), TransportError>
where
    S: Stream<Item = Result<Message, tungstenite::Error>> + Unpin,
{
    while let Some(frame) = stream.next().await {
        match frame? {
            Message::Text(text) => dispatch_text(text.as_str(), events),
            Message::Close(frame) => {
                info!(?frame, "host closed the connection");
                return Ok(());
            }
            _ => {}
        }
    }
    Ok(())
}

fn dispatch_text(text: &str, events: &mpsc::UnboundedSender<ControllerEvent>) {
    match InboundEvent::parse(text) {
        Ok(InboundEvent::Unhandled) => {
            trace!("ignoring host event: {text}");
        }
        Ok(event) => {
            trace!(context = event.context().unwrap_or_default(), "host event received");
            if events.send(ControllerEvent::Host(event)).is_err() {
                warn!("controller stopped, dropping host event");
            }
        }
        Err(e) => {
            let preview = text.chars().take(MESSAGE_PREVIEW_CHARS).collect::<String>();
            warn!(error = %e, %preview, "ignoring malformed host message");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::net::SocketAddr;
    use std::sync::Arc;
    use std::time::Duration;

    use axum::Router;
    use axum::routing::get;
    use bf6_stats_shared::{InboundEvent, OutboundMessage};
    use futures::{SinkExt, StreamExt};
    use tokio::net::TcpListener;
    use tokio::sync::mpsc;
    use tokio_tungstenite::tungstenite::Message;
    use tokio_tungstenite::{WebSocketStream, accept_async};

    use super::{TransportError, run};
    use crate::config::LaunchArgs;
    use crate::controller::{ControllerEvent, StatDisplayController};
    use crate::services::stats_provider::HttpStatsProvider;

    type HostSocket = WebSocketStream<tokio::net::TcpStream>;

    fn launch_args(port: u16) -> LaunchArgs {
        LaunchArgs {
            port,
            plugin_uuid: "plugin-uuid".to_string(),
            register_event: "registerPlugin".to_string(),
            info: "{}".to_string(),
        }
    }

    async fn bind_host() -> (TcpListener, u16) {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind host listener");
        let port = listener.local_addr().expect("host address").port();
        (listener, port)
    }

    async fn accept_host(listener: &TcpListener) -> HostSocket {
        let (stream, _) = listener.accept().await.expect("accept plugin connection");
        accept_async(stream).await.expect("websocket handshake")
    }

    async fn next_json(socket: &mut HostSocket) -> serde_json::Value {
        loop {
            let frame = tokio::time::timeout(Duration::from_secs(5), socket.next())
                .await
                .expect("plugin frame within timeout")
                .expect("socket open")
                .expect("valid frame");
            if let Message::Text(text) = frame {
                return serde_json::from_str(text.as_str()).expect("plugin sends JSON");
            }
        }
    }

    async fn send_json(socket: &mut HostSocket, value: serde_json::Value) {
        socket
            .send(Message::text(value.to_string()))
            .await
            .expect("send host frame");
    }

    #[tokio::test]
    async fn registers_then_relays_events_and_titles() {
        let (listener, port) = bind_host().await;
        let (events_tx, mut events_rx) = mpsc::unbounded_channel();
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();

        let plugin = tokio::spawn(async move {
            run(&launch_args(port), events_tx, outbound_rx).await
        });
        let mut host = accept_host(&listener).await;

        assert_eq!(
            next_json(&mut host).await,
            serde_json::json!({"event": "registerPlugin", "uuid": "plugin-uuid"})
        );

        send_json(
            &mut host,
            serde_json::json!({"event": "willAppear", "context": "ctx", "payload": {"settings": {"playerName": "Foo"}}}),
        )
        .await;
        host.send(Message::text("not json"))
            .await
            .expect("send garbage frame");
        send_json(&mut host, serde_json::json!({"event": "deviceDidConnect", "device": "d"})).await;
        send_json(&mut host, serde_json::json!({"event": "keyUp", "context": "ctx"})).await;

        let first = events_rx.recv().await.expect("appear event");
        assert!(matches!(
            first,
            ControllerEvent::Host(InboundEvent::WillAppear { ref context, .. }) if context == "ctx"
        ));
        let second = events_rx.recv().await.expect("key event");
        assert!(matches!(
            second,
            ControllerEvent::Host(InboundEvent::KeyUp { ref context }) if context == "ctx"
        ));

        outbound_tx
            .send(OutboundMessage::set_title("ctx", "Kills\n100"))
            .expect("transport still running");
        assert_eq!(
            next_json(&mut host).await,
            serde_json::json!({
                "event": "setTitle",
                "context": "ctx",
                "payload": {"title": "Kills\n100", "target": 0}
            })
        );

        host.close(None).await.expect("close host socket");
        let result = plugin.await.expect("transport task");
        assert!(result.is_ok(), "unexpected transport error: {result:?}");
    }

    #[tokio::test]
    async fn host_initiated_close_is_acknowledged() {
        let (listener, port) = bind_host().await;
        let (events_tx, _events_rx) = mpsc::unbounded_channel();
        let (_outbound_tx, outbound_rx) = mpsc::unbounded_channel();

        let plugin = tokio::spawn(async move {
            run(&launch_args(port), events_tx, outbound_rx).await
        });
        let mut host = accept_host(&listener).await;
        let _registration = next_json(&mut host).await;

        host.close(None).await.expect("close host socket");
        let result = plugin.await.expect("transport task");
        assert!(result.is_ok(), "unexpected transport error: {result:?}");

        let mut acknowledged = false;
        while let Ok(Some(frame)) = tokio::time::timeout(Duration::from_secs(5), host.next()).await {
            match frame {
                Ok(Message::Close(_)) => acknowledged = true,
                Ok(_) => {}
                Err(_) => break,
            }
        }
        assert!(acknowledged, "plugin never answered the close handshake");
    }

    #[tokio::test]
    async fn unreachable_host_is_a_connect_error() {
        let (listener, port) = bind_host().await;
        drop(listener);

        let (events_tx, _events_rx) = mpsc::unbounded_channel();
        let (_outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let result = run(&launch_args(port), events_tx, outbound_rx).await;

        assert!(matches!(result, Err(TransportError::Connect { .. })));
    }

    async fn spawn_provider() -> (SocketAddr, tokio::task::JoinHandle<()>) {
        let app = Router::new().route(
            "/bf6/stats/",
            get(|| async {
                axum::Json(serde_json::json!({
                    "userName": "Foo",
                    "classes": [{"kills": 100, "deaths": 50}],
                    "gamemodes": [{"wins": 10, "losses": 10}]
                }))
            }),
        );
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind provider listener");
        let addr = listener.local_addr().expect("provider address");
        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.expect("serve provider");
        });
        (addr, handle)
    }

    #[tokio::test]
    async fn host_round_trip_renders_provider_stats() {
        let (provider_addr, provider_handle) = spawn_provider().await;
        let (listener, port) = bind_host().await;

        let provider = HttpStatsProvider::new(
            reqwest::Client::new(),
            format!("http://{provider_addr}/bf6/stats/"),
        );
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let controller = StatDisplayController::new(
            Arc::new(provider),
            outbound_tx,
            events_tx.clone(),
            Duration::from_secs(300),
        );
        let controller_handle = tokio::spawn(controller.run(events_rx));
        let plugin = tokio::spawn(async move {
            run(&launch_args(port), events_tx, outbound_rx).await
        });

        let mut host = accept_host(&listener).await;
        let _registration = next_json(&mut host).await;

        send_json(
            &mut host,
            serde_json::json!({"event": "willAppear", "context": "ctx", "payload": {"settings": {"playerName": "Foo"}}}),
        )
        .await;

        let mut titles = Vec::new();
        titles.push(next_json(&mut host).await["payload"]["title"].clone());
        for _ in 0..2 {
            send_json(&mut host, serde_json::json!({"event": "keyUp", "context": "ctx"})).await;
            titles.push(next_json(&mut host).await["payload"]["title"].clone());
        }

        assert_eq!(
            titles,
            vec![
                serde_json::json!("K/D\n2.00"),
                serde_json::json!("Kills\n100"),
                serde_json::json!("Wins\n50.0%"),
            ]
        );

        host.close(None).await.expect("close host socket");
        let result = plugin.await.expect("transport task");
        assert!(result.is_ok(), "unexpected transport error: {result:?}");

        controller_handle.abort();
        provider_handle.abort();
        let _ = provider_handle.await;
    }
}
