use std::{sync::Arc, time::Duration};

use futures::{Sink, SinkExt, Stream, StreamExt};
use serde::Serialize;
use tokio::{
    sync::{oneshot, Mutex, RwLock},
    task::JoinHandle,
    time::{sleep_until, Instant},
};
use tokio_tungstenite::{
    connect_async,
    tungstenite::{self, Message},
};
use tracing::{debug, error, info, instrument, warn};
use url::Url;

use crate::{
    envelope::{Envelope, OutboundFrame},
    EventRouter, MercuryConfig, MercuryError, MercuryEvent, Subscription, OFFLINE, ONLINE,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MercuryStatus {
    Disconnected,
    Connecting,
    Connected,
}

struct Connection {
    shutdown: oneshot::Sender<()>,
    task: JoinHandle<()>,
}

/// Mercury connection with an explicit connect/disconnect lifecycle.
///
/// Subscriptions are independent of the connection and keep receiving
/// events across reconnects.
pub struct MercuryClient {
    config: MercuryConfig,
    access_token: String,
    router: EventRouter,
    status: Arc<RwLock<MercuryStatus>>,
    connection: Mutex<Option<Connection>>,
}

impl MercuryClient {
    pub fn new(config: MercuryConfig, access_token: impl Into<String>) -> Self {
        Self {
            config,
            access_token: access_token.into(),
            router: EventRouter::new(),
            status: Arc::new(RwLock::new(MercuryStatus::Disconnected)),
            connection: Mutex::new(None),
        }
    }

    pub fn subscribe(&self, event_name: impl Into<String>) -> Subscription {
        self.router.subscribe(event_name)
    }

    pub fn router(&self) -> &EventRouter {
        &self.router
    }

    pub async fn status(&self) -> MercuryStatus {
        *self.status.read().await
    }

    /// Opens the socket and authorizes it. Does nothing when already connected.
    #[instrument(name = "MercuryClient::connect", skip(self), fields(url = %self.config.url))]
    pub async fn connect(&self) -> Result<(), MercuryError> {
        let mut connection = self.connection.lock().await;
        if connection
            .as_ref()
            .is_some_and(|connection| !connection.task.is_finished())
        {
            debug!("Already connected");
            return Ok(());
        }

        *self.status.write().await = MercuryStatus::Connecting;
        let socket = match self.open_socket().await {
            Ok(socket) => socket,
            Err(e) => {
                *self.status.write().await = MercuryStatus::Disconnected;
                return Err(e);
            }
        };

        let (shutdown, shutdown_rx) = oneshot::channel();
        let task = SocketTask {
            router: self.router.clone(),
            status: Arc::clone(&self.status),
            ping_interval: self.config.ping_interval(),
            pong_timeout: self.config.pong_timeout(),
        };
        *self.status.write().await = MercuryStatus::Connected;
        info!("Mercury connected");
        // Online must reach subscribers before any event read by the socket task
        self.router.dispatch(&MercuryEvent::lifecycle(ONLINE));

        *connection = Some(Connection {
            shutdown,
            task: tokio::spawn(task.run(socket, shutdown_rx)),
        });
        Ok(())
    }

    async fn open_socket(
        &self,
    ) -> Result<
        tokio_tungstenite::WebSocketStream<
            tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
        >,
        MercuryError,
    > {
        let url = Url::parse(&self.config.url)?;
        let (mut socket, _) = connect_async(url.as_str()).await?;

        let authorization = OutboundFrame::authorization(&self.access_token).to_json()?;
        socket.send(Message::text(authorization)).await?;

        Ok(socket)
    }

    /// Closes the socket. Safe to call when not connected.
    pub async fn disconnect(&self) {
        let Some(connection) = self.connection.lock().await.take() else {
            *self.status.write().await = MercuryStatus::Disconnected;
            return;
        };

        let _ = connection.shutdown.send(());
        if let Err(e) = connection.task.await {
            error!("Mercury socket task failed: {}", e);
            *self.status.write().await = MercuryStatus::Disconnected;
        }
    }
}

enum Disconnect {
    Requested,
    ClosedByServer,
    Lost(String),
}

struct SocketTask {
    router: EventRouter,
    status: Arc<RwLock<MercuryStatus>>,
    ping_interval: Duration,
    pong_timeout: Duration,
}

impl SocketTask {
    async fn run<S>(self, mut socket: S, mut shutdown: oneshot::Receiver<()>)
    where
        S: Stream<Item = Result<Message, tungstenite::Error>>
            + Sink<Message, Error = tungstenite::Error>
            + Unpin,
    {
        let mut ping = tokio::time::interval(self.ping_interval);
        // The first tick completes immediately
        ping.tick().await;
        let mut pong_deadline: Option<Instant> = None;

        let reason = loop {
            tokio::select! {
                _ = &mut shutdown => {
                    let _ = socket.close().await;
                    break Disconnect::Requested;
                }
                frame = socket.next() => match frame {
                    Some(Ok(Message::Text(text))) => {
                        if let Err(e) = self.handle_text(text.as_str(), &mut socket, &mut pong_deadline).await {
                            break Disconnect::Lost(e.to_string());
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break Disconnect::ClosedByServer,
                    Some(Ok(_)) => {}
                    Some(Err(e)) => break Disconnect::Lost(e.to_string()),
                },
                _ = ping.tick() => {
                    if let Err(e) = send_frame(&mut socket, &OutboundFrame::ping()).await {
                        break Disconnect::Lost(e.to_string());
                    }
                    if pong_deadline.is_none() {
                        pong_deadline = Some(Instant::now() + self.pong_timeout);
                    }
                }
                _ = sleep_until_or_pending(pong_deadline) => {
                    break Disconnect::Lost("pong not received in time".to_string());
                }
            }
        };

        match &reason {
            Disconnect::Requested => info!("Mercury disconnected"),
            Disconnect::ClosedByServer => warn!("Mercury socket closed by server"),
            Disconnect::Lost(cause) => error!("Mercury connection lost: {}", cause),
        }

        *self.status.write().await = MercuryStatus::Disconnected;
        self.router.dispatch(&MercuryEvent::lifecycle(OFFLINE));
    }

    async fn handle_text<S>(
        &self,
        text: &str,
        socket: &mut S,
        pong_deadline: &mut Option<Instant>,
    ) -> Result<(), MercuryError>
    where
        S: Sink<Message, Error = tungstenite::Error> + Unpin,
    {
        let envelope = match Envelope::parse(text) {
            Ok(envelope) => envelope,
            Err(e) => {
                warn!("Skipping Mercury frame: {}", e);
                return Ok(());
            }
        };

        if envelope.is_pong() {
            pong_deadline.take();
            return Ok(());
        }

        if let Some(id) = &envelope.id {
            send_frame(socket, &OutboundFrame::ack(id.as_str())).await?;
        }

        for event in MercuryEvent::from_envelope(&envelope) {
            let delivered = self.router.dispatch(&event);
            debug!(name = %event.name, delivered, "Dispatched Mercury event");
        }

        Ok(())
    }
}

async fn send_frame<S>(socket: &mut S, frame: &OutboundFrame) -> Result<(), MercuryError>
where
    S: Sink<Message, Error = tungstenite::Error> + Unpin,
{
    socket.send(Message::text(frame.to_json()?)).await?;
    Ok(())
}

async fn sleep_until_or_pending(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
