use futures_util::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, warn};
use crate::handlers::events::TrackerEvent;
use crate::models::error::TrackerError;
use crate::models::updates::InboundUpdate;

pub struct AutoCancelTask<T>(pub JoinHandle<T>);

impl<T> Drop for AutoCancelTask<T> {
    fn drop(&mut self) {
        self.0.abort();
    }
}

pub type ChannelSocket = WebSocketStream<MaybeTlsStream<TcpStream>>;

pub async fn connect(url: &str) -> Result<ChannelSocket, TrackerError> {
    let (socket, response) = connect_async(url).await
        .map_err(|source| TrackerError::Connect { url: url.to_string(), source })?;
    info!("Connected to {} ({})", url, response.status());
    Ok(socket)
}

pub fn parse_frame(text: &str) -> Option<TrackerEvent> {
    match serde_json::from_str::<InboundUpdate>(text) {
        Ok(InboundUpdate::ReceiveLocation(peer)) => Some(TrackerEvent::RemoteLocation {
            position: peer.position(),
            id: peer.id,
        }),
        Err(e) => {
            debug!("Dropping frame {:?}: {}", text, e);
            None
        }
    }
}

/// Pumps one websocket: inbound frames become events, outbound frames come from a watch.
pub struct WebsocketActor {
    recv_task: AutoCancelTask<()>,
    send_task: AutoCancelTask<()>,
}

impl WebsocketActor {
    pub fn new<T>(socket: WebSocketStream<T>,
                  inbound: mpsc::Sender<TrackerEvent>,
                  mut outbound: watch::Receiver<String>) -> Self
        where T: AsyncRead + AsyncWrite + Unpin + Send + 'static {
        let (mut ws_sender, mut ws_receiver) = socket.split();

        let inbound_task = tokio::spawn(async move {
            while let Some(msg) = ws_receiver.next().await {
                match msg {
                    Ok(Message::Text(text)) => {
                        debug!("Received frame: {}", text);
                        if let Some(event) = parse_frame(&text) {
                            if inbound.send(event).await.is_err() {
                                break;
                            }
                        }
                    }
                    Ok(Message::Close(frame)) => {
                        info!("Channel closed by peer: {:?}", frame);
                        break;
                    }
                    Ok(_) => {}
                    Err(e) => {
                        warn!("Channel receive error: {}", e);
                        break;
                    }
                }
            }
        });

        let outbound_task = tokio::spawn(async move {
            while outbound.changed().await.is_ok() {
                let msg = outbound.borrow().clone();
                debug!("Sending frame: {}", msg);
                if let Err(e) = ws_sender.send(Message::Text(msg)).await {
                    warn!("Channel send error: {}", e);
                    return;
                }
            }
            ws_sender.send(Message::Close(None)).await.ok();
        });

        Self {
            recv_task: AutoCancelTask(inbound_task),
            send_task: AutoCancelTask(outbound_task),
        }
    }

    pub async fn run_actor(mut self) {
        tokio::select! {
            _ = &mut self.recv_task.0 => (),
            _ = &mut self.send_task.0 => ()
        }
        info!("Realtime channel lost");
    }
}
