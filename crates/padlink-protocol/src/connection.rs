//! WebSocket connection and message framing.

use std::net::SocketAddr;

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use serde::Serialize;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::{self, Message};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tracing::trace;

use crate::error::ProtocolError;
use crate::wire;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// A WebSocket connection to a single remote client.
pub struct ClientConnection {
    stream: WsStream,
    remote: SocketAddr,
}

impl ClientConnection {
    /// Perform the server side of the WebSocket handshake on an accepted
    /// TCP stream.
    pub async fn accept(stream: TcpStream, remote: SocketAddr) -> Result<Self, ProtocolError> {
        let stream = tokio_tungstenite::accept_async(MaybeTlsStream::Plain(stream)).await?;
        Ok(Self { stream, remote })
    }

    /// Connect to a padlink server as a client (used by tests and tooling).
    pub async fn connect(url: &str) -> Result<Self, ProtocolError> {
        let (stream, _response) = tokio_tungstenite::connect_async(url).await?;
        let remote = match stream.get_ref() {
            MaybeTlsStream::Plain(tcp) => tcp
                .peer_addr()
                .map_err(|e| ProtocolError::Connection(e.to_string()))?,
            _ => return Err(ProtocolError::Connection("unexpected TLS stream".to_string())),
        };
        Ok(Self { stream, remote })
    }

    /// Get the remote address of this connection.
    pub fn remote_address(&self) -> SocketAddr {
        self.remote
    }

    /// Split into independent send and receive halves.
    pub fn split(self) -> (MessageSender, MessageReceiver) {
        let (sink, stream) = self.stream.split();
        (MessageSender { sink }, MessageReceiver { stream })
    }
}

/// Sends JSON text frames over the WebSocket.
pub struct MessageSender {
    sink: SplitSink<WsStream, Message>,
}

impl MessageSender {
    /// Send a message, encoding it as one JSON text frame.
    pub async fn send<T: Serialize>(&mut self, msg: &T) -> Result<(), ProtocolError> {
        let text = wire::encode_message(msg)?;
        trace!(len = text.len(), "sending message");
        self.sink.send(Message::Text(text)).await?;
        Ok(())
    }

    /// Send a close frame and flush the connection.
    pub async fn close(&mut self) -> Result<(), ProtocolError> {
        self.sink.close().await?;
        Ok(())
    }
}

/// Receives JSON text frames from the WebSocket.
pub struct MessageReceiver {
    stream: SplitStream<WsStream>,
}

impl MessageReceiver {
    /// Receive the next text payload.
    ///
    /// Control frames (ping/pong) and binary frames are skipped. Returns
    /// `None` once the peer has closed the connection. Decoding is left to
    /// the caller via [`wire::decode_message`] so that a malformed payload
    /// does not terminate the connection.
    pub async fn recv_text(&mut self) -> Result<Option<String>, ProtocolError> {
        loop {
            let Some(frame) = self.stream.next().await else {
                return Ok(None);
            };

            match frame {
                Ok(Message::Text(text)) => {
                    trace!(len = text.len(), "received message");
                    return Ok(Some(text));
                }
                Ok(Message::Close(_)) => return Ok(None),
                Ok(Message::Ping(_) | Message::Pong(_) | Message::Frame(_)) => {}
                Ok(Message::Binary(_)) => {
                    trace!("ignoring binary frame");
                }
                Err(
                    tungstenite::Error::ConnectionClosed | tungstenite::Error::AlreadyClosed,
                ) => return Ok(None),
                Err(e) => return Err(ProtocolError::Connection(e.to_string())),
            }
        }
    }
}
