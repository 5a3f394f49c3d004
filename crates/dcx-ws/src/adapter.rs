use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

use dcx_core::ports::adapter::{
    AdapterError, ProtocolAdapter, WebSocketAdapter, WsCloseCallback, WsErrorCallback, WsMessageCallback,
};

use crate::error::WsAdapterError;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type WsSink = futures_util::stream::SplitSink<WsStream, Message>;

const INCOMING_CHANNEL_CAPACITY: usize = 256;

/// `tokio-tungstenite`-backed WebSocket adapter. `connect_websocket` splits
/// the stream and spawns one dedicated reader task that both feeds
/// `receive`'s bounded channel and invokes whichever `on_message`/`on_error`/
/// `on_close` callback is registered at the time a frame arrives; the task
/// holds its own `Arc` clone of each callback slot so it owns everything it
/// touches rather than borrowing from the adapter. `disconnect_websocket`
/// aborts it.
pub struct TungsteniteWebSocketAdapter {
    url: String,
    sink: Mutex<Option<WsSink>>,
    incoming: Mutex<Option<mpsc::Receiver<Vec<u8>>>>,
    reader_task: Mutex<Option<JoinHandle<()>>>,
    on_message: Arc<RwLock<Option<WsMessageCallback>>>,
    on_error: Arc<RwLock<Option<WsErrorCallback>>>,
    on_close: Arc<RwLock<Option<WsCloseCallback>>>,
    connected: AtomicBool,
}

impl TungsteniteWebSocketAdapter {
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            sink: Mutex::new(None),
            incoming: Mutex::new(None),
            reader_task: Mutex::new(None),
            on_message: Arc::new(RwLock::new(None)),
            on_error: Arc::new(RwLock::new(None)),
            on_close: Arc::new(RwLock::new(None)),
            connected: AtomicBool::new(false),
        }
    }
}

#[async_trait]
impl ProtocolAdapter for TungsteniteWebSocketAdapter {
    async fn connect(&self) -> Result<(), AdapterError> {
        let url = self.url.clone();
        self.connect_websocket(&url).await
    }

    async fn disconnect(&self) -> Result<(), AdapterError> {
        self.disconnect_websocket().await
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl WebSocketAdapter for TungsteniteWebSocketAdapter {
    async fn connect_websocket(&self, url: &str) -> Result<(), AdapterError> {
        let (stream, _response) = tokio_tungstenite::connect_async(url)
            .await
            .map_err(|e| WsAdapterError::Connect(url.to_string(), e.to_string()))?;
        let (sink, mut source) = stream.split();
        *self.sink.lock().await = Some(sink);

        let (tx, rx) = mpsc::channel(INCOMING_CHANNEL_CAPACITY);
        *self.incoming.lock().await = Some(rx);

        let message_cb = self.on_message.clone();
        let error_cb = self.on_error.clone();
        let close_cb = self.on_close.clone();

        let task = tokio::spawn(async move {
            while let Some(frame) = source.next().await {
                match frame {
                    Ok(Message::Binary(data)) => {
                        if let Some(cb) = message_cb.read().unwrap().as_ref() {
                            cb(data.clone());
                        }
                        let _ = tx.try_send(data);
                    }
                    Ok(Message::Text(text)) => {
                        let bytes = text.into_bytes();
                        if let Some(cb) = message_cb.read().unwrap().as_ref() {
                            cb(bytes.clone());
                        }
                        let _ = tx.try_send(bytes);
                    }
                    Ok(Message::Close(_)) => {
                        if let Some(cb) = close_cb.read().unwrap().as_ref() {
                            cb();
                        }
                        break;
                    }
                    Ok(_) => {}
                    Err(err) => {
                        if let Some(cb) = error_cb.read().unwrap().as_ref() {
                            cb(WsAdapterError::Send(err.to_string()).into());
                        }
                        break;
                    }
                }
            }
        });

        *self.reader_task.lock().await = Some(task);
        self.connected.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn disconnect_websocket(&self) -> Result<(), AdapterError> {
        if let Some(task) = self.reader_task.lock().await.take() {
            task.abort();
        }
        if let Some(mut sink) = self.sink.lock().await.take() {
            let _ = sink.close().await;
        }
        self.incoming.lock().await.take();
        self.connected.store(false, Ordering::SeqCst);
        Ok(())
    }

    async fn send(&self, data: Vec<u8>) -> Result<(), AdapterError> {
        let mut guard = self.sink.lock().await;
        let sink = guard.as_mut().ok_or(AdapterError::NotConnected)?;
        sink.send(Message::Binary(data))
            .await
            .map_err(|e| WsAdapterError::Send(e.to_string()).into())
    }

    async fn receive(&self, timeout: Option<Duration>) -> Result<Vec<u8>, AdapterError> {
        let mut guard = self.incoming.lock().await;
        let rx = guard.as_mut().ok_or(AdapterError::NotConnected)?;
        match timeout {
            Some(duration) => tokio::time::timeout(duration, rx.recv())
                .await
                .map_err(|_| WsAdapterError::ReceiveTimeout(duration))?
                .ok_or_else(|| WsAdapterError::Closed.into()),
            None => rx.recv().await.ok_or_else(|| WsAdapterError::Closed.into()),
        }
    }

    fn on_message(&self, callback: WsMessageCallback) {
        *self.on_message.write().unwrap() = Some(callback);
    }

    fn on_error(&self, callback: WsErrorCallback) {
        *self.on_error.write().unwrap() = Some(callback);
    }

    fn on_close(&self, callback: WsCloseCallback) {
        *self.on_close.write().unwrap() = Some(callback);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn adapter_starts_disconnected() {
        let adapter = TungsteniteWebSocketAdapter::new("wss://example.invalid/socket");
        assert!(!adapter.is_connected());
    }

    #[tokio::test]
    async fn send_before_connect_is_rejected() {
        let adapter = TungsteniteWebSocketAdapter::new("wss://example.invalid/socket");
        let err = adapter.send(vec![1, 2, 3]).await.unwrap_err();
        assert!(matches!(err, AdapterError::NotConnected));
    }

    #[tokio::test]
    async fn receive_before_connect_is_rejected() {
        let adapter = TungsteniteWebSocketAdapter::new("wss://example.invalid/socket");
        let err = adapter.receive(None).await.unwrap_err();
        assert!(matches!(err, AdapterError::NotConnected));
    }
}
