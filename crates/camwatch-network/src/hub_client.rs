//! 카메라 허브 WebSocket 클라이언트.
//!
//! `tokio-tungstenite` 기반. 허브는 바이너리 메시지로 JPEG 프레임을,
//! 텍스트 메시지로 `ping`/`config` 등 JSON 명령을 보낸다.

use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use std::sync::Arc;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, warn};

use camwatch_core::error::CoreError;
use camwatch_core::models::hub::HubMessage;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// 수신 채널 버퍼: 분류 호출 동안 도착하는 프레임은 여기에 쌓인다
const INBOUND_BUFFER: usize = 64;

/// 허브에서 수신한 메시지
#[derive(Debug, Clone, PartialEq)]
pub enum HubFrame {
    /// 인코딩된 카메라 프레임
    Binary(Vec<u8>),
    /// JSON 텍스트 명령
    Text(String),
    /// 연결 종료
    Close,
}

/// 허브 클라이언트
pub struct HubClient {
    url: String,
    version: String,
}

impl HubClient {
    /// `url`: 분석기 엔드포인트 (예: `ws://localhost:8887/analyzer`)
    pub fn new(url: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            version: version.into(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// 연결 수립 후 `identify` 메시지 전송
    ///
    /// 수신 메시지는 `rx`로, 송신은 반환된 `HubSender`로 처리.
    pub async fn connect(&self) -> Result<(HubSender, mpsc::Receiver<HubFrame>), CoreError> {
        info!("허브 연결: {}", self.url);

        let (ws_stream, _) = tokio_tungstenite::connect_async(self.url.as_str())
            .await
            .map_err(|e| CoreError::Network(format!("WebSocket 연결 실패: {e}")))?;

        let (write, read) = ws_stream.split();
        let (tx, rx) = mpsc::channel(INBOUND_BUFFER);

        tokio::spawn(Self::read_loop(read, tx));

        let sender = HubSender {
            write: Arc::new(tokio::sync::Mutex::new(write)),
        };
        sender.send(&HubMessage::identify(&self.version)).await?;
        info!("허브 연결됨: motion_analyzer v{}", self.version);

        Ok((sender, rx))
    }

    async fn read_loop(mut read: SplitStream<WsStream>, tx: mpsc::Sender<HubFrame>) {
        while let Some(msg) = read.next().await {
            let frame = match msg {
                Ok(Message::Binary(data)) => HubFrame::Binary(data.to_vec()),
                Ok(Message::Text(text)) => HubFrame::Text(text.as_str().to_string()),
                Ok(Message::Close(_)) => {
                    let _ = tx.send(HubFrame::Close).await;
                    break;
                }
                Ok(_) => continue, // Ping/Pong은 자동 처리
                Err(e) => {
                    warn!("WebSocket 수신 에러: {e}");
                    let _ = tx.send(HubFrame::Close).await;
                    break;
                }
            };
            if tx.send(frame).await.is_err() {
                break;
            }
        }
        debug!("허브 수신 루프 종료");
    }
}

/// 허브 송신기 (복제 가능)
#[derive(Clone)]
pub struct HubSender {
    write: Arc<tokio::sync::Mutex<SplitSink<WsStream, Message>>>,
}

impl HubSender {
    /// 텍스트 메시지 전송
    pub async fn send_text(&self, text: &str) -> Result<(), CoreError> {
        let mut write = self.write.lock().await;
        write
            .send(Message::text(text))
            .await
            .map_err(|e| CoreError::Network(format!("WebSocket 전송 실패: {e}")))
    }

    /// envelope 메시지 전송
    pub async fn send(&self, message: &HubMessage) -> Result<(), CoreError> {
        let json = serde_json::to_string(message)?;
        self.send_text(&json).await
    }

    /// 연결 종료
    pub async fn close(&self) -> Result<(), CoreError> {
        let mut write = self.write.lock().await;
        write
            .send(Message::Close(None))
            .await
            .map_err(|e| CoreError::Network(format!("WebSocket 종료 실패: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    /// 단일 연결을 받는 테스트 허브. 수신한 텍스트를 돌려준다.
    async fn spawn_hub(
        script: Vec<Message>,
    ) -> (String, tokio::task::JoinHandle<Vec<String>>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let handle = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();
            let mut received = Vec::new();

            // identify
            if let Some(Ok(Message::Text(t))) = ws.next().await {
                received.push(t.as_str().to_string());
            }
            for msg in script {
                ws.send(msg).await.unwrap();
            }
            while let Some(Ok(msg)) = ws.next().await {
                match msg {
                    Message::Text(t) => received.push(t.as_str().to_string()),
                    Message::Close(_) => break,
                    _ => {}
                }
            }
            received
        });

        (format!("ws://{addr}/analyzer"), handle)
    }

    #[tokio::test]
    async fn identify_sent_on_connect_and_frames_forwarded() {
        let (url, hub) = spawn_hub(vec![
            Message::binary(vec![0xFF, 0xD8, 0x01]),
            Message::text(r#"{"type":"ping"}"#),
        ])
        .await;

        let client = HubClient::new(url, "0.1.0");
        let (sender, mut rx) = client.connect().await.unwrap();

        assert_eq!(rx.recv().await, Some(HubFrame::Binary(vec![0xFF, 0xD8, 0x01])));
        assert_eq!(
            rx.recv().await,
            Some(HubFrame::Text(r#"{"type":"ping"}"#.to_string()))
        );

        sender.send(&HubMessage::pong()).await.unwrap();
        sender.close().await.unwrap();

        let received = hub.await.unwrap();
        assert_eq!(received.len(), 2);
        let identify: serde_json::Value = serde_json::from_str(&received[0]).unwrap();
        assert_eq!(identify["type"], "identify");
        assert_eq!(identify["data"]["role"], "motion_analyzer");
        assert_eq!(identify["data"]["version"], "0.1.0");
        let pong: serde_json::Value = serde_json::from_str(&received[1]).unwrap();
        assert_eq!(pong["type"], "pong");
    }

    #[tokio::test]
    async fn server_close_yields_close_frame() {
        let (url, _hub) = spawn_hub(vec![Message::Close(None)]).await;
        let (_sender, mut rx) = HubClient::new(url, "0.1.0").connect().await.unwrap();
        assert_eq!(rx.recv().await, Some(HubFrame::Close));
    }

    #[tokio::test]
    async fn unreachable_hub_is_network_error() {
        // 바인드 후 즉시 해제한 포트
        let port = {
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            listener.local_addr().unwrap().port()
        };
        let client = HubClient::new(format!("ws://127.0.0.1:{port}/analyzer"), "0.1.0");
        assert!(matches!(
            client.connect().await,
            Err(CoreError::Network(_))
        ));
    }
}
