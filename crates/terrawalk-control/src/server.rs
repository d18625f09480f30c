//! TCP control server

use std::net::SocketAddr;
use std::sync::Arc;

use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;
use tokio::sync::Mutex;

use crate::protocol::{ControlCommand, ControlResponse};

/// Trait that the application implements to handle control commands
pub trait ControlHandler: Send + Sync + 'static {
    fn handle_command(&mut self, cmd: ControlCommand) -> ControlResponse;
}

#[derive(Debug, Error)]
pub enum ControlError {
    #[error("failed to bind control server on {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },
}

/// Control server handle - keep this alive to keep the server running
pub struct ControlServer {
    local_addr: Option<SocketAddr>,
    handle: tokio::task::JoinHandle<()>,
}

impl ControlServer {
    /// Bind on 127.0.0.1:`port` and serve in the background.
    ///
    /// Port 0 picks a free port; see [`ControlServer::local_addr`].
    pub async fn bind(handler: Arc<Mutex<dyn ControlHandler>>, port: u16) -> Result<Self, ControlError> {
        let addr = format!("127.0.0.1:{}", port);
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|source| ControlError::Bind { addr: addr.clone(), source })?;
        let local_addr = listener.local_addr().ok();
        log::info!("Control server listening on {}", local_addr.map_or(addr, |a| a.to_string()));

        let handle = tokio::spawn(accept_loop(listener, handler));
        Ok(Self { local_addr, handle })
    }

    /// Bound address, when known
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.local_addr
    }

    /// Stop accepting connections
    pub fn shutdown(self) {
        self.handle.abort();
    }
}

async fn accept_loop(listener: TcpListener, handler: Arc<Mutex<dyn ControlHandler>>) {
    loop {
        match listener.accept().await {
            Ok((stream, peer)) => {
                log::info!("Control client connected from {}", peer);
                let handler = handler.clone();
                tokio::spawn(async move {
                    handle_connection(stream, handler).await;
                    log::info!("Control client disconnected: {}", peer);
                });
            }
            Err(e) => {
                log::error!("Control server accept error: {}", e);
            }
        }
    }
}

/// Parse one request line and run it through the handler
async fn respond(line: &str, handler: &Arc<Mutex<dyn ControlHandler>>) -> ControlResponse {
    match serde_json::from_str::<ControlCommand>(line) {
        Ok(cmd) => {
            log::debug!("Control command: {:?}", cmd);
            let mut h = handler.lock().await;
            h.handle_command(cmd)
        }
        Err(e) => ControlResponse::error(format!("Invalid command JSON: {}", e)),
    }
}

async fn handle_connection(stream: tokio::net::TcpStream, handler: Arc<Mutex<dyn ControlHandler>>) {
    let (reader, mut writer) = stream.into_split();
    let mut reader = BufReader::new(reader);
    let mut line = String::new();

    loop {
        line.clear();
        match reader.read_line(&mut line).await {
            Ok(0) => break, // Connection closed
            Ok(_) => {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }

                let response = respond(trimmed, &handler).await;

                let mut resp_json = serde_json::to_string(&response).unwrap_or_else(|e| {
                    format!("{{\"status\":\"error\",\"message\":\"Serialize error: {}\"}}", e)
                });
                resp_json.push('\n');

                if let Err(e) = writer.write_all(resp_json.as_bytes()).await {
                    log::error!("Control server write error: {}", e);
                    break;
                }
                if let Err(e) = writer.flush().await {
                    log::error!("Control server flush error: {}", e);
                    break;
                }
            }
            Err(e) => {
                log::error!("Control server read error: {}", e);
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::ResponseData;
    use tokio::net::TcpStream;

    struct Echo {
        count: u32,
    }

    impl ControlHandler for Echo {
        fn handle_command(&mut self, cmd: ControlCommand) -> ControlResponse {
            self.count += 1;
            match cmd {
                ControlCommand::Ping => ControlResponse::pong(),
                other => ControlResponse::updated(format!("{:?} #{}", other, self.count)),
            }
        }
    }

    async fn request(
        reader: &mut BufReader<tokio::net::tcp::OwnedReadHalf>,
        writer: &mut tokio::net::tcp::OwnedWriteHalf,
        line: &str,
    ) -> ControlResponse {
        writer.write_all(line.as_bytes()).await.unwrap();
        writer.write_all(b"\n").await.unwrap();
        let mut resp = String::new();
        reader.read_line(&mut resp).await.unwrap();
        serde_json::from_str(resp.trim()).unwrap()
    }

    #[tokio::test]
    async fn test_respond_parses_and_dispatches() {
        let handler: Arc<Mutex<dyn ControlHandler>> = Arc::new(Mutex::new(Echo { count: 0 }));
        assert_eq!(respond(r#"{"cmd":"Ping"}"#, &handler).await, ControlResponse::pong());

        let bad = respond("{not json", &handler).await;
        match bad {
            ControlResponse::Error { message } => assert!(message.starts_with("Invalid command JSON")),
            other => panic!("expected error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_round_trip_over_tcp() {
        let handler: Arc<Mutex<dyn ControlHandler>> = Arc::new(Mutex::new(Echo { count: 0 }));
        let server = ControlServer::bind(handler, 0).await.unwrap();
        let addr = server.local_addr().unwrap();

        let stream = TcpStream::connect(addr).await.unwrap();
        let (reader, mut writer) = stream.into_split();
        let mut reader = BufReader::new(reader);

        let pong = request(&mut reader, &mut writer, r#"{"cmd":"Ping"}"#).await;
        assert!(matches!(pong, ControlResponse::Ok { data: ResponseData::Pong { .. } }));

        let err = request(&mut reader, &mut writer, r#"{"cmd":"Nope"}"#).await;
        assert!(!err.is_ok());

        let updated = request(&mut reader, &mut writer, r#"{"cmd":"Look","params":{"dx":1.0,"dy":0.0}}"#).await;
        match updated {
            ControlResponse::Ok { data: ResponseData::ParamsUpdated { description } } => {
                assert!(description.ends_with("#2"));
            }
            other => panic!("unexpected response {:?}", other),
        }

        server.shutdown();
    }

    #[tokio::test]
    async fn test_bind_conflict_is_error() {
        let handler: Arc<Mutex<dyn ControlHandler>> = Arc::new(Mutex::new(Echo { count: 0 }));
        let first = ControlServer::bind(handler.clone(), 0).await.unwrap();
        let port = first.local_addr().unwrap().port();
        assert!(matches!(ControlServer::bind(handler, port).await, Err(ControlError::Bind { .. })));
    }
}
