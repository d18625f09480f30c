//! Remote control for terrawalk - JSON-lines TCP server for driving a session
//!
//! Bind the control server inside a tokio runtime:
//! ```ignore
//! let handler = Arc::new(Mutex::new(MyHandler::new()));
//! let server = ControlServer::bind(handler, DEFAULT_PORT).await?;
//! ```

pub mod protocol;
pub mod server;

pub use protocol::*;
pub use server::{ControlError, ControlHandler, ControlServer};

/// Default control server port
pub const DEFAULT_PORT: u16 = 9743;
