//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID, geo extraction)
//!     → request.rs (request ID, geo headers, BufferedRequest)
//!     → [load balancer orders endpoints, strategy walks them]
//!     → forwarder.rs (buffer body once, rewrite URL, deadline, retry)
//!     → transport.rs (reqwest client, redirects followed)
//!     → response.rs (observability headers, error mapping)
//!     → Send to client
//! ```

pub mod forwarder;
pub mod request;
pub mod response;
pub mod server;
pub mod transport;

pub use forwarder::RequestForwarder;
pub use request::{BufferedRequest, X_REQUEST_ID};
pub use server::HttpServer;
pub use transport::{HttpTransport, Transport};
