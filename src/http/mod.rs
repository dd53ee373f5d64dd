//! HTTP API subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware stack)
//!     → request.rs (request ID, query parsing, URL validation)
//!     → handlers.rs (store calls on the blocking pool)
//!     → response.rs (JSON shapes, error → status)
//!     → Send to client
//! ```
//!
//! # Endpoints
//! - `GET /api/url/{name}`, `POST /api/url/{name}`, `DELETE /api/url/{name}`
//! - `POST /api/url/` stores under a generated name
//! - `GET /api/urls?cursor=&limit=&include-generated-names=`
//! - `GET /healthz`
//! - any other `GET` resolves the path and answers `307`

pub mod handlers;
pub mod request;
pub mod response;
pub mod server;

pub use request::X_REQUEST_ID;
pub use server::{build_router, ApiServer, AppState};
