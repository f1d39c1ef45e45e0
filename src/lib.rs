//! HTTP mock server
//!
//! A configurable mock server that receives arbitrary HTTP requests and
//! replies with pre-registered canned responses, selected by exact-matching
//! the request's method, path, query parameters and body against a registry
//! of stubs.
//!
//! # Features
//!
//! - **Runtime registration**: `POST /httpmock/add` with a JSON or YAML stub
//! - **Introspection**: `GET /httpmock/list` returns every registered stub
//! - **File loading**: recursively load `.json`/`.yaml`/`.yml` stub
//!   definitions from a directory tree at startup
//! - **Programmatic API**: build and register stubs from Rust
//! - **Deterministic matching**: requests are canonicalized (path
//!   normalization, body compaction) and fingerprinted, so semantically
//!   identical requests always hit the same stub
//!
//! # Example stub definition
//!
//! ```yaml
//! request:
//!   method: GET
//!   path: /hello
//! response:
//!   status_code: 200
//!   body:
//!     message: "Hello, World!"
//! ```

pub mod config;
pub mod error;
pub mod fingerprint;
pub mod loader;
pub mod registry;
pub mod server;
pub mod stub;

pub use config::ServerConfig;
pub use error::{DecodeError, ValidationError};
pub use fingerprint::Fingerprint;
pub use registry::StubRegistry;
pub use server::MockServer;
pub use stub::{Stub, StubRequest, StubResponse};
