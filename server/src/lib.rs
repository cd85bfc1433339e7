//! # Blog Store Server
//!
//! HTTP front end for the blog store: routing, request validation,
//! configuration and logging.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod api;
pub mod config;
pub mod error;
pub mod telemetry;

pub use api::{create_router, AppState};
pub use config::{Args, ServerConfig};
pub use error::{ApiError, ServerError};
