//! HTTP client for the StrideQuest progress service.
//!
//! Implements the core `RemoteProgressStore` contract over a per-user
//! progress document REST API.

mod client;
mod error;
mod types;

pub use client::ConnectClient;
pub use error::{ApiRetryClass, ConnectError};
pub use types::{ListProgressResponse, ProgressDocument};
