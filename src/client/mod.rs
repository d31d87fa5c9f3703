//! Grid HTTP clients
//!
//! Typed clients for the grid control plane (suite upload) and the
//! per-organization session gateway.

mod grid;
mod upload;

pub use grid::{GridError, HttpSessionClient, RetryPolicy, SessionRequest, SessionService};
pub use upload::{UploadClient, UploadError};
