//! Common types shared by the storage and buffer layers.
//!
//! - Configuration constants
//! - Error types
//! - Identifiers (BlockId, FrameId)

mod block_id;
pub mod config;
pub mod error;
mod frame_id;

pub use block_id::BlockId;
pub use error::{Error, ErrorKind, Result};
pub use frame_id::FrameId;
