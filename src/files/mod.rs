//! File Transfer Protocol
//!
//! Files never pass through the leader: the catalog only says who hosts
//! what, and the requester connects to the hosting peer directly.
//!
//! ## Submodules
//! - **`store`**: the shared directory, its listing and SHA-256 hashing.
//! - **`transfer`**: request/serve halves of the TCP exchange.
//! - **`download`**: source selection and post-transfer verification.

pub mod download;
pub mod store;
pub mod transfer;
