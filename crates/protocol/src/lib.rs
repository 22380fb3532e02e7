//! Protocol-level types shared by fastget sessions and transfers.
//!
//! Covers the parts of SFTP (protocol version 3) that the transfer engine
//! observes: status codes, file attributes and the errors a session
//! reports. Message encoding itself belongs to the session implementation.

pub mod constants;
pub mod error;
pub mod path;
pub mod status;
pub mod types;

pub use error::SftpError;
pub use path::join_remote;
pub use status::StatusCode;
pub use types::FileAttributes;
