//! Raw transport errors as reported by an SFTP session.

use std::io;

use crate::status::StatusCode;

/// A failed SFTP request: the server status plus its message text.
///
/// The message is kept verbatim so callers can surface exactly what the
/// server said.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct SftpError {
    pub code: StatusCode,
    pub message: String,
}

impl SftpError {
    pub fn new(code: StatusCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Builds an error carrying the status code's standard text.
    pub fn from_code(code: StatusCode) -> Self {
        Self::new(code, code.default_message())
    }

    pub fn no_such_file() -> Self {
        Self::from_code(StatusCode::NoSuchFile)
    }

    pub fn permission_denied() -> Self {
        Self::from_code(StatusCode::PermissionDenied)
    }

    pub fn connection_lost() -> Self {
        Self::from_code(StatusCode::ConnectionLost)
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self::new(StatusCode::Failure, message)
    }
}

impl From<io::Error> for SftpError {
    fn from(err: io::Error) -> Self {
        let code = match err.kind() {
            io::ErrorKind::NotFound => StatusCode::NoSuchFile,
            io::ErrorKind::PermissionDenied => StatusCode::PermissionDenied,
            io::ErrorKind::UnexpectedEof => StatusCode::Eof,
            io::ErrorKind::NotConnected => StatusCode::NoConnection,
            io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::BrokenPipe => StatusCode::ConnectionLost,
            io::ErrorKind::Unsupported => StatusCode::OpUnsupported,
            _ => StatusCode::Failure,
        };
        match code {
            StatusCode::Failure => Self::failure(err.to_string()),
            code => Self::from_code(code),
        }
    }
}
