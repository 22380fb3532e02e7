use serde::{Deserialize, Serialize};

/// SFTP `SSH_FXP_STATUS` codes (draft-ietf-secsh-filexfer-02, section 7).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "u32", into = "u32")]
pub enum StatusCode {
    Ok,
    Eof,
    NoSuchFile,
    PermissionDenied,
    Failure,
    BadMessage,
    NoConnection,
    ConnectionLost,
    OpUnsupported,
    Other(u32),
}

impl StatusCode {
    /// The human-readable text OpenSSH attaches to each status.
    ///
    /// Callers match on these strings ("No such file" in particular), so
    /// they must not change.
    pub fn default_message(self) -> &'static str {
        match self {
            Self::Ok => "Success",
            Self::Eof => "End of file",
            Self::NoSuchFile => "No such file",
            Self::PermissionDenied => "Permission denied",
            Self::Failure => "Failure",
            Self::BadMessage => "Bad message",
            Self::NoConnection => "No connection",
            Self::ConnectionLost => "Connection lost",
            Self::OpUnsupported => "Operation unsupported",
            Self::Other(_) => "Unknown error",
        }
    }

    /// Returns `true` for codes meaning the channel itself is gone.
    pub fn is_connection_error(self) -> bool {
        matches!(self, Self::NoConnection | Self::ConnectionLost)
    }
}

impl From<u32> for StatusCode {
    fn from(code: u32) -> Self {
        match code {
            0 => Self::Ok,
            1 => Self::Eof,
            2 => Self::NoSuchFile,
            3 => Self::PermissionDenied,
            4 => Self::Failure,
            5 => Self::BadMessage,
            6 => Self::NoConnection,
            7 => Self::ConnectionLost,
            8 => Self::OpUnsupported,
            other => Self::Other(other),
        }
    }
}

impl From<StatusCode> for u32 {
    fn from(code: StatusCode) -> Self {
        match code {
            StatusCode::Ok => 0,
            StatusCode::Eof => 1,
            StatusCode::NoSuchFile => 2,
            StatusCode::PermissionDenied => 3,
            StatusCode::Failure => 4,
            StatusCode::BadMessage => 5,
            StatusCode::NoConnection => 6,
            StatusCode::ConnectionLost => 7,
            StatusCode::OpUnsupported => 8,
            StatusCode::Other(other) => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_values_map_both_ways() {
        for raw in 0..=8u32 {
            let code = StatusCode::from(raw);
            assert_eq!(u32::from(code), raw);
            assert!(!matches!(code, StatusCode::Other(_)));
        }
        assert_eq!(StatusCode::from(42), StatusCode::Other(42));
        assert_eq!(u32::from(StatusCode::Other(42)), 42);
    }

    #[test]
    fn no_such_file_message_is_stable() {
        assert_eq!(StatusCode::NoSuchFile.default_message(), "No such file");
    }

    #[test]
    fn connection_errors() {
        assert!(StatusCode::NoConnection.is_connection_error());
        assert!(StatusCode::ConnectionLost.is_connection_error());
        assert!(!StatusCode::Failure.is_connection_error());
    }

    #[test]
    fn serializes_as_number() {
        let json = serde_json::to_string(&StatusCode::PermissionDenied).unwrap();
        assert_eq!(json, "3");
        let parsed: StatusCode = serde_json::from_str("2").unwrap();
        assert_eq!(parsed, StatusCode::NoSuchFile);
    }
}
