use std::path::PathBuf;

use bluedit_gateway::{ConfigError, GatewayError};

/// Exit codes for the CLI process.
///
/// - 0: success
/// - 1: general error
/// - 2: invalid configuration or arguments
/// - 10: the server could not bind or stopped with an error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    Success = 0,
    GeneralError = 1,
    InvalidArguments = 2,
    ServeError = 10,
}

/// Errors returned by CLI command handlers.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// IO errors (file not found, permission denied).
    #[error("IO error for {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Configuration errors.
    #[error("configuration error: {message}")]
    Config { message: String },

    /// The gateway could not be assembled from the configuration.
    #[error("gateway error: {0}")]
    Gateway(#[from] GatewayError),

    /// Binding or serving failed.
    #[error("server error: {message}")]
    Serve { message: String },

    /// Generic error with message.
    #[error("{0}")]
    Other(String),
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        Self::Config {
            message: err.to_string(),
        }
    }
}

impl CliError {
    /// Maps this error to the appropriate exit code.
    pub fn exit_code(&self) -> ExitCode {
        match self {
            Self::Config { .. } | Self::Gateway(_) => ExitCode::InvalidArguments,
            Self::Serve { .. } => ExitCode::ServeError,
            Self::Io { .. } | Self::Other(_) => ExitCode::GeneralError,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_exit_code() {
        let err = CliError::Config {
            message: "bad config".into(),
        };
        assert_eq!(err.exit_code(), ExitCode::InvalidArguments);
    }

    #[test]
    fn config_error_conversion_keeps_message() {
        let err = CliError::from(ConfigError::InvalidByteSize {
            value: "lots".into(),
        });
        assert_eq!(err.exit_code(), ExitCode::InvalidArguments);
        assert!(err.to_string().contains("lots"));
    }

    #[test]
    fn gateway_build_error_exit_code() {
        let err = CliError::from(GatewayError::Internal {
            message: "bad origin".into(),
        });
        assert_eq!(err.exit_code(), ExitCode::InvalidArguments);
        assert!(err.to_string().contains("bad origin"));
    }

    #[test]
    fn serve_error_exit_code() {
        let err = CliError::Serve {
            message: "address in use".into(),
        };
        assert_eq!(err.exit_code(), ExitCode::ServeError);
    }

    #[test]
    fn io_error_exit_code() {
        let err = CliError::Io {
            path: PathBuf::from("/tmp/missing.toml"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
        };
        assert_eq!(err.exit_code(), ExitCode::GeneralError);
        assert!(err.to_string().contains("/tmp/missing.toml"));
    }

    #[test]
    fn exit_code_values() {
        assert_eq!(ExitCode::Success as i32, 0);
        assert_eq!(ExitCode::GeneralError as i32, 1);
        assert_eq!(ExitCode::InvalidArguments as i32, 2);
        assert_eq!(ExitCode::ServeError as i32, 10);
    }
}
