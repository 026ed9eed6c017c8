// Error types for configuration loading and renderer setup.
// The animation itself never fails: a field without a surface just draws nothing.

use std::fmt;
use std::io;

/// Errors surfaced while setting up the triangle field
#[derive(Debug)]
pub enum TrifieldError {
    /// Config file could not be read
    ConfigIo(String),

    /// Config file is not valid JSON for `FieldConfig`
    ConfigParse(String),

    /// A config value is out of range
    InvalidConfig {
        field: &'static str,
        reason: String,
    },

    /// wgpu could not create a surface for the window
    SurfaceUnavailable(String),

    /// No GPU adapter compatible with the surface
    AdapterUnavailable,

    /// Device request failed
    DeviceUnavailable(String),
}

impl fmt::Display for TrifieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConfigIo(msg) => write!(f, "Failed to read config: {}", msg),
            Self::ConfigParse(msg) => write!(f, "Failed to parse config: {}", msg),
            Self::InvalidConfig { field, reason } => {
                write!(f, "Invalid config value for '{}': {}", field, reason)
            }
            Self::SurfaceUnavailable(msg) => write!(f, "Drawing surface unavailable: {}", msg),
            Self::AdapterUnavailable => write!(f, "No compatible GPU adapter found"),
            Self::DeviceUnavailable(msg) => write!(f, "GPU device request failed: {}", msg),
        }
    }
}

impl std::error::Error for TrifieldError {}

impl From<io::Error> for TrifieldError {
    fn from(err: io::Error) -> Self {
        Self::ConfigIo(err.to_string())
    }
}

impl From<serde_json::Error> for TrifieldError {
    fn from(err: serde_json::Error) -> Self {
        Self::ConfigParse(err.to_string())
    }
}

impl From<wgpu::CreateSurfaceError> for TrifieldError {
    fn from(err: wgpu::CreateSurfaceError) -> Self {
        Self::SurfaceUnavailable(err.to_string())
    }
}

impl From<wgpu::RequestDeviceError> for TrifieldError {
    fn from(err: wgpu::RequestDeviceError) -> Self {
        Self::DeviceUnavailable(err.to_string())
    }
}

/// Result type for setup operations
pub type TrifieldResult<T> = Result<T, TrifieldError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = TrifieldError::InvalidConfig {
            field: "capacity",
            reason: "must be greater than zero".to_string(),
        };
        assert!(err.to_string().contains("capacity"));
        assert!(err.to_string().contains("greater than zero"));

        let err = TrifieldError::AdapterUnavailable;
        assert!(err.to_string().contains("adapter"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "no such file");
        let err: TrifieldError = io_err.into();
        assert!(matches!(err, TrifieldError::ConfigIo(_)));
    }

    #[test]
    fn test_json_error_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: TrifieldError = json_err.into();
        assert!(matches!(err, TrifieldError::ConfigParse(_)));
    }
}
