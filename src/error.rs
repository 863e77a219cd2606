use thiserror::Error;

/// Failures reported by the hardware seams
#[derive(Debug, Error)]
pub enum HalError {
    #[error("Sensor read failed: {0}")]
    Sensor(String),

    #[error("Serial I/O failed: {0}")]
    Serial(String),

    #[error("Peripheral unavailable: {0}")]
    Unavailable(String),
}

pub type Result<T> = std::result::Result<T, HalError>;

impl HalError {
    /// Check if this error means the peripheral was never brought up
    pub fn is_unavailable(&self) -> bool {
        matches!(self, HalError::Unavailable(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_is_unavailable() {
        assert!(HalError::Unavailable("uart".into()).is_unavailable());
        assert!(!HalError::Serial("framing".into()).is_unavailable());
    }

    #[test]
    fn test_error_display() {
        let err = HalError::Sensor("i2c nack".into());
        assert_eq!(err.to_string(), "Sensor read failed: i2c nack");
    }
}
