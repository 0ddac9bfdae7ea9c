//! Error types and the accumulating error log

use core::fmt;

use thiserror::Error;

use crate::codec::Quantity;

/// Result code returned by a successful open
pub const SUCCESS: i32 = 0;

/// A physical value outside of what the hardware can represent
#[derive(Debug, Error, Clone, Copy, PartialEq)]
#[error("{quantity} {value} is outside of [{min}, {max}]")]
pub struct OutOfRange {
    pub quantity: Quantity,
    pub value: f64,
    pub min: f64,
    pub max: f64,
}

/// Reasons a bridge could not be attached
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ConnectError {
    #[error("failed to initialise the USB context")]
    Init,
    #[error("no matching device was found")]
    NotFound,
    #[error("the device is already in use")]
    Busy,
}

impl ConnectError {
    /// Numeric result code, for callers that report open results as integers
    pub const fn code(self) -> i32 {
        match self {
            ConnectError::Init => -1,
            ConnectError::NotFound => -2,
            ConnectError::Busy => -3,
        }
    }
}

/// Errors from a device session, generic over the bridge error
#[derive(Debug, Error)]
pub enum Error<E> {
    #[error(transparent)]
    OutOfRange(#[from] OutOfRange),
    #[error("bridge error: {0}")]
    Bridge(E),
    #[error("device is not open")]
    NotOpen,
}

/// Running count and text of every bridge failure seen by a session
///
/// Failures land here even when the operation that hit them carries on.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ErrorLog {
    messages: Vec<String>,
}

impl ErrorLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn messages(&self) -> &[String] {
        &self.messages
    }

    pub fn push(&mut self, message: impl Into<String>) {
        self.messages.push(message.into());
    }
}

impl fmt::Display for ErrorLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for msg in &self.messages {
            writeln!(f, "{msg}")?;
        }
        Ok(())
    }
}
