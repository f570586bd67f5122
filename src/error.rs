//! Error types shared by the torch, tile and dispatch layers.
//!
//! Every fallible operation returns one of these as a typed result. Messages
//! coming from the host are copied into fixed-capacity strings so errors stay
//! `Clone` and never allocate.

use heapless::String;

/// Capacity of a diagnostic message carried by an error.
pub const FAULT_MESSAGE_LEN: usize = 64;

/// Bounded diagnostic message.
pub type FaultMessage = String<FAULT_MESSAGE_LEN>;

/// Copy `message` into a [`FaultMessage`], dropping whatever does not fit.
pub(crate) fn truncated(message: &str) -> FaultMessage {
    let mut out = FaultMessage::new();
    for ch in message.chars() {
        if out.push(ch).is_err() {
            break;
        }
    }
    out
}

/// Failure reported by a [`TorchDevice`](crate::TorchDevice) call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct HardwareFault {
    message: FaultMessage,
}

impl HardwareFault {
    /// Create a fault from a platform message, truncating it if needed.
    pub fn new(message: &str) -> Self {
        Self {
            message: truncated(message),
        }
    }

    /// Underlying platform message, truncated to [`FAULT_MESSAGE_LEN`] bytes.
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Torch control error
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TorchError {
    /// The device has no usable flash unit.
    #[error("flash not available")]
    Unavailable,
    /// The platform call failed.
    #[error("torch hardware fault: {0}")]
    HardwareFault(#[from] HardwareFault),
}

impl TorchError {
    /// Stable error code reported to the application shell
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Unavailable => "UNAVAILABLE",
            Self::HardwareFault(_) => "TORCH_ERROR",
        }
    }
}

/// Key-value persistence error.
///
/// Never fatal: readers fall back to their default state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// No store is attached, or the backend refused the access.
    #[error("persistence store unavailable")]
    Unavailable,
    /// The in-memory store has no free slot or the key is too long.
    #[error("persistence store full")]
    Full,
}

/// Failure reported by a [`HostShell`](crate::HostShell) call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct ShellError {
    message: FaultMessage,
}

impl ShellError {
    /// Create a shell error from a platform message, truncating it if needed.
    pub fn new(message: &str) -> Self {
        Self {
            message: truncated(message),
        }
    }

    /// Message reported by the host.
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Error returned by [`Dispatcher`](crate::Dispatcher) for a single command.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DispatchError {
    #[error(transparent)]
    Torch(#[from] TorchError),
    /// Neither the quick settings panel nor the settings app could be opened.
    #[error("could not open settings: {0}")]
    OpenSettings(ShellError),
    /// Unknown channel or method.
    #[error("method not implemented")]
    NotImplemented,
}

impl DispatchError {
    /// Stable error code reported to the application shell
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Torch(err) => err.code(),
            Self::OpenSettings(_) => "OPEN_SETTINGS_ERROR",
            Self::NotImplemented => "NOT_IMPLEMENTED",
        }
    }
}
