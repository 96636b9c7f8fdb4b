use thiserror::Error;

use crate::{Pin, PinMode, PullResistance, TransportError};

/// Errors returned by providers.
///
/// Everything except [`Error::Transport`] and [`Error::ConversionUnavailable`] is a violation of
/// the calling contract and will fail the same way when retried.
#[derive(Debug, Error)]
pub enum Error {
    #[error("pin {0} is not provided by this expander")]
    InvalidPin(Pin),
    #[error("cannot {operation} pin {pin} while it is in {mode} mode")]
    InvalidMode {
        pin: Pin,
        mode: PinMode,
        operation: &'static str,
    },
    #[error("pin {pin} does not support {mode} mode")]
    UnsupportedMode { pin: Pin, mode: PinMode },
    #[error("pin {pin} does not support {resistance} resistance")]
    UnsupportedResistance {
        pin: Pin,
        resistance: PullResistance,
    },
    #[error("register transport failed: {0}")]
    Transport(#[from] TransportError),
    #[error("no valid conversion available for pin {0}")]
    ConversionUnavailable(Pin),
}

pub type Result<T> = core::result::Result<T, Error>;
