// ===== Types and Structures =====

use core::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SdError {
    Timeout,
    Crc,
    InvalidArgument,
    InvalidState,
    TransferFailure,
    Inconsistent,
    Busy,
    MemoryError,
}

impl SdError {
    /// Errors after which the command and DMA engines must be stopped
    /// before the next request.
    pub fn needs_reset(&self) -> bool {
        matches!(self, SdError::Timeout | SdError::TransferFailure | SdError::Crc)
    }
}

impl fmt::Display for SdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SdError::Timeout => write!(f, "Command timeout error"),
            SdError::Crc => write!(f, "CRC error"),
            SdError::InvalidArgument => write!(f, "Invalid argument"),
            SdError::InvalidState => write!(f, "Card not present"),
            SdError::TransferFailure => write!(f, "Transfer failed"),
            SdError::Inconsistent => write!(f, "Register readback mismatch"),
            SdError::Busy => write!(f, "Controller busy"),
            SdError::MemoryError => write!(f, "DMA memory error"),
        }
    }
}
