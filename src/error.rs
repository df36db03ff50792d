use core::fmt;

use crate::edge_log::{EDGE_CAPACITY, EdgeLog};
use crate::frame::FrameError;

/// Possible errors from a read session.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Debug, PartialEq)]
pub enum DhtError<E, const N: usize = EDGE_CAPACITY> {
    /// The session captured an edge count no frame produces.
    FrameLength {
        /// Edges observed, including any that did not fit the log.
        count: usize,
        /// The stored edge timestamps.
        edges: EdgeLog<N>,
    },
    /// The checksum byte did not match the received data.
    Checksum {
        /// `(b0 + b1 + b2 + b3) & b4`.
        computed: u8,
        /// `b4`.
        reference: u8,
    },
    /// Error from the GPIO pin (input/output).
    PinError(E),
}

impl<E, const N: usize> DhtError<E, N> {
    /// Numeric status of the failure: 1 frame length, 2 checksum, 3 pin.
    ///
    /// A successful read has status 0.
    pub const fn status(&self) -> u8 {
        match self {
            DhtError::FrameLength { .. } => 1,
            DhtError::Checksum { .. } => 2,
            DhtError::PinError(_) => 3,
        }
    }

    /// Whether the sensor did not answer at all.
    pub const fn is_no_response(&self) -> bool {
        matches!(self, DhtError::FrameLength { count: 0, .. })
    }

    /// Lifts a decode failure into a session error.
    pub fn from_frame(err: FrameError<N>) -> Self {
        match err {
            FrameError::Length { count, edges } => DhtError::FrameLength { count, edges },
            FrameError::Checksum {
                computed,
                reference,
            } => DhtError::Checksum {
                computed,
                reference,
            },
        }
    }
}

impl<E, const N: usize> From<E> for DhtError<E, N> {
    fn from(value: E) -> Self {
        Self::PinError(value)
    }
}

impl<E: fmt::Debug, const N: usize> fmt::Display for DhtError<E, N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DhtError::FrameLength { count, .. } => write!(f, "incorrect number of edges: {count}"),
            DhtError::Checksum {
                computed,
                reference,
            } => write!(f, "checksum failed: sum={computed}, reference={reference}"),
            DhtError::PinError(err) => write!(f, "pin error: {err:?}"),
        }
    }
}

#[cfg(feature = "std")]
impl<E: fmt::Debug, const N: usize> std::error::Error for DhtError<E, N> {}
