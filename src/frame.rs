//! Turns captured falling-edge timestamps into a checked 5-byte frame.
//!
//! The sensor starts every bit with a low pulse of fixed length and encodes
//! the bit value in the length of the following high pulse, so the spacing
//! between consecutive falling edges is short for a 0 and long for a 1.

use core::fmt;
use core::time::Duration;

use crate::clock::Timestamp;
use crate::edge_log::{EDGE_CAPACITY, EdgeLog};

/// Bits in one frame.
pub const FRAME_BITS: usize = 40;

/// Bytes in one frame, checksum included.
pub const FRAME_BYTES: usize = FRAME_BITS / 8;

/// Edge counts a complete frame can produce: one edge per bit boundary,
/// optionally preceded by the sensor's acknowledge pulse.
const FRAME_EDGES: usize = FRAME_BITS + 1;
const FRAME_EDGES_WITH_ACK: usize = FRAME_BITS + 2;

/// Why a captured session could not be turned into a valid frame.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Debug, PartialEq)]
pub enum FrameError<const N: usize = EDGE_CAPACITY> {
    /// The session saw a number of edges no frame produces.
    Length {
        /// Edges observed.
        count: usize,
        /// The edges that were stored.
        edges: EdgeLog<N>,
    },
    /// The checksum byte does not match the payload.
    Checksum {
        /// `(b0 + b1 + b2 + b3) & b4`.
        computed: u8,
        /// `b4`.
        reference: u8,
    },
}

impl<const N: usize> fmt::Display for FrameError<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FrameError::Length { count, .. } => write!(f, "incorrect number of edges: {count}"),
            FrameError::Checksum {
                computed,
                reference,
            } => write!(
                f,
                "checksum failed: sum={computed}, reference={reference}"
            ),
        }
    }
}

#[cfg(feature = "std")]
impl<const N: usize> std::error::Error for FrameError<N> {}

/// The 40 decoded bits, in arrival order.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BitFrame([bool; FRAME_BITS]);

impl BitFrame {
    /// Classifies the 40 intervals between 41 consecutive edges.
    ///
    /// Returns `None` unless exactly 41 edges are given.
    pub fn from_edges(edges: &[Timestamp], threshold: Duration) -> Option<Self> {
        if edges.len() != FRAME_EDGES {
            return None;
        }

        let threshold = threshold.as_secs_f64();
        let mut bits = [false; FRAME_BITS];
        for (bit, pair) in bits.iter_mut().zip(edges.windows(2)) {
            *bit = pair[1] - pair[0] >= threshold;
        }
        Some(BitFrame(bits))
    }

    /// The bits, earliest first.
    pub const fn bits(&self) -> &[bool; FRAME_BITS] {
        &self.0
    }
}

/// Five frame bytes: humidity (2), temperature (2), checksum.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ByteFrame([u8; FRAME_BYTES]);

impl From<BitFrame> for ByteFrame {
    /// Packs groups of 8 bits, most significant bit first.
    fn from(bits: BitFrame) -> Self {
        let mut bytes = [0u8; FRAME_BYTES];
        for (byte, group) in bytes.iter_mut().zip(bits.0.chunks_exact(8)) {
            for (i, &bit) in group.iter().enumerate() {
                if bit {
                    *byte |= 1 << (7 - i);
                }
            }
        }
        ByteFrame(bytes)
    }
}

impl ByteFrame {
    /// Wraps raw bytes without checking them.
    pub const fn from_bytes(bytes: [u8; FRAME_BYTES]) -> Self {
        ByteFrame(bytes)
    }

    /// The raw bytes.
    pub const fn bytes(&self) -> &[u8; FRAME_BYTES] {
        &self.0
    }

    /// The checksum byte.
    pub const fn checksum(&self) -> u8 {
        self.0[4]
    }

    /// `(b0 + b1 + b2 + b3) & b4`, computed without wrapping.
    pub fn computed_checksum(&self) -> u8 {
        let [b0, b1, b2, b3, reference] = self.0;
        let sum = u16::from(b0) + u16::from(b1) + u16::from(b2) + u16::from(b3);
        // masked by a u8, so it fits
        (sum & u16::from(reference)) as u8
    }

    /// Accepts the frame when every checksum bit is also set in the payload sum.
    ///
    /// This is an AND test, not the usual modular sum equality.
    pub fn verify<const N: usize>(self) -> Result<Self, FrameError<N>> {
        let computed = self.computed_checksum();
        let reference = self.checksum();
        if computed == reference {
            Ok(self)
        } else {
            Err(FrameError::Checksum {
                computed,
                reference,
            })
        }
    }

    /// Decodes a captured session into a checked frame.
    ///
    /// Exactly 41 or 42 edges are accepted. With 42 the first edge is the
    /// sensor's acknowledge pulse and is skipped.
    pub fn decode<const N: usize>(
        edges: &EdgeLog<N>,
        threshold: Duration,
    ) -> Result<Self, FrameError<N>> {
        let count = edges.count();
        let offset = match count {
            FRAME_EDGES => 0,
            FRAME_EDGES_WITH_ACK => 1,
            _ => return Err(FrameError::Length { count, edges: *edges }),
        };

        // fewer slots than edges: the log could not hold the frame
        let stored = edges.timestamps();
        let Some(frame_edges) = stored.get(offset..count) else {
            return Err(FrameError::Length { count, edges: *edges });
        };

        let bits = BitFrame::from_edges(frame_edges, threshold)
            .ok_or_else(|| FrameError::Length { count, edges: *edges })?;

        ByteFrame::from(bits).verify()
    }
}
