//! Error taxonomy shared across the crate.
//!
//! Each variant maps to one row of the error taxonomy in the design doc:
//! transient bus failures warn-log and self-heal next tick, protocol
//! violations drop-and-count, guard rejections debug-log, and the two
//! fatal cases (`Error::ConfigViolation`, boot validation; unknown HSM
//! leaf) panic before or during a tick rather than propagating.

#[cfg(feature = "mcu")]
use defmt::Format;

/// Failure reading or writing the field bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "mcu", derive(Format))]
pub enum BusError {
    /// The transaction did not complete within the bus timeout.
    Timeout,
    /// The responding board returned a malformed frame (bad length, bad
    /// function code, CRC mismatch - opaque to this crate).
    MalformedResponse,
    /// The addressed slave id is not one this crate was configured with.
    UnknownSlave,
}

/// Failure on the radio link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "mcu", derive(Format))]
pub enum RadioError {
    /// The modem reported a transmit failure.
    SendFailed,
    /// No frame was ready to receive (not a real error; callers treat
    /// this as "nothing to do" rather than logging it).
    NoFrame,
}

/// Failure packing or unpacking a 128-byte radio packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "mcu", derive(Format))]
pub enum PacketError {
    /// `packet_version` was not 1.
    UnsupportedVersion(u8),
    /// `command_id` fell outside `[1, 14]`.
    InvalidCommandId(u8),
    /// The payload did not decode into the shape `command_id` implies.
    MalformedPayload,
}

/// The EventBus's two failure modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "mcu", derive(Format))]
pub enum BusFault {
    /// `read()` was called on a channel that has never been published to.
    Stale,
    /// An observer's work queue was saturated; the value was stored, but
    /// that observer will only see it as "the latest" on its next wake.
    BusFull,
}
