//! Host-link transport abstraction.
//!
//! The transport delivers whole command frames: USB CDC hands over one
//! bulk packet at a time, so framing is already resolved by the time
//! bytes reach the protocol layer. Concrete implementations:
//!
//! - USB CDC / UART bridge on target (see `adapters::esp`)
//! - in-memory mock in tests
//!
//! The protocol engine is generic over `FrameLink`, so adding a new
//! transport requires zero changes to the command handling.

/// Whole-frame host link.
pub trait FrameLink {
    /// Error type for this transport.
    type Error: core::fmt::Debug;

    /// Fetch the next pending frame into `buf`, if any.
    ///
    /// Returns `Ok(Some(len))` with the frame length when a frame was
    /// pending, `Ok(None)` otherwise. Never blocks.
    fn poll_frame(&mut self, buf: &mut [u8]) -> Result<Option<usize>, Self::Error>;

    /// Send one reply frame.
    fn send_frame(&mut self, data: &[u8]) -> Result<(), Self::Error>;
}

/// A null link that never receives and discards all replies. Useful as a
/// default when no HMI is connected.
pub struct NullLink;

impl FrameLink for NullLink {
    type Error = ();

    fn poll_frame(&mut self, _buf: &mut [u8]) -> Result<Option<usize>, ()> {
        Ok(None)
    }

    fn send_frame(&mut self, _data: &[u8]) -> Result<(), ()> {
        Ok(())
    }
}
