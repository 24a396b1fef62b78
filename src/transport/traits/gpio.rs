//! GPIO pin-pair interface
//!
//! A loopback GPIO test drives one pin of an externally tied pair and
//! samples the other. The pair is modeled as a single resource because
//! the two pins are only ever useful together and direction changes
//! must reconfigure both sides atomically.

use crate::error::Result;

/// Output driver mode for the driving pin
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum GpioDrive {
    /// Push-pull output
    PushPull,
    /// Open-drain output (requires external pull-up on the wire)
    OpenDrain,
}

/// Which pin of the pair drives and which samples
///
/// A full bidirectional check is two plan entries, one per direction,
/// matching the separate phases of the factory GPIO script.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PairDirection {
    /// Pin A drives, pin B samples
    AToB,
    /// Pin B drives, pin A samples
    BToA,
}

/// GPIO pin-pair interface
///
/// # Safety Invariants
///
/// - Only one owner per pair instance
/// - `drive`/`sense` are only valid after `configure`
/// - `set_inert` must leave both pins high-impedance and is safe to
///   call in any state
pub trait PinPair {
    /// Configure the pair: the driving side as an output in `drive`
    /// mode, the sampling side as a floating input
    ///
    /// # Errors
    ///
    /// Returns `ChannelError::Unavailable` if the pins cannot be
    /// claimed or configured.
    fn configure(&mut self, drive: GpioDrive, direction: PairDirection) -> Result<()>;

    /// Drive the output side to the given logic level
    ///
    /// # Errors
    ///
    /// Returns an error if the pair is not configured.
    fn drive(&mut self, level: bool) -> Result<()>;

    /// Sample the input side
    ///
    /// # Errors
    ///
    /// Returns an error if the pair is not configured.
    fn sense(&self) -> Result<bool>;

    /// Return both pins to a high-impedance, non-driving state
    ///
    /// Idempotent; called on release regardless of test outcome.
    fn set_inert(&mut self);
}
