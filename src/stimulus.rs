//! Deterministic stimulus pattern generation
//!
//! Every loopback test probes its channel with a pattern from a small
//! fixed catalog. Generation is pure: the same `(kind, len)` pair always
//! yields a bit-identical pattern, so a failing run can be reproduced
//! exactly from its test plan.

use core::fmt;
use heapless::Vec;

/// Maximum pattern length in units (bytes or levels)
///
/// Sized for the largest transfer any supported channel accepts
/// (BLE echo payloads cap out below this).
pub const MAX_PATTERN_LEN: usize = 256;

/// Replacement seed when a caller passes 0
///
/// xorshift has a fixed point at zero, so a zero seed would generate an
/// all-zero pattern indistinguishable from `AllZeros`.
const SEED_FALLBACK: u32 = 0xB0A2_D7E5;

/// The fixed catalog of stimulus pattern kinds
///
/// Byte channels see the values as-is; level channels (GPIO pairs) use
/// the LSB of each unit, which all four kinds keep meaningful:
/// `Alternating` alternates its LSB across consecutive units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PatternKind {
    /// Every unit 0x00 (all lines low)
    AllZeros,
    /// Every unit 0xFF (all lines high)
    AllOnes,
    /// 0x55/0xAA alternation: adjacent bits differ within each byte and
    /// the LSB flips between consecutive units
    Alternating,
    /// Deterministic xorshift32 fill from the embedded seed
    PseudoRandom(u32),
}

/// Pattern generation errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PatternError {
    /// Requested length is zero or exceeds [`MAX_PATTERN_LEN`]
    InvalidLength {
        /// The rejected length
        requested: usize,
    },
}

impl fmt::Display for PatternError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PatternError::InvalidLength { requested } => write!(
                f,
                "invalid pattern length {} (must be 1..={})",
                requested, MAX_PATTERN_LEN
            ),
        }
    }
}

/// A generated stimulus payload
///
/// Immutable once generated; retains the kind that produced it so a
/// result record is self-describing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pattern {
    kind: PatternKind,
    data: Vec<u8, MAX_PATTERN_LEN>,
}

impl Pattern {
    /// The kind this pattern was generated from
    pub fn kind(&self) -> PatternKind {
        self.kind
    }

    /// Pattern payload
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Pattern length in units
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the pattern is empty (never true for generated patterns)
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Serializable request for a pattern: what to generate, not the data
///
/// This is the shape carried by a test plan; all fields are primitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PatternSpec {
    /// Which catalog entry to generate
    pub kind: PatternKind,
    /// Pattern length in units (bytes or levels)
    pub len: usize,
}

impl PatternSpec {
    /// Generate the pattern this spec describes
    pub fn generate(&self) -> core::result::Result<Pattern, PatternError> {
        generate(self.kind, self.len)
    }
}

/// Generate a stimulus pattern
///
/// Deterministic: identical arguments always produce bit-identical
/// output. Length bounds are checked here; bounds against a specific
/// channel's capability are the caller's responsibility.
///
/// # Errors
///
/// Returns `PatternError::InvalidLength` if `len` is zero or exceeds
/// [`MAX_PATTERN_LEN`].
pub fn generate(kind: PatternKind, len: usize) -> core::result::Result<Pattern, PatternError> {
    if len == 0 || len > MAX_PATTERN_LEN {
        return Err(PatternError::InvalidLength { requested: len });
    }

    let mut data = Vec::new();
    match kind {
        PatternKind::AllZeros => {
            for _ in 0..len {
                let _ = data.push(0x00);
            }
        }
        PatternKind::AllOnes => {
            for _ in 0..len {
                let _ = data.push(0xFF);
            }
        }
        PatternKind::Alternating => {
            for i in 0..len {
                let _ = data.push(if i % 2 == 0 { 0x55 } else { 0xAA });
            }
        }
        PatternKind::PseudoRandom(seed) => {
            let mut state = if seed == 0 { SEED_FALLBACK } else { seed };
            for _ in 0..len {
                state = xorshift32(state);
                let _ = data.push((state & 0xFF) as u8);
            }
        }
    }

    Ok(Pattern { kind, data })
}

/// One step of the xorshift32 sequence (Marsaglia 2003)
fn xorshift32(mut state: u32) -> u32 {
    state ^= state << 13;
    state ^= state >> 17;
    state ^= state << 5;
    state
}
