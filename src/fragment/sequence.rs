//! One-based fragment positioning within logical messages.
//!
//! Provides [`SequenceNumber`], a type-safe wrapper around `u32` that refuses
//! zero and offers overflow-safe increments for numbering fragments.

use std::num::NonZeroU32;

use derive_more::Display;

/// One-based ordinal describing a fragment's position within its message.
///
/// # Examples
///
/// ```
/// use relayhttp::fragment::SequenceNumber;
/// let seq = SequenceNumber::new(3).expect("non-zero");
/// assert_eq!(seq.get(), 3);
/// assert_eq!(SequenceNumber::first().get(), 1);
/// assert!(SequenceNumber::new(0).is_none());
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Display)]
#[display("{_0}")]
pub struct SequenceNumber(NonZeroU32);

impl SequenceNumber {
    /// Construct a sequence number, returning `None` for zero.
    #[must_use]
    pub const fn new(value: u32) -> Option<Self> {
        match NonZeroU32::new(value) {
            Some(value) => Some(Self(value)),
            None => None,
        }
    }

    /// Return the first sequence number of every message.
    #[must_use]
    pub const fn first() -> Self { Self(NonZeroU32::MIN) }

    /// Return the underlying numeric value.
    #[must_use]
    pub const fn get(self) -> u32 { self.0.get() }

    /// Increment the sequence number, returning `None` on overflow.
    #[must_use]
    pub fn checked_increment(self) -> Option<Self> { self.0.checked_add(1).map(Self) }
}

impl From<SequenceNumber> for u32 {
    fn from(value: SequenceNumber) -> Self { value.get() }
}
