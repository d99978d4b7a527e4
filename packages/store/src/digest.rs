//! # Content digests for change detection
//!
//! A [`Digest`] is the SHA-1 of a stored value. Live views keep the digest of
//! the value they last decoded; the poll fallback re-reads the slot and only
//! re-decodes (and publishes a new snapshot) when the digest moved. This keeps
//! a two-second poll cheap even for large collections.
//!
//! The absence of a value has its own digest ([`Digest::of_slot`] with `None`)
//! so "slot deleted" is observed as a change as well.

use sha1::{Digest as _, Sha1};

/// A 20-byte SHA-1 hash of a stored value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Digest(pub [u8; 20]);

impl Digest {
    /// Hash raw bytes.
    pub fn of(data: &[u8]) -> Self {
        let mut hasher = Sha1::new();
        hasher.update(data);
        let result = hasher.finalize();
        let mut bytes = [0u8; 20];
        bytes.copy_from_slice(&result);
        Digest(bytes)
    }

    /// Hash an optional slot value; an absent slot hashes like a tagged empty value.
    pub fn of_slot(value: Option<&str>) -> Self {
        match value {
            Some(raw) => {
                let mut tagged = Vec::with_capacity(raw.len() + 1);
                tagged.push(b'+');
                tagged.extend_from_slice(raw.as_bytes());
                Self::of(&tagged)
            }
            None => Self::of(b"-"),
        }
    }
}
