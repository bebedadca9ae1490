//! Reproducibility fingerprints.
//!
//! Symbol numbering must be reproducible: the same context and the same
//! sequence of matrix-creation calls yield the same ids. A [`Fingerprint`] is
//! the SHA-256 of a structure's CBOR encoding, tagged with what was encoded,
//! so that property can be checked with one comparison.
//!
//! # Citations
//! - SHA-256: NIST FIPS 180-4 (2015)
//! - CBOR: RFC 8949 (2020)

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// What a fingerprint was taken of.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FingerprintDomain {
    /// Entries of a [`crate::symbols::SymbolTable`].
    SymbolTable,
    /// A [`crate::system::MatrixSystem`]'s symbols and matrices.
    MatrixSystem,
}

impl FingerprintDomain {
    fn tag(self) -> &'static [u8] {
        match self {
            Self::SymbolTable => b"npa-moment/symbol-table/0",
            Self::MatrixSystem => b"npa-moment/matrix-system/0",
        }
    }
}

/// SHA-256 of a tagged CBOR payload.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Fingerprint([u8; 32]);

impl Fingerprint {
    /// Fingerprint of `payload` under `domain`.
    ///
    /// # Panics
    /// If `payload` cannot be encoded as CBOR; every payload in this crate can.
    pub fn of<T: Serialize + ?Sized>(domain: FingerprintDomain, payload: &T) -> Self {
        let bytes = serde_cbor::to_vec(&payload).expect("fingerprint payload should serialize to CBOR");
        let tag = domain.tag();
        let mut hasher = Sha256::new();
        hasher.update((tag.len() as u64).to_le_bytes());
        hasher.update(tag);
        hasher.update(&bytes);
        Self(hasher.finalize().into())
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.iter().try_for_each(|byte| write!(f, "{byte:02x}"))
    }
}

/// Eight leading hex digits; enough to tell runs apart in logs.
impl fmt::Debug for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fingerprint(")?;
        self.0[..4].iter().try_for_each(|byte| write!(f, "{byte:02x}"))?;
        write!(f, "…)")
    }
}
