//! Message digest abstraction used by the canonicalization algorithm.

use sha2::Digest;
use std::fmt::Write;

/// Abstraction of the hash function driving canonical labeling.
///
/// [`initialize`](HashFunction::initialize) must return an independent,
/// freshly-seeded instance: the algorithm creates one digest per hash
/// computation, and concurrent canonicalizations must never share digest
/// state.
///
/// The generic `H: HashFunction` parameter of the entry points acts as the
/// digest factory: substituting anything else than [`Sha256`] yields a
/// *different* canonical form, which is intentional (e.g. keyed digests for
/// HMAC-based selective disclosure).
pub trait HashFunction {
    /// Output of the hash function; usually `[u8; N]`.
    type Output: AsRef<[u8]> + Copy + Eq + Ord;

    /// Start the computation of a hash.
    fn initialize() -> Self;

    /// Update internal state by hashing `data`.
    fn update(&mut self, data: impl AsRef<[u8]>);

    /// Return the hash.
    fn finalize(self) -> Self::Output;
}

/// The [SHA-256](https://en.wikipedia.org/wiki/SHA-2) [`HashFunction`],
/// the default for URDNA2015.
pub struct Sha256(sha2::Sha256);

impl HashFunction for Sha256 {
    type Output = [u8; 32];

    fn initialize() -> Self {
        Sha256(sha2::Sha256::new())
    }

    fn update(&mut self, data: impl AsRef<[u8]>) {
        self.0.update(data.as_ref());
    }

    fn finalize(self) -> Self::Output {
        self.0.finalize().into()
    }
}

/// The [SHA-384](https://en.wikipedia.org/wiki/SHA-2) [`HashFunction`].
pub struct Sha384(sha2::Sha384);

impl HashFunction for Sha384 {
    type Output = [u8; 48];

    fn initialize() -> Self {
        Sha384(sha2::Sha384::new())
    }

    fn update(&mut self, data: impl AsRef<[u8]>) {
        self.0.update(data.as_ref());
    }

    fn finalize(self) -> Self::Output {
        self.0.finalize().into()
    }
}

/// Lowercase hex rendering of a hash, as fed into nested digests and paths.
///
/// Note that comparing two equal-width hashes byte-wise is equivalent to
/// comparing their hex renderings, so ordered maps keyed by raw hashes
/// iterate in hex order.
pub(crate) fn hex(hash: &impl AsRef<[u8]>) -> String {
    let mut digest = String::with_capacity(2 * hash.as_ref().len());
    for b in hash.as_ref() {
        write!(&mut digest, "{b:02x}").unwrap();
    }
    digest
}
