//! This crate provides deterministic canonicalization of [RDF] datasets,
//! implementing the [URDNA2015] algorithm
//! (Universal RDF Dataset Normalization Algorithm, 2015).
//!
//! Canonicalization assigns stable labels (`_:c14n0`, `_:c14n1`, ...) to the
//! blank nodes of a dataset and serializes the result as sorted canonical
//! [N-Quads]: two isomorphic datasets yield byte-identical output,
//! which makes the output suitable as input to cryptographic hashing and
//! digital signatures over RDF data.
//!
//! The highest-level entry point is [`canonize`]:
//!
//! ```
//! use rdf_c14n::term::{Quad, Term, XSD_STRING};
//! use rdf_c14n::{canonize, CanonizeOptions};
//!
//! let dataset = vec![Quad::new(
//!     Term::bnode("x"),
//!     Term::iri("http://example.org/p"),
//!     Term::literal("v", XSD_STRING),
//! )];
//! let canonical = canonize(&dataset, &CanonizeOptions::urdna2015())?;
//! assert_eq!(canonical, "_:c14n0 <http://example.org/p> \"v\" .\n");
//! # Ok::<(), rdf_c14n::C14nError>(())
//! ```
//!
//! Lower-level entry points ([`urdna2015::normalize`],
//! [`urdna2015::relabel`]) expose the relabeled quads and the
//! blank-node identifier map, and allow substituting the hash function.
//!
//! [RDF]: https://www.w3.org/TR/rdf11-concepts/
//! [URDNA2015]: https://json-ld.github.io/rdf-dataset-canonicalization/spec/
//! [N-Quads]: https://www.w3.org/TR/n-quads/
#![deny(missing_docs)]

mod _permutation;
pub mod hash;
pub mod nquads;
pub mod term;
pub mod urdna2015;

use thiserror::Error;

use crate::hash::{HashFunction, Sha256};
use crate::term::Quad;

/// Error raised while canonicalizing a dataset.
#[derive(Debug, Error)]
pub enum C14nError {
    /// No canonicalization algorithm was specified in the options.
    #[error("no canonicalization algorithm was specified")]
    MissingAlgorithm,
    /// The requested canonicalization algorithm is not supported.
    #[error("invalid canonicalization algorithm: {0:?}")]
    InvalidAlgorithm(String),
    /// The configured deep-iteration cap was exceeded.
    ///
    /// This aborts canonicalizations whose cost explodes combinatorially,
    /// which only happens on contrived datasets (large cycles or cliques of
    /// undistinguishable blank nodes).
    #[error("exceeded the limit of {0} deep iterations")]
    DeepIterationsExceeded(usize),
    /// A quad contains a term that cannot be serialized in its position.
    #[error("cannot serialize quad: {0}")]
    Serialization(String),
    /// An internal invariant of the algorithm was violated.
    /// This is never expected to occur, and indicates a bug in this crate.
    #[error("internal invariant violated: {0}")]
    InternalInvariant(String),
    /// The output writer failed.
    #[error("error raised by the output writer")]
    Io(#[from] std::io::Error),
}

/// Options recognized by [`canonize`] and [`canonize_with`].
#[derive(Clone, Debug, Default)]
pub struct CanonizeOptions {
    /// Name of the canonicalization algorithm to apply.
    ///
    /// Required; the only supported value is `"URDNA2015"`.
    pub algorithm: Option<String>,
    /// Cap on the number of deep (recursive) hashing iterations;
    /// `None` means unbounded.
    ///
    /// A value of `1` is recommended when canonicalizing untrusted input.
    pub max_deep_iterations: Option<usize>,
}

impl CanonizeOptions {
    /// Options selecting URDNA2015 with its default settings.
    pub fn urdna2015() -> Self {
        CanonizeOptions {
            algorithm: Some("URDNA2015".to_string()),
            max_deep_iterations: None,
        }
    }
}

/// Canonicalize `dataset` with the algorithm selected by `options`,
/// using SHA-256.
///
/// Returns the canonical N-Quads document:
/// the sorted, `\n`-terminated lines of the relabeled dataset.
pub fn canonize(dataset: &[Quad], options: &CanonizeOptions) -> Result<String, C14nError> {
    canonize_with::<Sha256>(dataset, options)
}

/// Canonicalize `dataset` with the algorithm selected by `options`,
/// using the [hash function](HashFunction) `H` instead of SHA-256.
///
/// Substituting the hash function produces a different (but equally
/// deterministic) canonical form.
pub fn canonize_with<H: HashFunction>(
    dataset: &[Quad],
    options: &CanonizeOptions,
) -> Result<String, C14nError> {
    match options.algorithm.as_deref() {
        None => Err(C14nError::MissingAlgorithm),
        Some("URDNA2015") => {
            let (quads, _) = urdna2015::relabel_with::<H>(dataset, options.max_deep_iterations)?;
            Ok(urdna2015::sorted_nquad_lines(&quads)?.concat())
        }
        Some(other) => Err(C14nError::InvalidAlgorithm(other.to_string())),
    }
}

#[cfg(test)]
pub(crate) fn test_setup() {
    let _ = env_logger::builder().is_test(true).try_init();
}
