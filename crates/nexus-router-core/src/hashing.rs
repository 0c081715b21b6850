// crates/nexus-router-core/src/hashing.rs
// ============================================================================
// Module: Canonical JSON Hashing
// Description: RFC 8785 canonical JSON serialization and SHA-256 digests.
// Purpose: Produce byte-stable payloads and identifiers across platforms.
// Dependencies: hex, serde, serde_jcs, serde_json, sha2, thiserror
// ============================================================================

//! ## Overview
//! Canonical JSON (sorted keys, minimal separators) makes hashes and diffs
//! agree across platforms. It is required for the subprocess payload file
//! and for deterministic adapter identifier derivation; storage JSON is
//! merely canonicalized for tidiness and carries no byte-equality guarantee.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use sha2::Digest;
use sha2::Sha256;
use thiserror::Error;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Canonicalization and hashing errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Error)]
pub enum HashError {
    /// The value could not be canonicalized (for example non-finite floats).
    #[error("canonical json error: {0}")]
    Canonicalization(String),
}

// ============================================================================
// SECTION: Algorithms and Digests
// ============================================================================

/// Supported hash algorithms.
///
/// # Invariants
/// - Labels are stable; the set only grows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HashAlgorithm {
    /// SHA-256.
    Sha256,
}

impl HashAlgorithm {
    /// Returns the stable wire label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Sha256 => "sha256",
        }
    }
}

/// Default hash algorithm for Nexus Router identifiers.
pub const DEFAULT_HASH_ALGORITHM: HashAlgorithm = HashAlgorithm::Sha256;

/// Hash digest with its producing algorithm.
///
/// # Invariants
/// - `value` is lowercase hex of the raw digest bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HashDigest {
    /// Algorithm that produced the digest.
    pub algorithm: HashAlgorithm,
    /// Lowercase hex rendering of the digest bytes.
    pub value: String,
}

// ============================================================================
// SECTION: Operations
// ============================================================================

/// Serializes a value as canonical JSON bytes (RFC 8785).
///
/// # Errors
///
/// Returns [`HashError::Canonicalization`] when the value cannot be
/// rendered canonically.
pub fn canonical_json_bytes<T: Serialize>(value: &T) -> Result<Vec<u8>, HashError> {
    serde_jcs::to_vec(value).map_err(|err| HashError::Canonicalization(err.to_string()))
}

/// Hashes raw bytes with the given algorithm.
#[must_use]
pub fn hash_bytes(algorithm: HashAlgorithm, bytes: &[u8]) -> HashDigest {
    match algorithm {
        HashAlgorithm::Sha256 => {
            let digest = Sha256::digest(bytes);
            HashDigest {
                algorithm,
                value: hex::encode(digest),
            }
        }
    }
}

/// Canonicalizes a value and hashes the canonical bytes.
///
/// # Errors
///
/// Returns [`HashError`] when canonicalization fails.
pub fn hash_canonical_json<T: Serialize>(
    algorithm: HashAlgorithm,
    value: &T,
) -> Result<HashDigest, HashError> {
    let bytes = canonical_json_bytes(value)?;
    Ok(hash_bytes(algorithm, &bytes))
}
