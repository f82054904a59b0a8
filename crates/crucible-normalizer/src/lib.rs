//! Crucible Claim Normalizer
//!
//! Converts free-form claim text into a [`StructuredClaim`]: type, position,
//! reasoning steps, conclusion, cited display ids, and keywords.
//!
//! Normalization never fails. The primary path reads the labeled claim
//! format (CLAIM TYPE / POSITION / STEP n / CONCLUSION / CITATIONS /
//! KEYWORDS); an optional LLM-assisted path extracts JSON through a
//! completion provider; and a deterministic sentence heuristic backstops
//! both, because downstream validation depends on having *some* structure to
//! inspect.

#![warn(missing_docs)]

mod normalizer;


pub use normalizer::Normalizer;
