//! Error types for the SLAM core.
//!
//! The filter has no I/O of its own, so the only recoverable failure is a
//! contract violation by the caller. Degenerate-math conditions (weight
//! underflow, near-zero predicted distances) are handled internally and never
//! surface as errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SlamError {
    /// An observation for a confirmed landmark was routed to a particle
    /// whose landmark map does not contain it. This means the confirmed-id
    /// bookkeeping and the per-particle maps have diverged, which is a logic
    /// error rather than a transient condition.
    #[error("landmark `{id}` is marked confirmed but missing from a particle's landmark map")]
    UnknownLandmark { id: String },
}
