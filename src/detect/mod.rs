//! Fingerprinting and change detection

pub mod detector;
pub mod fingerprint;

pub use detector::{detect, Detection, StateUpdate};
pub use fingerprint::fingerprint;
