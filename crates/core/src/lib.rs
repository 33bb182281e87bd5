//! Shared types for the Hall of Fame admin client.
//!
//! Holds the handful of types every layer agrees on ([`types::RecordId`],
//! [`types::SessionUser`]) and the response-envelope normalizer
//! ([`envelope::extract_records`]) that papers over the backend's
//! inconsistent list wrapping.

pub mod envelope;
pub mod types;
