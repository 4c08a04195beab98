//! Roadmap core: tolerant plan decoding, plan normalization, milestone
//! progress, and the service layer tying them to a row store.

pub mod plan;
pub mod progress;
pub mod service;
pub mod store;
