//! Qanda Applications - question answering on top of the core seams
//!
//! - [`relay`]: forwards generated fragments to a consumer while accumulating
//!   the complete answer, and persists it exactly once
//! - [`service`]: the facade used by the web and CLI front-ends
//!
//! ## Architecture
//!
//! - **Core** (qanda-core): types, traits, errors, configuration
//! - **Providers** (qanda-llm, qanda-store): generation and persistence
//! - **Applications** (this crate): relay and query service
//! - **Presentation** (qanda-web/cli): user interfaces

pub mod relay;
pub mod service;

pub use relay::{drive, error_marker, RelayOutcome, RelayStream, StreamRelay};
pub use service::{Answer, DeliveryMode, QueryService};
