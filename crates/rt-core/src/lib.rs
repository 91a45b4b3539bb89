//! rocket-talk/crates/rt-core/src/lib.rs
//!
//! The central domain logic and interface definitions for RocketTalk.

pub mod credentials;
pub mod error;
pub mod guard;
pub mod models;
pub mod traits;
pub mod validation;

// Re-exporting for easier access in other crates
pub use credentials::*;
pub use error::*;
pub use models::*;
pub use traits::*;
