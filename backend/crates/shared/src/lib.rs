//! Shared Kernel - Domain-crossing minimal core
//!
//! Vocabulary used by both the `auth` and `loyalty` crates:
//! - the unified error type and its HTTP mapping
//! - typed UUID identifiers
//! - the authenticated principal placed in request extensions

pub mod error {
    pub mod app_error;
    pub mod conversions;
    pub mod kind;
}
pub mod id;
pub mod principal;
