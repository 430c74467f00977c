//! Infrastructure Layer
//!
//! User stores and the session cache.

#[cfg(any(test, feature = "testing"))]
pub mod memory;
pub mod postgres;
pub mod session_cache;

#[cfg(any(test, feature = "testing"))]
pub use memory::InMemoryUserRepository;
pub use postgres::PgUserRepository;
pub use session_cache::SessionCache;
