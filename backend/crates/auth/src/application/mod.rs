//! Application Layer
//!
//! Use cases and application services.

pub mod check_session;
pub mod config;
pub mod register;
pub mod session;
pub mod sign_in;

// Re-exports
pub use check_session::CheckSessionUseCase;
pub use config::AuthConfig;
pub use register::{RegisterInput, RegisterUseCase};
pub use session::SessionOutput;
pub use sign_in::{SignInInput, SignInUseCase};
