//! Platform Crate - Technical Infrastructure
//!
//! Shared technical foundations with no business meaning:
//! - Cryptographic utilities (HMAC-SHA256, Base64, random keys)
//! - Password hashing (Argon2id)
//! - Session credential transport (cookies, bearer headers)

pub mod cookie;
pub mod crypto;
pub mod password;
