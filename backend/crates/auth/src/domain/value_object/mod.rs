//! Value Object Module

pub mod login;
pub mod session_token;
