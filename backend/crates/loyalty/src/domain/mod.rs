//! Domain Layer - Business logic and entities
//!
//! - Value objects (`OrderNumber`, `Amount`) and the Luhn checksum
//! - Entities (orders, balances, withdrawals)
//! - The accrual system contract
//! - Repository traits

pub mod accrual;
pub mod entities;
pub mod luhn;
pub mod repository;
pub mod value_objects;
