//! Domain model definitions.

pub mod balance;
pub mod settings;
pub mod token;
pub mod user;
