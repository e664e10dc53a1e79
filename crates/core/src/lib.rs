//! Domain primitives shared by the database and API crates.

pub mod error;
pub mod roles;
pub mod types;
pub mod validation;
