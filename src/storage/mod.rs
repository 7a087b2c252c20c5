//! Storage module for the engine database.

pub mod database;
pub mod schema;

pub use database::{Database, DatabaseError};
