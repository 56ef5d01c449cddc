pub mod memory;
pub mod postgres;
mod query;
mod schema;
