pub mod database;
pub mod schemas;
