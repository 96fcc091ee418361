pub mod jwt;
pub mod sqlite;
