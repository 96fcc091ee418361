pub mod auth;
pub mod device;
pub mod pagination;
pub mod transaction;
