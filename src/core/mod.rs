pub mod bulk;
pub mod config;
pub mod error;
pub mod session;
