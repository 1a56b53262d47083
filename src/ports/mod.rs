pub mod auth_repository;
pub mod cache;
pub mod client_repository;
pub mod config_store;
pub mod error;
pub mod project_repository;
pub mod session_store;

pub use auth_repository::*;
pub use cache::*;
pub use client_repository::*;
pub use config_store::*;
pub use error::*;
pub use project_repository::*;
pub use session_store::*;
