pub mod auth_repo;
pub mod client;
pub mod client_repo;
pub mod dto;
pub mod project_repo;

pub use auth_repo::*;
pub use client::*;
pub use client_repo::*;
pub use dto::*;
pub use project_repo::*;
