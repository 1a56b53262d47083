pub mod client_service;
pub mod error;
pub mod project_service;
pub mod session;
pub mod submission;

pub use client_service::*;
pub use error::*;
pub use project_service::*;
pub use session::*;
pub use submission::*;
