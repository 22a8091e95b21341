//! The user resource: record, persistence port and HTTP operations.

pub mod controller;
pub mod model;
pub mod repository;

pub use controller::{UserController, USERS_BASE_PATH};
pub use model::{CreateUserRequest, User};
pub use repository::{create_table_sql, SqliteUserRepository, UserRepository, DEFAULT_USERS_TABLE};
