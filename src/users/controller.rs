//! HTTP operations for `/api/users`.
//!
//! # Routes
//! ```text
//! GET    /api/users          list every user
//! GET    /api/users/{id}     one user, or null
//! POST   /api/users          create from a User body
//! POST   /api/users/create   create from a CreateUserRequest body
//! PUT    /api/users/{id}     replace name/email of an existing user
//! DELETE /api/users/{id}     delete, reporting whether a row was removed
//! ```

use std::sync::Arc;

use serde::Serialize;

use crate::error::ApiError;
use crate::http::binder::Arguments;
use crate::http::record::FlatRecord;
use crate::http::response::{Payload, Reply};
use crate::routing::descriptor::{ParamBinding, TargetType};
use crate::routing::dispatcher::{Handler, OperationSpec};
use crate::users::model::{CreateUserRequest, User};
use crate::users::repository::UserRepository;

pub const USERS_BASE_PATH: &str = "/api/users";

#[derive(Debug, Serialize)]
struct DeleteOutcome {
    id: i64,
    deleted: bool,
}

/// User endpoints over a `UserRepository`.
pub struct UserController {
    users: Arc<dyn UserRepository>,
}

impl UserController {
    pub fn new(users: Arc<dyn UserRepository>) -> Self {
        Self { users }
    }

    pub fn get_all_users(&self) -> Result<Vec<User>, ApiError> {
        Ok(self.users.find_all()?)
    }

    pub fn get_user_by_id(&self, id: i64) -> Result<Option<User>, ApiError> {
        Ok(self.users.find_by_id(id)?)
    }

    /// Create a user. Any identifier in the body is ignored.
    pub fn create_user(&self, user: User) -> Result<User, ApiError> {
        user.validate()?;
        let created = self.users.save(user.with_id(0))?;
        tracing::info!(user_id = created.id, "User created");
        Ok(created)
    }

    pub fn create_user_with_validation(&self, request: CreateUserRequest) -> Result<User, ApiError> {
        request.validate()?;
        let created = self.users.save(request.into_user())?;
        tracing::info!(user_id = created.id, "User created");
        Ok(created)
    }

    /// Update the user at `id` with the body's name and email.
    pub fn update_user(&self, id: i64, user: User) -> Result<User, ApiError> {
        if id <= 0 {
            return Err(ApiError::validation("User id must be positive"));
        }
        user.validate()?;
        let updated = self.users.save(user.with_id(id))?;
        tracing::info!(user_id = id, "User updated");
        Ok(updated)
    }

    pub fn delete_user(&self, id: i64) -> Result<bool, ApiError> {
        let deleted = self.users.delete_by_id(id)?;
        tracing::info!(user_id = id, deleted, "User delete requested");
        Ok(deleted)
    }
}

impl Handler for UserController {
    fn base_path(&self) -> &str {
        USERS_BASE_PATH
    }

    fn operations(self: Arc<Self>) -> Vec<OperationSpec> {
        let user_body = ParamBinding::body(TargetType::Record(User::SHAPE));
        let id_path = || ParamBinding::path("id", TargetType::LongInteger);

        let list = Arc::clone(&self);
        let by_id = Arc::clone(&self);
        let create = Arc::clone(&self);
        let create_validated = Arc::clone(&self);
        let update = Arc::clone(&self);
        let delete = self;

        vec![
            OperationSpec::get("get_all_users", "", move |_: Arguments| {
                let users = list.get_all_users()?;
                Ok(Reply::new(Payload::collection(&users)?))
            }),
            OperationSpec::get("get_user_by_id", "/{id}", move |args: Arguments| {
                let user = by_id.get_user_by_id(args.long(0)?)?;
                Ok(Reply::new(Payload::optional(user.as_ref())?))
            })
            .bind(id_path()),
            OperationSpec::post("create_user", "", move |args: Arguments| {
                let user = create.create_user(args.record(0)?)?;
                Ok(Reply::new(Payload::record(&user)?))
            })
            .bind(user_body.clone()),
            OperationSpec::post("create_user_with_validation", "/create", move |args: Arguments| {
                let user = create_validated.create_user_with_validation(args.record(0)?)?;
                Ok(Reply::new(Payload::record(&user)?))
            })
            .bind(ParamBinding::body(TargetType::Record(CreateUserRequest::SHAPE))),
            OperationSpec::put("update_user", "/{id}", move |args: Arguments| {
                let user = update.update_user(args.long(0)?, args.record(1)?)?;
                Ok(Reply::new(Payload::record(&user)?))
            })
            .bind(id_path())
            .bind(user_body),
            OperationSpec::delete("delete_user", "/{id}", move |args: Arguments| {
                let id = args.long(0)?;
                let deleted = delete.delete_user(id)?;
                Ok(Reply::new(Payload::record(&DeleteOutcome { id, deleted })?))
            })
            .bind(id_path()),
        ]
    }
}
