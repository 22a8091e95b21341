//! User records and their business rules.

use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::http::record::FlatRecord;
use crate::routing::descriptor::{FieldSpec, RecordShape, ScalarKind};

/// A stored user. `id == 0` means not yet persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
}

impl User {
    /// A transient user, ready to be inserted.
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id: 0,
            name: name.into(),
            email: email.into(),
        }
    }

    pub fn is_transient(&self) -> bool {
        self.id == 0
    }

    pub fn with_id(self, id: i64) -> Self {
        Self { id, ..self }
    }

    pub fn validate(&self) -> Result<(), ApiError> {
        validate_contact(&self.name, &self.email)
    }
}

impl FlatRecord for User {
    const SHAPE: &'static RecordShape = &RecordShape {
        name: "User",
        fields: &[
            FieldSpec::new("id", ScalarKind::LongInteger),
            FieldSpec::new("name", ScalarKind::Text),
            FieldSpec::new("email", ScalarKind::Text),
        ],
    };
}

/// Alternate create payload without an identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateUserRequest {
    pub name: String,
    pub email: String,
}

impl CreateUserRequest {
    pub fn validate(&self) -> Result<(), ApiError> {
        validate_contact(&self.name, &self.email)
    }

    pub fn into_user(self) -> User {
        User::new(self.name, self.email)
    }
}

impl FlatRecord for CreateUserRequest {
    const SHAPE: &'static RecordShape = &RecordShape {
        name: "CreateUserRequest",
        fields: &[
            FieldSpec::new("name", ScalarKind::Text),
            FieldSpec::new("email", ScalarKind::Text),
        ],
    };
}

fn validate_contact(name: &str, email: &str) -> Result<(), ApiError> {
    if name.trim().is_empty() {
        return Err(ApiError::validation("Name is required"));
    }
    if !email.contains('@') {
        return Err(ApiError::validation("Valid email is required"));
    }
    Ok(())
}
