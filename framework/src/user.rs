//! Placeholder user model
//!
//! Persistence is not wired: the lookups accept any input and leave the
//! record untouched. Applications with a real user table implement
//! [`User`] for their own type.

use crate::auth::{User, UserFactory};
use crate::error::FrameworkError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::any::Any;
use std::sync::Arc;

/// A row of the system user table
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserModel {
    pub uid: i64,
    pub role_id: i32,
    pub grp01: i32,
    pub grp02: i32,
    pub in_use: i32,
    pub user_id: String,
    pub password: String,
    pub email: String,
    pub home_url: String,
    pub language: String,
    pub org01: String,
    pub org02: String,
    pub org03: String,
    pub org04: String,
    pub preference: String,

    #[serde(skip)]
    authenticated: bool,
}

impl UserModel {
    /// Factory producing an unauthenticated, zero-valued user
    pub fn anonymous() -> UserFactory {
        Arc::new(|| Box::new(UserModel::default()) as Box<dyn User>)
    }

    /// Populate from a user name and password
    pub async fn get_by_name_pass(&mut self, _user_name: &str, _password: &str) -> Result<(), FrameworkError> {
        Ok(())
    }
}

#[async_trait]
impl User for UserModel {
    fn login(&mut self) {
        self.authenticated = true;
    }

    fn logout(&mut self) {
        self.authenticated = false;
    }

    fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    fn unique_id(&self) -> Value {
        Value::from(self.uid)
    }

    async fn get_by_id(&mut self, _id: &Value) -> Result<(), FrameworkError> {
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
