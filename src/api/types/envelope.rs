//! Response envelope shared by every `/users` route

use serde::{Deserialize, Serialize};

use crate::domain::user::{Roles, User};

/// `{success, msg?, token?, user?, users?}`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Envelope {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub msg: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<UserResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub users: Option<Vec<UserResponse>>,
}

impl Envelope {
    pub fn ok() -> Self {
        Self {
            success: true,
            ..Default::default()
        }
    }

    pub fn failure(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            msg: Some(msg.into()),
            ..Default::default()
        }
    }

    pub fn with_msg(mut self, msg: impl Into<String>) -> Self {
        self.msg = Some(msg.into());
        self
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn with_user(mut self, user: &User) -> Self {
        self.user = Some(UserResponse::from(user));
        self
    }

    pub fn with_users(mut self, users: &[User]) -> Self {
        self.users = Some(users.iter().map(UserResponse::from).collect());
        self
    }
}

/// Public view of an account; the password hash is never part of it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserResponse {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub email: String,
    pub address: Option<String>,
    #[serde(rename = "hasRoles")]
    pub roles: Roles,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id().to_string(),
            name: user.name().to_string(),
            email: user.email().to_string(),
            address: user.address().map(str::to_string),
            roles: user.roles().clone(),
        }
    }
}
