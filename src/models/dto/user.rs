use crate::models::{Role, User};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginInfo {
    pub email: String,
    pub password: String,
}

/// Public part of a user returned alongside a login token
#[derive(Debug, Serialize, ToSchema)]
pub struct LoginUser {
    pub id: i32,
    pub name: String,
    pub role: Role,
}

/// `{success:false}` on any failure, otherwise the token and the user it belongs to
#[derive(Debug, Serialize, ToSchema)]
pub struct LoginResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<LoginUser>,
}

impl LoginResponse {
    pub fn failed() -> Self {
        Self {
            success: false,
            token: None,
            user: None,
        }
    }

    pub fn succeeded(token: String, user: &User) -> Self {
        Self {
            success: true,
            token: Some(token),
            user: Some(LoginUser {
                id: user.id,
                name: user.name.clone(),
                role: user.role,
            }),
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub role: Role,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub created_at: String,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            role: user.role,
            id: user.id,
            name: user.name,
            email: user.email,
            created_at: user.created_at.to_rfc3339(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn failed_login_is_just_success_false() {
        let body = serde_json::to_value(LoginResponse::failed()).unwrap();
        assert_eq!(body, json!({ "success": false }));
    }

    #[test]
    fn successful_login_exposes_id_name_role() {
        let user = User {
            id: 9,
            name: "Grace".to_string(),
            email: "grace@example.com".to_string(),
            hashed_password: "secret-hash".to_string(),
            role: Role::Admin,
            ..Default::default()
        };
        let body = serde_json::to_value(LoginResponse::succeeded("tok".into(), &user)).unwrap();
        assert_eq!(
            body,
            json!({
                "success": true,
                "token": "tok",
                "user": { "id": 9, "name": "Grace", "role": "admin" }
            })
        );
    }

    #[test]
    fn new_user_role_defaults_to_user() {
        let body: NewUser = serde_json::from_value(json!({
            "name": "Lin",
            "email": "lin@example.com",
            "password": "pw"
        }))
        .unwrap();
        assert_eq!(body.role, Role::User);
    }

    #[test]
    fn user_response_hides_password() {
        let user = User {
            hashed_password: "secret-hash".to_string(),
            role: Role::User,
            ..Default::default()
        };
        let body = serde_json::to_string(&UserResponse::from(user)).unwrap();
        assert!(!body.contains("secret-hash"));
        assert!(body.contains("createdAt"));
    }
}
