//! Rows of the relational store.

use crate::error::{Result, TubechatError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Minimum accepted password length at registration.
pub const MIN_PASSWORD_LEN: usize = 8;

/// A registered user.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    /// Argon2 PHC string. Never leaves the service.
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

/// Input for registering a user.
#[derive(Debug, Clone, Deserialize)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password: String,
}

impl NewUser {
    /// Trim name and email and check all fields.
    pub fn validated(self) -> Result<Self> {
        let name = self.name.trim().to_string();
        let email = self.email.trim().to_string();

        if name.is_empty() {
            return Err(TubechatError::InvalidInput("Name must not be empty".to_string()));
        }
        if email.is_empty() || !email.contains('@') {
            return Err(TubechatError::InvalidInput(format!(
                "Invalid email address: {:?}",
                email
            )));
        }
        if self.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(TubechatError::InvalidInput(format!(
                "Password must be at least {} characters",
                MIN_PASSWORD_LEN
            )));
        }

        Ok(Self {
            name,
            email,
            password: self.password,
        })
    }
}

/// An ingested video with its full transcript.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Video {
    pub id: i64,
    pub user_id: i64,
    pub url: String,
    pub video_id: String,
    pub transcript: String,
    pub created_at: DateTime<Utc>,
}

/// Author of a chat message.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "user" => Ok(Role::User),
            "assistant" => Ok(Role::Assistant),
            _ => Err(format!("Unknown message role: {}", s)),
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One turn of a conversation about a video.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatMessage {
    #[serde(skip_serializing)]
    #[serde(default)]
    pub id: i64,
    #[serde(skip_serializing)]
    #[serde(default)]
    pub user_id: i64,
    #[serde(skip_serializing)]
    #[serde(default)]
    pub video_id: String,
    pub role: Role,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_json_omits_password_hash() {
        let user = User {
            id: 1,
            name: "Ada".into(),
            email: "ada@example.com".into(),
            password_hash: "$argon2id$secret".into(),
            created_at: Utc::now(),
        };

        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("password_hash").is_none());
        assert_eq!(json["email"], "ada@example.com");
    }

    #[test]
    fn test_message_json_shape() {
        let message = ChatMessage {
            id: 4,
            user_id: 1,
            video_id: "abc123XYZ_9".into(),
            role: Role::Assistant,
            content: "hi".into(),
            created_at: Utc::now(),
        };

        let json = serde_json::to_value(&message).unwrap();
        let keys: Vec<&String> = json.as_object().unwrap().keys().collect();
        assert_eq!(keys.len(), 3);
        assert_eq!(json["role"], "assistant");
    }

    fn new_user(name: &str, email: &str, password: &str) -> NewUser {
        NewUser {
            name: name.into(),
            email: email.into(),
            password: password.into(),
        }
    }

    #[test]
    fn test_new_user_validation() {
        let user = new_user("  Ada ", " ada@example.com ", "longenough")
            .validated()
            .unwrap();
        assert_eq!(user.name, "Ada");
        assert_eq!(user.email, "ada@example.com");

        assert!(new_user(" ", "ada@example.com", "longenough").validated().is_err());
        assert!(new_user("Ada", "not-an-email", "longenough").validated().is_err());
        assert!(new_user("Ada", "ada@example.com", "short").validated().is_err());
    }

    #[test]
    fn test_role_parsing() {
        assert_eq!("user".parse::<Role>().unwrap(), Role::User);
        assert_eq!("assistant".parse::<Role>().unwrap(), Role::Assistant);
        assert!("bot".parse::<Role>().is_err());
        assert!("system".parse::<Role>().is_err());
    }
}
