/*
 * Responsibility
 * - login / register の request/response DTO
 * - validate() は形式チェックのみ (重複チェックは store 側)
 */
use serde::{Deserialize, Serialize};

#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

// password は Debug に出さない
impl std::fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginRequest")
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub username: String,
    #[serde(rename = "type")]
    pub token_type: String,
}

/// Self-registration. Roles are not accepted from the client; unknown fields are ignored.
#[derive(Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub email: Option<String>,
}

impl std::fmt::Debug for RegisterRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisterRequest")
            .field("username", &self.username)
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

impl RegisterRequest {
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.username.trim().is_empty() {
            return Err("username is required");
        }
        if self.username.len() > 64 {
            return Err("username must be <= 64 chars");
        }
        if self.password.trim().is_empty() {
            return Err("password is required");
        }
        // bcrypt は 72 bytes 以降を無視する
        if self.password.len() > 72 {
            return Err("password must be <= 72 bytes");
        }
        if let Some(email) = &self.email
            && !email.trim().is_empty()
            && !email.contains('@')
        {
            return Err("email is invalid");
        }

        Ok(())
    }

    /// Blank email is treated as absent.
    pub fn normalized_email(&self) -> Option<String> {
        self.email
            .as_deref()
            .map(str::trim)
            .filter(|e| !e.is_empty())
            .map(str::to_string)
    }
}
