/*
 * Responsibility
 * - Users の response DTO
 */
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::v1::extractors::Principal;
use crate::repos::User;

#[derive(Debug, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub username: String,
    pub email: Option<String>,
    pub roles: Vec<String>,
}

impl From<User> for UserResponse {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            username: u.username,
            email: u.email,
            roles: u.roles,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MeResponse {
    pub username: String,
    pub authorities: Vec<String>,
}

impl From<Principal> for MeResponse {
    fn from(p: Principal) -> Self {
        Self {
            username: p.username,
            authorities: p.authorities.into_iter().collect(),
        }
    }
}
