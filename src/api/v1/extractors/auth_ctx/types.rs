/*
 * Responsibility
 * - Handler から見える「認証コンテキスト」の型
 * - middleware (AuthenticationFilter) が request extensions に格納し、handler はこの型だけを受け取る
 *
 * Notes
 * - token の検証や user の lookup は middleware/services 側の責務
 * - RequestContext はリクエスト単位の値。共有 mutable state は持たない
 */
use std::collections::BTreeSet;

use crate::repos::User;

/// Resolved identity bound to an authenticated request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub username: String,
    pub authorities: BTreeSet<String>,
}

impl Principal {
    /// Authorities are the user's roles, trimmed, with blank entries dropped.
    pub fn from_user(user: &User) -> Self {
        let authorities = user
            .roles
            .iter()
            .map(|r| r.trim())
            .filter(|r| !r.is_empty())
            .map(str::to_string)
            .collect();

        Self {
            username: user.username.clone(),
            authorities,
        }
    }

    pub fn has_authority(&self, authority: &str) -> bool {
        self.authorities.contains(authority)
    }
}

/// Per-request authentication outcome. Always present after the filter ran;
/// `principal` is `None` for anonymous or rejected credentials.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestContext {
    pub principal: Option<Principal>,
}

impl RequestContext {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn authenticated(principal: Principal) -> Self {
        Self {
            principal: Some(principal),
        }
    }

    pub fn principal(&self) -> Option<&Principal> {
        self.principal.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.principal.is_some()
    }
}
