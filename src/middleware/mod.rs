/*
 * Responsibility
 * - middleware の公開インターフェース
 * - auth: AuthenticationFilter / principal guard / 401 responder
 * - http: request-id, trace, body limit, timeout
 */
pub mod auth;
pub mod http;
