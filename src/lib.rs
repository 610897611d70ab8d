/*
 * Responsibility
 * - クレートの公開モジュール (binary と tests/ から利用)
 */
pub mod api;
pub mod app;
pub mod config;
pub mod error;
pub mod middleware;
pub mod repos;
pub mod services;
pub mod state;
