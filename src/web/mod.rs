// src/web/mod.rs
pub mod admin_handlers;
pub mod auth_handlers;
pub mod coordinator_handlers;
pub mod extract;
pub mod mw_admin;
pub mod mw_auth;
pub mod routes;
pub mod student_handlers;
pub mod user_handlers;
