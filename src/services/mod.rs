// src/services/mod.rs
pub mod auth_service;
pub mod club_service;
pub mod dashboard_service;
pub mod enrollment_service;
pub mod guard;
pub mod notification_service;
pub mod registration_service;
pub mod seed_service;
pub mod user_service;
