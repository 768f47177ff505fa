// src/models/mod.rs
pub mod club;
pub mod enrollment;
pub mod notification;
pub mod outcome;
pub mod registration;
pub mod user;
