// src/web/extract.rs
use crate::error::AppError;
use axum::extract::FromRequest;

/// `Form` whose rejection is an `AppError`, so a bad body gets the JSON error record.
#[derive(FromRequest)]
#[from_request(via(axum::Form), rejection(AppError))]
pub struct AppForm<T>(pub T);
