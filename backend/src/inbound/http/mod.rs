//! HTTP inbound adapter exposing REST endpoints.

pub mod admin;
pub mod auth;
pub mod calendar;
pub mod contacts;
pub mod courses;
pub mod enrollments;
pub mod error;
pub mod health;
pub mod internships;
pub mod posts;
pub mod services;
pub mod state;
pub mod uploads;
pub mod users;
pub mod validation;

pub use error::ApiResult;
