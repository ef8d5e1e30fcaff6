//! API request and response data models.
//!
//! These structures define the public JSON contract. They are kept separate from the
//! database models in [`crate::db::models`] so the storage layout can change without
//! breaking clients. Field names follow the dashboard's camelCase conventions where
//! it expects them.
//!
//! # Model Categories
//!
//! - [`auth`]: Login, registration and verification code payloads
//! - [`users`]: Roles, the current principal, admin and profile payloads
//! - [`ridership`]: Metro flow and bike count query parameters and rows
//! - [`scheduling_plans`]: Bike redistribution plans
//! - [`stations`]: Station reference data

pub mod auth;
pub mod ridership;
pub mod scheduling_plans;
pub mod stations;
pub mod users;
