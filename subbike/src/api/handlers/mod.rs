//! HTTP request handlers for all API endpoints.
//!
//! Handlers are grouped by the dashboard area they serve. Each one validates its input,
//! checks the caller's permissions through the [`crate::auth::permissions`] extractors,
//! talks to the database through [`crate::db::handlers`] and maps the result to the wire
//! models in [`crate::api::models`].
//!
//! # Handler Modules
//!
//! - [`auth`]: Verification codes, login, registration and logout
//! - [`admin`]: User listing, role changes and deletion for administrators
//! - [`users`]: Legacy admin-only user create/edit/delete
//! - [`profile`]: Password and email changes for the signed-in user
//! - [`subway`]: Metro passenger flow aggregates
//! - [`bike`]: Shared-bike counts and the demand estimate
//! - [`scheduling_plans`]: Bike redistribution plan CRUD
//! - [`stations`]: Station reference data
//!
//! # Error Handling
//!
//! Handlers return [`crate::errors::Error`], which renders as a status code with a
//! `{"message": ...}` body. The demand estimate is the exception and reports `{"error": ...}`.

pub mod admin;
pub mod auth;
pub mod bike;
pub mod profile;
pub mod scheduling_plans;
pub mod stations;
pub mod subway;
pub mod users;
