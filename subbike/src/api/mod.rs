//! API layer for HTTP request handling and data models.
//!
//! - **[`handlers`]**: Axum route handlers for all API endpoints
//! - **[`models`]**: Request/response data structures for API communication
//!
//! # API Structure
//!
//! - **Authentication** (`/api/auth/*`): Verification codes, login, registration, logout
//! - **Admin** (`/api/admin/users/*`): User listing, role changes, deletion
//! - **Users** (`/api/users`): Legacy user maintenance
//! - **Profile** (`/api/user/*`): Password and email changes
//! - **Subway** (`/api/subway/*`): Passenger flow by station, day and hour
//! - **Bike** (`/api/bike/*`, `/api/bikeReq/amount`): Bike counts and demand
//! - **Scheduling plans** (`/api/scheduling-plans/*`): Redistribution plans
//! - **Stations** (`/api/stations/all`): Station reference data
//!
//! # OpenAPI Documentation
//!
//! All endpoints are documented with `utoipa` annotations. The rendered documentation is
//! served at `/api/docs` when the server is running.

pub mod handlers;
pub mod models;
