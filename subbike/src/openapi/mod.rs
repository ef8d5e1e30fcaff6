//! OpenAPI documentation for the dashboard API.
//!
//! [`dashboard::DashboardApiDoc`] covers every route under `/api/*`. It is served as JSON at
//! `/api/openapi.json` and rendered with Scalar at `/api/docs`.

pub mod dashboard;

pub use dashboard::DashboardApiDoc;
