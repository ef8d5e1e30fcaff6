//! Authentication and authorization.
//!
//! Users authenticate with a username and password. A successful login or registration
//! issues a signed JWT, returned in the response body and also set as an HTTP-only session
//! cookie. Every later request presents it either as `Authorization: Bearer <token>` or
//! through that cookie.
//!
//! # Authorization
//!
//! Each account has exactly one role (`ROLE_USER`, `ROLE_MANAGER`, `ROLE_ADMIN` or
//! `ROLE_SUBWAY`). Roles map to operations on resources in [`permissions`]; "own"
//! operations are further narrowed by comparing the caller against the resource owner.
//!
//! # Modules
//!
//! - [`current_user`]: Resolves the caller from a bearer token or the session cookie
//! - [`password`]: Argon2 hashing and password policy
//! - [`permissions`]: Role to permission mapping and the `RequiresPermission` extractor
//! - [`session`]: JWT creation and verification
//!
//! # Usage in Handlers
//!
//! ```ignore
//! use subbike::auth::permissions::{RequiresPermission, operation, resource};
//!
//! async fn my_plans(
//!     State(state): State<AppState>,
//!     permission: RequiresPermission<resource::Plans, operation::ReadOwn>,
//! ) -> Result<Json<Vec<SchedulingPlanResponse>>, Error> {
//!     // permission.user is the authenticated caller
//! }
//! ```

pub mod current_user;
pub mod password;
pub mod permissions;
pub mod session;
