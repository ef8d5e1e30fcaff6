//! Database record models matching table schemas.
//!
//! Models are used by repositories to return query results and accept
//! insertion/update data. They are distinct from the API models so that storage
//! and wire representations can evolve independently.
//!
//! - [`users`]: Accounts, password hashes and roles
//! - [`verification_codes`]: Emailed registration codes
//! - [`scheduling_plans`]: Bike redistribution plans
//! - [`ridership`]: Metro flow and bike count rows, plus aggregate projections
//! - [`stations`]: Station reference data
//!
//! Database models typically convert into API models with `From`:
//!
//! ```ignore
//! use subbike::api::models::users::UserResponse;
//!
//! let api_response: UserResponse = db_user.into();
//! ```

pub mod ridership;
pub mod scheduling_plans;
pub mod stations;
pub mod users;
pub mod verification_codes;
