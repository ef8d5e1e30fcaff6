//! Repository implementations for database access.
//!
//! Each repository wraps a SQLx connection or transaction and provides strongly-typed
//! operations returning models from [`crate::db::models`].
//!
//! # Available Repositories
//!
//! - [`Users`]: Account management and credential lookups
//! - [`VerificationCodes`]: Registration code lifecycle
//! - [`SchedulingPlans`]: Bike redistribution plans
//! - [`Stations`]: Station reference data
//! - [`ridership`]: Aggregate queries and bulk upserts over the flow and bike count tables
//!
//! # Common Pattern
//!
//! ```ignore
//! use subbike::db::handlers::{Users, Repository};
//!
//! async fn example(pool: &sqlx::PgPool) -> Result<(), Box<dyn std::error::Error>> {
//!     let mut tx = pool.begin().await?;
//!     let mut repo = Users::new(&mut tx);
//!
//!     let admin = repo.get_user_by_username("admin").await?;
//!
//!     tx.commit().await?;
//!     Ok(())
//! }
//! ```

pub mod repository;
pub mod ridership;
pub mod scheduling_plans;
pub mod stations;
pub mod users;
pub mod verification_codes;

pub use repository::Repository;
pub use scheduling_plans::SchedulingPlans;
pub use stations::Stations;
pub use users::Users;
pub use verification_codes::VerificationCodes;
