//! Database layer for data persistence and access.
//!
//! PostgreSQL through SQLx, organised as repositories over individual tables:
//!
//! ```text
//! api::handlers ──> db::handlers (repositories, aggregate queries) ──> db::models ──> PostgreSQL
//! ```
//!
//! # Modules
//!
//! - [`handlers`]: Repositories and ridership aggregate queries
//! - [`models`]: Row structures and create/update requests
//! - [`errors`]: Database-specific error classification
//!
//! # Transactions
//!
//! Repositories borrow a `PgConnection`, so they run equally on a pooled connection or
//! inside a transaction. Anything that performs several dependent writes (registration,
//! the admin bootstrap, CSV imports) opens a transaction first:
//!
//! ```ignore
//! let mut tx = pool.begin().await?;
//! let mut users = Users::new(&mut tx);
//! let admin = users.get_user_by_username("admin").await?;
//! tx.commit().await?;
//! ```
//!
//! # Migrations
//!
//! Migrations live in `migrations/` and are applied at startup through [`crate::migrator`].

pub mod errors;
pub mod handlers;
pub mod models;
