//! Common type definitions and permission system types.
//!
//! This module defines:
//! - Type aliases for entity IDs (UserId, PlanId, etc.)
//! - Resource and operation enums for access control
//!
//! # ID Types
//!
//! All entity IDs are `BIGSERIAL` keys wrapped in type aliases:
//!
//! - [`UserId`]: User account identifier
//! - [`PlanId`]: Scheduling plan identifier
//! - [`StationId`]: Station identifier
//! - [`VerificationCodeId`]: Verification code row identifier
//!
//! # Permission System
//!
//! - [`Resource`]: What entity type is being accessed (Users, Plans, Profile)
//! - [`Operation`]: What action is being performed (Read, Create, Update, Delete)
//! - [`Permission`]: Authorization requirement combining resource and operation
//!
//! Operations come in two flavors:
//! - **All**: Unrestricted access to all entities (e.g., `ReadAll`, `DeleteAll`)
//! - **Own**: Restricted to the caller's own entities (e.g., `ReadOwn`, `UpdateOwn`)
//!
//! ```ignore
//! use subbike::types::{Permission, Resource, Operation};
//!
//! let required = Permission::Allow(Resource::Plans, Operation::ReadAll);
//! ```

use std::fmt;

pub type UserId = i64;
pub type PlanId = i64;
pub type StationId = i64;
pub type VerificationCodeId = i64;

// *-All means unrestricted access, *-Own means restricted to own resources
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    CreateAll,
    CreateOwn,
    ReadAll,
    ReadOwn,
    UpdateAll,
    UpdateOwn,
    DeleteAll,
    DeleteOwn,
}

// Resources that can be operated on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    Users,
    Plans,
    Profile,
}

// Permission types for authorization
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Permission {
    /// Simple permission: (Resource, Operation)
    Allow(Resource, Operation),
    /// Logical combinator, satisfied by any of the listed permissions
    Any(Vec<Permission>),
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::CreateAll | Operation::CreateOwn => write!(f, "Create"),
            Operation::ReadAll | Operation::ReadOwn => write!(f, "Read"),
            Operation::UpdateAll | Operation::UpdateOwn => write!(f, "Update"),
            Operation::DeleteAll | Operation::DeleteOwn => write!(f, "Delete"),
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resource::Users => write!(f, "users"),
            Resource::Plans => write!(f, "scheduling plans"),
            Resource::Profile => write!(f, "profile"),
        }
    }
}
