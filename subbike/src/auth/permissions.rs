//! Role based permission checks.
//!
//! Every role maps to a fixed set of `(Resource, Operation)` grants. Handlers declare the
//! grant they need with the [`RequiresPermission`] extractor:
//!
//! ```ignore
//! async fn list_all_plans(
//!     State(state): State<AppState>,
//!     _: RequiresPermission<resource::Plans, operation::ReadAll>,
//! ) -> Result<Json<Vec<SchedulingPlanResponse>>> { ... }
//! ```
//!
//! Ownership-scoped checks (a manager editing their own plan) use [`can_access`], which
//! accepts either the `*All` grant or the `*Own` grant plus ownership.

use std::marker::PhantomData;

use axum::{extract::FromRequestParts, http::request::Parts};

use crate::{
    AppState,
    api::models::users::{CurrentUser, Role},
    errors::{Error, Result},
    types::{Operation, Permission, Resource, UserId},
};

/// Type-level resources for [`RequiresPermission`]
pub mod resource {
    use crate::types::Resource;

    pub trait ResourceType {
        const RESOURCE: Resource;
    }

    pub struct Users;
    pub struct Plans;
    pub struct Profile;

    impl ResourceType for Users {
        const RESOURCE: Resource = Resource::Users;
    }
    impl ResourceType for Plans {
        const RESOURCE: Resource = Resource::Plans;
    }
    impl ResourceType for Profile {
        const RESOURCE: Resource = Resource::Profile;
    }
}

/// Type-level operations for [`RequiresPermission`]
pub mod operation {
    use crate::types::Operation;

    pub trait OperationType {
        const OPERATION: Operation;
    }

    macro_rules! operations {
        ($($name:ident),* $(,)?) => {
            $(
                pub struct $name;
                impl OperationType for $name {
                    const OPERATION: Operation = Operation::$name;
                }
            )*
        };
    }

    operations!(CreateAll, CreateOwn, ReadAll, ReadOwn, UpdateAll, UpdateOwn, DeleteAll, DeleteOwn);
}

use operation::OperationType;
use resource::ResourceType;

/// Whether `role` is granted `operation` on `resource`
pub fn role_has_permission(role: Role, resource: Resource, operation: Operation) -> bool {
    use Operation::*;

    match role {
        Role::Admin => true,
        Role::User | Role::Manager => match resource {
            Resource::Plans => matches!(operation, CreateOwn | ReadOwn | UpdateOwn | DeleteOwn),
            Resource::Profile => matches!(operation, ReadOwn | UpdateOwn),
            Resource::Users => false,
        },
        Role::Subway => resource == Resource::Profile && matches!(operation, ReadOwn | UpdateOwn),
    }
}

pub fn has_permission(user: &CurrentUser, resource: Resource, operation: Operation) -> bool {
    role_has_permission(user.role, resource, operation)
}

/// Check a permission, producing a 403 error when it is missing
pub fn require_permission(user: &CurrentUser, resource: Resource, operation: Operation) -> Result<()> {
    if has_permission(user, resource, operation) {
        Ok(())
    } else {
        Err(Error::InsufficientPermissions {
            required: Permission::Allow(resource, operation),
            action: operation,
            resource: resource.to_string(),
        })
    }
}

/// Ownership-aware check: the `all` grant, or the `own` grant on a resource owned by `user`
pub fn can_access(user: &CurrentUser, resource: Resource, all: Operation, own: Operation, owner_id: UserId) -> bool {
    has_permission(user, resource, all) || (owner_id == user.id && has_permission(user, resource, own))
}

/// Like [`can_access`], but produces a 403 error
pub fn require_access(user: &CurrentUser, resource: Resource, all: Operation, own: Operation, owner_id: UserId) -> Result<()> {
    if can_access(user, resource, all, own, owner_id) {
        Ok(())
    } else {
        Err(Error::InsufficientPermissions {
            required: Permission::Any(vec![Permission::Allow(resource, all), Permission::Allow(resource, own)]),
            action: own,
            resource: resource.to_string(),
        })
    }
}

/// Extractor that authenticates the caller and checks one permission
pub struct RequiresPermission<R, O> {
    pub user: CurrentUser,
    _marker: PhantomData<fn() -> (R, O)>,
}

impl<R, O> FromRequestParts<AppState> for RequiresPermission<R, O>
where
    R: ResourceType,
    O: OperationType,
{
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self> {
        let user = CurrentUser::from_request_parts(parts, state).await?;
        require_permission(&user, R::RESOURCE, O::OPERATION)?;

        Ok(Self {
            user,
            _marker: PhantomData,
        })
    }
}
