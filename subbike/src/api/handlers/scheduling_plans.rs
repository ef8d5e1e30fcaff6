//! Bike redistribution plans.
//!
//! Plans belong to the user who created them. Owners can read, edit and delete their own
//! plans; administrators can do so for every plan and are the only ones who can list all of
//! them.

use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
};

use crate::{
    AppState,
    api::models::scheduling_plans::{SchedulingPlanCreate, SchedulingPlanResponse, SchedulingPlanUpdate},
    auth::permissions::{RequiresPermission, operation, require_access, resource},
    db::{
        handlers::{Repository, SchedulingPlans},
        models::scheduling_plans::{PlanCreateDBRequest, PlanDBResponse, PlanFilter, PlanUpdateDBRequest},
    },
    errors::Error,
    types::{Operation, PlanId, Resource},
};

fn plan_name(name: Option<&str>) -> Result<String, Error> {
    match name.map(str::trim) {
        Some(name) if !name.is_empty() => Ok(name.to_string()),
        _ => Err(Error::bad_request("Error: Plan name is required!")),
    }
}

async fn load_plan(plans: &mut SchedulingPlans<'_>, id: PlanId) -> Result<PlanDBResponse, Error> {
    plans.get_by_id(id).await?.ok_or_else(|| Error::NotFound {
        resource: "Scheduling plan".to_string(),
        id: id.to_string(),
    })
}

/// List every plan
#[utoipa::path(
    get,
    path = "/api/scheduling-plans",
    tag = "scheduling-plans",
    responses(
        (status = 200, description = "All plans, newest first", body = [SchedulingPlanResponse]),
        (status = 403, description = "Forbidden - admin only"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn list_all_plans(
    State(state): State<AppState>,
    _: RequiresPermission<resource::Plans, operation::ReadAll>,
) -> Result<Json<Vec<SchedulingPlanResponse>>, Error> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let plans = SchedulingPlans::new(&mut conn).list(&PlanFilter::default()).await?;

    Ok(Json(plans.into_iter().map(Into::into).collect()))
}

/// List the caller's plans
#[utoipa::path(
    get,
    path = "/api/scheduling-plans/my-plans",
    tag = "scheduling-plans",
    responses(
        (status = 200, description = "The caller's plans, newest first", body = [SchedulingPlanResponse]),
        (status = 401, description = "Unauthorized"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn list_my_plans(
    State(state): State<AppState>,
    permission: RequiresPermission<resource::Plans, operation::ReadOwn>,
) -> Result<Json<Vec<SchedulingPlanResponse>>, Error> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let filter = PlanFilter {
        owner: Some(permission.user.id),
    };
    let plans = SchedulingPlans::new(&mut conn).list(&filter).await?;

    Ok(Json(plans.into_iter().map(Into::into).collect()))
}

/// Create a plan owned by the caller. Status always starts as `PENDING`.
#[utoipa::path(
    post,
    path = "/api/scheduling-plans",
    request_body = SchedulingPlanCreate,
    tag = "scheduling-plans",
    responses(
        (status = 200, description = "Plan created", body = SchedulingPlanResponse),
        (status = 400, description = "Missing name"),
        (status = 403, description = "Role cannot create plans"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn create_plan(
    State(state): State<AppState>,
    permission: RequiresPermission<resource::Plans, operation::CreateOwn>,
    body: Result<Json<SchedulingPlanCreate>, JsonRejection>,
) -> Result<Json<SchedulingPlanResponse>, Error> {
    let Json(request) = body?;
    let name = plan_name(request.name.as_deref())?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let plan = SchedulingPlans::new(&mut conn)
        .create(&PlanCreateDBRequest::new(permission.user.id, name, request))
        .await?;
    tracing::info!(plan_id = plan.id, user_id = plan.user_id, "created scheduling plan");

    Ok(Json(plan.into()))
}

/// Fetch one plan
#[utoipa::path(
    get,
    path = "/api/scheduling-plans/{id}",
    tag = "scheduling-plans",
    params(("id" = i64, Path, description = "Plan ID")),
    responses(
        (status = 200, description = "The plan", body = SchedulingPlanResponse),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "Plan not found"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all, fields(plan_id = id))]
pub async fn get_plan(
    State(state): State<AppState>,
    Path(id): Path<PlanId>,
    permission: RequiresPermission<resource::Plans, operation::ReadOwn>,
) -> Result<Json<SchedulingPlanResponse>, Error> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let plan = load_plan(&mut SchedulingPlans::new(&mut conn), id).await?;
    require_access(&permission.user, Resource::Plans, Operation::ReadAll, Operation::ReadOwn, plan.user_id)?;

    Ok(Json(plan.into()))
}

/// Update a plan. Stations and bike count are fixed at creation.
#[utoipa::path(
    put,
    path = "/api/scheduling-plans/{id}",
    request_body = SchedulingPlanUpdate,
    tag = "scheduling-plans",
    params(("id" = i64, Path, description = "Plan ID")),
    responses(
        (status = 200, description = "Updated plan", body = SchedulingPlanResponse),
        (status = 400, description = "Missing name"),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "Plan not found"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all, fields(plan_id = id))]
pub async fn update_plan(
    State(state): State<AppState>,
    Path(id): Path<PlanId>,
    permission: RequiresPermission<resource::Plans, operation::UpdateOwn>,
    body: Result<Json<SchedulingPlanUpdate>, JsonRejection>,
) -> Result<Json<SchedulingPlanResponse>, Error> {
    let Json(request) = body?;
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut plans = SchedulingPlans::new(&mut conn);

    let existing = load_plan(&mut plans, id).await?;
    require_access(&permission.user, Resource::Plans, Operation::UpdateAll, Operation::UpdateOwn, existing.user_id)?;

    let name = plan_name(request.name.as_deref())?;
    let updated = plans.update(id, &PlanUpdateDBRequest::new(name, request)).await?;

    Ok(Json(updated.into()))
}

/// Delete a plan
#[utoipa::path(
    delete,
    path = "/api/scheduling-plans/{id}",
    tag = "scheduling-plans",
    params(("id" = i64, Path, description = "Plan ID")),
    responses(
        (status = 204, description = "Plan deleted"),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "Plan not found"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all, fields(plan_id = id))]
pub async fn delete_plan(
    State(state): State<AppState>,
    Path(id): Path<PlanId>,
    permission: RequiresPermission<resource::Plans, operation::DeleteOwn>,
) -> Result<StatusCode, Error> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut plans = SchedulingPlans::new(&mut conn);

    let existing = load_plan(&mut plans, id).await?;
    require_access(&permission.user, Resource::Plans, Operation::DeleteAll, Operation::DeleteOwn, existing.user_id)?;

    plans.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
