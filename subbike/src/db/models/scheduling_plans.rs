//! Database models for scheduling plans.

use crate::api::models::scheduling_plans::{PlanStatus, SchedulingPlanCreate, SchedulingPlanUpdate};
use crate::types::{PlanId, UserId};
use chrono::NaiveDateTime;
use sqlx::FromRow;

/// Database request for creating a plan. Status always starts as pending.
#[derive(Debug, Clone)]
pub struct PlanCreateDBRequest {
    pub user_id: UserId,
    pub name: String,
    pub description: Option<String>,
    pub source_station_name: Option<String>,
    pub target_station_name: Option<String>,
    pub bike_count: Option<i32>,
    pub schedule_time: Option<NaiveDateTime>,
    pub priority: Option<i32>,
    pub path_data: Option<String>,
}

impl PlanCreateDBRequest {
    pub fn new(user_id: UserId, name: String, api: SchedulingPlanCreate) -> Self {
        Self {
            user_id,
            name,
            description: api.description,
            source_station_name: api.source_station_name,
            target_station_name: api.target_station_name,
            bike_count: api.bike_count,
            schedule_time: api.schedule_time,
            priority: api.priority,
            path_data: api.path_data,
        }
    }
}

/// Database request for updating a plan.
#[derive(Debug, Clone)]
pub struct PlanUpdateDBRequest {
    pub name: String,
    pub description: Option<String>,
    pub schedule_time: Option<NaiveDateTime>,
    pub priority: Option<i32>,
    pub path_data: Option<String>,
    /// `None` keeps the current status
    pub status: Option<PlanStatus>,
}

impl PlanUpdateDBRequest {
    pub fn new(name: String, api: SchedulingPlanUpdate) -> Self {
        Self {
            name,
            description: api.description,
            schedule_time: api.schedule_time,
            priority: api.priority,
            path_data: api.path_data,
            status: api.status,
        }
    }
}

/// Plan row joined with its owner's username
#[derive(Debug, Clone, FromRow)]
pub struct PlanDBResponse {
    pub id: PlanId,
    pub name: String,
    pub description: Option<String>,
    pub source_station_name: Option<String>,
    pub target_station_name: Option<String>,
    pub bike_count: Option<i32>,
    pub schedule_time: Option<NaiveDateTime>,
    pub priority: Option<i32>,
    pub path_data: Option<String>,
    pub status: PlanStatus,
    pub user_id: UserId,
    pub created_by_username: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Filter for listing plans
#[derive(Debug, Clone, Default)]
pub struct PlanFilter {
    /// Restrict to plans owned by this user
    pub owner: Option<UserId>,
}
