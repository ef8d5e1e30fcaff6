//! API request/response models for bike scheduling plans.

use crate::db::models::scheduling_plans::PlanDBResponse;
use crate::types::PlanId;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Lifecycle state of a plan. Only changed through client updates.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, ToSchema)]
#[sqlx(type_name = "plan_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PlanStatus {
    #[default]
    Pending,
    InProgress,
    Completed,
    Cancelled,
}

/// `yyyy-MM-dd HH:mm:ss` timestamps, as used by the dashboard
pub mod plan_time {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub const FORMAT: &str = "%Y-%m-%d %H:%M:%S";

    pub fn serialize<S: Serializer>(value: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&value.format(FORMAT))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDateTime, D::Error> {
        let s = String::deserialize(deserializer)?;
        NaiveDateTime::parse_from_str(&s, FORMAT).map_err(serde::de::Error::custom)
    }

    pub mod option {
        use super::FORMAT;
        use chrono::NaiveDateTime;
        use serde::{Deserialize, Deserializer, Serializer};

        pub fn serialize<S: Serializer>(value: &Option<NaiveDateTime>, serializer: S) -> Result<S::Ok, S::Error> {
            match value {
                Some(v) => serializer.collect_str(&v.format(FORMAT)),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<NaiveDateTime>, D::Error> {
            match Option::<String>::deserialize(deserializer)? {
                Some(s) if !s.trim().is_empty() => NaiveDateTime::parse_from_str(s.trim(), FORMAT)
                    .map(Some)
                    .map_err(serde::de::Error::custom),
                _ => Ok(None),
            }
        }
    }
}

/// Body of `POST /api/scheduling-plans`. Any `status` sent by the client is ignored.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SchedulingPlanCreate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub source_station_name: Option<String>,
    pub target_station_name: Option<String>,
    pub bike_count: Option<i32>,
    #[serde(default, with = "plan_time::option")]
    #[schema(value_type = Option<String>, example = "2024-05-01 08:30:00")]
    pub schedule_time: Option<NaiveDateTime>,
    pub priority: Option<i32>,
    pub path_data: Option<String>,
}

/// Body of `PUT /api/scheduling-plans/{id}`.
///
/// Overwrites name, description, schedule time, priority and path data. Status is only
/// changed when present. Stations and bike count are not editable.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SchedulingPlanUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    #[serde(default, with = "plan_time::option")]
    #[schema(value_type = Option<String>, example = "2024-05-01 08:30:00")]
    pub schedule_time: Option<NaiveDateTime>,
    pub priority: Option<i32>,
    pub path_data: Option<String>,
    pub status: Option<PlanStatus>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SchedulingPlanResponse {
    pub id: PlanId,
    pub name: String,
    pub description: Option<String>,
    pub source_station_name: Option<String>,
    pub target_station_name: Option<String>,
    pub bike_count: Option<i32>,
    #[serde(with = "plan_time::option")]
    #[schema(value_type = Option<String>, example = "2024-05-01 08:30:00")]
    pub schedule_time: Option<NaiveDateTime>,
    pub priority: Option<i32>,
    pub path_data: Option<String>,
    pub status: PlanStatus,
    pub created_by_username: String,
    #[serde(with = "plan_time")]
    #[schema(value_type = String, example = "2024-05-01 08:30:00")]
    pub created_at: NaiveDateTime,
    #[serde(with = "plan_time")]
    #[schema(value_type = String, example = "2024-05-01 08:30:00")]
    pub updated_at: NaiveDateTime,
}

impl From<PlanDBResponse> for SchedulingPlanResponse {
    fn from(db: PlanDBResponse) -> Self {
        Self {
            id: db.id,
            name: db.name,
            description: db.description,
            source_station_name: db.source_station_name,
            target_station_name: db.target_station_name,
            bike_count: db.bike_count,
            schedule_time: db.schedule_time,
            priority: db.priority,
            path_data: db.path_data,
            status: db.status,
            created_by_username: db.created_by_username,
            created_at: db.created_at,
            updated_at: db.updated_at,
        }
    }
}
