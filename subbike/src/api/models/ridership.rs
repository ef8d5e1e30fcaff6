//! API request/response models for metro flow and bike count queries.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use utoipa::{IntoParams, ToSchema};

/// Which flow figure a per-station ranking reports.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum FlowMetric {
    /// Passengers entering the station
    In,
    /// Passengers leaving the station
    Out,
    /// Entries plus exits. Unrecognised values fall back to this.
    #[default]
    #[serde(other)]
    Total,
}

#[derive(Debug, Clone, Deserialize, IntoParams)]
pub struct DateQuery {
    /// Day to query (`YYYY-MM-DD`)
    #[param(value_type = String, format = Date)]
    pub date: NaiveDate,
}

#[derive(Debug, Clone, Deserialize, IntoParams)]
pub struct StationFlowQuery {
    /// Day to query (`YYYY-MM-DD`)
    #[param(value_type = String, format = Date)]
    pub date: NaiveDate,
    /// `in`, `out` or `total` (default)
    #[param(inline)]
    pub request: Option<FlowMetric>,
}

impl StationFlowQuery {
    pub fn metric(&self) -> FlowMetric {
        self.request.unwrap_or_default()
    }
}

#[derive(Debug, Clone, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(rename_all = "camelCase")]
pub struct WeeklyFlowQuery {
    pub station: String,
    /// Last day of the seven day window (`YYYY-MM-DD`)
    #[param(value_type = String, format = Date)]
    pub end_date: NaiveDate,
}

#[derive(Debug, Clone, Deserialize, IntoParams)]
pub struct StationQuery {
    pub station: String,
}

#[derive(Debug, Clone, Deserialize, IntoParams)]
pub struct BikeRequirementQuery {
    /// Day to compare against history (`YYYY-MM-DD`)
    #[param(value_type = String, format = Date)]
    pub date: NaiveDate,
    pub station: String,
}

/// A single `{station: value}` entry
pub type StationValue = BTreeMap<String, i64>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DailyFlow {
    #[schema(value_type = String, format = Date)]
    pub date: NaiveDate,
    pub in_num: i64,
    pub out_num: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HourlyFlow {
    /// Hour of day (0-23)
    pub time: i32,
    pub in_num: i64,
    pub out_num: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct StationCount {
    pub station: String,
    pub number: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct DailyCount {
    #[schema(value_type = String, format = Date)]
    pub date: NaiveDate,
    pub number: i64,
}

/// Error body used by the bike requirement endpoint
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
}
