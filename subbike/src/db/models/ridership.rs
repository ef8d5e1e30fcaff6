//! Database models for metro flow and bike count tables.

use chrono::NaiveDate;
use sqlx::FromRow;

/// One `sub_amounts` row: passenger flow at a station during one hour of a day
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct SubAmount {
    pub date: NaiveDate,
    pub station: String,
    pub time_slot: i32,
    pub in_num: i64,
    pub out_num: i64,
}

/// One `bike_amounts` row
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct BikeAmount {
    pub station: String,
    pub date: NaiveDate,
    pub number: i64,
}

/// Aggregated in/out figures for a single station
#[derive(Debug, Clone, FromRow)]
pub struct StationFlowRow {
    pub station: String,
    pub in_sum: i64,
    pub out_sum: i64,
}

/// Aggregated in/out figures for one day
#[derive(Debug, Clone, FromRow)]
pub struct DailyFlowRow {
    pub date: NaiveDate,
    pub in_sum: i64,
    pub out_sum: i64,
}

/// Aggregated in/out figures for one hour slot
#[derive(Debug, Clone, FromRow)]
pub struct HourlyFlowRow {
    pub time_slot: i32,
    pub in_sum: i64,
    pub out_sum: i64,
}
