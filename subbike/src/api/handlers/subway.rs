//! Read-only metro passenger flow endpoints.

use axum::{
    Json,
    extract::{Query, State, rejection::QueryRejection},
};
use chrono::Days;

use crate::{
    AppState,
    api::models::ridership::{DailyFlow, DateQuery, FlowMetric, HourlyFlow, StationFlowQuery, StationValue, WeeklyFlowQuery},
    db::{
        handlers::ridership::{self, TOP_STATIONS},
        models::ridership::{DailyFlowRow, StationFlowRow},
    },
    errors::Error,
};

/// Days covered by the weekly view, including the end date
const WEEK_SPAN: u64 = 7;

fn station_value(row: StationFlowRow, metric: FlowMetric) -> StationValue {
    let value = match metric {
        FlowMetric::In => row.in_sum,
        FlowMetric::Out => row.out_sum,
        FlowMetric::Total => row.in_sum + row.out_sum,
    };
    StationValue::from([(row.station, value)])
}

fn daily_flow(row: DailyFlowRow) -> DailyFlow {
    DailyFlow {
        date: row.date,
        in_num: row.in_sum,
        out_num: row.out_sum,
    }
}

/// The ten busiest stations on a day
#[utoipa::path(
    get,
    path = "/api/subway/date",
    tag = "subway",
    params(StationFlowQuery),
    responses(
        (status = 200, description = "Single-entry `{station: value}` maps, busiest first", body = Vec<std::collections::BTreeMap<String, i64>>),
        (status = 400, description = "Malformed date"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn top_stations(
    State(state): State<AppState>,
    query: Result<Query<StationFlowQuery>, QueryRejection>,
) -> Result<Json<Vec<StationValue>>, Error> {
    let Query(query) = query?;
    let metric = query.metric();

    let rows = ridership::station_flows_on(&state.db, query.date, Some(TOP_STATIONS)).await?;
    Ok(Json(rows.into_iter().map(|r| station_value(r, metric)).collect()))
}

/// Network-wide totals per day
#[utoipa::path(
    get,
    path = "/api/subway/totals",
    tag = "subway",
    responses(
        (status = 200, description = "In/out totals per day", body = [DailyFlow]),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn daily_totals(State(state): State<AppState>) -> Result<Json<Vec<DailyFlow>>, Error> {
    let rows = ridership::daily_totals(&state.db).await?;
    Ok(Json(rows.into_iter().map(daily_flow).collect()))
}

/// One station's daily flow over the seven days ending at `endDate`
#[utoipa::path(
    get,
    path = "/api/subway/weekly",
    tag = "subway",
    params(WeeklyFlowQuery),
    responses(
        (status = 200, description = "In/out totals per day", body = [DailyFlow]),
        (status = 400, description = "Malformed date or missing station"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn weekly_flow(
    State(state): State<AppState>,
    query: Result<Query<WeeklyFlowQuery>, QueryRejection>,
) -> Result<Json<Vec<DailyFlow>>, Error> {
    let Query(query) = query?;
    let start = query
        .end_date
        .checked_sub_days(Days::new(WEEK_SPAN - 1))
        .ok_or_else(|| Error::bad_request("Error: endDate is out of range!"))?;

    let rows = ridership::station_daily_flows(&state.db, &query.station, start, query.end_date).await?;
    Ok(Json(rows.into_iter().map(daily_flow).collect()))
}

/// Every station's flow on a day, for the map view
#[utoipa::path(
    get,
    path = "/api/subway/map",
    tag = "subway",
    params(StationFlowQuery),
    responses(
        (status = 200, description = "Single-entry `{station: value}` maps, busiest first", body = Vec<std::collections::BTreeMap<String, i64>>),
        (status = 400, description = "Malformed date"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn station_map(
    State(state): State<AppState>,
    query: Result<Query<StationFlowQuery>, QueryRejection>,
) -> Result<Json<Vec<StationValue>>, Error> {
    let Query(query) = query?;
    let metric = query.metric();

    let rows = ridership::station_flows_on(&state.db, query.date, None).await?;
    Ok(Json(rows.into_iter().map(|r| station_value(r, metric)).collect()))
}

/// Network-wide flow per hour of a day
#[utoipa::path(
    get,
    path = "/api/subway/trend",
    tag = "subway",
    params(DateQuery),
    responses(
        (status = 200, description = "In/out totals per hour slot", body = [HourlyFlow]),
        (status = 400, description = "Malformed date"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn hourly_trend(
    State(state): State<AppState>,
    query: Result<Query<DateQuery>, QueryRejection>,
) -> Result<Json<Vec<HourlyFlow>>, Error> {
    let Query(query) = query?;

    let rows = ridership::hourly_flows_on(&state.db, query.date).await?;
    Ok(Json(
        rows.into_iter()
            .map(|r| HourlyFlow {
                time: r.time_slot,
                in_num: r.in_sum,
                out_num: r.out_sum,
            })
            .collect(),
    ))
}
