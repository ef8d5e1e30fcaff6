//! Read-only shared-bike count endpoints, plus the demand estimate.

use axum::{
    Json,
    extract::{Query, State, rejection::QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::{
    AppState,
    api::models::ridership::{BikeRequirementQuery, DailyCount, DateQuery, ErrorResponse, StationCount, StationQuery},
    db::{
        handlers::ridership::{self, TOP_STATIONS},
        models::ridership::BikeAmount,
    },
    errors::Error,
};

fn station_count(row: BikeAmount) -> StationCount {
    StationCount {
        station: row.station,
        number: row.number,
    }
}

/// The ten stations with the most bikes on a day
#[utoipa::path(
    get,
    path = "/api/bike/date",
    tag = "bike",
    params(DateQuery),
    responses(
        (status = 200, description = "Highest counts first", body = [StationCount]),
        (status = 400, description = "Malformed date"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn top_stations(
    State(state): State<AppState>,
    query: Result<Query<DateQuery>, QueryRejection>,
) -> Result<Json<Vec<StationCount>>, Error> {
    let Query(query) = query?;

    let rows = ridership::bike_counts_on(&state.db, query.date, Some(TOP_STATIONS)).await?;
    Ok(Json(rows.into_iter().map(station_count).collect()))
}

/// Every station's bike count on a day
#[utoipa::path(
    get,
    path = "/api/bike/totals",
    tag = "bike",
    params(DateQuery),
    responses(
        (status = 200, description = "All counts for the day", body = [StationCount]),
        (status = 400, description = "Malformed date"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn station_totals(
    State(state): State<AppState>,
    query: Result<Query<DateQuery>, QueryRejection>,
) -> Result<Json<Vec<StationCount>>, Error> {
    let Query(query) = query?;

    let rows = ridership::bike_counts_on(&state.db, query.date, None).await?;
    Ok(Json(rows.into_iter().map(station_count).collect()))
}

/// One station's bike count history
#[utoipa::path(
    get,
    path = "/api/bike/station",
    tag = "bike",
    params(StationQuery),
    responses(
        (status = 200, description = "Counts per day, oldest first", body = [DailyCount]),
        (status = 400, description = "Missing station"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn station_history(
    State(state): State<AppState>,
    query: Result<Query<StationQuery>, QueryRejection>,
) -> Result<Json<Vec<DailyCount>>, Error> {
    let Query(query) = query?;

    let rows = ridership::bike_counts_for_station(&state.db, &query.station).await?;
    Ok(Json(
        rows.into_iter()
            .map(|r| DailyCount {
                date: r.date,
                number: r.number,
            })
            .collect(),
    ))
}

/// Failure of the demand estimate, reported as `{"error": ...}`
#[derive(Debug)]
pub enum RequirementError {
    BadRequest(String),
    Internal(Error),
}

impl IntoResponse for RequirementError {
    fn into_response(self) -> Response {
        match self {
            RequirementError::BadRequest(error) => (StatusCode::BAD_REQUEST, Json(ErrorResponse { error })).into_response(),
            RequirementError::Internal(e) => e.into_response(),
        }
    }
}

impl From<Error> for RequirementError {
    fn from(e: Error) -> Self {
        RequirementError::Internal(e)
    }
}

/// Bikes still needed at a station: the rounded historical average minus the day's count
pub fn bike_requirement(historical_average: f64, current: i64) -> i64 {
    historical_average.round() as i64 - current
}

/// Estimate how many bikes a station is short on a day
#[utoipa::path(
    get,
    path = "/api/bikeReq/amount",
    tag = "bike",
    params(BikeRequirementQuery),
    responses(
        (status = 200, description = "Historical average minus the day's count", body = i64),
        (status = 400, description = "Malformed parameters or missing data", body = ErrorResponse),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn requirement(
    State(state): State<AppState>,
    query: Result<Query<BikeRequirementQuery>, QueryRejection>,
) -> Result<Json<i64>, RequirementError> {
    let Query(query) = query.map_err(|e| RequirementError::BadRequest(e.body_text()))?;

    let average = ridership::average_bike_count_before(&state.db, &query.station, query.date)
        .await
        .map_err(Error::from)?;
    let current = ridership::bike_count_on(&state.db, &query.station, query.date)
        .await
        .map_err(Error::from)?;

    match (average, current) {
        (Some(average), Some(current)) => Ok(Json(bike_requirement(average, current))),
        (None, _) => Err(RequirementError::BadRequest(format!(
            "No bike history for station {} before {}",
            query.station, query.date
        ))),
        (_, None) => Err(RequirementError::BadRequest(format!(
            "No bike count for station {} on {}",
            query.station, query.date
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{create_test_app, seed_bike_amounts};
    use chrono::NaiveDate;
    use serde_json::{Value, json};
    use sqlx::PgPool;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2019, 5, d).unwrap()
    }

    fn count(station: &str, date: NaiveDate, number: i64) -> BikeAmount {
        BikeAmount {
            station: station.to_string(),
            date,
            number,
        }
    }

    async fn seed(pool: &PgPool, rows: &[BikeAmount]) {
        seed_bike_amounts(pool, rows).await;
    }

    #[test]
    fn test_bike_requirement_rounds_average() {
        assert_eq!(bike_requirement(10.5, 4), 7);
        assert_eq!(bike_requirement(10.4, 4), 6);
        assert_eq!(bike_requirement(3.0, 8), -5);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_top_and_totals(pool: PgPool) {
        let rows: Vec<BikeAmount> = (0..12).map(|i| count(&format!("S{i:02}"), day(1), i)).collect();
        seed(&pool, &rows).await;
        let server = create_test_app(pool).await;

        let response = server.get("/api/bike/date").add_query_param("date", "2019-05-01").await;
        response.assert_status_ok();
        let top: Vec<StationCount> = response.json();
        assert_eq!(top.len(), 10);
        assert_eq!(top[0].station, "S11");
        assert_eq!(top[0].number, 11);

        let response = server.get("/api/bike/totals").add_query_param("date", "2019-05-01").await;
        let all: Vec<StationCount> = response.json();
        assert_eq!(all.len(), 12);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_station_history(pool: PgPool) {
        seed(&pool, &[count("A", day(3), 7), count("A", day(1), 5), count("B", day(1), 9)]).await;
        let server = create_test_app(pool).await;

        let response = server.get("/api/bike/station").add_query_param("station", "A").await;
        response.assert_status_ok();
        response.assert_json(&json!([
            {"date": "2019-05-01", "number": 5},
            {"date": "2019-05-03", "number": 7},
        ]));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_requirement(pool: PgPool) {
        seed(
            &pool,
            &[
                count("A", day(1), 10),
                count("A", day(2), 11),
                count("A", day(3), 4),
                count("A", day(4), 100),
            ],
        )
        .await;
        let server = create_test_app(pool).await;

        // avg(10, 11) = 10.5 rounds to 11
        let response = server
            .get("/api/bikeReq/amount")
            .add_query_param("date", "2019-05-03")
            .add_query_param("station", "A")
            .await;
        response.assert_status_ok();
        response.assert_json(&json!(7));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_requirement_missing_data(pool: PgPool) {
        seed(&pool, &[count("A", day(1), 10), count("A", day(3), 4)]).await;
        let server = create_test_app(pool).await;

        for (date, station) in [("2019-05-01", "A"), ("2019-05-02", "A"), ("2019-05-03", "nowhere")] {
            let response = server
                .get("/api/bikeReq/amount")
                .add_query_param("date", date)
                .add_query_param("station", station)
                .await;
            response.assert_status(StatusCode::BAD_REQUEST);
            let body: Value = response.json();
            assert!(body["error"].is_string());
        }

        let response = server
            .get("/api/bikeReq/amount")
            .add_query_param("date", "yesterday")
            .add_query_param("station", "A")
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
        let body: Value = response.json();
        assert!(body["error"].is_string());
    }
}
