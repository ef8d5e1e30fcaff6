//! Database queries for metro flow and shared-bike counts.
//!
//! All aggregation happens in PostgreSQL; each function issues a single statement.

use chrono::NaiveDate;
use sqlx::{PgConnection, PgPool};
use tracing::instrument;

use crate::db::{
    errors::Result,
    models::ridership::{BikeAmount, DailyFlowRow, HourlyFlowRow, StationFlowRow, SubAmount},
};

/// Number of stations returned by the "top stations" rankings
pub const TOP_STATIONS: i64 = 10;

/// Per-station in/out sums for one day, busiest (in + out) first.
///
/// `limit` of `None` returns every station.
#[instrument(skip(db), err)]
pub async fn station_flows_on(db: &PgPool, date: NaiveDate, limit: Option<i64>) -> Result<Vec<StationFlowRow>> {
    let rows = sqlx::query_as::<_, StationFlowRow>(
        r#"
        SELECT station,
               SUM(in_num)::BIGINT AS in_sum,
               SUM(out_num)::BIGINT AS out_sum
        FROM sub_amounts
        WHERE date = $1
        GROUP BY station
        ORDER BY SUM(in_num + out_num) DESC, station
        LIMIT $2
        "#,
    )
    .bind(date)
    .bind(limit)
    .fetch_all(db)
    .await?;

    Ok(rows)
}

/// Network-wide in/out sums for every day on record
#[instrument(skip(db), err)]
pub async fn daily_totals(db: &PgPool) -> Result<Vec<DailyFlowRow>> {
    let rows = sqlx::query_as::<_, DailyFlowRow>(
        r#"
        SELECT date,
               SUM(in_num)::BIGINT AS in_sum,
               SUM(out_num)::BIGINT AS out_sum
        FROM sub_amounts
        GROUP BY date
        ORDER BY date
        "#,
    )
    .fetch_all(db)
    .await?;

    Ok(rows)
}

/// Daily in/out sums for one station between `start` and `end`, inclusive
#[instrument(skip(db), err)]
pub async fn station_daily_flows(db: &PgPool, station: &str, start: NaiveDate, end: NaiveDate) -> Result<Vec<DailyFlowRow>> {
    let rows = sqlx::query_as::<_, DailyFlowRow>(
        r#"
        SELECT date,
               SUM(in_num)::BIGINT AS in_sum,
               SUM(out_num)::BIGINT AS out_sum
        FROM sub_amounts
        WHERE station = $1 AND date BETWEEN $2 AND $3
        GROUP BY date
        ORDER BY date
        "#,
    )
    .bind(station)
    .bind(start)
    .bind(end)
    .fetch_all(db)
    .await?;

    Ok(rows)
}

/// Network-wide in/out sums per hour slot for one day
#[instrument(skip(db), err)]
pub async fn hourly_flows_on(db: &PgPool, date: NaiveDate) -> Result<Vec<HourlyFlowRow>> {
    let rows = sqlx::query_as::<_, HourlyFlowRow>(
        r#"
        SELECT time_slot,
               SUM(in_num)::BIGINT AS in_sum,
               SUM(out_num)::BIGINT AS out_sum
        FROM sub_amounts
        WHERE date = $1
        GROUP BY time_slot
        ORDER BY time_slot
        "#,
    )
    .bind(date)
    .fetch_all(db)
    .await?;

    Ok(rows)
}

/// Insert or overwrite flow rows keyed by (date, station, time slot).
///
/// Rows must not repeat a key within one call.
#[instrument(skip(conn, rows), fields(count = rows.len()), err)]
pub async fn upsert_sub_amounts(conn: &mut PgConnection, rows: &[SubAmount]) -> Result<u64> {
    if rows.is_empty() {
        return Ok(0);
    }

    let dates: Vec<NaiveDate> = rows.iter().map(|r| r.date).collect();
    let stations: Vec<&str> = rows.iter().map(|r| r.station.as_str()).collect();
    let slots: Vec<i32> = rows.iter().map(|r| r.time_slot).collect();
    let ins: Vec<i64> = rows.iter().map(|r| r.in_num).collect();
    let outs: Vec<i64> = rows.iter().map(|r| r.out_num).collect();

    let result = sqlx::query(
        r#"
        INSERT INTO sub_amounts (date, station, time_slot, in_num, out_num)
        SELECT * FROM UNNEST($1::date[], $2::text[], $3::int[], $4::bigint[], $5::bigint[])
        ON CONFLICT (date, station, time_slot)
        DO UPDATE SET in_num = EXCLUDED.in_num, out_num = EXCLUDED.out_num
        "#,
    )
    .bind(&dates)
    .bind(&stations)
    .bind(&slots)
    .bind(&ins)
    .bind(&outs)
    .execute(conn)
    .await?;

    Ok(result.rows_affected())
}

/// Bike counts per station for one day, highest first
#[instrument(skip(db), err)]
pub async fn bike_counts_on(db: &PgPool, date: NaiveDate, limit: Option<i64>) -> Result<Vec<BikeAmount>> {
    let rows = sqlx::query_as::<_, BikeAmount>(
        r#"
        SELECT station, date, number
        FROM bike_amounts
        WHERE date = $1
        ORDER BY number DESC, station
        LIMIT $2
        "#,
    )
    .bind(date)
    .bind(limit)
    .fetch_all(db)
    .await?;

    Ok(rows)
}

/// Bike count history for one station, oldest first
#[instrument(skip(db), err)]
pub async fn bike_counts_for_station(db: &PgPool, station: &str) -> Result<Vec<BikeAmount>> {
    let rows = sqlx::query_as::<_, BikeAmount>(
        r#"
        SELECT station, date, number
        FROM bike_amounts
        WHERE station = $1
        ORDER BY date
        "#,
    )
    .bind(station)
    .fetch_all(db)
    .await?;

    Ok(rows)
}

/// Average count for a station over all days strictly before `date`
#[instrument(skip(db), err)]
pub async fn average_bike_count_before(db: &PgPool, station: &str, date: NaiveDate) -> Result<Option<f64>> {
    let avg: Option<f64> = sqlx::query_scalar(
        r#"
        SELECT AVG(number)::DOUBLE PRECISION
        FROM bike_amounts
        WHERE station = $1 AND date < $2
        "#,
    )
    .bind(station)
    .bind(date)
    .fetch_one(db)
    .await?;

    Ok(avg)
}

/// Count recorded for a station on exactly `date`
#[instrument(skip(db), err)]
pub async fn bike_count_on(db: &PgPool, station: &str, date: NaiveDate) -> Result<Option<i64>> {
    let number: Option<i64> = sqlx::query_scalar("SELECT number FROM bike_amounts WHERE station = $1 AND date = $2")
        .bind(station)
        .bind(date)
        .fetch_optional(db)
        .await?;

    Ok(number)
}
