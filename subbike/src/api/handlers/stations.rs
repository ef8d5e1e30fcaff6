use axum::{Json, extract::State};

use crate::{AppState, api::models::stations::StationResponse, db::handlers::Stations, errors::Error};

/// List every known station
#[utoipa::path(
    get,
    path = "/api/stations/all",
    tag = "stations",
    responses(
        (status = 200, description = "All stations, ordered by ID", body = [StationResponse]),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn list_stations(State(state): State<AppState>) -> Result<Json<Vec<StationResponse>>, Error> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let stations = Stations::new(&mut conn).list_all().await?;

    Ok(Json(stations.into_iter().map(StationResponse::from).collect()))
}

#[cfg(test)]
mod tests {
    use crate::test_utils::create_test_app;
    use serde_json::json;
    use sqlx::PgPool;

    #[sqlx::test]
    #[test_log::test]
    async fn test_list_stations(pool: PgPool) {
        sqlx::query("INSERT INTO stations (name, line, lat, lng) VALUES ('Xizhimen', 'Line 2', 39.94, 116.35)")
            .execute(&pool)
            .await
            .unwrap();
        let server = create_test_app(pool).await;

        let response = server.get("/api/stations/all").await;
        response.assert_status_ok();
        response.assert_json(&json!([
            {"id": 1, "name": "Xizhimen", "line": "Line 2", "lat": 39.94, "lng": 116.35},
        ]));
    }
}
