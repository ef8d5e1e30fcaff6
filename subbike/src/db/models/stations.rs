//! Database models for stations.

use crate::types::StationId;
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow)]
pub struct StationDBResponse {
    pub id: StationId,
    pub name: String,
    pub line: Option<String>,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
}
