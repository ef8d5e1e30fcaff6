//! API response model for stations.

use crate::db::models::stations::StationDBResponse;
use crate::types::StationId;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct StationResponse {
    pub id: StationId,
    pub name: String,
    pub line: Option<String>,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
}

impl From<StationDBResponse> for StationResponse {
    fn from(db: StationDBResponse) -> Self {
        Self {
            id: db.id,
            name: db.name,
            line: db.line,
            lat: db.lat,
            lng: db.lng,
        }
    }
}
