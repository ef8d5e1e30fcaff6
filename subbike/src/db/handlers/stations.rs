//! Database repository for stations.

use sqlx::PgConnection;
use tracing::instrument;

use crate::db::{errors::Result, models::stations::StationDBResponse};

pub struct Stations<'c> {
    db: &'c mut PgConnection,
}

impl<'c> Stations<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    #[instrument(skip(self), err)]
    pub async fn list_all(&mut self) -> Result<Vec<StationDBResponse>> {
        let stations = sqlx::query_as::<_, StationDBResponse>("SELECT id, name, line, lat, lng FROM stations ORDER BY id")
            .fetch_all(&mut *self.db)
            .await?;

        Ok(stations)
    }
}
