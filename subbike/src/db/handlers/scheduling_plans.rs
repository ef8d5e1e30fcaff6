//! Database repository for scheduling plans.


use sqlx::PgConnection;
use tracing::instrument;

use crate::{
    db::{
        errors::{DbError, Result},
        handlers::repository::Repository,
        models::scheduling_plans::{PlanCreateDBRequest, PlanDBResponse, PlanFilter, PlanUpdateDBRequest},
    },
    types::PlanId,
};

// Every read joins the owner so responses can carry `created_by_username`.
const PLAN_SELECT: &str = r#"
    SELECT p.id, p.name, p.description, p.source_station_name, p.target_station_name, p.bike_count,
           p.schedule_time, p.priority, p.path_data, p.status, p.user_id,
           u.username AS created_by_username, p.created_at, p.updated_at
    FROM scheduling_plans p
    JOIN users u ON u.id = p.user_id
"#;

pub struct SchedulingPlans<'c> {
    db: &'c mut PgConnection,
}

#[async_trait::async_trait]
impl<'c> Repository for SchedulingPlans<'c> {
    type CreateRequest = PlanCreateDBRequest;
    type UpdateRequest = PlanUpdateDBRequest;
    type Response = PlanDBResponse;
    type Id = PlanId;
    type Filter = PlanFilter;

    #[instrument(skip(self, request), fields(user_id = request.user_id, name = %request.name), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let id: PlanId = sqlx::query_scalar(
            r#"
            INSERT INTO scheduling_plans
                (name, description, source_station_name, target_station_name, bike_count,
                 schedule_time, priority, path_data, status, user_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, 'PENDING', $9)
            RETURNING id
            "#,
        )
        .bind(&request.name)
        .bind(&request.description)
        .bind(&request.source_station_name)
        .bind(&request.target_station_name)
        .bind(request.bike_count)
        .bind(request.schedule_time)
        .bind(request.priority)
        .bind(&request.path_data)
        .bind(request.user_id)
        .fetch_one(&mut *self.db)
        .await?;

        self.get_by_id(id).await?.ok_or(DbError::NotFound)
    }

    #[instrument(skip(self), fields(plan_id = id), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let plan = sqlx::query_as::<_, PlanDBResponse>(&format!("{PLAN_SELECT} WHERE p.id = $1"))
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(plan)
    }

    /// Newest first
    #[instrument(skip(self, filter), fields(owner = ?filter.owner), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let plans = match filter.owner {
            Some(owner) => {
                sqlx::query_as::<_, PlanDBResponse>(&format!("{PLAN_SELECT} WHERE p.user_id = $1 ORDER BY p.created_at DESC, p.id DESC"))
                    .bind(owner)
                    .fetch_all(&mut *self.db)
                    .await?
            }
            None => {
                sqlx::query_as::<_, PlanDBResponse>(&format!("{PLAN_SELECT} ORDER BY p.created_at DESC, p.id DESC"))
                    .fetch_all(&mut *self.db)
                    .await?
            }
        };

        Ok(plans)
    }

    #[instrument(skip(self), fields(plan_id = id), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        let result = sqlx::query("DELETE FROM scheduling_plans WHERE id = $1")
            .bind(id)
            .execute(&mut *self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self, request), fields(plan_id = id), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        let result = sqlx::query(
            r#"
            UPDATE scheduling_plans SET
                name = $2,
                description = $3,
                schedule_time = $4,
                priority = $5,
                path_data = $6,
                status = COALESCE($7, status),
                updated_at = NOW() AT TIME ZONE 'UTC'
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(&request.name)
        .bind(&request.description)
        .bind(request.schedule_time)
        .bind(request.priority)
        .bind(&request.path_data)
        .bind(request.status)
        .execute(&mut *self.db)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::NotFound);
        }

        self.get_by_id(id).await?.ok_or(DbError::NotFound)
    }
}

impl<'c> SchedulingPlans<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::models::{
        scheduling_plans::{PlanStatus, SchedulingPlanCreate, SchedulingPlanUpdate},
        users::Role,
    };
    use crate::test_utils::create_test_user;
    use chrono::NaiveDate;
    use sqlx::PgPool;

    fn plan(name: &str) -> SchedulingPlanCreate {
        SchedulingPlanCreate {
            name: Some(name.to_string()),
            description: Some("move bikes".to_string()),
            source_station_name: Some("Xizhimen".to_string()),
            target_station_name: Some("Dongzhimen".to_string()),
            bike_count: Some(15),
            schedule_time: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap().and_hms_opt(8, 0, 0),
            priority: Some(1),
            path_data: Some("[[116.35,39.94],[116.43,39.94]]".to_string()),
        }
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_create_forces_pending_and_joins_owner(pool: PgPool) {
        let owner = create_test_user(&pool, Role::Manager).await;
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = SchedulingPlans::new(&mut conn);

        let created = repo
            .create(&PlanCreateDBRequest::new(owner.id, "Morning".to_string(), plan("Morning")))
            .await
            .unwrap();

        assert_eq!(created.status, PlanStatus::Pending);
        assert_eq!(created.user_id, owner.id);
        assert_eq!(created.created_by_username, owner.username);
        assert_eq!(created.bike_count, Some(15));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_list_filters_by_owner(pool: PgPool) {
        let alice = create_test_user(&pool, Role::User).await;
        let bob = create_test_user(&pool, Role::User).await;
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = SchedulingPlans::new(&mut conn);

        let first = repo.create(&PlanCreateDBRequest::new(alice.id, "a1".to_string(), plan("a1"))).await.unwrap();
        let second = repo.create(&PlanCreateDBRequest::new(alice.id, "a2".to_string(), plan("a2"))).await.unwrap();
        repo.create(&PlanCreateDBRequest::new(bob.id, "b1".to_string(), plan("b1"))).await.unwrap();

        let mine = repo.list(&PlanFilter { owner: Some(alice.id) }).await.unwrap();
        assert_eq!(mine.iter().map(|p| p.id).collect::<Vec<_>>(), vec![second.id, first.id]);

        let all = repo.list(&PlanFilter::default()).await.unwrap();
        assert_eq!(all.len(), 3);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_update_keeps_stations_and_optional_status(pool: PgPool) {
        let owner = create_test_user(&pool, Role::User).await;
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = SchedulingPlans::new(&mut conn);

        let created = repo.create(&PlanCreateDBRequest::new(owner.id, "p".to_string(), plan("p"))).await.unwrap();

        let update = SchedulingPlanUpdate {
            name: Some("renamed".to_string()),
            description: None,
            schedule_time: None,
            priority: Some(3),
            path_data: None,
            status: None,
        };
        let updated = repo
            .update(created.id, &PlanUpdateDBRequest::new("renamed".to_string(), update))
            .await
            .unwrap();

        assert_eq!(updated.name, "renamed");
        assert_eq!(updated.description, None);
        assert_eq!(updated.priority, Some(3));
        assert_eq!(updated.status, PlanStatus::Pending);
        assert_eq!(updated.source_station_name.as_deref(), Some("Xizhimen"));
        assert_eq!(updated.bike_count, Some(15));
        assert!(updated.updated_at >= created.updated_at);

        let completed = repo
            .update(
                created.id,
                &PlanUpdateDBRequest::new(
                    "renamed".to_string(),
                    SchedulingPlanUpdate {
                        status: Some(PlanStatus::Completed),
                        ..Default::default()
                    },
                ),
            )
            .await
            .unwrap();
        assert_eq!(completed.status, PlanStatus::Completed);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_missing_plan(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = SchedulingPlans::new(&mut conn);

        assert!(repo.get_by_id(999).await.unwrap().is_none());
        assert!(!repo.delete(999).await.unwrap());
        let result = repo
            .update(999, &PlanUpdateDBRequest::new("x".to_string(), SchedulingPlanUpdate::default()))
            .await;
        assert!(matches!(result, Err(DbError::NotFound)));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_plans_removed_with_owner(pool: PgPool) {
        let owner = create_test_user(&pool, Role::User).await;
        let mut conn = pool.acquire().await.unwrap();

        let plan_id = {
            let mut repo = SchedulingPlans::new(&mut conn);
            repo.create(&PlanCreateDBRequest::new(owner.id, "p".to_string(), plan("p"))).await.unwrap().id
        };
        sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(owner.id)
            .execute(&mut *conn)
            .await
            .unwrap();

        let mut repo = SchedulingPlans::new(&mut conn);
        assert!(repo.get_by_id(plan_id).await.unwrap().is_none());
    }
}
