use std::time::Duration;

use async_trait::async_trait;
use log::info;
use sqlx::postgres::{PgPool, PgPoolOptions};

use super::{TaskStore, UserStore, DUPLICATE_EMAIL};
use crate::error::AppError;
use crate::models::{NewTask, NewUser, PageQuery, Role, Slice, Task, User};

const USER_COLUMNS: &str = "id, first_name, last_name, email, password_hash, phone_number, \
     address, gender, role, created_at";

const TASK_COLUMNS: &str = "id, user_id, period_in_days, start_date, status, task_title, \
     task_details, created_by, assign_by, created_at, updated_at";

/// Postgres-backed store. Queries are checked at runtime, so building the crate
/// needs no database.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Connects and applies the embedded migrations.
    pub async fn connect(database_url: &str) -> Result<Self, AppError> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .acquire_timeout(Duration::from_secs(5))
            .connect(database_url)
            .await?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Migration failed: {}", e)))?;

        info!("Connected to Postgres, migrations applied");
        Ok(Self { pool })
    }
}

fn insert_error(error: sqlx::Error) -> AppError {
    match &error {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            AppError::BadRequest(DUPLICATE_EMAIL.into())
        }
        _ => error.into(),
    }
}

#[async_trait]
impl UserStore for PgStore {
    async fn insert_user(&self, user: NewUser) -> Result<User, AppError> {
        let sql = format!(
            "INSERT INTO users (first_name, last_name, email, password_hash, phone_number, address, gender, role) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING {}",
            USER_COLUMNS
        );
        sqlx::query_as::<_, User>(&sql)
            .bind(user.first_name)
            .bind(user.last_name)
            .bind(user.email)
            .bind(user.password_hash)
            .bind(user.phone_number)
            .bind(user.address)
            .bind(user.gender)
            .bind(user.role)
            .fetch_one(&self.pool)
            .await
            .map_err(insert_error)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let sql = format!("SELECT {} FROM users WHERE email = $1", USER_COLUMNS);
        Ok(sqlx::query_as::<_, User>(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn find_user_by_id(&self, id: i64) -> Result<Option<User>, AppError> {
        let sql = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);
        Ok(sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn find_user_by_name(
        &self,
        first_name: &str,
        last_name: &str,
    ) -> Result<Option<User>, AppError> {
        let sql = format!(
            "SELECT {} FROM users WHERE first_name = $1 AND last_name = $2 ORDER BY id LIMIT 1",
            USER_COLUMNS
        );
        Ok(sqlx::query_as::<_, User>(&sql)
            .bind(first_name)
            .bind(last_name)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn exists_by_email(&self, email: &str) -> Result<bool, AppError> {
        Ok(
            sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM users WHERE email = $1)")
                .bind(email)
                .fetch_one(&self.pool)
                .await?,
        )
    }

    async fn page_users_by_role(
        &self,
        role: Role,
        page: PageQuery,
    ) -> Result<Slice<User>, AppError> {
        let sql = format!(
            "SELECT {} FROM users WHERE role = $1 ORDER BY id LIMIT $2 OFFSET $3",
            USER_COLUMNS
        );
        let rows = sqlx::query_as::<_, User>(&sql)
            .bind(role)
            .bind(page.probe_limit())
            .bind(page.offset())
            .fetch_all(&self.pool)
            .await?;
        Ok(Slice::from_probe(rows, page))
    }
}

#[async_trait]
impl TaskStore for PgStore {
    async fn insert_task(&self, task: NewTask) -> Result<Task, AppError> {
        let sql = format!(
            "INSERT INTO tasks (user_id, period_in_days, start_date, status, task_title, task_details, created_by, assign_by) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING {}",
            TASK_COLUMNS
        );
        Ok(sqlx::query_as::<_, Task>(&sql)
            .bind(task.user_id)
            .bind(task.period_in_days)
            .bind(task.start_date)
            .bind(task.status)
            .bind(task.task_title)
            .bind(task.task_details)
            .bind(task.created_by)
            .bind(task.assign_by)
            .fetch_one(&self.pool)
            .await?)
    }

    async fn find_task(&self, id: i64) -> Result<Option<Task>, AppError> {
        let sql = format!("SELECT {} FROM tasks WHERE id = $1", TASK_COLUMNS);
        Ok(sqlx::query_as::<_, Task>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn save_task(&self, task: Task) -> Result<Task, AppError> {
        let sql = format!(
            "UPDATE tasks SET user_id = $1, period_in_days = $2, start_date = $3, status = $4, \
             task_title = $5, task_details = $6, assign_by = $7, updated_at = NOW() \
             WHERE id = $8 RETURNING {}",
            TASK_COLUMNS
        );
        sqlx::query_as::<_, Task>(&sql)
            .bind(task.user_id)
            .bind(task.period_in_days)
            .bind(task.start_date)
            .bind(task.status)
            .bind(task.task_title)
            .bind(task.task_details)
            .bind(task.assign_by)
            .bind(task.id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Task {} not found", task.id)))
    }

    async fn delete_task(&self, id: i64) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn page_tasks(&self, page: PageQuery) -> Result<Slice<Task>, AppError> {
        let sql = format!(
            "SELECT {} FROM tasks ORDER BY updated_at DESC, id DESC LIMIT $1 OFFSET $2",
            TASK_COLUMNS
        );
        let rows = sqlx::query_as::<_, Task>(&sql)
            .bind(page.probe_limit())
            .bind(page.offset())
            .fetch_all(&self.pool)
            .await?;
        Ok(Slice::from_probe(rows, page))
    }

    async fn page_tasks_for_user(
        &self,
        user_id: i64,
        page: PageQuery,
    ) -> Result<Slice<Task>, AppError> {
        let sql = format!(
            "SELECT {} FROM tasks WHERE user_id = $1 ORDER BY updated_at DESC, id DESC LIMIT $2 OFFSET $3",
            TASK_COLUMNS
        );
        let rows = sqlx::query_as::<_, Task>(&sql)
            .bind(user_id)
            .bind(page.probe_limit())
            .bind(page.offset())
            .fetch_all(&self.pool)
            .await?;
        Ok(Slice::from_probe(rows, page))
    }
}
