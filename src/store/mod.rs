//! Persistence behind the HTTP handlers.
//!
//! Handlers only see the [`UserStore`] and [`TaskStore`] traits, shared as
//! `web::Data<dyn UserStore>` / `web::Data<dyn TaskStore>`. [`PgStore`] backs a real
//! deployment; [`MemoryStore`] backs the tests and runs when no database is configured.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;

use crate::error::AppError;
use crate::models::{NewTask, NewUser, PageQuery, Role, Slice, Task, User};

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Message returned when a signup reuses an existing email.
pub const DUPLICATE_EMAIL: &str = "Email already exist!";

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Inserts an account. Emails are unique; a duplicate is a `BadRequest`.
    async fn insert_user(&self, user: NewUser) -> Result<User, AppError>;

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError>;

    async fn find_user_by_id(&self, id: i64) -> Result<Option<User>, AppError>;

    /// First account whose first and last name match exactly.
    async fn find_user_by_name(
        &self,
        first_name: &str,
        last_name: &str,
    ) -> Result<Option<User>, AppError>;

    async fn exists_by_email(&self, email: &str) -> Result<bool, AppError>;

    /// Accounts holding `role`, oldest first.
    async fn page_users_by_role(&self, role: Role, page: PageQuery)
        -> Result<Slice<User>, AppError>;
}

#[async_trait]
pub trait TaskStore: Send + Sync {
    async fn insert_task(&self, task: NewTask) -> Result<Task, AppError>;

    async fn find_task(&self, id: i64) -> Result<Option<Task>, AppError>;

    /// Writes back every field of an existing task and bumps `updated_at`.
    /// An unknown id is `NotFound`.
    async fn save_task(&self, task: Task) -> Result<Task, AppError>;

    /// Returns whether a task was removed.
    async fn delete_task(&self, id: i64) -> Result<bool, AppError>;

    /// All tasks, most recently updated first.
    async fn page_tasks(&self, page: PageQuery) -> Result<Slice<Task>, AppError>;

    /// Tasks assigned to `user_id`, most recently updated first.
    async fn page_tasks_for_user(
        &self,
        user_id: i64,
        page: PageQuery,
    ) -> Result<Slice<Task>, AppError>;
}
