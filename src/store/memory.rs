use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use super::{TaskStore, UserStore, DUPLICATE_EMAIL};
use crate::error::AppError;
use crate::models::{NewTask, NewUser, PageQuery, Role, Slice, Task, User};

#[derive(Debug, Default)]
struct State {
    users: BTreeMap<i64, User>,
    tasks: BTreeMap<i64, Task>,
    next_user_id: i64,
    next_task_id: i64,
}

/// Process-local store. Ids start at 1 and are never reused.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn page_of<T: Clone>(mut rows: Vec<T>, page: PageQuery) -> Slice<T> {
    let offset = page.offset() as usize;
    let limit = page.probe_limit() as usize;
    let rows = if offset >= rows.len() {
        Vec::new()
    } else {
        rows.drain(offset..).take(limit).collect()
    };
    Slice::from_probe(rows, page)
}

fn newest_first(tasks: &mut [Task]) {
    tasks.sort_by(|a, b| b.updated_at.cmp(&a.updated_at).then(b.id.cmp(&a.id)));
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn insert_user(&self, user: NewUser) -> Result<User, AppError> {
        let mut state = self.state.write().await;
        if state.users.values().any(|u| u.email == user.email) {
            return Err(AppError::BadRequest(DUPLICATE_EMAIL.into()));
        }
        state.next_user_id += 1;
        let stored = User {
            id: state.next_user_id,
            first_name: user.first_name,
            last_name: user.last_name,
            email: user.email,
            password_hash: user.password_hash,
            phone_number: user.phone_number,
            address: user.address,
            gender: user.gender,
            role: user.role,
            created_at: Utc::now(),
        };
        state.users.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let state = self.state.read().await;
        Ok(state.users.values().find(|u| u.email == email).cloned())
    }

    async fn find_user_by_id(&self, id: i64) -> Result<Option<User>, AppError> {
        Ok(self.state.read().await.users.get(&id).cloned())
    }

    async fn find_user_by_name(
        &self,
        first_name: &str,
        last_name: &str,
    ) -> Result<Option<User>, AppError> {
        let state = self.state.read().await;
        Ok(state
            .users
            .values()
            .find(|u| u.first_name == first_name && u.last_name == last_name)
            .cloned())
    }

    async fn exists_by_email(&self, email: &str) -> Result<bool, AppError> {
        let state = self.state.read().await;
        Ok(state.users.values().any(|u| u.email == email))
    }

    async fn page_users_by_role(
        &self,
        role: Role,
        page: PageQuery,
    ) -> Result<Slice<User>, AppError> {
        let state = self.state.read().await;
        let users = state
            .users
            .values()
            .filter(|u| u.role == role)
            .cloned()
            .collect();
        Ok(page_of(users, page))
    }
}

#[async_trait]
impl TaskStore for MemoryStore {
    async fn insert_task(&self, task: NewTask) -> Result<Task, AppError> {
        let mut state = self.state.write().await;
        state.next_task_id += 1;
        let now = Utc::now();
        let stored = Task {
            id: state.next_task_id,
            user_id: task.user_id,
            period_in_days: task.period_in_days,
            start_date: task.start_date,
            status: task.status,
            task_title: task.task_title,
            task_details: task.task_details,
            created_by: task.created_by,
            assign_by: task.assign_by,
            created_at: now,
            updated_at: now,
        };
        state.tasks.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn find_task(&self, id: i64) -> Result<Option<Task>, AppError> {
        Ok(self.state.read().await.tasks.get(&id).cloned())
    }

    async fn save_task(&self, mut task: Task) -> Result<Task, AppError> {
        let mut state = self.state.write().await;
        let Some(slot) = state.tasks.get_mut(&task.id) else {
            return Err(AppError::NotFound(format!("Task {} not found", task.id)));
        };
        task.updated_at = Utc::now();
        *slot = task.clone();
        Ok(task)
    }

    async fn delete_task(&self, id: i64) -> Result<bool, AppError> {
        Ok(self.state.write().await.tasks.remove(&id).is_some())
    }

    async fn page_tasks(&self, page: PageQuery) -> Result<Slice<Task>, AppError> {
        let mut tasks: Vec<Task> = self.state.read().await.tasks.values().cloned().collect();
        newest_first(&mut tasks);
        Ok(page_of(tasks, page))
    }

    async fn page_tasks_for_user(
        &self,
        user_id: i64,
        page: PageQuery,
    ) -> Result<Slice<Task>, AppError> {
        let mut tasks: Vec<Task> = self
            .state
            .read()
            .await
            .tasks
            .values()
            .filter(|t| t.user_id == Some(user_id))
            .cloned()
            .collect();
        newest_first(&mut tasks);
        Ok(page_of(tasks, page))
    }
}
