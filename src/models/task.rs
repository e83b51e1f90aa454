use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use sqlx::FromRow;
use validator::Validate;

use super::not_blank;
use super::user::User;

/// Represents the status of a task.
/// Corresponds to the `task_status` SQL enum.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "task_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    /// Task is yet to be started.
    Todo,
    /// Task is currently being worked on.
    InProgress,
    /// Task cannot progress until something else happens.
    Blocked,
    /// Task is completed.
    Done,
}

impl FromStr for TaskStatus {
    type Err = String;

    /// Case-insensitive, accepts `in_progress` and `IN_PROGRESS` alike.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "TODO" => Ok(TaskStatus::Todo),
            "IN_PROGRESS" => Ok(TaskStatus::InProgress),
            "BLOCKED" => Ok(TaskStatus::Blocked),
            "DONE" => Ok(TaskStatus::Done),
            other => Err(format!("Unknown task status: {other}")),
        }
    }
}

/// Input structure for creating or updating a task.
#[derive(Debug, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct TaskInput {
    /// Planned duration, one to seven days.
    #[validate(range(min = 1, max = 7, message = "Period should be between 1 and 7 days"))]
    pub period_in_days: i32,

    /// Accepts a plain `yyyy-MM-dd` date or an RFC 3339 timestamp.
    #[serde(deserialize_with = "date_or_timestamp")]
    pub start_date: DateTime<Utc>,

    pub status: TaskStatus,

    #[validate(
        custom(function = "not_blank", message = "Task title should not be empty!"),
        length(max = 255)
    )]
    pub task_title: String,

    #[validate(length(max = 1000))]
    pub task_details: Option<String>,

    /// Assignee lookup for the create-and-assign route.
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

/// Assigns an existing task to the account with the given email.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AssignTaskInput {
    #[validate(range(min = 1, message = "Task id can not be less than 1!"))]
    pub task_id: i64,
    #[validate(email(message = "Email is invalid!"))]
    pub email: String,
}

/// A task as stored and returned by the API.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: i64,
    /// Assignee, if any.
    pub user_id: Option<i64>,
    pub period_in_days: i32,
    pub start_date: DateTime<Utc>,
    pub status: TaskStatus,
    pub task_title: String,
    pub task_details: Option<String>,
    /// Subject of the admin who created the task.
    pub created_by: String,
    /// Subject of the admin who last assigned the task.
    pub assign_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Task {
    /// Copies the editable fields of `input` onto this task.
    pub fn apply(&mut self, input: TaskInput) {
        self.period_in_days = input.period_in_days;
        self.start_date = input.start_date;
        self.status = input.status;
        self.task_title = input.task_title;
        self.task_details = input.task_details;
    }
}

/// Fields required to insert a task.
#[derive(Debug, Clone)]
pub struct NewTask {
    pub user_id: Option<i64>,
    pub period_in_days: i32,
    pub start_date: DateTime<Utc>,
    pub status: TaskStatus,
    pub task_title: String,
    pub task_details: Option<String>,
    pub created_by: String,
    pub assign_by: Option<String>,
}

impl NewTask {
    pub fn new(input: TaskInput, created_by: &str) -> Self {
        Self {
            user_id: None,
            period_in_days: input.period_in_days,
            start_date: input.start_date,
            status: input.status,
            task_title: input.task_title,
            task_details: input.task_details,
            created_by: created_by.to_string(),
            assign_by: None,
        }
    }

    pub fn assigned_to(mut self, user_id: i64, assign_by: &str) -> Self {
        self.user_id = Some(user_id);
        self.assign_by = Some(assign_by.to_string());
        self
    }
}

/// A task together with its assignee's names.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskResponse {
    #[serde(flatten)]
    pub task: Task,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
}

impl TaskResponse {
    pub fn unassigned(task: Task) -> Self {
        Self {
            task,
            first_name: None,
            last_name: None,
            email: None,
        }
    }

    pub fn assigned(task: Task, assignee: &User) -> Self {
        Self {
            task,
            first_name: Some(assignee.first_name.clone()),
            last_name: Some(assignee.last_name.clone()),
            email: Some(assignee.email.clone()),
        }
    }
}

fn date_or_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(&raw) {
        return Ok(timestamp.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(&raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
        .ok_or_else(|| serde::de::Error::custom(format!("invalid date: {raw}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn input(title: &str, period: i32) -> TaskInput {
        TaskInput {
            period_in_days: period,
            start_date: Utc::now(),
            status: TaskStatus::Todo,
            task_title: title.to_string(),
            task_details: Some("Details".to_string()),
            first_name: None,
            last_name: None,
        }
    }

    #[test]
    fn test_task_input_validation() {
        assert!(input("Write report", 3).validate().is_ok());
        assert!(input("   ", 3).validate().is_err());
        assert!(input("Write report", 0).validate().is_err());
        assert!(input("Write report", 8).validate().is_err());

        let mut long_details = input("Write report", 3);
        long_details.task_details = Some("b".repeat(1001));
        assert!(long_details.validate().is_err());
    }

    #[test]
    fn test_start_date_formats() {
        let parsed: TaskInput = serde_json::from_value(json!({
            "periodInDays": 2,
            "startDate": "2024-05-01",
            "status": "IN_PROGRESS",
            "taskTitle": "Plan sprint"
        }))
        .unwrap();
        assert_eq!(parsed.start_date.to_rfc3339(), "2024-05-01T00:00:00+00:00");
        assert_eq!(parsed.status, TaskStatus::InProgress);

        let parsed: TaskInput = serde_json::from_value(json!({
            "periodInDays": 2,
            "startDate": "2024-05-01T09:30:00+02:00",
            "status": "DONE",
            "taskTitle": "Plan sprint"
        }))
        .unwrap();
        assert_eq!(parsed.start_date.to_rfc3339(), "2024-05-01T07:30:00+00:00");

        let bad = serde_json::from_value::<TaskInput>(json!({
            "periodInDays": 2,
            "startDate": "first of may",
            "status": "DONE",
            "taskTitle": "Plan sprint"
        }));
        assert!(bad.is_err());
    }

    #[test]
    fn test_status_from_str() {
        assert_eq!("in_progress".parse::<TaskStatus>(), Ok(TaskStatus::InProgress));
        assert_eq!("BLOCKED".parse::<TaskStatus>(), Ok(TaskStatus::Blocked));
        assert!("finished".parse::<TaskStatus>().is_err());
    }

    #[test]
    fn test_new_task_assignment() {
        let task = NewTask::new(input("Write report", 3), "admin@example.com")
            .assigned_to(7, "admin@example.com");
        assert_eq!(task.user_id, Some(7));
        assert_eq!(task.assign_by.as_deref(), Some("admin@example.com"));
        assert_eq!(task.created_by, "admin@example.com");
    }
}
