use actix_web::{delete, get, http::StatusCode, post, put, web, HttpResponse, Responder};
use log::info;
use serde::Deserialize;
use validator::Validate;

use crate::{
    auth::{CurrentUser, Identity},
    error::AppError,
    models::{
        ApiResponse, AssignTaskInput, NewTask, PageQuery, Paginated, Role, Slice, Task,
        TaskInput, TaskResponse, TaskStatus, User,
    },
    store::{TaskStore, UserStore},
};

const INVALID_TASK_ID: &str = "Invalid task id";
const UNKNOWN_USER: &str = "User does not exist!";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskIdQuery {
    pub task_id: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusQuery {
    pub status: String,
    pub task_id: i64,
}

/// Creates an unassigned task. ADMIN only.
///
/// ## Responses:
/// - `201 Created`: the stored task.
/// - `422 Unprocessable Entity`: if `TaskInput` validation fails.
#[post("/tasks")]
pub async fn create_task(
    tasks: web::Data<dyn TaskStore>,
    caller: CurrentUser,
    payload: web::Json<TaskInput>,
) -> Result<impl Responder, AppError> {
    let input = payload.into_inner();
    input.validate()?;

    let task = tasks.insert_task(NewTask::new(input, &caller.0.subject)).await?;
    info!("Task {} created by {}", task.id, caller.0.role);

    Ok(HttpResponse::Created().json(ApiResponse::success(
        StatusCode::CREATED,
        TaskResponse::unassigned(task),
    )))
}

/// Creates a task and assigns it to the account named by `firstName` + `lastName`.
/// ADMIN only.
///
/// ## Responses:
/// - `201 Created`: the stored task with its assignee.
/// - `400 Bad Request`: names missing.
/// - `404 Not Found`: no account with those names.
#[post("/tasks_assign")]
pub async fn create_and_assign_task(
    tasks: web::Data<dyn TaskStore>,
    users: web::Data<dyn UserStore>,
    caller: CurrentUser,
    payload: web::Json<TaskInput>,
) -> Result<impl Responder, AppError> {
    let input = payload.into_inner();
    input.validate()?;

    let (first_name, last_name) = match (&input.first_name, &input.last_name) {
        (Some(first), Some(last)) if !first.trim().is_empty() && !last.trim().is_empty() => {
            (first.trim().to_string(), last.trim().to_string())
        }
        _ => {
            return Err(AppError::BadRequest(
                "First name and last name are required to assign a task".into(),
            ))
        }
    };
    let assignee = users
        .find_user_by_name(&first_name, &last_name)
        .await?
        .ok_or_else(|| AppError::NotFound(UNKNOWN_USER.into()))?;

    let subject = &caller.0.subject;
    let task = tasks
        .insert_task(NewTask::new(input, subject).assigned_to(assignee.id, subject))
        .await?;
    info!("Task {} created and assigned to user {}", task.id, assignee.id);

    Ok(HttpResponse::Created().json(ApiResponse::success(
        StatusCode::CREATED,
        TaskResponse::assigned(task, &assignee),
    )))
}

/// Lists tasks. An ADMIN sees every task; a USER sees the tasks assigned to them.
#[get("/tasks")]
pub async fn list_tasks(
    tasks: web::Data<dyn TaskStore>,
    users: web::Data<dyn UserStore>,
    caller: CurrentUser,
    page: web::Query<PageQuery>,
) -> Result<impl Responder, AppError> {
    let page = page.into_inner();
    page.validate()?;

    let slice = match caller.0.role {
        Role::Admin => tasks.page_tasks(page).await?,
        Role::User => {
            let account = caller_account(&users, &caller.0).await?;
            tasks.page_tasks_for_user(account.id, page).await?
        }
    };

    Ok(HttpResponse::Ok().json(ApiResponse::success(
        StatusCode::OK,
        with_assignees(&users, slice).await?,
    )))
}

/// Lists the tasks assigned to the caller, whatever their role.
#[get("/tasks/users")]
pub async fn list_my_tasks(
    tasks: web::Data<dyn TaskStore>,
    users: web::Data<dyn UserStore>,
    caller: CurrentUser,
    page: web::Query<PageQuery>,
) -> Result<impl Responder, AppError> {
    let page = page.into_inner();
    page.validate()?;

    let account = caller_account(&users, &caller.0).await?;
    let slice = tasks.page_tasks_for_user(account.id, page).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(
        StatusCode::OK,
        with_assignees(&users, slice).await?,
    )))
}

/// Replaces the editable fields of a task. A USER may only edit tasks assigned to them.
///
/// ## Responses:
/// - `200 OK`: the updated task.
/// - `400 Bad Request`: unknown task id, or a task the caller may not edit.
/// - `422 Unprocessable Entity`: if `TaskInput` validation fails.
#[put("/tasks")]
pub async fn update_task(
    tasks: web::Data<dyn TaskStore>,
    users: web::Data<dyn UserStore>,
    caller: CurrentUser,
    query: web::Query<TaskIdQuery>,
    payload: web::Json<TaskInput>,
) -> Result<impl Responder, AppError> {
    let input = payload.into_inner();
    input.validate()?;

    let mut task = editable_task(&tasks, &users, &caller.0, query.task_id).await?;
    task.apply(input);
    let task = tasks.save_task(task).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(
        StatusCode::OK,
        with_assignee(&users, task).await?,
    )))
}

/// Deletes a task. ADMIN only.
///
/// ## Responses:
/// - `202 Accepted`: task removed.
/// - `400 Bad Request`: unknown task id.
#[delete("/tasks")]
pub async fn delete_task(
    tasks: web::Data<dyn TaskStore>,
    query: web::Query<TaskIdQuery>,
) -> Result<impl Responder, AppError> {
    if !tasks.delete_task(query.task_id).await? {
        return Err(AppError::BadRequest(INVALID_TASK_ID.into()));
    }
    info!("Task {} deleted", query.task_id);

    Ok(HttpResponse::Accepted().json(ApiResponse::empty(StatusCode::ACCEPTED, "Successful")))
}

/// Assigns an existing task to the account with the given email. ADMIN only.
#[put("/assign")]
pub async fn assign_task(
    tasks: web::Data<dyn TaskStore>,
    users: web::Data<dyn UserStore>,
    caller: CurrentUser,
    payload: web::Json<AssignTaskInput>,
) -> Result<impl Responder, AppError> {
    let mut input = payload.into_inner();
    input.email = input.email.trim().to_lowercase();
    input.validate()?;

    let assignee = users
        .find_user_by_email(&input.email)
        .await?
        .ok_or_else(|| AppError::NotFound(UNKNOWN_USER.into()))?;
    let mut task = tasks
        .find_task(input.task_id)
        .await?
        .ok_or_else(|| AppError::BadRequest(INVALID_TASK_ID.into()))?;

    task.user_id = Some(assignee.id);
    task.assign_by = Some(caller.0.subject.clone());
    let task = tasks.save_task(task).await?;
    info!("Task {} assigned to user {}", task.id, assignee.id);

    Ok(HttpResponse::Ok().json(ApiResponse::success(
        StatusCode::OK,
        TaskResponse::assigned(task, &assignee),
    )))
}

/// Moves a task to another status. Any authenticated caller; a USER only on their own tasks.
#[put("/task_status")]
pub async fn update_task_status(
    tasks: web::Data<dyn TaskStore>,
    users: web::Data<dyn UserStore>,
    caller: CurrentUser,
    query: web::Query<StatusQuery>,
) -> Result<impl Responder, AppError> {
    let status: TaskStatus = query.status.parse().map_err(AppError::BadRequest)?;

    let mut task = editable_task(&tasks, &users, &caller.0, query.task_id).await?;
    task.status = status;
    let task = tasks.save_task(task).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(
        StatusCode::OK,
        with_assignee(&users, task).await?,
    )))
}

async fn caller_account(
    users: &web::Data<dyn UserStore>,
    caller: &Identity,
) -> Result<User, AppError> {
    users
        .find_user_by_email(&caller.subject)
        .await?
        .ok_or_else(|| AppError::NotFound(UNKNOWN_USER.into()))
}

/// Loads a task the caller may modify. Foreign tasks look exactly like unknown ones.
async fn editable_task(
    tasks: &web::Data<dyn TaskStore>,
    users: &web::Data<dyn UserStore>,
    caller: &Identity,
    task_id: i64,
) -> Result<Task, AppError> {
    let task = tasks
        .find_task(task_id)
        .await?
        .ok_or_else(|| AppError::BadRequest(INVALID_TASK_ID.into()))?;

    match caller.role {
        Role::Admin => Ok(task),
        Role::User => {
            let account = caller_account(users, caller).await?;
            if task.user_id == Some(account.id) {
                Ok(task)
            } else {
                Err(AppError::BadRequest(INVALID_TASK_ID.into()))
            }
        }
    }
}

async fn with_assignee(
    users: &web::Data<dyn UserStore>,
    task: Task,
) -> Result<TaskResponse, AppError> {
    let assignee = match task.user_id {
        Some(id) => users.find_user_by_id(id).await?,
        None => None,
    };
    Ok(match assignee {
        Some(user) => TaskResponse::assigned(task, &user),
        None => TaskResponse::unassigned(task),
    })
}

async fn with_assignees(
    users: &web::Data<dyn UserStore>,
    slice: Slice<Task>,
) -> Result<Paginated<TaskResponse>, AppError> {
    let mut items = Vec::with_capacity(slice.items.len());
    for task in slice.items {
        items.push(with_assignee(users, task).await?);
    }
    Ok(Paginated::from(Slice {
        items,
        page: slice.page,
        has_next: slice.has_next,
    }))
}
