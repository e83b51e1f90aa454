pub mod health;
pub mod tasks;
pub mod users;

use actix_web::{error, web};

use crate::error::AppError;

/// Registers every route. The caller wraps the app in `AuthMiddleware`; the
/// route policy, not the scope layout, decides who may call what.
pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(|err, _req| {
        error::Error::from(AppError::BadRequest(err.to_string()))
    }))
    .app_data(web::QueryConfig::default().error_handler(|err, _req| {
        error::Error::from(AppError::BadRequest(err.to_string()))
    }))
    .service(health::health)
    .service(
        web::scope("/api/v1")
            .service(
                web::scope("/user-mgmt")
                    .service(users::signup_user)
                    .service(users::signup_admin)
                    .service(users::login)
                    .service(users::login_user)
                    .service(users::login_admin)
                    .service(users::list_users),
            )
            .service(
                web::scope("/task-mgmt")
                    .service(tasks::create_task)
                    .service(tasks::create_and_assign_task)
                    .service(tasks::list_my_tasks)
                    .service(tasks::list_tasks)
                    .service(tasks::update_task)
                    .service(tasks::delete_task)
                    .service(tasks::assign_task)
                    .service(tasks::update_task_status),
            ),
    );
}
