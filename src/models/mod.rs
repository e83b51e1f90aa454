pub mod page;
pub mod response;
pub mod task;
pub mod user;

pub use page::{PageQuery, Slice};
pub use response::{ApiResponse, Paginated};
pub use task::{AssignTaskInput, NewTask, Task, TaskInput, TaskResponse, TaskStatus};
pub use user::{Gender, NewUser, Role, SignupInput, User, UserResponse};

use validator::ValidationError;

/// Rejects strings that are empty or whitespace only.
pub(crate) fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank"));
    }
    Ok(())
}
