use db::{DbErr, models::task::TaskError};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Database(#[from] DbErr),
    #[error("{0}")]
    Validation(String),
    #[error("Unknown member")]
    UnknownMember,
    #[error("Project not found")]
    ProjectNotFound,
    #[error("Task not found")]
    TaskNotFound,
    #[error("Invite code not found")]
    InviteCodeNotFound,
    #[error("Not a member of this project")]
    NotAMember,
    #[error("Only the project owner can do that")]
    NotOwner,
    #[error("Tasks not in project")]
    TasksNotInProject(Vec<Uuid>),
    #[error("Assignee is not a member of this project")]
    AssigneeNotInProject,
    #[error("Could not generate a unique invite code")]
    InviteCodeGenerationFailed,
}

pub type Result<T> = std::result::Result<T, ServiceError>;

impl From<TaskError> for ServiceError {
    fn from(err: TaskError) -> Self {
        match err {
            TaskError::Database(err) => Self::Database(err),
            TaskError::ProjectNotFound => Self::ProjectNotFound,
            TaskError::TaskNotFound => Self::TaskNotFound,
            TaskError::MemberNotFound => Self::UnknownMember,
            TaskError::TasksNotInProject(ids) => Self::TasksNotInProject(ids),
            TaskError::AssigneeNotInProject => Self::AssigneeNotInProject,
            TaskError::Validation(msg) => Self::Validation(msg),
        }
    }
}

/// Trims `raw` and checks its length in characters.
pub(crate) fn validate_text(field: &str, raw: &str, max_chars: usize) -> Result<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ServiceError::Validation(format!("{field} must not be empty")));
    }
    if trimmed.chars().count() > max_chars {
        return Err(ServiceError::Validation(format!(
            "{field} must be at most {max_chars} characters"
        )));
    }
    Ok(trimmed.to_string())
}

/// Like `validate_text` but blank input means "no value".
pub(crate) fn validate_optional_text(
    field: &str,
    raw: Option<&str>,
    max_chars: usize,
) -> Result<Option<String>> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(text) => validate_text(field, text, max_chars).map(Some),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_is_trimmed_and_bounded() {
        assert_eq!(validate_text("name", "  Board  ", 10).unwrap(), "Board");
        assert!(matches!(
            validate_text("name", "   ", 10),
            Err(ServiceError::Validation(_))
        ));
        assert!(validate_text("name", &"é".repeat(10), 10).is_ok());
        assert!(validate_text("name", &"é".repeat(11), 10).is_err());
    }

    #[test]
    fn blank_optional_text_is_none() {
        assert_eq!(validate_optional_text("d", Some("  "), 5).unwrap(), None);
        assert_eq!(validate_optional_text("d", None, 5).unwrap(), None);
        assert_eq!(
            validate_optional_text("d", Some(" ok "), 5).unwrap().as_deref(),
            Some("ok")
        );
        assert!(validate_optional_text("d", Some("toolong"), 5).is_err());
    }

    #[test]
    fn task_errors_map_one_to_one() {
        let id = Uuid::new_v4();
        assert!(matches!(
            ServiceError::from(TaskError::TasksNotInProject(vec![id])),
            ServiceError::TasksNotInProject(ids) if ids == vec![id]
        ));
        assert!(matches!(
            ServiceError::from(TaskError::AssigneeNotInProject),
            ServiceError::AssigneeNotInProject
        ));
    }
}
