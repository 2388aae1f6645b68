//! Input shapes for task bodies and the checks run on them at the top of
//! each handler. Fields are checked in declaration order and the first
//! failure is reported.

use serde::Deserialize;
use thiserror::Error;

use crate::database::models::{NewTask, Priority, Status, TaskChanges};

pub const TITLE_MAX_CHARS: usize = 200;
pub const DESCRIPTION_MAX_CHARS: usize = 2000;

#[derive(Debug, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Body of `POST /api/tasks`
#[derive(Debug, Default, Deserialize)]
pub struct CreateTaskInput {
    pub title: Option<String>,
    pub description: Option<String>,
    pub priority: Option<String>,
}

/// Body of `PUT /api/tasks/:id`
#[derive(Debug, Default, Deserialize)]
pub struct UpdateTaskInput {
    pub title: Option<String>,
    pub description: Option<String>,
    pub priority: Option<String>,
    pub status: Option<String>,
}

pub fn validate_create(input: CreateTaskInput) -> Result<NewTask, ValidationError> {
    let title = required_text("title", input.title, TITLE_MAX_CHARS)?;
    let description = required_text("description", input.description, DESCRIPTION_MAX_CHARS)?;
    let priority = match input.priority {
        Some(raw) => parse_priority(&raw)?,
        None => Priority::default(),
    };

    Ok(NewTask {
        title,
        description,
        priority,
    })
}

pub fn validate_update(input: UpdateTaskInput) -> Result<TaskChanges, ValidationError> {
    let title = required_text("title", input.title, TITLE_MAX_CHARS)?;
    let description = required_text("description", input.description, DESCRIPTION_MAX_CHARS)?;
    let priority = input.priority.as_deref().map(parse_priority).transpose()?;
    let status = input.status.as_deref().map(parse_status).transpose()?;

    Ok(TaskChanges {
        title,
        description,
        priority,
        status,
    })
}

fn required_text(
    field: &'static str,
    value: Option<String>,
    max_chars: usize,
) -> Result<String, ValidationError> {
    let value = value.ok_or_else(|| ValidationError::new(field, format!("{} is required", field)))?;

    // Bounds are in characters, not bytes
    let len = value.chars().count();
    if len == 0 || len > max_chars {
        return Err(ValidationError::new(
            field,
            format!("{} must be between 1 and {} characters", field, max_chars),
        ));
    }
    Ok(value)
}

fn parse_priority(raw: &str) -> Result<Priority, ValidationError> {
    raw.parse().map_err(|_| {
        let allowed: Vec<&str> = Priority::ALL.iter().map(Priority::as_str).collect();
        ValidationError::new(
            "priority",
            format!("Priority must be one of: {}", allowed.join(", ")),
        )
    })
}

fn parse_status(raw: &str) -> Result<Status, ValidationError> {
    raw.parse().map_err(|_| {
        let allowed: Vec<&str> = Status::ALL.iter().map(Status::as_str).collect();
        ValidationError::new(
            "status",
            format!("Status must be one of: {}", allowed.join(", ")),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create(title: Option<&str>, description: Option<&str>, priority: Option<&str>) -> CreateTaskInput {
        CreateTaskInput {
            title: title.map(String::from),
            description: description.map(String::from),
            priority: priority.map(String::from),
        }
    }

    #[test]
    fn minimal_create_defaults_to_medium() {
        let task = validate_create(create(Some("t"), Some("d"), None)).unwrap();
        assert_eq!(task.priority, Priority::Medium);
        assert_eq!(task.title, "t");
    }

    #[test]
    fn empty_title_is_rejected() {
        let err = validate_create(create(Some(""), Some("d"), None)).unwrap_err();
        assert_eq!(err.field, "title");
        assert_eq!(err.message, "title must be between 1 and 200 characters");
    }

    #[test]
    fn missing_fields_are_reported_in_order() {
        let err = validate_create(create(None, None, Some("urgent"))).unwrap_err();
        assert_eq!(err.field, "title");
        assert_eq!(err.message, "title is required");

        let err = validate_create(create(Some("t"), None, None)).unwrap_err();
        assert_eq!(err.field, "description");
    }

    #[test]
    fn length_bounds_count_characters() {
        let at_limit = "é".repeat(TITLE_MAX_CHARS);
        assert!(validate_create(create(Some(&at_limit), Some("d"), None)).is_ok());

        let over = "x".repeat(DESCRIPTION_MAX_CHARS + 1);
        let err = validate_create(create(Some("t"), Some(&over), None)).unwrap_err();
        assert_eq!(err.field, "description");
    }

    #[test]
    fn null_priority_means_default() {
        let input: CreateTaskInput =
            serde_json::from_str(r#"{"title": "t", "description": "d", "priority": null}"#).unwrap();
        assert_eq!(validate_create(input).unwrap().priority, Priority::Medium);
    }

    #[test]
    fn unknown_priority_is_rejected() {
        let err = validate_create(create(Some("t"), Some("d"), Some("urgent"))).unwrap_err();
        assert_eq!(err.message, "Priority must be one of: low, medium, high");
    }

    #[test]
    fn update_optional_fields() {
        let changes = validate_update(UpdateTaskInput {
            title: Some("t".into()),
            description: Some("d".into()),
            priority: None,
            status: Some("completed".into()),
        })
        .unwrap();
        assert_eq!(changes.priority, None);
        assert_eq!(changes.status, Some(Status::Completed));
    }

    #[test]
    fn update_rejects_unknown_status() {
        let err = validate_update(UpdateTaskInput {
            title: Some("t".into()),
            description: Some("d".into()),
            priority: Some("low".into()),
            status: Some("archived".into()),
        })
        .unwrap_err();
        assert_eq!(err.field, "status");
        assert_eq!(err.message, "Status must be one of: pending, completed");
    }

    #[test]
    fn update_still_requires_title_and_description() {
        let err = validate_update(UpdateTaskInput {
            status: Some("pending".into()),
            ..Default::default()
        })
        .unwrap_err();
        assert_eq!(err.field, "title");
    }
}
