/// Partial task updates
///
/// A patch is parsed from the raw JSON object rather than a typed struct
/// because the authorization rules care about which keys were *sent*, not
/// only which ones were understood: a student may touch an assigned task only
/// with a body of exactly `{"status": ...}`.

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

use crate::models::task::{parse_due_date, Priority, Task, TaskStatus};

/// Longest accepted title, matching the `tasks.title` column
pub const MAX_TITLE_LENGTH: usize = 200;

/// Validated partial update for a task
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskPatch {
    /// Every top-level key present in the request body, recognized or not
    keys: Vec<String>,

    pub title: Option<String>,
    pub description: Option<String>,
    pub due_date: Option<DateTime<Utc>>,
    pub priority: Option<Priority>,
    pub status: Option<TaskStatus>,
}

fn required_text(map: &Map<String, Value>, key: &str) -> Result<Option<String>, String> {
    match map.get(key) {
        None => Ok(None),
        Some(Value::String(s)) if !s.trim().is_empty() => Ok(Some(s.trim().to_string())),
        Some(_) => Err(format!("Field '{}' must be a non-empty string.", key)),
    }
}

impl TaskPatch {
    /// Parses and validates a request body
    ///
    /// # Errors
    ///
    /// Returns a human-readable message when the body is not an object, when a
    /// recognized field is null, empty or of the wrong type, or when an enum or
    /// date value does not parse.
    pub fn from_json(body: &Value) -> Result<Self, String> {
        let map = body
            .as_object()
            .ok_or_else(|| "Request body must be a JSON object.".to_string())?;

        let title = required_text(map, "title")?;
        if let Some(ref t) = title {
            if t.chars().count() > MAX_TITLE_LENGTH {
                return Err(format!(
                    "Title must be at most {} characters.",
                    MAX_TITLE_LENGTH
                ));
            }
        }

        let description = required_text(map, "description")?;

        let due_date = required_text(map, "dueDate")?
            .map(|raw| parse_due_date(&raw))
            .transpose()?;

        let priority = required_text(map, "priority")?
            .map(|raw| raw.parse::<Priority>())
            .transpose()?;

        let status = required_text(map, "status")?
            .map(|raw| raw.parse::<TaskStatus>())
            .transpose()?;

        Ok(Self {
            keys: map.keys().cloned().collect(),
            title,
            description,
            due_date,
            priority,
            status,
        })
    }

    /// True when the body was exactly `{"status": ...}`
    pub fn is_status_only(&self) -> bool {
        self.keys.len() == 1 && self.keys[0] == "status"
    }

    /// True when no recognized field is set; applying it changes nothing
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.due_date.is_none()
            && self.priority.is_none()
            && self.status.is_none()
    }

    /// Copies every present field onto `task`; absent fields are untouched
    pub fn apply_to(&self, task: &mut Task) {
        if let Some(ref title) = self.title {
            task.title = title.clone();
        }
        if let Some(ref description) = self.description {
            task.description = description.clone();
        }
        if let Some(due_date) = self.due_date {
            task.due_date = due_date;
        }
        if let Some(priority) = self.priority {
            task.priority = priority;
        }
        if let Some(status) = self.status {
            task.status = status;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use uuid::Uuid;

    fn task() -> Task {
        let id = Uuid::new_v4();
        Task {
            id: Uuid::new_v4(),
            assignment_id: None,
            created_by: id,
            assigned_to: id,
            title: "Lab report".to_string(),
            description: "Chemistry".to_string(),
            due_date: parse_due_date("2025-03-01").unwrap(),
            priority: Priority::Low,
            status: TaskStatus::Pending,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_status_only() {
        let patch = TaskPatch::from_json(&json!({"status": "completed"})).unwrap();

        assert!(patch.is_status_only());
        assert_eq!(patch.status, Some(TaskStatus::Completed));
    }

    #[test]
    fn test_extra_keys_break_status_only() {
        let patch =
            TaskPatch::from_json(&json!({"status": "completed", "priority": "high"})).unwrap();
        assert!(!patch.is_status_only());

        // unrecognized keys still count
        let patch = TaskPatch::from_json(&json!({"status": "completed", "note": 1})).unwrap();
        assert!(!patch.is_status_only());
        assert_eq!(patch.keys, vec!["note".to_string(), "status".to_string()]);
    }

    #[test]
    fn test_rejects_invalid_values() {
        assert!(TaskPatch::from_json(&json!({"priority": "urgent"})).is_err());
        assert!(TaskPatch::from_json(&json!({"status": "done"})).is_err());
        assert!(TaskPatch::from_json(&json!({"dueDate": "next week"})).is_err());
        assert!(TaskPatch::from_json(&json!({"title": ""})).is_err());
        assert!(TaskPatch::from_json(&json!({"title": "   "})).is_err());
        assert!(TaskPatch::from_json(&json!({"description": null})).is_err());
        assert!(TaskPatch::from_json(&json!({"title": 42})).is_err());
        assert!(TaskPatch::from_json(&json!({"title": "x".repeat(201)})).is_err());
    }

    #[test]
    fn test_rejects_non_object_body() {
        assert!(TaskPatch::from_json(&json!(["status"])).is_err());
        assert!(TaskPatch::from_json(&json!("completed")).is_err());
    }

    #[test]
    fn test_empty_object_is_a_no_op() {
        let patch = TaskPatch::from_json(&json!({})).unwrap();
        let mut t = task();
        let before = t.clone();

        assert!(patch.is_empty());
        assert!(!patch.is_status_only());
        patch.apply_to(&mut t);
        assert_eq!(t, before);
    }

    #[test]
    fn test_apply_only_present_fields() {
        let patch = TaskPatch::from_json(&json!({
            "title": "  Final lab report ",
            "dueDate": "2025-04-15T09:30:00Z",
        }))
        .unwrap();

        let mut t = task();
        patch.apply_to(&mut t);

        assert_eq!(t.title, "Final lab report");
        assert_eq!(t.description, "Chemistry");
        assert_eq!(t.due_date, parse_due_date("2025-04-15T09:30:00Z").unwrap());
        assert_eq!(t.priority, Priority::Low);
        assert_eq!(t.status, TaskStatus::Pending);
    }
}
