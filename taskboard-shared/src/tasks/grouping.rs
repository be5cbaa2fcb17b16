/// Read-side aggregation of task instances
///
/// An instructor fan-out is stored as one row per student. [`group_assignments`]
/// folds those rows back into logical assignments with completion progress,
/// and [`TaskSummary`] produces the dashboard counters for either role.
///
/// Rows are grouped by `assignment_id`. Rows without one fall back to the
/// composite key (title, description, creator).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

use crate::models::task::{Priority, Task, TaskStatus, TaskView};
use crate::models::user::UserSummary;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum GroupKey {
    Assignment(Uuid),
    Composite {
        title: String,
        description: String,
        created_by: Uuid,
    },
}

impl GroupKey {
    fn new(assignment_id: Option<Uuid>, title: &str, description: &str, created_by: Uuid) -> Self {
        match assignment_id {
            Some(id) => GroupKey::Assignment(id),
            None => GroupKey::Composite {
                title: title.to_string(),
                description: description.to_string(),
                created_by,
            },
        }
    }

    fn of_task(task: &Task) -> Self {
        Self::new(task.assignment_id, &task.title, &task.description, task.created_by)
    }

    fn of_view(view: &TaskView) -> Self {
        Self::new(view.assignment_id, &view.title, &view.description, view.created_by.id)
    }
}

/// True when both rows belong to the same logical assignment
pub fn same_assignment(a: &Task, b: &Task) -> bool {
    GroupKey::of_task(a) == GroupKey::of_task(b)
}

/// One student's copy of an assignment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentInstance {
    pub task_id: Uuid,
    pub student: UserSummary,
    pub status: TaskStatus,
}

/// A logical assignment reconstructed from its per-student rows
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Assignment {
    /// Address of the group for `/api/assignments/{key}`: the assignment ID
    /// when stored, otherwise the ID of the group's first row
    pub key: Uuid,

    pub assignment_id: Option<Uuid>,
    pub title: String,
    pub description: String,

    /// Taken from the earliest-created instance
    pub due_date: DateTime<Utc>,

    /// Taken from the earliest-created instance
    pub priority: Priority,

    pub created_by: UserSummary,
    pub instances: Vec<AssignmentInstance>,
    pub completed_count: usize,
    pub total_count: usize,

    /// Completion percentage in `[0, 100]`
    pub progress: f64,

    #[serde(skip)]
    representative_created_at: DateTime<Utc>,
}

impl Assignment {
    fn start(view: &TaskView) -> Self {
        Self {
            key: view.assignment_id.unwrap_or(view.id),
            assignment_id: view.assignment_id,
            title: view.title.clone(),
            description: view.description.clone(),
            due_date: view.due_date,
            priority: view.priority,
            created_by: view.created_by.clone(),
            instances: Vec::new(),
            completed_count: 0,
            total_count: 0,
            progress: 0.0,
            representative_created_at: view.created_at,
        }
    }

    fn push(&mut self, view: &TaskView) {
        if view.created_at < self.representative_created_at {
            self.due_date = view.due_date;
            self.priority = view.priority;
            self.representative_created_at = view.created_at;
        }

        self.instances.push(AssignmentInstance {
            task_id: view.id,
            student: view.assigned_to.clone(),
            status: view.status,
        });

        self.total_count += 1;
        if view.status.is_completed() {
            self.completed_count += 1;
        }
        self.progress = progress_percent(self.completed_count, self.total_count);
    }
}

/// `completed / total * 100`, or 0 for an empty group
pub fn progress_percent(completed: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        completed as f64 / total as f64 * 100.0
    }
}

/// Groups populated tasks into logical assignments
///
/// Groups appear in the order of their first row in `views`.
pub fn group_assignments(views: &[TaskView]) -> Vec<Assignment> {
    let mut index: HashMap<GroupKey, usize> = HashMap::new();
    let mut groups: Vec<Assignment> = Vec::new();

    for view in views {
        let slot = *index.entry(GroupKey::of_view(view)).or_insert_with(|| {
            groups.push(Assignment::start(view));
            groups.len() - 1
        });

        groups[slot].push(view);
    }

    groups
}

/// Completion counters for a set of tasks
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCounts {
    pub total: usize,
    pub completed: usize,
    pub pending: usize,
}

impl StatusCounts {
    pub fn tally<'a>(tasks: impl IntoIterator<Item = &'a Task>) -> Self {
        tasks.into_iter().fold(Self::default(), |mut counts, task| {
            counts.total += 1;
            match task.status {
                TaskStatus::Completed => counts.completed += 1,
                TaskStatus::Pending => counts.pending += 1,
            }
            counts
        })
    }
}

/// Dashboard counters, shaped per role
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum TaskSummary {
    Student {
        personal: StatusCounts,
        assigned: StatusCounts,
    },
    Instructor {
        /// Logical assignments created
        assignments: usize,

        /// Distinct students holding at least one instance
        students: usize,

        /// Completed instances across all assignments
        completed: usize,

        /// Pending instances across all assignments
        pending: usize,
    },
}

impl TaskSummary {
    /// Counters for a student, given every task assigned to them
    pub fn for_student(student_id: Uuid, tasks: &[Task]) -> Self {
        let (personal, assigned): (Vec<&Task>, Vec<&Task>) =
            tasks.iter().partition(|t| t.created_by == student_id);

        TaskSummary::Student {
            personal: StatusCounts::tally(personal),
            assigned: StatusCounts::tally(assigned),
        }
    }

    /// Counters for an instructor, given every task they created
    pub fn for_instructor(tasks: &[Task]) -> Self {
        let assignments: HashSet<GroupKey> = tasks.iter().map(GroupKey::of_task).collect();
        let students: HashSet<Uuid> = tasks.iter().map(|t| t.assigned_to).collect();
        let counts = StatusCounts::tally(tasks);

        TaskSummary::Instructor {
            assignments: assignments.len(),
            students: students.len(),
            completed: counts.completed,
            pending: counts.pending,
        }
    }
}
