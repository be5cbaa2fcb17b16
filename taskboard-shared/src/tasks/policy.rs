/// Who may change or remove which task
///
/// Each rule is a `match` on the actor's role with one arm per role. A
/// student's permissions depend on whether the task is personal or was
/// assigned by an instructor; an instructor may touch only what they created.

use super::patch::TaskPatch;
use super::{Actor, TaskError};
use crate::models::task::Task;
use crate::models::user::Role;

/// Relationship between an actor and a task
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ownership {
    /// Created by and assigned to the actor
    Personal,

    /// Assigned to the actor by someone else
    AssignedToMe,

    /// Created by the actor for someone else
    AssignedByMe,

    /// Neither created by nor assigned to the actor
    Unrelated,
}

impl Ownership {
    pub fn of(actor: &Actor, task: &Task) -> Self {
        if task.assigned_to == actor.user_id {
            if task.is_personal() {
                Ownership::Personal
            } else {
                Ownership::AssignedToMe
            }
        } else if task.created_by == actor.user_id {
            Ownership::AssignedByMe
        } else {
            Ownership::Unrelated
        }
    }
}

/// Checks whether `actor` may apply `patch` to `task`
pub fn authorize_update(actor: &Actor, task: &Task, patch: &TaskPatch) -> Result<(), TaskError> {
    let ownership = Ownership::of(actor, task);

    match actor.role {
        Role::Student => match ownership {
            Ownership::Personal => Ok(()),
            Ownership::AssignedToMe if patch.is_status_only() => Ok(()),
            Ownership::AssignedToMe => Err(TaskError::Forbidden(
                "As a student, you can only update the status of tasks assigned by an instructor."
                    .to_string(),
            )),
            Ownership::AssignedByMe | Ownership::Unrelated => Err(TaskError::Forbidden(
                "As a student, you are not authorized to update this task.".to_string(),
            )),
        },
        Role::Instructor => match ownership {
            Ownership::Personal | Ownership::AssignedByMe => Ok(()),
            Ownership::AssignedToMe | Ownership::Unrelated => Err(TaskError::Forbidden(
                "As an instructor, you can only update tasks you have assigned.".to_string(),
            )),
        },
    }
}

/// Checks whether `actor` may delete `task`
pub fn authorize_delete(actor: &Actor, task: &Task) -> Result<(), TaskError> {
    let ownership = Ownership::of(actor, task);

    match actor.role {
        Role::Student => match ownership {
            Ownership::Personal => Ok(()),
            _ => Err(TaskError::Forbidden(
                "As a student, you can only delete your personal tasks.".to_string(),
            )),
        },
        Role::Instructor => match ownership {
            Ownership::Personal | Ownership::AssignedByMe => Ok(()),
            _ => Err(TaskError::Forbidden(
                "As an instructor, you can only delete tasks you have assigned.".to_string(),
            )),
        },
    }
}

/// Checks that `actor` may manage a whole fan-out made of `instances`
pub fn authorize_assignment(actor: &Actor, instances: &[Task]) -> Result<(), TaskError> {
    if actor.role != Role::Instructor {
        return Err(TaskError::Forbidden(
            "Only instructors can manage assignments.".to_string(),
        ));
    }

    if instances.iter().any(|t| t.created_by != actor.user_id) {
        return Err(TaskError::Forbidden(
            "As an instructor, you can only update tasks you have assigned.".to_string(),
        ));
    }

    Ok(())
}
