//! Role task loading.
//!
//! A role is a named, reusable bundle of tasks located by convention under
//! a roles root directory. The only entry point consulted is
//! `<roles_root>/<role_name>/tasks/main.yml`; role metadata, handlers,
//! defaults, and variable files are out of scope.

use std::path::Path;

use tracing::debug;

use crate::error::{Error, Result};
use crate::tasks::{decode_task_records, resolve_tasks, Task};

/// Loads and resolves the tasks of the named role.
///
/// Nested `include_tasks` inside the role resolve relative to the role's
/// own `tasks/` directory, and the role's task-file path becomes the
/// `source` of every task it defines.
pub fn resolve_role_tasks(role_name: &str, roles_root: &Path) -> Result<Vec<Task>> {
    let tasks_path = roles_root.join(role_name).join("tasks").join("main.yml");
    debug!(role = role_name, path = %tasks_path.display(), "loading role tasks");

    let data = std::fs::read(&tasks_path).map_err(|source| Error::RoleRead {
        path: tasks_path.clone(),
        source,
    })?;

    let records = decode_task_records(&data).map_err(|source| Error::RoleParse {
        path: tasks_path.clone(),
        source,
    })?;

    resolve_tasks(&records, &tasks_path, roles_root)
}
