//! Play model and playbook resolution.
//!
//! A playbook is a YAML document whose top level is a sequence of play
//! records. Resolution decodes the document, resolves each play's task
//! list (inlining `include_tasks` along the way), and then replaces any
//! `include_role` task in place with the referenced role's resolved tasks.

use std::path::Path;

use serde_yaml::{Mapping, Value};
use tracing::debug;

use crate::error::{Error, Result};
use crate::roles::resolve_role_tasks;
use crate::tasks::{resolve_tasks, string_or_empty, Task};

/// A named, host-scoped ordered group of tasks.
///
/// Constructed once by [`resolve_playbook`] and never mutated; the play
/// owns its task sequence exclusively.
#[derive(Debug, Clone, PartialEq)]
pub struct Play {
    /// Descriptive name of the play ("" when the record has none)
    pub name: String,

    /// Host pattern the play targets ("" when the record has none)
    pub hosts: String,

    /// The fully resolved, flattened task list in document order
    pub tasks: Vec<Task>,
}

/// Resolves playbook bytes into typed [`Play`]s.
///
/// `playbook_path` is used as the initial source for provenance and for
/// resolving relative `include_tasks` paths; `roles_root` locates roles
/// referenced by `include_role`. Any failure aborts the whole call.
pub fn resolve_playbook(
    data: &[u8],
    playbook_path: &Path,
    roles_root: &Path,
) -> Result<Vec<Play>> {
    let raw_plays: Vec<Mapping> = serde_yaml::from_slice::<Option<Vec<Mapping>>>(data)
        .map_err(|source| Error::PlaybookParse { source })?
        .unwrap_or_default();

    let mut plays = Vec::with_capacity(raw_plays.len());
    for raw_play in &raw_plays {
        plays.push(resolve_play(raw_play, playbook_path, roles_root)?);
    }

    Ok(plays)
}

fn resolve_play(raw_play: &Mapping, playbook_path: &Path, roles_root: &Path) -> Result<Play> {
    let name = raw_play.get("name").map(string_or_empty).unwrap_or_default();
    let hosts = raw_play
        .get("hosts")
        .map(string_or_empty)
        .unwrap_or_default();

    debug!(play = %name, hosts = %hosts, "resolving play");

    // A `tasks` field of any other shape is tolerated as an empty task
    // list, not rejected.
    let records = task_records(raw_play.get("tasks"));
    let resolved = resolve_tasks(&records, playbook_path, roles_root)?;

    let mut tasks = Vec::with_capacity(resolved.len());
    for task in resolved {
        if is_include_role(&task.module) {
            tasks.extend(inline_role(&task, roles_root)?);
        } else {
            tasks.push(task);
        }
    }

    Ok(Play { name, hosts, tasks })
}

fn is_include_role(module: &str) -> bool {
    matches!(module, "include_role" | "ansible.builtin.include_role")
}

/// Resolves the role named by an `include_role` task's arguments, taking
/// the task's place in the play.
fn inline_role(task: &Task, roles_root: &Path) -> Result<Vec<Task>> {
    let role_name = task
        .args
        .get("name")
        .and_then(Value::as_str)
        .unwrap_or_default();
    if role_name.is_empty() {
        return Err(Error::RoleNameMissing);
    }

    resolve_role_tasks(role_name, roles_root).map_err(|source| Error::RoleLoad {
        role: role_name.to_string(),
        source: Box::new(source),
    })
}

fn task_records(value: Option<&Value>) -> Vec<Mapping> {
    let Some(Value::Sequence(sequence)) = value else {
        return Vec::new();
    };

    sequence
        .iter()
        .filter_map(Value::as_mapping)
        .cloned()
        .collect()
}
