//! Task model and recursive task-list resolution.
//!
//! The resolver turns loosely-typed task records (YAML mappings) into a
//! flat, ordered sequence of typed [`Task`]s, inlining `include_tasks`
//! directives in place. Resolution is list-building: tasks resolved from
//! earlier records are kept even when a later record fails the whole call.

use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde_yaml::{Mapping, Value};
use tracing::debug;

use crate::error::{Error, Result};

/// Ordered string-keyed map of YAML values, used for task args and vars.
pub type Fields = IndexMap<String, Value>;

/// Argument key used for short-form module invocations
/// (e.g. `shell: echo hi`), where the module value is a bare scalar.
pub const SHORT_FORM_KEY: &str = "__value__";

/// A single resolved unit of declared work.
///
/// Constructed once by the resolver and never mutated; no task is ever
/// partially constructed and exposed on an error path.
#[derive(Debug, Clone, PartialEq)]
pub struct Task {
    /// Descriptive name of the task ("" when the record has none)
    pub name: String,

    /// Module the task invokes (e.g. "ansible.builtin.copy")
    pub module: String,

    /// Raw module arguments, prior to any template rendering
    pub args: Fields,

    /// Task-scoped variables
    pub vars: Fields,

    /// Raw, unevaluated loop expression ("" when absent)
    pub loop_: String,

    /// File the task record was textually defined in
    pub source: PathBuf,
}

/// Directive keys recognized before a key falls through to "module name".
///
/// Fully-qualified aliases map to the same directive as their short form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Directive {
    Name,
    Vars,
    Loop,
    IncludeTasks,
}

fn directive_for(key: &str) -> Option<Directive> {
    match key {
        "name" => Some(Directive::Name),
        "vars" => Some(Directive::Vars),
        "loop" => Some(Directive::Loop),
        "include_tasks" | "ansible.builtin.include_tasks" => Some(Directive::IncludeTasks),
        _ => None,
    }
}

/// Resolves raw task records into typed [`Task`]s, recursively inlining
/// `include_tasks` directives found within the same or referenced files.
///
/// Output order matches input order, except that an `include_tasks` record
/// is replaced in place by the resolved contents of the referenced file.
/// `source_path` is the file the records were read from; include paths
/// resolve relative to its directory. Every produced task carries the path
/// of the file its record was physically read from.
pub fn resolve_tasks(
    records: &[Mapping],
    source_path: &Path,
    roles_root: &Path,
) -> Result<Vec<Task>> {
    let mut active = vec![source_path.to_path_buf()];
    resolve_with_stack(records, source_path, roles_root, &mut active)
}

fn resolve_with_stack(
    records: &[Mapping],
    source_path: &Path,
    roles_root: &Path,
    active: &mut Vec<PathBuf>,
) -> Result<Vec<Task>> {
    let mut tasks = Vec::with_capacity(records.len());
    let base_dir = source_path.parent().unwrap_or_else(|| Path::new("."));

    for record in records {
        if let Some(value) = include_directive_value(record) {
            let included =
                resolve_include(value, source_path, base_dir, roles_root, active)?;
            tasks.extend(included);
            continue;
        }

        tasks.push(task_from_record(record, source_path)?);
    }

    Ok(tasks)
}

/// Returns the `include_tasks` value when the record is an include record.
fn include_directive_value(record: &Mapping) -> Option<&Value> {
    record.iter().find_map(|(key, value)| {
        let key = key.as_str()?;
        matches!(directive_for(key), Some(Directive::IncludeTasks)).then_some(value)
    })
}

/// Reads, decodes, and recursively resolves one included task file.
fn resolve_include(
    value: &Value,
    source_path: &Path,
    base_dir: &Path,
    roles_root: &Path,
    active: &mut Vec<PathBuf>,
) -> Result<Vec<Task>> {
    let Some(relative) = value.as_str() else {
        return Err(Error::IncludePathNotString {
            path: source_path.to_path_buf(),
        });
    };

    let include_path = base_dir.join(relative);
    if active.contains(&include_path) {
        return Err(Error::IncludeCycle { path: include_path });
    }

    debug!(path = %include_path.display(), "inlining include_tasks");

    let data = std::fs::read(&include_path).map_err(|source| Error::IncludeRead {
        path: include_path.clone(),
        source,
    })?;

    let records = decode_task_records(&data).map_err(|source| Error::IncludeParse {
        path: include_path.clone(),
        source,
    })?;

    active.push(include_path.clone());
    let included = resolve_with_stack(&records, &include_path, roles_root, active)?;
    active.pop();

    Ok(included)
}

/// Decodes a task file body into raw records. An empty document yields an
/// empty record list rather than an error.
pub(crate) fn decode_task_records(
    data: &[u8],
) -> std::result::Result<Vec<Mapping>, serde_yaml::Error> {
    let records: Option<Vec<Mapping>> = serde_yaml::from_slice(data)?;
    Ok(records.unwrap_or_default())
}

/// Maps one raw record onto a [`Task`], independent of key order in the
/// physical document.
fn task_from_record(record: &Mapping, source_path: &Path) -> Result<Task> {
    let mut task = Task {
        name: String::new(),
        module: String::new(),
        args: Fields::new(),
        vars: Fields::new(),
        loop_: String::new(),
        source: source_path.to_path_buf(),
    };
    let mut candidates: Vec<(String, &Value)> = Vec::new();

    for (key, value) in record {
        let Some(key) = key.as_str() else {
            continue;
        };

        match directive_for(key) {
            Some(Directive::Name) => task.name = string_or_empty(value),
            Some(Directive::Vars) => task.vars = fields_or_empty(value),
            Some(Directive::Loop) => task.loop_ = string_or_empty(value),
            // Include records never reach this function.
            Some(Directive::IncludeTasks) => {}
            None => candidates.push((key.to_string(), value)),
        }
    }

    if candidates.len() > 1 {
        return Err(Error::AmbiguousModule {
            task: task.name,
            path: source_path.to_path_buf(),
            keys: candidates.into_iter().map(|(key, _)| key).collect(),
        });
    }

    if let Some((module, value)) = candidates.pop() {
        task.args = match value.as_mapping() {
            Some(mapping) => mapping_to_fields(mapping),
            None => Fields::from_iter([(SHORT_FORM_KEY.to_string(), value.clone())]),
        };
        task.module = module;
    }

    Ok(task)
}

/// Extracts a string, or "" for an absent or non-string value.
pub(crate) fn string_or_empty(value: &Value) -> String {
    value.as_str().unwrap_or_default().to_string()
}

/// Extracts a mapping as [`Fields`]; non-mapping values are ignored, not
/// an error.
fn fields_or_empty(value: &Value) -> Fields {
    value.as_mapping().map(mapping_to_fields).unwrap_or_default()
}

/// Converts a YAML mapping to [`Fields`], keeping string keys only.
pub(crate) fn mapping_to_fields(mapping: &Mapping) -> Fields {
    mapping
        .iter()
        .filter_map(|(key, value)| Some((key.as_str()?.to_string(), value.clone())))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn records(yaml: &str) -> Vec<Mapping> {
        decode_task_records(yaml.as_bytes()).unwrap()
    }

    fn fields(pairs: &[(&str, &str)]) -> Fields {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), Value::from(*v)))
            .collect()
    }

    fn resolve_in(dir: &TempDir, yaml: &str) -> Result<Vec<Task>> {
        let source = dir.path().join("source.yml");
        resolve_tasks(&records(yaml), &source, &dir.path().join("roles"))
    }

    fn write_file(dir: &TempDir, name: &str, contents: &str) {
        std::fs::write(dir.path().join(name), contents).unwrap();
    }

    #[test]
    fn basic_task_with_debug() {
        let dir = TempDir::new().unwrap();
        let tasks = resolve_in(
            &dir,
            r#"
- name: say hello
  ansible.builtin.debug:
    msg: "hello"
"#,
        )
        .unwrap();

        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].name, "say hello");
        assert_eq!(tasks[0].module, "ansible.builtin.debug");
        assert_eq!(tasks[0].args, fields(&[("msg", "hello")]));
        assert_eq!(tasks[0].vars, Fields::new());
        assert_eq!(tasks[0].loop_, "");
        assert_eq!(tasks[0].source, dir.path().join("source.yml"));
    }

    #[test]
    fn task_with_vars() {
        let dir = TempDir::new().unwrap();
        let tasks = resolve_in(
            &dir,
            r#"
- name: task with vars
  ansible.builtin.shell:
    cmd: "echo {{ message }}"
  vars:
    message: hello
"#,
        )
        .unwrap();

        assert_eq!(tasks[0].module, "ansible.builtin.shell");
        assert_eq!(tasks[0].args, fields(&[("cmd", "echo {{ message }}")]));
        assert_eq!(tasks[0].vars, fields(&[("message", "hello")]));
    }

    #[test]
    fn task_with_loop() {
        let dir = TempDir::new().unwrap();
        let tasks = resolve_in(
            &dir,
            r#"
- name: looping
  ansible.builtin.debug:
    msg: "{{ item }}"
  loop: "{{ ['a', 'b'] }}"
"#,
        )
        .unwrap();

        assert_eq!(tasks[0].loop_, "{{ ['a', 'b'] }}");
    }

    #[test]
    fn non_string_loop_is_ignored() {
        let dir = TempDir::new().unwrap();
        let tasks = resolve_in(
            &dir,
            r#"
- name: looping
  ansible.builtin.debug:
    msg: hi
  loop:
    - a
    - b
"#,
        )
        .unwrap();

        assert_eq!(tasks[0].loop_, "");
    }

    #[test]
    fn non_mapping_vars_is_ignored() {
        let dir = TempDir::new().unwrap();
        let tasks = resolve_in(
            &dir,
            r#"
- name: odd vars
  ansible.builtin.debug:
    msg: hi
  vars: not a mapping
"#,
        )
        .unwrap();

        assert_eq!(tasks[0].vars, Fields::new());
    }

    #[test]
    fn short_form_module_invocation() {
        let dir = TempDir::new().unwrap();
        let tasks = resolve_in(
            &dir,
            r#"
- name: run shell
  ansible.builtin.shell: echo hello
"#,
        )
        .unwrap();

        assert_eq!(tasks[0].module, "ansible.builtin.shell");
        assert_eq!(tasks[0].args, fields(&[("__value__", "echo hello")]));
    }

    #[test]
    fn record_without_module_key_yields_empty_module() {
        let dir = TempDir::new().unwrap();
        let tasks = resolve_in(&dir, "- name: just a name\n").unwrap();

        assert_eq!(tasks[0].name, "just a name");
        assert_eq!(tasks[0].module, "");
        assert_eq!(tasks[0].args, Fields::new());
    }

    #[test]
    fn multiple_module_keys_fail() {
        let dir = TempDir::new().unwrap();
        let err = resolve_in(
            &dir,
            r#"
- name: ambiguous
  ansible.builtin.debug:
    msg: hi
  ansible.builtin.shell: echo hi
"#,
        )
        .unwrap_err();

        let message = err.to_string();
        assert!(message.contains("multiple module keys"), "{message}");
        assert!(message.contains("ansible.builtin.debug"), "{message}");
        assert!(message.contains("ansible.builtin.shell"), "{message}");
    }

    #[test]
    fn include_tasks_with_non_string_value_fails() {
        let dir = TempDir::new().unwrap();
        let err = resolve_in(
            &dir,
            r#"
- name: bad include
  ansible.builtin.include_tasks:
    foo: bar
"#,
        )
        .unwrap_err();

        assert!(err
            .to_string()
            .contains("include_tasks path must be a string"));
    }

    #[test]
    fn include_tasks_missing_file_fails() {
        let dir = TempDir::new().unwrap();
        let err = resolve_in(
            &dir,
            "- name: include file that doesn't exist\n  ansible.builtin.include_tasks: not_here.yml\n",
        )
        .unwrap_err();

        assert!(err
            .to_string()
            .contains("failed to read included task file"));
    }

    #[test]
    fn include_tasks_inlines_at_directive_position() {
        let dir = TempDir::new().unwrap();
        write_file(
            &dir,
            "included.yml",
            r#"
- name: included | say hi
  ansible.builtin.debug:
    msg: hi from included
"#,
        );

        let tasks = resolve_in(
            &dir,
            r#"
- name: before
  ansible.builtin.debug:
    msg: first
- name: include real tasks
  ansible.builtin.include_tasks: included.yml
- name: after
  ansible.builtin.debug:
    msg: last
"#,
        )
        .unwrap();

        let names: Vec<&str> = tasks.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, ["before", "included | say hi", "after"]);
        assert_eq!(tasks[1].source, dir.path().join("included.yml"));
        assert_eq!(tasks[0].source, dir.path().join("source.yml"));
    }

    #[test]
    fn include_tasks_with_invalid_yaml_fails() {
        let dir = TempDir::new().unwrap();
        write_file(
            &dir,
            "included.yml",
            "- name: bad\n  ansible.builtin.debug\n    msg: \"oops\n",
        );

        let err = resolve_in(
            &dir,
            "- name: include broken file\n  ansible.builtin.include_tasks: included.yml\n",
        )
        .unwrap_err();

        assert!(err
            .to_string()
            .contains("failed to parse included task file"));
    }

    #[test]
    fn nested_include_failure_propagates() {
        let dir = TempDir::new().unwrap();
        write_file(
            &dir,
            "included.yml",
            r#"
- name: invalid nested include
  ansible.builtin.include_tasks:
    foo: bar
"#,
        );

        let err = resolve_in(
            &dir,
            "- name: include bad nested file\n  ansible.builtin.include_tasks: included.yml\n",
        )
        .unwrap_err();

        assert!(err
            .to_string()
            .contains("include_tasks path must be a string"));
    }

    #[test]
    fn nested_include_resolves_relative_to_including_file() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("sub")).unwrap();
        write_file(
            &dir,
            "sub/outer.yml",
            "- name: nested include\n  include_tasks: inner.yml\n",
        );
        write_file(
            &dir,
            "sub/inner.yml",
            "- name: deep task\n  ansible.builtin.debug:\n    msg: deep\n",
        );

        let tasks = resolve_in(
            &dir,
            "- name: top include\n  include_tasks: sub/outer.yml\n",
        )
        .unwrap();

        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].name, "deep task");
        assert_eq!(tasks[0].source, dir.path().join("sub").join("inner.yml"));
    }

    #[test]
    fn self_include_cycle_fails() {
        let dir = TempDir::new().unwrap();
        write_file(
            &dir,
            "source.yml",
            "- name: loop forever\n  include_tasks: source.yml\n",
        );

        let err = resolve_in(
            &dir,
            "- name: loop forever\n  include_tasks: source.yml\n",
        )
        .unwrap_err();

        assert!(err.to_string().contains("include cycle detected"));
    }

    #[test]
    fn mutual_include_cycle_fails() {
        let dir = TempDir::new().unwrap();
        write_file(&dir, "a.yml", "- include_tasks: b.yml\n");
        write_file(&dir, "b.yml", "- include_tasks: a.yml\n");

        let err = resolve_in(&dir, "- include_tasks: a.yml\n").unwrap_err();

        assert!(err.to_string().contains("include cycle detected"));
    }

    #[test]
    fn fully_qualified_include_alias_is_recognized() {
        let dir = TempDir::new().unwrap();
        write_file(
            &dir,
            "included.yml",
            "- name: aliased\n  ansible.builtin.debug:\n    msg: hi\n",
        );

        let tasks = resolve_in(
            &dir,
            "- ansible.builtin.include_tasks: included.yml\n",
        )
        .unwrap();

        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].name, "aliased");
    }

    #[test]
    fn empty_document_yields_no_tasks() {
        let dir = TempDir::new().unwrap();
        write_file(&dir, "included.yml", "---\n");

        let tasks = resolve_in(
            &dir,
            "- name: include empty\n  include_tasks: included.yml\n",
        )
        .unwrap();

        assert!(tasks.is_empty());
    }
}
