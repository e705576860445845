//! # Unfurl — playbook resolution engine
//!
//! Unfurl resolves a declarative automation playbook — a sequence of plays,
//! each containing an ordered list of tasks — into a fully flattened, typed
//! in-memory representation ready for execution by a separate runner.
//!
//! Two kinds of indirection are inlined during resolution, preserving
//! ordering, provenance, and per-task variable scoping:
//!
//! - **`include_tasks`**: a directive that textually inlines another task
//!   file's resolved tasks at its position, recursively.
//! - **`include_role`**: a directive that inlines the tasks of a role
//!   located by convention at `<roles_root>/<name>/tasks/main.yml`.
//!
//! Resolution is synchronous and purely recursive; each call is a pure
//! transformation of its inputs aside from reading referenced files. There
//! is no shared mutable state, so concurrent resolution of multiple
//! playbooks from multiple threads is safe.
//!
//! ## Quick example
//!
//! ```rust,no_run
//! use unfurl::resolve_playbook;
//! use std::path::Path;
//!
//! # fn main() -> unfurl::Result<()> {
//! let data = std::fs::read("playbook.yml").unwrap();
//! let plays = resolve_playbook(&data, Path::new("playbook.yml"), Path::new("roles"))?;
//!
//! for play in &plays {
//!     println!("{} targets {}: {} tasks", play.name, play.hosts, play.tasks.len());
//! }
//! # Ok(())
//! # }
//! ```

#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod playbook;
pub mod render;
pub mod roles;
pub mod tasks;

pub use error::{Error, Result};
pub use playbook::{resolve_playbook, Play};
pub use render::Renderer;
pub use roles::resolve_role_tasks;
pub use tasks::{resolve_tasks, Fields, Task};
