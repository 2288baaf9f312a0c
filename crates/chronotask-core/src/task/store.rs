//! JSON document store for task records.
//!
//! The whole store is one document, read at open and written back by
//! `commit()`:
//!
//! ```json
//! { "tasks": [ ... ], "sorted_ids": { "1": "<global id>", ... } }
//! ```
//!
//! `sorted_ids` maps the short ids printed by the last listing to the
//! stable global ids, so `id 3 done` refers to what the user just saw.

use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDateTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{round_hundredths, NewTask, TaskPatch, TaskRecord, TaskStatus, WorkSession};
use crate::error::{CoreError, Result, ValidationError};

/// The persistence operations a running session needs.
///
/// Mutations are buffered until `commit`, which must be durable before the
/// process exits after a stop.
pub trait WorkLedger {
    fn load_task_by_id(&self, id: &str) -> Result<&TaskRecord>;

    /// Open a new history session starting at `start`.
    fn append_history_session(&mut self, id: &str, start: NaiveDateTime) -> Result<()>;

    /// Close the open history session and add `minutes` to it.
    ///
    /// # Errors
    /// `NotFound` if the task does not exist or has no open session.
    fn finalize_open_session(&mut self, id: &str, stop: NaiveDateTime, minutes: f64)
        -> Result<()>;

    fn add_total_work(&mut self, id: &str, minutes: f64) -> Result<()>;

    fn commit(&mut self) -> Result<()>;
}

/// Which tasks a listing shows.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum StatusFilter {
    /// Active tasks only.
    #[default]
    Default,
    All,
    Only(HashSet<TaskStatus>),
}

impl StatusFilter {
    fn matches(&self, status: TaskStatus) -> bool {
        match self {
            StatusFilter::Default => status == TaskStatus::Active,
            StatusFilter::All => true,
            StatusFilter::Only(set) => set.contains(&status),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct TaskDocument {
    #[serde(default)]
    tasks: Vec<TaskRecord>,
    #[serde(default)]
    sorted_ids: BTreeMap<u32, String>,
}

/// File-backed task store.
#[derive(Debug)]
pub struct TaskStore {
    path: Option<PathBuf>,
    doc: TaskDocument,
}

impl TaskStore {
    /// Open the store at `path`. A missing file is an empty store.
    ///
    /// # Errors
    /// `MalformedState` if the file exists but is not a valid document.
    pub fn open(path: &Path) -> Result<Self> {
        let doc = match std::fs::read_to_string(path) {
            Ok(content) => serde_json::from_str(&content).map_err(|source| {
                CoreError::MalformedState {
                    path: path.to_path_buf(),
                    source,
                }
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => TaskDocument::default(),
            Err(e) => return Err(e.into()),
        };
        Ok(Self {
            path: Some(path.to_path_buf()),
            doc,
        })
    }

    /// A store that is never written to disk.
    pub fn in_memory() -> Self {
        Self {
            path: None,
            doc: TaskDocument::default(),
        }
    }

    pub fn tasks(&self) -> &[TaskRecord] {
        &self.doc.tasks
    }

    /// Create a task and return its global id.
    pub fn add_task(&mut self, new: NewTask) -> Result<String> {
        if new.text.trim().is_empty() {
            return Err(ValidationError::InvalidValue {
                field: "text".into(),
                message: "task text is empty".into(),
            }
            .into());
        }
        let now = Local::now().naive_local();
        let record = TaskRecord {
            text: new.text,
            date: new.date.unwrap_or_else(|| now.date()),
            project: new.project,
            tag: new.tag,
            value: new.value,
            global_id: Uuid::new_v4().to_string(),
            date_added: now,
            date_done: None,
            date_dismissed: None,
            status: TaskStatus::Active,
            total_work: 0.0,
            history: BTreeMap::new(),
        };
        let id = record.global_id.clone();
        tracing::debug!(task_id = %id, "task added");
        self.doc.tasks.push(record);
        Ok(id)
    }

    /// List tasks newest first and renumber the display ids to match.
    pub fn list(&mut self, filter: &StatusFilter) -> Vec<(u32, &TaskRecord)> {
        let ids: Vec<String> = self
            .doc
            .tasks
            .iter()
            .rev()
            .filter(|t| filter.matches(t.status))
            .map(|t| t.global_id.clone())
            .collect();

        self.doc.sorted_ids = (1u32..).zip(ids).collect();

        self.doc
            .sorted_ids
            .iter()
            .filter_map(|(display, global)| {
                self.doc
                    .tasks
                    .iter()
                    .find(|t| &t.global_id == global)
                    .map(|t| (*display, t))
            })
            .collect()
    }

    /// Map a display id from the last listing to a global id.
    pub fn resolve(&self, display_id: u32) -> Result<String> {
        self.doc
            .sorted_ids
            .get(&display_id)
            .cloned()
            .ok_or_else(|| ValidationError::UnknownDisplayId(display_id).into())
    }

    pub fn mark_done(&mut self, id: &str) -> Result<()> {
        self.set_status(id, TaskStatus::Done)
    }

    pub fn mark_active(&mut self, id: &str) -> Result<()> {
        self.set_status(id, TaskStatus::Active)
    }

    pub fn dismiss(&mut self, id: &str) -> Result<()> {
        self.set_status(id, TaskStatus::Dismissed)
    }

    fn set_status(&mut self, id: &str, status: TaskStatus) -> Result<()> {
        let task = self.task_mut(id)?;
        if task.status == status {
            return Err(ValidationError::InvalidStatusTransition {
                id: id.to_string(),
                status: status.to_string(),
            }
            .into());
        }
        let now = Local::now().naive_local();
        match status {
            TaskStatus::Done => task.date_done = Some(now),
            TaskStatus::Dismissed => task.date_dismissed = Some(now),
            TaskStatus::Active => {}
        }
        task.status = status;
        Ok(())
    }

    pub fn modify(&mut self, id: &str, patch: TaskPatch) -> Result<()> {
        let task = self.task_mut(id)?;
        if let Some(text) = patch.text {
            task.text = text;
        }
        if let Some(date) = patch.date {
            task.date = date;
        }
        if let Some(project) = patch.project {
            task.project = Some(project);
        }
        if let Some(tag) = patch.tag {
            task.tag = Some(tag);
        }
        if let Some(value) = patch.value {
            task.value = Some(value);
        }
        Ok(())
    }

    pub fn delete(&mut self, id: &str) -> Result<()> {
        let index = self
            .doc
            .tasks
            .iter()
            .position(|t| t.global_id == id)
            .ok_or_else(|| CoreError::NotFound(format!("task {id}")))?;
        self.doc.tasks.remove(index);
        self.doc.sorted_ids.retain(|_, global| global != id);
        Ok(())
    }

    fn task_mut(&mut self, id: &str) -> Result<&mut TaskRecord> {
        self.doc
            .tasks
            .iter_mut()
            .find(|t| t.global_id == id)
            .ok_or_else(|| CoreError::NotFound(format!("task {id}")))
    }
}

impl WorkLedger for TaskStore {
    fn load_task_by_id(&self, id: &str) -> Result<&TaskRecord> {
        self.doc
            .tasks
            .iter()
            .find(|t| t.global_id == id)
            .ok_or_else(|| CoreError::NotFound(format!("task {id}")))
    }

    fn append_history_session(&mut self, id: &str, start: NaiveDateTime) -> Result<()> {
        let task = self.task_mut(id)?;
        // At most one open session per task; close a dangling one empty.
        if let Some(dangling) = task.open_session_mut() {
            tracing::warn!(task_id = %id, start = %dangling.start, "closing dangling history session");
            dangling.stop = Some(dangling.start);
        }
        task.history.entry(start.date()).or_default().push(WorkSession {
            start,
            stop: None,
            minutes: 0.0,
        });
        Ok(())
    }

    fn finalize_open_session(
        &mut self,
        id: &str,
        stop: NaiveDateTime,
        minutes: f64,
    ) -> Result<()> {
        let task = self.task_mut(id)?;
        let session = task
            .open_session_mut()
            .ok_or_else(|| CoreError::NotFound(format!("open history session for task {id}")))?;
        session.stop = Some(stop);
        session.minutes = round_hundredths(session.minutes + minutes);
        Ok(())
    }

    fn add_total_work(&mut self, id: &str, minutes: f64) -> Result<()> {
        let task = self.task_mut(id)?;
        task.total_work = round_hundredths(task.total_work + minutes);
        Ok(())
    }

    /// Write the document atomically (temp file, then rename).
    fn commit(&mut self) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let tmp = path.with_extension("json.tmp");
        let content = serde_json::to_string_pretty(&self.doc)?;
        std::fs::write(&tmp, content)?;
        std::fs::rename(&tmp, path)?;
        tracing::debug!(path = %path.display(), "task store saved");
        Ok(())
    }
}
