//! Task management commands for CLI.

use std::collections::HashSet;

use chrono::NaiveDate;
use clap::{Args, Subcommand, ValueEnum};
use chronotask_core::{NewTask, StatusFilter, TaskPatch, TaskStatus, WorkLedger};

use super::{open_store, paths, render, timer, CmdResult};

#[derive(Args)]
pub struct AddArgs {
    /// Task description
    text: String,
    /// Due date (YYYY-MM-DD), today by default
    #[arg(long)]
    date: Option<NaiveDate>,
    /// Project name
    #[arg(long)]
    project: Option<String>,
    /// Tag
    #[arg(long)]
    tag: Option<String>,
    /// Value or priority
    #[arg(long)]
    val: Option<String>,
}

#[derive(Args)]
pub struct ListArgs {
    /// Statuses to show; active tasks only when omitted
    #[arg(long, value_enum, num_args = 1..)]
    status: Vec<StatusArg>,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum StatusArg {
    All,
    Active,
    Done,
    Dismissed,
}

#[derive(Subcommand)]
pub enum IdAction {
    /// Mark task as done
    Done,
    /// Dismiss the task
    Dismiss,
    /// Mark task as active
    Active,
    /// Modify a task
    Mod {
        /// New task description
        #[arg(long)]
        text: Option<String>,
        /// New due date (YYYY-MM-DD)
        #[arg(long)]
        date: Option<NaiveDate>,
        /// New project
        #[arg(long)]
        project: Option<String>,
        /// New tag
        #[arg(long)]
        tag: Option<String>,
        /// New value or priority
        #[arg(long)]
        value: Option<String>,
    },
    /// Delete a task
    Delete,
    /// Start a work session on the task
    Start,
}

fn status_filter(statuses: &[StatusArg]) -> StatusFilter {
    if statuses.is_empty() {
        return StatusFilter::Default;
    }
    if statuses.contains(&StatusArg::All) {
        return StatusFilter::All;
    }
    let only: HashSet<TaskStatus> = statuses
        .iter()
        .filter_map(|s| match s {
            StatusArg::Active => Some(TaskStatus::Active),
            StatusArg::Done => Some(TaskStatus::Done),
            StatusArg::Dismissed => Some(TaskStatus::Dismissed),
            StatusArg::All => None,
        })
        .collect();
    StatusFilter::Only(only)
}

pub fn add(args: AddArgs) -> CmdResult {
    let paths = paths()?;
    let mut store = open_store(&paths)?;
    let text = args.text.clone();
    store.add_task(NewTask {
        text: args.text,
        date: args.date,
        project: args.project,
        tag: args.tag,
        value: args.val,
    })?;
    store.commit()?;
    println!("Task added: {text}");
    Ok(())
}

pub fn list(args: ListArgs) -> CmdResult {
    let paths = paths()?;
    let mut store = open_store(&paths)?;
    if store.tasks().is_empty() {
        println!("No tasks available.");
        return Ok(());
    }

    let filter = status_filter(&args.status);
    let rows = store.list(&filter);
    if rows.is_empty() {
        println!("No tasks with status: {}", describe(&filter));
    } else {
        print!("{}", render::task_table(&rows));
    }
    // Display ids from this listing are what `id <n>` refers to.
    store.commit()?;
    Ok(())
}

fn describe(filter: &StatusFilter) -> String {
    match filter {
        StatusFilter::Default => TaskStatus::Active.to_string(),
        StatusFilter::All => "all".to_string(),
        StatusFilter::Only(set) => {
            let mut names: Vec<String> = set.iter().map(ToString::to_string).collect();
            names.sort();
            names.join(", ")
        }
    }
}

pub fn run(display_id: u32, action: IdAction) -> CmdResult {
    let paths = paths()?;
    let mut store = open_store(&paths)?;
    let id = store.resolve(display_id)?;

    match action {
        IdAction::Done => {
            store.mark_done(&id)?;
            println!("Task {display_id} marked as done");
        }
        IdAction::Dismiss => {
            store.dismiss(&id)?;
            println!("Task {display_id} dismissed");
        }
        IdAction::Active => {
            store.mark_active(&id)?;
            println!("Task {display_id} marked as active");
        }
        IdAction::Mod {
            text,
            date,
            project,
            tag,
            value,
        } => {
            store.modify(
                &id,
                TaskPatch {
                    text,
                    date,
                    project,
                    tag,
                    value,
                },
            )?;
            println!("Task {display_id} modified");
        }
        IdAction::Delete => {
            store.delete(&id)?;
            println!("Task {display_id} deleted");
        }
        IdAction::Start => {
            println!("Starting task {display_id}");
            return timer::start(&paths, store, &id);
        }
    }
    store.commit()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_status_means_active_only() {
        assert_eq!(status_filter(&[]), StatusFilter::Default);
    }

    #[test]
    fn all_wins_over_specific_statuses() {
        assert_eq!(
            status_filter(&[StatusArg::Done, StatusArg::All]),
            StatusFilter::All
        );
    }

    #[test]
    fn specific_statuses_are_collected() {
        let filter = status_filter(&[StatusArg::Done, StatusArg::Dismissed]);
        assert_eq!(
            filter,
            StatusFilter::Only(HashSet::from([TaskStatus::Done, TaskStatus::Dismissed]))
        );
        assert_eq!(describe(&filter), "dismissed, done");
    }
}
