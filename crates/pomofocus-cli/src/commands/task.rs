use std::error::Error;

use clap::Subcommand;
use pomofocus_core::{NewTask, TaskBook, TaskPatch};
use serde_json::json;

use super::print_json;
use crate::app::App;

#[derive(Subcommand)]
pub enum TaskAction {
    /// Add a task
    Add {
        /// Task title
        title: String,
        /// Estimated pomodoros (1-99)
        #[arg(long, short, default_value = "1")]
        estimate: u32,
        /// Category (defaults to the `default_category` setting)
        #[arg(long, short)]
        category: Option<String>,
        /// Description
        #[arg(long, short)]
        description: Option<String>,
    },
    /// List tasks
    List {
        /// Show archived tasks instead
        #[arg(long)]
        archived: bool,
    },
    /// Credit future pomodoros to a task (no id clears the selection)
    Select { id: Option<String> },
    /// Edit a task
    Edit {
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        description: Option<String>,
        /// Remove the description
        #[arg(long, conflicts_with = "description")]
        clear_description: bool,
        #[arg(long)]
        estimate: Option<u32>,
    },
    /// Delete a task (active or archived)
    Delete { id: String },
    /// Move an active task to a new position (0 = top)
    Move { id: String, position: usize },
    /// Restore an archived task with its counters reset
    Restore { id: String },
    /// Archive a task now, whatever its progress
    Done { id: String },
    /// Delete every archived task
    ClearArchived,
}

pub fn run(app: &App, action: TaskAction) -> Result<(), Box<dyn Error>> {
    let store = app.store.as_ref();
    let mut book = TaskBook::load(store);
    let now = app.clock.now_ms();

    match action {
        TaskAction::Add {
            title,
            estimate,
            category,
            description,
        } => {
            let category = category.unwrap_or_else(|| app.settings().default_category);
            let mut new = NewTask::new(title, estimate).category(category);
            new.description = description;
            let task = book.add(new, now)?.clone();
            book.save(store)?;
            print_json(&task)?;
        }
        TaskAction::List { archived } => {
            let tasks = if archived {
                book.archived()
            } else {
                book.active()
            };
            print_json(&json!({
                "current": book.current_id(),
                "tasks": tasks,
            }))?;
        }
        TaskAction::Select { id } => {
            book.select(id.as_deref())?;
            book.save(store)?;
            print_json(&json!({ "current": book.current() }))?;
        }
        TaskAction::Edit {
            id,
            title,
            category,
            description,
            clear_description,
            estimate,
        } => {
            let description = if clear_description {
                Some(None)
            } else {
                description.map(Some)
            };
            let patch = TaskPatch {
                title,
                description,
                category,
                pomodoro_estimate: estimate,
            };
            let task = book.edit(&id, patch)?.clone();
            book.save(store)?;
            print_json(&task)?;
        }
        TaskAction::Delete { id } => {
            let task = book.delete(&id)?;
            book.save(store)?;
            print_json(&json!({ "deleted": task.id }))?;
        }
        TaskAction::Move { id, position } => {
            book.move_task(&id, position)?;
            book.save(store)?;
            print_json(book.active())?;
        }
        TaskAction::Restore { id } => {
            let task = book.restore(&id)?.clone();
            book.save(store)?;
            print_json(&task)?;
        }
        TaskAction::Done { id } => {
            let task = book.complete_manually(&id, now)?;
            book.save(store)?;
            print_json(&task)?;
        }
        TaskAction::ClearArchived => {
            let removed = book.clear_archived();
            book.save(store)?;
            print_json(&json!({ "removed": removed }))?;
        }
    }
    Ok(())
}
