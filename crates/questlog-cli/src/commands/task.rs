//! Task management commands for CLI.

use chrono::Utc;
use clap::Subcommand;
use questlog_core::scoring::{explain, sort_by_priority};
use questlog_core::{TaskDraft, TaskPriority, TaskStatus};
use serde::Serialize;

use super::{open_tracker, parse_datetime, print_json, split_tags};

#[derive(Subcommand)]
pub enum TaskAction {
    /// Create a new task
    Create {
        /// Task title
        title: String,
        /// low, medium or high
        #[arg(long, default_value = "medium")]
        priority: String,
        /// Due date (YYYY-MM-DD or RFC 3339)
        #[arg(long)]
        due: Option<String>,
        /// Task description
        #[arg(long)]
        description: Option<String>,
        /// Comma-separated tags
        #[arg(long)]
        tags: Option<String>,
    },
    /// List tasks
    List {
        /// Filter by status (pending, in-progress, completed, archived)
        #[arg(long)]
        status: Option<String>,
    },
    /// Get task details
    Get {
        /// Task ID
        id: String,
    },
    /// Open tasks ranked by urgency score
    Rank,
    /// Show how a task's score is made up
    Score {
        /// Task ID
        id: String,
    },
    /// Move a task to in-progress
    Start {
        /// Task ID
        id: String,
    },
    /// Complete a task
    Complete {
        /// Task ID
        id: String,
    },
    /// Archive a task
    Archive {
        /// Task ID
        id: String,
    },
}

#[derive(Serialize)]
struct Ranked<'a> {
    score: i64,
    id: &'a str,
    title: &'a str,
    priority: TaskPriority,
    status: TaskStatus,
}

pub fn run(action: TaskAction) -> Result<(), Box<dyn std::error::Error>> {
    let (tracker, _config) = open_tracker()?;
    let now = Utc::now();

    match action {
        TaskAction::Create {
            title,
            priority,
            due,
            description,
            tags,
        } => {
            let draft = TaskDraft {
                title,
                priority: priority.parse::<TaskPriority>()?,
                description,
                due_date: due.as_deref().map(parse_datetime).transpose()?,
                tags: split_tags(tags),
            };
            let task = tracker.create_task(draft, now)?;
            eprintln!("Task created: {}", task.id);
            print_json(&task)?;
        }
        TaskAction::List { status } => {
            let status = status.as_deref().map(str::parse::<TaskStatus>).transpose()?;
            let tasks: Vec<_> = tracker
                .tasks()?
                .into_iter()
                .filter(|t| status.map_or(true, |s| t.status == s))
                .collect();
            print_json(&tasks)?;
        }
        TaskAction::Get { id } => {
            print_json(&tracker.task(&id)?)?;
        }
        TaskAction::Rank => {
            let tasks = tracker.tasks()?;
            let ranked: Vec<Ranked> = sort_by_priority(tasks.iter().filter(|t| t.status.is_open()), now)
                .into_iter()
                .map(|(score, t)| Ranked {
                    score,
                    id: &t.id,
                    title: &t.title,
                    priority: t.priority,
                    status: t.status,
                })
                .collect();
            print_json(&ranked)?;
        }
        TaskAction::Score { id } => {
            let task = tracker.task(&id)?;
            print_json(&explain(&task, now))?;
        }
        TaskAction::Start { id } => {
            print_json(&tracker.start_task(&id, now)?)?;
        }
        TaskAction::Complete { id } => {
            print_json(&tracker.complete_task(&id, now)?)?;
        }
        TaskAction::Archive { id } => {
            print_json(&tracker.archive_task(&id, now)?)?;
        }
    }
    Ok(())
}
