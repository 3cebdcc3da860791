use anyhow::{bail, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use client_core::{
    today, ClientConfig, HttpTaskStore, TaskListController, TaskRow, TaskStore,
    DEFAULT_SERVER_URL,
};
use shared::domain::{Priority, TaskId};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "todo", about = "To-do list backed by the task server")]
struct Cli {
    #[arg(long, default_value = DEFAULT_SERVER_URL)]
    server_url: String,
    /// Request timeout in seconds.
    #[arg(long, default_value_t = 10)]
    timeout: u64,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show tasks, optionally only those whose name contains SEARCH.
    List {
        #[arg(long, default_value = "")]
        search: String,
        #[arg(long)]
        json: bool,
    },
    Add {
        name: String,
        #[arg(long, default_value_t = Priority::Low)]
        priority: Priority,
        #[arg(long)]
        due: Option<NaiveDate>,
    },
    /// Change a task; fields that are not given keep their value.
    Edit {
        id: i64,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        priority: Option<Priority>,
        #[arg(long, conflicts_with = "clear_due")]
        due: Option<NaiveDate>,
        #[arg(long)]
        clear_due: bool,
    },
    Toggle {
        id: i64,
    },
    Remove {
        id: i64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();
    let cli = Cli::parse();

    let store = HttpTaskStore::new(&ClientConfig {
        server_url: cli.server_url,
        request_timeout: std::time::Duration::from_secs(cli.timeout),
    })?;
    debug!(tasks_url = store.tasks_url(), "using task server");

    let mut controller = TaskListController::new(store);
    controller.initialize().await;

    let mut search = String::new();
    match cli.command {
        Command::List {
            search: query,
            json,
        } => {
            if json {
                let tasks = controller.filtered_view(&query);
                println!("{}", serde_json::to_string_pretty(&tasks)?);
                return finish(&controller);
            }
            search = query;
        }
        Command::Add {
            name,
            priority,
            due,
        } => {
            let form = controller.form_mut();
            form.name = name;
            form.priority = priority;
            form.due_date = due;
            controller.submit_form().await;
        }
        Command::Edit {
            id,
            name,
            priority,
            due,
            clear_due,
        } => {
            let task_id = TaskId(id);
            controller.begin_edit(task_id);
            if controller.session().target() != Some(task_id) {
                finish(&controller)?;
                bail!("no task with id {id}");
            }
            let form = controller.form_mut();
            if let Some(name) = name {
                form.name = name;
            }
            if let Some(priority) = priority {
                form.priority = priority;
            }
            if due.is_some() || clear_due {
                form.due_date = due;
            }
            controller.submit_form().await;
        }
        Command::Toggle { id } => controller.toggle_complete(TaskId(id)).await,
        Command::Remove { id } => controller.remove_task(TaskId(id)).await,
    }

    for row in controller.visible_rows(&search, today()) {
        println!("{}", render_row(&row));
    }
    finish(&controller)
}

fn finish<S: TaskStore>(controller: &TaskListController<S>) -> Result<()> {
    if let Some(failure) = controller.last_error() {
        bail!("{failure}");
    }
    Ok(())
}

fn render_row(row: &TaskRow<'_>) -> String {
    let task = row.task;
    let mark = if task.completed { "x" } else { " " };
    let mut line = format!("[{mark}] #{} {} ({})", task.id, task.name, task.priority);
    if let Some(due) = task.due_date {
        line.push_str(&format!(" due {due}"));
    }
    if row.overdue {
        line.push_str(" OVERDUE");
    }
    line
}
