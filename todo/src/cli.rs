//! Command-line surface of the to-do list.
//!
//! [`Cli`] is the clap definition; [`run`] turns one [`Command`] into
//! actions on a [`TodoStore`] and writes the user-facing result to `out`.
//! Refusals (unknown ids, duplicate ids, edits of completed to-dos) are
//! returned as errors before anything is dispatched.

use crate::TodoStore;
use crate::types::{SortField, SortOrder, TodoAction, TodoDraft, TodoEdit, TodoId, TodoState};
use crate::view::visible_todos;
use anyhow::{Context, bail};
use checkmark_core::environment::IdGenerator;
use chrono::{NaiveDate, NaiveTime};
use clap::{Parser, Subcommand};
use std::io::Write;
use std::time::Duration;

/// Manage a local to-do list
#[derive(Debug, Parser)]
#[command(name = "todo", version, about)]
pub struct Cli {
    /// Command to run
    #[command(subcommand)]
    pub command: Command,
}

/// One CLI invocation
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Print the to-dos, filtered and sorted
    List {
        /// Only show to-dos containing this text
        #[arg(long)]
        search: Option<String>,
        /// Sort field: name, date or time
        #[arg(long)]
        sort: Option<SortField>,
        /// Sort order: asc or desc
        #[arg(long)]
        order: Option<SortOrder>,
    },
    /// Create a to-do
    Add {
        /// Short title
        #[arg(long)]
        name: String,
        /// Longer free text
        #[arg(long)]
        description: String,
        /// Due date, YYYY-MM-DD
        #[arg(long)]
        date: NaiveDate,
        /// Due time, HH:MM:SS
        #[arg(long)]
        time: NaiveTime,
        /// Use this id instead of a generated one
        #[arg(long)]
        id: Option<String>,
    },
    /// Change fields of an open to-do
    Edit {
        /// To-do to edit
        id: String,
        /// New name
        #[arg(long)]
        name: Option<String>,
        /// New description
        #[arg(long)]
        description: Option<String>,
        /// New due date, YYYY-MM-DD
        #[arg(long)]
        date: Option<NaiveDate>,
        /// New due time, HH:MM:SS
        #[arg(long)]
        time: Option<NaiveTime>,
    },
    /// Flip a to-do between open and completed
    Toggle {
        /// To-do to toggle
        id: String,
    },
    /// Remove a to-do
    Delete {
        /// To-do to delete
        id: String,
    },
    /// Merge in to-dos from the remote source
    Sync,
    /// Remove every to-do
    Clear,
}

/// Run one command against `store`
///
/// `sync_timeout` bounds how long `Sync` waits for the fetch outcome.
///
/// # Errors
///
/// Returns an error when the command is refused, when a draft or edit fails
/// validation, when the store rejects an action, when a sync fails or when
/// writing to `out` fails.
pub async fn run<W>(
    command: Command,
    store: &TodoStore,
    ids: &dyn IdGenerator,
    sync_timeout: Duration,
    out: &mut W,
) -> anyhow::Result<()>
where
    W: Write + Send,
{
    match command {
        Command::List {
            search,
            sort,
            order,
        } => {
            if let Some(query) = search {
                store.send(TodoAction::SetSearchQuery(query)).await?;
            }
            if let Some(field) = sort {
                store.send(TodoAction::SetSortBy(field)).await?;
            }
            if let Some(order) = order {
                store.send(TodoAction::SetSortOrder(order)).await?;
            }
            print_list(store, out).await?;
        },
        Command::Add {
            name,
            description,
            date,
            time,
            id,
        } => {
            let mut draft = TodoDraft::new(name, description, date, time);
            if let Some(id) = id {
                draft = draft.with_id(id);
            }
            let todo = draft.into_todo(ids)?;
            if store.state(|s| s.contains(&todo.id)).await {
                bail!("A todo with id {} already exists", todo.id);
            }

            let id = todo.id.clone();
            store.send(TodoAction::AddTodo(todo)).await?;
            writeln!(out, "Added {id}")?;
        },
        Command::Edit {
            id,
            name,
            description,
            date,
            time,
        } => {
            let id = TodoId::from(id);
            let Some(current) = store.state(|s| s.get(&id).cloned()).await else {
                bail!("No todo with id {id}");
            };
            if current.completed {
                bail!("Todo {id} is completed and cannot be edited");
            }

            let edited = current.edited(TodoEdit {
                name,
                description,
                due_date: date,
                due_time: time,
            });
            edited.validation().into_result()?;

            store.send(TodoAction::UpdateTodo(edited)).await?;
            writeln!(out, "Updated {id}")?;
        },
        Command::Toggle { id } => {
            let id = TodoId::from(id);
            ensure_exists(store, &id).await?;
            store.send(TodoAction::ToggleTodo { id: id.clone() }).await?;

            let completed = store
                .state(|s| s.get(&id).is_some_and(|t| t.completed))
                .await;
            writeln!(out, "{id} is now {}", if completed { "completed" } else { "open" })?;
        },
        Command::Delete { id } => {
            let id = TodoId::from(id);
            ensure_exists(store, &id).await?;
            store.send(TodoAction::DeleteTodo { id: id.clone() }).await?;
            writeln!(out, "Deleted {id}")?;
        },
        Command::Sync => sync(store, sync_timeout, out).await?,
        Command::Clear => {
            let count = store.state(TodoState::count).await;
            store.send(TodoAction::ReplaceAll(Vec::new())).await?;
            writeln!(out, "Removed {count} todos")?;
        },
    }

    Ok(())
}

async fn ensure_exists(store: &TodoStore, id: &TodoId) -> anyhow::Result<()> {
    if store.state(|s| s.contains(id)).await {
        Ok(())
    } else {
        bail!("No todo with id {id}")
    }
}

async fn sync<W: Write + Send>(
    store: &TodoStore,
    timeout: Duration,
    out: &mut W,
) -> anyhow::Result<()> {
    let before = store.state(TodoState::count).await;

    let outcome = store
        .send_and_wait_for(TodoAction::FetchRemote, TodoAction::is_fetch_outcome, timeout)
        .await
        .context("Remote sync did not finish")?;

    if let TodoAction::RemoteFetchFailed { message } = outcome {
        bail!(message);
    }

    let after = store.state(TodoState::count).await;
    writeln!(out, "Merged {} new todos ({after} total)", after.saturating_sub(before))?;
    Ok(())
}

async fn print_list<W: Write + Send>(store: &TodoStore, out: &mut W) -> std::io::Result<()> {
    store
        .state(|state| {
            let visible = visible_todos(state);
            if visible.is_empty() {
                return writeln!(out, "No todos");
            }

            let shown = visible.len();
            for todo in visible {
                writeln!(
                    out,
                    "[{}] {:<14} {} {}  {}",
                    if todo.completed { "x" } else { " " },
                    todo.id,
                    todo.due_date_string(),
                    todo.due_time_string(),
                    todo.name,
                )?;
                if !todo.description.is_empty() {
                    writeln!(out, "{:19}{}", "", todo.description)?;
                }
            }
            writeln!(
                out,
                "\n{shown} shown, {} of {} completed",
                state.completed_count(),
                state.count()
            )
        })
        .await
}
