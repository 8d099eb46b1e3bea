//! A reducer-driven to-do list.
//!
//! Users create, edit, complete, delete, search and sort to-dos, and can
//! merge in to-dos fetched from a remote placeholder API. All mutation goes
//! through [`TodoAction`]s sent to a [`TodoStore`]; the durable part of the
//! state is written back by an autosave task watching the store.
//!
//! # Quick Start
//!
//! ```no_run
//! use checkmark_core::environment::SystemClock;
//! use checkmark_runtime::Store;
//! use chrono::{NaiveDate, NaiveTime};
//! use std::sync::Arc;
//! use todo::{
//!     HttpRemoteSource, RemoteConfig, TodoAction, TodoDraft, TodoEnvironment, TodoReducer,
//!     TodoState, visible_todos,
//! };
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let remote = HttpRemoteSource::from_config(&RemoteConfig::default(), Arc::new(SystemClock))?;
//! let store = Store::new(
//!     TodoState::new(),
//!     TodoReducer::new(),
//!     TodoEnvironment::new(Arc::new(remote)),
//! );
//!
//! let ids = checkmark_core::environment::TimestampIdGenerator::new(SystemClock);
//! let todo = TodoDraft::new(
//!     "Buy milk",
//!     "2%",
//!     NaiveDate::from_ymd_opt(2024, 1, 1).unwrap_or_default(),
//!     NaiveTime::from_hms_opt(9, 0, 0).unwrap_or_default(),
//! )
//! .into_todo(&ids)?;
//!
//! store.send(TodoAction::AddTodo(todo.clone())).await?;
//! store.send(TodoAction::ToggleTodo { id: todo.id }).await?;
//!
//! store
//!     .state(|state| {
//!         for todo in visible_todos(state) {
//!             println!("[{}] {}", if todo.completed { "x" } else { " " }, todo.name);
//!         }
//!     })
//!     .await;
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod config;
pub mod error;
pub mod persistence;
pub mod reducer;
pub mod remote;
pub mod types;
pub mod view;

use checkmark_runtime::Store;

// Re-export commonly used types
pub use config::{Config, RemoteConfig, StorageConfig};
pub use error::{ConfigError, PersistenceError, RemoteError, ValidationError};
pub use persistence::{FileStore, KeyValueStore, MemoryStore, Persistence, ROOT_KEY, spawn_autosave};
pub use reducer::{TodoEnvironment, TodoReducer, merge_into};
pub use remote::{HttpRemoteSource, MockRemoteSource, RemoteTodo, RemoteTodoSource};
pub use types::{
    FieldValidation, SortField, SortOrder, Todo, TodoAction, TodoDraft, TodoEdit, TodoId, TodoState,
    validate,
};
pub use view::visible_todos;

/// Store running the to-do reducer
pub type TodoStore = Store<TodoState, TodoAction, TodoEnvironment, TodoReducer>;
