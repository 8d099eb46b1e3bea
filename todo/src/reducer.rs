//! Reducer logic for the to-do list.
//!
//! Every mutation is total: an action naming an id that is not present
//! leaves the state unchanged. The only asynchronous work is the remote
//! fetch, returned as an [`Effect::Future`] that resolves to
//! [`TodoAction::RemoteFetched`] or [`TodoAction::RemoteFetchFailed`].

use crate::remote::RemoteTodoSource;
use crate::types::{Todo, TodoAction, TodoId, TodoState};
use checkmark_core::{SmallVec, effect::Effect, reducer::Reducer, smallvec};
use std::collections::HashSet;
use std::sync::Arc;

/// Environment dependencies for the to-do reducer
#[derive(Clone)]
pub struct TodoEnvironment {
    /// Where `FetchRemote` gets its to-dos from
    pub remote: Arc<dyn RemoteTodoSource>,
}

impl TodoEnvironment {
    /// Creates a new `TodoEnvironment`
    #[must_use]
    pub fn new(remote: Arc<dyn RemoteTodoSource>) -> Self {
        Self { remote }
    }
}

/// Reducer for the to-do list
#[derive(Clone, Debug, Default)]
pub struct TodoReducer;

impl TodoReducer {
    /// Creates a new `TodoReducer`
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    fn update(state: &mut TodoState, todo: Todo) {
        if let Some(slot) = state.todos.iter_mut().find(|t| t.id == todo.id) {
            *slot = todo;
        } else {
            tracing::debug!(id = %todo.id, "UpdateTodo ignored: no todo with this id");
        }
    }

    fn delete(state: &mut TodoState, id: &TodoId) {
        let before = state.todos.len();
        state.todos.retain(|t| &t.id != id);
        if state.todos.len() == before {
            tracing::debug!(%id, "DeleteTodo ignored: no todo with this id");
        }
    }

    fn toggle(state: &mut TodoState, id: &TodoId) {
        if let Some(todo) = state.todos.iter_mut().find(|t| &t.id == id) {
            todo.completed = !todo.completed;
        } else {
            tracing::debug!(%id, "ToggleTodo ignored: no todo with this id");
        }
    }

    fn fetch(env: &TodoEnvironment) -> Effect<TodoAction> {
        let remote = Arc::clone(&env.remote);
        Effect::future(async move {
            match remote.fetch_todos().await {
                Ok(todos) => Some(TodoAction::RemoteFetched(todos)),
                Err(error) => Some(TodoAction::RemoteFetchFailed {
                    message: error.to_string(),
                }),
            }
        })
    }
}

/// Appends each incoming to-do whose id is not present yet
///
/// Ids appended earlier in the same batch count as present. Existing
/// entries are never touched. Returns how many were appended.
pub fn merge_into(todos: &mut Vec<Todo>, incoming: Vec<Todo>) -> usize {
    let mut seen: HashSet<TodoId> = todos.iter().map(|t| t.id.clone()).collect();
    let before = todos.len();

    for todo in incoming {
        if seen.insert(todo.id.clone()) {
            todos.push(todo);
        }
    }

    todos.len() - before
}

impl Reducer for TodoReducer {
    type State = TodoState;
    type Action = TodoAction;
    type Environment = TodoEnvironment;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            // ========== Collection ==========
            TodoAction::AddTodo(todo) => state.todos.push(todo),
            TodoAction::UpdateTodo(todo) => Self::update(state, todo),
            TodoAction::DeleteTodo { id } => Self::delete(state, &id),
            TodoAction::ToggleTodo { id } => Self::toggle(state, &id),
            TodoAction::ReplaceAll(todos) => state.todos = todos,
            TodoAction::Merge(incoming) => {
                let added = merge_into(&mut state.todos, incoming);
                tracing::debug!(added, "Merged todos");
            },

            // ========== View ==========
            TodoAction::SetSearchQuery(query) => state.search_query = query,
            TodoAction::SetSortBy(field) => state.sort_by = field,
            TodoAction::SetSortOrder(order) => state.sort_order = order,

            // ========== Remote fetch ==========
            TodoAction::SetLoading(loading) => state.is_loading = loading,
            TodoAction::SetError(error) => state.error = error,
            TodoAction::FetchRemote => {
                state.is_loading = true;
                state.error = None;
                return smallvec![Self::fetch(env)];
            },
            TodoAction::RemoteFetched(todos) => {
                let added = merge_into(&mut state.todos, todos);
                state.is_loading = false;
                tracing::info!(added, "Remote todos merged");
            },
            TodoAction::RemoteFetchFailed { message } => {
                tracing::warn!(error = %message, "Remote fetch failed");
                state.error = Some(message);
                state.is_loading = false;
            },
        }

        SmallVec::new()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)] // Test code can use unwrap/expect/panic
mod tests {
    use super::*;
    use crate::error::RemoteError;
    use crate::remote::MockRemoteSource;
    use crate::types::{SortField, SortOrder};
    use checkmark_testing::{ReducerTest, assertions};
    use chrono::{NaiveDate, NaiveTime};

    fn test_env() -> TodoEnvironment {
        TodoEnvironment::new(Arc::new(MockRemoteSource::succeeding(Vec::new())))
    }

    fn todo(id: &str, name: &str) -> Todo {
        Todo {
            id: TodoId::from(id),
            name: name.to_string(),
            description: format!("about {name}"),
            due_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            due_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            completed: false,
        }
    }

    fn ids(state: &TodoState) -> Vec<&str> {
        state.todos.iter().map(|t| t.id.as_str()).collect()
    }

    #[test]
    fn add_appends_in_order() {
        ReducerTest::new(TodoReducer::new())
            .with_env(test_env())
            .given_state(TodoState::with_todos(vec![todo("1", "a")]))
            .when_action(TodoAction::AddTodo(todo("2", "b")))
            .then_state(|state| assert_eq!(ids(state), ["1", "2"]))
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[test]
    fn add_toggle_delete_scenario() {
        let milk = Todo {
            id: TodoId::from("1"),
            name: "Buy milk".to_string(),
            description: "2%".to_string(),
            due_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            due_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            completed: false,
        };

        ReducerTest::new(TodoReducer::new())
            .with_env(test_env())
            .given_state(TodoState::new())
            .when_action(TodoAction::AddTodo(milk.clone()))
            .when_action(TodoAction::ToggleTodo { id: "1".into() })
            .then_state(move |state| {
                assert_eq!(state.todos.len(), 1);
                assert!(state.todos[0].completed);
                assert_eq!(state.todos[0].name, milk.name);
            })
            .run();

        ReducerTest::new(TodoReducer::new())
            .with_env(test_env())
            .given_state(TodoState::new())
            .when_action(TodoAction::AddTodo(todo("1", "Buy milk")))
            .when_action(TodoAction::ToggleTodo { id: "1".into() })
            .when_action(TodoAction::DeleteTodo { id: "1".into() })
            .then_state(|state| assert!(state.todos.is_empty()))
            .run();
    }

    #[test]
    fn update_replaces_in_place() {
        let mut renamed = todo("2", "b");
        renamed.name = "renamed".to_string();
        renamed.completed = true;
        let expected = renamed.clone();

        ReducerTest::new(TodoReducer::new())
            .with_env(test_env())
            .given_state(TodoState::with_todos(vec![
                todo("1", "a"),
                todo("2", "b"),
                todo("3", "c"),
            ]))
            .when_action(TodoAction::UpdateTodo(renamed))
            .then_state(move |state| {
                assert_eq!(ids(state), ["1", "2", "3"]);
                assert_eq!(state.todos[1], expected);
            })
            .run();
    }

    #[test]
    fn update_of_missing_id_is_a_no_op() {
        let initial = TodoState::with_todos(vec![todo("1", "a")]);
        let expected = initial.clone();

        ReducerTest::new(TodoReducer::new())
            .with_env(test_env())
            .given_state(initial)
            .when_action(TodoAction::UpdateTodo(todo("9", "ghost")))
            .then_state(move |state| assert_eq!(*state, expected))
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[test]
    fn delete_removes_every_entry_with_the_id() {
        ReducerTest::new(TodoReducer::new())
            .with_env(test_env())
            .given_state(TodoState::with_todos(vec![
                todo("1", "a"),
                todo("2", "b"),
                todo("1", "duplicate"),
            ]))
            .when_action(TodoAction::DeleteTodo { id: "1".into() })
            .then_state(|state| assert_eq!(ids(state), ["2"]))
            .run();
    }

    #[test]
    fn toggle_and_delete_of_missing_id_are_no_ops() {
        let initial = TodoState::with_todos(vec![todo("1", "a")]);
        let expected = initial.clone();

        ReducerTest::new(TodoReducer::new())
            .with_env(test_env())
            .given_state(initial)
            .when_action(TodoAction::ToggleTodo { id: "9".into() })
            .when_action(TodoAction::DeleteTodo { id: "9".into() })
            .then_state(move |state| assert_eq!(*state, expected))
            .run();
    }

    #[test]
    fn toggle_twice_restores_completion() {
        ReducerTest::new(TodoReducer::new())
            .with_env(test_env())
            .given_state(TodoState::with_todos(vec![todo("1", "a")]))
            .when_action(TodoAction::ToggleTodo { id: "1".into() })
            .when_action(TodoAction::ToggleTodo { id: "1".into() })
            .then_state(|state| assert!(!state.todos[0].completed))
            .run();
    }

    #[test]
    fn merge_skips_known_ids_and_keeps_local_copy() {
        let mut changed = todo("1", "changed remotely");
        changed.completed = true;

        ReducerTest::new(TodoReducer::new())
            .with_env(test_env())
            .given_state(TodoState::new())
            .when_action(TodoAction::Merge(vec![todo("1", "a"), todo("2", "b")]))
            .when_action(TodoAction::Merge(vec![changed, todo("3", "c")]))
            .then_state(|state| {
                assert_eq!(ids(state), ["1", "2", "3"]);
                assert_eq!(state.todos[0].name, "a");
                assert!(!state.todos[0].completed);
            })
            .run();
    }

    #[test]
    fn merge_dedups_within_a_batch() {
        ReducerTest::new(TodoReducer::new())
            .with_env(test_env())
            .given_state(TodoState::new())
            .when_action(TodoAction::Merge(vec![todo("1", "first"), todo("1", "second")]))
            .then_state(|state| {
                assert_eq!(state.todos.len(), 1);
                assert_eq!(state.todos[0].name, "first");
            })
            .run();
    }

    #[test]
    fn replace_all_installs_collection_verbatim() {
        ReducerTest::new(TodoReducer::new())
            .with_env(test_env())
            .given_state(TodoState::with_todos(vec![todo("1", "a")]))
            .when_action(TodoAction::ReplaceAll(vec![todo("5", "e"), todo("4", "d")]))
            .then_state(|state| assert_eq!(ids(state), ["5", "4"]))
            .run();
    }

    #[test]
    fn view_settings_replace_transient_fields() {
        ReducerTest::new(TodoReducer::new())
            .with_env(test_env())
            .given_state(TodoState::with_todos(vec![todo("1", "a")]))
            .when_action(TodoAction::SetSearchQuery("milk".to_string()))
            .when_action(TodoAction::SetSortBy(SortField::Name))
            .when_action(TodoAction::SetSortOrder(SortOrder::Desc))
            .when_action(TodoAction::SetLoading(true))
            .when_action(TodoAction::SetError(Some("boom".to_string())))
            .then_state(|state| {
                assert_eq!(state.search_query, "milk");
                assert_eq!(state.sort_by, SortField::Name);
                assert_eq!(state.sort_order, SortOrder::Desc);
                assert!(state.is_loading);
                assert_eq!(state.error.as_deref(), Some("boom"));
                assert_eq!(ids(state), ["1"]);
            })
            .run();
    }

    #[test]
    fn fetch_remote_sets_loading_and_returns_effect() {
        let mut initial = TodoState::new();
        initial.error = Some("old failure".to_string());

        ReducerTest::new(TodoReducer::new())
            .with_env(test_env())
            .given_state(initial)
            .when_action(TodoAction::FetchRemote)
            .then_state(|state| {
                assert!(state.is_loading);
                assert_eq!(state.error, None);
            })
            .then_effects(|effects| {
                assertions::assert_effects_count(effects, 1);
                assertions::assert_has_future_effect(effects);
            })
            .run();
    }

    #[test]
    fn remote_fetched_merges_and_clears_loading() {
        let mut initial = TodoState::with_todos(vec![todo("1", "local")]);
        initial.is_loading = true;

        ReducerTest::new(TodoReducer::new())
            .with_env(test_env())
            .given_state(initial)
            .when_action(TodoAction::RemoteFetched(vec![todo("1", "remote"), todo("2", "b")]))
            .then_state(|state| {
                assert!(!state.is_loading);
                assert_eq!(ids(state), ["1", "2"]);
                assert_eq!(state.todos[0].name, "local");
            })
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[test]
    fn remote_fetch_failed_records_error_and_keeps_todos() {
        let mut initial = TodoState::with_todos(vec![todo("1", "a")]);
        initial.is_loading = true;
        let message = RemoteError::Request("offline".to_string()).to_string();
        let expected = message.clone();

        ReducerTest::new(TodoReducer::new())
            .with_env(test_env())
            .given_state(initial)
            .when_action(TodoAction::RemoteFetchFailed { message })
            .then_state(move |state| {
                assert!(!state.is_loading);
                assert_eq!(state.error.as_deref(), Some(expected.as_str()));
                assert_eq!(ids(state), ["1"]);
            })
            .run();
    }

    #[tokio::test]
    async fn fetch_effect_resolves_to_failure_action() {
        let env = TodoEnvironment::new(Arc::new(MockRemoteSource::failing(RemoteError::Request(
            "offline".to_string(),
        ))));
        let mut state = TodoState::new();

        let mut effects = TodoReducer::new().reduce(&mut state, TodoAction::FetchRemote, &env);

        let Some(Effect::Future(fut)) = effects.pop() else {
            panic!("expected a future effect");
        };
        assert_eq!(
            fut.await,
            Some(TodoAction::RemoteFetchFailed {
                message: "Failed to fetch todos: offline".to_string()
            })
        );
    }

    #[test]
    fn merge_into_reports_added_count() {
        let mut todos = vec![todo("1", "a")];

        let added = merge_into(&mut todos, vec![todo("1", "x"), todo("2", "b"), todo("2", "y")]);

        assert_eq!(added, 1);
        assert_eq!(todos.len(), 2);
    }
}
