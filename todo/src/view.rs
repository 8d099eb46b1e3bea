//! Derived view of the to-do list.
//!
//! The view is recomputed on every read from the current state: filter by
//! the search query, then stable-sort by the selected field and order.

use crate::types::{SortField, SortOrder, Todo, TodoState};
use icu_collator::{Collator, CollatorOptions};
use std::cmp::Ordering;

/// The to-dos to display, filtered and sorted per the state's view settings
#[must_use]
pub fn visible_todos(state: &TodoState) -> Vec<&Todo> {
    let query = state.search_query.to_lowercase();
    let mut visible: Vec<&Todo> = state
        .todos
        .iter()
        .filter(|todo| matches_query(todo, &query))
        .collect();

    visible.sort_by(|a, b| compare(a, b, state.sort_by, state.sort_order));
    visible
}

/// Case-insensitive substring match over name, description, date and time
///
/// `query` must already be lowercased. An empty query matches everything.
#[must_use]
pub fn matches_query(todo: &Todo, query: &str) -> bool {
    if query.is_empty() {
        return true;
    }

    [
        todo.name.to_lowercase(),
        todo.description.to_lowercase(),
        todo.due_date_string(),
        todo.due_time_string(),
    ]
    .iter()
    .any(|field| field.contains(query))
}

/// Orders two to-dos by `field`; `Desc` reverses the comparator
#[must_use]
pub fn compare(a: &Todo, b: &Todo, field: SortField, order: SortOrder) -> Ordering {
    let ordering = match field {
        SortField::Name => collate(&a.name, &b.name),
        SortField::Date => a.due_date.cmp(&b.due_date),
        SortField::Time => a.due_time.cmp(&b.due_time),
    };

    match order {
        SortOrder::Asc => ordering,
        SortOrder::Desc => ordering.reverse(),
    }
}

thread_local! {
    static COLLATOR: Option<Collator> =
        Collator::try_new(&Default::default(), CollatorOptions::new()).ok();
}

/// Locale-aware name ordering using the root collation
///
/// Accents and case only break ties between names that are otherwise
/// equal, and lowercase sorts before uppercase. Falls back to a
/// case-insensitive code point comparison if collation data is unavailable.
#[must_use]
pub fn collate(a: &str, b: &str) -> Ordering {
    COLLATOR
        .with(|collator| match collator {
            Some(collator) => collator.compare(a, b),
            None => a.to_lowercase().cmp(&b.to_lowercase()),
        })
        .then_with(|| b.cmp(a))
}
