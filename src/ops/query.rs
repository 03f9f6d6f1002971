use std::cmp::Ordering;

use regex::{Regex, RegexBuilder};
use tracing::warn;

use crate::model::task::{Task, TaskList};
use crate::model::view::{Filter, SortOrder, ViewState};

/// Compiled size limit for a search query
const SEARCH_SIZE_LIMIT: usize = 1 << 20;

/// Search stage of the view. The query is matched as typed, whitespace included.
#[derive(Debug, Clone)]
pub enum SearchMatcher {
    /// Empty query: every task passes
    Any,
    /// Case-insensitive literal match
    Text(Regex),
    /// The query could not be compiled; nothing passes
    Unmatchable,
}

impl SearchMatcher {
    pub fn new(query: &str) -> Self {
        if query.is_empty() {
            return SearchMatcher::Any;
        }
        match RegexBuilder::new(&regex::escape(query))
            .case_insensitive(true)
            .size_limit(SEARCH_SIZE_LIMIT)
            .build()
        {
            Ok(re) => SearchMatcher::Text(re),
            Err(e) => {
                warn!(error = %e, "search query rejected, matching nothing");
                SearchMatcher::Unmatchable
            }
        }
    }

    pub fn matches(&self, text: &str) -> bool {
        match self {
            SearchMatcher::Any => true,
            SearchMatcher::Text(re) => re.is_match(text),
            SearchMatcher::Unmatchable => false,
        }
    }
}

/// Does the task pass the filter stage?
pub fn matches_filter(task: &Task, filter: Filter) -> bool {
    match filter {
        Filter::All => true,
        Filter::Active => !task.completed,
        Filter::Completed => task.completed,
        Filter::High | Filter::Medium | Filter::Low => Some(task.priority) == filter.priority(),
    }
}

/// Derive the display list: filter, then search, then sort.
///
/// Works on references; the underlying list keeps its order.
pub fn derive_view<'a>(tasks: &'a [Task], filter: Filter, search: &str, sort: SortOrder) -> Vec<&'a Task> {
    let matcher = SearchMatcher::new(search);
    let mut view: Vec<&Task> = tasks
        .iter()
        .filter(|t| matches_filter(t, filter))
        .filter(|t| matcher.matches(&t.text))
        .collect();
    sort_view(&mut view, sort);
    view
}

/// `derive_view` driven by the current view state
pub fn view_for<'a>(list: &'a TaskList, view: &ViewState) -> Vec<&'a Task> {
    derive_view(&list.tasks, view.filter, &view.search, view.sort)
}

/// Stable sort of a view. Ties keep list order.
pub fn sort_view(view: &mut [&Task], sort: SortOrder) {
    match sort {
        SortOrder::Date => view.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
        SortOrder::Priority => view.sort_by_key(|t| t.priority.rank()),
        SortOrder::Alphabetical => view.sort_by(|a, b| collate(&a.text, &b.text)),
    }
}

/// Dictionary-style comparison: case-insensitive first, lowercase before
/// uppercase on ties.
fn collate(a: &str, b: &str) -> Ordering {
    let folded = a
        .chars()
        .flat_map(char::to_lowercase)
        .cmp(b.chars().flat_map(char::to_lowercase));
    folded.then_with(|| b.cmp(a))
}
