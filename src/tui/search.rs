use fuzzy_matcher::FuzzyMatcher;
use fuzzy_matcher::skim::SkimMatcherV2;

use crate::api::Page;

/// Indices of `pages` matching `query` on title or path, best match first.
///
/// An empty query keeps every page in its original order.
pub fn filter_pages(pages: &[Page], query: &str) -> Vec<usize> {
    let query = query.trim();
    if query.is_empty() {
        return (0..pages.len()).collect();
    }

    let matcher = SkimMatcherV2::default().ignore_case();
    let mut scored: Vec<(usize, i64)> = pages
        .iter()
        .enumerate()
        .filter_map(|(i, page)| {
            let title = matcher.fuzzy_match(&page.title, query);
            let path = matcher.fuzzy_match(&page.path, query);
            title.max(path).map(|score| (i, score))
        })
        .collect();

    // stable: equal scores keep list order
    scored.sort_by(|a, b| b.1.cmp(&a.1));
    scored.into_iter().map(|(i, _)| i).collect()
}
