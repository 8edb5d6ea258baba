//! Batch mutations with the "all failed is an error, anything else is done" convention.

use anyhow::Result;

use super::pages::{Page, PageApi};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchFailure {
    pub item: String,
    pub reason: String,
}

/// Success/failure tally of a batch of remote mutations
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchReport {
    action: String,
    noun: String,
    succeeded: usize,
    failures: Vec<BatchFailure>,
}

impl BatchReport {
    /// `action` and `noun` name the work, e.g. `("delete", "page")`
    pub fn new(action: impl Into<String>, noun: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            noun: noun.into(),
            succeeded: 0,
            failures: Vec::new(),
        }
    }

    pub fn record_success(&mut self) {
        self.succeeded += 1;
    }

    pub fn record_failure(&mut self, item: impl Into<String>, reason: impl Into<String>) {
        self.failures.push(BatchFailure {
            item: item.into(),
            reason: reason.into(),
        });
    }

    pub fn succeeded(&self) -> usize {
        self.succeeded
    }

    pub fn failed(&self) -> usize {
        self.failures.len()
    }

    pub fn failures(&self) -> &[BatchFailure] {
        &self.failures
    }

    pub fn total(&self) -> usize {
        self.succeeded + self.failures.len()
    }

    pub fn all_failed(&self) -> bool {
        self.succeeded == 0 && !self.failures.is_empty()
    }

    /// "Delete complete" or "Delete complete (2 failed)"
    pub fn summary(&self) -> String {
        let mut action = self.action.clone();
        if let Some(first) = action.get_mut(0..1) {
            first.make_ascii_uppercase();
        }
        if self.failures.is_empty() {
            format!("{} complete", action)
        } else {
            format!("{} complete ({} failed)", action, self.failures.len())
        }
    }

    /// Error when nothing succeeded, otherwise the summary line
    pub fn into_result(self) -> Result<String> {
        if self.all_failed() {
            anyhow::bail!(
                "Failed to {} all {} {}(s)",
                self.action,
                self.failures.len(),
                self.noun
            );
        }
        Ok(self.summary())
    }
}

/// Delete `pages` one at a time, reporting `(index, total, page)` before each request
pub async fn delete_pages<F>(api: &dyn PageApi, pages: &[Page], mut on_progress: F) -> BatchReport
where
    F: FnMut(usize, usize, &Page),
{
    let mut report = BatchReport::new("delete", "page");
    let total = pages.len();

    for (i, page) in pages.iter().enumerate() {
        on_progress(i + 1, total, page);
        match api.delete_page(page.id).await {
            Ok(result) if result.succeeded => report.record_success(),
            Ok(result) => {
                log::error!("Failed to delete page {} ({}): {}", page.id, page.path, result.describe());
                report.record_failure(&page.path, result.describe());
            }
            Err(err) => {
                log::error!("Error deleting page {} ({}): {:#}", page.id, page.path, err);
                report.record_failure(&page.path, format!("{:#}", err));
            }
        }
    }

    log::info!(
        "Deleted {}/{} pages ({} failed)",
        report.succeeded(),
        total,
        report.failed()
    );
    report
}
