//! Batch progress display for applying corrections to many images

use crate::io::configuration::PROGRESS_BAR_WIDTH;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use std::sync::LazyLock;
use std::time::Duration;

static BATCH_STYLE: LazyLock<ProgressStyle> = LazyLock::new(|| {
    let template = format!(
        "[{{elapsed_precise}}] Images: [{{bar:{PROGRESS_BAR_WIDTH}.cyan/blue}}] {{pos}}/{{len}} {{msg}}"
    );
    ProgressStyle::default_bar()
        .template(&template)
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏ ")
});

/// Tracks how many targets of a batch have been corrected
pub struct ProgressManager {
    bar: Option<ProgressBar>,
    completed: usize,
    skipped: usize,
}

impl Default for ProgressManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressManager {
    /// Create a progress manager with no bar yet
    pub const fn new() -> Self {
        Self {
            bar: None,
            completed: 0,
            skipped: 0,
        }
    }

    /// Create the bar for a batch of `file_count` targets
    pub fn initialize(&mut self, file_count: usize) {
        let bar = ProgressBar::new(file_count as u64);
        bar.set_style(BATCH_STYLE.clone());
        self.bar = Some(bar);
        self.completed = 0;
        self.skipped = 0;
    }

    /// Show which target is being processed
    pub fn start_file(&self, path: &Path) {
        if let Some(ref bar) = self.bar {
            let name = path.file_name().unwrap_or_default().to_string_lossy();
            bar.set_message(name.to_string());
        }
    }

    /// Mark a target as corrected
    pub fn complete_file(&mut self, elapsed: Duration) {
        self.completed += 1;
        if let Some(ref bar) = self.bar {
            bar.inc(1);
            bar.set_message(format!("last took {elapsed:.2?}"));
        }
    }

    /// Mark a target as skipped because its output already exists
    pub fn skip_file(&mut self) {
        self.skipped += 1;
        if let Some(ref bar) = self.bar {
            bar.inc(1);
        }
    }

    /// Number of targets corrected so far
    pub const fn completed(&self) -> usize {
        self.completed
    }

    /// Number of targets skipped so far
    pub const fn skipped(&self) -> usize {
        self.skipped
    }

    /// Close the bar with a summary
    pub fn finish(&self) {
        if let Some(ref bar) = self.bar {
            bar.finish_with_message(format!(
                "{} corrected, {} skipped",
                self.completed, self.skipped
            ));
        }
    }
}
