//! Terminal presentation for the browse command
//!
//! Renders a listing page as text and tracks the thumbnails of that page
//! while they arrive, using an indicatif bar when progress bars are enabled
//! and plain lines otherwise.

use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

use crate::app::models::{ModelPage, ModelSummary};

/// Configuration for the terminal presentation
#[derive(Debug, Clone)]
pub struct ProgressConfig {
    /// Enable spinners and progress bars
    pub enable_progress_bars: bool,
    /// Maximum width for model names in the listing
    pub max_name_width: usize,
    /// Include versions and download links
    pub show_details: bool,
}

impl Default for ProgressConfig {
    fn default() -> Self {
        Self {
            enable_progress_bars: true,
            max_name_width: 48,
            show_details: false,
        }
    }
}

/// Spinner shown while waiting for the network
pub fn spinner(config: &ProgressConfig, message: impl Into<String>) -> Option<ProgressBar> {
    if !config.enable_progress_bars {
        return None;
    }

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["◐", "◓", "◑", "◒"]),
    );
    spinner.set_message(message.into());
    spinner.enable_steady_tick(Duration::from_millis(120));
    Some(spinner)
}

/// Render one listing page, including the navigation state
pub fn format_page(page: &ModelPage, config: &ProgressConfig) -> String {
    let mut out = String::new();

    let filter = match page.query.search() {
        Some(text) => format!(" matching '{}'", text),
        None => String::new(),
    };
    out.push_str(&format!("📚 {}{}\n", page.label(), filter));
    out.push_str(&"─".repeat(40));
    out.push('\n');

    if page.items.is_empty() {
        out.push_str("No models found.\n");
    }

    for model in &page.items {
        out.push_str(&format_model(model, config));
    }

    out.push('\n');
    out.push_str(&navigation_hint(page));
    out
}

fn format_model(model: &ModelSummary, config: &ProgressConfig) -> String {
    let mut flags = Vec::new();
    if model.is_adult_content {
        flags.push("NSFW");
    }
    if !model.allows_commercial_use {
        flags.push("non-commercial");
    }
    let flags = if flags.is_empty() {
        String::new()
    } else {
        format!(" [{}]", flags.join(", "))
    };

    let mut line = format!(
        "{:>8}  {:<width$}  {}{}\n",
        model.display_id(),
        truncate_name(&model.name, config.max_name_width),
        model.kind,
        flags,
        width = config.max_name_width
    );

    if config.show_details {
        for version in &model.versions {
            line.push_str(&format!(
                "          ↳ {} ({})\n",
                version.name, version.base_model
            ));
        }
        if let Some(url) = model.download_url() {
            line.push_str(&format!("          ⬇ {}\n", url));
        }
    }

    line
}

/// Which navigation moves are possible from `page`
pub fn navigation_hint(page: &ModelPage) -> String {
    let mut moves = Vec::new();
    if page.has_previous() {
        moves.push(format!("--page {} for previous", page.current_page - 1));
    }
    if page.has_next() {
        moves.push(format!("--page {} for next", page.current_page + 1));
    }

    if moves.is_empty() {
        "This is the only page.\n".to_string()
    } else {
        format!("Use {}.\n", moves.join(", "))
    }
}

/// Shorten a name to `max_width` characters, marking the cut with an ellipsis
pub fn truncate_name(name: &str, max_width: usize) -> String {
    if name.chars().count() <= max_width {
        return name.to_string();
    }
    let kept: String = name.chars().take(max_width.saturating_sub(1)).collect();
    format!("{}…", kept)
}

/// Thumbnails of the displayed page that have not resolved yet
pub struct ThumbnailProgress {
    pending: HashSet<u64>,
    ready: usize,
    failed: usize,
    bar: Option<ProgressBar>,
}

impl ThumbnailProgress {
    /// Track every thumbnail the page will fetch
    pub fn new(page: &ModelPage, config: &ProgressConfig) -> Self {
        let pending: HashSet<u64> = page.thumbnail_targets().map(|(id, _)| id).collect();

        let bar = (config.enable_progress_bars && !pending.is_empty()).then(|| {
            let bar = ProgressBar::new(pending.len() as u64);
            bar.set_style(
                ProgressStyle::default_bar()
                    .template("🖼  Thumbnails [{bar:30.cyan/blue}] {pos}/{len} {msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_bar())
                    .progress_chars("█▉▊▋▌▍▎▏  "),
            );
            bar
        });

        Self {
            pending,
            ready: 0,
            failed: 0,
            bar,
        }
    }

    /// Record a ready thumbnail; returns false for ids not on this page
    pub fn ready(&mut self, model_id: u64, path: &Path) -> bool {
        if !self.pending.remove(&model_id) {
            return false;
        }
        self.ready += 1;
        self.report(format!("{:>8}  {}", model_id, path.display()));
        true
    }

    /// Record a failed thumbnail; returns false for ids not on this page
    pub fn failed(&mut self, model_id: u64, reason: &str) -> bool {
        if !self.pending.remove(&model_id) {
            return false;
        }
        self.failed += 1;
        self.report(format!("{:>8}  ❌ {}", model_id, reason));
        true
    }

    fn report(&self, line: String) {
        match &self.bar {
            Some(bar) => {
                bar.println(line);
                bar.inc(1);
            }
            None => println!("{}", line),
        }
    }

    /// All thumbnails resolved
    pub fn is_done(&self) -> bool {
        self.pending.is_empty()
    }

    /// Number of thumbnails still outstanding
    pub fn remaining(&self) -> usize {
        self.pending.len()
    }

    /// Clear the bar and return (ready, failed) counts
    pub fn finish(self) -> (usize, usize) {
        if let Some(bar) = &self.bar {
            bar.finish_and_clear();
        }
        (self.ready, self.failed)
    }
}
