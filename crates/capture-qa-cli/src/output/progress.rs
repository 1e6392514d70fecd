//! Progress bar adapter using indicatif.

use capture_qa_core::{AnalysisResult, ProgressEvent, ProgressSink};
use indicatif::{ProgressBar as IndicatifBar, ProgressStyle};

/// Progress bar adapter for CLI output.
pub struct ProgressBar {
    bar: Option<IndicatifBar>,
    quiet: bool,
}

impl ProgressBar {
    /// Creates a new progress bar.
    ///
    /// # Arguments
    ///
    /// * `total` - Total number of items, if known
    /// * `quiet` - If true, suppress all output
    /// * `show_bar` - If true, show progress bar; otherwise show per-item status
    #[must_use]
    pub fn new(total: Option<u64>, quiet: bool, show_bar: bool) -> Self {
        if quiet {
            return Self {
                bar: None,
                quiet: true,
            };
        }

        let bar = if show_bar {
            let bar = total.map_or_else(IndicatifBar::new_spinner, IndicatifBar::new);

            if let Ok(style) = ProgressStyle::default_bar().template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})",
            ) {
                bar.set_style(style.progress_chars("#>-"));
            }

            Some(bar)
        } else {
            None
        };

        Self { bar, quiet }
    }
}

/// One-line status for a finished record, or `None` when it passed.
fn status_line(result: &AnalysisResult) -> Option<String> {
    let Some(verdict) = result.verdict else {
        let reason = result.error.as_deref().unwrap_or("unknown error");
        return Some(format!("{}: unscored ({reason})", result.path));
    };

    let flags: Vec<&str> = [(verdict.is_dark, "dark"), (verdict.is_blur, "blurred")]
        .into_iter()
        .filter_map(|(set, name)| set.then_some(name))
        .collect();

    if flags.is_empty() {
        None
    } else {
        Some(format!("{}: {}", result.path, flags.join(", ")))
    }
}

impl ProgressSink for ProgressBar {
    fn on_event(&self, event: ProgressEvent) {
        if self.quiet {
            return;
        }

        match event {
            ProgressEvent::Started { path, index, total } => {
                if let Some(bar) = &self.bar {
                    if let Some(t) = total {
                        bar.set_length(t as u64);
                    }
                    bar.set_position(index as u64);
                    bar.set_message(path);
                }
            }
            ProgressEvent::Completed { result } => {
                if let Some(bar) = &self.bar {
                    bar.inc(1);
                } else if let Some(line) = status_line(&result) {
                    eprintln!("{line}");
                }
            }
            ProgressEvent::Skipped { path, reason } => {
                if let Some(bar) = &self.bar {
                    bar.inc(1);
                }
                eprintln!("WARN: Skipping {path}: {reason}");
            }
            ProgressEvent::Finished {
                accepted,
                rejected,
                unscored,
            } => {
                let message =
                    format!("Done: {accepted} accepted, {rejected} rejected, {unscored} unscored");
                if let Some(bar) = &self.bar {
                    bar.finish_with_message(message);
                }
            }
        }
    }
}
