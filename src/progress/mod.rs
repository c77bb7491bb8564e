//! Terminal rendering of run events.

use crate::run::{EventSink, RunEvent, STAGE_CHUNK_SIZE};

const SIZE_UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];

/// Human-readable size with at most two decimals: `350 B`, `1.5 KB`, `1 GB`.
pub fn format_size(bytes: u64) -> String {
    if bytes == 0 {
        return "0 B".to_string();
    }

    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < SIZE_UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    let rounded = (value * 100.0).round() / 100.0;
    format!("{} {}", rounded, SIZE_UNITS[unit])
}

/// Share of the push budget used, as a percentage with one decimal.
pub fn push_budget_percent(backlog_bytes: u64, max_push_bytes: u64) -> String {
    if max_push_bytes == 0 {
        return "0.0".to_string();
    }
    format!("{:.1}", backlog_bytes as f64 / max_push_bytes as f64 * 100.0)
}

/// A rendered line and where it goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    pub text: String,
    pub is_error: bool,
}

impl Line {
    fn out(text: String) -> Self {
        Self {
            text,
            is_error: false,
        }
    }

    fn err(text: String) -> Self {
        Self {
            text,
            is_error: true,
        }
    }
}

/// Prints one status line per event. In quiet mode only failures are shown.
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalReporter {
    quiet: bool,
}

impl TerminalReporter {
    pub fn new(quiet: bool) -> Self {
        Self { quiet }
    }

    /// Lines for `event`, after the quiet filter.
    pub fn render(&self, event: &RunEvent) -> Vec<Line> {
        let lines = render_event(event);
        if self.quiet {
            lines.into_iter().filter(|l| l.is_error).collect()
        } else {
            lines
        }
    }
}

impl EventSink for TerminalReporter {
    fn emit(&self, event: &RunEvent) {
        for line in self.render(event) {
            if line.is_error {
                eprintln!("{}", line.text);
            } else {
                println!("{}", line.text);
            }
        }
    }
}

fn render_event(event: &RunEvent) -> Vec<Line> {
    match event {
        RunEvent::Pulled => vec![Line::out("  [DONE] Pulled latest changes".to_string())],
        RunEvent::PullFailed { error } => vec![Line::err(format!(
            "  [WARN] Pull failed, continuing with local state: {}",
            error
        ))],
        RunEvent::UntrackedListed { count } => {
            vec![Line::out(format!("Found {} untracked files", count))]
        }
        RunEvent::FileSkipped { path, reason } => {
            vec![Line::err(format!("  [WARN] Skipped {}: {}", path, reason))]
        }
        RunEvent::BatchesPlanned {
            batches,
            files,
            total_bytes,
        } => vec![Line::out(format!(
            "Planned {} batches for {} files ({})",
            batches,
            files,
            format_size(*total_bytes)
        ))],
        RunEvent::BatchStarted {
            index,
            total,
            message,
            files,
        } => vec![Line::out(format!(
            "\nBatch {}/{}: {} ({} files)",
            index, total, message, files
        ))],
        RunEvent::StageProgress { staged, total } if *total > STAGE_CHUNK_SIZE => {
            vec![Line::out(format!("  Staged {}/{} files", staged, total))]
        }
        RunEvent::StageProgress { .. } => Vec::new(),
        RunEvent::BatchCommitted {
            commit_id,
            files,
            bytes,
            backlog_bytes,
            max_push_bytes,
            ..
        } => {
            let short_id = commit_id.get(..7).unwrap_or(commit_id);
            vec![
                Line::out(format!(
                    "  [DONE] Committed {} files ({}) as {}",
                    files,
                    format_size(*bytes),
                    short_id
                )),
                Line::out(format!(
                    "  Push size: {} / {} ({}%)",
                    format_size(*backlog_bytes),
                    format_size(*max_push_bytes),
                    push_budget_percent(*backlog_bytes, *max_push_bytes)
                )),
            ]
        }
        RunEvent::BatchFailed { index, error } => {
            vec![Line::err(format!("  [FAIL] Batch {}: {}", index, error))]
        }
        RunEvent::PushStarted {
            attempt,
            commits,
            bytes,
            reason,
        } => vec![Line::out(format!(
            "  [PUSH] Push {}: {} commits ({}) - {}",
            attempt,
            commits,
            format_size(*bytes),
            reason
        ))],
        RunEvent::PushSucceeded { attempt } => {
            vec![Line::out(format!("  [DONE] Push {} successful", attempt))]
        }
        RunEvent::PushFailed { attempt, error } => vec![
            Line::err(format!("  [FAIL] Push {} failed: {}", attempt, error)),
            Line::err(
                "         Commits are saved locally. Push manually later with: git push"
                    .to_string(),
            ),
        ],
        RunEvent::Cooldown { .. } => Vec::new(),
    }
}
