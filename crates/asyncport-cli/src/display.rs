//! Terminal rendering of run summaries

use console::style;

use asyncport_engine::{EntryKind, RunMode, RunSummary, SummaryCounts, SummaryEntry};

fn mode_title(mode: RunMode) -> &'static str {
    match mode {
        RunMode::TestMode => "Test run",
        RunMode::TestModeKeep => "Test run (domains kept)",
        RunMode::ReleaseMode => "Release",
    }
}

/// One-line count overview of a mode
pub fn counts_line(counts: &SummaryCounts) -> String {
    format!(
        "{} created, {} updated, {} unchanged, {} warning(s), {} error(s)",
        counts.created, counts.updated, counts.unchanged, counts.warnings, counts.errors
    )
}

fn context_line(entry: &SummaryEntry) -> String {
    entry
        .context
        .iter()
        .filter(|(key, _)| *key != "mode")
        .map(|(key, value)| format!("{key}={value}"))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Render the summary as printable lines, most recent mode last
pub fn summary_lines(summary: &RunSummary) -> Vec<String> {
    let mut lines = Vec::new();

    for mode in summary.modes() {
        let counts = summary.counts(mode);
        let marker = if counts.errors > 0 {
            style("✗").red().bold()
        } else if counts.warnings > 0 {
            style("⚠").yellow()
        } else {
            style("✓").green()
        };
        lines.push(format!(
            "{} {}: {}",
            marker,
            style(mode_title(mode)).bold(),
            counts_line(&counts)
        ));

        for entry in summary.entries_for(mode) {
            match &entry.kind {
                EntryKind::Warning { message } => {
                    lines.push(format!("  {} {}", style("⚠").yellow(), message));
                }
                EntryKind::Error { message } => {
                    lines.push(format!("  {} {}", style("✗").red(), message));
                    let context = context_line(entry);
                    if !context.is_empty() {
                        lines.push(format!("    {}", style(context).dim()));
                    }
                }
                _ => {}
            }
        }
    }
    lines
}

pub fn print_summary(summary: &RunSummary) {
    println!();
    for line in summary_lines(summary) {
        println!("{line}");
    }
}
