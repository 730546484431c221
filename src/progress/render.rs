// src/progress/render.rs

//! Human-readable progress lines.
//!
//! Rendering never mutates progress; color is passed in explicitly.

use chrono::TimeDelta;

use super::DeploymentProgress;
use crate::types::{HighlightColor, ProgressStyle};

/// Number of cells in the `bar` progress style.
pub const BAR_WIDTH: usize = 30;

/// `task_index / total_tasks * 100`, or 0 when there are no tasks.
pub fn percentage(task_index: usize, total_tasks: usize) -> f64 {
    if total_tasks == 0 {
        return 0.0;
    }
    task_index as f64 / total_tasks as f64 * 100.0
}

/// Filled cells for a given percentage, clamped to `[0, BAR_WIDTH]`.
pub fn bar_fill(percentage: f64) -> usize {
    let filled = (BAR_WIDTH as f64 * percentage / 100.0).floor();
    if filled <= 0.0 {
        0
    } else {
        (filled as usize).min(BAR_WIDTH)
    }
}

fn render_bar(filled: usize) -> String {
    let mut bar = String::with_capacity(BAR_WIDTH + 2);
    bar.push('[');
    for i in 0..BAR_WIDTH {
        if i < filled {
            bar.push('=');
        } else if i == filled {
            bar.push('>');
        } else {
            bar.push(' ');
        }
    }
    bar.push(']');
    bar
}

impl DeploymentProgress {
    /// Progress line shown before running the task at `task_index` (0-based).
    ///
    /// ```text
    /// [==========>                   ] 33.3% (2/3) Current: install-meta
    /// ```
    pub fn render(
        &self,
        task_index: usize,
        task_name: &str,
        style: ProgressStyle,
        color: HighlightColor,
    ) -> String {
        let pct = percentage(task_index, self.total_tasks);
        let position = task_index + 1;

        let message = match style {
            ProgressStyle::Bar => format!(
                "{} {:.1}% ({}/{}) Current: {}",
                render_bar(bar_fill(pct)),
                pct,
                position,
                self.total_tasks,
                task_name
            ),
            ProgressStyle::Percentage => format!(
                "Deployment progress: {:.1}% ({}/{}) - Running task: {}",
                pct, position, self.total_tasks, task_name
            ),
            ProgressStyle::Plain => format!(
                "Running task {} ({}/{})",
                task_name, position, self.total_tasks
            ),
        };

        color.paint(message, false)
    }

    /// Completion summary: the success line, then the total elapsed time if
    /// the deployment has an end time.
    pub fn render_completion(&self, color: HighlightColor) -> Vec<String> {
        let mut lines = vec![color.paint("Deployment completed successfully!".to_string(), true)];
        if let Some(end) = self.end_time {
            lines.push(format!(
                "Total deployment time: {}",
                format_duration(end - self.start_time)
            ));
        }
        lines
    }
}

/// Format a duration as e.g. `1 hour 5 seconds`.
///
/// Zero-valued units are omitted; seconds are always shown when every unit
/// is zero. Negative durations render as zero.
pub fn format_duration(d: TimeDelta) -> String {
    let total = d.num_seconds().max(0);
    let hours = total / 3600;
    let minutes = (total / 60) % 60;
    let seconds = total % 60;

    let mut parts = Vec::new();
    if hours > 0 {
        parts.push(unit(hours, "hour"));
    }
    if minutes > 0 {
        parts.push(unit(minutes, "minute"));
    }
    if seconds > 0 || parts.is_empty() {
        parts.push(unit(seconds, "second"));
    }
    parts.join(" ")
}

fn unit(value: i64, name: &str) -> String {
    if value == 1 {
        format!("{value} {name}")
    } else {
        format!("{value} {name}s")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn progress_with_total(total: usize) -> DeploymentProgress {
        let mut p = DeploymentProgress::new();
        p.total_tasks = total;
        p
    }

    #[test]
    fn percentage_is_zero_without_tasks() {
        assert_eq!(percentage(0, 0), 0.0);
        assert_eq!(percentage(3, 0), 0.0);
    }

    #[test]
    fn bar_style_marks_transition_cell() {
        let p = progress_with_total(3);
        let line = p.render(1, "install", ProgressStyle::Bar, HighlightColor::None);
        // 33.3% of 30 cells -> 9 filled, then the marker.
        let expected_bar = format!("[{}>{}]", "=".repeat(9), " ".repeat(20));
        assert_eq!(line, format!("{expected_bar} 33.3% (2/3) Current: install"));
    }

    #[test]
    fn first_task_renders_marker_only() {
        let p = progress_with_total(4);
        let line = p.render(0, "prep", ProgressStyle::Bar, HighlightColor::None);
        assert!(line.starts_with(&format!("[>{}]", " ".repeat(29))));
        assert!(line.contains("0.0% (1/4)"));
    }

    #[test]
    fn full_bar_has_no_marker() {
        assert_eq!(render_bar(BAR_WIDTH), format!("[{}]", "=".repeat(30)));
    }

    #[test]
    fn percentage_and_plain_styles() {
        let p = progress_with_total(8);
        assert_eq!(
            p.render(2, "push-config", ProgressStyle::Percentage, HighlightColor::None),
            "Deployment progress: 25.0% (3/8) - Running task: push-config"
        );
        assert_eq!(
            p.render(2, "push-config", ProgressStyle::Plain, HighlightColor::None),
            "Running task push-config (3/8)"
        );
    }

    #[test]
    fn duration_formatting_omits_zero_units() {
        assert_eq!(format_duration(TimeDelta::zero()), "0 seconds");
        assert_eq!(format_duration(TimeDelta::seconds(1)), "1 second");
        assert_eq!(format_duration(TimeDelta::seconds(125)), "2 minutes 5 seconds");
        assert_eq!(format_duration(TimeDelta::seconds(3600)), "1 hour");
        assert_eq!(format_duration(TimeDelta::seconds(3605)), "1 hour 5 seconds");
        assert_eq!(format_duration(TimeDelta::seconds(-4)), "0 seconds");
    }

    #[test]
    fn completion_includes_elapsed_time_once_finished() {
        let mut p = DeploymentProgress::new();
        assert_eq!(p.render_completion(HighlightColor::None).len(), 1);

        p.end_time = Some(p.start_time + TimeDelta::seconds(61));
        let lines = p.render_completion(HighlightColor::None);
        assert_eq!(lines[0], "Deployment completed successfully!");
        assert_eq!(lines[1], "Total deployment time: 1 minute 1 second");
    }
}
