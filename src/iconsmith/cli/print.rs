use chrono::{DateTime, Utc};
use colored::Colorize;
use iconsmith::api::{CmdMessage, MessageLevel, VariantOutcome, VariantStatus};
use iconsmith::error::IconError;
use iconsmith::model::Artifact;
use timeago::Formatter;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

const LINE_WIDTH: usize = 100;
const TIME_WIDTH: usize = 14;
const INDEX_WIDTH: usize = 4;
const RETRIED_MARKER: &str = "↻";

pub(super) fn print_messages(messages: &[CmdMessage]) {
    for message in messages {
        match message.level {
            MessageLevel::Info => println!("{}", message.content.dimmed()),
            MessageLevel::Success => println!("{}", message.content.green()),
            MessageLevel::Warning => println!("{}", message.content.yellow()),
            MessageLevel::Error => println!("{}", message.content.red()),
        }
    }
}

/// Invocation-level failures go to stderr, tagged with their kind.
pub(crate) fn print_error(err: &IconError) {
    eprintln!("{} {}", format!("Error [{}]:", err.kind()).red().bold(), err);
}

pub(super) fn print_outcomes(outcomes: &[VariantOutcome]) {
    for outcome in outcomes {
        let label = format!("v{}", outcome.variant_index);
        let retried = if outcome.retried {
            " (retried)".dimmed().to_string()
        } else {
            String::new()
        };
        match &outcome.status {
            VariantStatus::Accepted(artifact) => println!(
                "  {} {} {}{}",
                label.yellow(),
                "✓".green(),
                artifact.image_path.display(),
                retried
            ),
            VariantStatus::Failed {
                kind,
                message,
                violations,
            } => {
                println!(
                    "  {} {} {}{}",
                    label.yellow(),
                    "✗".red(),
                    format!("[{kind}]").red(),
                    retried
                );
                if violations.is_empty() {
                    println!("      {}", message);
                }
                for violation in violations {
                    println!("      - {}", violation);
                }
            }
        }
    }
}

pub(super) fn print_artifacts(artifacts: &[Artifact]) {
    if artifacts.is_empty() {
        println!("No icons found.");
        return;
    }

    for (i, artifact) in artifacts.iter().enumerate() {
        let line = ArtifactLine::new(i + 1, artifact);
        println!(
            "{}{}{}{}{}",
            line.index.yellow(),
            line.body,
            " ".repeat(line.padding),
            line.marker.cyan(),
            line.time.dimmed()
        );
    }
}

/// One listing row, split so colors can be applied per column.
struct ArtifactLine {
    index: String,
    body: String,
    padding: usize,
    marker: String,
    time: String,
}

impl ArtifactLine {
    fn new(position: usize, artifact: &Artifact) -> Self {
        let index = format!("{:>width$}. ", position, width = INDEX_WIDTH - 2);
        let marker = if artifact.metadata.retried {
            format!("{RETRIED_MARKER} ")
        } else {
            "  ".to_string()
        };
        let time = format_time_ago(artifact.metadata.created_at);

        let available = LINE_WIDTH
            .saturating_sub(index.width())
            .saturating_sub(marker.width())
            .saturating_sub(TIME_WIDTH);
        let full = format!(
            "{}  {}",
            artifact.base_name, artifact.metadata.description
        );
        let body = if full.width() > available {
            truncate_to_width(&full, available)
        } else {
            full
        };
        let padding = available.saturating_sub(body.width());

        Self {
            index,
            body,
            padding,
            marker,
            time,
        }
    }

    #[cfg(test)]
    fn plain(&self) -> String {
        format!(
            "{}{}{}{}{}",
            self.index,
            self.body,
            " ".repeat(self.padding),
            self.marker,
            self.time
        )
    }
}

fn truncate_to_width(s: &str, max_width: usize) -> String {
    let mut result = String::new();
    let mut current_width = 0;
    let limit = max_width.saturating_sub(1);

    for c in s.chars() {
        let char_width = c.width().unwrap_or(0);
        if current_width + char_width > limit {
            result.push('…');
            return result;
        }
        result.push(c);
        current_width += char_width;
    }

    result
}

fn format_time_ago(timestamp: DateTime<Utc>) -> String {
    let duration = Utc::now().signed_duration_since(timestamp);
    let time_str = Formatter::new().convert(duration.to_std().unwrap_or_default());
    format!("{:>width$}", time_str, width = TIME_WIDTH)
}
