use std::time::Duration;

use console::{Style, style};
use indicatif::{ProgressBar, ProgressStyle};

use crate::recovery::{ErrorRecord, RecoveryResult, RecoveryStats, StrategyInfo};

pub struct Display;

impl Display {
    pub fn new() -> Self {
        Self
    }

    pub fn print_header(&self, text: &str) {
        println!();
        println!("{}", style(text).bold().cyan());
        println!("{}", style("═".repeat(60)).dim());
        println!();
    }

    pub fn print_record(&self, record: &ErrorRecord) {
        println!("{}  {}", style(&record.id).bold(), style(&record.message).white());
        println!("    Category: {}", style(record.category).cyan());
        println!("    Severity: {}", record.severity);
        if let Some(code) = record.status_code {
            println!("    Status:   {}", code);
        }
        if let Some(ms) = record.retry_after_ms {
            println!("    Retry after: {}ms", ms);
        }
    }

    pub fn print_strategies(&self, strategies: &[StrategyInfo]) {
        if strategies.is_empty() {
            println!("{}", style("No strategies registered.").dim());
            return;
        }

        println!(
            "{:<28} {:>8} {:>9} {:>10}",
            style("Strategy").bold(),
            style("Priority").bold(),
            style("Attempts").bold(),
            style("Cooldown").bold()
        );
        println!("{}", style("─".repeat(58)).dim());
        for info in strategies {
            let name = if info.can_recover {
                style(info.name.as_str())
            } else {
                style(info.name.as_str()).dim().strikethrough()
            };
            let cooldown = info
                .cooldown_ms
                .map(|ms| format!("{}ms", ms))
                .unwrap_or_else(|| "-".to_string());
            println!(
                "{:<28} {:>8} {:>9} {:>10}",
                name, info.priority, info.max_attempts, cooldown
            );
        }
        println!();
    }

    pub fn print_result(&self, index: usize, result: &RecoveryResult) {
        let (marker, marker_style) = self.result_marker(result);
        let mut flags = Vec::new();
        if result.should_retry {
            flags.push("retry");
        }
        if result.escalate {
            flags.push("escalate");
        }
        let flags = if flags.is_empty() {
            String::new()
        } else {
            format!(" [{}]", flags.join(", "))
        };

        println!(
            "  #{:<3} {} {}{}",
            index,
            marker_style.apply_to(marker),
            result.message,
            style(flags).dim()
        );
    }

    pub fn print_stats(&self, stats: &RecoveryStats) {
        println!();
        println!("{}", style("Statistics:").bold());
        println!(
            "  Attempts: {}  Succeeded: {}  Escalated: {}",
            stats.total_attempts,
            style(stats.successful_attempts).green(),
            style(stats.escalated_attempts).yellow()
        );
        println!(
            "  Success rate: {:.0}%  Average time: {:.0}ms",
            stats.success_rate * 100.0,
            stats.average_recovery_time_ms
        );

        for (category, by_category) in &stats.by_category {
            println!(
                "    {:<20} {}/{} ({:.0}%)",
                category,
                by_category.successes,
                by_category.attempts,
                by_category.success_rate * 100.0
            );
        }
    }

    pub fn print_success(&self, message: &str) {
        println!("{} {}", style("✓").green().bold(), message);
    }

    pub fn print_error(&self, message: &str) {
        eprintln!("{} {}", style("✗").red().bold(), message);
    }

    pub fn print_warning(&self, message: &str) {
        println!("{} {}", style("!").yellow().bold(), message);
    }

    pub fn print_info(&self, message: &str) {
        println!("{} {}", style("→").cyan(), message);
    }

    pub fn create_spinner(&self, message: &str) -> ProgressBar {
        let pb = ProgressBar::new_spinner();
        let spinner_style = ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏");
        pb.set_style(spinner_style);
        pb.set_message(message.to_string());
        pb.enable_steady_tick(Duration::from_millis(80));
        pb
    }

    fn result_marker(&self, result: &RecoveryResult) -> (&'static str, Style) {
        if result.success {
            ("recovered", Style::new().green().bold())
        } else if result.is_gated() {
            ("rejected", Style::new().dim())
        } else if result.escalate {
            ("escalated", Style::new().red().bold())
        } else {
            ("failed", Style::new().yellow())
        }
    }
}

impl Default for Display {
    fn default() -> Self {
        Self::new()
    }
}
