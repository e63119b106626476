//! Terminal output utilities
//!
//! Status lines plus the text rendering of a nutrient breakdown: one row per
//! nutrient with its grams, share and a horizontal bar.

use nutrivision_client::IntakeBreakdown;
use owo_colors::OwoColorize;
use std::fmt::Write as _;

/// Width of a full (100%) nutrient bar in cells
pub const BAR_WIDTH: usize = 30;

/// Status message helpers
pub struct Status;

impl Status {
    /// Print a success message
    pub fn success(message: &str) {
        println!("{} {}", "✓".green(), message);
    }

    /// Print an error message
    pub fn error(message: &str) {
        eprintln!("{} {}", "✗".red(), message);
    }

    /// Print a warning message
    pub fn warning(message: &str) {
        eprintln!("{} {}", "⚠".yellow(), message);
    }

    /// Print an info message
    pub fn info(message: &str) {
        println!("{} {}", "ℹ".blue(), message);
    }

    /// Print a header
    pub fn header(message: &str) {
        println!();
        println!("{}", message.bold());
        println!("{}", "─".repeat(message.chars().count()));
    }
}

/// Format a gram amount, switching to milligrams below one gram
pub fn format_grams(grams: f64) -> String {
    if grams > 0.0 && grams < 1.0 {
        format!("{:.0} mg", grams * 1000.0)
    } else {
        format!("{grams:.1} g")
    }
}

/// Format a share as a whole percentage
pub fn format_percent(percent: f64) -> String {
    format!("{percent:.0}%")
}

/// A bar of `width` cells filled in proportion to `percent`
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
pub fn nutrient_bar(percent: f64, width: usize) -> String {
    let filled = ((percent.clamp(0.0, 100.0) / 100.0) * width as f64).round() as usize;
    format!("{}{}", "█".repeat(filled), "░".repeat(width - filled))
}

/// Plain-text table of a breakdown, one nutrient per row, then the total
pub fn render_breakdown(breakdown: &IntakeBreakdown) -> String {
    let name_width = breakdown
        .shares
        .iter()
        .map(|s| s.name.len())
        .max()
        .unwrap_or(0)
        .max("total".len());

    let mut out = String::new();
    for share in &breakdown.shares {
        let _ = writeln!(
            out,
            "{:<name_width$}  {:>9}  {:>4}  {}",
            share.name,
            format_grams(share.grams),
            format_percent(share.percent),
            nutrient_bar(share.percent, BAR_WIDTH),
        );
    }
    let _ = writeln!(
        out,
        "{:<name_width$}  {:>9}",
        "total",
        format_grams(breakdown.total_grams)
    );
    out
}

/// Format a duration for display
pub fn format_duration(duration: std::time::Duration) -> String {
    let secs = duration.as_secs_f32();
    if secs < 1.0 {
        format!("{:.0}ms", secs * 1000.0)
    } else if secs < 60.0 {
        format!("{secs:.1}s")
    } else {
        let mins = (secs / 60.0).floor();
        let remaining_secs = secs % 60.0;
        format!("{mins}m {remaining_secs:.0}s")
    }
}

/// Format a file size for display
#[allow(clippy::cast_precision_loss)]
pub fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;

    if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{bytes} B")
    }
}

/// Format a count with singular/plural
pub fn format_count(count: usize, singular: &str, plural: &str) -> String {
    if count == 1 {
        format!("{count} {singular}")
    } else {
        format!("{count} {plural}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nutrivision_client::NutrientTotals;
    use std::time::Duration;

    #[test]
    fn test_format_grams() {
        assert_eq!(format_grams(12.0), "12.0 g");
        assert_eq!(format_grams(0.5), "500 mg");
        assert_eq!(format_grams(0.0), "0.0 g");
    }

    #[test]
    fn test_nutrient_bar() {
        assert_eq!(nutrient_bar(50.0, 10), "█████░░░░░");
        assert_eq!(nutrient_bar(0.0, 4), "░░░░");
        assert_eq!(nutrient_bar(140.0, 4), "████");
    }

    #[test]
    fn test_render_breakdown() {
        let breakdown = NutrientTotals {
            carbs: 30.0,
            protein: 9.5,
            sodium: 0.5,
        }
        .breakdown();

        let table = render_breakdown(&breakdown);
        let lines: Vec<_> = table.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("carbs"));
        assert!(lines[0].contains("30.0 g"));
        assert!(lines[0].contains("75%"));
        assert!(lines[2].contains("500 mg"));
        assert!(lines[3].starts_with("total"));
        assert!(lines[3].contains("40.0 g"));
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::from_millis(500)), "500ms");
        assert_eq!(format_duration(Duration::from_secs_f32(5.5)), "5.5s");
        assert_eq!(format_duration(Duration::from_secs(125)), "2m 5s");
    }

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(500), "500 B");
        assert_eq!(format_size(2048), "2.00 KB");
        assert_eq!(format_size(5 * 1024 * 1024), "5.00 MB");
    }

    #[test]
    fn test_format_count() {
        assert_eq!(format_count(1, "image", "images"), "1 image");
        assert_eq!(format_count(3, "image", "images"), "3 images");
    }
}
