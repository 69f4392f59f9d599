//! Plain-text rendering of the dashboard for the terminal.
//!
//! Each panel is its own function returning a `String` so that commands can print a whole
//! dashboard or just the part they need.

use crate::aggregate::Overview;
use crate::model::{AiAnalysis, Amount, CategorySummary, Expense, PaymentSummary, TimeSeriesPoint};
use crate::state::Snapshot;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

pub const TITLE: &str = "SheetInsights";
pub const ERROR_TITLE: &str = "Auth/Connection Error";
pub const NO_DATA: &str = "No data";
pub const NO_ANALYSIS: &str = "Sync data to unlock AI tips.";
pub const ANALYST_TITLE: &str = "Gemini AI Analyst";

/// Recommendations shown by the compact AI panel.
const COMPACT_RECOMMENDATIONS: usize = 2;
const BAR_WIDTH: usize = 24;
const BAR: char = '#';

/// The whole dashboard: error banner, stats cards, charts, recent transactions and the compact AI
/// panel.
pub fn dashboard(snapshot: &Snapshot) -> String {
    let overview = snapshot.overview();
    let mut sections = Vec::new();
    let mut title = TITLE.to_string();
    if let Some(at) = snapshot.refreshed_at() {
        title.push_str(&format!(" (synced {})", at.format("%Y-%m-%d %H:%M:%S UTC")));
    }
    sections.push(title);
    if let Some(message) = snapshot.error() {
        sections.push(error_banner(message));
    }
    sections.push(stats_cards(overview));
    sections.push(spending_history(&overview.history));
    sections.push(category_chart(&overview.categories));
    sections.push(payment_chart(&overview.payments, overview.total_spending));
    sections.push(recent_table(&overview.recent));
    sections.push(analysis_panel(snapshot.analysis(), true));
    sections.join("\n\n")
}

pub fn error_banner(message: &str) -> String {
    format!("!! {ERROR_TITLE}\n!! {message}")
}

pub fn stats_cards(overview: &Overview) -> String {
    let cards = [
        ("Total Spending", overview.total_spending.to_string()),
        ("Primary Payment", overview.primary_payment.clone()),
        ("Daily Average", overview.daily_average.to_string()),
        ("Total Categories", overview.category_count.to_string()),
    ];
    let width = cards.iter().map(|(l, _)| l.len()).max().unwrap_or(0);
    cards
        .iter()
        .map(|(label, value)| format!("{label:<width$}  {value}"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// One bar per date, labelled with the compact amount used on the chart axis.
pub fn spending_history(points: &[TimeSeriesPoint]) -> String {
    let rows: Vec<(String, String, Amount)> = points
        .iter()
        .map(|p| (p.date.clone(), p.amount.compact(), p.amount))
        .collect();
    chart("Spending History", &rows)
}

pub fn category_chart(categories: &[CategorySummary]) -> String {
    let rows: Vec<(String, String, Amount)> = categories
        .iter()
        .map(|c| (c.category.clone(), c.total.to_string(), c.total))
        .collect();
    chart("By Category", &rows)
}

/// Payment methods with their share of `total`.
pub fn payment_chart(payments: &[PaymentSummary], total: Amount) -> String {
    let rows: Vec<(String, String, Amount)> = payments
        .iter()
        .map(|p| {
            let label = format!("{} ({})", p.value, percent(p.value, total));
            (p.name.clone(), label, p.value)
        })
        .collect();
    chart("Payment Methods", &rows)
}

/// The rows given, as a Date / Category / Amount table. Pass `Overview::recent` for newest first.
pub fn recent_table(recent: &[Expense]) -> String {
    let heading = "Recent Transactions";
    if recent.is_empty() {
        return format!("{heading}\n{NO_DATA}");
    }
    let rows: Vec<[String; 3]> = recent
        .iter()
        .map(|e| {
            [
                e.date().to_string(),
                e.category().to_string(),
                e.amount().to_string(),
            ]
        })
        .collect();
    let header = ["Date", "Category", "Amount"];
    let widths: Vec<usize> = (0..3)
        .map(|i| {
            rows.iter()
                .map(|r| r[i].chars().count())
                .chain([header[i].len()])
                .max()
                .unwrap_or(0)
        })
        .collect();
    let line = |cells: [&str; 3]| {
        format!(
            "{:<w0$}  {:<w1$}  {:>w2$}",
            cells[0],
            cells[1],
            cells[2],
            w0 = widths[0],
            w1 = widths[1],
            w2 = widths[2]
        )
    };
    let mut lines = vec![heading.to_string(), line(header)];
    lines.extend(
        rows.iter()
            .map(|r| line([r[0].as_str(), r[1].as_str(), r[2].as_str()])),
    );
    lines.join("\n")
}

/// The AI panel. The compact variant shows the summary and the first two recommendations only.
pub fn analysis_panel(analysis: Option<&AiAnalysis>, compact: bool) -> String {
    let Some(analysis) = analysis else {
        return format!("{ANALYST_TITLE}\n{NO_ANALYSIS}");
    };
    let mut lines = vec![ANALYST_TITLE.to_string(), analysis.summary.clone()];
    let recommendations = if compact {
        &analysis.recommendations[..analysis.recommendations.len().min(COMPACT_RECOMMENDATIONS)]
    } else {
        &analysis.recommendations[..]
    };
    if !recommendations.is_empty() {
        lines.push(String::new());
        lines.push("Recommendations:".to_string());
        lines.extend(recommendations.iter().map(|r| format!("- {r}")));
    }
    if !compact && !analysis.anomalies.is_empty() {
        lines.push(String::new());
        lines.push("Anomalies:".to_string());
        lines.extend(analysis.anomalies.iter().map(|a| format!("- {a}")));
    }
    lines.join("\n")
}

/// A horizontal bar chart: label, bar scaled to the largest amount, value text.
fn chart(heading: &str, rows: &[(String, String, Amount)]) -> String {
    if rows.is_empty() {
        return format!("{heading}\n{NO_DATA}");
    }
    let label_width = rows
        .iter()
        .map(|(l, _, _)| l.chars().count())
        .max()
        .unwrap_or(0);
    let max = rows
        .iter()
        .map(|(_, _, a)| *a)
        .max()
        .unwrap_or_default();
    let bar_width = BAR_WIDTH;
    let mut lines = vec![heading.to_string()];
    for (label, text, amount) in rows {
        let bar = bar(*amount, max);
        lines.push(format!("{label:<label_width$}  {bar:<bar_width$}  {text}"));
    }
    lines.join("\n")
}

fn bar(amount: Amount, max: Amount) -> String {
    if max.is_zero() {
        return String::new();
    }
    let len = (amount.value() / max.value() * Decimal::from(BAR_WIDTH))
        .round()
        .to_usize()
        .unwrap_or(0)
        .min(BAR_WIDTH);
    std::iter::repeat(BAR).take(len).collect()
}

fn percent(part: Amount, total: Amount) -> String {
    if total.is_zero() {
        return "0.0%".to_string();
    }
    let pct = (part.value() / total.value() * Decimal::ONE_HUNDRED)
        .to_f64()
        .unwrap_or_default();
    format!("{pct:.1}%")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn expense(date: &str, amount: i64, category: &str, payment: &str) -> Expense {
        Expense::new("0", date, Amount::new(Decimal::from(amount)), category, payment)
    }

    fn sample() -> Vec<Expense> {
        vec![
            expense("2024-01-01", 100_000, "Makanan", "QRIS"),
            expense("2024-01-02", 300_000, "Tagihan", "Transfer"),
        ]
    }

    #[test]
    fn test_stats_cards() {
        let text = stats_cards(&Overview::new(&sample()));
        assert_eq!(
            text,
            "Total Spending    Rp 400,000\n\
             Primary Payment   Transfer\n\
             Daily Average     Rp 200,000\n\
             Total Categories  2"
        );
    }

    #[test]
    fn test_stats_cards_empty() {
        let text = stats_cards(&Overview::new(&[]));
        assert!(text.contains("Primary Payment   N/A"));
        assert!(text.contains("Daily Average     Rp 0"));
    }

    #[test]
    fn test_history_uses_compact_amounts() {
        let overview = Overview::new(&sample());
        let text = spending_history(&overview.history);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "Spending History");
        assert!(lines[1].starts_with("2024-01-01  ########  "));
        assert!(lines[1].ends_with("Rp100.0k"));
        assert!(lines[2].contains(&"#".repeat(BAR_WIDTH)));
        assert!(lines[2].ends_with("Rp300.0k"));
    }

    #[test]
    fn test_payment_chart_percentages() {
        let overview = Overview::new(&sample());
        let text = payment_chart(&overview.payments, overview.total_spending);
        assert!(text.contains("Rp 100,000 (25.0%)"));
        assert!(text.contains("Rp 300,000 (75.0%)"));
    }

    #[test]
    fn test_charts_empty() {
        assert_eq!(category_chart(&[]), "By Category\nNo data");
        assert_eq!(spending_history(&[]), "Spending History\nNo data");
    }

    #[test]
    fn test_recent_table() {
        let overview = Overview::new(&sample());
        let text = recent_table(&overview.recent);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "Recent Transactions");
        assert_eq!(lines[1], "Date        Category      Amount");
        assert_eq!(lines[2], "2024-01-02  Tagihan   Rp 300,000");
        assert_eq!(lines[3], "2024-01-01  Makanan   Rp 100,000");
    }

    #[test]
    fn test_recent_table_empty() {
        assert_eq!(recent_table(&[]), "Recent Transactions\nNo data");
    }

    #[test]
    fn test_analysis_panel() {
        assert_eq!(
            analysis_panel(None, true),
            "Gemini AI Analyst\nSync data to unlock AI tips."
        );

        let analysis = AiAnalysis {
            summary: "Bills dominate.".into(),
            recommendations: vec!["a".into(), "b".into(), "c".into()],
            anomalies: vec!["x".into()],
        };
        let compact = analysis_panel(Some(&analysis), true);
        assert!(compact.contains("- a\n- b"));
        assert!(!compact.contains("- c"));
        assert!(!compact.contains("Anomalies"));

        let full = analysis_panel(Some(&analysis), false);
        assert!(full.contains("- c"));
        assert!(full.ends_with("Anomalies:\n- x"));
    }

    #[test]
    fn test_bar_and_percent_at_largest_amount() {
        let max = Amount::new(Decimal::MAX);
        assert_eq!(bar(max, max), "#".repeat(BAR_WIDTH));
        assert_eq!(percent(max, max), "100.0%");
        assert_eq!(percent(Amount::new(Decimal::MAX / Decimal::TWO), max), "50.0%");
    }

    #[test]
    fn test_dashboard_with_error() {
        let snapshot = Snapshot::default();
        assert!(!dashboard(&snapshot).contains(ERROR_TITLE));
        assert!(dashboard(&snapshot).contains(NO_DATA));
        assert_eq!(error_banner("invalid_grant"), "!! Auth/Connection Error\n!! invalid_grant");
    }
}
