//! Turns the view model into terminal lines.

use watcher_core::{AppViewModel, DiagnosticsOutcome, PricingQuote, RecordRowView};

const BAR_WIDTH: usize = 20;

/// Progress bar and label of the running collection, if any.
pub fn collection_progress(view: &AppViewModel) -> Option<String> {
    let progress = view.collection_progress?;
    let label = view.collection_label.as_deref().unwrap_or_default();
    let filled = if progress.total_steps == 0 {
        0
    } else {
        progress.completed_steps.min(progress.total_steps) * BAR_WIDTH / progress.total_steps
    };
    Some(format!(
        "[{}{}] {}",
        "#".repeat(filled),
        "-".repeat(BAR_WIDTH - filled),
        label
    ))
}

pub fn collection_report(view: &AppViewModel) -> Vec<String> {
    let Some(summary) = &view.last_collection else {
        return view.notice.iter().cloned().collect();
    };
    let mut lines = summary.lines.clone();
    lines.push(format!(
        "Total: fixed links {}, new items {}",
        format_with_commas(summary.total_fixed_links),
        format_with_commas(summary.total_new_items)
    ));
    lines.push(summary.headline().to_string());
    lines
}

pub fn diagnostics_report(view: &AppViewModel) -> Vec<String> {
    if let Some(label) = &view.diagnostics_label {
        return vec![label.clone()];
    }
    let Some(outcome) = &view.last_diagnostics else {
        return Vec::new();
    };
    let report = match outcome {
        DiagnosticsOutcome::Failed { message } => {
            return vec![format!("Diagnostics failed: {message}")];
        }
        DiagnosticsOutcome::Cancelled => return vec!["Diagnostics cancelled.".to_string()],
        DiagnosticsOutcome::Completed { report } => report,
    };
    if report.is_empty() {
        return vec!["Diagnostics finished; no providers reported.".to_string()];
    }

    let mut lines = vec!["Group | Source | Items | Time (s) | Error | Hint".to_string()];
    lines.extend(report.rows.iter().map(|row| {
        format!(
            "{} | {} | {} | {:.2} | {} | {}",
            row.group,
            row.source,
            row.item_count,
            row.elapsed_seconds,
            row.error.as_deref().unwrap_or("-"),
            row.hint.as_deref().unwrap_or("-")
        )
    }));
    let logs = report.log_lines();
    if !logs.is_empty() {
        lines.push(String::new());
        lines.push("Logs:".to_string());
        lines.extend(logs);
    }
    lines
}

pub fn record_lines(view: &AppViewModel) -> Vec<String> {
    let mut lines: Vec<String> = view.records.iter().map(format_record_row).collect();
    if let Some(error) = &view.filter_error {
        lines.push(format!("Filter not applied: {error}"));
    }
    lines.push(format!(
        "Showing {} of {} items",
        view.visibility.visible, view.visibility.total
    ));
    lines
}

fn format_record_row(row: &RecordRowView) -> String {
    let deadline = row
        .deadline
        .map(|d| d.to_string())
        .unwrap_or_else(|| "----------".to_string());
    let amount = row.amount.map(format_brl).unwrap_or_else(|| "-".to_string());
    let mut line = format!(
        "{deadline}  {amount:>18}  [{}/{}] {}",
        row.group, row.source, row.title
    );
    if let Some(status) = &row.status {
        line.push_str(&format!(" ({status})"));
    }
    if let Some(link) = &row.link {
        line.push_str(&format!(" {link}"));
    }
    line
}

pub fn quote_lines(view: &AppViewModel) -> Vec<String> {
    let Some(quote) = &view.quote else {
        return Vec::new();
    };
    let mut lines = vec![format_quote(quote)];
    if view.link_tokens > 0 {
        lines.push(format!(
            "Includes {} token(s) from the linked page",
            format_with_commas(view.link_tokens)
        ));
    }
    lines.push(format!("Exchange rate: 1 USD = {:.4} BRL", view.usd_brl));
    lines
}

fn format_quote(quote: &PricingQuote) -> String {
    format!(
        "Input tokens ~{} | US$ {:.6} | R$ {:.6}",
        format_with_commas(quote.tokens_in),
        quote.cost_usd,
        quote.cost_brl
    )
}

pub fn search_lines(view: &AppViewModel) -> Vec<String> {
    let Some(result) = &view.search else {
        return Vec::new();
    };
    let mut lines = Vec::new();
    if let Some(error) = &result.error {
        lines.push(format!("Search reported an error: {error}"));
    }
    if let Some(summary) = &result.summary {
        lines.push(summary.clone());
    }
    if !result.links.is_empty() {
        lines.push("Links:".to_string());
        lines.extend(result.links.iter().map(|link| format!("  {link}")));
    }
    if !result.remote.is_empty() {
        lines.push("Cost reported by the service:".to_string());
    }
    lines.extend(quote_lines(view).into_iter().take(1));
    lines
}

/// `1234567.5` -> `R$ 1,234,567.50`
fn format_brl(amount: f64) -> String {
    let cents = (amount * 100.0).round() as u64;
    format!("R$ {}.{:02}", format_with_commas(cents / 100), cents % 100)
}

fn format_with_commas(value: u64) -> String {
    let mut out = String::new();
    for (i, ch) in value.to_string().chars().rev().enumerate() {
        if i != 0 && i % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out.chars().rev().collect()
}
