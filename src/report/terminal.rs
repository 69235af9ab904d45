use std::collections::HashMap;

use anyhow::Result;
use colored::*;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use crate::models::{Disposition, ExcludedEntry, IncludedProduct, UnmappedEntry};

use super::FileReport;

/// Render a colored terminal report for every analysed file.
pub fn render(reports: &[FileReport], verbose: bool, quiet: bool) -> Result<()> {
    if !quiet {
        println!(
            "\n {} v{}",
            "inventory-checkr".bold(),
            env!("CARGO_PKG_VERSION")
        );
    }

    for report in reports {
        render_file(report, verbose, quiet);
    }

    Ok(())
}

fn render_file(report: &FileReport, verbose: bool, quiet: bool) {
    let s = &report.summary;

    if quiet {
        println!(
            "{}  Input: {}  Products: {}  Excluded: {}  Unmapped: {}  Pending: {}",
            report.source.display(),
            s.total_input,
            s.total_output.to_string().green(),
            s.excluded_count.to_string().yellow(),
            s.unmapped_count.to_string().red(),
            s.pending_disposition_count,
        );
        return;
    }

    println!(" Inventory: {}\n", report.source.display());

    println!(" ┌────────────────────────────────────────────────────┐");
    println!(" │  {:<48} │", "SUMMARY".bold());
    println!(" │  {:<48} │", format!("Input rows         : {}", s.total_input));
    println!(
        " │  {:<48} │",
        format!("{}  Products        : {:>4}", "✓".green(), s.total_output)
    );
    println!(
        " │  {:<48} │",
        format!(
            "{}  Excluded        : {:>4}  {}",
            "−".yellow(),
            s.excluded_count,
            summarize_exclusions(&report.analysis.excluded)
        )
    );
    println!(
        " │  {:<48} │",
        format!("{}  Unmapped        : {:>4}", "?".red(), s.unmapped_count)
    );
    println!(
        " │  {:<48} │",
        format!("   Pending review  : {:>4}", s.pending_disposition_count)
    );
    println!(" └────────────────────────────────────────────────────┘\n");

    if !report.analysis.included.is_empty() {
        println!(" {} Canonical products:\n", "[CATALOG]".green().bold());
        render_included(&report.analysis.included, verbose);
        println!();
    }

    if !report.analysis.unmapped.is_empty() {
        println!(" {} Entries needing a mapping rule:\n", "[UNMAPPED]".red().bold());
        render_unmapped(&report.analysis.unmapped);
        println!();
    }

    if verbose && !report.analysis.excluded.is_empty() {
        println!(" {} Excluded entries:\n", "[EXCLUDED]".yellow().bold());
        render_excluded(&report.analysis.excluded);
        println!();
    }
}

fn header(labels: &[&str]) -> Vec<Cell> {
    labels
        .iter()
        .map(|l| Cell::new(l).add_attribute(Attribute::Bold))
        .collect()
}

fn render_included(products: &[IncludedProduct], verbose: bool) {
    let mut table = Table::new();
    let mut labels = vec!["Product", "Category", "Deployment", "Entries", "Devices", "Disposition", "Replacement"];
    if verbose {
        labels.push("Raw names");
    }
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header(&labels));

    for product in products {
        let agg = &product.aggregate;
        let disposition_color = match product.disposition {
            Disposition::Approved => Color::Green,
            Disposition::Pending => Color::Yellow,
            Disposition::Replace | Disposition::Retire => Color::Red,
            Disposition::Other(_) => Color::DarkGrey,
        };

        let mut row = vec![
            Cell::new(&agg.canonical_name),
            Cell::new(&agg.category),
            Cell::new(agg.deployment_type.to_string()),
            Cell::new(agg.original_count).set_alignment(CellAlignment::Right),
            Cell::new(agg.total_devices).set_alignment(CellAlignment::Right),
            Cell::new(product.disposition.to_string()).fg(disposition_color),
            Cell::new(product.replacement_name.as_deref().unwrap_or("")),
        ];
        if verbose {
            let names: Vec<&str> = agg.original_entries.iter().map(|e| e.name.as_str()).collect();
            row.push(Cell::new(names.join("\n")));
        }
        table.add_row(row);
    }

    println!("{}", table);
}

fn render_unmapped(entries: &[UnmappedEntry]) {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header(&["Name", "Publisher", "Devices"]));

    for entry in entries {
        table.add_row(vec![
            Cell::new(&entry.name),
            Cell::new(&entry.publisher),
            Cell::new(entry.device_count).set_alignment(CellAlignment::Right),
        ]);
    }

    println!("{}", table);
}

fn render_excluded(entries: &[ExcludedEntry]) {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header(&["Name", "Category", "Reason"]));

    for entry in entries {
        table.add_row(vec![
            Cell::new(&entry.name),
            Cell::new(&entry.reason).fg(Color::Yellow),
            Cell::new(&entry.rule_reason),
        ]);
    }

    println!("{}", table);
}

/// Top three exclusion categories, e.g. `[Windows Updates (12), Drivers (3)]`.
fn summarize_exclusions(entries: &[ExcludedEntry]) -> String {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for entry in entries {
        *counts.entry(entry.reason.as_str()).or_insert(0) += 1;
    }

    let mut pairs: Vec<(&str, usize)> = counts.into_iter().collect();
    pairs.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));

    let summary: Vec<String> = pairs
        .iter()
        .take(3)
        .map(|(category, cnt)| format!("{} ({})", category, cnt))
        .collect();

    if summary.is_empty() {
        String::new()
    } else {
        format!("[{}]", summary.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn excluded(reason: &str) -> ExcludedEntry {
        ExcludedEntry {
            name: "x".to_string(),
            reason: reason.to_string(),
            rule_reason: String::new(),
        }
    }

    #[test]
    fn test_summarize_exclusions_top_three() {
        let entries = vec![
            excluded("Drivers"),
            excluded("Windows Updates"),
            excluded("Windows Updates"),
            excluded("Runtimes"),
            excluded("Language Packs"),
            excluded("Runtimes"),
        ];
        assert_eq!(
            summarize_exclusions(&entries),
            "[Runtimes (2), Windows Updates (2), Drivers (1)]"
        );
        assert_eq!(summarize_exclusions(&[]), "");
    }
}
