//! Human-readable console output for interpretation and validation runs.

use comfy_table::modifiers::{UTF8_ROUND_CORNERS, UTF8_SOLID_INNER_BORDERS};
use comfy_table::presets::{UTF8_FULL, UTF8_FULL_CONDENSED};
use comfy_table::{
    Attribute, Cell, CellAlignment, Color, ColumnConstraint, ContentArrangement, Table, Width,
};

use dbo_model::{Conflict, ConflictSeverity};
use dbo_validate::{ValidationStatus, WorkbookReport};

use crate::commands::InterpretOutput;

pub fn print_interpretation(output: &InterpretOutput) {
    let outcome = &output.outcome;
    println!(
        "Extracted {} rule records from {} raw rows.",
        output.extraction.records.len(),
        output.extraction.total_raw_rows
    );
    if output.extraction.reported_rows > output.extraction.total_raw_rows {
        println!(
            "Note: source metadata reports {} rows; {} held content.",
            output.extraction.reported_rows, output.extraction.total_raw_rows
        );
    }

    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Rule"),
        header_cell("Sheet"),
        header_cell("Field"),
        header_cell("Type"),
        header_cell("Confidence"),
        header_cell("Summary"),
    ]);
    rule_table_style(&mut table);
    align_column(&mut table, 4, CellAlignment::Right);
    for descriptor in &outcome.descriptors {
        table.add_row(vec![
            Cell::new(&descriptor.rule_id)
                .fg(Color::Blue)
                .add_attribute(Attribute::Bold),
            Cell::new(&descriptor.provenance.sheet_name),
            Cell::new(&descriptor.field_name),
            Cell::new(descriptor.rule_type.to_string()),
            confidence_cell(descriptor.confidence_score),
            Cell::new(&descriptor.interpretation_summary),
        ]);
    }
    println!("{table}");
    println!("{}", outcome.summary);
    print_conflicts(&outcome.conflicts);
}

pub fn print_validation(report: &WorkbookReport) {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Sheet"),
        header_cell("Rows"),
        header_cell("Valid"),
        header_cell("Error rows"),
        header_cell("Findings"),
        header_cell("Rules"),
    ]);
    sheet_table_style(&mut table);
    for idx in 1..=5 {
        align_column(&mut table, idx, CellAlignment::Right);
    }
    for sheet in &report.sheets {
        table.add_row(vec![
            Cell::new(&sheet.display_name)
                .fg(Color::Blue)
                .add_attribute(Attribute::Bold),
            Cell::new(sheet.total_rows),
            Cell::new(sheet.valid_rows),
            count_cell(sheet.error_rows, Color::Red),
            count_cell(sheet.total_errors, Color::Red),
            Cell::new(sheet.rules_applied),
        ]);
    }
    let summary = &report.summary;
    table.add_row(vec![
        Cell::new("TOTAL")
            .fg(Color::Cyan)
            .add_attribute(Attribute::Bold),
        Cell::new(summary.total_rows).add_attribute(Attribute::Bold),
        Cell::new(summary.valid_rows).add_attribute(Attribute::Bold),
        count_cell(summary.error_rows, Color::Red).add_attribute(Attribute::Bold),
        count_cell(summary.total_errors, Color::Red).add_attribute(Attribute::Bold),
        Cell::new(summary.rules_applied).add_attribute(Attribute::Bold),
    ]);
    println!("{table}");

    print_groups(report);

    if !report.matching.unmatched_rule_sheets.is_empty() {
        eprintln!(
            "Warning: rules reference sheets absent from the dataset: {}",
            report.matching.unmatched_rule_sheets.join(", ")
        );
    }
    if !report.matching.unmatched_fields.is_empty() {
        eprintln!(
            "Warning: rule fields matched no column: {}",
            report.matching.unmatched_fields.join(", ")
        );
    }

    match report.status {
        ValidationStatus::Pass => println!("Result: PASS"),
        ValidationStatus::Fail => println!(
            "Result: FAIL ({} findings in {} groups)",
            summary.total_errors,
            report.groups.len()
        ),
    }
}

fn print_groups(report: &WorkbookReport) {
    if report.groups.is_empty() {
        return;
    }
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Sheet"),
        header_cell("Column"),
        header_cell("Rule"),
        header_cell("Count"),
        header_cell("Rows"),
        header_cell("Samples"),
        header_cell("Message"),
    ]);
    group_table_style(&mut table);
    align_column(&mut table, 3, CellAlignment::Right);
    for group in &report.groups {
        table.add_row(vec![
            Cell::new(&group.sheet),
            Cell::new(&group.column),
            Cell::new(&group.rule_id).fg(Color::Blue),
            count_cell(group.count, Color::Red),
            Cell::new(row_list(&group.affected_rows)),
            Cell::new(sample_list(&group.sample_values)),
            Cell::new(&group.message),
        ]);
    }
    println!();
    println!("Findings:");
    println!("{table}");
}

fn print_conflicts(conflicts: &[Conflict]) {
    if conflicts.is_empty() {
        return;
    }
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Rule"),
        header_cell("Severity"),
        header_cell("Reference"),
        header_cell("Description"),
        header_cell("Recommendation"),
    ]);
    group_table_style(&mut table);
    align_column(&mut table, 1, CellAlignment::Center);
    for conflict in conflicts {
        table.add_row(vec![
            Cell::new(&conflict.rule_id).fg(Color::Blue),
            severity_cell(conflict.severity),
            match &conflict.reference {
                Some(reference) => Cell::new(reference),
                None => dim_cell("-"),
            },
            Cell::new(&conflict.description),
            Cell::new(&conflict.recommendation),
        ]);
    }
    println!();
    println!("Conflicts:");
    println!("{table}");
}

fn row_list(rows: &[usize]) -> String {
    const SHOWN: usize = 8;
    let mut list = rows
        .iter()
        .take(SHOWN)
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ");
    if rows.len() > SHOWN {
        list.push_str(&format!(", … ({} total)", rows.len()));
    }
    list
}

fn sample_list(samples: &[Option<String>]) -> String {
    if samples.is_empty() {
        return "-".to_string();
    }
    samples
        .iter()
        .map(|sample| match sample {
            Some(value) => format!("\"{value}\""),
            None => "(blank)".to_string(),
        })
        .collect::<Vec<_>>()
        .join(", ")
}

fn severity_cell(severity: ConflictSeverity) -> Cell {
    match severity {
        ConflictSeverity::High => Cell::new("HIGH")
            .fg(Color::Red)
            .add_attribute(Attribute::Bold),
        ConflictSeverity::Medium => Cell::new("MEDIUM").fg(Color::Yellow),
        ConflictSeverity::Low => Cell::new("LOW").fg(Color::DarkGrey),
    }
}

fn confidence_cell(score: f64) -> Cell {
    let text = format!("{score:.2}");
    if score >= 0.95 {
        Cell::new(text).fg(Color::Green)
    } else if score >= 0.80 {
        Cell::new(text).fg(Color::Yellow)
    } else {
        Cell::new(text).fg(Color::Red).add_attribute(Attribute::Bold)
    }
}

fn count_cell(count: usize, color: Color) -> Cell {
    if count > 0 {
        Cell::new(count).fg(color)
    } else {
        dim_cell(count)
    }
}

fn rule_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(140);
}

fn sheet_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .apply_modifier(UTF8_SOLID_INNER_BORDERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
}

fn group_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::DynamicFullWidth)
        .set_width(180);
    if table.column_count() >= 7 {
        table.set_constraints(vec![
            ColumnConstraint::UpperBoundary(Width::Fixed(16)),
            ColumnConstraint::UpperBoundary(Width::Fixed(18)),
            ColumnConstraint::UpperBoundary(Width::Fixed(10)),
            ColumnConstraint::LowerBoundary(Width::Fixed(5)),
            ColumnConstraint::UpperBoundary(Width::Percentage(20)),
            ColumnConstraint::UpperBoundary(Width::Percentage(20)),
            ColumnConstraint::UpperBoundary(Width::Percentage(35)),
        ]);
    }
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn dim_cell<T: ToString>(value: T) -> Cell {
    Cell::new(value).fg(Color::DarkGrey)
}
