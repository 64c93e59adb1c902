//! Console tables for run summaries and the priority order.

use comfy_table::modifiers::{UTF8_ROUND_CORNERS, UTF8_SOLID_INNER_BORDERS};
use comfy_table::presets::{UTF8_FULL, UTF8_FULL_CONDENSED};
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use tte_engine::AnalysisSummary;
use tte_model::{ColumnCatalog, ColumnRole};

/// One line of the global priority order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriorityRow {
    pub rank: u32,
    pub column: String,
    pub role: ColumnRole,
    pub outcome: String,
    pub code: u32,
}

pub fn priority_rows(catalog: &ColumnCatalog) -> Vec<PriorityRow> {
    catalog
        .columns()
        .iter()
        .map(|column| PriorityRow {
            rank: column.rank.0,
            column: column.name.clone(),
            role: column.role,
            outcome: catalog.outcome_name(column.rank).to_string(),
            code: column.outcome.code(),
        })
        .collect()
}

/// Rank, column, role, outcome, and code for every source column.
pub fn priority_table(catalog: &ColumnCatalog) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Rank"),
        header_cell("Column"),
        header_cell("Role"),
        header_cell("Outcome"),
        header_cell("Code"),
    ]);
    apply_table_style(&mut table);
    align_column(&mut table, 0, CellAlignment::Right);
    align_column(&mut table, 4, CellAlignment::Right);
    for row in priority_rows(catalog) {
        table.add_row(vec![
            Cell::new(row.rank),
            Cell::new(&row.column).add_attribute(Attribute::Bold),
            role_cell(row.role),
            Cell::new(&row.outcome),
            Cell::new(row.code),
        ]);
    }
    table
}

/// Subjects per outcome level, Censored first.
pub fn outcome_table(summary: &AnalysisSummary) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Outcome"),
        header_cell("Code"),
        header_cell("Subjects"),
        header_cell("Share"),
    ]);
    apply_summary_table_style(&mut table);
    align_column(&mut table, 1, CellAlignment::Right);
    align_column(&mut table, 2, CellAlignment::Right);
    align_column(&mut table, 3, CellAlignment::Right);

    for (code, (label, count)) in summary.outcome_counts.iter().enumerate() {
        table.add_row(vec![
            Cell::new(label),
            Cell::new(code),
            count_cell(*count, Color::Green),
            Cell::new(share(*count, summary.subjects)),
        ]);
    }
    let unresolved = summary.subjects - summary.resolved;
    table.add_row(vec![
        dim_cell("(missing)"),
        dim_cell("-"),
        count_cell(unresolved, Color::Yellow),
        Cell::new(share(unresolved, summary.subjects)),
    ]);
    table.add_row(vec![
        Cell::new("TOTAL")
            .fg(Color::Cyan)
            .add_attribute(Attribute::Bold),
        dim_cell("-"),
        Cell::new(summary.subjects).add_attribute(Attribute::Bold),
        dim_cell("-"),
    ]);
    table
}

/// Why subjects have no outcome.
pub fn eligibility_table(summary: &AnalysisSummary) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Subjects"),
        header_cell("Resolved"),
        header_cell("Short follow-up"),
        header_cell("Missing start"),
    ]);
    apply_table_style(&mut table);
    for index in 0..4 {
        align_column(&mut table, index, CellAlignment::Right);
    }
    table.add_row(vec![
        Cell::new(summary.subjects),
        Cell::new(summary.resolved),
        count_cell(summary.ineligible, Color::Yellow),
        count_cell(summary.missing_start, Color::Yellow),
    ]);
    table
}

/// Percentage with one decimal; `-` for an empty roster.
pub fn share(count: usize, total: usize) -> String {
    if total == 0 {
        return "-".to_string();
    }
    format!("{:.1}%", count as f64 * 100.0 / total as f64)
}

pub fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
}

fn apply_summary_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .apply_modifier(UTF8_SOLID_INNER_BORDERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

fn role_cell(role: ColumnRole) -> Cell {
    match role {
        ColumnRole::Event => Cell::new("event").fg(Color::Blue),
        ColumnRole::EarlyCensor => Cell::new("early censor").fg(Color::DarkGrey),
        ColumnRole::LateCensor => Cell::new("late censor").fg(Color::DarkGrey),
    }
}

fn count_cell(count: usize, color: Color) -> Cell {
    if count > 0 {
        Cell::new(count).fg(color).add_attribute(Attribute::Bold)
    } else {
        dim_cell(count)
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
