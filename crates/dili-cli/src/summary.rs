use comfy_table::modifiers::{UTF8_ROUND_CORNERS, UTF8_SOLID_INNER_BORDERS};
use comfy_table::presets::{UTF8_FULL, UTF8_FULL_CONDENSED};
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use dili_cli::report::{PatientSummary, RatioReport, format_ratio};
use dili_model::{ClassificationResult, ExposureRatio};
use dili_naranjo::{Answer, NaranjoAssessment, NaranjoCategory, question_text};

pub fn print_patients(summaries: &[PatientSummary]) {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Patient"),
        header_cell("Rows"),
        header_cell("Drugs"),
        header_cell("First day"),
        header_cell("Last day"),
    ]);
    apply_table_style(&mut table);
    for column in 1..=4 {
        align_column(&mut table, column, CellAlignment::Right);
    }
    let mut total_rows = 0usize;
    for summary in summaries {
        total_rows += summary.rows;
        table.add_row(vec![
            Cell::new(&summary.patient),
            Cell::new(summary.rows),
            Cell::new(summary.distinct_drugs),
            day_cell(summary.first_day),
            day_cell(summary.last_day),
        ]);
    }
    table.add_row(vec![
        Cell::new("TOTAL")
            .fg(Color::Cyan)
            .add_attribute(Attribute::Bold),
        Cell::new(total_rows).add_attribute(Attribute::Bold),
        dim_cell("-"),
        dim_cell("-"),
        dim_cell("-"),
    ]);
    println!("{table}");
}

pub fn print_classification(result: &ClassificationResult) {
    println!(
        "Toxic identifiers: {}  Safe identifiers: {}",
        result.toxic_ids.len(),
        result.safe_ids.len()
    );
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("#"),
        header_cell("Toxic ingredient"),
        header_cell("Identifiers"),
    ]);
    apply_table_style(&mut table);
    align_column(&mut table, 0, CellAlignment::Right);
    for (position, ingredient) in result.toxic_ingredients.iter().enumerate() {
        let index = position + 1;
        let ids: Vec<&str> = result
            .toxic_index_map
            .iter()
            .filter(|(_, mapped)| **mapped == index)
            .map(|(id, _)| id.as_str())
            .collect();
        table.add_row(vec![
            Cell::new(index),
            Cell::new(ingredient).fg(Color::Red),
            Cell::new(ids.join(", ")),
        ]);
    }
    println!("{table}");
    if !result.safe_names.is_empty() {
        println!("Safe drugs: {}", result.safe_names.join(", "));
    }
}

pub fn print_ratios(report: &RatioReport) {
    if report.rows.is_empty() {
        println!("No days in range for patient {}", report.patient);
        return;
    }
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Day"),
        header_cell("Daily"),
        header_cell(&format!("{}-day window", report.window_days)),
    ]);
    apply_table_style(&mut table);
    for column in 0..=2 {
        align_column(&mut table, column, CellAlignment::Right);
    }
    for row in &report.rows {
        table.add_row(vec![
            Cell::new(row.day),
            ratio_cell(row.daily),
            ratio_cell(row.cumulative),
        ]);
    }
    println!("{table}");
}

pub fn print_assessment(assessment: &NaranjoAssessment) {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Q"),
        header_cell("Question"),
        header_cell("Answer"),
        header_cell("Points"),
        header_cell("Reasoning"),
    ]);
    apply_wide_table_style(&mut table);
    align_column(&mut table, 0, CellAlignment::Right);
    align_column(&mut table, 3, CellAlignment::Right);
    for answer in &assessment.answers {
        table.add_row(vec![
            Cell::new(answer.question),
            Cell::new(question_text(answer.question).unwrap_or("-")),
            answer_cell(answer.answer),
            Cell::new(answer.points()),
            Cell::new(&answer.reasoning),
        ]);
    }
    println!("{table}");
    println!(
        "Score: {}  Category: {}",
        assessment.score,
        category_label(assessment.category)
    );
    println!("{}", assessment.overall_assessment);
    if let Some(error) = &assessment.parse_error {
        eprintln!("warning: reply could not be parsed: {error}");
    }
}

fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
}

fn apply_wide_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .apply_modifier(UTF8_SOLID_INNER_BORDERS)
        .set_content_arrangement(ContentArrangement::DynamicFullWidth)
        .set_width(160);
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label).add_attribute(Attribute::Bold)
}

fn dim_cell<T: ToString>(value: T) -> Cell {
    Cell::new(value.to_string()).fg(Color::DarkGrey)
}

fn day_cell(day: Option<i64>) -> Cell {
    match day {
        Some(day) => Cell::new(day),
        None => dim_cell("-"),
    }
}

fn ratio_cell(ratio: ExposureRatio) -> Cell {
    let cell = Cell::new(format_ratio(ratio));
    match ratio.fraction() {
        Some(fraction) if fraction >= 0.5 => cell.fg(Color::Red).add_attribute(Attribute::Bold),
        Some(fraction) if fraction > 0.0 => cell.fg(Color::Yellow),
        Some(_) => cell,
        None => cell.fg(Color::DarkGrey),
    }
}

fn answer_cell(answer: Answer) -> Cell {
    let cell = Cell::new(answer);
    match answer {
        Answer::Yes => cell.fg(Color::Green),
        Answer::No => cell.fg(Color::Red),
        Answer::Unknown => cell.fg(Color::DarkGrey),
    }
}

fn category_label(category: NaranjoCategory) -> String {
    match category {
        NaranjoCategory::Definite | NaranjoCategory::Probable => {
            format!("{category} (likely drug-induced)")
        }
        NaranjoCategory::Possible | NaranjoCategory::Doubtful => category.to_string(),
    }
}
