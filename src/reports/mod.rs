use comfy_table::presets::ASCII_FULL;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};
use keyword_optimizer::core_types::Money;
use keyword_optimizer::optimizer::OptimizationResult;
use keyword_optimizer::pool::CandidateEntry;

const NULL_CELL: &str = "---";

fn number_cell(value: Option<f64>, precision: usize) -> Cell {
    let text = match value {
        Some(v) => format!("{:.*}", precision, v),
        None => NULL_CELL.to_string(),
    };
    Cell::new(text).set_alignment(CellAlignment::Right)
}

fn money_cell(value: Option<Money>) -> Cell {
    number_cell(value.map(|m| m.as_units()), 2)
}

fn keyword_table(entries: &[CandidateEntry]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(ASCII_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);

    table.set_header(vec![
        Cell::new("#"),
        Cell::new("Keyword").add_attribute(Attribute::Bold),
        Cell::new("Match"),
        Cell::new("Score").fg(Color::Cyan),
        Cell::new("Imp/day"),
        Cell::new("Clicks/day"),
        Cell::new("CTR"),
        Cell::new("Pos"),
        Cell::new("CPC"),
        Cell::new("Cost"),
    ]);

    for (rank, entry) in entries.iter().enumerate() {
        let est = &entry.estimate;
        table.add_row(vec![
            Cell::new(rank + 1),
            Cell::new(entry.keyword.text()),
            Cell::new(entry.keyword.match_type()),
            number_cell(entry.score, 3).fg(Color::Cyan),
            number_cell(est.impressions_per_day, 1),
            number_cell(est.clicks_per_day, 1),
            number_cell(est.click_through_rate, 4),
            number_cell(est.avg_position, 2),
            money_cell(est.avg_cpc),
            money_cell(est.total_cost),
        ]);
    }
    table
}

pub fn print_optimization_report(result: &OptimizationResult) {
    println!(
        "\n🏁 Optimization finished after {} round(s): {}",
        result.rounds, result.finish_reason
    );
    println!(
        "   Pool size: {} | Showing top {}",
        result.pool_size,
        result.keywords.len()
    );

    if result.keywords.is_empty() {
        println!("   (no keywords)");
        return;
    }
    println!("{}", keyword_table(&result.keywords));
}

pub fn print_score_table(entries: &[CandidateEntry], average: Option<f64>) {
    println!("{}", keyword_table(entries));
    if let Some(avg) = average {
        println!("   Average score: {:.3}", avg);
    }
}
