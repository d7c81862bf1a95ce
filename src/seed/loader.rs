use super::MemorySeedSource;
use crate::core_types::{create_money, MatchType, Money, StatsEstimate};
use crate::error::KoResult;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, info, warn};

// keyword,match_type,impressions_per_day,clicks_per_day,ctr,avg_position,avg_cpc_micros,total_cost_micros
const COLUMN_COUNT: usize = 8;

pub fn load_seed_table<P: AsRef<Path>>(path: P) -> KoResult<MemorySeedSource> {
    let path = path.as_ref();
    info!("📂 Loading seed table from: {}", path.display());
    let file = File::open(path)?;
    read_seed_table(file)
}

/// Reads a seed table in CSV form. The first line is a header.
///
/// Empty cells are absent statistics; an empty match type applies the row to
/// all match types. Rows that cannot be parsed are skipped.
pub fn read_seed_table<R: Read>(reader: R) -> KoResult<MemorySeedSource> {
    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut source = MemorySeedSource::new();
    let mut skipped_count = 0;

    for (row_idx, result) in rdr.records().enumerate() {
        let rec = match result {
            Ok(rec) => rec,
            Err(e) => {
                warn!("[Row {}] CSV Parse Error: {}", row_idx + 1, e);
                skipped_count += 1;
                continue;
            }
        };

        match parse_row(&rec) {
            Some((text, match_type, estimate)) => source.insert(text, match_type, estimate),
            None => {
                debug!("[Row {}] Skipping invalid row: {:?}", row_idx + 1, rec);
                skipped_count += 1;
            }
        }
    }

    if skipped_count > 0 {
        warn!("⚠️  Skipped {} invalid rows in seed table.", skipped_count);
    }
    info!("   -> Loaded {} seed rows.", source.len());

    Ok(source)
}

fn parse_row(rec: &csv::StringRecord) -> Option<(String, Option<MatchType>, StatsEstimate)> {
    if rec.len() < COLUMN_COUNT {
        return None;
    }

    let text = rec[0].to_string();
    if text.is_empty() {
        return None;
    }

    let match_type = match &rec[1] {
        "" => None,
        s => Some(MatchType::from_str(s).ok()?),
    };

    let estimate = StatsEstimate {
        impressions_per_day: optional_stat(&rec[2], f64::MAX)?,
        clicks_per_day: optional_stat(&rec[3], f64::MAX)?,
        click_through_rate: optional_stat(&rec[4], 1.0)?,
        avg_position: optional_stat(&rec[5], f64::MAX)?,
        avg_cpc: optional_money(&rec[6])?,
        total_cost: optional_money(&rec[7])?,
    };

    Some((text, match_type, estimate))
}

/// `Some(None)` for an empty cell, `None` for a cell that does not parse.
fn optional<T: FromStr>(cell: &str) -> Option<Option<T>> {
    if cell.is_empty() {
        return Some(None);
    }
    cell.parse().ok().map(Some)
}

/// Like [`optional`], but also rejects values that are not finite or fall
/// outside `0.0..=max`.
fn optional_stat(cell: &str, max: f64) -> Option<Option<f64>> {
    match optional::<f64>(cell)? {
        Some(v) if !(v.is_finite() && (0.0..=max).contains(&v)) => None,
        value => Some(value),
    }
}

fn optional_money(cell: &str) -> Option<Option<Money>> {
    match optional::<i64>(cell)? {
        Some(micros) if micros < 0 => None,
        value => Some(value.map(create_money)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const HEADER: &str = "keyword,match_type,impressions_per_day,clicks_per_day,ctr,avg_position,avg_cpc_micros,total_cost_micros\n";

    #[test]
    fn test_reads_rows_and_absent_cells() {
        let data = format!(
            "{}running shoes,,120.5,3.2,0.026,1.8,1500000,4800000\ntrail shoes,EXACT,,,,,,\n",
            HEADER
        );
        let source = read_seed_table(Cursor::new(data)).unwrap();
        assert_eq!(source.len(), 2);
    }

    #[test]
    fn test_skips_malformed_rows() {
        let data = format!(
            "{}ok,,1,1,0.1,1,1,1\nbad number,,abc,1,0.1,1,1,1\nbad type,FUZZY,1,1,0.1,1,1,1\nshort,,1\n,,1,1,0.1,1,1,1\n",
            HEADER
        );
        let source = read_seed_table(Cursor::new(data)).unwrap();
        assert_eq!(source.len(), 1);
    }
}
