//! Load NAV history from long-format CSV
//!
//! Expected columns: SchemeCode, Date, Nav — one row per fund per trading
//! day, rows for each fund in ascending date order (the standard AMFI dump
//! layout). Rows with a non-positive NAV (placeholder zeros in some dumps)
//! are skipped with a warning.

use chrono::NaiveDate;
use csv::Reader;
use log::warn;
use std::collections::HashMap;
use std::error::Error;
use std::path::Path;

use super::{NavHistory, NavPoint, NavSeries};

/// Raw CSV row of the long-format NAV dump
#[derive(Debug, serde::Deserialize)]
struct CsvRow {
    #[serde(rename = "SchemeCode")]
    scheme_code: u32,
    #[serde(rename = "Date")]
    date: NaiveDate,
    #[serde(rename = "Nav")]
    nav: f64,
}

fn build_history(rows: Vec<CsvRow>) -> Result<NavHistory, Box<dyn Error>> {
    let mut grouped: HashMap<u32, Vec<NavPoint>> = HashMap::new();

    for row in rows {
        if row.nav <= 0.0 {
            warn!(
                "skipping NAV row for fund {} on {}: non-positive value {}",
                row.scheme_code, row.date, row.nav
            );
            continue;
        }
        grouped
            .entry(row.scheme_code)
            .or_default()
            .push(NavPoint::new(row.date, row.nav));
    }

    let mut history = NavHistory::new();
    for (scheme_code, points) in grouped {
        // from_points rejects out-of-order or duplicate dates; a malformed
        // dump fails loudly instead of producing a silently wrong resolver
        let series = NavSeries::from_points(points)?;
        history.insert(scheme_code, series);
    }

    Ok(history)
}

/// Load the NAV history for every fund present in a CSV file
pub fn load_nav_history<P: AsRef<Path>>(path: P) -> Result<NavHistory, Box<dyn Error>> {
    let mut reader = Reader::from_path(path)?;
    let mut rows = Vec::new();
    for result in reader.deserialize() {
        rows.push(result?);
    }
    build_history(rows)
}

/// Load NAV history from any reader (e.g., string buffer, network stream)
pub fn load_nav_history_from_reader<R: std::io::Read>(
    reader: R,
) -> Result<NavHistory, Box<dyn Error>> {
    let mut csv_reader = Reader::from_reader(reader);
    let mut rows = Vec::new();
    for result in csv_reader.deserialize() {
        rows.push(result?);
    }
    build_history(rows)
}
