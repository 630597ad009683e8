//! Load fund buckets from CSV
//!
//! Expected columns: SchemeCode, SchemeName, Weight, RiskCategory, InceptionDate.
//! RiskCategory may be empty for funds without a classification.

use super::{Fund, RiskCategory};
use chrono::NaiveDate;
use csv::Reader;
use std::error::Error;
use std::path::Path;

/// Raw CSV row matching the bucket export columns
#[derive(Debug, serde::Deserialize)]
struct CsvRow {
    #[serde(rename = "SchemeCode")]
    scheme_code: u32,
    #[serde(rename = "SchemeName")]
    scheme_name: String,
    #[serde(rename = "Weight")]
    weight: f64,
    #[serde(rename = "RiskCategory")]
    risk_category: String,
    #[serde(rename = "InceptionDate")]
    inception_date: NaiveDate,
}

impl CsvRow {
    fn to_fund(self) -> Result<Fund, Box<dyn Error>> {
        let risk_category = match self.risk_category.trim() {
            "" => None,
            other => match RiskCategory::from_str_opt(other) {
                Some(cat) => Some(cat),
                None => return Err(format!("Unknown RiskCategory: {}", other).into()),
            },
        };

        Ok(Fund {
            scheme_code: self.scheme_code,
            name: self.scheme_name,
            weight_pct: self.weight,
            risk_category,
            inception_date: self.inception_date,
        })
    }
}

/// Load all funds in a bucket from a CSV file
pub fn load_funds<P: AsRef<Path>>(path: P) -> Result<Vec<Fund>, Box<dyn Error>> {
    let mut reader = Reader::from_path(path)?;
    let mut funds = Vec::new();

    for result in reader.deserialize() {
        let row: CsvRow = result?;
        funds.push(row.to_fund()?);
    }

    Ok(funds)
}

/// Load funds from any reader (e.g., string buffer, network stream)
pub fn load_funds_from_reader<R: std::io::Read>(reader: R) -> Result<Vec<Fund>, Box<dyn Error>> {
    let mut csv_reader = Reader::from_reader(reader);
    let mut funds = Vec::new();

    for result in csv_reader.deserialize() {
        let row: CsvRow = result?;
        funds.push(row.to_fund()?);
    }

    Ok(funds)
}

#[cfg(test)]
mod tests {
    use super::*;

    const BUCKET_CSV: &str = "\
SchemeCode,SchemeName,Weight,RiskCategory,InceptionDate
118550,Bluechip Growth Fund,50,equity-large,2013-01-01
120503,Balanced Advantage Fund,30,hybrid,2014-03-17
119091,Short Duration Debt Fund,20,debt,2010-11-02
";

    #[test]
    fn test_load_bucket_from_reader() {
        let funds = load_funds_from_reader(BUCKET_CSV.as_bytes()).expect("parse failed");
        assert_eq!(funds.len(), 3);

        assert_eq!(funds[0].scheme_code, 118550);
        assert_eq!(funds[0].name, "Bluechip Growth Fund");
        assert_eq!(funds[0].weight_pct, 50.0);
        assert_eq!(funds[0].risk_category, Some(RiskCategory::EquityLarge));
        assert_eq!(
            funds[0].inception_date,
            NaiveDate::from_ymd_opt(2013, 1, 1).unwrap()
        );

        assert_eq!(funds[2].risk_category, Some(RiskCategory::Debt));
    }

    #[test]
    fn test_empty_risk_category_is_none() {
        let csv = "\
SchemeCode,SchemeName,Weight,RiskCategory,InceptionDate
100001,Unclassified Fund,100,,2018-05-20
";
        let funds = load_funds_from_reader(csv.as_bytes()).expect("parse failed");
        assert_eq!(funds[0].risk_category, None);
    }

    #[test]
    fn test_unknown_risk_category_is_rejected() {
        let csv = "\
SchemeCode,SchemeName,Weight,RiskCategory,InceptionDate
100001,Gilt Fund,100,gilt,2018-05-20
";
        let err = load_funds_from_reader(csv.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("gilt"));
    }
}
