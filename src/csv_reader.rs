use std::fs::File;
use std::path::Path;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum DataError {
    #[error("failed to open dataset: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse dataset: {0}")]
    Csv(#[from] csv::Error),
    #[error("schema violation at row {row}: {reason}")]
    Schema { row: usize, reason: String },
}

// Row shape as it appears in the CSV file. Columns not listed here are ignored.
#[derive(Debug, Deserialize)]
struct RawTransaction {
    #[serde(rename = "trans_date_trans_time")]
    timestamp: String,
    merchant: String,
    category: String,
    #[serde(rename = "amt")]
    amount: f64,
    city: String,
    state: String,
    #[serde(rename = "lat")]
    latitude: f64,
    #[serde(rename = "long")]
    longitude: f64,
    #[serde(rename = "city_pop")]
    city_population: u64,
    is_fraud: u8,
}

// Validated, immutable transaction record. The loaded dataset is never
// mutated after `read_transactions` returns.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Transaction {
    pub timestamp: Option<NaiveDateTime>,
    pub merchant: String,
    pub category: String,
    pub amount: f64,
    pub city: String,
    pub state: String,
    pub latitude: f64,
    pub longitude: f64,
    pub city_population: u64,
    pub is_fraud: bool,
}

impl Transaction {
    pub fn class_label(&self) -> &'static str {
        if self.is_fraud {
            "fraud"
        } else {
            "legit"
        }
    }
}

impl RawTransaction {
    // An unparseable timestamp is tolerated (the record is excluded from
    // time-dimension grouping only); everything else checked here is fatal.
    fn validate(self, row: usize) -> Result<Transaction, DataError> {
        if !self.amount.is_finite() || self.amount < 0.0 {
            return Err(DataError::Schema {
                row,
                reason: format!("amount {} is not a non-negative number", self.amount),
            });
        }
        if !self.latitude.is_finite() || !self.longitude.is_finite() {
            return Err(DataError::Schema {
                row,
                reason: "latitude/longitude must be finite".to_string(),
            });
        }
        let is_fraud = match self.is_fraud {
            0 => false,
            1 => true,
            other => {
                return Err(DataError::Schema {
                    row,
                    reason: format!("fraud label {other} is not 0 or 1"),
                })
            }
        };
        Ok(Transaction {
            timestamp: parse_timestamp(&self.timestamp),
            merchant: self.merchant,
            category: self.category,
            amount: self.amount,
            city: self.city,
            state: self.state,
            latitude: self.latitude,
            longitude: self.longitude,
            city_population: self.city_population,
            is_fraud,
        })
    }
}

fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S"))
        .ok()
}

pub fn read_transactions(file_path: &Path) -> Result<Vec<Transaction>, DataError> {
    let file = File::open(file_path)?;
    let mut rdr = csv::Reader::from_reader(file);

    let mut transactions = Vec::new();
    for (index, record) in rdr.deserialize::<RawTransaction>().enumerate() {
        // Row numbers are 1-based and account for the header line.
        let transaction = record?.validate(index + 2)?;
        transactions.push(transaction);
    }

    let unparsed = transactions.iter().filter(|tx| tx.timestamp.is_none()).count();
    if unparsed > 0 {
        debug!(unparsed, "records with unparseable timestamps");
    }
    info!(records = transactions.len(), "transaction dataset loaded");
    Ok(transactions)
}
