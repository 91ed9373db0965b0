//! Snapshot CSV loading and row validation.
//!
//! Required columns (extra columns may follow):
//!   hotel_id, plan_id, room_type_id, date, created_at, stock, price
//!
//! Rows with an empty field in any column, or an unparseable required field,
//! are dropped, never repaired. Every drop is counted in [`NormalizationStats`].

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use curve_core::{Error, ListingKey, Result, SnapshotRow, Units};
use serde::Serialize;
use std::collections::HashSet;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info, warn};

const REQUIRED_COLUMNS: [&str; 7] = [
    "hotel_id",
    "plan_id",
    "room_type_id",
    "date",
    "created_at",
    "stock",
    "price",
];

const TIMESTAMP_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
];

/// Counts of rows read, kept and dropped during normalization.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NormalizationStats {
    /// Data rows read (header excluded).
    pub rows_read: u64,
    /// Rows that passed validation.
    pub rows_kept: u64,
    /// Records the CSV reader could not decode.
    pub unreadable: u64,
    /// Rows with an empty or absent field in any column.
    pub missing_field: u64,
    /// Rows whose `date` did not parse.
    pub bad_date: u64,
    /// Rows whose `created_at` did not parse.
    pub bad_timestamp: u64,
    /// Rows whose `stock` was not a non-negative integer.
    pub bad_stock: u64,
    /// Rows whose `price` was not a finite number.
    pub bad_price: u64,
    /// Repeated (listing, stay date, observed at) rows.
    pub duplicate: u64,
}

impl NormalizationStats {
    /// Total rows dropped for any reason.
    pub fn dropped(&self) -> u64 {
        self.unreadable
            + self.missing_field
            + self.bad_date
            + self.bad_timestamp
            + self.bad_stock
            + self.bad_price
            + self.duplicate
    }

    /// Fraction of read rows that were dropped.
    pub fn drop_fraction(&self) -> f64 {
        if self.rows_read > 0 {
            self.dropped() as f64 / self.rows_read as f64
        } else {
            0.0
        }
    }
}

/// Clean snapshot rows plus the statistics of how they were obtained.
#[derive(Debug, Clone)]
pub struct NormalizedTable {
    pub rows: Vec<SnapshotRow>,
    pub stats: NormalizationStats,
}

/// Why a single row was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RowRejection {
    MissingField,
    BadDate,
    BadTimestamp,
    BadStock,
    BadPrice,
}

/// Column positions of the required fields within the header.
struct ColumnIndex {
    positions: [usize; 7],
    width: usize,
}

impl ColumnIndex {
    fn from_headers(headers: &csv::StringRecord) -> Result<Self> {
        let mut positions = [0usize; 7];
        let mut missing = Vec::new();
        for (slot, name) in REQUIRED_COLUMNS.iter().enumerate() {
            match headers.iter().position(|h| h.trim() == *name) {
                Some(pos) => positions[slot] = pos,
                None => missing.push(*name),
            }
        }
        if !missing.is_empty() {
            return Err(Error::schema(format!(
                "missing required column(s): {}",
                missing.join(", ")
            )));
        }
        Ok(Self {
            positions,
            width: headers.len(),
        })
    }

    fn field<'r>(&self, record: &'r csv::StringRecord, slot: usize) -> Option<&'r str> {
        record
            .get(self.positions[slot])
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    fn parse(&self, record: &csv::StringRecord) -> std::result::Result<SnapshotRow, RowRejection> {
        if record.len() < self.width || record.iter().any(|f| f.trim().is_empty()) {
            return Err(RowRejection::MissingField);
        }

        let mut fields = [""; 7];
        for (slot, value) in fields.iter_mut().enumerate() {
            *value = self.field(record, slot).ok_or(RowRejection::MissingField)?;
        }
        let [hotel_id, plan_id, room_type_id, date, created_at, stock, price] = fields;

        Ok(SnapshotRow {
            listing: ListingKey::new(hotel_id, plan_id, room_type_id),
            stay_date: parse_stay_date(date).ok_or(RowRejection::BadDate)?,
            observed_at: parse_timestamp(created_at).ok_or(RowRejection::BadTimestamp)?,
            stock: parse_stock(stock).ok_or(RowRejection::BadStock)?,
            price: parse_price(price).ok_or(RowRejection::BadPrice)?,
        })
    }
}

/// Parse a stay date. A trailing time component is accepted and discarded.
pub fn parse_stay_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .or_else(|| parse_timestamp(s).map(|ts| ts.date()))
}

/// Parse an observation timestamp.
///
/// Accepts `YYYY-MM-DD HH:MM:SS[.fff]`, the `T`-separated variant, RFC 3339
/// (converted to naive UTC), and a bare date (midnight).
pub fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    for format in TIMESTAMP_FORMATS {
        if let Ok(ts) = NaiveDateTime::parse_from_str(s, format) {
            return Some(ts);
        }
    }
    if let Ok(ts) = DateTime::parse_from_rfc3339(s) {
        return Some(ts.naive_utc());
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .map(|d| d.and_time(NaiveTime::default()))
}

/// Parse stock as a non-negative integer. Integral decimals such as `"30.0"` are accepted.
pub fn parse_stock(s: &str) -> Option<Units> {
    if let Ok(units) = s.parse::<Units>() {
        return Some(units);
    }
    let value = s.parse::<f64>().ok()?;
    if value.is_finite() && value >= 0.0 && value.fract() == 0.0 && value <= Units::MAX as f64 {
        Some(value as Units)
    } else {
        None
    }
}

/// Parse a finite price.
pub fn parse_price(s: &str) -> Option<f64> {
    s.parse::<f64>().ok().filter(|p| p.is_finite())
}

fn read_failure(err: csv::Error) -> Error {
    if matches!(err.kind(), csv::ErrorKind::Io(_)) {
        Error::source_unavailable(format!("failed reading snapshot source: {err}"))
    } else {
        Error::Csv(err)
    }
}

/// Load and validate snapshot rows from a CSV reader.
pub fn load_snapshots<R: Read>(reader: R) -> Result<NormalizedTable> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = csv_reader.headers().map_err(read_failure)?.clone();
    let columns = ColumnIndex::from_headers(&headers)?;

    let mut stats = NormalizationStats::default();
    let mut seen = HashSet::new();
    let mut rows = Vec::new();

    for (line_num, result) in csv_reader.records().enumerate() {
        stats.rows_read += 1;
        let record = match result {
            Ok(record) => record,
            Err(err) if matches!(err.kind(), csv::ErrorKind::Io(_)) => {
                return Err(read_failure(err));
            }
            Err(err) => {
                debug!(line = line_num + 2, error = %err, "unreadable record");
                stats.unreadable += 1;
                continue;
            }
        };

        let row = match columns.parse(&record) {
            Ok(row) => row,
            Err(rejection) => {
                debug!(line = line_num + 2, ?rejection, "dropping row");
                match rejection {
                    RowRejection::MissingField => stats.missing_field += 1,
                    RowRejection::BadDate => stats.bad_date += 1,
                    RowRejection::BadTimestamp => stats.bad_timestamp += 1,
                    RowRejection::BadStock => stats.bad_stock += 1,
                    RowRejection::BadPrice => stats.bad_price += 1,
                }
                continue;
            }
        };

        if !seen.insert((row.listing.clone(), row.stay_date, row.observed_at)) {
            stats.duplicate += 1;
            continue;
        }

        stats.rows_kept += 1;
        rows.push(row);
    }

    if stats.dropped() > 0 {
        warn!(
            dropped = stats.dropped(),
            rows_read = stats.rows_read,
            missing_field = stats.missing_field,
            bad_date = stats.bad_date,
            bad_timestamp = stats.bad_timestamp,
            bad_stock = stats.bad_stock,
            bad_price = stats.bad_price,
            duplicate = stats.duplicate,
            "dropped malformed snapshot rows"
        );
    }
    info!(rows_kept = stats.rows_kept, "snapshot normalization complete");

    Ok(NormalizedTable { rows, stats })
}

/// Load and validate snapshot rows from a CSV file path.
pub fn load_snapshots_file(path: impl AsRef<Path>) -> Result<NormalizedTable> {
    let path = path.as_ref();
    let file = std::fs::File::open(path).map_err(|e| {
        Error::source_unavailable(format!("failed to open '{}': {}", path.display(), e))
    })?;
    load_snapshots(file)
}
