use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use std::io::Read;
use std::path::Path;
use std::str::FromStr;
use trailstop_core::{Bar, DataError};

/// Load bars from a CSV file.
///
/// Expected columns (case-insensitive, flexible ordering):
/// `timestamp` (or `date`, `datetime`, `time`), `high`, `low`, `close`.
/// `open` and `volume` are optional. The instrument is taken from the file stem.
pub fn load_bars_from_csv(path: &Path) -> Result<Vec<Bar>, DataError> {
    if !path.exists() {
        return Err(DataError::NotFound(format!(
            "CSV file not found: {}",
            path.display()
        )));
    }
    let instrument = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "unknown".to_string());

    let file = std::fs::File::open(path)?;
    let bars = load_bars_from_reader(file, &instrument)?;
    tracing::info!(file = %path.display(), bars = bars.len(), "Loaded bars from CSV");
    Ok(bars)
}

/// Load bars from any CSV source. Output is sorted by timestamp.
pub fn load_bars_from_reader<R: Read>(source: R, instrument: &str) -> Result<Vec<Bar>, DataError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(source);

    let headers = reader
        .headers()
        .map_err(|e| DataError::ParseError(format!("Failed to read headers: {}", e)))?
        .clone();

    let col_map = resolve_bar_columns(&headers)?;

    let mut bars = Vec::new();
    for (row, result) in reader.records().enumerate() {
        let record =
            result.map_err(|e| DataError::ParseError(format!("CSV record error: {}", e)))?;
        let line = row + 2;

        let timestamp = parse_timestamp(field(&record, col_map.timestamp, "timestamp", line)?)?;
        let high = parse_decimal(field(&record, col_map.high, "high", line)?, "high")?;
        let low = parse_decimal(field(&record, col_map.low, "low", line)?, "low")?;
        let close = parse_decimal(field(&record, col_map.close, "close", line)?, "close")?;
        let open = match col_map.open {
            Some(idx) => parse_decimal(field(&record, idx, "open", line)?, "open")?,
            None => close,
        };
        let volume = match col_map.volume {
            Some(idx) => parse_decimal(field(&record, idx, "volume", line)?, "volume")?,
            None => Decimal::ZERO,
        };

        if high < low {
            return Err(DataError::ParseError(format!(
                "Line {}: high {} is below low {}",
                line, high, low
            )));
        }

        bars.push(Bar {
            instrument: instrument.to_string(),
            timestamp,
            open,
            high,
            low,
            close,
            volume,
        });
    }

    bars.sort_by_key(|b| b.timestamp);
    Ok(bars)
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

struct BarColumnMap {
    timestamp: usize,
    open: Option<usize>,
    high: usize,
    low: usize,
    close: usize,
    volume: Option<usize>,
}

fn resolve_bar_columns(headers: &csv::StringRecord) -> Result<BarColumnMap, DataError> {
    let ts = find_column(headers, &["timestamp", "date", "datetime", "time"])
        .ok_or_else(|| DataError::ParseError("No timestamp column found".into()))?;
    let high = find_column(headers, &["high", "h"])
        .ok_or_else(|| DataError::ParseError("No high column found".into()))?;
    let low = find_column(headers, &["low", "l"])
        .ok_or_else(|| DataError::ParseError("No low column found".into()))?;
    let close = find_column(headers, &["close", "c"])
        .ok_or_else(|| DataError::ParseError("No close column found".into()))?;

    Ok(BarColumnMap {
        timestamp: ts,
        open: find_column(headers, &["open", "o"]),
        high,
        low,
        close,
        volume: find_column(headers, &["volume", "vol", "v"]),
    })
}

fn find_column(headers: &csv::StringRecord, names: &[&str]) -> Option<usize> {
    headers
        .iter()
        .position(|header| names.contains(&header.trim().to_lowercase().as_str()))
}

fn field<'r>(
    record: &'r csv::StringRecord,
    idx: usize,
    name: &str,
    line: usize,
) -> Result<&'r str, DataError> {
    record
        .get(idx)
        .ok_or_else(|| DataError::ParseError(format!("Line {}: missing {} field", line, name)))
}

fn parse_decimal(s: &str, field: &str) -> Result<Decimal, DataError> {
    Decimal::from_str(s.trim())
        .or_else(|_| Decimal::from_scientific(s.trim()))
        .map_err(|e| DataError::ParseError(format!("Failed to parse {} '{}': {}", field, s, e)))
}

fn parse_timestamp(s: &str) -> Result<DateTime<Utc>, DataError> {
    let s = s.trim();

    // Try RFC 3339 / ISO 8601 with timezone
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }

    // Common formats (without timezone, assume UTC)
    let formats = [
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%m/%d/%Y %H:%M:%S",
        "%m/%d/%Y %H:%M",
        "%Y%m%d %H:%M:%S",
        "%d/%m/%Y %H:%M:%S",
    ];

    for fmt in &formats {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(naive.and_utc());
        }
    }

    // Date only, midnight UTC
    if let Some(naive_dt) = NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
    {
        return Ok(naive_dt.and_utc());
    }

    // Unix timestamp (seconds)
    if let Some(dt) = s.parse::<i64>().ok().and_then(|ts| DateTime::from_timestamp(ts, 0)) {
        return Ok(dt);
    }

    Err(DataError::ParseError(format!(
        "Unable to parse timestamp: '{}'",
        s
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    #[test]
    fn test_reader_resolves_columns_and_sorts() {
        let csv = "Date,Open,High,Low,Close,Volume\n\
                   2024-01-03,10.5,11,9.5,10.8,1200\n\
                   2024-01-02,9.2,10,9,9.5,1000\n";
        let bars = load_bars_from_reader(csv.as_bytes(), "ES").unwrap();
        assert_eq!(bars.len(), 2);
        assert_eq!(bars[0].timestamp, Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap());
        assert_eq!(bars[0].close, dec!(9.5));
        assert_eq!(bars[1].high, dec!(11));
        assert_eq!(bars[1].volume, dec!(1200));
        assert_eq!(bars[1].instrument, "ES");
    }

    #[test]
    fn test_optional_columns_default() {
        let csv = "time,h,l,c\n1700000000,10,9,9.5\n";
        let bars = load_bars_from_reader(csv.as_bytes(), "NQ").unwrap();
        assert_eq!(bars[0].open, dec!(9.5));
        assert_eq!(bars[0].volume, Decimal::ZERO);
        assert_eq!(bars[0].timestamp.timestamp(), 1_700_000_000);
    }

    #[test]
    fn test_missing_close_column() {
        let csv = "timestamp,high,low\n2024-01-02,10,9\n";
        let err = load_bars_from_reader(csv.as_bytes(), "ES").unwrap_err();
        assert!(matches!(err, DataError::ParseError(msg) if msg.contains("close")));
    }

    #[test]
    fn test_inverted_bar_rejected() {
        let csv = "timestamp,high,low,close\n2024-01-02 09:30:00,9,10,9.5\n";
        let err = load_bars_from_reader(csv.as_bytes(), "ES").unwrap_err();
        assert!(matches!(err, DataError::ParseError(msg) if msg.starts_with("Line 2")));
    }

    #[test]
    fn test_timestamp_formats() {
        let expected = Utc.with_ymd_and_hms(2024, 3, 1, 14, 30, 0).unwrap();
        for s in [
            "2024-03-01T14:30:00Z",
            "2024-03-01 14:30:00",
            "2024-03-01T14:30:00.000",
            "03/01/2024 14:30",
        ] {
            assert_eq!(parse_timestamp(s).unwrap(), expected, "format {}", s);
        }
        assert!(parse_timestamp("yesterday").is_err());
    }

    #[test]
    fn test_load_from_file() {
        let path = std::env::temp_dir().join(format!("trailstop_{}_CL.csv", std::process::id()));
        std::fs::write(&path, "date,high,low,close\n2024-01-02,75,74,74.5\n").unwrap();
        let bars = load_bars_from_csv(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(bars.len(), 1);
        assert!(bars[0].instrument.ends_with("_CL"));

        let missing = load_bars_from_csv(Path::new("/nonexistent/bars.csv"));
        assert!(matches!(missing, Err(DataError::NotFound(_))));
    }
}
