//! CSV persistence for candle series.

use std::path::Path;

use candlefetch_types::Candle;
use chrono::{DateTime, NaiveDateTime, Utc};
use csv_async::{AsyncReaderBuilder, AsyncWriter, StringRecord, Trim};
use futures::StreamExt;
use tokio::io::{AsyncRead, AsyncWrite};

use crate::FormatError;

/// Column layout of a candle file.
pub const CSV_HEADER: [&str; 8] = [
    "time",
    "open",
    "high",
    "low",
    "close",
    "volume",
    "buy_volume",
    "sell_volume",
];

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Writes candles to a new file at `path`, replacing any existing file.
///
/// # Errors
///
/// Returns an error if the file cannot be created or written.
pub async fn write_candles(path: impl AsRef<Path>, candles: &[Candle]) -> Result<(), FormatError> {
    let file = tokio::fs::File::create(path.as_ref()).await?;
    write_candles_to(file, candles).await
}

/// Writes a header row and one row per candle to `writer`.
///
/// # Errors
///
/// Returns an error if writing fails.
pub async fn write_candles_to<W>(writer: W, candles: &[Candle]) -> Result<(), FormatError>
where
    W: AsyncWrite + Unpin + Send,
{
    let mut csv = AsyncWriter::from_writer(writer);
    csv.write_record(&CSV_HEADER).await?;

    for candle in candles {
        csv.write_record(&[
            candle.time.format(TIME_FORMAT).to_string(),
            candle.open.to_string(),
            candle.high.to_string(),
            candle.low.to_string(),
            candle.close.to_string(),
            candle.volume.to_string(),
            candle.buy_volume.to_string(),
            candle.sell_volume.to_string(),
        ])
        .await?;
    }

    csv.flush().await?;
    Ok(())
}

/// Reads a candle file written by [`write_candles`].
///
/// # Errors
///
/// Returns an error if the file cannot be opened, has no header, or contains
/// a malformed row.
pub async fn read_candles(path: impl AsRef<Path>) -> Result<Vec<Candle>, FormatError> {
    let file = tokio::fs::File::open(path.as_ref()).await?;
    read_candles_from(file).await
}

/// Reads candles from any async reader.
///
/// Columns are located by header name, so extra columns and reordering are
/// tolerated. Times may be `YYYY-MM-DD HH:MM:SS` (UTC) or RFC 3339.
///
/// # Errors
///
/// Returns [`FormatError::Empty`] for input without a header and
/// [`FormatError::Row`] for the first row that cannot be parsed.
pub async fn read_candles_from<R>(reader: R) -> Result<Vec<Candle>, FormatError>
where
    R: AsyncRead + Unpin + Send,
{
    let mut csv = AsyncReaderBuilder::new()
        .trim(Trim::All)
        .create_reader(reader);

    let headers = csv.headers().await?.clone();
    if headers.is_empty() {
        return Err(FormatError::Empty);
    }
    let columns = Columns::locate(&headers)?;

    let mut candles = Vec::new();
    let mut records = csv.records();
    while let Some(record) = records.next().await {
        let record = record?;
        let line = record.position().map_or(0, |p| p.line());
        let candle = columns
            .parse(&record)
            .map_err(|reason| FormatError::Row { line, reason })?;
        candles.push(candle);
    }

    Ok(candles)
}

/// Header positions of the eight candle columns, in [`CSV_HEADER`] order.
struct Columns([usize; 8]);

impl Columns {
    fn locate(headers: &StringRecord) -> Result<Self, FormatError> {
        let mut positions = [0usize; 8];
        for (slot, name) in positions.iter_mut().zip(CSV_HEADER) {
            *slot = headers
                .iter()
                .position(|h| h == name)
                .ok_or_else(|| FormatError::Row {
                    line: 1,
                    reason: format!("missing column '{name}'"),
                })?;
        }
        Ok(Self(positions))
    }

    fn field<'r>(&self, record: &'r StringRecord, column: usize) -> Result<&'r str, String> {
        record
            .get(self.0[column])
            .ok_or_else(|| format!("missing value for '{}'", CSV_HEADER[column]))
    }

    fn number(&self, record: &StringRecord, column: usize) -> Result<f64, String> {
        let raw = self.field(record, column)?;
        raw.parse()
            .map_err(|_| format!("invalid {} '{raw}'", CSV_HEADER[column]))
    }

    fn parse(&self, record: &StringRecord) -> Result<Candle, String> {
        let time = parse_time(self.field(record, 0)?)?;
        Ok(Candle::new(
            time,
            self.number(record, 1)?,
            self.number(record, 2)?,
            self.number(record, 3)?,
            self.number(record, 4)?,
            self.number(record, 5)?,
            self.number(record, 6)?,
            self.number(record, 7)?,
        ))
    }
}

fn parse_time(raw: &str) -> Result<DateTime<Utc>, String> {
    NaiveDateTime::parse_from_str(raw, TIME_FORMAT)
        .map(|naive| naive.and_utc())
        .or_else(|_| DateTime::parse_from_rfc3339(raw).map(|dt| dt.with_timezone(&Utc)))
        .map_err(|_| format!("invalid time '{raw}'"))
}
