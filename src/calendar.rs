use jiff::{Timestamp, civil::Date, tz::TimeZone};
use sea_orm::{
    ConnectionTrait, DatabaseConnection, DbErr, FromQueryResult, JsonValue,
    sea_query::{Alias, Asterisk, Expr, Func, Query, SelectStatement},
};
use serde_json::{Map, Value, json};
use tracing::{debug, warn};

use crate::error::{AppError, AppResult};

/// Column names that may carry the movie id, in priority order.
const MOVIE_ID_FIELDS: [&str; 4] = ["movie_id", "movieId", "movieid", "movie"];

const SAMPLE_ROWS: usize = 3;

#[derive(Clone, Debug, PartialEq)]
pub struct CalendarEntry {
    pub date: Date,
    pub movie_id: i64,
    pub quote_en: Option<String>,
    pub quote_pl: Option<String>,
    pub description: Option<String>,
}

impl CalendarEntry {
    /// Maps a raw calendar row onto a typed entry, tolerating the known
    /// spellings of the movie id column.
    pub fn from_row(row: &Value, date: Date) -> AppResult<Self> {
        let fields = row.as_object().cloned().unwrap_or_default();

        let mut movie_id = None;
        for name in MOVIE_ID_FIELDS {
            let Some(value) = fields.get(name).filter(|v| !v.is_null()) else {
                continue;
            };
            match parse_movie_id(value) {
                Some(id) => {
                    if name != MOVIE_ID_FIELDS[0] {
                        debug!(field = name, movie_id = id, "movie id read from fallback column");
                    }
                    movie_id = Some(id);
                    break;
                },
                None => warn!(field = name, value = %value, "unusable movie id value"),
            }
        }

        let Some(movie_id) = movie_id else {
            return Err(AppError::Schema { available_fields: fields.keys().cloned().collect() });
        };

        Ok(Self {
            date,
            movie_id,
            quote_en: text_field(&fields, "quote_en"),
            quote_pl: text_field(&fields, "quote_pl"),
            description: text_field(&fields, "description"),
        })
    }
}

#[derive(Debug)]
pub enum CalendarLookup {
    Found(CalendarEntry),
    /// Nothing matched; carries a debugging payload for the 404 body.
    Missing(Value),
}

pub struct Calendar {
    db: DatabaseConnection,
    table: String,
    scan_limit: u64,
    timezone: TimeZone,
}

impl Calendar {
    pub fn new(db: DatabaseConnection, table: String, scan_limit: u64, timezone: TimeZone) -> Self {
        Self { db, table, scan_limit, timezone }
    }

    /// The current civil date in the calendar's time zone.
    pub fn today(&self) -> Date {
        Timestamp::now().to_zoned(self.timezone.clone()).date()
    }

    pub async fn find_entry(&self, today: Date) -> AppResult<CalendarLookup> {
        let day = today.to_string();

        let (table, rows) = match self.fetch(on_date(&self.table, &day)).await {
            Ok(rows) => (self.table.clone(), rows),
            Err(err) if is_missing_table(&err) => {
                let alternate = alternate_casing(&self.table);
                warn!(table = %self.table, alternate = %alternate, "calendar table not found, trying alternate name");
                let rows = self.fetch(on_date(&alternate, &day)).await?;
                (alternate, rows)
            },
            Err(err) => return Err(err.into()),
        };

        if let Some(row) = first_of(&rows, &day) {
            debug!(table = %table, date = %day, "calendar entry found");
            return CalendarEntry::from_row(row, today).map(CalendarLookup::Found);
        }

        warn!(
            table = %table,
            date = %day,
            limit = self.scan_limit,
            "no calendar row matched by query, scanning table"
        );
        let rows = self.fetch(scan(&table, self.scan_limit)).await?;
        let matching: Vec<Value> =
            rows.iter().filter(|r| self.row_date(r) == Some(today)).cloned().collect();

        if let Some(row) = first_of(&matching, &day) {
            warn!(table = %table, date = %day, "calendar entry found by table scan");
            return CalendarEntry::from_row(row, today).map(CalendarLookup::Found);
        }

        let sample: Vec<Value> = rows
            .iter()
            .take(SAMPLE_ROWS)
            .map(|r| {
                let fields: Vec<&String> =
                    r.as_object().map(|o| o.keys().collect()).unwrap_or_default();
                let date = self.row_date(r).map(|d| d.to_string());
                json!({ "date": date, "fields": fields })
            })
            .collect();

        Ok(CalendarLookup::Missing(json!({
            "date": day,
            "table": table,
            "rows_scanned": rows.len(),
            "sample": sample,
        })))
    }

    fn row_date(&self, row: &Value) -> Option<Date> {
        row.get("date").and_then(|v| normalize_date(v, &self.timezone))
    }

    async fn fetch(&self, query: SelectStatement) -> Result<Vec<JsonValue>, DbErr> {
        let stmt = self.db.get_database_backend().build(&query);
        JsonValue::find_by_statement(stmt).all(&self.db).await
    }
}

fn on_date(table: &str, day: &str) -> SelectStatement {
    Query::select()
        .column(Asterisk)
        .from(Alias::new(table))
        .and_where(
            Expr::expr(Func::cast_as(Expr::col(Alias::new("date")), Alias::new("TEXT"))).eq(day),
        )
        .to_owned()
}

fn scan(table: &str, limit: u64) -> SelectStatement {
    Query::select().column(Asterisk).from(Alias::new(table)).limit(limit).to_owned()
}

fn first_of<'a>(rows: &'a [Value], day: &str) -> Option<&'a Value> {
    if rows.len() > 1 {
        warn!(date = %day, count = rows.len(), "multiple calendar rows for date, using the first");
    }
    rows.first()
}

fn is_missing_table(err: &DbErr) -> bool {
    let msg = err.to_string();
    (msg.contains("relation") && msg.contains("does not exist")) || msg.contains("no such table")
}

fn alternate_casing(table: &str) -> String {
    let mut chars = table.chars();
    match chars.next() {
        Some(c) if c.is_lowercase() => c.to_uppercase().chain(chars).collect(),
        Some(c) => c.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Reads a date column stored as a plain date, a timestamp, a datetime
/// string or epoch milliseconds. Timestamps are read in `tz`, the same zone
/// that decides what "today" is.
pub fn normalize_date(value: &Value, tz: &TimeZone) -> Option<Date> {
    match value {
        Value::String(s) => {
            let s = s.trim();
            if let Ok(ts) = s.parse::<Timestamp>() {
                return Some(ts.to_zoned(tz.clone()).date());
            }
            s.get(..10).and_then(|head| head.parse::<Date>().ok())
        },
        Value::Number(n) => n
            .as_i64()
            .and_then(|ms| Timestamp::from_millisecond(ms).ok())
            .map(|ts| ts.to_zoned(tz.clone()).date()),
        _ => None,
    }
}

fn parse_movie_id(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn text_field(fields: &Map<String, Value>, name: &str) -> Option<String> {
    fields.get(name).and_then(Value::as_str).map(str::to_string)
}
