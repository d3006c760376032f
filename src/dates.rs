//! Date helpers shared by writers
//!
//! MCF dates may carry magic keywords (`$date$`, `$datetime$`, `$year$`) or
//! an SVN `$Date: ...$` keyword that are expanded at write time.

use std::sync::OnceLock;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use regex::Regex;
use serde_json::Value;

use crate::error::{CrosswalkError, Result};

const RFC3339_UTC: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Output granularity for SVN date keywords
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DateFormat {
    #[default]
    Default,
    Year,
}

fn svn_datetime() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\$Date: (\d{4}-\d{2}-\d{2}) (\d{2}:\d{2}:\d{2})").ok())
        .as_ref()
}

fn svn_year() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(.*)\$Date: (\d{4})[^$]*\$(.*)$").ok())
        .as_ref()
}

/// Expand date keywords against the current time
pub fn normalize_datestring(value: &Value, format: DateFormat) -> Result<Value> {
    normalize_datestring_at(value, format, Utc::now())
}

/// Expand date keywords against a given instant
pub fn normalize_datestring_at(
    value: &Value,
    format: DateFormat,
    now: DateTime<Utc>,
) -> Result<Value> {
    let text = match value {
        Value::Number(n) if n.is_u64() && n.to_string().len() == 4 => {
            return Ok(Value::String(n.to_string()))
        }
        Value::String(s) => s.as_str(),
        other => return Ok(other.clone()),
    };

    let invalid = || CrosswalkError::InvalidDate(text.to_string());

    let normalized = match text {
        "$date$" => now.format("%Y-%m-%d").to_string(),
        "$datetime$" => now.format(RFC3339_UTC).to_string(),
        "$year$" => now.format("%Y").to_string(),
        t if t.contains("$year$") => t.replace("$year$", &now.format("%Y").to_string()),
        t if t.contains("$Date") => match format {
            DateFormat::Year => {
                let caps = svn_year().and_then(|re| re.captures(t)).ok_or_else(invalid)?;
                format!("{}{}{}", &caps[1], &caps[2], &caps[3])
            }
            DateFormat::Default => {
                let caps = svn_datetime()
                    .and_then(|re| re.captures(t))
                    .ok_or_else(invalid)?;
                format!("{}T{}", &caps[1], &caps[2])
            }
        },
        t => t.to_string(),
    };
    Ok(Value::String(normalized))
}

/// Expand an MCF date (`YYYY`, `YYYY-MM`, `YYYY-MM-DD`, or a naive
/// `YYYY-MM-DDTHH:MM:SS`) to an RFC 3339 UTC date-time
///
/// Values that already carry an offset are normalised to UTC.
pub fn generate_datetime(value: &Value) -> Option<String> {
    let text = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) if n.to_string().len() == 4 => n.to_string(),
        _ => return None,
    };

    let naive = match text.len() {
        4 => NaiveDate::parse_from_str(&format!("{}-01-01", text), "%Y-%m-%d")
            .ok()?
            .and_hms_opt(0, 0, 0)?,
        7 => NaiveDate::parse_from_str(&format!("{}-01", text), "%Y-%m-%d")
            .ok()?
            .and_hms_opt(0, 0, 0)?,
        10 => NaiveDate::parse_from_str(&text, "%Y-%m-%d")
            .ok()?
            .and_hms_opt(0, 0, 0)?,
        19 => {
            tracing::debug!("date-time without timezone; assuming UTC");
            NaiveDateTime::parse_from_str(&text, "%Y-%m-%dT%H:%M:%S").ok()?
        }
        _ => {
            return DateTime::parse_from_rfc3339(&text)
                .ok()
                .map(|dt| dt.with_timezone(&Utc).format(RFC3339_UTC).to_string())
        }
    };
    Some(naive.and_utc().format(RFC3339_UTC).to_string())
}
