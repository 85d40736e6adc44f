use crate::errors::Error;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Deserializer};
use std::path::Path;
use url::Url;

/// Current instant in the storage timestamp format
pub fn now_timestamp() -> String {
    format_timestamp(Utc::now())
}

/// Formats an instant as RFC 3339 with microsecond precision
///
/// Fixed-width output keeps lexical ordering of stored timestamps
/// identical to chronological ordering.
pub fn format_timestamp(instant: DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Parses an RFC 3339 timestamp into UTC
///
/// # Errors
///
/// Returns `Error::Validation` when `value` is not RFC 3339
pub fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, Error> {
    DateTime::parse_from_rfc3339(value)
        .map(|parsed| parsed.with_timezone(&Utc))
        .map_err(|e| Error::validation(format!("invalid timestamp '{}': {}", value, e)))
}

/// Lowercased extension of an uploaded file name, if it has one
pub fn file_extension(file_name: &str) -> Option<String> {
    Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty())
        .map(|ext| ext.to_ascii_lowercase())
}

/// Resolves `path` below `base`, keeping any path prefix of the base
///
/// # Errors
///
/// Returns `Error::Config` when `base` is not an absolute URL
pub fn join_url(base: &str, path: &str) -> Result<String, Error> {
    let mut base =
        Url::parse(base).map_err(|e| Error::Config(format!("invalid base URL '{}': {}", base, e)))?;
    if !base.path().ends_with('/') {
        let prefix = format!("{}/", base.path());
        base.set_path(&prefix);
    }
    let joined = base
        .join(path.trim_start_matches('/'))
        .map_err(|e| Error::Config(format!("cannot join '{}' onto '{}': {}", path, base, e)))?;
    Ok(joined.into())
}

/// Serde helper telling an explicit `null` apart from an absent field
///
/// Use with `#[serde(default, deserialize_with = "present")]` on an
/// `Option<Option<T>>`: absent gives `None`, `null` gives `Some(None)`.
pub fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn timestamps_are_fixed_width_and_parse_back() {
        let instant = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let formatted = format_timestamp(instant);
        assert_eq!(formatted, "2024-03-01T12:00:00.000000Z");
        assert_eq!(parse_timestamp(&formatted).unwrap(), instant);
    }

    #[test]
    fn rejects_non_rfc3339() {
        assert!(matches!(
            parse_timestamp("yesterday"),
            Err(Error::Validation(_))
        ));
    }

    #[test]
    fn extension_is_lowercased() {
        assert_eq!(file_extension("Chart.PNG").as_deref(), Some("png"));
        assert_eq!(file_extension("chart"), None);
    }

    #[test]
    fn url_join_collapses_slashes() {
        assert_eq!(
            join_url("http://localhost:5000/", "/uploads/a.png").unwrap(),
            "http://localhost:5000/uploads/a.png"
        );
        assert_eq!(
            join_url("http://localhost:5000", "uploads/a.png").unwrap(),
            "http://localhost:5000/uploads/a.png"
        );
    }

    #[test]
    fn url_join_keeps_base_path_prefix() {
        assert_eq!(
            join_url("https://charts.example/app", "uploads/a.png").unwrap(),
            "https://charts.example/app/uploads/a.png"
        );
    }

    #[test]
    fn url_join_rejects_relative_base() {
        assert!(matches!(
            join_url("charts/app", "uploads/a.png"),
            Err(Error::Config(_))
        ));
    }
}
