use anyhow::{Context, Result};
use chrono::{DateTime, Local, NaiveDateTime, TimeZone};
use exif::{In, Reader, Tag, Value};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

const DATE_TAGS: &[Tag] = &[Tag::DateTimeOriginal, Tag::DateTimeDigitized, Tag::DateTime];

pub fn read_embedded_date(path: &Path) -> Result<DateTime<Local>> {
    let file = File::open(path)
        .with_context(|| format!("EXIF読み込み対象を開けませんでした: {}", path.display()))?;
    let mut buf = BufReader::new(file);
    let exif = Reader::new()
        .read_from_container(&mut buf)
        .with_context(|| format!("EXIFを解析できませんでした: {}", path.display()))?;

    date_from_exif(&exif)
        .with_context(|| format!("撮影日時タグが見つかりませんでした: {}", path.display()))
}

pub(crate) fn date_from_exif(exif: &exif::Exif) -> Option<DateTime<Local>> {
    let field = DATE_TAGS
        .iter()
        .find_map(|tag| exif.get_field(*tag, In::PRIMARY))?;

    let raw = match &field.value {
        Value::Ascii(components) if !components.is_empty() => {
            String::from_utf8(components[0].clone()).ok()
        }
        _ => None,
    }
    .unwrap_or_else(|| field.display_value().to_string());

    parse_exif_date(&raw)
}

pub(crate) fn parse_exif_date(input: &str) -> Option<DateTime<Local>> {
    let normalized = input.trim_matches(|c: char| c.is_whitespace() || c == '\0' || c == '"');

    let candidates = [
        "%Y:%m:%d %H:%M:%S",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S%:z",
        "%Y-%m-%dT%H:%M:%S%.f%:z",
    ];

    for fmt in candidates {
        if let Ok(dt) = DateTime::parse_from_str(normalized, fmt) {
            return Some(dt.with_timezone(&Local));
        }
        if let Ok(naive) = NaiveDateTime::parse_from_str(normalized, fmt) {
            if let Some(local) = Local.from_local_datetime(&naive).single() {
                return Some(local);
            }
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::{parse_exif_date, read_embedded_date};
    use crate::test_fixtures::jpeg_with_datetime;
    use chrono::{Datelike, Timelike};
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn parse_exif_date_accepts_colon_format() {
        let parsed = parse_exif_date("2023:06:15 10:30:05").expect("must parse");
        assert_eq!(
            (parsed.year(), parsed.month(), parsed.day()),
            (2023, 6, 15)
        );
        assert_eq!(
            (parsed.hour(), parsed.minute(), parsed.second()),
            (10, 30, 5)
        );
    }

    #[test]
    fn parse_exif_date_accepts_iso_format_and_rejects_garbage() {
        assert!(parse_exif_date("2023-06-15T10:30:05").is_some());
        assert!(parse_exif_date("not a date").is_none());
        assert!(parse_exif_date("").is_none());
    }

    #[test]
    fn reads_datetime_original_from_jpeg() {
        let temp = tempdir().expect("tempdir");
        let path = temp.path().join("IMG_0001.jpg");
        fs::write(&path, jpeg_with_datetime("2023:06:15 10:30:05")).expect("write jpeg");

        let date = read_embedded_date(&path).expect("jpeg exif should be readable");
        assert_eq!((date.year(), date.month(), date.day()), (2023, 6, 15));
    }

    #[test]
    fn fails_on_file_without_exif() {
        let temp = tempdir().expect("tempdir");
        let path = temp.path().join("plain.txt");
        fs::write(&path, b"no metadata here").expect("write file");

        assert!(read_embedded_date(&path).is_err());
    }
}
