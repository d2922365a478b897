use crate::exif_reader::read_embedded_date;
use crate::heic_reader::read_heic_date;
use crate::metadata::{ResolvedTimestamp, TimestampSource};
use chrono::{DateTime, Local};
use log::warn;
use std::fs;
use std::path::Path;

const CONTAINER_EXTENSIONS: &[&str] = &["heic", "heif"];

pub fn resolve_timestamp(path: &Path) -> Option<ResolvedTimestamp> {
    if has_container_extension(path) {
        match read_heic_date(path) {
            Ok(date) => {
                return Some(ResolvedTimestamp {
                    source: TimestampSource::HeicContainer,
                    date,
                })
            }
            Err(err) => warn!(
                "HEICメタデータを読めませんでした: {}: {err:#}",
                path.display()
            ),
        }
    }

    match read_embedded_date(path) {
        Ok(date) => {
            return Some(ResolvedTimestamp {
                source: TimestampSource::EmbeddedExif,
                date,
            })
        }
        Err(err) => warn!(
            "EXIFメタデータを読めませんでした: {}: {err:#}",
            path.display()
        ),
    }

    file_modified_to_local(path).map(|date| ResolvedTimestamp {
        source: TimestampSource::FileModified,
        date,
    })
}

fn has_container_extension(path: &Path) -> bool {
    path.extension()
        .map(|ext| {
            let ext = ext.to_string_lossy();
            CONTAINER_EXTENSIONS
                .iter()
                .any(|candidate| ext.eq_ignore_ascii_case(candidate))
        })
        .unwrap_or(false)
}

fn file_modified_to_local(path: &Path) -> Option<DateTime<Local>> {
    let time = fs::metadata(path).ok()?.modified().ok()?;
    Some(DateTime::from(time))
}
