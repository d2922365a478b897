use crate::error::TaskError;
use crate::sanitize::sanitize_filename;
use chrono::format::StrftimeItems;
use chrono::{DateTime, Local};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

pub(crate) const SUFFIX_LIMIT: u32 = 10_000;

pub fn synthesize_target(
    date: &DateTime<Local>,
    pattern: &str,
    directory: &Path,
    original_name: &str,
) -> Result<PathBuf, TaskError> {
    let rendered = date
        .format_with_items(StrftimeItems::new(pattern))
        .to_string();
    let base = sanitize_filename(&rendered);
    let extension = Path::new(original_name)
        .extension()
        .map(|ext| format!(".{}", ext.to_string_lossy()))
        .unwrap_or_default();

    let original_lower = original_name.to_lowercase();
    let first = format!("{base}{extension}");
    if first.to_lowercase() == original_lower {
        return Ok(directory.join(original_name));
    }

    let occupied = occupied_names(directory)?;
    let mut candidate = first;
    let mut suffix = 0u32;
    loop {
        // the task's own current name counts as free: landing on it means
        // the file already carries its target name
        if candidate.to_lowercase() == original_lower {
            return Ok(directory.join(original_name));
        }
        if !occupied.contains(&candidate.to_lowercase()) {
            return Ok(directory.join(candidate));
        }
        suffix += 1;
        if suffix > SUFFIX_LIMIT {
            return Err(TaskError::NameSpaceExhausted {
                base,
                limit: SUFFIX_LIMIT,
            });
        }
        candidate = format!("{base}_{suffix}{extension}");
    }
}

fn occupied_names(directory: &Path) -> Result<HashSet<String>, TaskError> {
    let mut names = HashSet::new();
    for entry in fs::read_dir(directory)? {
        let entry = entry?;
        names.insert(entry.file_name().to_string_lossy().to_lowercase());
    }
    Ok(names)
}
