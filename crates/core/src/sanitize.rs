const WINDOWS_RESERVED_NAMES: &[&str] = &[
    "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8",
    "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
];

pub fn sanitize_filename(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        if is_disallowed_char(ch) {
            out.push('_');
        } else {
            out.push(ch);
        }
    }

    let mut out = out.trim_end_matches([' ', '.']).trim().to_string();

    if out.is_empty() {
        out = "untitled".to_string();
    }

    if is_windows_reserved(&out) {
        out.push_str("_file");
    }

    out
}

fn is_disallowed_char(ch: char) -> bool {
    matches!(ch, '\\' | '/' | ':' | '*' | '?' | '"' | '<' | '>' | '|')
        || ch == '\0'
        || ch.is_control()
}

fn is_windows_reserved(value: &str) -> bool {
    let stem = value
        .split('.')
        .next()
        .unwrap_or(value)
        .to_ascii_uppercase();
    WINDOWS_RESERVED_NAMES
        .iter()
        .any(|reserved| reserved == &stem)
}

#[cfg(test)]
mod tests {
    use super::sanitize_filename;

    #[test]
    fn replaces_disallowed_chars_with_underscore() {
        assert_eq!(sanitize_filename("2023/01/01 12:00"), "2023_01_01 12_00");
    }

    #[test]
    fn reserved_device_name_gets_suffix() {
        assert_eq!(sanitize_filename("AUX"), "AUX_file");
    }

    #[test]
    fn empty_result_falls_back_to_untitled() {
        assert_eq!(sanitize_filename("  .."), "untitled");
    }
}
