//! Configuration value parsing helpers

use std::time::Duration;

/// Parse a duration string like "500ms", "30s", "2m", "1h30m"
pub fn parse_duration(s: &str) -> Result<Duration, String> {
    let mut total_ms: u64 = 0;
    let mut current_num = String::new();
    let mut chars = s.trim().chars().peekable();

    while let Some(c) = chars.next() {
        if c.is_ascii_digit() {
            current_num.push(c);
            continue;
        }

        let num: u64 = current_num
            .parse()
            .map_err(|_| format!("Invalid number in duration: {}", s))?;
        current_num.clear();

        let unit_ms: u64 = match c {
            'm' if chars.peek() == Some(&'s') => {
                chars.next();
                1
            }
            's' => 1000,
            'm' => 60_000,
            'h' => 3_600_000,
            _ => return Err(format!("Unknown duration unit: {}", c)),
        };
        total_ms = num
            .checked_mul(unit_ms)
            .and_then(|ms| total_ms.checked_add(ms))
            .ok_or_else(|| format!("Duration too large: {}", s))?;
    }

    if !current_num.is_empty() {
        return Err(format!("Missing unit in duration: {}", s));
    }
    if total_ms == 0 {
        return Err(format!("Invalid duration: {}", s));
    }

    Ok(Duration::from_millis(total_ms))
}

/// Check that a language code looks like an ISO 639-1 code ("en", "hi").
pub fn validate_language_code(code: &str) -> Result<(), String> {
    if code.len() == 2 && code.chars().all(|c| c.is_ascii_lowercase()) {
        Ok(())
    } else {
        Err(format!("Invalid language code: {:?}. Expected two lowercase letters", code))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_duration() {
        assert_eq!(parse_duration("500ms").unwrap(), Duration::from_millis(500));
        assert_eq!(parse_duration("30s").unwrap(), Duration::from_secs(30));
        assert_eq!(parse_duration("5m").unwrap(), Duration::from_secs(300));
        assert_eq!(parse_duration("1h").unwrap(), Duration::from_secs(3600));
        assert_eq!(parse_duration("1h30m").unwrap(), Duration::from_secs(5400));
        assert_eq!(parse_duration("1s250ms").unwrap(), Duration::from_millis(1250));
    }

    #[test]
    fn test_parse_duration_errors() {
        assert!(parse_duration("").is_err());
        assert!(parse_duration("0s").is_err());
        assert!(parse_duration("10").is_err());
        assert!(parse_duration("3d").is_err());
        assert!(parse_duration("s").is_err());
    }

    #[test]
    fn test_parse_duration_overflow() {
        let err = parse_duration("18446744073709551615h").unwrap_err();
        assert!(err.contains("too large"), "{err}");
        let err = parse_duration("18446744073709551615ms1ms").unwrap_err();
        assert!(err.contains("too large"), "{err}");
    }

    #[test]
    fn test_validate_language_code() {
        assert!(validate_language_code("en").is_ok());
        assert!(validate_language_code("EN").is_err());
        assert!(validate_language_code("eng").is_err());
        assert!(validate_language_code("").is_err());
    }
}
