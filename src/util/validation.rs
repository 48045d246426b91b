use std::fmt::Display;

/// Logs a failed best-effort call and keeps going.
pub fn verbose_result_ok<T, E: Display>(context: impl Display, result: Result<T, E>) -> Option<T> {
    match result {
        Ok(t) => Some(t),
        Err(e) => {
            warn!("{} (error: {})", context, e);
            None
        }
    }
}

pub fn parse_count(raw: &str) -> Option<u32> {
    raw.trim().parse::<u32>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failures_become_none() {
        let failed: Result<u8, String> = Err(String::from("boom"));
        assert_eq!(verbose_result_ok("reacting to message", failed), None);
        assert_eq!(verbose_result_ok("reacting to message", Ok::<u8, String>(3)), Some(3));
    }

    #[test]
    fn counts_must_be_non_negative_integers() {
        assert_eq!(parse_count(" 3 "), Some(3));
        assert_eq!(parse_count("-1"), None);
        assert_eq!(parse_count("1.5"), None);
    }
}
