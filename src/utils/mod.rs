use url::Url;

/// Host markers accepted by the URL validator
const SUPPORTED_HOSTS: &[&str] = &["youtube.com", "youtu.be"];

/// Longest filename stem we will emit, in bytes
const MAX_STEM_LEN: usize = 120;

/// Stem used when a title cannot be fetched or sanitizes to nothing
pub const FALLBACK_STEM: &str = "video";

/// Sanitize a video title for safe filesystem usage
///
/// Keeps ASCII alphanumerics plus ` -_.()` and drops everything else.
/// The result is trimmed and capped; an empty result falls back to
/// [`FALLBACK_STEM`] so the caller always gets a usable stem.
pub fn sanitize_title(title: &str) -> String {
    let cleaned: String = title
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, ' ' | '-' | '_' | '.' | '(' | ')'))
        .take(MAX_STEM_LEN)
        .collect();

    let cleaned = cleaned.trim();
    if cleaned.is_empty() {
        FALLBACK_STEM.to_string()
    } else {
        cleaned.to_string()
    }
}

/// Check whether a string is a well-formed URL for a supported platform
///
/// Syntactic check only: the string must parse as an http(s) URL whose
/// host carries a recognized platform marker. Malformed strings return
/// false rather than erroring.
pub fn is_supported_url(url: &str) -> bool {
    let Ok(parsed) = Url::parse(url) else {
        return false;
    };

    if !matches!(parsed.scheme(), "http" | "https") {
        return false;
    }

    match parsed.host_str() {
        Some(host) => SUPPORTED_HOSTS
            .iter()
            .any(|marker| host == *marker || host.ends_with(&format!(".{}", marker))),
        None => false,
    }
}

/// Extract domain from URL for display purposes
pub fn extract_domain(url: &str) -> Option<String> {
    Url::parse(url).ok()?.host_str().map(|host| {
        if let Some(stripped) = host.strip_prefix("www.") {
            stripped.to_string()
        } else {
            host.to_string()
        }
    })
}

/// Format duration in human-readable format
pub fn format_duration(seconds: f64) -> String {
    let total_seconds = seconds as u64;
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let secs = total_seconds % 60;

    if hours > 0 {
        format!("{}h {}m {}s", hours, minutes, secs)
    } else if minutes > 0 {
        format!("{}m {}s", minutes, secs)
    } else {
        format!("{}s", secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_title_drops_disallowed() {
        assert_eq!(sanitize_title("My Video!!"), "My Video");
        assert_eq!(sanitize_title("a/b\\c:d*e?f"), "abcdef");
        assert_eq!(sanitize_title("Song (Live) - Part_1.v2"), "Song (Live) - Part_1.v2");
    }

    #[test]
    fn test_sanitize_title_idempotent() {
        for s in ["My Video!!", "  spaced  ", "çà-va", "plain name 42"] {
            let once = sanitize_title(s);
            assert_eq!(sanitize_title(&once), once);
        }
    }

    #[test]
    fn test_sanitize_title_fallback() {
        assert_eq!(sanitize_title(""), FALLBACK_STEM);
        assert_eq!(sanitize_title("!!!???"), FALLBACK_STEM);
        assert_eq!(sanitize_title("日本語のタイトル"), FALLBACK_STEM);
    }

    #[test]
    fn test_sanitize_title_caps_length() {
        let long = "a".repeat(500);
        assert_eq!(sanitize_title(&long).len(), 120);
    }

    #[test]
    fn test_is_supported_url() {
        assert!(is_supported_url("https://youtu.be/abc123"));
        assert!(is_supported_url("https://www.youtube.com/watch?v=abc123"));
        assert!(is_supported_url("http://m.youtube.com/watch?v=abc123"));
        assert!(!is_supported_url("https://example.com/x"));
        assert!(!is_supported_url("not a url"));
        assert!(!is_supported_url("ftp://youtube.com/x"));
        assert!(!is_supported_url("https://notyoutube.com/x"));
        assert!(!is_supported_url(""));
    }

    #[test]
    fn test_extract_domain() {
        assert_eq!(
            extract_domain("https://www.youtube.com/watch?v=123"),
            Some("youtube.com".to_string())
        );
        assert_eq!(extract_domain("https://youtu.be/abc"), Some("youtu.be".to_string()));
        assert_eq!(extract_domain("invalid-url"), None);
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(30.0), "30s");
        assert_eq!(format_duration(90.0), "1m 30s");
        assert_eq!(format_duration(3661.0), "1h 1m 1s");
    }
}
