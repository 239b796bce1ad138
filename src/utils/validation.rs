//! URL and input validation utilities

use regex::Regex;
use std::sync::OnceLock;

/// Host allow-list: only the two known video-platform hostnames are
/// accepted, with optional scheme and `www.` prefix.
fn youtube_url_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(https?://)?(www\.)?(youtube\.com|youtu\.be)/.+$").expect("static regex")
    })
}

/// Check if a string is a valid YouTube URL.
pub fn is_valid_youtube_url(url: &str) -> bool {
    youtube_url_re().is_match(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_known_hosts() {
        assert!(is_valid_youtube_url("https://www.youtube.com/watch?v=dQw4w9WgXcQ"));
        assert!(is_valid_youtube_url("https://youtube.com/watch?v=abc123"));
        assert!(is_valid_youtube_url("http://youtu.be/abc123"));
        assert!(is_valid_youtube_url("youtube.com/watch?v=abc123"));
        assert!(is_valid_youtube_url("www.youtube.com/shorts/xyz"));
    }

    #[test]
    fn test_rejects_everything_else() {
        assert!(!is_valid_youtube_url(""));
        assert!(!is_valid_youtube_url("not-a-url"));
        assert!(!is_valid_youtube_url("https://example.com/video"));
        assert!(!is_valid_youtube_url("https://vimeo.com/12345"));
        assert!(!is_valid_youtube_url("https://youtube.com"));
        assert!(!is_valid_youtube_url("ftp://youtube.com/watch?v=abc"));
    }
}
