//! Payload extraction from model responses.
//!
//! Text cases are judged on the HTML document they produce, so the website
//! generator needs the HTML pulled out of whatever prose and code fences
//! surround it. Image cases return data-URL payloads that must be decoded
//! to real files and stripped from the stored record.

use base64::Engine as _;
use regex::Regex;
use std::sync::LazyLock;

/// Fenced or bare HTML documents that run to a closing `</html>`.
static HTML_COMPLETE: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?si)```html\n(.*?</html>)\s*\n?```",
        r"(?si)```\n(<!DOCTYPE html>.*?</html>)\s*\n?```",
        r"(?si)(<!DOCTYPE html>.*?</html>)",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

/// Truncated documents: an opening tag with no closing `</html>` in sight.
static HTML_PARTIAL: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?si)```html\n(<!DOCTYPE html>.*?)(?:\n```|$)",
        r"(?si)```html\n(<html.*?)(?:\n```|$)",
        r"(?si)(<!DOCTYPE html>.*)$",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

static DATA_URL_IMAGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"data:image/(jpeg|png|jpg);base64,([A-Za-z0-9+/=]+)").unwrap()
});

static DATA_URL_STRIP: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(data:image/(?:jpeg|png|jpg);base64,)[A-Za-z0-9+/=]{100,}").unwrap()
});

/// Extract an HTML document from a response.
///
/// Returns the document and whether it is complete (ends with `</html>`).
/// Complete documents are preferred; a truncated document is still
/// returned so the website can show partial output.
pub fn extract_html(content: &str) -> Option<(String, bool)> {
    for pattern in HTML_COMPLETE.iter() {
        if let Some(captures) = pattern.captures(content) {
            let html = captures[1].trim().to_string();
            return Some((html, true));
        }
    }

    for pattern in HTML_PARTIAL.iter() {
        if let Some(captures) = pattern.captures(content) {
            let html = captures[1].trim().to_string();
            let complete = html.to_lowercase().trim_end().ends_with("</html>");
            return Some((html, complete));
        }
    }

    None
}

/// A decoded image payload.
pub struct ImagePayload {
    /// File extension ("png" or "jpg")
    pub extension: &'static str,
    pub bytes: Vec<u8>,
}

/// Extract and decode the first base64 data-URL image in a response.
pub fn extract_image(content: &str) -> Option<ImagePayload> {
    let captures = DATA_URL_IMAGE.captures(content)?;
    let extension = match &captures[1] {
        "png" => "png",
        _ => "jpg",
    };
    match base64::engine::general_purpose::STANDARD.decode(&captures[2]) {
        Ok(bytes) => Some(ImagePayload { extension, bytes }),
        Err(e) => {
            tracing::warn!("Failed to decode data-URL image: {e}");
            None
        }
    }
}

/// Replace inline base64 image data with a placeholder.
///
/// Keeps persisted JSON records small; the decoded bytes live in a sibling
/// file instead.
pub fn strip_image_data(content: &str) -> String {
    DATA_URL_STRIP
        .replace_all(content, "$1[image data removed]")
        .into_owned()
}

/// Clean a case name for use in file names.
///
/// Replaces characters invalid on Windows or Linux, normalizes full-width
/// parentheses, trims surrounding spaces and dots, and caps the length.
pub fn sanitize_filename(name: &str) -> String {
    let normalized: String = name
        .chars()
        .map(|c| match c {
            '（' => '(',
            '）' => ')',
            '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*' => '_',
            other => other,
        })
        .collect();
    normalized
        .trim_matches(|c| c == ' ' || c == '.')
        .chars()
        .take(100)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_html_from_fence() {
        let content = "Here you go:\n```html\n<!DOCTYPE html>\n<html><body>hi</body></html>\n```\nEnjoy!";
        let (html, complete) = extract_html(content).unwrap();
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.ends_with("</html>"));
        assert!(complete);
    }

    #[test]
    fn test_extract_html_bare_document() {
        let content = "<!DOCTYPE html><html><head></head><body></body></html>";
        let (html, complete) = extract_html(content).unwrap();
        assert_eq!(html, content);
        assert!(complete);
    }

    #[test]
    fn test_extract_html_truncated() {
        let content = "```html\n<!DOCTYPE html>\n<html><body><div>cut off here";
        let (html, complete) = extract_html(content).unwrap();
        assert!(html.contains("cut off here"));
        assert!(!complete);
    }

    #[test]
    fn test_extract_html_none_for_prose() {
        assert!(extract_html("Sorry, I can't write that page.").is_none());
    }

    #[test]
    fn test_extract_image_png() {
        let bytes = [0x89u8, 0x50, 0x4E, 0x47];
        let b64 = base64::engine::general_purpose::STANDARD.encode(bytes);
        let content = format!("![result](data:image/png;base64,{b64})");
        let payload = extract_image(&content).unwrap();
        assert_eq!(payload.extension, "png");
        assert_eq!(payload.bytes, bytes);
    }

    #[test]
    fn test_extract_image_jpeg_extension() {
        let b64 = base64::engine::general_purpose::STANDARD.encode([1u8, 2, 3]);
        let content = format!("data:image/jpeg;base64,{b64}");
        let payload = extract_image(&content).unwrap();
        assert_eq!(payload.extension, "jpg");
    }

    #[test]
    fn test_extract_image_none_without_data_url() {
        assert!(extract_image("just words").is_none());
    }

    #[test]
    fn test_strip_image_data() {
        let long_b64 = "A".repeat(200);
        let content = format!("before data:image/png;base64,{long_b64} after");
        let stripped = strip_image_data(&content);
        assert!(stripped.contains("[image data removed]"));
        assert!(!stripped.contains(&long_b64));
        assert!(stripped.contains("before"));
        assert!(stripped.contains("after"));
    }

    #[test]
    fn test_strip_keeps_short_data_urls() {
        // Under the 100-char threshold: left alone (likely a test fixture)
        let content = "data:image/png;base64,AAAA";
        assert_eq!(strip_image_data(content), content);
    }

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("a/b\\c:d"), "a_b_c_d");
        assert_eq!(sanitize_filename("（demo）"), "(demo)");
        assert_eq!(sanitize_filename("  spaced.  "), "spaced");
        assert_eq!(sanitize_filename("plain name"), "plain name");
    }

    #[test]
    fn test_sanitize_filename_caps_length() {
        let long = "x".repeat(250);
        assert_eq!(sanitize_filename(&long).len(), 100);
    }
}
