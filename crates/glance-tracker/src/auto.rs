// Auto-tracked interaction classifiers
//
// Passive, best-effort classification of common interactions into one-shot
// custom events: external link clicks, file downloads, form submissions.
// Classifiers are pure functions over the interaction data; the tracker
// turns their output into record_event calls.

use serde_json::{json, Value};
use url::Url;

/// Extensions that classify a link click as a file download
pub const DOWNLOAD_EXTENSIONS: [&str; 12] = [
    "pdf", "doc", "docx", "xls", "xlsx", "ppt", "pptx", "zip", "rar", "mp3", "mp4", "avi",
];

const LINK_TEXT_LIMIT: usize = 100;

/// An automatically classified interaction
#[derive(Debug, Clone, PartialEq)]
pub enum AutoEvent {
    ExternalLink { url: String, text: String },
    FormSubmit { action: String, method: String },
    FileDownload { url: String, extension: String, filename: String },
}

impl AutoEvent {
    /// Event name used on the wire
    pub fn name(&self) -> &'static str {
        match self {
            AutoEvent::ExternalLink { .. } => "external_link_click",
            AutoEvent::FormSubmit { .. } => "form_submit",
            AutoEvent::FileDownload { .. } => "file_download",
        }
    }

    /// Event data used on the wire
    pub fn data(&self) -> Value {
        match self {
            AutoEvent::ExternalLink { url, text } => json!({"url": url, "text": text}),
            AutoEvent::FormSubmit { action, method } => {
                json!({"action": action, "method": method})
            }
            AutoEvent::FileDownload {
                url,
                extension,
                filename,
            } => json!({"url": url, "extension": extension, "filename": filename}),
        }
    }
}

/// Classify a link click leaving the current host
pub fn external_link(href: &str, text: &str, page_host: &str) -> Option<AutoEvent> {
    let url = Url::parse(href).ok()?;
    let host = url.host_str()?;
    if host.eq_ignore_ascii_case(page_host) {
        return None;
    }
    // Char-based so multibyte link text cannot split a boundary
    let text: String = text.trim().chars().take(LINK_TEXT_LIMIT).collect();
    Some(AutoEvent::ExternalLink {
        url: href.to_string(),
        text,
    })
}

/// Classify a link click as a file download by extension allow-list
pub fn file_download(href: &str) -> Option<AutoEvent> {
    let trimmed = href.split(['?', '#']).next().unwrap_or(href);
    let filename = trimmed.rsplit('/').next().unwrap_or(trimmed);
    let extension = filename.rsplit('.').next()?.to_ascii_lowercase();
    if filename == extension || !DOWNLOAD_EXTENSIONS.contains(&extension.as_str()) {
        return None;
    }
    Some(AutoEvent::FileDownload {
        url: href.to_string(),
        extension,
        filename: filename.to_string(),
    })
}

/// Classify a form submission; a form without an action reports the page path
pub fn form_submit(action: Option<&str>, method: Option<&str>, current_path: &str) -> AutoEvent {
    AutoEvent::FormSubmit {
        action: action
            .filter(|a| !a.is_empty())
            .unwrap_or(current_path)
            .to_string(),
        method: method
            .filter(|m| !m.is_empty())
            .unwrap_or("GET")
            .to_uppercase(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_external_link_detected() {
        let event = external_link("https://other.example.net/page", "  Read more  ", "example.com")
            .expect("external link");
        assert_eq!(event.name(), "external_link_click");
        assert_eq!(event.data()["text"], "Read more");
    }

    #[test]
    fn test_same_host_link_ignored() {
        assert_eq!(
            external_link("https://example.com/about", "About", "example.com"),
            None
        );
        // Relative hrefs never leave the host
        assert_eq!(external_link("/about", "About", "example.com"), None);
    }

    #[test]
    fn test_long_link_text_truncated() {
        let text = "x".repeat(300);
        let event = external_link("https://other.net/", &text, "example.com").unwrap();
        match event {
            AutoEvent::ExternalLink { text, .. } => assert_eq!(text.len(), 100),
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn test_download_by_extension() {
        let event = file_download("https://example.com/files/report.pdf?v=2").expect("download");
        assert_eq!(event.name(), "file_download");
        assert_eq!(event.data()["extension"], "pdf");
        assert_eq!(event.data()["filename"], "report.pdf");
    }

    #[test]
    fn test_non_download_links_ignored() {
        assert_eq!(file_download("https://example.com/about"), None);
        assert_eq!(file_download("https://example.com/photo.jpeg"), None);
    }

    #[test]
    fn test_form_submit_defaults() {
        let event = form_submit(None, None, "/signup");
        assert_eq!(
            event,
            AutoEvent::FormSubmit {
                action: "/signup".to_string(),
                method: "GET".to_string()
            }
        );

        let event = form_submit(Some("/api/subscribe"), Some("post"), "/signup");
        assert_eq!(event.data()["method"], "POST");
    }
}
