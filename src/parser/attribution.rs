use once_cell::sync::Lazy;
use regex::Regex;

use crate::domain::place::{Source, SourceKind};

static SAID_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b([A-Z][a-z]+(?:\s+[A-Z][a-z]+)?)\s+(?:said|recommended|suggested|told me|mentioned)")
        .expect("valid regex")
});
static FROM_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)from\s+@?([A-Z][a-z]+(?:\s+[A-Z][a-z]+)?)").expect("valid regex")
});
static ACCORDING_TO_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)according to\s+([A-Z][a-z]+(?:\s+[A-Z][a-z]+)?)").expect("valid regex")
});
static URL_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"https?://\S+").expect("valid regex"));
static MENTION_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"@(\w+)").expect("valid regex"));
static ATTRIBUTION_PREFIX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(?:from\s+)?@?\w+(?:\s+\w+)?\s*(?:said|recommended|suggested|told me|mentioned):\s*")
        .expect("valid regex")
});
static FROM_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^from\s+@?\w+(?:\s+\w+)?:\s*").expect("valid regex"));
static ACCORDING_TO_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^according to\s+\w+(?:\s+\w+)?:\s*").expect("valid regex"));

/// A person's name from common attribution phrasings: "Sarah said",
/// "from @sarah", "according to Sarah".
pub fn extract_source_name(text: &str) -> Option<String> {
    for pattern in [&*SAID_PATTERN, &*FROM_PATTERN, &*ACCORDING_TO_PATTERN] {
        if let Some(captures) = pattern.captures(text) {
            return Some(captures[1].trim().to_string());
        }
    }
    None
}

pub fn extract_url(text: &str) -> Option<String> {
    URL_PATTERN.find(text).map(|m| m.as_str().to_string())
}

pub fn extract_mention(text: &str) -> Option<String> {
    MENTION_PATTERN
        .captures(text)
        .map(|captures| format!("@{}", &captures[1]))
}

/// Classify the source from text clues and (when present) the URL host.
pub fn detect_source_kind(text: &str, url: Option<&str>) -> Option<SourceKind> {
    let lower = text.to_lowercase();

    if MENTION_PATTERN.is_match(text) {
        if lower.contains("instagram") || lower.contains("insta") {
            return Some(SourceKind::Instagram);
        }
        if lower.contains("tiktok") {
            return Some(SourceKind::Tiktok);
        }
        if lower.contains("youtube") {
            return Some(SourceKind::Youtube);
        }
        // A bare @ mention most often means Instagram.
        return Some(SourceKind::Instagram);
    }

    if let Some(url) = url {
        let url = url.to_lowercase();
        if url.contains("instagram.com") {
            return Some(SourceKind::Instagram);
        }
        if url.contains("tiktok.com") {
            return Some(SourceKind::Tiktok);
        }
        if url.contains("youtube.com") || url.contains("youtu.be") {
            return Some(SourceKind::Youtube);
        }
        if url.contains("blog") || url.contains("medium.com") || url.contains("substack.com") {
            return Some(SourceKind::Blog);
        }
    }

    if lower.contains("blog") {
        return Some(SourceKind::Blog);
    }
    if lower.contains("article") {
        return Some(SourceKind::Article);
    }
    if lower.contains("email") {
        return Some(SourceKind::Email);
    }
    if lower.contains("text message") || lower.contains("texted") {
        return Some(SourceKind::Text);
    }
    if lower.contains("friend") || lower.contains("told me") || lower.contains("said") {
        return Some(SourceKind::Friend);
    }
    None
}

/// Build a source from any attribution found in the text, or `None`
/// when there is neither a name nor a URL to attribute to.
pub fn auto_populate_source(text: &str) -> Option<Source> {
    let url = extract_url(text);
    let name = extract_mention(text).or_else(|| extract_source_name(text));
    if name.is_none() && url.is_none() {
        return None;
    }
    let kind = detect_source_kind(text, url.as_deref()).unwrap_or(SourceKind::Other);
    Some(Source {
        kind,
        name: name.unwrap_or_default(),
        url,
    })
}

/// Strip attribution prefixes and bare URLs, leaving only the content.
/// URLs inside `[...]` website markup are kept for the extractor.
pub fn clean_attribution(text: &str) -> String {
    let cleaned = ATTRIBUTION_PREFIX.replace(text, "");
    let cleaned = FROM_PREFIX.replace(&cleaned, "");
    let cleaned = ACCORDING_TO_PREFIX.replace(&cleaned, "");
    strip_bare_urls(&cleaned).trim().to_string()
}

fn strip_bare_urls(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut copied_to = 0;
    for found in URL_PATTERN.find_iter(text) {
        if text[..found.start()].ends_with('[') {
            continue;
        }
        out.push_str(&text[copied_to..found.start()]);
        copied_to = found.end();
    }
    out.push_str(&text[copied_to..]);
    out
}

#[cfg(test)]
mod tests {
    use super::{
        auto_populate_source, clean_attribution, detect_source_kind, extract_mention,
        extract_source_name, extract_url,
    };
    use crate::domain::place::SourceKind;

    #[test]
    fn extracts_names_from_attribution_phrasings() {
        assert_eq!(
            extract_source_name("Sarah said the ramen is great").as_deref(),
            Some("Sarah")
        );
        assert_eq!(
            extract_source_name("from Maria Lopez: try the market").as_deref(),
            Some("Maria Lopez")
        );
        assert_eq!(
            extract_source_name("according to Ken this is the spot").as_deref(),
            Some("Ken")
        );
        assert_eq!(extract_source_name("just a list of places"), None);
    }

    #[test]
    fn mention_defaults_to_instagram() {
        assert_eq!(
            detect_source_kind("@tokyoeats shared this", None),
            Some(SourceKind::Instagram)
        );
        assert_eq!(
            detect_source_kind("@foodie on tiktok", None),
            Some(SourceKind::Tiktok)
        );
    }

    #[test]
    fn url_host_drives_detection() {
        assert_eq!(
            detect_source_kind("watch this", Some("https://youtu.be/abc")),
            Some(SourceKind::Youtube)
        );
        assert_eq!(
            detect_source_kind("read this", Some("https://medium.com/@x/post")),
            Some(SourceKind::Blog)
        );
    }

    #[test]
    fn auto_populate_requires_name_or_url() {
        assert!(auto_populate_source("Ichiran\nAfuri").is_none());

        let source = auto_populate_source("@tokyoeats https://instagram.com/p/1")
            .expect("mention and url present");
        assert_eq!(source.kind, SourceKind::Instagram);
        assert_eq!(source.name, "@tokyoeats");
        assert_eq!(source.url.as_deref(), Some("https://instagram.com/p/1"));
    }

    #[test]
    fn cleaning_strips_prefix_and_urls() {
        assert_eq!(
            clean_attribution("Sarah said: Ichiran https://ichiran.com"),
            "Ichiran"
        );
        assert_eq!(extract_url("no links here"), None);
        assert_eq!(extract_mention("ping @kenji"), Some("@kenji".to_string()));
    }

    #[test]
    fn cleaning_keeps_bracketed_website_markup() {
        assert_eq!(
            clean_attribution("Sarah said: Ichiran [https://ichiran.com] https://maps.example.com/x"),
            "Ichiran [https://ichiran.com]"
        );
    }
}
