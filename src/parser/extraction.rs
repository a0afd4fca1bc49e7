use once_cell::sync::Lazy;
use regex::Regex;

use crate::domain::place::{normalize_category, Place, DEFAULT_CATEGORY};

static CATEGORY_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([^:]+):\s*(.+)$").expect("valid regex"));
static WEBSITE_MARKUP: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[(https?://[^\]]+)\]").expect("valid regex"));
static DESCRIPTION_MARKUP: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\(([^)]+)\)").expect("valid regex"));
static HASHTAG_MARKUP: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"#([a-zA-Z0-9]+)").expect("valid regex"));

/// Extract places from structured text where each line reads
/// `Category: name, name (desc) [url]`. Lines without a colon are
/// skipped; names split on commas and semicolons.
pub fn extract_structured(text: &str) -> Vec<Place> {
    let mut places = Vec::new();
    for line in text.lines() {
        let Some(captures) = CATEGORY_LINE.captures(line) else {
            continue;
        };
        let category = normalize_category(&captures[1]);
        for raw_name in captures[2].split([',', ';']) {
            if let Some(place) = place_from_fragment(raw_name, &category) {
                places.push(place);
            }
        }
    }
    places
}

/// Extract one place per non-empty line, with optional `#category`
/// hashtag, `(description)` and `[url]` markup.
pub fn extract_line_based(text: &str) -> Vec<Place> {
    let mut places = Vec::new();
    for line in text.lines() {
        if line.trim().is_empty() {
            continue;
        }
        let (remainder, category) = match HASHTAG_MARKUP.captures(line) {
            Some(captures) => {
                let category = normalize_category(&captures[1]);
                (HASHTAG_MARKUP.replace(line, "").into_owned(), category)
            }
            None => (line.to_string(), DEFAULT_CATEGORY.to_string()),
        };
        if let Some(place) = place_from_fragment(&remainder, &category) {
            places.push(place);
        }
    }
    places
}

/// Strip `[url]` and `(description)` markup from a fragment and build a
/// place from what remains. A fragment with no name left after the
/// markup is dropped.
fn place_from_fragment(fragment: &str, category: &str) -> Option<Place> {
    let mut name = fragment.trim().to_string();
    let mut website = None;
    let mut description = None;

    if let Some(captures) = WEBSITE_MARKUP.captures(&name) {
        website = Some(captures[1].to_string());
        name = WEBSITE_MARKUP.replace(&name, "").trim().to_string();
    }
    if let Some(captures) = DESCRIPTION_MARKUP.captures(&name) {
        description = Some(captures[1].to_string());
        name = DESCRIPTION_MARKUP.replace(&name, "").trim().to_string();
    }

    if name.is_empty() {
        return None;
    }
    let mut place = Place::new(name, category);
    place.description = description;
    place.website = website;
    Some(place)
}

#[cfg(test)]
mod tests {
    use super::{extract_line_based, extract_structured};

    #[test]
    fn structured_lines_split_on_commas_and_semicolons() {
        let places = extract_structured("Food: Ichiran, Afuri; Sushi Dai\nCoffee: Onibus");
        let names: Vec<&str> = places.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Ichiran", "Afuri", "Sushi Dai", "Onibus"]);
        assert_eq!(places[0].category, "Food");
        assert_eq!(places[3].category, "Coffee");
    }

    #[test]
    fn structured_line_captures_description_and_website() {
        let places =
            extract_structured("Food: Ichiran (best tonkotsu) [https://ichiran.com]");
        assert_eq!(places.len(), 1);
        assert_eq!(places[0].name, "Ichiran");
        assert_eq!(places[0].description.as_deref(), Some("best tonkotsu"));
        assert_eq!(places[0].website.as_deref(), Some("https://ichiran.com"));
    }

    #[test]
    fn line_based_reads_hashtag_category() {
        let places = extract_line_based("Golden Gai #nightlife\nTeamLab Planets");
        assert_eq!(places[0].name, "Golden Gai");
        assert_eq!(places[0].category, "Nightlife");
        assert_eq!(places[1].category, "General");
    }

    #[test]
    fn lines_with_only_markup_are_dropped() {
        let places = extract_line_based("(just a note)\n[https://example.com]\n\nReal Place");
        assert_eq!(places.len(), 1);
        assert_eq!(places[0].name, "Real Place");
    }

    #[test]
    fn plain_text_is_not_structured() {
        assert!(extract_structured("Ichiran\nAfuri").is_empty());
    }
}
