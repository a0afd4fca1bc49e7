//! Turns pasted text (or an already-shaped place list) into a
//! candidate recommendation. Pure over its input; persistence and
//! image resolution happen in the store.

pub mod attribution;
mod categorization;
mod extraction;

pub use categorization::apply_category_intelligence;
pub use extraction::{extract_line_based, extract_structured};

use uuid::Uuid;

use crate::domain::place::{normalize_category, Place};
use crate::domain::recommendation::ParsedRecommendation;
use crate::storage::now_utc_rfc3339;

/// Raw text to parse, or places that already carry their shape (from a
/// structured import) and only need normalization.
pub enum ParseInput {
    Text(String),
    Places(Vec<Place>),
}

/// Parse input into a candidate recommendation for `city`.
///
/// Attribution prefixes ("Sarah said: ...") and bare URLs are stripped
/// from each line first, so they never leak into names or categories.
/// The stripped text then goes through structured extraction, falling
/// back to line-based extraction, then the category intelligence pass.
/// Every place leaves with a stable id and normalized category casing.
/// Places without an explicit source inherit one detected from the raw
/// text's attribution patterns ("Sarah said...", "@handle", a pasted
/// URL).
pub fn parse(city: &str, input: ParseInput, city_id: Option<String>) -> ParsedRecommendation {
    let (mut places, raw_text) = match input {
        ParseInput::Places(places) => {
            let raw_text =
                serde_json::to_string(&places).unwrap_or_else(|_| String::from("[]"));
            (places, raw_text)
        }
        ParseInput::Text(text) => {
            let clean = text.trim().to_string();
            let stripped = clean
                .lines()
                .map(attribution::clean_attribution)
                .collect::<Vec<_>>()
                .join("\n");
            let mut places = extract_structured(&stripped);
            if places.is_empty() {
                places = extract_line_based(&stripped);
            }
            apply_category_intelligence(&mut places);
            (places, clean)
        }
    };

    let detected_source = attribution::auto_populate_source(&raw_text);
    for place in &mut places {
        place.category = normalize_category(&place.category);
        if place.source.is_none() {
            place.source = detected_source.clone();
        }
    }

    let mut categories: Vec<String> = Vec::new();
    for place in &places {
        if !categories.contains(&place.category) {
            categories.push(place.category.clone());
        }
    }

    ParsedRecommendation {
        id: Uuid::now_v7().to_string(),
        city: city.to_string(),
        city_id,
        country: None,
        categories,
        places,
        raw_text,
        date_added: now_utc_rfc3339(),
    }
}
