use crate::domain::place::{title_case_words, Place, DEFAULT_CATEGORY};

/// Keyword rules tried in order; only places still in the default
/// category are reclassified, so an explicit category always wins.
struct Rule {
    category: &'static str,
    keywords: &'static [&'static str],
    strip_prefixes: &'static [&'static str],
}

const RULES: [Rule; 6] = [
    Rule {
        category: "Food",
        keywords: &["eat at ", "eat in ", "dining at ", "dine at ", "restaurant"],
        strip_prefixes: &["eat at ", "eat in ", "dining at ", "dine at "],
    },
    Rule {
        category: "Coffee",
        keywords: &["coffee", "café", "cafe"],
        strip_prefixes: &[],
    },
    Rule {
        category: "Attractions",
        keywords: &["visit ", "see ", "museum", "gallery", "monument", "landmark"],
        strip_prefixes: &["visit ", "see "],
    },
    Rule {
        category: "Accommodation",
        keywords: &["hotel", "stay at ", "hostel", "inn", "motel", "lodge"],
        strip_prefixes: &[],
    },
    Rule {
        category: "Nightlife",
        keywords: &["bar", "club", "pub", "lounge"],
        strip_prefixes: &[],
    },
    Rule {
        category: "Shopping",
        keywords: &["shop", "mall", "market", "store"],
        strip_prefixes: &[],
    },
];

/// Reclassify default-category places from context clues in the name.
/// When a verb-phrase prefix matched ("eat at X", "visit X"), the
/// phrase is stripped and the remaining name re-title-cased.
pub fn apply_category_intelligence(places: &mut [Place]) {
    for place in places.iter_mut() {
        if !place.category.eq_ignore_ascii_case(DEFAULT_CATEGORY) {
            continue;
        }
        let lower_name = place.name.to_lowercase();
        for rule in &RULES {
            if !rule.keywords.iter().any(|kw| lower_name.contains(kw)) {
                continue;
            }
            place.category = rule.category.to_string();
            for prefix in rule.strip_prefixes {
                // Offsets must come from the original name: lowercasing
                // can change byte lengths (e.g. 'İ').
                if let Some(start) = find_ascii_insensitive(&place.name, prefix) {
                    let stripped = place.name[start + prefix.len()..].trim();
                    place.name = title_case_words(stripped);
                    break;
                }
            }
            break;
        }
    }
}

/// Byte offset of the first ASCII-case-insensitive match of `needle`
/// in `haystack`. The needles here are all ASCII, so a match start is
/// always a char boundary.
fn find_ascii_insensitive(haystack: &str, needle: &str) -> Option<usize> {
    let haystack = haystack.as_bytes();
    let needle = needle.as_bytes();
    if needle.is_empty() || haystack.len() < needle.len() {
        return None;
    }
    (0..=haystack.len() - needle.len())
        .find(|&start| haystack[start..start + needle.len()].eq_ignore_ascii_case(needle))
}

#[cfg(test)]
mod tests {
    use super::apply_category_intelligence;
    use crate::domain::place::Place;

    fn place(name: &str, category: &str) -> Place {
        Place::new(name, category)
    }

    #[test]
    fn food_verb_phrase_is_stripped_and_recased() {
        let mut places = vec![place("eat at ichiran ramen", "General")];
        apply_category_intelligence(&mut places);
        assert_eq!(places[0].category, "Food");
        assert_eq!(places[0].name, "Ichiran Ramen");
    }

    #[test]
    fn visit_prefix_yields_attraction() {
        let mut places = vec![place("visit senso-ji temple", "General")];
        apply_category_intelligence(&mut places);
        assert_eq!(places[0].category, "Attractions");
        assert_eq!(places[0].name, "Senso-ji Temple");
    }

    #[test]
    fn keyword_without_prefix_keeps_the_name() {
        let mut places = vec![
            place("Onibus Coffee", "General"),
            place("Park Hyatt Hotel", "General"),
            place("Golden Gai bar crawl", "General"),
            place("Nakamise shopping street", "General"),
        ];
        apply_category_intelligence(&mut places);
        assert_eq!(places[0].category, "Coffee");
        assert_eq!(places[0].name, "Onibus Coffee");
        assert_eq!(places[1].category, "Accommodation");
        assert_eq!(places[2].category, "Nightlife");
        assert_eq!(places[3].category, "Shopping");
    }

    #[test]
    fn multibyte_lowercasing_does_not_skew_prefix_offsets() {
        // 'İ' grows by a byte when lowercased; the strip offset must
        // come from the original name, not the lowered copy.
        let mut places = vec![place("İstanbul'da eat at Çiya Sofrası", "General")];
        apply_category_intelligence(&mut places);
        assert_eq!(places[0].category, "Food");
        assert_eq!(places[0].name, "Çiya Sofrası");
    }

    #[test]
    fn mixed_case_prefixes_are_still_stripped() {
        let mut places = vec![place("EAT AT Narisawa", "General")];
        apply_category_intelligence(&mut places);
        assert_eq!(places[0].category, "Food");
        assert_eq!(places[0].name, "Narisawa");
    }

    #[test]
    fn explicit_category_is_never_overridden() {
        let mut places = vec![place("Museum of Sweets", "Food")];
        apply_category_intelligence(&mut places);
        assert_eq!(places[0].category, "Food");
        assert_eq!(places[0].name, "Museum of Sweets");
    }

    #[test]
    fn first_matching_rule_wins() {
        // "restaurant bar" hits the food rule before nightlife.
        let mut places = vec![place("Sky Restaurant Bar", "General")];
        apply_category_intelligence(&mut places);
        assert_eq!(places[0].category, "Food");
    }
}
