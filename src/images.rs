//! Image resolution for places that arrive without one. The provider
//! seam exists so a search-backed implementation can replace the
//! static placeholders without touching the stores.

/// Resolves an image URL for a place. Implementations may hit an
/// external search service; failures degrade to the category
/// placeholder rather than erroring.
pub trait ImageProvider {
    fn image_for(&self, name: &str, category: &str) -> String;
}

/// Static category placeholders; the default provider.
#[derive(Debug, Default, Clone, Copy)]
pub struct PlaceholderImages;

impl ImageProvider for PlaceholderImages {
    fn image_for(&self, _name: &str, category: &str) -> String {
        category_placeholder(category).to_string()
    }
}

pub fn category_placeholder(category: &str) -> &'static str {
    match category.to_lowercase().as_str() {
        "food" => {
            "https://images.unsplash.com/photo-1504674900247-0877df9cc836?auto=format&fit=crop&w=800&q=80"
        }
        "accommodation" | "lodging" => {
            "https://images.unsplash.com/photo-1566073771259-6a8506099945?auto=format&fit=crop&w=800&q=80"
        }
        "attractions" => {
            "https://images.unsplash.com/photo-1533929736458-ca588d08c8be?auto=format&fit=crop&w=800&q=80"
        }
        "shopping" => {
            "https://images.unsplash.com/photo-1472851294608-062f824d29cc?auto=format&fit=crop&w=800&q=80"
        }
        "nightlife" => {
            "https://images.unsplash.com/photo-1566417713940-fe7c737a9ef2?auto=format&fit=crop&w=800&q=80"
        }
        "outdoors" => {
            "https://images.unsplash.com/photo-1465146344425-f00d5f5c8f07?auto=format&fit=crop&w=800&q=80"
        }
        _ => {
            "https://images.unsplash.com/photo-1482938289607-e9573fc25ebb?auto=format&fit=crop&w=800&q=80"
        }
    }
}

/// Static header image for well-known cities, with a generic skyline
/// fallback.
pub fn city_image(city: &str) -> &'static str {
    let lower = city.to_lowercase();
    let table: [(&str, &str); 8] = [
        (
            "paris",
            "https://images.unsplash.com/photo-1502602898657-3e91760cbb34?auto=format&fit=crop&w=800&q=80",
        ),
        (
            "rome",
            "https://images.unsplash.com/photo-1529260830199-42c24126f198?auto=format&fit=crop&w=800&q=80",
        ),
        (
            "london",
            "https://images.unsplash.com/photo-1513635269975-59663e0ac1ad?auto=format&fit=crop&w=800&q=80",
        ),
        (
            "new york",
            "https://images.unsplash.com/photo-1496442226666-8d4d0e62e6e9?auto=format&fit=crop&w=800&q=80",
        ),
        (
            "tokyo",
            "https://images.unsplash.com/photo-1540959733332-eab4deabeeaf?auto=format&fit=crop&w=800&q=80",
        ),
        (
            "barcelona",
            "https://images.unsplash.com/photo-1583422409516-2895a77efded?auto=format&fit=crop&w=800&q=80",
        ),
        (
            "bangkok",
            "https://images.unsplash.com/photo-1508009603885-50cf7c579365?auto=format&fit=crop&w=800&q=80",
        ),
        (
            "singapore",
            "https://images.unsplash.com/photo-1525625293386-3f8f99389edd?auto=format&fit=crop&w=800&q=80",
        ),
    ];
    for (needle, url) in table {
        if lower.contains(needle) {
            return url;
        }
    }
    "https://images.unsplash.com/photo-1477959858617-67f85cf4f1df?auto=format&fit=crop&w=800&q=80"
}

#[cfg(test)]
mod tests {
    use super::{category_placeholder, city_image, ImageProvider, PlaceholderImages};

    #[test]
    fn categories_map_case_insensitively() {
        assert_eq!(
            category_placeholder("Food"),
            category_placeholder("food")
        );
        assert_ne!(
            category_placeholder("Food"),
            category_placeholder("Nightlife")
        );
    }

    #[test]
    fn unknown_category_gets_the_generic_placeholder() {
        assert_eq!(
            category_placeholder("Mystery"),
            category_placeholder("")
        );
    }

    #[test]
    fn provider_ignores_the_name_for_placeholders() {
        let provider = PlaceholderImages;
        assert_eq!(
            provider.image_for("Ichiran", "Food"),
            category_placeholder("Food")
        );
    }

    #[test]
    fn known_city_substring_matches() {
        assert_eq!(city_image("Tokyo"), city_image("tokyo, japan"));
        assert_eq!(city_image("Nowhere"), city_image("Elsewhere"));
    }
}
