//! Points of interest as delivered by the remote catalog.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::geo::Coordinates;
use crate::define_id_type;

define_id_type!(i64, SiteId);

/// Display language for the bilingual site content.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    It,
    En,
}

impl Language {
    pub fn code(&self) -> &'static str {
        match self {
            Language::It => "it",
            Language::En => "en",
        }
    }
}

impl FromStr for Language {
    type Err = String;

    /// Accepts ISO codes and a few common spellings ("it", "ita", "italiano", "en", "english").
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "it" | "ita" | "italian" | "italiano" => Ok(Language::It),
            "en" | "eng" | "english" | "inglese" => Ok(Language::En),
            other => Err(format!("Unsupported language: {}", other)),
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Category tag of a site.
///
/// The service sends free-text Italian labels, singular or plural. Known
/// labels collapse onto one variant; anything else is kept verbatim in
/// [`Category::Other`]. Icons and translations live in the presentation
/// layer, keyed by [`Category::label`].
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Category {
    Church,
    Museum,
    Square,
    Theatre,
    Palace,
    Fountain,
    Park,
    Market,
    Castle,
    Monastery,
    Monument,
    Food,
    Other(String),
}

impl Category {
    /// Canonical label, as written back on the wire.
    pub fn label(&self) -> &str {
        match self {
            Category::Church => "chiesa",
            Category::Museum => "museo",
            Category::Square => "piazza",
            Category::Theatre => "teatro",
            Category::Palace => "palazzo",
            Category::Fountain => "fontana",
            Category::Park => "parco",
            Category::Market => "mercato",
            Category::Castle => "castello",
            Category::Monastery => "monastero",
            Category::Monument => "monumento",
            Category::Food => "food",
            Category::Other(label) => label,
        }
    }

    pub fn parse(label: &str) -> Self {
        match label.trim().to_lowercase().as_str() {
            "chiesa" | "chiese" => Category::Church,
            "museo" | "musei" => Category::Museum,
            "piazza" | "piazze" => Category::Square,
            "teatro" | "teatri" | "arena" => Category::Theatre,
            "palazzo" | "palazzi" => Category::Palace,
            "fontana" | "fontane" => Category::Fountain,
            "parco" | "parchi" => Category::Park,
            "mercato" | "mercati" => Category::Market,
            "castello" | "castelli" => Category::Castle,
            "monastero" | "monasteri" => Category::Monastery,
            "monumento" | "monumenti" => Category::Monument,
            "food" => Category::Food,
            _ => Category::Other(label.trim().to_string()),
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, Category::Other(_))
    }
}

impl From<String> for Category {
    fn from(label: String) -> Self {
        Category::parse(&label)
    }
}

impl From<&str> for Category {
    fn from(label: &str) -> Self {
        Category::parse(label)
    }
}

impl From<Category> for String {
    fn from(category: Category) -> Self {
        category.label().to_string()
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A point of interest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Site {
    pub id: SiteId,
    pub name: String,
    /// Short description (Italian)
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description_en: Option<String>,
    /// Long description (Italian)
    #[serde(default)]
    pub detailed_description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detailed_description_en: Option<String>,
    pub category: Category,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_url_it: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_url_en: Option<String>,
}

impl Site {
    pub fn coordinates(&self) -> Coordinates {
        Coordinates::new(self.latitude, self.longitude)
    }

    pub fn description(&self, language: Language) -> &str {
        match (language, &self.description_en) {
            (Language::En, Some(text)) if !text.is_empty() => text,
            _ => &self.description,
        }
    }

    pub fn detailed_description(&self, language: Language) -> &str {
        match (language, &self.detailed_description_en) {
            (Language::En, Some(text)) if !text.is_empty() => text,
            _ => &self.detailed_description,
        }
    }

    /// Audio guide for `language`, falling back to the Italian clip.
    pub fn audio_url(&self, language: Language) -> Option<&str> {
        let preferred = match language {
            Language::It => self.audio_url_it.as_deref(),
            Language::En => self.audio_url_en.as_deref(),
        };
        preferred
            .filter(|url| !url.is_empty())
            .or_else(|| self.audio_url_it.as_deref().filter(|url| !url.is_empty()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn duomo_json() -> &'static str {
        r#"{
            "id": 1,
            "name": "Cattedrale di Sant'Agata",
            "description": "La cattedrale della città",
            "detailedDescription": "Ricostruita dopo il terremoto del 1693",
            "category": "Chiese",
            "latitude": 37.5023,
            "longitude": 15.0875,
            "audioUrlIt": "https://audio.example/duomo-it.mp3",
            "audioUrlEn": ""
        }"#
    }

    #[test]
    fn test_site_deserializes_service_shape() {
        let site: Site = serde_json::from_str(duomo_json()).unwrap();
        assert_eq!(site.id, SiteId::new(1));
        assert_eq!(site.category, Category::Church);
        assert_eq!(site.description_en, None);
        assert_eq!(site.coordinates(), Coordinates::new(37.5023, 15.0875));
    }

    #[test]
    fn test_english_falls_back_to_italian() {
        let site: Site = serde_json::from_str(duomo_json()).unwrap();
        assert_eq!(site.description(Language::En), "La cattedrale della città");
        assert_eq!(
            site.audio_url(Language::En),
            Some("https://audio.example/duomo-it.mp3")
        );
    }

    #[test]
    fn test_english_text_is_used_when_present() {
        let mut site: Site = serde_json::from_str(duomo_json()).unwrap();
        site.detailed_description_en = Some("Rebuilt after the 1693 earthquake".into());
        assert_eq!(
            site.detailed_description(Language::En),
            "Rebuilt after the 1693 earthquake"
        );
        assert_eq!(
            site.detailed_description(Language::It),
            "Ricostruita dopo il terremoto del 1693"
        );
    }

    #[test]
    fn test_category_parsing() {
        assert_eq!(Category::parse("Musei"), Category::Museum);
        assert_eq!(Category::parse("arena"), Category::Theatre);
        assert_eq!(Category::parse(" food "), Category::Food);
        assert_eq!(
            Category::parse("Spiaggia"),
            Category::Other("Spiaggia".to_string())
        );
        assert!(!Category::parse("Spiaggia").is_known());
    }

    #[test]
    fn test_category_serializes_canonical_label() {
        let json = serde_json::to_string(&Category::parse("Chiese")).unwrap();
        assert_eq!(json, "\"chiesa\"");
    }

    #[test]
    fn test_language_from_str() {
        assert_eq!("EN".parse::<Language>().unwrap(), Language::En);
        assert_eq!("italiano".parse::<Language>().unwrap(), Language::It);
        assert!("fr".parse::<Language>().is_err());
    }
}
