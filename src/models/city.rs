//! City candidates, records and bilingual text

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::location::Coordinates;
use super::weather::WeatherPayload;

/// The two display languages a city is resolved in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    En,
    He,
}

impl Locale {
    /// The language tag sent to providers
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::En => "en",
            Self::He => "he",
        }
    }

    /// The other locale of the pair
    #[must_use]
    pub fn other(self) -> Self {
        match self {
            Self::En => Self::He,
            Self::He => Self::En,
        }
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Text in both locales. An empty entry means "not resolved in that language".
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LocalizedText {
    #[serde(default)]
    pub en: String,
    #[serde(default)]
    pub he: String,
}

impl LocalizedText {
    #[must_use]
    pub fn new(en: impl Into<String>, he: impl Into<String>) -> Self {
        Self {
            en: en.into(),
            he: he.into(),
        }
    }

    /// Text with only one locale populated
    #[must_use]
    pub fn single(locale: Locale, text: impl Into<String>) -> Self {
        let mut value = Self::default();
        *value.get_mut(locale) = text.into();
        value
    }

    #[must_use]
    pub fn get(&self, locale: Locale) -> &str {
        match locale {
            Locale::En => &self.en,
            Locale::He => &self.he,
        }
    }

    pub fn get_mut(&mut self, locale: Locale) -> &mut String {
        match locale {
            Locale::En => &mut self.en,
            Locale::He => &mut self.he,
        }
    }

    #[must_use]
    pub fn has(&self, locale: Locale) -> bool {
        !self.get(locale).trim().is_empty()
    }

    /// At least one locale is populated
    #[must_use]
    pub fn is_resolved(&self) -> bool {
        self.has(Locale::En) || self.has(Locale::He)
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.has(Locale::En) && self.has(Locale::He)
    }

    /// Text for `locale`, or the other locale when that one is still empty
    #[must_use]
    pub fn display(&self, locale: Locale) -> &str {
        if self.has(locale) {
            self.get(locale)
        } else {
            self.get(locale.other())
        }
    }
}

/// Place types accepted from the geocoder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultType {
    City,
    Town,
    Village,
    Locality,
    District,
    Municipality,
    Suburb,
    StateDistrict,
}

impl ResultType {
    /// Parse a provider `result_type`; anything outside the allow-list is `None`
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "city" => Some(Self::City),
            "town" => Some(Self::Town),
            "village" => Some(Self::Village),
            "locality" => Some(Self::Locality),
            "district" => Some(Self::District),
            "municipality" => Some(Self::Municipality),
            "suburb" => Some(Self::Suburb),
            "state_district" => Some(Self::StateDistrict),
            _ => None,
        }
    }

    /// Cities and municipalities outrank smaller settlements
    #[must_use]
    pub fn is_major(self) -> bool {
        matches!(self, Self::City | Self::Municipality)
    }
}

/// Measurement system the weather of a city is displayed in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Unit {
    #[default]
    Metric,
    Imperial,
}

/// An unconfirmed search result, not yet guaranteed to be bilingual
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CityCandidate {
    pub id: String,
    pub coords: Coordinates,
    pub city: LocalizedText,
    pub country: LocalizedText,
    pub result_type: ResultType,
}

/// A resolved city owned by the caller, with weather once it has been fetched
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CityRecord {
    pub id: String,
    pub coords: Coordinates,
    pub city: LocalizedText,
    pub country: LocalizedText,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result_type: Option<ResultType>,
    #[serde(default)]
    pub unit: Unit,
    #[serde(default)]
    pub last_updated: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weather: Option<WeatherPayload>,
}

impl CityRecord {
    /// Record with names only; weather is attached later by the caller
    #[must_use]
    pub fn new(id: String, coords: Coordinates, city: LocalizedText, country: LocalizedText) -> Self {
        Self {
            id,
            coords,
            city,
            country,
            result_type: None,
            unit: Unit::default(),
            last_updated: None,
            weather: None,
        }
    }

    #[must_use]
    pub fn with_unit(mut self, unit: Unit) -> Self {
        self.unit = unit;
        self
    }

    /// "City, Country" in the requested locale, falling back per field
    #[must_use]
    pub fn label(&self, locale: Locale) -> String {
        let city = self.city.display(locale);
        let country = self.country.display(locale);
        if country.is_empty() {
            city.to_string()
        } else {
            format!("{city}, {country}")
        }
    }
}

impl From<CityCandidate> for CityRecord {
    fn from(candidate: CityCandidate) -> Self {
        Self {
            result_type: Some(candidate.result_type),
            ..Self::new(candidate.id, candidate.coords, candidate.city, candidate.country)
        }
    }
}
