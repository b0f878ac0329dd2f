//! Filling the second language of a city from an independent lookup

use std::future::Future;

use tracing::debug;

use crate::Result;
use crate::models::{CityCandidate, CityRecord, Coordinates, Locale, LocalizedText};

/// Names returned by a fallback-language lookup
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FallbackNames {
    pub name: String,
    pub country: String,
}

/// Anything carrying a bilingual city and country name at some coordinates
pub trait BilingualNames {
    fn coords(&self) -> Coordinates;
    fn city_mut(&mut self) -> &mut LocalizedText;
    fn country_mut(&mut self) -> &mut LocalizedText;
    fn city(&self) -> &LocalizedText;
    fn country(&self) -> &LocalizedText;
}

impl BilingualNames for CityCandidate {
    fn coords(&self) -> Coordinates {
        self.coords
    }
    fn city_mut(&mut self) -> &mut LocalizedText {
        &mut self.city
    }
    fn country_mut(&mut self) -> &mut LocalizedText {
        &mut self.country
    }
    fn city(&self) -> &LocalizedText {
        &self.city
    }
    fn country(&self) -> &LocalizedText {
        &self.country
    }
}

impl BilingualNames for CityRecord {
    fn coords(&self) -> Coordinates {
        self.coords
    }
    fn city_mut(&mut self) -> &mut LocalizedText {
        &mut self.city
    }
    fn country_mut(&mut self) -> &mut LocalizedText {
        &mut self.country
    }
    fn city(&self) -> &LocalizedText {
        &self.city
    }
    fn country(&self) -> &LocalizedText {
        &self.country
    }
}

/// Set `locale`'s city and country, leaving already populated values alone
#[must_use]
pub fn merge_into<T: BilingualNames>(mut record: T, locale: Locale, city: &str, country: &str) -> T {
    fill_slot(record.city_mut(), locale, city);
    fill_slot(record.country_mut(), locale, country);
    record
}

fn fill_slot(text: &mut LocalizedText, locale: Locale, value: &str) {
    let value = value.trim();
    if value.is_empty() || text.has(locale) {
        return;
    }
    *text.get_mut(locale) = value.to_string();
}

/// Populate `fallback_locale` through `fetch_fallback` at the record's
/// coordinates. A failed lookup is not an error: the record keeps a single
/// populated language and stays usable.
pub async fn fill_fallback<T, F, Fut>(record: T, fallback_locale: Locale, fetch_fallback: F) -> T
where
    T: BilingualNames,
    F: FnOnce(Coordinates) -> Fut,
    Fut: Future<Output = Result<FallbackNames>>,
{
    if record.city().has(fallback_locale) && record.country().has(fallback_locale) {
        return record;
    }

    let coords = record.coords();
    match fetch_fallback(coords).await {
        Ok(names) => merge_into(record, fallback_locale, &names.name, &names.country),
        Err(e) => {
            debug!(
                "Fallback {} lookup failed at ({}), keeping single language: {}",
                fallback_locale, coords, e
            );
            record
        }
    }
}
