//! Weather payload attached to a city record and display helpers

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::city::Unit;

/// Current conditions for one city, in the unit system it was fetched with
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct WeatherPayload {
    /// Provider observation time
    pub observed_at: DateTime<Utc>,
    /// Temperature in °C (metric) or °F (imperial)
    pub temperature: f32,
    /// Apparent ("feels like") temperature, same unit as `temperature`
    pub apparent_temperature: f32,
    /// Relative humidity percentage (0-100)
    pub humidity: u8,
    /// Wind speed in km/h (metric) or mph (imperial)
    pub wind_speed: f32,
    /// Wind direction in degrees (0-360, where 0/360 is North)
    pub wind_direction: u16,
    /// WMO weather code
    pub weather_code: u8,
    pub is_day: bool,
    /// Human-readable description of weather conditions
    pub description: String,
    pub unit: Unit,
}

impl WeatherPayload {
    /// Convert wind direction from degrees to cardinal direction
    #[must_use]
    pub fn wind_direction_to_cardinal(degrees: u16) -> &'static str {
        match degrees {
            0..=11 | 349..=360 => "N",
            12..=33 => "NNE",
            34..=56 => "NE",
            57..=78 => "ENE",
            79..=101 => "E",
            102..=123 => "ESE",
            124..=146 => "SE",
            147..=168 => "SSE",
            169..=191 => "S",
            192..=213 => "SSW",
            214..=236 => "SW",
            237..=258 => "WSW",
            259..=281 => "W",
            282..=303 => "WNW",
            304..=326 => "NW",
            327..=348 => "NNW",
            _ => "Unknown",
        }
    }

    /// Format temperature with unit
    #[must_use]
    pub fn format_temperature(&self) -> String {
        match self.unit {
            Unit::Metric => format!("{:.1}°C", self.temperature),
            Unit::Imperial => format!("{:.1}°F", self.temperature),
        }
    }

    /// Format wind information
    #[must_use]
    pub fn format_wind(&self) -> String {
        let direction = Self::wind_direction_to_cardinal(self.wind_direction);
        match self.unit {
            Unit::Metric => format!("{:.0} km/h {}", self.wind_speed, direction),
            Unit::Imperial => format!("{:.0} mph {}", self.wind_speed, direction),
        }
    }
}

/// Convert a WMO weather code to a human-readable description
#[must_use]
pub fn weather_code_to_description(code: u8) -> &'static str {
    match code {
        0 => "Clear sky",
        1 => "Mainly clear",
        2 => "Partly cloudy",
        3 => "Overcast",
        45 => "Fog",
        48 => "Depositing rime fog",
        51 => "Light drizzle",
        53 => "Moderate drizzle",
        55 => "Dense drizzle",
        56 => "Light freezing drizzle",
        57 => "Dense freezing drizzle",
        61 => "Slight rain",
        63 => "Moderate rain",
        65 => "Heavy rain",
        66 => "Light freezing rain",
        67 => "Heavy freezing rain",
        71 => "Slight snow fall",
        73 => "Moderate snow fall",
        75 => "Heavy snow fall",
        77 => "Snow grains",
        80 => "Slight rain showers",
        81 => "Moderate rain showers",
        82 => "Violent rain showers",
        85 => "Slight snow showers",
        86 => "Heavy snow showers",
        95 => "Thunderstorm",
        96 => "Thunderstorm with slight hail",
        99 => "Thunderstorm with heavy hail",
        _ => "Unknown",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn payload(unit: Unit) -> WeatherPayload {
        WeatherPayload {
            observed_at: Utc::now(),
            temperature: 21.44,
            apparent_temperature: 20.0,
            humidity: 60,
            wind_speed: 12.3,
            wind_direction: 270,
            weather_code: 2,
            is_day: true,
            description: weather_code_to_description(2).to_string(),
            unit,
        }
    }

    #[rstest]
    #[case(0, "N")]
    #[case(45, "NE")]
    #[case(180, "S")]
    #[case(270, "W")]
    #[case(355, "N")]
    #[case(400, "Unknown")]
    fn test_cardinal_directions(#[case] degrees: u16, #[case] expected: &str) {
        assert_eq!(WeatherPayload::wind_direction_to_cardinal(degrees), expected);
    }

    #[test]
    fn test_formatting_follows_unit() {
        assert_eq!(payload(Unit::Metric).format_temperature(), "21.4°C");
        assert_eq!(payload(Unit::Imperial).format_temperature(), "21.4°F");
        assert_eq!(payload(Unit::Metric).format_wind(), "12 km/h W");
        assert_eq!(payload(Unit::Imperial).format_wind(), "12 mph W");
    }

    #[test]
    fn test_weather_code_description() {
        assert_eq!(weather_code_to_description(0), "Clear sky");
        assert_eq!(weather_code_to_description(95), "Thunderstorm");
        assert_eq!(weather_code_to_description(200), "Unknown");
    }
}
