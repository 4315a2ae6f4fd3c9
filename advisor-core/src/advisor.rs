//! Rule-based recommendations used whenever the generative backend cannot answer.

use crate::model::{Recommendation, WeatherReading};

/// Map a reading to a fixed recommendation. Rules are checked in order and the
/// first match wins.
pub fn fallback(reading: &WeatherReading) -> Recommendation {
    let description = reading.description.to_lowercase();

    let (text, icon) = if description.contains("rain") || reading.precipitation > 0.0 {
        ("It's raining. Don't forget your umbrella!", "umbrella")
    } else if reading.temperature < 10.0 {
        ("It's quite cold. Wear a warm jacket.", "jacket")
    } else if reading.uv_index > 6.0 {
        ("UV levels are high. Apply sunscreen.", "sunglasses")
    } else if reading.temperature > 25.0 {
        ("It's warm outside. Stay hydrated!", "water")
    } else if description.contains("cloud") {
        ("It's a bit cloudy, but a nice day for a walk.", "walk")
    } else {
        ("Enjoy your day!", "sun")
    };

    Recommendation::new(text, icon)
}
