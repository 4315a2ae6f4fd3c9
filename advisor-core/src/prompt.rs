use crate::model::WeatherReading;

/// Icons the backend is nudged towards. Not enforced when parsing.
pub const SUGGESTED_ICONS: &[&str] = &["walk", "couch", "umbrella", "sunglasses", "jacket"];

/// Render the instruction sent to the generative backend for one reading.
pub fn build_prompt(reading: &WeatherReading) -> String {
    let icons = SUGGESTED_ICONS
        .iter()
        .map(|icon| format!("\"{icon}\""))
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        "You are a helpful weather assistant. Based on the following weather data, provide a short, \
         friendly recommendation for the day.\n\
         Be specific about what to do or bring based on the conditions (e.g., \"bring an umbrella\" for \
         rain, \"wear sunscreen\" for high UV, \"dress warmly\" for cold).\n\
         Also, suggest a simple icon name that represents the activity (e.g., {icons}).\n\
         \n\
         Weather Data:\n\
         Temperature: {temperature}°C\n\
         Feels Like: {apparent}°C\n\
         Humidity: {humidity}%\n\
         Wind Speed: {wind} km/h\n\
         UV Index: {uv}\n\
         Precipitation: {precipitation} mm\n\
         Pressure: {pressure} hPa\n\
         Description: {description}\n\
         \n\
         Output format:\n\
         Recommendation: [Your recommendation text here]\n\
         Icon: [Icon name]\n",
        temperature = reading.temperature,
        apparent = reading.apparent_temperature,
        humidity = reading.humidity,
        wind = reading.wind_speed,
        uv = reading.uv_index,
        precipitation = reading.precipitation,
        pressure = reading.surface_pressure,
        description = reading.description,
    )
}
