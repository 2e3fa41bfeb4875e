//! Derived weather metrics. Temperatures in °C, humidity in %.

const MAGNUS_A: f64 = 17.271;
const MAGNUS_B: f64 = 237.7;

/// Dew point (Magnus formula).
#[must_use]
pub fn dewpoint(temperature: f64, humidity: f64) -> f64 {
    let gamma = MAGNUS_A * temperature / (MAGNUS_B + temperature) + (humidity / 100.0).ln();
    MAGNUS_B * gamma / (MAGNUS_A - gamma)
}

#[must_use]
pub fn dewpoint_depression(temperature: f64, dewpoint: f64) -> f64 {
    temperature - dewpoint
}

/// Canadian humidex.
#[must_use]
pub fn humidex(temperature: f64, humidity: f64) -> f64 {
    let dewpoint_kelvin = 273.15 + dewpoint(temperature, humidity);
    let vapour_pressure = 6.11 * (5417.7530 * (1.0 / 273.16 - 1.0 / dewpoint_kelvin)).exp();
    temperature + 0.5555 * (vapour_pressure - 10.0)
}

/// Heat index (Rothfusz regression).
#[must_use]
pub fn heat_index(temperature: f64, humidity: f64) -> f64 {
    let t = temperature * 9.0 / 5.0 + 32.0;
    let r = humidity;
    let fahrenheit = -42.379 + 2.049_015_23 * t + 10.143_331_27 * r
        - 0.224_755_41 * t * r
        - 0.006_837_83 * t * t
        - 0.054_817_17 * r * r
        + 0.001_228_74 * t * t * r
        + 0.000_852_82 * t * r * r
        - 0.000_001_99 * t * t * r * r;
    (fahrenheit - 32.0) * 5.0 / 9.0
}
