//! Display formatting for telemetry values.

use serde_json::Value;

use kerminal_core::store::render;

/// How a live value is turned into text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Format {
    /// Strings as-is, everything else as JSON.
    #[default]
    Raw,
    /// Metres, scaled to km or Mm.
    Distance,
    /// Metres per second.
    Speed,
    /// Degrees.
    Angle,
    /// Seconds as `[-]h:mm:ss`.
    Duration,
    /// Fixed number of decimals.
    Fixed(usize),
}

impl Format {
    /// Numeric formats fall back to [`Format::Raw`] for non-numbers.
    pub fn apply(self, value: &Value) -> String {
        let number = value.as_f64();
        match (self, number) {
            (Self::Distance, Some(m)) => fmt_distance(m),
            (Self::Speed, Some(v)) => format!("{v:.1} m/s"),
            (Self::Angle, Some(deg)) => format!("{deg:.2}°"),
            (Self::Duration, Some(secs)) => fmt_duration(secs),
            (Self::Fixed(decimals), Some(n)) => format!("{n:.decimals$}"),
            _ => render(value),
        }
    }
}

/// Format metres compactly: "812.4 m", "74.512 km", "11.400 Mm".
pub fn fmt_distance(metres: f64) -> String {
    let magnitude = metres.abs();
    if magnitude >= 10_000_000.0 {
        format!("{:.3} Mm", metres / 1_000_000.0)
    } else if magnitude >= 10_000.0 {
        format!("{:.3} km", metres / 1_000.0)
    } else {
        format!("{metres:.1} m")
    }
}

/// Format seconds as hours, minutes and seconds: "0:04:05", "-12:00:00".
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::as_conversions
)]
pub fn fmt_duration(secs: f64) -> String {
    if !secs.is_finite() {
        return secs.to_string();
    }
    let sign = if secs < 0.0 { "-" } else { "" };
    let total = secs.abs().floor() as u64;
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let seconds = total % 60;
    format!("{sign}{hours}:{minutes:02}:{seconds:02}")
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    #[test]
    fn distance_scales_with_magnitude() {
        assert_eq!(fmt_distance(812.44), "812.4 m");
        assert_eq!(fmt_distance(74_512.0), "74.512 km");
        assert_eq!(fmt_distance(11_400_000.0), "11.400 Mm");
        assert_eq!(fmt_distance(-20_000.0), "-20.000 km");
    }

    #[test]
    fn duration_is_clock_like() {
        assert_eq!(fmt_duration(245.9), "0:04:05");
        assert_eq!(fmt_duration(-43_200.0), "-12:00:00");
        assert_eq!(fmt_duration(90_061.0), "25:01:01");
    }

    #[test]
    fn non_numbers_render_raw() {
        assert_eq!(Format::Distance.apply(&json!("Kerbin")), "Kerbin");
        assert_eq!(Format::Angle.apply(&json!(null)), "null");
        assert_eq!(Format::Fixed(3).apply(&json!(0.12345)), "0.123");
        assert_eq!(Format::Speed.apply(&json!(2296.04)), "2296.0 m/s");
    }
}
