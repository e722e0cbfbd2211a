use weatherdash_core::{
    CurrentWeather, ForecastDay, Presenter, StatusKind, UnitSystem,
    model::{format_humidity, format_temperature, format_wind},
};

/// Renders the canonical model as plain terminal lines.
#[derive(Debug, Default)]
pub struct TerminalPresenter;

impl Presenter for TerminalPresenter {
    fn show_current(&mut self, weather: &CurrentWeather, units: UnitSystem) {
        println!();
        if !weather.place_name.is_empty() {
            println!("{}", weather.place_name);
        }
        println!("{}", weather.description);
        println!(
            "{} (feels like {})",
            format_temperature(weather.temperature, units),
            format_temperature(weather.feels_like, units)
        );
        println!(
            "Humidity: {}   Wind: {}",
            format_humidity(weather.humidity_pct),
            format_wind(weather.wind_speed, units)
        );
        if let Some(icon) = &weather.icon_ref {
            println!("Icon: {icon}");
        }
    }

    fn show_forecast(&mut self, days: &[ForecastDay], units: UnitSystem) {
        if days.is_empty() {
            return;
        }
        println!();
        for day in days {
            println!(
                "{:<4} {:>6}  {}",
                day.weekday,
                format_temperature(day.max_temperature, units),
                day.description.as_deref().unwrap_or("")
            );
        }
    }

    fn show_recent(&mut self, cities: &[String]) {
        if cities.is_empty() {
            return;
        }
        println!("Recent: {}", cities.join(", "));
    }

    fn status(&mut self, kind: StatusKind, message: &str) {
        match kind {
            StatusKind::Error => eprintln!("{message}"),
            StatusKind::Info | StatusKind::Success => println!("{message}"),
        }
    }
}
