/// Single-point weather report.
///
/// Fetches one point's archive series for a look-back window and
/// summarizes every variable. Unlike the alert scan, a failed fetch here is
/// returned to the caller: there is exactly one point and the user asked
/// for it.

use std::fmt::Write as _;

use crate::analysis::correlation::{classify_correlation, paired_values, pearson, CorrelationSignal};
use crate::analysis::stats::{observation_stats, SeriesStats};
use crate::ingest::open_meteo::{DailySource, Endpoint};
use crate::model::{FetchError, GeoPoint};
use crate::query::LookbackWindow;
use crate::variables::{RAIN_SUM, SURFACE_PRESSURE_MEAN, TEMPERATURE_MAX, WINDSPEED_MAX};

/// Max wind above this (km/h) raises the summary's wind attention flag.
pub const WIND_ATTENTION_KMH: f64 = 50.0;
/// Window rain total above this (mm) raises the rain attention flag.
pub const RAIN_ATTENTION_MM: f64 = 10.0;

#[derive(Debug, Clone, PartialEq)]
pub struct PointReport {
    pub point: GeoPoint,
    pub window: LookbackWindow,
    /// Days present in the response's `time` array.
    pub days_returned: usize,
    pub stats: Vec<SeriesStats>,
    /// Max temperature vs mean surface pressure, when both have data.
    pub correlation: Option<(f64, CorrelationSignal)>,
}

impl PointReport {
    pub fn stats_for(&self, key: &str) -> Option<&SeriesStats> {
        self.stats.iter().find(|s| s.key == key)
    }
}

// ---------------------------------------------------------------------------
// Executive summary
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct ExecutiveSummary {
    pub temperature: Option<SeriesStats>,
    pub wind: Option<SeriesStats>,
    pub pressure: Option<SeriesStats>,
    /// 0 when the wind series is empty.
    pub max_wind: f64,
    /// 0 when the rain series is empty.
    pub total_rain: f64,
    pub wind_attention: bool,
    pub rain_attention: bool,
}

impl ExecutiveSummary {
    pub fn from_report(report: &PointReport) -> Self {
        let wind = report.stats_for(WINDSPEED_MAX).cloned();
        let max_wind = wind.as_ref().map_or(0.0, |w| w.max);
        let total_rain = report
            .stats_for(RAIN_SUM)
            .and_then(|r| r.total)
            .unwrap_or(0.0);

        ExecutiveSummary {
            temperature: report.stats_for(TEMPERATURE_MAX).cloned(),
            wind,
            pressure: report.stats_for(SURFACE_PRESSURE_MEAN).cloned(),
            max_wind,
            total_rain,
            wind_attention: max_wind > WIND_ATTENTION_KMH,
            rain_attention: total_rain > RAIN_ATTENTION_MM,
        }
    }

    pub fn needs_attention(&self) -> bool {
        self.wind_attention || self.rain_attention
    }
}

pub fn render_executive_summary(summary: &ExecutiveSummary) -> String {
    let mut out = String::from("Resumen Ejecutivo
");
    for (title, stats) in [
        ("Temperatura", &summary.temperature),
        ("Viento", &summary.wind),
        ("Presión", &summary.pressure),
    ] {
        match stats {
            Some(s) => {
                let _ = writeln!(
                    out,
                    "  {}: promedio {:.1} {} (mín {:.1}, máx {:.1})",
                    title, s.avg, s.unit, s.min, s.max
                );
            }
            None => {
                let _ = writeln!(out, "  {}: sin datos", title);
            }
        }
    }
    let _ = writeln!(
        out,
        "  Lluvia total: {:.1} mm | Viento máximo: {:.1} km/h",
        summary.total_rain, summary.max_wind
    );
    if summary.wind_attention {
        let _ = writeln!(
            out,
            "⚠️ Atención: vientos fuertes, máximo de {:.1} km/h (> {} km/h)",
            summary.max_wind, WIND_ATTENTION_KMH
        );
    }
    if summary.rain_attention {
        let _ = writeln!(
            out,
            "⚠️ Atención: precipitaciones elevadas, {:.1} mm acumulados (> {} mm)",
            summary.total_rain, RAIN_ATTENTION_MM
        );
    }
    out
}

/// A coordinate picked off the map rather than from the registry.
pub fn manual_point(latitude: f64, longitude: f64) -> GeoPoint {
    GeoPoint {
        id: format!("{:.4},{:.4}", latitude, longitude),
        latitude,
        longitude,
        name: Some(format!("Punto [{:.6}, {:.6}]", latitude, longitude)),
        route: None,
    }
}

pub fn build_point_report<S: DailySource>(
    source: &S,
    point: &GeoPoint,
    window: LookbackWindow,
) -> Result<PointReport, FetchError> {
    let observation = source.fetch_daily(point, window.start, window.end, Endpoint::Archive)?;

    let correlation = match (
        observation.series.get(TEMPERATURE_MAX),
        observation.series.get(SURFACE_PRESSURE_MEAN),
    ) {
        (Some(temp), Some(pressure)) => {
            let (x, y) = paired_values(temp, pressure);
            (x.len() >= 2).then(|| {
                let r = pearson(&x, &y);
                (r, classify_correlation(r))
            })
        }
        _ => None,
    };

    Ok(PointReport {
        point: point.clone(),
        window,
        days_returned: observation.dates.len(),
        stats: observation_stats(&observation),
        correlation,
    })
}

/// Plain-text rendering for the terminal.
pub fn render_point_report(report: &PointReport) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", report.point.label());
    let _ = writeln!(
        out,
        "Desde {} hasta {} en [{:.6}, {:.6}] ({} días)",
        report.window.start,
        report.window.end,
        report.point.latitude,
        report.point.longitude,
        report.days_returned
    );

    if report.stats.is_empty() {
        let _ = writeln!(out, "Sin datos numéricos en la respuesta.");
    }
    for s in &report.stats {
        let _ = write!(
            out,
            "{} ({}) → Promedio: {:.1} {} | Mín: {:.1} {} | Máx: {:.1} {}",
            s.label, s.unit, s.avg, s.unit, s.min, s.unit, s.max, s.unit
        );
        if let Some(total) = s.total {
            let _ = write!(out, " | Total: {:.1} {}", total, s.unit);
        }
        out.push('\n');
    }

    if let Some((r, signal)) = report.correlation {
        let marker = if signal.is_alert() { "⚠️ " } else { "" };
        let _ = writeln!(out, "{}Temperatura máx. vs presión: r = {:.2} ({})", marker, r, signal);
    }

    out.push('\n');
    out.push_str(&render_executive_summary(&ExecutiveSummary::from_report(report)));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::DailyObservation;
    use chrono::NaiveDate;

    struct Canned(Result<DailyObservation, FetchError>);

    impl DailySource for Canned {
        fn fetch_daily(
            &self,
            _point: &GeoPoint,
            _start: NaiveDate,
            _end: NaiveDate,
            endpoint: Endpoint,
        ) -> Result<DailyObservation, FetchError> {
            assert_eq!(endpoint, Endpoint::Archive);
            match &self.0 {
                Ok(obs) => Ok(obs.clone()),
                Err(_) => Err(FetchError::MissingDailyTime),
            }
        }
    }

    fn window() -> LookbackWindow {
        LookbackWindow {
            start: NaiveDate::from_ymd_opt(2025, 2, 1).unwrap(),
            end: NaiveDate::from_ymd_opt(2025, 2, 3).unwrap(),
            days_back: 3,
        }
    }

    fn observation() -> DailyObservation {
        let mut obs = DailyObservation {
            dates: vec![None; 3],
            ..Default::default()
        };
        obs.series.insert(TEMPERATURE_MAX.to_string(), vec![Some(28.0), Some(31.0), Some(34.0)]);
        obs.series
            .insert(SURFACE_PRESSURE_MEAN.to_string(), vec![Some(1015.0), Some(1012.0), Some(1009.0)]);
        obs.series.insert("rain_sum".to_string(), vec![Some(0.0), Some(1.5), Some(0.5)]);
        obs
    }

    #[test]
    fn test_report_summarizes_each_variable() {
        let point = manual_point(-33.45, -70.66);
        let report = build_point_report(&Canned(Ok(observation())), &point, window()).unwrap();

        assert_eq!(report.days_returned, 3);
        let temp = report.stats_for(TEMPERATURE_MAX).expect("temperature stats");
        assert_eq!((temp.min, temp.max, temp.avg), (28.0, 34.0, 31.0));
        assert_eq!(report.stats_for("rain_sum").and_then(|s| s.total), Some(2.0));

        let (r, signal) = report.correlation.expect("both series present");
        assert!(r < -0.99);
        assert_eq!(signal, CorrelationSignal::StrongInverse);
    }

    #[test]
    fn test_fetch_failure_is_returned() {
        let point = manual_point(0.0, 0.0);
        let result = build_point_report(&Canned(Err(FetchError::MissingDailyTime)), &point, window());
        assert_eq!(result, Err(FetchError::MissingDailyTime));
    }

    #[test]
    fn test_render_includes_totals_only_for_cumulative() {
        let point = manual_point(-33.45, -70.66);
        let report = build_point_report(&Canned(Ok(observation())), &point, window()).unwrap();
        let text = render_point_report(&report);

        assert!(text.contains("Punto [-33.450000, -70.660000]"));
        assert!(text.contains("Lluvia Total (mm) → Promedio: 0.7 mm"));
        assert!(text.contains("| Total: 2.0 mm"));
        assert!(!text.contains("Total: 93.0"));
        assert!(text.contains("r = -1.00"));
    }

    fn report_with(wind: &[f64], rain: &[f64]) -> PointReport {
        let mut obs = observation();
        obs.series
            .insert(WINDSPEED_MAX.to_string(), wind.iter().copied().map(Some).collect());
        obs.series
            .insert(RAIN_SUM.to_string(), rain.iter().copied().map(Some).collect());
        build_point_report(&Canned(Ok(obs)), &manual_point(-33.45, -70.66), window()).unwrap()
    }

    #[test]
    fn test_wind_attention_is_strictly_above_fifty() {
        let at_limit = ExecutiveSummary::from_report(&report_with(&[20.0, 50.0, 35.0], &[0.0]));
        assert_eq!(at_limit.max_wind, 50.0);
        assert!(!at_limit.wind_attention);

        let above = ExecutiveSummary::from_report(&report_with(&[20.0, 50.1, 35.0], &[0.0]));
        assert!(above.wind_attention);
        assert!(!above.rain_attention);
    }

    #[test]
    fn test_rain_attention_is_strictly_above_ten() {
        let at_limit = ExecutiveSummary::from_report(&report_with(&[10.0], &[4.0, 6.0]));
        assert_eq!(at_limit.total_rain, 10.0);
        assert!(!at_limit.rain_attention);
        assert!(!at_limit.needs_attention());

        let above = ExecutiveSummary::from_report(&report_with(&[10.0], &[4.0, 6.1]));
        assert!(above.rain_attention);
        assert!(above.needs_attention());
    }

    #[test]
    fn test_summary_carries_temperature_wind_and_pressure() {
        let summary = ExecutiveSummary::from_report(&report_with(&[10.0, 30.0], &[1.0]));
        let temp = summary.temperature.as_ref().unwrap();
        assert_eq!((temp.min, temp.avg, temp.max), (28.0, 31.0, 34.0));
        let wind = summary.wind.as_ref().unwrap();
        assert_eq!((wind.min, wind.avg, wind.max), (10.0, 20.0, 30.0));
        let pressure = summary.pressure.as_ref().unwrap();
        assert_eq!((pressure.min, pressure.max), (1009.0, 1015.0));
    }

    #[test]
    fn test_missing_wind_and_rain_do_not_flag() {
        let mut report =
            build_point_report(&Canned(Ok(observation())), &manual_point(0.0, 0.0), window()).unwrap();
        report.stats.retain(|s| s.key != RAIN_SUM);
        let summary = ExecutiveSummary::from_report(&report);
        assert_eq!(summary.wind, None);
        assert_eq!((summary.max_wind, summary.total_rain), (0.0, 0.0));
        assert!(!summary.needs_attention());
        assert!(render_executive_summary(&summary).contains("Viento: sin datos"));
    }

    #[test]
    fn test_rendered_summary_lists_raised_flags() {
        let text = render_point_report(&report_with(&[72.5], &[8.0, 4.5]));
        assert!(text.contains("Resumen Ejecutivo"));
        assert!(text.contains("Atención: vientos fuertes, máximo de 72.5 km/h (> 50 km/h)"));
        assert!(text.contains("Atención: precipitaciones elevadas, 12.5 mm acumulados (> 10 mm)"));

        let calm = render_point_report(&report_with(&[12.0], &[1.0]));
        assert!(!calm.contains("Atención"));
    }

    #[test]
    fn test_alert_correlation_is_marked() {
        let report = build_point_report(&Canned(Ok(observation())), &manual_point(1.0, 1.0), window()).unwrap();
        assert!(report.correlation.unwrap().1.is_alert());
        assert!(render_point_report(&report).contains("⚠️ Temperatura máx. vs presión"));

        let mut obs = observation();
        obs.series.insert(
            SURFACE_PRESSURE_MEAN.to_string(),
            vec![Some(1012.0), Some(1015.0), Some(1010.0)],
        );
        let normal = build_point_report(&Canned(Ok(obs)), &manual_point(1.0, 1.0), window()).unwrap();
        let (_, signal) = normal.correlation.unwrap();
        assert!(!signal.is_alert());
        let text = render_point_report(&normal);
        assert!(text.contains("Temperatura máx. vs presión"));
        assert!(!text.contains("⚠️ Temperatura"));
    }

    #[test]
    fn test_manual_point_id_is_rounded_coordinates() {
        assert_eq!(manual_point(-33.456789, -70.1).id, "-33.4568,-70.1000");
    }
}
