//! Diagnostic forecast charts.
//!
//! One chart per variable: the point forecast as a line over a shaded
//! lower/upper band. The file extension picks the backend (`.png` bitmap or
//! `.svg` vector).

use crate::core::calendar::decimal_year;
use crate::error::{PipelineError, PipelineResult};
use crate::pipeline::config::{ChartConfig, VariableSpec};
use crate::pipeline::ForecastSeries;
use plotters::coord::Shift;
use plotters::prelude::*;
use std::ops::Range;
use std::path::Path;

const DEFAULT_COLOR: RGBColor = RGBColor(31, 119, 180);

/// Labels, colour and size of one chart.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartStyle {
    pub title: String,
    /// Legend entry of the forecast line.
    pub legend: String,
    pub x_label: String,
    pub y_label: String,
    pub color: RGBColor,
    pub width: u32,
    pub height: u32,
}

impl ChartStyle {
    /// Style for `variable`, filling unset labels from its name.
    pub fn for_variable(variable: &VariableSpec, chart: &ChartConfig) -> Self {
        Self {
            title: variable
                .title
                .clone()
                .unwrap_or_else(|| format!("{} Forecast", variable.name)),
            legend: format!("{} Forecast", variable.name),
            x_label: chart.x_label.clone(),
            y_label: variable
                .y_label
                .clone()
                .unwrap_or_else(|| variable.name.clone()),
            color: variable
                .color
                .as_deref()
                .and_then(parse_color)
                .unwrap_or(DEFAULT_COLOR),
            width: chart.width,
            height: chart.height,
        }
    }
}

/// Parse a colour name or `#rrggbb`.
pub fn parse_color(text: &str) -> Option<RGBColor> {
    let text = text.trim();
    if let Some(hex) = text.strip_prefix('#') {
        if hex.len() != 6 || !hex.is_ascii() {
            return None;
        }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
        return Some(RGBColor(channel(0)?, channel(2)?, channel(4)?));
    }

    let color = match text.to_ascii_lowercase().as_str() {
        "blue" => DEFAULT_COLOR,
        "orange" => RGBColor(255, 127, 14),
        "green" => RGBColor(44, 160, 44),
        "red" => RGBColor(214, 39, 40),
        "purple" => RGBColor(148, 103, 189),
        "brown" => RGBColor(140, 86, 75),
        "pink" => RGBColor(227, 119, 194),
        "gray" | "grey" => RGBColor(127, 127, 127),
        "olive" => RGBColor(188, 189, 34),
        "cyan" => RGBColor(23, 190, 207),
        "black" => BLACK,
        _ => return None,
    };
    Some(color)
}

/// Plot coordinates of a forecast series.
#[derive(Debug, Clone, PartialEq)]
struct ChartData {
    line: Vec<(f64, f64)>,
    /// Upper bound left to right, then lower bound right to left.
    band: Vec<(f64, f64)>,
    x_range: Range<f64>,
    y_range: Range<f64>,
}

impl ChartData {
    fn from_series(series: &ForecastSeries) -> Option<Self> {
        let points: Vec<_> = series
            .rows
            .iter()
            .map(|r| (decimal_year(r.timestamp), r.forecast, r.lower, r.upper))
            .filter(|(_, f, l, u)| f.is_finite() && l.is_finite() && u.is_finite())
            .collect();
        if points.is_empty() {
            return None;
        }

        let line = points.iter().map(|&(x, f, _, _)| (x, f)).collect();
        let band = points
            .iter()
            .map(|&(x, _, _, u)| (x, u))
            .chain(points.iter().rev().map(|&(x, _, l, _)| (x, l)))
            .collect();

        let (x_min, x_max) = bounds(points.iter().map(|p| p.0));
        let (y_min, y_max) = bounds(points.iter().flat_map(|p| [p.1, p.2, p.3]));
        let y_pad = ((y_max - y_min) * 0.05).max(1e-9);

        Some(Self {
            line,
            band,
            x_range: widen(x_min, x_max, 0.5),
            y_range: widen(y_min - y_pad, y_max + y_pad, 1.0),
        })
    }
}

fn bounds(values: impl Iterator<Item = f64>) -> (f64, f64) {
    values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    })
}

/// Range that is never empty.
fn widen(lo: f64, hi: f64, pad: f64) -> Range<f64> {
    if hi > lo {
        lo..hi
    } else {
        lo - pad..hi + pad
    }
}

/// Render `series` to `destination`, creating its directory if needed.
pub fn render_chart(
    series: &ForecastSeries,
    style: &ChartStyle,
    destination: &Path,
) -> PipelineResult<()> {
    let chart_error = |reason: String| PipelineError::Chart {
        variable: series.variable.clone(),
        reason,
    };

    let data = ChartData::from_series(series)
        .ok_or_else(|| chart_error("no finite values to plot".into()))?;

    if let Some(dir) = destination.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir).map_err(|e| chart_error(e.to_string()))?;
    }

    let ext = destination
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    let size = (style.width, style.height);

    match ext.as_deref() {
        Some("png") => {
            let root = BitMapBackend::new(destination, size).into_drawing_area();
            draw(root, &data, style)
        }
        Some("svg") => {
            let root = SVGBackend::new(destination, size).into_drawing_area();
            draw(root, &data, style)
        }
        _ => Err(format!(
            "unsupported chart format '{}' (use .png or .svg)",
            destination.display()
        )),
    }
    .map_err(chart_error)?;

    tracing::info!(variable = %series.variable, path = %destination.display(), "chart written");
    Ok(())
}

fn draw<DB: DrawingBackend>(
    root: DrawingArea<DB, Shift>,
    data: &ChartData,
    style: &ChartStyle,
) -> Result<(), String> {
    root.fill(&WHITE).map_err(|e| e.to_string())?;

    let mut chart = ChartBuilder::on(&root)
        .caption(&style.title, ("sans-serif", 22))
        .margin(15)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(data.x_range.clone(), data.y_range.clone())
        .map_err(|e| e.to_string())?;

    chart
        .configure_mesh()
        .x_desc(style.x_label.as_str())
        .y_desc(style.y_label.as_str())
        .x_label_formatter(&|x| format!("{x:.0}"))
        .draw()
        .map_err(|e| e.to_string())?;

    chart
        .draw_series(std::iter::once(Polygon::new(
            data.band.clone(),
            style.color.mix(0.2).filled(),
        )))
        .map_err(|e| e.to_string())?;

    let color = style.color;
    chart
        .draw_series(LineSeries::new(
            data.line.iter().copied(),
            color.stroke_width(2),
        ))
        .map_err(|e| e.to_string())?
        .label(style.legend.as_str())
        .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(2)));

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperLeft)
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()
        .map_err(|e| e.to_string())?;

    root.present().map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::ForecastRow;
    use approx::assert_relative_eq;
    use chrono::NaiveDate;

    fn style(name: &str) -> ChartStyle {
        ChartStyle::for_variable(&VariableSpec::new(name, "col"), &ChartConfig::default())
    }

    fn series() -> ForecastSeries {
        ForecastSeries {
            variable: "ET".into(),
            rows: (1..=3)
                .map(|m| ForecastRow {
                    timestamp: NaiveDate::from_ymd_opt(2024, m, 1).unwrap(),
                    forecast: m as f64,
                    lower: m as f64 - 1.0,
                    upper: m as f64 + 1.0,
                })
                .collect(),
        }
    }

    #[test]
    fn parses_names_and_hex() {
        assert_eq!(parse_color("#1f77b4"), Some(RGBColor(31, 119, 180)));
        assert_eq!(parse_color("Green"), Some(RGBColor(44, 160, 44)));
        assert_eq!(parse_color("blue"), parse_color("#1F77B4"));
        assert_eq!(parse_color("#12345"), None);
        assert_eq!(parse_color("chartreuse"), None);
    }

    #[test]
    fn style_defaults_come_from_the_variable_name() {
        let style = style("Snowmelt");
        assert_eq!(style.title, "Snowmelt Forecast");
        assert_eq!(style.legend, "Snowmelt Forecast");
        assert_eq!(style.y_label, "Snowmelt");
        assert_eq!(style.color, DEFAULT_COLOR);
        assert_eq!((style.width, style.height), (1000, 400));
    }

    #[test]
    fn legend_names_the_variable_under_a_custom_title() {
        let mut spec = VariableSpec::new("Precip", "col");
        spec.title = Some("Monthly Precipitation Outlook".into());
        let style = ChartStyle::for_variable(&spec, &ChartConfig::default());
        assert_eq!(style.title, "Monthly Precipitation Outlook");
        assert_eq!(style.legend, "Precip Forecast");
    }

    #[test]
    fn band_goes_out_along_upper_and_back_along_lower() {
        let data = ChartData::from_series(&series()).unwrap();
        assert_eq!(data.line.len(), 3);
        assert_eq!(data.band.len(), 6);
        assert_eq!(data.band[0].1, 2.0);
        assert_eq!(data.band[2].1, 4.0);
        assert_eq!(data.band[3].1, 2.0);
        assert_eq!(data.band[5].1, 0.0);
        assert_relative_eq!(data.band[0].0, data.band[5].0);
        assert!(data.y_range.start < 0.0 && data.y_range.end > 4.0);
    }

    #[test]
    fn single_point_still_has_a_range() {
        let mut s = series();
        s.rows.truncate(1);
        s.rows[0].lower = 1.0;
        s.rows[0].upper = 1.0;
        let data = ChartData::from_series(&s).unwrap();
        assert!(data.x_range.end > data.x_range.start);
        assert!(data.y_range.end > data.y_range.start);
    }

    #[test]
    fn empty_series_is_a_chart_error() {
        let empty = ForecastSeries {
            variable: "Precip".into(),
            rows: Vec::new(),
        };
        let style = style("Precip");
        let dir = tempfile::tempdir().unwrap();
        let err = render_chart(&empty, &style, &dir.path().join("p.png")).unwrap_err();
        assert_eq!(err.stage(), "chart");
        assert_eq!(err.variable(), Some("Precip"));
    }

    #[test]
    fn unknown_extension_is_a_chart_error() {
        let style = style("ET");
        let dir = tempfile::tempdir().unwrap();
        let err = render_chart(&series(), &style, &dir.path().join("et.gif")).unwrap_err();
        assert!(err.to_string().contains("unsupported chart format"));
    }

    #[test]
    #[ignore = "requires system fonts"]
    fn renders_svg() {
        let style = style("ET");
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("charts").join("et.svg");
        render_chart(&series(), &style, &path).unwrap();
        let svg = std::fs::read_to_string(&path).unwrap();
        assert!(svg.contains("<svg"));
        assert!(svg.contains("ET Forecast"));
    }
}
