//! Pipeline configuration: TOML files and built-in presets.

use crate::chart::parse_color;
use crate::core::MonthAnchor;
use crate::error::{PipelineError, PipelineResult};
use crate::models::AdditiveConfig;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Input workbook shared by the built-in presets.
pub const DEFAULT_INPUT: &str = "Input Data for Water Budget Predictions.xlsm";

/// Months forecast by the built-in presets.
pub const DEFAULT_HORIZON_MONTHS: usize = 400;

/// Date column header shared by the built-in presets.
pub const DEFAULT_DATE_COLUMN: &str = "Month-Year";

/// One measured variable: where to read it and how to label it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VariableSpec {
    /// Short name used in output headers (`<name>_forecast`, ...).
    pub name: String,
    /// Header of the input column holding the measurements.
    pub column: String,
    /// Chart title; defaults to `<name> Forecast`.
    #[serde(default)]
    pub title: Option<String>,
    /// Chart y-axis label; defaults to `name`.
    #[serde(default)]
    pub y_label: Option<String>,
    /// Chart colour: a name (`blue`, `green`, ...) or `#rrggbb`.
    #[serde(default)]
    pub color: Option<String>,
}

impl VariableSpec {
    pub fn new(name: impl Into<String>, column: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            column: column.into(),
            title: None,
            y_label: None,
            color: None,
        }
    }
}

/// Image format of rendered charts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartFormat {
    #[default]
    Png,
    Svg,
}

impl ChartFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ChartFormat::Png => "png",
            ChartFormat::Svg => "svg",
        }
    }
}

/// Diagnostic chart settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ChartConfig {
    pub enabled: bool,
    /// Directory for chart files; defaults to the output file's directory.
    pub directory: Option<PathBuf>,
    pub format: ChartFormat,
    pub x_label: String,
    pub width: u32,
    pub height: u32,
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            directory: None,
            format: ChartFormat::Png,
            x_label: "Year".to_string(),
            width: 1000,
            height: 400,
        }
    }
}

/// Everything one pipeline run needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PipelineConfig {
    pub input: PathBuf,
    /// Sheet to read; the first sheet when absent.
    #[serde(default)]
    pub sheet: Option<String>,
    pub horizon_months: usize,
    pub output: PathBuf,
    #[serde(default = "default_date_column")]
    pub date_column: String,
    #[serde(default)]
    pub month_anchor: MonthAnchor,
    pub variables: Vec<VariableSpec>,
    #[serde(default)]
    pub model: AdditiveConfig,
    #[serde(default)]
    pub chart: ChartConfig,
}

fn default_date_column() -> String {
    DEFAULT_DATE_COLUMN.to_string()
}

/// Built-in configurations matching the workbook layouts in use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Preset {
    /// Evapotranspiration and precipitation from the `ET_and_Precip` sheet.
    EtPrecip,
    /// Volumetric snowmelt from the `Snowmelt` sheet.
    Snowmelt,
}

impl Preset {
    pub const ALL: [Preset; 2] = [Preset::EtPrecip, Preset::Snowmelt];

    pub fn name(&self) -> &'static str {
        match self {
            Preset::EtPrecip => "et-precip",
            Preset::Snowmelt => "snowmelt",
        }
    }

    pub fn from_name(name: &str) -> PipelineResult<Self> {
        Self::ALL
            .into_iter()
            .find(|p| p.name() == name)
            .ok_or_else(|| {
                PipelineError::Config(format!(
                    "unknown preset '{name}' (expected one of: et-precip, snowmelt)"
                ))
            })
    }

    pub fn config(&self) -> PipelineConfig {
        let (sheet, output, variables) = match self {
            Preset::EtPrecip => (
                "ET_and_Precip",
                "Monthly_ET_and_Precip_Predictions.xlsx",
                vec![
                    VariableSpec {
                        title: Some("Long-Term Evapotranspiration Forecast".into()),
                        y_label: Some("ET (mm)".into()),
                        color: Some("#1f77b4".into()),
                        ..VariableSpec::new("ET", "Monthly Evapotranspiration Estimates (ET) (mm)")
                    },
                    VariableSpec {
                        title: Some("Long-Term Precipitation Forecast".into()),
                        y_label: Some("Precipitation (mm)".into()),
                        color: Some("green".into()),
                        ..VariableSpec::new("Precip", "Monthly Precipitation Estimates (mm)")
                    },
                ],
            ),
            Preset::Snowmelt => (
                "Snowmelt",
                "Monthly_Snowmelt_Predictions.xlsx",
                vec![VariableSpec {
                    title: Some("Long-Term Snowmelt Forecast".into()),
                    y_label: Some("Snowmelt (m^3)".into()),
                    color: Some("#1f77b4".into()),
                    ..VariableSpec::new(
                        "Snowmelt",
                        "Sum of Volumetric Snowmelt Per Month (m^3/month)",
                    )
                }],
            ),
        };

        let mut chart = ChartConfig::default();
        if *self == Preset::Snowmelt {
            chart.x_label = "Date".to_string();
        }

        PipelineConfig {
            input: PathBuf::from(DEFAULT_INPUT),
            sheet: Some(sheet.to_string()),
            horizon_months: DEFAULT_HORIZON_MONTHS,
            output: PathBuf::from(output),
            date_column: default_date_column(),
            month_anchor: MonthAnchor::Start,
            variables,
            model: AdditiveConfig::default(),
            chart,
        }
    }
}

impl PipelineConfig {
    /// Parse a TOML document and validate it.
    pub fn from_toml_str(text: &str) -> PipelineResult<Self> {
        let config: Self =
            toml::from_str(text).map_err(|e| PipelineError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML file.
    pub fn load(path: &Path) -> PipelineResult<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| PipelineError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&text)
    }

    /// Render as TOML.
    pub fn to_toml_string(&self) -> PipelineResult<String> {
        toml::to_string_pretty(self).map_err(|e| PipelineError::Config(e.to_string()))
    }

    pub fn validate(&self) -> PipelineResult<()> {
        if self.variables.is_empty() {
            return Err(PipelineError::Config("no variables configured".into()));
        }

        let mut seen = HashSet::new();
        for variable in &self.variables {
            if variable.name.trim().is_empty() || variable.column.trim().is_empty() {
                return Err(PipelineError::Config(
                    "variable name and column must be non-empty".into(),
                ));
            }
            if !seen.insert(variable.name.as_str()) {
                return Err(PipelineError::Config(format!(
                    "duplicate variable name '{}'",
                    variable.name
                )));
            }
            if let Some(color) = &variable.color {
                if parse_color(color).is_none() {
                    return Err(PipelineError::Config(format!(
                        "variable '{}': unknown colour '{color}'",
                        variable.name
                    )));
                }
            }
        }

        if self.date_column.trim().is_empty() {
            return Err(PipelineError::Config("date_column must be non-empty".into()));
        }
        if self.chart.width == 0 || self.chart.height == 0 {
            return Err(PipelineError::Config("chart size must be non-zero".into()));
        }

        self.model
            .validate()
            .map_err(|e| PipelineError::Config(e.to_string()))
    }

    /// Directory charts are written to.
    pub fn chart_directory(&self) -> PathBuf {
        self.chart.directory.clone().unwrap_or_else(|| {
            self.output
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_default()
        })
    }

    /// Chart file for `variable`, next to the output by default.
    pub fn chart_path(&self, variable: &str) -> PathBuf {
        let stem = self
            .output
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("forecast");
        self.chart_directory()
            .join(format!("{stem}_{variable}.{}", self.chart.format.extension()))
    }
}
