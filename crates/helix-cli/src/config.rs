use crate::cli::LatticeArgs;
use crate::error::{CliError, Result};
use crate::utils::parser;
use helixdex::core::models::points::WindowExpansion;
use helixdex::engine::config::{self as core_config, FittingConfig};
use serde::Deserialize;
use std::path::Path;
use std::str::FromStr;
use tracing::debug;

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
struct PartialImageConfig {
    width: Option<usize>,
    height: Option<usize>,
    pixel_size: Option<f64>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
struct PartialRefinementConfig {
    tolerance: Option<f64>,
    bound_span: Option<f64>,
    max_iterations: Option<usize>,
    abscissa_tolerance: Option<f64>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
struct PartialEnumerationConfig {
    max_points: Option<usize>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
struct PartialStrandConfig {
    coincidence_fraction: Option<f64>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
struct PartialFittingConfig {
    oversampling: Option<usize>,
}

/// Spin-box steps widening the real-space window; missing steps stay at zero.
#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
struct PartialWindowConfig {
    x_low: Option<i32>,
    x_high: Option<i32>,
    y_low: Option<i32>,
    y_high: Option<i32>,
}

impl From<PartialWindowConfig> for WindowExpansion {
    fn from(p: PartialWindowConfig) -> Self {
        Self {
            x_low: p.x_low.unwrap_or(0),
            x_high: p.x_high.unwrap_or(0),
            y_low: p.y_low.unwrap_or(0),
            y_high: p.y_high.unwrap_or(0),
        }
    }
}

/// The indexing configuration as read from a TOML file, every value optional.
#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
pub struct PartialIndexingConfig {
    image: Option<PartialImageConfig>,
    refinement: Option<PartialRefinementConfig>,
    enumeration: Option<PartialEnumerationConfig>,
    strand: Option<PartialStrandConfig>,
    fitting: Option<PartialFittingConfig>,
    window: Option<PartialWindowConfig>,
}

impl PartialIndexingConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading configuration from file: {:?}", path);
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| CliError::file_parsing(path, e))
    }

    /// Reads the file when a path is given and starts from an empty configuration otherwise.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        path.map_or_else(|| Ok(Self::default()), Self::from_file)
    }

    /// Combines file values, `--set` overrides and command-line flags into a core config.
    ///
    /// Command-line flags win over the file. The pixel size falls back to the one stored in
    /// the parameter record.
    pub fn merge_with_cli(
        mut self,
        args: &LatticeArgs,
        record_pixel_size: f64,
    ) -> Result<core_config::IndexingConfig> {
        self.apply_set_values(&args.set_values)?;

        let image = self.image.take().unwrap_or_default();
        let refinement = self.refinement.take().unwrap_or_default();

        let width = args.width.or(image.width).ok_or_else(|| {
            CliError::Config(
                "The image width is required either as `--width` or `image.width`.".to_string(),
            )
        })?;
        let height = args.height.or(image.height).ok_or_else(|| {
            CliError::Config(
                "The image height is required either as `--height` or `image.height`."
                    .to_string(),
            )
        })?;
        let pixel_size = args
            .pixel_size
            .or(image.pixel_size)
            .unwrap_or(record_pixel_size);

        let mut builder = core_config::IndexingConfigBuilder::new()
            .image_size(width, height)
            .pixel_size(pixel_size)
            .window(self.window.take().unwrap_or_default().into());

        if let Some(tolerance) = args.tolerance.or(refinement.tolerance) {
            builder = builder.tolerance(tolerance);
        }
        if let Some(iterations) = args.max_iterations.or(refinement.max_iterations) {
            builder = builder.max_iterations(iterations);
        }
        if let Some(span) = refinement.bound_span {
            builder = builder.bound_span(span);
        }
        if let Some(tolerance) = refinement.abscissa_tolerance {
            builder = builder.abscissa_tolerance(tolerance);
        }
        if let Some(max_points) = self.enumeration.and_then(|e| e.max_points) {
            builder = builder.max_points(max_points);
        }
        if let Some(fraction) = self.strand.and_then(|s| s.coincidence_fraction) {
            builder = builder.coincidence_fraction(fraction);
        }
        if let Some(factor) = self.fitting.and_then(|f| f.oversampling) {
            builder = builder.oversampling(factor);
        }

        builder.build().map_err(|e| CliError::Config(e.to_string()))
    }

    /// Extracts the fitting options, the only section profile fitting needs.
    pub fn fitting_config(self) -> Result<FittingConfig> {
        let oversampling = self
            .fitting
            .and_then(|f| f.oversampling)
            .unwrap_or(FittingConfig::default().oversampling);
        if oversampling == 0 {
            return Err(CliError::Config(
                "`fitting.oversampling` must be at least 1.".to_string(),
            ));
        }
        Ok(FittingConfig { oversampling })
    }

    fn apply_set_values(&mut self, set_values: &[String]) -> Result<()> {
        for kv_pair in set_values {
            let (key, value_str) = parser::parse_key_value(kv_pair)
                .map_err(|e| CliError::Config(format!("Invalid --set format: {}", e)))?;

            match key {
                "image.width" => {
                    self.image.get_or_insert_with(Default::default).width =
                        Some(parse_value(key, value_str)?);
                }
                "image.height" => {
                    self.image.get_or_insert_with(Default::default).height =
                        Some(parse_value(key, value_str)?);
                }
                "image.pixel-size" => {
                    self.image.get_or_insert_with(Default::default).pixel_size =
                        Some(parse_value(key, value_str)?);
                }
                "refinement.tolerance" => {
                    self.refinement
                        .get_or_insert_with(Default::default)
                        .tolerance = Some(parse_value(key, value_str)?);
                }
                "refinement.bound-span" => {
                    self.refinement
                        .get_or_insert_with(Default::default)
                        .bound_span = Some(parse_value(key, value_str)?);
                }
                "refinement.max-iterations" => {
                    self.refinement
                        .get_or_insert_with(Default::default)
                        .max_iterations = Some(parse_value(key, value_str)?);
                }
                "refinement.abscissa-tolerance" => {
                    self.refinement
                        .get_or_insert_with(Default::default)
                        .abscissa_tolerance = Some(parse_value(key, value_str)?);
                }
                "enumeration.max-points" => {
                    self.enumeration
                        .get_or_insert_with(Default::default)
                        .max_points = Some(parse_value(key, value_str)?);
                }
                "strand.coincidence-fraction" => {
                    self.strand
                        .get_or_insert_with(Default::default)
                        .coincidence_fraction = Some(parse_value(key, value_str)?);
                }
                "fitting.oversampling" => {
                    self.fitting
                        .get_or_insert_with(Default::default)
                        .oversampling = Some(parse_value(key, value_str)?);
                }
                "window.x-low" => {
                    self.window.get_or_insert_with(Default::default).x_low =
                        Some(parse_value(key, value_str)?);
                }
                "window.x-high" => {
                    self.window.get_or_insert_with(Default::default).x_high =
                        Some(parse_value(key, value_str)?);
                }
                "window.y-low" => {
                    self.window.get_or_insert_with(Default::default).y_low =
                        Some(parse_value(key, value_str)?);
                }
                "window.y-high" => {
                    self.window.get_or_insert_with(Default::default).y_high =
                        Some(parse_value(key, value_str)?);
                }
                _ => {
                    return Err(CliError::Config(format!(
                        "Unsupported configuration key for --set: '{}'",
                        key
                    )));
                }
            }
        }
        Ok(())
    }
}

fn parse_value<T: FromStr>(key: &str, value: &str) -> Result<T> {
    value.parse().map_err(|_| {
        CliError::Config(format!(
            "Invalid value for {}: '{}' ({})",
            key,
            value,
            std::any::type_name::<T>()
        ))
    })
}
