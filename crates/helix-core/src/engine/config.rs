use crate::core::models::points::WindowExpansion;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Clone)]
pub enum ConfigError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),
    #[error("Invalid value for {name}: {reason}")]
    InvalidValue { name: &'static str, reason: String },
}

/// Size and sampling of the image the power spectrum was computed from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImageGeometry {
    pub width: usize,
    pub height: usize,
    /// Å per pixel.
    pub pixel_size: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RefinementConfig {
    /// Largest consistency residual accepted as converged.
    pub tolerance: f64,
    /// Half-width of the search interval relative to the starting guess.
    pub bound_span: f64,
    pub max_iterations: usize,
    /// Absolute tolerance on the optimized `x1`.
    pub abscissa_tolerance: f64,
}

impl Default for RefinementConfig {
    fn default() -> Self {
        Self {
            tolerance: 1e-8,
            bound_span: 0.5,
            max_iterations: 500,
            abscissa_tolerance: 1e-12,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnumerationConfig {
    /// Upper bound on the number of coefficient pairs scanned for one window.
    pub max_points: usize,
}

impl Default for EnumerationConfig {
    fn default() -> Self {
        Self {
            max_points: 100_000,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StrandConfig {
    /// Points closer to a strand line than this fraction of the circumference lie on it.
    pub coincidence_fraction: f64,
}

impl Default for StrandConfig {
    fn default() -> Self {
        Self {
            coincidence_fraction: 1.0 / 500.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FittingConfig {
    /// Samples of the displayed Bessel curves per profile sample.
    pub oversampling: usize,
}

impl Default for FittingConfig {
    fn default() -> Self {
        Self { oversampling: 5 }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct IndexingConfig {
    pub image: ImageGeometry,
    pub refinement: RefinementConfig,
    pub enumeration: EnumerationConfig,
    pub strand: StrandConfig,
    pub fitting: FittingConfig,
    pub window: WindowExpansion,
}

#[derive(Default)]
pub struct IndexingConfigBuilder {
    pixel_size: Option<f64>,
    image_width: Option<usize>,
    image_height: Option<usize>,
    tolerance: Option<f64>,
    bound_span: Option<f64>,
    max_iterations: Option<usize>,
    abscissa_tolerance: Option<f64>,
    max_points: Option<usize>,
    coincidence_fraction: Option<f64>,
    oversampling: Option<usize>,
    window: Option<WindowExpansion>,
}

impl IndexingConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pixel_size(mut self, angstrom_per_pixel: f64) -> Self {
        self.pixel_size = Some(angstrom_per_pixel);
        self
    }
    pub fn image_size(mut self, width: usize, height: usize) -> Self {
        self.image_width = Some(width);
        self.image_height = Some(height);
        self
    }
    pub fn tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = Some(tolerance);
        self
    }
    pub fn bound_span(mut self, span: f64) -> Self {
        self.bound_span = Some(span);
        self
    }
    pub fn max_iterations(mut self, iterations: usize) -> Self {
        self.max_iterations = Some(iterations);
        self
    }
    pub fn abscissa_tolerance(mut self, tolerance: f64) -> Self {
        self.abscissa_tolerance = Some(tolerance);
        self
    }
    pub fn max_points(mut self, n: usize) -> Self {
        self.max_points = Some(n);
        self
    }
    pub fn coincidence_fraction(mut self, fraction: f64) -> Self {
        self.coincidence_fraction = Some(fraction);
        self
    }
    pub fn oversampling(mut self, factor: usize) -> Self {
        self.oversampling = Some(factor);
        self
    }
    pub fn window(mut self, expansion: WindowExpansion) -> Self {
        self.window = Some(expansion);
        self
    }

    pub fn build(self) -> Result<IndexingConfig, ConfigError> {
        let image = ImageGeometry {
            width: self
                .image_width
                .ok_or(ConfigError::MissingParameter("image_width"))?,
            height: self
                .image_height
                .ok_or(ConfigError::MissingParameter("image_height"))?,
            pixel_size: self
                .pixel_size
                .ok_or(ConfigError::MissingParameter("pixel_size"))?,
        };
        if image.width == 0 || image.height == 0 {
            return Err(invalid("image_size", "width and height must be non-zero"));
        }
        positive("pixel_size", image.pixel_size)?;

        let defaults = RefinementConfig::default();
        let refinement = RefinementConfig {
            tolerance: self.tolerance.unwrap_or(defaults.tolerance),
            bound_span: self.bound_span.unwrap_or(defaults.bound_span),
            max_iterations: self.max_iterations.unwrap_or(defaults.max_iterations),
            abscissa_tolerance: self
                .abscissa_tolerance
                .unwrap_or(defaults.abscissa_tolerance),
        };
        positive("tolerance", refinement.tolerance)?;
        positive("abscissa_tolerance", refinement.abscissa_tolerance)?;
        if !(refinement.bound_span > 0.0 && refinement.bound_span < 1.0) {
            return Err(invalid("bound_span", "must lie strictly between 0 and 1"));
        }
        if refinement.max_iterations == 0 {
            return Err(invalid("max_iterations", "must be at least 1"));
        }

        let enumeration = EnumerationConfig {
            max_points: self
                .max_points
                .unwrap_or(EnumerationConfig::default().max_points),
        };
        if enumeration.max_points == 0 {
            return Err(invalid("max_points", "must be at least 1"));
        }

        let strand = StrandConfig {
            coincidence_fraction: self
                .coincidence_fraction
                .unwrap_or(StrandConfig::default().coincidence_fraction),
        };
        positive("coincidence_fraction", strand.coincidence_fraction)?;

        let fitting = FittingConfig {
            oversampling: self
                .oversampling
                .unwrap_or(FittingConfig::default().oversampling),
        };
        if fitting.oversampling == 0 {
            return Err(invalid("oversampling", "must be at least 1"));
        }

        Ok(IndexingConfig {
            image,
            refinement,
            enumeration,
            strand,
            fitting,
            window: self.window.unwrap_or_default(),
        })
    }
}

fn invalid(name: &'static str, reason: &str) -> ConfigError {
    ConfigError::InvalidValue {
        name,
        reason: reason.to_string(),
    }
}

fn positive(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::InvalidValue {
            name,
            reason: format!("{value} is not a positive number"),
        })
    }
}
