use crate::error::VigiloError;

/// Hard cap on results when nothing else is configured.
pub const DEFAULT_RESULT_LIMIT: usize = 100;
/// Radius used when a request carries coordinates but no radius.
pub const DEFAULT_RADIUS_KM: u32 = 10;

/// Configuration for item search operations.
///
/// Use [`SearchConfigBuilder`] for an ergonomic way to create configurations
/// with sensible defaults.
///
/// ```rust
/// use vigilo::SearchConfig;
///
/// let config = SearchConfig::builder().limit(25).build();
/// assert_eq!(config.limit, 25);
/// assert_eq!(config.default_radius_km, 10);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchConfig {
    /// Maximum number of results to return
    pub limit: usize,
    /// Radius applied when a coordinate search omits one
    pub default_radius_km: u32,
    /// Prune candidates with a latitude/longitude window before computing distances
    pub bounding_box_prefilter: bool,
}

impl SearchConfig {
    pub fn builder() -> SearchConfigBuilder {
        SearchConfigBuilder::default()
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            limit: DEFAULT_RESULT_LIMIT,
            default_radius_km: DEFAULT_RADIUS_KM,
            bounding_box_prefilter: true,
        }
    }
}

/// Builder for creating search configurations with ergonomic defaults
#[derive(Debug, Clone, Default)]
pub struct SearchConfigBuilder {
    config: SearchConfig,
}

impl SearchConfigBuilder {
    /// Create a new builder with sensible defaults
    pub fn new() -> Self {
        Self {
            config: SearchConfig::default(),
        }
    }

    /// The browser map view: up to 100 markers
    pub fn map_view() -> Self {
        Self::new().limit(DEFAULT_RESULT_LIMIT)
    }

    /// Short lists, such as a "nearby" sidebar
    pub fn compact() -> Self {
        Self::new().limit(20)
    }

    /// Set the maximum number of results to return
    pub fn limit(mut self, limit: usize) -> Self {
        self.config.limit = limit.max(1);
        self
    }

    /// Set the radius used when a request does not specify one
    pub fn default_radius_km(mut self, radius_km: u32) -> Result<Self, VigiloError> {
        if radius_km == 0 {
            return Err(VigiloError::ConfigError(
                "default radius must be a positive number of kilometres".to_string(),
            ));
        }
        self.config.default_radius_km = radius_km;
        Ok(self)
    }

    /// Enable or disable the bounding-box prefilter
    pub fn bounding_box_prefilter(mut self, enabled: bool) -> Self {
        self.config.bounding_box_prefilter = enabled;
        self
    }

    /// Build the final configuration
    pub fn build(self) -> SearchConfig {
        self.config
    }
}
