//! Render configuration.

/// Default ceiling on nested component depth.
pub const DEFAULT_MAX_DEPTH: usize = 32;

/// Options for a render call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct RenderOptions {
    /// How many levels of nested component tags are expanded below the
    /// top-level component.
    pub max_depth: usize,
    /// Replace a tag stopped by the cycle or depth guard with an HTML comment
    /// marker. When off, the tag is left in the output as written.
    pub cycle_markers: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            cycle_markers: true,
        }
    }
}

impl RenderOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    pub fn cycle_markers(mut self, enabled: bool) -> Self {
        self.cycle_markers = enabled;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_and_builder() {
        let options = RenderOptions::default();
        assert_eq!(options.max_depth, 32);
        assert!(options.cycle_markers);

        let options = RenderOptions::new().max_depth(4).cycle_markers(false);
        assert_eq!(options, RenderOptions { max_depth: 4, cycle_markers: false });
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_partial_config_uses_defaults() {
        let options: RenderOptions = serde_json::from_str(r#"{ "max_depth": 8 }"#).unwrap();
        assert_eq!(options.max_depth, 8);
        assert!(options.cycle_markers);
    }
}
