//! Configuration for SVG rendering

/// Configuration options for SVG output
#[derive(Debug, Clone, PartialEq)]
pub struct SvgConfig {
    /// Pixels per plot unit
    pub scale: f64,

    /// Padding around the plot, in pixels
    pub padding: f64,

    /// Whether to include the XML declaration
    pub standalone: bool,

    /// Whether to format output with indentation
    pub pretty_print: bool,

    /// Prefix for CSS class names (e.g., "sp-" for "sp-element")
    pub class_prefix: Option<String>,

    /// Whether each element gets a `W x H` caption under its label
    pub show_dimensions: bool,
}

impl Default for SvgConfig {
    fn default() -> Self {
        Self {
            scale: 10.0,
            padding: 20.0,
            standalone: true,
            pretty_print: true,
            class_prefix: Some("sp-".to_string()),
            show_dimensions: true,
        }
    }
}

impl SvgConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the pixels per plot unit
    pub fn with_scale(mut self, scale: f64) -> Self {
        self.scale = scale;
        self
    }

    /// Set the padding around the plot
    pub fn with_padding(mut self, padding: f64) -> Self {
        self.padding = padding;
        self
    }

    /// Set whether output is standalone
    pub fn with_standalone(mut self, standalone: bool) -> Self {
        self.standalone = standalone;
        self
    }

    /// Set whether to pretty-print output
    pub fn with_pretty_print(mut self, pretty: bool) -> Self {
        self.pretty_print = pretty;
        self
    }

    /// Set the CSS class prefix
    pub fn with_class_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.class_prefix = Some(prefix.into());
        self
    }

    /// Remove the CSS class prefix
    pub fn without_class_prefix(mut self) -> Self {
        self.class_prefix = None;
        self
    }

    /// Set whether dimension captions are drawn
    pub fn with_dimensions(mut self, show: bool) -> Self {
        self.show_dimensions = show;
        self
    }
}
