//! SVG generation from layouts

use crate::layout::{fmt_len, Layout, Placement};
use crate::stylesheet::Stylesheet;

use super::SvgConfig;

const LOT_STROKE: &str = "#111111";
const ELEMENT_STROKE: &str = "#333333";

/// Build SVG elements incrementally
pub struct SvgBuilder {
    config: SvgConfig,
    styles: Vec<String>,
    elements: Vec<String>,
    indent: usize,
}

impl SvgBuilder {
    /// Create a new SVG builder
    pub fn new(config: SvgConfig) -> Self {
        Self {
            config,
            styles: vec![],
            elements: vec![],
            indent: 1,
        }
    }

    /// Add CSS custom properties from a stylesheet
    pub fn add_stylesheet(&mut self, stylesheet: &Stylesheet) {
        let mut css = String::from(":root {\n");
        for (token, value) in &stylesheet.colors {
            css.push_str(&format!("      --{}: {};\n", token, value));
        }
        css.push_str("    }\n");
        let prefix = self.prefix();
        css.push_str(&format!(
            "    .{prefix}label {{ font-family: sans-serif; font-size: 12px; fill: var(--text); }}\n"
        ));
        css.push_str(&format!(
            "    .{prefix}dimensions {{ font-family: sans-serif; font-size: 10px; fill: var(--text); opacity: 0.7; }}"
        ));
        self.styles.push(css);
    }

    fn prefix(&self) -> String {
        self.config.class_prefix.clone().unwrap_or_default()
    }

    fn indent_str(&self) -> String {
        if self.config.pretty_print {
            "  ".repeat(self.indent)
        } else {
            String::new()
        }
    }

    fn newline(&self) -> &str {
        if self.config.pretty_print {
            "\n"
        } else {
            ""
        }
    }

    /// Add a rectangle element
    #[allow(clippy::too_many_arguments)]
    pub fn add_rect(
        &mut self,
        id: Option<&str>,
        x: f64,
        y: f64,
        w: f64,
        h: f64,
        classes: &[String],
        styles: &str,
    ) {
        let id_attr = id
            .map(|i| format!(r#" id="{}""#, escape_xml(i)))
            .unwrap_or_default();
        let class_attr = if classes.is_empty() {
            String::new()
        } else {
            format!(r#" class="{}""#, classes.join(" "))
        };

        self.elements.push(format!(
            r#"{}<rect{}{} x="{}" y="{}" width="{}" height="{}"{}/>"#,
            self.indent_str(),
            id_attr,
            class_attr,
            fmt_len(x),
            fmt_len(y),
            fmt_len(w),
            fmt_len(h),
            styles
        ));
    }

    /// Add a centered text element
    pub fn add_text(&mut self, text: &str, x: f64, y: f64, class: &str) {
        let prefix = self.prefix();
        self.elements.push(format!(
            r#"{}<text class="{}{}" x="{}" y="{}" text-anchor="middle" dominant-baseline="middle">{}</text>"#,
            self.indent_str(),
            prefix,
            class,
            fmt_len(x),
            fmt_len(y),
            escape_xml(text)
        ));
    }

    /// Start a group element
    pub fn start_group(&mut self, id: Option<&str>, classes: &[String]) {
        let id_attr = id
            .map(|i| format!(r#" id="{}""#, escape_xml(i)))
            .unwrap_or_default();
        let class_attr = if classes.is_empty() {
            String::new()
        } else {
            format!(r#" class="{}""#, classes.join(" "))
        };
        self.elements
            .push(format!("{}<g{}{}>", self.indent_str(), id_attr, class_attr));
        self.indent += 1;
    }

    /// End a group element
    pub fn end_group(&mut self) {
        self.indent = self.indent.saturating_sub(1);
        self.elements.push(format!("{}</g>", self.indent_str()));
    }

    /// Finish the document; `width` and `height` are the canvas size in pixels
    pub fn build(self, width: f64, height: f64) -> String {
        let nl = self.newline();

        let mut svg = String::new();

        if self.config.standalone {
            svg.push_str(r#"<?xml version="1.0" encoding="UTF-8"?>"#);
            svg.push_str(nl);
        }

        svg.push_str(&format!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#,
            w = fmt_len(width),
            h = fmt_len(height)
        ));
        svg.push_str(nl);

        if !self.styles.is_empty() {
            svg.push_str("  <style>");
            svg.push_str(nl);
            for style in &self.styles {
                svg.push_str("    ");
                svg.push_str(style);
                svg.push_str(nl);
            }
            svg.push_str("  </style>");
            svg.push_str(nl);
        }

        for elem in &self.elements {
            svg.push_str(elem);
            svg.push_str(nl);
        }

        svg.push_str("</svg>");

        svg
    }
}

/// Render a layout to an SVG string (with default stylesheet)
pub fn render_svg(layout: &Layout, config: &SvgConfig) -> String {
    render_svg_with_stylesheet(layout, config, &Stylesheet::default())
}

/// Render a layout to an SVG string using a custom stylesheet
pub fn render_svg_with_stylesheet(
    layout: &Layout,
    config: &SvgConfig,
    stylesheet: &Stylesheet,
) -> String {
    let mut builder = SvgBuilder::new(config.clone());
    builder.add_stylesheet(stylesheet);

    let scale = config.scale;
    let pad = config.padding;
    let prefix = config.class_prefix.clone().unwrap_or_default();

    builder.add_rect(
        None,
        pad,
        pad,
        layout.plot.width * scale,
        layout.plot.height * scale,
        &[format!("{prefix}lot")],
        &format!(
            r#" fill="{}" stroke="{}" stroke-width="2""#,
            stylesheet.resolve_or_default("lot"),
            stylesheet
                .resolve("outline")
                .unwrap_or(LOT_STROKE)
        ),
    );

    for placement in &layout.placements {
        render_placement(placement, config, stylesheet, &mut builder);
    }

    builder.build(
        layout.plot.width * scale + 2.0 * pad,
        layout.plot.height * scale + 2.0 * pad,
    )
}

fn render_placement(
    placement: &Placement,
    config: &SvgConfig,
    stylesheet: &Stylesheet,
    builder: &mut SvgBuilder,
) {
    let prefix = config.class_prefix.clone().unwrap_or_default();
    let scale = config.scale;
    let x = config.padding + placement.x * scale;
    let y = config.padding + placement.y * scale;
    let w = placement.width * scale;
    let h = placement.height * scale;

    let mut classes = vec![
        format!("{prefix}element"),
        format!("{prefix}{}", placement.kind.as_str()),
    ];
    if placement.locked {
        classes.push(format!("{prefix}locked"));
    }

    builder.start_group(Some(&placement.element_id), &classes);

    let dash = if placement.locked {
        r#" stroke-dasharray="6 3""#
    } else {
        ""
    };
    builder.add_rect(
        None,
        x,
        y,
        w,
        h,
        &[],
        &format!(
            r#" rx="4" fill="{}" stroke="{}" stroke-width="1.5"{}"#,
            stylesheet.color_for(&placement.kind),
            ELEMENT_STROKE,
            dash
        ),
    );

    let cx = x + w / 2.0;
    let cy = y + h / 2.0;
    if config.show_dimensions {
        builder.add_text(&placement.display_name(), cx, cy - 7.0, "label");
        let caption = format!(
            "{} x {}",
            fmt_len(placement.width),
            fmt_len(placement.height)
        );
        builder.add_text(&caption, cx, cy + 8.0, "dimensions");
    } else {
        builder.add_text(&placement.display_name(), cx, cy, "label");
    }

    builder.end_group();
}

pub(crate) fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
