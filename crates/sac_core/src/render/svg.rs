//! SVG implementation of [`Surface`].

use super::{Surface, TextAlign, TextStyle};
use crate::model::image::ImageRef;
use glam::DVec2;
use std::fmt::Write;

const FONT_FAMILY: &str = "Georgia, serif";

/// Accumulates drawing calls into an SVG document.
#[derive(Debug, Default)]
pub struct SvgSurface {
    width: f64,
    height: f64,
    body: String,
    next_clip_id: u32,
}

impl SvgSurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Finished SVG document.
    pub fn into_svg(self) -> String {
        format!(
            "<svg xmlns=\"http://www.w3.org/2000/svg\" xmlns:xlink=\"http://www.w3.org/1999/xlink\" width=\"{w}\" height=\"{h}\" viewBox=\"0 0 {w} {h}\">{body}</svg>",
            w = fmt_num(self.width),
            h = fmt_num(self.height),
            body = self.body
        )
    }
}

impl Surface for SvgSurface {
    fn clear(&mut self, width: f64, height: f64) {
        self.width = width;
        self.height = height;
        self.body.clear();
        self.next_clip_id = 0;
    }

    fn fill_rect(&mut self, origin: DVec2, size: DVec2, color: &str) {
        let _ = write!(
            self.body,
            "<rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" fill=\"{}\"/>",
            fmt_num(origin.x),
            fmt_num(origin.y),
            fmt_num(size.x),
            fmt_num(size.y),
            escape_xml(color)
        );
    }

    fn line(&mut self, from: DVec2, to: DVec2, color: &str, width: f64) {
        let _ = write!(
            self.body,
            "<line x1=\"{}\" y1=\"{}\" x2=\"{}\" y2=\"{}\" stroke=\"{}\" stroke-width=\"{}\"/>",
            fmt_num(from.x),
            fmt_num(from.y),
            fmt_num(to.x),
            fmt_num(to.y),
            escape_xml(color),
            fmt_num(width)
        );
    }

    fn fill_circle(&mut self, center: DVec2, radius: f64, color: &str) {
        let _ = write!(
            self.body,
            "<circle cx=\"{}\" cy=\"{}\" r=\"{}\" fill=\"{}\"/>",
            fmt_num(center.x),
            fmt_num(center.y),
            fmt_num(radius),
            escape_xml(color)
        );
    }

    fn stroke_circle(&mut self, center: DVec2, radius: f64, color: &str, width: f64) {
        let _ = write!(
            self.body,
            "<circle cx=\"{}\" cy=\"{}\" r=\"{}\" fill=\"none\" stroke=\"{}\" stroke-width=\"{}\"/>",
            fmt_num(center.x),
            fmt_num(center.y),
            fmt_num(radius),
            escape_xml(color),
            fmt_num(width)
        );
    }

    fn draw_image_circle(&mut self, image: &ImageRef, center: DVec2, radius: f64) {
        let clip_id = format!("avatar-clip-{}", self.next_clip_id);
        self.next_clip_id += 1;
        let _ = write!(
            self.body,
            "<clipPath id=\"{clip_id}\"><circle cx=\"{cx}\" cy=\"{cy}\" r=\"{r}\"/></clipPath>\
             <image href=\"{href}\" x=\"{x}\" y=\"{y}\" width=\"{d}\" height=\"{d}\" preserveAspectRatio=\"xMidYMid slice\" clip-path=\"url(#{clip_id})\"/>",
            cx = fmt_num(center.x),
            cy = fmt_num(center.y),
            r = fmt_num(radius),
            href = escape_xml(image.as_str()),
            x = fmt_num(center.x - radius),
            y = fmt_num(center.y - radius),
            d = fmt_num(radius * 2.0),
        );
    }

    fn text(&mut self, text: &str, anchor: DVec2, style: &TextStyle) {
        let text_anchor = match style.align {
            TextAlign::Left => "start",
            TextAlign::Center => "middle",
            TextAlign::Right => "end",
        };
        let weight = if style.bold { " font-weight=\"bold\"" } else { "" };
        let transform = if style.rotation_deg == 0.0 {
            String::new()
        } else {
            format!(
                " transform=\"rotate({} {} {})\"",
                fmt_num(style.rotation_deg),
                fmt_num(anchor.x),
                fmt_num(anchor.y)
            )
        };
        let _ = write!(
            self.body,
            "<text x=\"{}\" y=\"{}\" font-family=\"{FONT_FAMILY}\" font-size=\"{}\"{weight} fill=\"{}\" text-anchor=\"{text_anchor}\"{transform}>{}</text>",
            fmt_num(anchor.x),
            fmt_num(anchor.y),
            fmt_num(style.font_size),
            escape_xml(&style.color),
            escape_xml(text)
        );
    }
}

/// Two decimals, trailing zeros trimmed.
fn fmt_num(value: f64) -> String {
    let formatted = format!("{value:.2}");
    let trimmed = formatted.trim_end_matches('0').trim_end_matches('.');
    if trimmed == "-0" {
        "0".to_string()
    } else {
        trimmed.to_string()
    }
}

fn escape_xml(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::{escape_xml, fmt_num, SvgSurface};
    use crate::model::image::ImageRef;
    use crate::render::{Surface, TextAlign, TextStyle};
    use glam::dvec2;

    #[test]
    fn numbers_are_compact() {
        assert_eq!(fmt_num(50.0), "50");
        assert_eq!(fmt_num(12.5), "12.5");
        assert_eq!(fmt_num(1.0 / 3.0), "0.33");
        assert_eq!(fmt_num(-0.001), "0");
    }

    #[test]
    fn text_is_escaped_and_rotated() {
        let mut surface = SvgSurface::new();
        surface.clear(100.0, 50.0);
        surface.text(
            "<Pristine & co>",
            dvec2(20.0, 30.0),
            &TextStyle {
                font_size: 11.0,
                bold: true,
                color: "#9B59B6".to_string(),
                align: TextAlign::Center,
                rotation_deg: -90.0,
            },
        );
        let svg = surface.into_svg();
        assert!(svg.starts_with("<svg "));
        assert!(svg.contains("&lt;Pristine &amp; co&gt;"));
        assert!(svg.contains("transform=\"rotate(-90 20 30)\""));
        assert!(svg.contains("text-anchor=\"middle\""));
    }

    #[test]
    fn each_image_gets_its_own_clip_path() {
        let mut surface = SvgSurface::new();
        surface.clear(100.0, 100.0);
        let image = ImageRef::Remote("https://example.test/a?x=1&y=2".to_string());
        surface.draw_image_circle(&image, dvec2(10.0, 10.0), 5.0);
        surface.draw_image_circle(&image, dvec2(40.0, 10.0), 5.0);
        let svg = surface.into_svg();
        assert!(svg.contains("id=\"avatar-clip-0\""));
        assert!(svg.contains("id=\"avatar-clip-1\""));
        assert!(svg.contains(&escape_xml("a?x=1&y=2")));
    }
}
