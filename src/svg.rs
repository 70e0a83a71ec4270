//! SVG wireframe of a computed composition.
//!
//! Draws the canvas at 1:1 scale with every region outlined: image slots, the
//! gap strip, label plates with their words, the logo box and brand captions.
//! Useful for checking a layout without decoding any pixels.
//!
//! # Example
//!
//! ```
//! use eagleframe::layout::{FixedAdvance, Frame, Size};
//! use eagleframe::svg::render_layout_svg;
//!
//! let composition = Frame::new(Size::new(200, 200))
//!     .secondary(Size::new(200, 200))
//!     .compute(&FixedAdvance::default())
//!     .unwrap();
//!
//! let svg = render_layout_svg(&composition);
//! assert!(svg.contains("414×200"));
//! ```

#[cfg(not(feature = "std"))]
use alloc::format;
#[cfg(not(feature = "std"))]
use alloc::string::String;

use crate::layout::{Arrangement, Composition, Rect, RectF, TextRun};

/// Margin around the canvas.
const MARGIN: f64 = 30.0;
/// Height of the title line above the canvas.
const TITLE_H: f64 = 22.0;

/// Render a complete SVG document outlining `composition`.
pub fn render_layout_svg(composition: &Composition) -> String {
    let cw = composition.canvas.width as f64;
    let ch = composition.canvas.height as f64;
    let total_w = cw + 2.0 * MARGIN;
    let total_h = ch + 2.0 * MARGIN + TITLE_H;
    let (ox, oy) = (MARGIN, MARGIN + TITLE_H);

    let mut svg = String::with_capacity(4096);
    svg.push_str(&format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{}" height="{}" viewBox="0 0 {} {}">"#,
        total_w as u32, total_h as u32, total_w, total_h
    ));
    svg.push('\n');

    svg.push_str(r##"<style>
  text { font-family: "Consolas", "DejaVu Sans Mono", "Courier New", monospace; }
  .title { font-size: 13px; font-weight: bold; fill: #333; }
  .canvas { fill: #f4f4f4; stroke: #999; stroke-width: 1; }
  .primary { fill: #6ba3d6; stroke: #2c6faa; stroke-width: 1.5; }
  .secondary { fill: #8fc98f; stroke: #3f8f3f; stroke-width: 1.5; }
  .gap { fill: #ffffff; stroke: #bbb; stroke-width: 1; stroke-dasharray: 4,2; }
  .plate { fill: #ffffff; stroke: #333; stroke-width: 1; }
  .logo { fill: none; stroke: #13294b; stroke-width: 1.5; stroke-dasharray: 3,2; }
  .run { font-size: 15px; font-weight: bold; fill: #000; }
  .slot { font-size: 11px; fill: #1d3d5c; }
  @media (prefers-color-scheme: dark) {
    .title { fill: #e0e0e0; }
    .canvas { fill: #2d2d2d; stroke: #555; }
    .primary { fill: #3a72a4; stroke: #5a9fd4; }
    .secondary { fill: #3f7a3f; stroke: #6fbf6f; }
    .logo { stroke: #9bb8e0; }
    .slot { fill: #d0e4f5; }
  }
</style>
"##);

    let arrangement = match composition.arrangement {
        Arrangement::Single => "single",
        Arrangement::SideBySide => "side by side",
        Arrangement::Stacked => "stacked",
    };
    svg.push_str(&format!(
        r#"<text x="{}" y="{}" class="title">{}</text>"#,
        ox,
        MARGIN + 14.0,
        escape_xml(&format!(
            "Canvas  {}×{}  {arrangement}",
            composition.canvas.width, composition.canvas.height
        ))
    ));
    svg.push('\n');

    push_rect(&mut svg, ox, oy, cw, ch, "canvas");
    push_slot(&mut svg, ox, oy, &composition.primary, "primary");
    if let Some(gap) = &composition.gap {
        push_rect(
            &mut svg,
            ox + gap.x as f64,
            oy + gap.y as f64,
            gap.width as f64,
            gap.height as f64,
            "gap",
        );
    }
    if let Some(secondary) = &composition.secondary {
        push_slot(&mut svg, ox, oy, secondary, "secondary");
    }

    for label in &composition.labels {
        push_rect_f(&mut svg, ox, oy, &label.plate, "plate");
        push_run(&mut svg, ox, oy, &label.run);
    }

    push_rect_f(&mut svg, ox, oy, &composition.logo.region, "logo");
    for caption in &composition.logo.captions {
        push_run(&mut svg, ox, oy, caption);
    }

    svg.push_str("</svg>\n");
    svg
}

fn push_rect(svg: &mut String, x: f64, y: f64, w: f64, h: f64, class: &str) {
    svg.push_str(&format!(
        r#"<rect x="{x:.1}" y="{y:.1}" width="{w:.1}" height="{h:.1}" class="{class}"/>"#
    ));
    svg.push('\n');
}

fn push_rect_f(svg: &mut String, ox: f64, oy: f64, r: &RectF, class: &str) {
    push_rect(svg, ox + r.x, oy + r.y, r.width, r.height, class);
}

/// An image slot with its name and size in the corner.
fn push_slot(svg: &mut String, ox: f64, oy: f64, r: &Rect, name: &str) {
    let (x, y) = (ox + r.x as f64, oy + r.y as f64);
    push_rect(svg, x, y, r.width as f64, r.height as f64, name);
    svg.push_str(&format!(
        r#"<text x="{:.1}" y="{:.1}" class="slot" text-anchor="end">{}</text>"#,
        x + r.width as f64 - 4.0,
        y + r.height as f64 - 6.0,
        escape_xml(&format!("{name} {}×{}", r.width, r.height))
    ));
    svg.push('\n');
}

fn push_run(svg: &mut String, ox: f64, oy: f64, run: &TextRun) {
    svg.push_str(&format!(
        r#"<text x="{:.1}" y="{:.1}" class="run">{}</text>"#,
        ox + run.x,
        oy + run.baseline,
        escape_xml(&run.text)
    ));
    svg.push('\n');
}

/// Escape special characters for XML text content.
fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
