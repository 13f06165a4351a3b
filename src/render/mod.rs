//! Renderers turning a [`BandFigure`] into files.
//!
//! PDF and SVG share one `plotters` drawing routine.
pub mod pdf;

use std::path::{
    Path,
    PathBuf,
};

use clap::ValueEnum;
use log::info;
use plotters::{
    coord::Shift,
    prelude::*,
    style::{
        FontTransform,
        text_anchor::{
            HPos,
            Pos,
            VPos,
        },
    },
};
use serde::{
    Serialize,
    Deserialize,
};

use crate::{
    types::Result,
    figure::{
        BandFigure,
        Line,
    },
};

pub use pdf::PdfBackend;


/// Backend pixels per PDF point.
pub const PX_PER_PT: f64 = 2.0;

const PLOT_WIDTH:     u32 = 800;
const DEFAULT_RATIO:  f64 = 0.75;
const MARGIN:         u32 = 30;
const LEFT_AREA:      u32 = 100;
const BOTTOM_AREA:    u32 = 60;
const LABEL_FONT:     u32 = 24;
const DESC_FONT:      u32 = 26;
const TICK_LEN:       i32 = 10;
const LABEL_GAP:      i32 = 6;
const DASH_ON:        f64 = 10.0;
const DASH_OFF:       f64 = 6.0;


#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    Pdf,
    Svg,
}


impl ImageFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Svg => "svg",
        }
    }
}


/// `{filename}_{kpath}.{ext}`
pub fn output_path(filename: &str, kpath: &str, format: ImageFormat) -> PathBuf {
    PathBuf::from(format!("{}_{}.{}", filename, kpath, format.extension()))
}


/// Canvas size in backend pixels, the plotting box follows the figure's aspect.
pub fn canvas_size(fig: &BandFigure) -> (u32, u32) {
    let ratio = fig.box_ratio().unwrap_or(DEFAULT_RATIO);
    let plot_height = (PLOT_WIDTH as f64 * ratio).round().clamp(160.0, 4000.0) as u32;

    (PLOT_WIDTH + LEFT_AREA + 2 * MARGIN,
     plot_height + BOTTOM_AREA + 2 * MARGIN)
}


pub fn save_image(fig: &BandFigure, path: &(impl AsRef<Path> + ?Sized), format: ImageFormat) -> Result<()> {
    let path = path.as_ref();
    let size = canvas_size(fig);
    info!("Writing {} figure of {}x{} px to {:?}", format.extension(), size.0, size.1, path);

    match format {
        ImageFormat::Pdf => {
            let root = PdfBackend::new(path, size).into_drawing_area();
            draw_figure(root, fig)
        },
        ImageFormat::Svg => {
            let root = SVGBackend::new(path, size).into_drawing_area();
            draw_figure(root, fig)
        },
    }
}


fn to_rgb(line: &Line) -> RGBColor {
    RGBColor(line.color.red, line.color.green, line.color.blue)
}


fn stroke_px(width_pt: f64) -> u32 {
    (width_pt * PX_PER_PT).round().max(1.0) as u32
}


pub fn draw_figure<DB>(root: DrawingArea<DB, Shift>, fig: &BandFigure) -> Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    root.fill(&WHITE)?;

    let (x0, x1) = fig.x_range;
    let (y0, y1) = fig.y_range;

    let mut chart = ChartBuilder::on(&root)
        .margin(MARGIN)
        .set_label_area_size(LabelAreaPosition::Left, LEFT_AREA)
        .set_label_area_size(LabelAreaPosition::Bottom, BOTTOM_AREA)
        .build_cartesian_2d(x0 .. x1, y0 .. y1)?;

    let xrange = (x0, x1);
    let yrange = (y0, y1);
    for line in &fig.bands {
        let style = to_rgb(line).stroke_width(stroke_px(line.width));
        for run in clip_polyline(&line.xs, &line.ys, xrange, yrange) {
            chart.draw_series(LineSeries::new(run, style))?;
        }
    }

    if let Some(line) = &fig.fermi_line {
        let style = to_rgb(line).stroke_width(stroke_px(line.width));
        let (w, h) = chart.plotting_area().dim_in_pixel();
        let px_per_unit = (w as f64 / (x1 - x0), h as f64 / (y1 - y0));

        for run in clip_polyline(&line.xs, &line.ys, xrange, yrange) {
            for dash in dash_polyline(&run, px_per_unit, DASH_ON, DASH_OFF) {
                chart.draw_series(LineSeries::new(dash, style))?;
            }
        }
    }

    for line in &fig.guides {
        let style = to_rgb(line).stroke_width(stroke_px(line.width));
        for run in clip_polyline(&line.xs, &line.ys, xrange, yrange) {
            chart.draw_series(LineSeries::new(run, style))?;
        }
    }

    // frame
    chart.draw_series(std::iter::once(
        Rectangle::new([(x0, y0), (x1, y1)], BLACK.stroke_width(2))))?;

    let xlabels = if fig.ticks.is_empty() {
        numeric_labels(auto_ticks(x0, x1, 6))
    } else {
        fig.ticks.iter().map(|t| (t.position, t.label.clone())).collect()
    };
    let ylabels = match fig.y_ticks() {
        v if v.is_empty() => numeric_labels(auto_ticks(y0, y1, 6)),
        v => numeric_labels(v),
    };

    let font = ("sans-serif", LABEL_FONT).into_font();
    let tick_style = BLACK.stroke_width(2);

    let xstyle = TextStyle::from(font.clone()).pos(Pos::new(HPos::Center, VPos::Top));
    for (x, label) in xlabels {
        let (px, py) = chart.backend_coord(&(x, y0));
        root.draw(&PathElement::new(vec![(px, py), (px, py + TICK_LEN)], tick_style))?;
        root.draw(&Text::new(label, (px, py + TICK_LEN + LABEL_GAP), xstyle.clone()))?;
    }

    let ystyle = TextStyle::from(font).pos(Pos::new(HPos::Right, VPos::Center));
    for (y, label) in ylabels {
        let (px, py) = chart.backend_coord(&(x0, y));
        root.draw(&PathElement::new(vec![(px - TICK_LEN, py), (px, py)], tick_style))?;
        root.draw(&Text::new(label, (px - TICK_LEN - LABEL_GAP, py), ystyle.clone()))?;
    }

    let (_, top)    = chart.backend_coord(&(x0, y1));
    let (_, bottom) = chart.backend_coord(&(x0, y0));
    let desc_style = TextStyle::from(("sans-serif", DESC_FONT).into_font())
        .pos(Pos::new(HPos::Center, VPos::Center))
        .transform(FontTransform::Rotate270);
    root.draw(&Text::new(fig.ylabel.clone(),
                         (MARGIN as i32 + DESC_FONT as i32 / 2, (top + bottom) / 2),
                         desc_style))?;

    root.present()?;
    Ok(())
}


/// Pairs every tick with its text, using as many decimals as the tick step needs.
fn numeric_labels(ticks: Vec<f64>) -> Vec<(f64, String)> {
    let step = match ticks.as_slice() {
        [a, b, ..] => (b - a).abs(),
        _          => 1.0,
    };
    let decimals = if step >= 1.0 { 0 } else { (-step.log10().floor()).max(0.0) as usize };

    ticks.into_iter()
        .map(|v| {
            let text = format!("{:.*}", decimals, v);
            let text = match text.strip_prefix('-') {
                Some(abs) if abs.chars().all(|c| c == '0' || c == '.') => abs.to_owned(),
                _ => text,
            };
            (v, text)
        })
        .collect()
}


/// Up to about `n` evenly spaced round numbers inside `[lo, hi]`.
pub fn auto_ticks(lo: f64, hi: f64, n: usize) -> Vec<f64> {
    let span = hi - lo;
    if !(span.is_finite() && span > 0.0) || n == 0 {
        return vec![];
    }

    let raw = span / n as f64;
    let magnitude = 10f64.powf(raw.log10().floor());
    let step = [1.0, 2.0, 5.0, 10.0].iter()
        .map(|m| m * magnitude)
        .find(|s| *s >= raw)
        .unwrap_or(10.0 * magnitude);

    let start = (lo / step).ceil() as i64;
    let end   = (hi / step).floor() as i64;
    (start ..= end).map(|i| i as f64 * step).collect()
}


/// Splits a polyline into the runs lying inside the box, cutting segments at the border.
pub fn clip_polyline(xs: &[f64], ys: &[f64], xrange: (f64, f64), yrange: (f64, f64)) -> Vec<Vec<(f64, f64)>> {
    let points = xs.iter().copied().zip(ys.iter().copied()).collect::<Vec<_>>();
    let mut runs: Vec<Vec<(f64, f64)>> = vec![];
    let mut current: Vec<(f64, f64)> = vec![];

    if points.len() == 1 {
        let (x, y) = points[0];
        if x >= xrange.0 && x <= xrange.1 && y >= yrange.0 && y <= yrange.1 {
            runs.push(vec![points[0]]);
        }
        return runs;
    }

    for seg in points.windows(2) {
        match clip_segment(seg[0], seg[1], xrange, yrange) {
            Some((a, b)) => {
                if current.last() != Some(&a) {
                    if current.len() > 1 {
                        runs.push(std::mem::take(&mut current));
                    }
                    current.clear();
                    current.push(a);
                }
                current.push(b);
            },
            None => {
                if current.len() > 1 {
                    runs.push(std::mem::take(&mut current));
                }
                current.clear();
            },
        }
    }
    if current.len() > 1 {
        runs.push(current);
    }

    runs
}


// Liang-Barsky
fn clip_segment(a: (f64, f64), b: (f64, f64), xrange: (f64, f64), yrange: (f64, f64)) -> Option<((f64, f64), (f64, f64))> {
    let (dx, dy) = (b.0 - a.0, b.1 - a.1);
    let mut t0 = 0.0f64;
    let mut t1 = 1.0f64;

    for (p, q) in [
        (-dx, a.0 - xrange.0),
        ( dx, xrange.1 - a.0),
        (-dy, a.1 - yrange.0),
        ( dy, yrange.1 - a.1),
    ] {
        if p == 0.0 {
            if q < 0.0 {
                return None;
            }
        } else {
            let r = q / p;
            if p < 0.0 {
                t0 = t0.max(r);
            } else {
                t1 = t1.min(r);
            }
        }
    }

    if t0 > t1 {
        return None;
    }

    let at = |t: f64| if t == 0.0 { a } else if t == 1.0 { b } else { (a.0 + t * dx, a.1 + t * dy) };
    Some((at(t0), at(t1)))
}


/// Cuts a polyline into dashes of `on` pixels separated by `off` pixels.
pub fn dash_polyline(points: &[(f64, f64)], px_per_unit: (f64, f64), on: f64, off: f64) -> Vec<Vec<(f64, f64)>> {
    let mut dashes = vec![];
    let mut current = vec![];
    let mut drawing = true;
    let mut left = on;

    if let Some(&p) = points.first() {
        current.push(p);
    }

    for seg in points.windows(2) {
        let (a, b) = (seg[0], seg[1]);
        let len = ((b.0 - a.0) * px_per_unit.0).hypot((b.1 - a.1) * px_per_unit.1);
        let mut pos = 0.0;

        while len - pos > left {
            pos += left;
            let t = pos / len;
            let p = (a.0 + t * (b.0 - a.0), a.1 + t * (b.1 - a.1));
            if drawing {
                current.push(p);
                dashes.push(std::mem::take(&mut current));
                left = off;
            } else {
                current.push(p);
                left = on;
            }
            drawing = !drawing;
        }

        left -= len - pos;
        if drawing {
            current.push(b);
        }
    }

    if drawing && current.len() > 1 {
        dashes.push(current);
    }
    dashes
}


#[cfg(test)]
mod test {
    use super::*;
    use std::fs;
    use approx::assert_relative_eq;
    use tempdir::TempDir;
    use crate::kpath::Tick;

    fn gm_figure() -> BandFigure {
        BandFigure::new((0.0, 2.0), (-3.0, 1.0), 1.0)
            .plot_fermi_line(&[0.0, 1.0, 2.0])
            .plot_kpath(vec![
                Tick { position: 0.0, label: "Γ".to_owned() },
                Tick { position: 2.0, label: "M".to_owned() },
            ])
            .y_major_step(1.0)
    }

    #[test]
    fn test_output_path() {
        assert_eq!(output_path("eucd2as2", "GMKGALHA", ImageFormat::Pdf), PathBuf::from("eucd2as2_GMKGALHA.pdf"));
        assert_eq!(output_path("bands", "NAN", ImageFormat::Svg), PathBuf::from("bands_NAN.svg"));
    }

    #[test]
    fn test_auto_ticks() {
        assert_eq!(auto_ticks(-3.0, 1.0, 4), vec![-3.0, -2.0, -1.0, 0.0, 1.0]);
        assert_eq!(auto_ticks(0.0, 10.0, 5), vec![0.0, 2.0, 4.0, 6.0, 8.0, 10.0]);
        assert!(auto_ticks(1.0, 1.0, 5).is_empty());
    }

    #[test]
    fn test_numeric_labels() {
        let labels = numeric_labels(vec![-3.0, -2.0, -1.0, 0.0]);
        assert_eq!(labels.iter().map(|(_, s)| s.as_str()).collect::<Vec<_>>(), vec!["-3", "-2", "-1", "0"]);

        let labels = numeric_labels(vec![0.0, 0.2, 0.4]);
        assert_eq!(labels[1].1, "0.2");
        assert_eq!(numeric_labels(vec![-1E-9]), vec![(-1E-9, "0".to_owned())]);
    }

    #[test]
    fn test_pdf_tick_labels() {
        let tmpdir = TempDir::new("rsband_test").unwrap();
        let path = tmpdir.path().join("bands_GM.pdf");
        save_image(&gm_figure(), &path, ImageFormat::Pdf).unwrap();

        let text = String::from_utf8_lossy(&fs::read(&path).unwrap()).into_owned();
        assert!(text.contains("/F5 12.00 Tf (G) Tj"));
        assert!(text.contains("/F1 12.00 Tf (M) Tj"));
        assert!(text.contains("/F1 12.00 Tf (-3) Tj"));
        assert!(text.contains("/F1 12.00 Tf (1) Tj"));
        assert!(text.contains("/F1 13.00 Tf (E - E_F \\(eV\\)) Tj"));
    }

    #[test]
    fn test_svg_tick_labels() {
        let tmpdir = TempDir::new("rsband_test").unwrap();
        let path = tmpdir.path().join("bands_GM.svg");
        save_image(&gm_figure(), &path, ImageFormat::Svg).unwrap();

        let svg = fs::read_to_string(&path).unwrap();
        assert!(svg.contains("Γ"));
        // two k-path labels, five energies and the axis title
        assert_eq!(svg.matches("<text").count(), 8);
    }

    #[test]
    fn test_clip_polyline() {
        let xs = [0.0, 1.0, 2.0, 3.0];
        let ys = [0.0, 2.0, 0.0, 0.5];
        let runs = clip_polyline(&xs, &ys, (0.0, 3.0), (-1.0, 1.0));

        assert_eq!(runs.len(), 2);
        assert_eq!(runs[0], vec![(0.0, 0.0), (0.5, 1.0)]);
        assert_eq!(runs[1], vec![(1.5, 1.0), (2.0, 0.0), (3.0, 0.5)]);

        let runs = clip_polyline(&xs, &[5.0; 4], (0.0, 3.0), (-1.0, 1.0));
        assert!(runs.is_empty());
    }

    #[test]
    fn test_dash_polyline() {
        let dashes = dash_polyline(&[(0.0, 0.0), (10.0, 0.0)], (10.0, 1.0), 10.0, 5.0);
        // 100 px long: 10 on, 5 off, ...
        assert_eq!(dashes.len(), 7);
        assert_relative_eq!(dashes[0][1].0, 1.0);
        assert_relative_eq!(dashes[1][0].0, 1.5);
        assert!(dashes.iter().all(|d| d.len() >= 2));
    }
}
