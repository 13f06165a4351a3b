//! Single page vector PDF drawing backend for `plotters`.
//!
//! Only the base-14 fonts are referenced, nothing is embedded. Greek capitals are
//! routed to the Symbol font, other non-ASCII characters are replaced by `?`.
use std::{
    fs::File,
    io::{
        self,
        BufWriter,
        Write,
    },
    path::{
        Path,
        PathBuf,
    },
};

use plotters_backend::{
    text_anchor,
    BackendColor,
    BackendCoord,
    BackendStyle,
    BackendTextStyle,
    DrawingBackend,
    DrawingErrorKind,
    FontFamily,
    FontStyle,
    FontTransform,
};

use super::PX_PER_PT;


// Average glyph advance of Helvetica over the font size.
const GLYPH_WIDTH: f64 = 0.55;
const CAP_HEIGHT:  f64 = 0.72;


#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PdfFont {
    Helvetica,
    HelveticaBold,
    Times,
    Courier,
    Symbol,
}


impl PdfFont {
    const ALL: [PdfFont; 5] = [
        PdfFont::Helvetica,
        PdfFont::HelveticaBold,
        PdfFont::Times,
        PdfFont::Courier,
        PdfFont::Symbol,
    ];

    fn resource(&self) -> &'static str {
        match self {
            Self::Helvetica     => "F1",
            Self::HelveticaBold => "F2",
            Self::Times         => "F3",
            Self::Courier       => "F4",
            Self::Symbol        => "F5",
        }
    }

    fn base_font(&self) -> &'static str {
        match self {
            Self::Helvetica     => "Helvetica",
            Self::HelveticaBold => "Helvetica-Bold",
            Self::Times         => "Times-Roman",
            Self::Courier       => "Courier",
            Self::Symbol        => "Symbol",
        }
    }

    fn from_style(family: FontFamily<'_>, style: FontStyle) -> Self {
        match (family, style) {
            (FontFamily::Serif, _)     => Self::Times,
            (FontFamily::Monospace, _) => Self::Courier,
            (_, FontStyle::Bold)       => Self::HelveticaBold,
            _                          => Self::Helvetica,
        }
    }
}


/// Symbol font code of the Greek capital `c`.
fn symbol_code(c: char) -> Option<char> {
    let code = match c {
        'Α' => 'A', 'Β' => 'B', 'Γ' => 'G', 'Δ' => 'D', 'Ε' => 'E', 'Ζ' => 'Z',
        'Η' => 'H', 'Θ' => 'Q', 'Ι' => 'I', 'Κ' => 'K', 'Λ' => 'L', 'Μ' => 'M',
        'Ν' => 'N', 'Ξ' => 'X', 'Ο' => 'O', 'Π' => 'P', 'Ρ' => 'R', 'Σ' => 'S',
        'Τ' => 'T', 'Υ' => 'U', 'Φ' => 'F', 'Χ' => 'C', 'Ψ' => 'Y', 'Ω' => 'W',
        _ => return None,
    };
    Some(code)
}


/// Splits `text` into runs sharing one font, already escaped for a PDF literal string.
fn text_runs(text: &str, base: PdfFont) -> Vec<(PdfFont, String)> {
    let mut runs: Vec<(PdfFont, String)> = vec![];

    for c in text.chars() {
        let (font, c) = match symbol_code(c) {
            Some(code) => (PdfFont::Symbol, code),
            None if c.is_ascii() && !c.is_ascii_control() => (base, c),
            None => (base, '?'),
        };

        if runs.last().map(|(f, _)| *f) != Some(font) {
            runs.push((font, String::new()));
        }
        if let Some((_, s)) = runs.last_mut() {
            if matches!(c, '(' | ')' | '\\') {
                s.push('\\');
            }
            s.push(c);
        }
    }

    runs
}


pub struct PdfBackend {
    path:    PathBuf,
    size:    (u32, u32),
    content: String,
    saved:   bool,
}


impl PdfBackend {
    pub fn new(path: &(impl AsRef<Path> + ?Sized), size: (u32, u32)) -> Self {
        Self {
            path: path.as_ref().to_owned(),
            size,
            content: String::from("1 J 1 j\n"),
            saved: false,
        }
    }

    fn px(&self, (x, y): BackendCoord) -> (f64, f64) {
        (x as f64 / PX_PER_PT, (self.size.1 as i64 - y as i64) as f64 / PX_PER_PT)
    }

    fn page_size(&self) -> (f64, f64) {
        (self.size.0 as f64 / PX_PER_PT, self.size.1 as f64 / PX_PER_PT)
    }

    fn set_stroke(&mut self, color: BackendColor, width: u32) {
        let (r, g, b) = color.rgb;
        self.content.push_str(&format!("{:.4} {:.4} {:.4} RG {:.2} w\n",
                                       r as f64 / 255.0, g as f64 / 255.0, b as f64 / 255.0,
                                       width.max(1) as f64 / PX_PER_PT));
    }

    fn set_fill(&mut self, color: BackendColor) {
        let (r, g, b) = color.rgb;
        self.content.push_str(&format!("{:.4} {:.4} {:.4} rg\n",
                                       r as f64 / 255.0, g as f64 / 255.0, b as f64 / 255.0));
    }

    fn trace_path(&mut self, points: &[BackendCoord]) {
        for (i, &p) in points.iter().enumerate() {
            let (x, y) = self.px(p);
            let op = if i == 0 { "m" } else { "l" };
            self.content.push_str(&format!("{:.2} {:.2} {}\n", x, y, op));
        }
    }

    fn text_width(text: &str, size: f64) -> f64 {
        text.chars().count() as f64 * size * GLYPH_WIDTH
    }

    /// Complete file: header, catalog, page tree, page, content stream, fonts, xref.
    fn serialize(&self) -> Vec<u8> {
        let (width, height) = self.page_size();
        let fonts = PdfFont::ALL.iter()
            .enumerate()
            .map(|(i, f)| format!("/{} {} 0 R", f.resource(), 5 + i))
            .collect::<Vec<_>>()
            .join(" ");

        let mut objects = vec![
            "<< /Type /Catalog /Pages 2 0 R >>".to_owned(),
            "<< /Type /Pages /Kids [3 0 R] /Count 1 >>".to_owned(),
            format!("<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {:.2} {:.2}] /Contents 4 0 R /Resources << /Font << {} >> >> >>",
                    width, height, fonts),
            format!("<< /Length {} >>\nstream\n{}\nendstream", self.content.len(), self.content),
        ];
        objects.extend(PdfFont::ALL.iter().map(|f| {
            match f {
                PdfFont::Symbol => format!("<< /Type /Font /Subtype /Type1 /BaseFont /{} >>", f.base_font()),
                _ => format!("<< /Type /Font /Subtype /Type1 /BaseFont /{} /Encoding /WinAnsiEncoding >>", f.base_font()),
            }
        }));

        let mut out: Vec<u8> = Vec::with_capacity(self.content.len() + 2048);
        out.extend_from_slice(b"%PDF-1.4\n%\xe2\xe3\xcf\xd3\n");

        let mut offsets = Vec::with_capacity(objects.len());
        for (i, obj) in objects.iter().enumerate() {
            offsets.push(out.len());
            out.extend_from_slice(format!("{} 0 obj\n{}\nendobj\n", i + 1, obj).as_bytes());
        }

        let xref = out.len();
        let mut tail = format!("xref\n0 {}\n0000000000 65535 f \n", objects.len() + 1);
        for off in offsets {
            tail.push_str(&format!("{:010} 00000 n \n", off));
        }
        tail.push_str(&format!("trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{}\n%%EOF\n",
                               objects.len() + 1, xref));
        out.extend_from_slice(tail.as_bytes());

        out
    }
}


impl DrawingBackend for PdfBackend {
    type ErrorType = io::Error;

    fn get_size(&self) -> (u32, u32) {
        self.size
    }

    fn ensure_prepared(&mut self) -> Result<(), DrawingErrorKind<Self::ErrorType>> {
        Ok(())
    }

    fn present(&mut self) -> Result<(), DrawingErrorKind<Self::ErrorType>> {
        if self.saved {
            return Ok(());
        }

        let bytes = self.serialize();
        let file = File::create(&self.path).map_err(DrawingErrorKind::DrawingError)?;
        let mut f = BufWriter::new(file);
        f.write_all(&bytes).map_err(DrawingErrorKind::DrawingError)?;
        f.flush().map_err(DrawingErrorKind::DrawingError)?;

        self.saved = true;
        Ok(())
    }

    fn draw_pixel(
        &mut self,
        point: BackendCoord,
        color: BackendColor,
    ) -> Result<(), DrawingErrorKind<Self::ErrorType>> {
        if color.alpha == 0.0 {
            return Ok(());
        }

        let (x, y) = self.px((point.0, point.1 + 1));
        self.set_fill(color);
        self.content.push_str(&format!("{:.2} {:.2} {:.2} {:.2} re f\n", x, y, 1.0 / PX_PER_PT, 1.0 / PX_PER_PT));
        Ok(())
    }

    fn draw_line<S: BackendStyle>(
        &mut self,
        from: BackendCoord,
        to: BackendCoord,
        style: &S,
    ) -> Result<(), DrawingErrorKind<Self::ErrorType>> {
        self.draw_path(vec![from, to], style)
    }

    fn draw_rect<S: BackendStyle>(
        &mut self,
        upper_left: BackendCoord,
        bottom_right: BackendCoord,
        style: &S,
        fill: bool,
    ) -> Result<(), DrawingErrorKind<Self::ErrorType>> {
        let color = style.color();
        if color.alpha == 0.0 {
            return Ok(());
        }

        let (x0, y0) = self.px((upper_left.0, bottom_right.1));
        let (x1, y1) = self.px((bottom_right.0, upper_left.1));
        if fill {
            self.set_fill(color);
            self.content.push_str(&format!("{:.2} {:.2} {:.2} {:.2} re f\n", x0, y0, x1 - x0, y1 - y0));
        } else {
            self.set_stroke(color, style.stroke_width());
            self.content.push_str(&format!("{:.2} {:.2} {:.2} {:.2} re S\n", x0, y0, x1 - x0, y1 - y0));
        }
        Ok(())
    }

    fn draw_path<S: BackendStyle, I: IntoIterator<Item = BackendCoord>>(
        &mut self,
        path: I,
        style: &S,
    ) -> Result<(), DrawingErrorKind<Self::ErrorType>> {
        let color = style.color();
        let points = path.into_iter().collect::<Vec<_>>();
        if color.alpha == 0.0 || points.len() < 2 {
            return Ok(());
        }

        self.set_stroke(color, style.stroke_width());
        self.trace_path(&points);
        self.content.push_str("S\n");
        Ok(())
    }

    fn draw_circle<S: BackendStyle>(
        &mut self,
        center: BackendCoord,
        radius: u32,
        style: &S,
        fill: bool,
    ) -> Result<(), DrawingErrorKind<Self::ErrorType>> {
        let color = style.color();
        if color.alpha == 0.0 {
            return Ok(());
        }

        let r = radius as f64;
        let points = (0 ..= 32)
            .map(|i| {
                let phi = i as f64 / 32.0 * std::f64::consts::TAU;
                ((center.0 as f64 + r * phi.cos()).round() as i32,
                 (center.1 as f64 + r * phi.sin()).round() as i32)
            })
            .collect::<Vec<_>>();

        if fill {
            self.set_fill(color);
            self.trace_path(&points);
            self.content.push_str("f\n");
        } else {
            self.set_stroke(color, style.stroke_width());
            self.trace_path(&points);
            self.content.push_str("S\n");
        }
        Ok(())
    }

    fn fill_polygon<S: BackendStyle, I: IntoIterator<Item = BackendCoord>>(
        &mut self,
        vert: I,
        style: &S,
    ) -> Result<(), DrawingErrorKind<Self::ErrorType>> {
        let color = style.color();
        let points = vert.into_iter().collect::<Vec<_>>();
        if color.alpha == 0.0 || points.len() < 3 {
            return Ok(());
        }

        self.set_fill(color);
        self.trace_path(&points);
        self.content.push_str("h f\n");
        Ok(())
    }

    fn draw_text<TStyle: BackendTextStyle>(
        &mut self,
        text: &str,
        style: &TStyle,
        pos: BackendCoord,
    ) -> Result<(), DrawingErrorKind<Self::ErrorType>> {
        let color = style.color();
        if color.alpha == 0.0 || text.trim().is_empty() {
            return Ok(());
        }

        let size = style.size();
        let width  = Self::text_width(text, size);
        let ascent = size * CAP_HEIGHT;

        // Offset from the anchor to the baseline origin, in the unrotated text frame
        let anchor = style.anchor();
        let dx = match anchor.h_pos {
            text_anchor::HPos::Left   => 0.0,
            text_anchor::HPos::Center => -width / 2.0,
            text_anchor::HPos::Right  => -width,
        };
        let dy = match anchor.v_pos {
            text_anchor::VPos::Top    => ascent,
            text_anchor::VPos::Center => ascent / 2.0,
            text_anchor::VPos::Bottom => 0.0,
        };

        // Clockwise rotation on screen
        let (cos, sin) = match style.transform() {
            FontTransform::Rotate90  => (0.0, 1.0),
            FontTransform::Rotate180 => (-1.0, 0.0),
            FontTransform::Rotate270 => (0.0, -1.0),
            _                        => (1.0, 0.0),
        };
        let ox = dx * cos - dy * sin;
        let oy = dx * sin + dy * cos;

        let x = (pos.0 as f64 + ox) / PX_PER_PT;
        let y = (self.size.1 as f64 - pos.1 as f64 - oy) / PX_PER_PT;

        let base = PdfFont::from_style(style.family(), style.style());
        self.set_fill(color);
        self.content.push_str(&format!("BT {:.4} {:.4} {:.4} {:.4} {:.2} {:.2} Tm\n",
                                       cos, -sin, sin, cos, x, y));
        for (font, run) in text_runs(text, base) {
            self.content.push_str(&format!("/{} {:.2} Tf ({}) Tj\n", font.resource(), size / PX_PER_PT, run));
        }
        self.content.push_str("ET\n");
        Ok(())
    }

    fn estimate_text_size<TStyle: BackendTextStyle>(
        &self,
        text: &str,
        style: &TStyle,
    ) -> Result<(u32, u32), DrawingErrorKind<Self::ErrorType>> {
        let size = style.size();
        Ok((Self::text_width(text, size).ceil() as u32, size.ceil() as u32))
    }
}


#[cfg(test)]
mod test {
    use super::*;
    use plotters::prelude::*;
    use tempdir::TempDir;

    #[test]
    fn test_text_runs() {
        let runs = text_runs("Γ-M (x)", PdfFont::Helvetica);
        assert_eq!(runs, vec![
            (PdfFont::Symbol, "G".to_owned()),
            (PdfFont::Helvetica, "-M \\(x\\)".to_owned()),
        ]);
        assert_eq!(text_runs("é", PdfFont::Times), vec![(PdfFont::Times, "?".to_owned())]);
    }

    #[test]
    fn test_write_pdf() {
        let tmpdir = TempDir::new("rsband_test").unwrap();
        let path = tmpdir.path().join("plot.pdf");

        {
            let root = PdfBackend::new(&path, (200, 100)).into_drawing_area();
            root.fill(&WHITE).unwrap();
            root.draw(&PathElement::new(vec![(0, 0), (100, 50)], ShapeStyle::from(&RED).stroke_width(2))).unwrap();
            root.draw(&Text::new("Γ", (10, 10), ("sans-serif", 20))).unwrap();
            root.present().unwrap();
        }

        let bytes = std::fs::read(&path).unwrap();
        let text = String::from_utf8_lossy(&bytes);
        assert!(text.starts_with("%PDF-1.4"));
        assert!(text.trim_end().ends_with("%%EOF"));
        assert!(text.contains("/MediaBox [0 0 100.00 50.00]"));
        assert!(text.contains("/F5 10.00 Tf (G) Tj"));
        assert!(text.contains("0.00 50.00 m"));

        // startxref points at the xref table
        let start = text.rfind("startxref\n").unwrap() + "startxref\n".len();
        let offset: usize = text[start ..].lines().next().unwrap().parse().unwrap();
        assert!(bytes[offset ..].starts_with(b"xref"));
    }

    #[test]
    fn test_nothing_written_without_present() {
        let tmpdir = TempDir::new("rsband_test").unwrap();
        let path = tmpdir.path().join("plot.pdf");
        {
            let root = PdfBackend::new(&path, (200, 100)).into_drawing_area();
            root.fill(&WHITE).unwrap();
        }
        assert!(!path.exists());
    }
}
