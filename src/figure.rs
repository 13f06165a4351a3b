//! Backend independent description of a band structure plot.
//!
//! Every drawing step takes the figure by value and hands it back, so no hidden
//! plotting state survives between two plots.
use log::{
    debug,
    warn,
};
use palette::Srgb;

use crate::{
    types::Result,
    error::BandError,
    bands::BandSet,
    filter::EnergyWindow,
    kpath::{
        KPath,
        Tick,
    },
    colormap::band_colors,
};


pub const BAND_LINE_WIDTH: f64 = 1.5;
pub const GUIDE_LINE_WIDTH: f64 = 1.0;
pub const YLABEL: &str = "E - E_F (eV)";


/// Selected by the `struct` option, only the exact string "Full" picks the tall layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AspectMode {
    Full,
    Half,
}


impl AspectMode {
    pub fn factor(&self) -> f64 {
        match self {
            Self::Full => 1.25,
            Self::Half => 0.5,
        }
    }
}


impl From<&str> for AspectMode {
    fn from(s: &str) -> Self {
        if s == "Full" { Self::Full } else { Self::Half }
    }
}


#[derive(Debug, Clone, PartialEq)]
pub struct Line {
    pub xs:    Vec<f64>,
    pub ys:    Vec<f64>,
    pub color: Srgb<u8>,
    pub width: f64,
    pub dashed: bool,
}


#[derive(Debug, Clone)]
pub struct FigureSettings {
    pub efermi:    f64,
    pub window:    EnergyWindow,
    pub kspacing:  usize,
    pub aspect:    AspectMode,
    pub colormap:  String,
    pub kpath:     KPath,
}


#[derive(Debug, Clone, PartialEq)]
pub struct BandFigure {
    pub bands:       Vec<Line>,
    pub fermi_line:  Option<Line>,
    pub guides:      Vec<Line>,
    pub ticks:       Vec<Tick>,
    pub x_range:     (f64, f64),
    pub y_range:     (f64, f64),
    pub y_tick_step: Option<f64>,
    pub aspect:      f64,
    pub ylabel:      String,
}


impl BandFigure {
    /// Empty canvas spanning `x_range` and `y_range`, aspect in y-units per x-unit.
    pub fn new(x_range: (f64, f64), y_range: (f64, f64), aspect: f64) -> Self {
        Self {
            bands:       vec![],
            fermi_line:  None,
            guides:      vec![],
            ticks:       vec![],
            x_range,
            y_range,
            y_tick_step: None,
            aspect,
            ylabel:      YLABEL.to_owned(),
        }
    }

    /// Lays out the whole plot for already filtered `bands`.
    pub fn build(bands: &BandSet, settings: &FigureSettings) -> Result<Self> {
        let first = bands.first()
            .filter(|b| !b.is_empty())
            .ok_or(BandError::EmptyBandSet)?;

        let nk = first.kdist.len();
        let (k_first, k_last) = (first.kdist[0], first.kdist[nk - 1]);
        let window = settings.window;
        let efermi = settings.efermi;

        let width  = k_last - k_first;
        let height = window.emax - window.emin;
        let aspect = width / height * settings.aspect.factor();

        let x_range = (0.0, k_last);
        let y_range = (window.emin - efermi, window.emax - efermi);
        debug!("Figure x range {:?}, y range {:?}, aspect {}", x_range, y_range, aspect);

        let colors = band_colors(&settings.colormap, bands.len())?;

        let fig = Self::new(x_range, y_range, aspect)
            .plot_bands(bands, &colors, efermi)
            .plot_fermi_line(&first.kdist.to_vec());

        if settings.kpath.is_suppressed() {
            return Ok(fig);
        }

        let ticks = settings.kpath.ticks(first, settings.kspacing)?;
        Ok(fig.plot_kpath(ticks).y_major_step(1.0))
    }

    pub fn plot_bands(mut self, bands: &BandSet, colors: &[Srgb<u8>], efermi: f64) -> Self {
        self.bands.extend(bands.iter()
            .zip(colors.iter())
            .map(|(band, &color)| Line {
                xs: band.kdist.to_vec(),
                ys: band.energy.iter().map(|e| e - efermi).collect(),
                color,
                width: BAND_LINE_WIDTH,
                dashed: false,
            }));
        self
    }

    /// Dashed zero-energy line along `kdist`.
    pub fn plot_fermi_line(mut self, kdist: &[f64]) -> Self {
        self.fermi_line = Some(Line {
            xs: kdist.to_vec(),
            ys: vec![0.0; kdist.len()],
            color: Srgb::new(0, 0, 0),
            width: GUIDE_LINE_WIDTH,
            dashed: true,
        });
        self
    }

    /// Vertical guide line and axis label at every high-symmetry point.
    pub fn plot_kpath(mut self, ticks: Vec<Tick>) -> Self {
        let (ymin, ymax) = self.y_range;
        self.guides = ticks.iter()
            .map(|t| Line {
                xs: vec![t.position, t.position],
                ys: vec![ymin, ymax],
                color: Srgb::new(0, 0, 0),
                width: GUIDE_LINE_WIDTH,
                dashed: false,
            })
            .collect();
        self.ticks = ticks;
        self
    }

    pub fn y_major_step(mut self, step: f64) -> Self {
        self.y_tick_step = Some(step);
        self
    }

    /// Height over width of the plotting box, `None` when the aspect is degenerate.
    pub fn box_ratio(&self) -> Option<f64> {
        let xspan = self.x_range.1 - self.x_range.0;
        let yspan = self.y_range.1 - self.y_range.0;
        let ratio = self.aspect * yspan / xspan;

        if ratio.is_finite() && ratio > 0.0 {
            Some(ratio)
        } else {
            warn!("Degenerate plot aspect ratio {}, falling back to the default layout.", ratio);
            None
        }
    }

    /// Major y ticks between the axis limits.
    pub fn y_ticks(&self) -> Vec<f64> {
        let step = match self.y_tick_step {
            Some(s) if s > 0.0 => s,
            _ => return vec![],
        };
        let (ymin, ymax) = self.y_range;
        let start = (ymin / step).ceil() as i64;
        let end   = (ymax / step).floor() as i64;
        (start ..= end).map(|i| i as f64 * step).collect()
    }
}
