pub mod types;
pub mod error;
pub mod traits;
pub mod bands;
pub mod filter;
pub mod kpath;
pub mod colormap;
pub mod figure;
pub mod render;
pub mod config;
pub mod commands;
pub mod cli;

pub use types::Result;
pub use traits::OptProcess;
pub use error::BandError;

pub use bands::{
    Band,
    BandSet,
    write_bands_to_txt,
};

pub use filter::{
    EnergyWindow,
    ENERGY_MARGIN,
    remove_bands_energy_range,
};

pub use kpath::{
    KPath,
    Tick,
};

pub use figure::{
    BandFigure,
    FigureSettings,
    AspectMode,
};

pub use render::{
    ImageFormat,
    save_image,
};

pub use config::PlotConfig;

pub use commands::band::plot_bandstructure;
