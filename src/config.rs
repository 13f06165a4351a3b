use std::{
    fs,
    path::{
        Path,
        PathBuf,
    },
};

use anyhow::{
    Context,
    ensure,
};
use figment::{
    Figment,
    providers::{
        Format,
        Serialized,
        Toml,
    },
};
use log::info;
use serde::{
    Serialize,
    Deserialize,
};

use crate::{
    types::Result,
    filter::EnergyWindow,
    kpath::KPath,
    figure::{
        AspectMode,
        FigureSettings,
    },
    render::{
        ImageFormat,
        output_path,
    },
};


pub const TEMPLATE_FNAME: &str = "rsband.toml";


/// Every knob of one band plot.
///
/// Values come from the defaults below, then the optional TOML file, then the
/// flags given on the command line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlotConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filepath: Option<PathBuf>,

    pub fermi_energy: f64,

    #[serde(rename = "E_min")]
    pub emin: f64,

    #[serde(rename = "E_max")]
    pub emax: f64,

    pub kspacing: usize,

    #[serde(rename = "struct")]
    pub structure: String,

    pub colormap: String,

    pub kpath: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,

    pub format: ImageFormat,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub txtout: Option<PathBuf>,
}


impl Default for PlotConfig {
    fn default() -> Self {
        Self {
            filepath:     None,
            fermi_energy: 0.0,
            emin:         -3.0,
            emax:         1.0,
            kspacing:     45,
            structure:    "full".to_owned(),
            colormap:     "viridis".to_owned(),
            kpath:        "GMKGALHA".to_owned(),
            filename:     None,
            format:       ImageFormat::Pdf,
            txtout:       None,
        }
    }
}


impl PlotConfig {
    /// Layers `config_file` (if any) and then `overrides` on top of the defaults.
    ///
    /// `overrides` should skip the fields the user did not set.
    pub fn load(config_file: Option<&Path>, overrides: impl Serialize) -> Result<Self> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Some(path) = config_file {
            ensure!(path.is_file(), "Configuration file {:?} not found.", path);
            info!("Reading configuration from {:?}", path);
            figment = figment.merge(Toml::file(path));
        }

        let config: Self = figment.merge(Serialized::defaults(overrides))
            .extract()
            .context("Invalid plot configuration")?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(self.filepath.is_some(), "Input band file not specified, use `--filepath`.");
        ensure!(self.filename.is_some(), "Output file name not specified, use `--filename`.");
        ensure!(self.emin < self.emax,
                "E_min ({}) must be lower than E_max ({}).", self.emin, self.emax);
        ensure!(self.kspacing >= 1, "kspacing must be at least 1.");
        Ok(())
    }

    pub fn window(&self) -> EnergyWindow {
        EnergyWindow::new(self.emin, self.emax)
    }

    pub fn figure_settings(&self) -> FigureSettings {
        FigureSettings {
            efermi:   self.fermi_energy,
            window:   self.window(),
            kspacing: self.kspacing,
            aspect:   AspectMode::from(self.structure.as_str()),
            colormap: self.colormap.clone(),
            kpath:    KPath::new(&self.kpath),
        }
    }

    /// Path of the saved figure, `{filename}_{kpath}.{pdf|svg}`.
    pub fn image_path(&self) -> Option<PathBuf> {
        self.filename.as_deref()
            .map(|f| output_path(f, &self.kpath, self.format))
    }

    pub fn template() -> Self {
        Self {
            filepath: Some(PathBuf::from("BAND.dat")),
            filename: Some("bands".to_owned()),
            ..Self::default()
        }
    }

    pub fn gen_template(path: &(impl AsRef<Path> + ?Sized)) -> Result<()> {
        let path = path.as_ref();
        let body = toml::to_string_pretty(&Self::template())?;
        let content = format!("\
# rsband configuration, flags given on the command line override these values.
#
# filepath:     two-column band data, bands separated by blank lines
# fermi_energy: subtracted from every energy before plotting
# E_min, E_max: displayed energy window in eV, bands beyond it by more than 5 eV are dropped
# kspacing:     number of k-points between two high-symmetry points
# struct:       \"Full\" for the tall layout, anything else for the wide one
# kpath:        high-symmetry point labels, one character each, 'G' for Gamma, \"NAN\" for none
# filename:     figure is saved as <filename>_<kpath>.<format>
# format:       \"pdf\" or \"svg\"
# txtout:       optional raw data of the plotted bands

{}", body);

        info!("Writing configuration template to {:?}", path);
        fs::write(path, content)
            .with_context(|| format!("Failed to write template to {:?}", path))
    }
}
