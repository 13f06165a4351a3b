use std::{
    fs,
    path::PathBuf,
};

use anyhow::Context;
use clap::{
    Command,
    CommandFactory,
    FromArgMatches,
    Parser,
    ValueHint,
};
use colored::Colorize;
use log::{
    info,
    debug,
};
use serde::Serialize;

use crate::{
    types::Result,
    OptProcess,
    bands::{
        BandSet,
        write_bands_to_txt,
    },
    filter::EnergyWindow,
    figure::BandFigure,
    render::{
        ImageFormat,
        save_image,
    },
    config::{
        PlotConfig,
        TEMPLATE_FNAME,
    },
    cli::get_style,
};


#[derive(Debug, Parser, Serialize)]
#[command(name = "rsband",
          about = "Plot electronic band structure along a k-path from two-column band data.",
          version,
          author = "@Ionizing github.com/Ionizing/rsband",
          styles = get_style(),
          allow_negative_numbers = true,
          )]
/// Plot band structure from a plain text band file.
///
/// The file holds one `k-distance energy` pair per line, bands are separated by
/// blank lines and `#k-distance` header lines are skipped. Bands whose energies leave
/// the window [E_min - 5, E_max + 5] are not drawn. The figure is saved as
/// `<filename>_<kpath>.pdf`.
pub struct BandPlot {
    #[arg(short = 'c', long, value_hint = ValueHint::FilePath)]
    #[serde(skip)]
    /// TOML configuration file, flags given on the command line take precedence.
    config: Option<PathBuf>,

    #[arg(long)]
    #[serde(skip)]
    /// Write a configuration template to ./rsband.toml and exit.
    gen_template: bool,

    #[arg(long, value_hint = ValueHint::FilePath)]
    #[serde(skip_serializing_if = "Option::is_none")]
    /// Band data file.
    filepath: Option<PathBuf>,

    #[arg(long = "fermi_energy")]
    #[serde(skip_serializing_if = "Option::is_none")]
    /// Fermi level in eV, subtracted from all energies before plotting.
    fermi_energy: Option<f64>,

    #[arg(long = "E_min")]
    #[serde(rename = "E_min", skip_serializing_if = "Option::is_none")]
    /// Lower bound of the displayed energy window in eV.
    emin: Option<f64>,

    #[arg(long = "E_max")]
    #[serde(rename = "E_max", skip_serializing_if = "Option::is_none")]
    /// Upper bound of the displayed energy window in eV.
    emax: Option<f64>,

    #[arg(long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    /// Number of k-points between two adjacent high-symmetry points.
    kspacing: Option<usize>,

    #[arg(long = "struct")]
    #[serde(rename = "struct", skip_serializing_if = "Option::is_none")]
    /// Layout of the plot, "Full" gives the tall one, anything else the wide one.
    structure: Option<String>,

    #[arg(long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    /// Colormap used to color the bands, e.g. viridis, plasma, YlGnBu, RdBu_r.
    colormap: Option<String>,

    #[arg(long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    /// High-symmetry points, one character each, 'G' is drawn as Gamma. "NAN" disables
    /// ticks and guide lines.
    kpath: Option<String>,

    #[arg(long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    /// Output file name stem, the figure is saved as <filename>_<kpath>.<format>.
    filename: Option<String>,

    #[arg(long, value_enum, ignore_case = true)]
    #[serde(skip_serializing_if = "Option::is_none")]
    /// Format of the saved figure.
    format: Option<ImageFormat>,

    #[arg(long, value_hint = ValueHint::FilePath)]
    #[serde(skip_serializing_if = "Option::is_none")]
    /// Write the plotted bands, shifted by the Fermi level, as raw txt file in order to
    /// replot it with more advanced tools.
    txtout: Option<PathBuf>,
}


fn summary(nread: usize, nkept: usize, window: &EnergyWindow) -> String {
    let mut output = String::with_capacity(200);
    output.push_str("----------------------------------------------------------------\n");
    output.push_str(&format!(" Bands read    : {:>6}\n", nread.to_string().bright_cyan()));
    output.push_str(&format!(" Bands plotted : {:>6} within [{}, {}] eV\n",
                             nkept.to_string().bright_yellow(),
                             format!("{:.3}", window.lower_bound()).bright_blue(),
                             format!("{:.3}", window.upper_bound()).bright_blue()));
    output.push_str("----------------------------------------------------------------");
    output
}


/// Read, filter and lay out the bands, then save the figure (and the raw data if asked).
///
/// Nothing is written when reading or filtering fails.
pub fn plot_bandstructure(config: &PlotConfig) -> Result<BandFigure> {
    let filepath = config.filepath.as_ref()
        .context("Input band file not specified.")?;
    let image = config.image_path()
        .context("Output file name not specified.")?;

    info!("Reading band data from {:?}", filepath);
    debug!("    band file path = {:?}", fs::canonicalize(filepath));
    let bands = BandSet::from_file(filepath)?;

    let window = config.window();
    let kept = window.filter(&bands);
    let nread = bands.iter().filter(|b| !b.is_empty()).count();
    info!("{} of {} bands kept for plotting", kept.len(), nread);
    println!("{}", summary(nread, kept.len(), &window));

    let fig = BandFigure::build(&kept, &config.figure_settings())?;

    if let Some(txtout) = config.txtout.as_ref() {
        info!("Writing raw plot data to {:?}", txtout);
        write_bands_to_txt(txtout, &kept.shifted(config.fermi_energy), "E-Ef(eV)")?;
    }

    save_image(&fig, &image, config.format)?;
    Ok(fig)
}


impl BandPlot {
    /// The clap command with the current `PlotConfig` defaults appended to each help line.
    ///
    /// The flags themselves carry no clap defaults, otherwise they would always shadow
    /// the configuration file.
    pub fn command_with_defaults() -> Command {
        let d = PlotConfig::default();
        let defaults = [
            ("fermi_energy", d.fermi_energy.to_string()),
            ("emin",         d.emin.to_string()),
            ("emax",         d.emax.to_string()),
            ("kspacing",     d.kspacing.to_string()),
            ("structure",    d.structure),
            ("colormap",     d.colormap),
            ("kpath",        d.kpath),
            ("format",       d.format.extension().to_owned()),
        ];

        defaults.into_iter()
            .fold(Self::command(), |cmd, (id, value)| {
                cmd.mut_arg(id, |arg| {
                    let help = arg.get_help().map(|h| h.to_string()).unwrap_or_default();
                    arg.help(format!("{} [default: {}]", help, value))
                })
            })
    }

    pub fn parse_with_defaults() -> Result<Self> {
        let matches = Self::command_with_defaults().get_matches();
        Ok(Self::from_arg_matches(&matches)?)
    }
}


impl OptProcess for BandPlot {
    fn process(&self) -> Result<()> {
        if self.gen_template {
            return PlotConfig::gen_template(TEMPLATE_FNAME);
        }

        let config = PlotConfig::load(self.config.as_deref(), self)?;
        debug!("Plot configuration: {:?}", &config);

        plot_bandstructure(&config)?;
        Ok(())
    }
}
