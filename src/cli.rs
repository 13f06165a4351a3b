use std::sync::OnceLock;
use clap::{
    builder::styling::{
        AnsiColor,
        Effects,
        Styles,
    },
};

use crate::{
    types::Result,
    traits::OptProcess,
    commands::band::BandPlot,
};


pub fn get_style() -> Styles {
    static INSTANCE: OnceLock<Styles> = OnceLock::new();
    INSTANCE.get_or_init(|| {
        Styles::styled()
            .header(AnsiColor::Yellow.on_default() | Effects::BOLD)
            .usage(AnsiColor::Green.on_default()   | Effects::BOLD)
            .literal(AnsiColor::Green.on_default() | Effects::BOLD)
            .placeholder(AnsiColor::BrightBlue.on_default())
            .error(AnsiColor::BrightRed.on_default())
            .valid(AnsiColor::BrightYellow.on_default())
    }).to_owned()
}


pub fn run() -> Result<()> {
    BandPlot::parse_with_defaults()?.process()
}
