use std::fmt;

use colorous::Gradient;
use palette::Srgb;

use crate::{
    types::Result,
    error::BandError,
};


/// Colormaps whose sampling order is flipped when colouring bands.
const REVERSED_FOR_BANDS: &[&str] = &["YlGnBu"];


/// Accepted names, spelled as in matplotlib.
const COLORMAP_NAMES: &[&str] = &[
    "viridis", "plasma", "inferno", "magma", "cividis", "turbo", "cubehelix",
    "Blues", "Greens", "Greys", "Oranges", "Purples", "Reds",
    "BuGn", "BuPu", "GnBu", "OrRd", "PuBuGn", "PuBu", "PuRd", "RdPu",
    "YlGnBu", "YlGn", "YlOrBr", "YlOrRd",
    "BrBG", "PRGn", "PiYG", "PuOr", "RdBu", "RdGy", "RdYlBu", "RdYlGn", "Spectral",
];


fn gradient_by_name(name: &str) -> Option<Gradient> {
    let gradient = match name.to_ascii_lowercase().as_str() {
        "viridis"   => colorous::VIRIDIS,
        "plasma"    => colorous::PLASMA,
        "inferno"   => colorous::INFERNO,
        "magma"     => colorous::MAGMA,
        "cividis"   => colorous::CIVIDIS,
        "turbo"     => colorous::TURBO,
        "cubehelix" => colorous::CUBEHELIX,
        "blues"     => colorous::BLUES,
        "greens"    => colorous::GREENS,
        "greys"     => colorous::GREYS,
        "oranges"   => colorous::ORANGES,
        "purples"   => colorous::PURPLES,
        "reds"      => colorous::REDS,
        "bugn"      => colorous::BLUE_GREEN,
        "bupu"      => colorous::BLUE_PURPLE,
        "gnbu"      => colorous::GREEN_BLUE,
        "orrd"      => colorous::ORANGE_RED,
        "pubugn"    => colorous::PURPLE_BLUE_GREEN,
        "pubu"      => colorous::PURPLE_BLUE,
        "purd"      => colorous::PURPLE_RED,
        "rdpu"      => colorous::RED_PURPLE,
        "ylgnbu"    => colorous::YELLOW_GREEN_BLUE,
        "ylgn"      => colorous::YELLOW_GREEN,
        "ylorbr"    => colorous::YELLOW_ORANGE_BROWN,
        "ylorrd"    => colorous::YELLOW_ORANGE_RED,
        "brbg"      => colorous::BROWN_GREEN,
        "prgn"      => colorous::PURPLE_GREEN,
        "piyg"      => colorous::PINK_GREEN,
        "puor"      => colorous::PURPLE_ORANGE,
        "rdbu"      => colorous::RED_BLUE,
        "rdgy"      => colorous::RED_GREY,
        "rdylbu"    => colorous::RED_YELLOW_BLUE,
        "rdylgn"    => colorous::RED_YELLOW_GREEN,
        "spectral"  => colorous::SPECTRAL,
        _ => return None,
    };
    Some(gradient)
}


pub fn available_colormaps() -> Vec<&'static str> {
    COLORMAP_NAMES.to_vec()
}


/// Continuous colormap over [0, 1].
#[derive(Clone)]
pub struct Colormap {
    name:     String,
    gradient: Gradient,
    reversed: bool,
}


impl fmt::Debug for Colormap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Colormap")
            .field("name", &self.name)
            .field("reversed", &self.reversed)
            .finish()
    }
}


impl Colormap {
    /// Names are matched case-insensitively, a `_r` suffix reverses the map.
    pub fn from_name(name: &str) -> Result<Self> {
        let (base, reversed) = match name.strip_suffix("_r") {
            Some(base) => (base, true),
            None       => (name, false),
        };

        let gradient = gradient_by_name(base)
            .ok_or_else(|| BandError::UnknownColormap {
                name: name.to_owned(),
                available: available_colormaps(),
            })?;

        Ok(Self {
            name: name.to_owned(),
            gradient,
            reversed,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn at(&self, t: f64) -> Srgb<u8> {
        let t = t.clamp(0.0, 1.0);
        let t = if self.reversed { 1.0 - t } else { t };
        let c = self.gradient.eval_continuous(t);
        Srgb::new(c.r, c.g, c.b)
    }

    /// `n` colours evenly spaced over the whole map, end points included.
    pub fn sample(&self, n: usize) -> Vec<Srgb<u8>> {
        match n {
            0 => vec![],
            1 => vec![self.at(0.0)],
            _ => (0 .. n).map(|i| self.at(i as f64 / (n - 1) as f64)).collect(),
        }
    }
}


/// One colour per band, in band order.
///
/// The map is cut into `nbands + 1` colours and the last one is left out, so band `i`
/// gets the colour at `i / nbands`. For the maps in `REVERSED_FOR_BANDS` the cut is
/// reversed first, which leaves out the low end instead.
pub fn band_colors(name: &str, nbands: usize) -> Result<Vec<Srgb<u8>>> {
    let mut colors = Colormap::from_name(name)?.sample(nbands + 1);
    if REVERSED_FOR_BANDS.contains(&name) {
        colors.reverse();
    }
    colors.truncate(nbands);
    Ok(colors)
}


pub fn to_hex(color: Srgb<u8>) -> String {
    format!("#{:02x}{:02x}{:02x}", color.red, color.green, color.blue)
}


#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_end_points() {
        let cmap = Colormap::from_name("viridis").unwrap();
        assert_eq!(to_hex(cmap.at(0.0)), "#440154");
        assert_eq!(to_hex(cmap.at(1.0)), "#fde725");
        assert_eq!(cmap.at(-1.0), cmap.at(0.0));

        let cmap = Colormap::from_name("viridis_r").unwrap();
        assert_eq!(to_hex(cmap.at(0.0)), "#fde725");
        assert_eq!(cmap.name(), "viridis_r");
    }

    #[test]
    fn test_all_names_resolve() {
        for name in available_colormaps() {
            assert!(Colormap::from_name(name).is_ok(), "{}", name);
            assert!(Colormap::from_name(&format!("{}_r", name)).is_ok(), "{}_r", name);
        }
    }

    #[test]
    fn test_sample() {
        let cmap = Colormap::from_name("Blues").unwrap();
        assert!(cmap.sample(0).is_empty());
        assert_eq!(cmap.sample(1), vec![cmap.at(0.0)]);

        let colors = cmap.sample(5);
        assert_eq!(colors.len(), 5);
        assert_eq!(colors[0], cmap.at(0.0));
        assert_eq!(colors[2], cmap.at(0.5));
        assert_eq!(colors[4], cmap.at(1.0));
    }

    #[test]
    fn test_band_colors_skip_top_end() {
        // three bands sit at 0, 1/3 and 2/3 of the map
        let cmap = Colormap::from_name("viridis").unwrap();
        let colors = band_colors("viridis", 3).unwrap();
        assert_eq!(colors, vec![cmap.at(0.0), cmap.at(1.0 / 3.0), cmap.at(2.0 / 3.0)]);
        assert_eq!(to_hex(colors[0]), "#440154");
        assert!(!colors.contains(&cmap.at(1.0)));

        assert_eq!(band_colors("viridis", 1).unwrap(), vec![cmap.at(0.0)]);
        assert!(band_colors("viridis", 0).unwrap().is_empty());
    }

    #[test]
    fn test_ylgnbu_reversed() {
        let cmap = Colormap::from_name("YlGnBu").unwrap();
        let colors = band_colors("YlGnBu", 3).unwrap();
        assert_eq!(colors, vec![cmap.at(1.0), cmap.at(2.0 / 3.0), cmap.at(1.0 / 3.0)]);

        // the near-white low end never colours a band
        assert!(!colors.contains(&cmap.at(0.0)));
    }

    #[test]
    fn test_unknown_colormap() {
        let err = Colormap::from_name("not_a_map").unwrap_err();
        assert!(matches!(err.downcast_ref::<BandError>(), Some(BandError::UnknownColormap { .. })));
        assert!(Colormap::from_name("YLGNBU").is_ok());
        assert!(Colormap::from_name("jet").is_err());
    }
}
