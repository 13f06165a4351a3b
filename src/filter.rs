use log::debug;
use serde::{
    Serialize,
    Deserialize,
};

use crate::bands::{
    Band,
    BandSet,
};


/// Padding in eV around the display window inside which a band must stay to be kept.
///
/// Bands sticking slightly out of the window are still drawn, so the clipped plot keeps
/// its visual context.
pub const ENERGY_MARGIN: f64 = 5.0;


/// Display window `[emin, emax]` in eV, before Fermi level shifting.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EnergyWindow {
    pub emin: f64,
    pub emax: f64,
}


impl EnergyWindow {
    pub fn new(emin: f64, emax: f64) -> Self {
        Self { emin, emax }
    }

    pub fn lower_bound(&self) -> f64 {
        self.emin - ENERGY_MARGIN
    }

    pub fn upper_bound(&self) -> f64 {
        self.emax + ENERGY_MARGIN
    }

    /// Empty bands never pass. Both bounds are inclusive.
    pub fn contains(&self, band: &Band) -> bool {
        match band.energy_range() {
            Some((min, max)) => max <= self.upper_bound() && min >= self.lower_bound(),
            None => false,
        }
    }

    /// Returns the bands lying entirely in the padded window, in their original order.
    pub fn filter(&self, bands: &BandSet) -> BandSet {
        let kept = bands.iter()
            .enumerate()
            .filter(|(iband, band)| {
                let keep = self.contains(band);
                if !keep {
                    debug!("Band #{} dropped, energy range {:?} out of [{}, {}]",
                           iband + 1, band.energy_range(), self.lower_bound(), self.upper_bound());
                }
                keep
            })
            .map(|(_, band)| band.clone())
            .collect();

        BandSet::new(kept)
    }
}


pub fn remove_bands_energy_range(bands: &BandSet, emin: f64, emax: f64) -> BandSet {
    EnergyWindow::new(emin, emax).filter(bands)
}


#[cfg(test)]
mod test {
    use super::*;

    fn band(energies: &[f64]) -> Band {
        Band::from_points(energies.iter().enumerate().map(|(i, e)| (i as f64, *e)))
    }

    #[test]
    fn test_boundary_inclusive() {
        let bands: BandSet = "0.0 -1.0\n1.0 -0.5\n\n0.0 2.0\n1.0 6.0\n".parse().unwrap();
        let kept = remove_bands_energy_range(&bands, -3.0, 1.0);
        assert_eq!(kept, bands);

        let bands = BandSet::new(vec![band(&[-8.0, 0.0]), band(&[-8.0001, 0.0]), band(&[0.0, 6.0001])]);
        let kept = remove_bands_energy_range(&bands, -3.0, 1.0);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept.bands[0], bands.bands[0]);
    }

    #[test]
    fn test_empty_bands_dropped() {
        let bands: BandSet = "0.0 0.0\n1.0 0.5\n\n".parse().unwrap();
        assert_eq!(bands.len(), 2);

        let kept = remove_bands_energy_range(&bands, -3.0, 1.0);
        assert_eq!(kept.len(), 1);
        assert!(!kept.bands[0].is_empty());
    }

    #[test]
    fn test_order_and_count() {
        let bands = BandSet::new(vec![
            band(&[-20.0, -19.0]),
            band(&[-2.0, -1.0]),
            band(&[10.0, 12.0]),
            band(&[0.0, 0.5]),
            band(&[-1.0, 3.0]),
        ]);
        let window = EnergyWindow::new(-3.0, 1.0);
        let kept = window.filter(&bands);

        assert!(kept.len() <= bands.len());
        assert_eq!(kept.bands, vec![bands.bands[1].clone(), bands.bands[3].clone(), bands.bands[4].clone()]);

        // Filtering twice changes nothing
        assert_eq!(window.filter(&kept), kept);
        // Input untouched
        assert_eq!(bands.len(), 5);
    }

    #[test]
    fn test_band_spanning_window_dropped() {
        // Both ends stick out, even though the band crosses the window
        let bands = BandSet::new(vec![band(&[-9.0, 7.0])]);
        assert!(remove_bands_energy_range(&bands, -3.0, 1.0).is_empty());
    }
}
