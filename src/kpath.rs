use std::{
    fmt,
    str::FromStr,
};

use crate::{
    types::Result,
    error::BandError,
    bands::Band,
};


/// Passing this as the k-path turns off ticks, labels and guide lines.
pub const NO_KPATH: &str = "NAN";


/// High-symmetry points along the path, one character each.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KPath {
    raw:    String,
    points: Option<Vec<char>>,
}


#[derive(Debug, Clone, PartialEq)]
pub struct Tick {
    pub position: f64,
    pub label:    String,
}


impl KPath {
    pub fn new(raw: &str) -> Self {
        let points = if raw == NO_KPATH {
            None
        } else {
            Some(raw.chars().collect())
        };

        Self {
            raw: raw.to_owned(),
            points,
        }
    }

    pub fn is_suppressed(&self) -> bool {
        self.points.is_none()
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Display labels, `G` is written as Γ.
    pub fn labels(&self) -> Vec<String> {
        self.points.iter()
            .flatten()
            .map(|&c| point_label(c))
            .collect()
    }

    /// Positions of the high-symmetry points on the k-distance axis of `band`.
    ///
    /// The first point sits at sample 0, point `i > 0` at sample `i * kspacing - 1`.
    pub fn ticks(&self, band: &Band, kspacing: usize) -> Result<Vec<Tick>> {
        let points = match &self.points {
            Some(p) => p,
            None => return Ok(vec![]),
        };

        points.iter()
            .enumerate()
            .map(|(i, &c)| -> Result<Tick> {
                let index = sample_index(i, kspacing);
                let position = *band.kdist.get(index)
                    .ok_or_else(|| BandError::TickOutOfRange {
                        label: c.to_string(),
                        index,
                        len: band.kdist.len(),
                    })?;
                Ok(Tick {
                    position,
                    label: point_label(c),
                })
            })
            .collect()
    }
}


fn sample_index(ipoint: usize, kspacing: usize) -> usize {
    if ipoint == 0 {
        0
    } else {
        (ipoint * kspacing).saturating_sub(1)
    }
}


fn point_label(c: char) -> String {
    match c {
        'G' => "Γ".to_owned(),
        _   => c.to_string(),
    }
}


impl FromStr for KPath {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        Ok(Self::new(s))
    }
}


impl fmt::Display for KPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.raw)
    }
}


#[cfg(test)]
mod test {
    use super::*;

    fn linear_band(n: usize) -> Band {
        Band::from_points((0 .. n).map(|i| (i as f64 * 0.1, 0.0)))
    }

    #[test]
    fn test_ticks_gm() {
        let band = linear_band(90);
        let ticks = KPath::new("GM").ticks(&band, 45).unwrap();

        assert_eq!(ticks.len(), 2);
        assert_eq!(ticks[0], Tick { position: band.kdist[0],  label: "Γ".to_owned() });
        assert_eq!(ticks[1], Tick { position: band.kdist[44], label: "M".to_owned() });
    }

    #[test]
    fn test_ticks_full_path() {
        let band = linear_band(8 * 10);
        let kpath = KPath::new("GMKGALHA");
        let ticks = kpath.ticks(&band, 10).unwrap();
        let positions = ticks.iter().map(|t| t.position).collect::<Vec<_>>();
        let expected = [0usize, 9, 19, 29, 39, 49, 59, 69].iter()
            .map(|&i| band.kdist[i])
            .collect::<Vec<_>>();

        assert_eq!(positions, expected);
        assert_eq!(kpath.labels(), vec!["Γ", "M", "K", "Γ", "A", "L", "H", "A"]);
    }

    #[test]
    fn test_nan_suppresses() {
        let kpath: KPath = "NAN".parse().unwrap();
        assert!(kpath.is_suppressed());
        assert!(kpath.labels().is_empty());
        assert!(kpath.ticks(&linear_band(3), 45).unwrap().is_empty());
        assert_eq!(kpath.to_string(), "NAN");
    }

    #[test]
    fn test_out_of_range() {
        let err = KPath::new("GM").ticks(&linear_band(44), 45).unwrap_err();
        match err.downcast_ref::<BandError>() {
            Some(BandError::TickOutOfRange { label, index, len }) => {
                assert_eq!(label, "M");
                assert_eq!(*index, 44);
                assert_eq!(*len, 44);
            },
            e => panic!("unexpected error: {:?}", e),
        }
    }
}
