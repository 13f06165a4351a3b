//! Band data loader.
//!
//! The input is the plain text dump produced by most band-structure post-processors:
//! two columns (k-distance and energy) per line, one band per block, blocks separated
//! by blank lines. Lines starting with `#k-distance` are headers and skipped wherever
//! they appear.
use std::{
    io::{
        self,
        BufRead,
        BufReader,
        BufWriter,
        Write,
    },
    fs,
    path::Path,
    str::FromStr,
};

use anyhow::Context;
use itertools::Itertools;
use log::debug;

use crate::{
    types::{
        Result,
        Vector,
    },
    error::BandError,
};


pub const HEADER_MARKER: &str = "#k-distance";


/// One continuous eigenvalue branch sampled along the k-path.
#[derive(Debug, Clone, PartialEq)]
pub struct Band {
    pub kdist:  Vector<f64>,
    pub energy: Vector<f64>,
}


impl Band {
    pub fn from_points(points: impl IntoIterator<Item = (f64, f64)>) -> Self {
        let (kdist, energy): (Vec<f64>, Vec<f64>) = points.into_iter().unzip();
        Self {
            kdist:  Vector::from_vec(kdist),
            energy: Vector::from_vec(energy),
        }
    }

    pub fn len(&self) -> usize {
        self.energy.len()
    }

    pub fn is_empty(&self) -> bool {
        self.energy.is_empty()
    }

    /// `(min, max)` of the energies, `None` for an empty band.
    pub fn energy_range(&self) -> Option<(f64, f64)> {
        self.energy.iter().copied().minmax().into_option()
    }

    /// Copy of this band with `efermi` subtracted from every energy.
    pub fn shifted(&self, efermi: f64) -> Self {
        Self {
            kdist:  self.kdist.clone(),
            energy: self.energy.mapv(|e| e - efermi),
        }
    }
}


/// Bands in order of appearance in the source file.
///
/// The order matters: colours are assigned by position and the k-path ticks are
/// looked up on the first band.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BandSet {
    pub bands: Vec<Band>,
}


impl BandSet {
    pub fn new(bands: Vec<Band>) -> Self {
        Self { bands }
    }

    pub fn from_file(path: &(impl AsRef<Path> + ?Sized)) -> Result<Self> {
        let path = path.as_ref();
        let file = fs::File::open(path).map_err(|e| -> anyhow::Error {
            if e.kind() == io::ErrorKind::NotFound {
                BandError::NotFound { path: path.to_owned() }.into()
            } else {
                anyhow::Error::new(e).context(format!("Cannot open band file {:?}", path))
            }
        })?;

        Self::from_reader(BufReader::new(file))
    }

    /// Blank lines seal the current band, even an empty one, so a trailing blank line
    /// leaves an empty band at the end.
    pub fn from_reader(reader: impl BufRead) -> Result<Self> {
        let mut bands = Vec::new();
        let mut current: Vec<(f64, f64)> = Vec::new();

        for (iline, line) in reader.lines().enumerate() {
            let line = line.with_context(|| format!("Failed to read line {}", iline + 1))?;
            let row = line.trim();

            if row.is_empty() {
                bands.push(Band::from_points(current.drain(..)));
                continue;
            }

            let mut tokens = row.split_whitespace();
            let first = tokens.next().unwrap_or_default();
            if first == HEADER_MARKER {
                continue;
            }

            let parse_error = |reason: String| BandError::Parse {
                line:    iline + 1,
                content: row.to_owned(),
                reason,
            };

            let second = tokens.next()
                .ok_or_else(|| parse_error("expected two columns, found one".to_owned()))?;
            let k = first.parse::<f64>()
                .map_err(|e| parse_error(format!("invalid k-distance {:?}: {}", first, e)))?;
            let e = second.parse::<f64>()
                .map_err(|e| parse_error(format!("invalid energy {:?}: {}", second, e)))?;

            current.push((k, e));
        }
        bands.push(Band::from_points(current));

        debug!("Parsed {} band blocks", bands.len());
        Ok(Self { bands })
    }

    pub fn len(&self) -> usize {
        self.bands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bands.is_empty()
    }

    pub fn first(&self) -> Option<&Band> {
        self.bands.first()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Band> {
        self.bands.iter()
    }

    pub fn shifted(&self, efermi: f64) -> Self {
        Self {
            bands: self.bands.iter().map(|b| b.shifted(efermi)).collect(),
        }
    }
}


impl FromStr for BandSet {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_reader(s.as_bytes())
    }
}


impl<'a> IntoIterator for &'a BandSet {
    type Item = &'a Band;
    type IntoIter = std::slice::Iter<'a, Band>;

    fn into_iter(self) -> Self::IntoIter {
        self.bands.iter()
    }
}


/// Dump bands in the same layout `BandSet::from_reader` reads, so the output can be
/// fed back in or replotted with other tools.
pub fn write_bands_to_txt(file_name: &(impl AsRef<Path> + ?Sized), bands: &BandSet, comment: &str) -> Result<()> {
    let file = fs::OpenOptions::new()
        .create(true)
        .truncate(true)
        .write(true)
        .open(file_name)?;
    let mut f = BufWriter::new(file);

    writeln!(f, "{}  {}", HEADER_MARKER, comment.trim())?;

    for (iband, band) in bands.iter().enumerate() {
        if iband > 0 {
            writeln!(f)?;
        }
        for (k, e) in band.kdist.iter().zip(band.energy.iter()) {
            writeln!(f, "  {:15.6}  {:15.6}", k, e)?;
        }
    }

    f.flush()?;
    Ok(())
}


#[cfg(test)]
mod test {
    use super::*;
    use tempdir::TempDir;

    const SAMPLE: &str = "\
#k-distance  Energy
0.0 -1.0
1.0 -0.5

#k-distance  Energy
0.0 2.0
1.0 6.0
";

    #[test]
    fn test_parse_sample() {
        let bands: BandSet = SAMPLE.parse().unwrap();
        assert_eq!(bands.len(), 2);
        assert_eq!(bands.bands[0].kdist.to_vec(), vec![0.0, 1.0]);
        assert_eq!(bands.bands[0].energy.to_vec(), vec![-1.0, -0.5]);
        assert_eq!(bands.bands[1].energy.to_vec(), vec![2.0, 6.0]);
    }

    #[test]
    fn test_trailing_blank_line() {
        let bands: BandSet = "0.0 1.0\n1.0 2.0\n\n".parse().unwrap();
        assert_eq!(bands.len(), 2);
        assert!(bands.bands[1].is_empty());

        let bands: BandSet = "0.0 1.0\n\n\n0.5 3.0\n".parse().unwrap();
        assert_eq!(bands.len(), 3);
        assert!(bands.bands[1].is_empty());
        assert_eq!(bands.bands[2].len(), 1);
    }

    #[test]
    fn test_header_anywhere() {
        let bands: BandSet = "0.0 1.0\n#k-distance\n1.0 2.0\n".parse().unwrap();
        assert_eq!(bands.len(), 1);
        assert_eq!(bands.bands[0].energy.to_vec(), vec![1.0, 2.0]);
    }

    #[test]
    fn test_lengths_match() {
        let bands: BandSet = "0 1 99\n  0.5\t2.5 \n\n0 -1\n\n".parse().unwrap();
        assert!(bands.iter().all(|b| b.kdist.len() == b.energy.len()));
        assert_eq!(bands.bands[0].energy.to_vec(), vec![1.0, 2.5]);
    }

    #[test]
    fn test_parse_errors() {
        let err = "0.0 1.0\n0.5\n".parse::<BandSet>().unwrap_err();
        match err.downcast_ref::<BandError>() {
            Some(BandError::Parse { line, .. }) => assert_eq!(*line, 2),
            e => panic!("unexpected error: {:?}", e),
        }

        let err = "0.0 abc\n".parse::<BandSet>().unwrap_err();
        assert!(matches!(err.downcast_ref::<BandError>(), Some(BandError::Parse { line: 1, .. })));

        let err = "x 1.0\n".parse::<BandSet>().unwrap_err();
        assert!(matches!(err.downcast_ref::<BandError>(), Some(BandError::Parse { .. })));
    }

    #[test]
    fn test_not_found() {
        let err = BandSet::from_file("/definitely/not/here/BAND.dat").unwrap_err();
        assert!(matches!(err.downcast_ref::<BandError>(), Some(BandError::NotFound { .. })));
    }

    #[test]
    fn test_energy_range() {
        let band = Band::from_points(vec![(0.0, -1.0), (0.5, 3.0), (1.0, 0.5)]);
        assert_eq!(band.energy_range(), Some((-1.0, 3.0)));
        assert_eq!(Band::from_points(vec![]).energy_range(), None);
        assert_eq!(band.shifted(1.0).energy.to_vec(), vec![-2.0, 2.0, -0.5]);
    }

    #[test]
    fn test_write_and_read_back() {
        let bands: BandSet = SAMPLE.parse().unwrap();
        let tmpdir = TempDir::new("rsband_test").unwrap();
        let path = tmpdir.path().join("bands.txt");

        write_bands_to_txt(&path, &bands, "E-Ef(eV)").unwrap();
        let read = BandSet::from_file(&path).unwrap();
        assert_eq!(read, bands);
    }
}
