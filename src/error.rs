use std::path::PathBuf;

use thiserror::Error;


/// Failures raised while turning a band file into a figure.
///
/// These travel inside `anyhow::Error`, use `downcast_ref::<BandError>()` to inspect them.
#[derive(Debug, Error)]
pub enum BandError {
    #[error("Band file {path:?} not found")]
    NotFound { path: PathBuf },

    #[error("Parse error at line {line} ({content:?}): {reason}")]
    Parse {
        line:    usize,
        content: String,
        reason:  String,
    },

    #[error("No band left after filtering, try a wider energy window")]
    EmptyBandSet,

    #[error("K-point {label:?} points to sample index {index}, but the first band has only {len} samples")]
    TickOutOfRange {
        label: String,
        index: usize,
        len:   usize,
    },

    #[error("Invalid colormap {name:?}, available colormaps: {available:?}")]
    UnknownColormap {
        name:      String,
        available: Vec<&'static str>,
    },
}
