//! Instrument detection from run metadata.
//!
//! An Illumina instrument typically writes `RTAComplete.txt` when sequencing
//! has finished. Some instruments instead signal completion with a file
//! written once data has been copied off the instrument (`CopyComplete.txt`).

use crate::run_parameters::RunParameters;
use serde::Serialize;
use std::fmt;

pub const RTA_COMPLETE_MARKER: &str = "RTAComplete.txt";
pub const COPY_COMPLETE_MARKER: &str = "CopyComplete.txt";

/// Sequencer model that produced a runfolder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Default)]
pub enum InstrumentVariant {
    #[default]
    Generic,
    NovaSeq,
    NovaSeqXPlus,
    ISeq,
    MiSeq,
    HiSeq,
    HiSeqX,
}

/// Instrument id prefixes, tested in order. First match wins.
const ID_PREFIXES: [(&str, InstrumentVariant); 6] = [
    ("A", InstrumentVariant::NovaSeq),
    ("LH", InstrumentVariant::NovaSeqXPlus),
    ("FS", InstrumentVariant::ISeq),
    ("M", InstrumentVariant::MiSeq),
    ("D", InstrumentVariant::HiSeq),
    ("ST-E", InstrumentVariant::HiSeqX),
];

/// Top-level keys holding the instrument id when `Setup/ScannerID` is absent.
const INSTRUMENT_ID_KEYS: [&str; 4] = [
    "InstrumentName",
    "InstrumentId",
    "ScannerID",
    "InstrumentSerialNumber",
];

impl InstrumentVariant {
    /// Resolve the instrument from run metadata. Missing or unrecognized
    /// metadata resolves to `Generic`.
    pub fn resolve(run_parameters: Option<&RunParameters>) -> Self {
        run_parameters
            .and_then(instrument_id)
            .map_or(InstrumentVariant::Generic, Self::from_instrument_id)
    }

    pub fn from_instrument_id(id: &str) -> Self {
        ID_PREFIXES
            .iter()
            .find(|(prefix, _)| id.starts_with(prefix))
            .map_or(InstrumentVariant::Generic, |(_, variant)| *variant)
    }

    /// Name of the file this instrument writes when sequencing is complete
    pub fn marker_file(&self) -> &'static str {
        match self {
            InstrumentVariant::NovaSeq | InstrumentVariant::NovaSeqXPlus | InstrumentVariant::ISeq => {
                COPY_COMPLETE_MARKER
            }
            InstrumentVariant::Generic
            | InstrumentVariant::MiSeq
            | InstrumentVariant::HiSeq
            | InstrumentVariant::HiSeqX => RTA_COMPLETE_MARKER,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            InstrumentVariant::Generic => "Generic",
            InstrumentVariant::NovaSeq => "NovaSeq",
            InstrumentVariant::NovaSeqXPlus => "NovaSeqXPlus",
            InstrumentVariant::ISeq => "ISeq",
            InstrumentVariant::MiSeq => "MiSeq",
            InstrumentVariant::HiSeq => "HiSeq",
            InstrumentVariant::HiSeqX => "HiSeqX",
        }
    }
}

impl fmt::Display for InstrumentVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Extract the instrument id.
///
/// HiSeq and HiSeq X store it in `Setup/ScannerID`; other instruments keep it
/// at the top level of `RunParameters`, where the first present key wins even
/// if it is empty.
pub fn instrument_id(run_parameters: &RunParameters) -> Option<&str> {
    if let Some(id) = run_parameters
        .get_str(&["RunParameters", "Setup", "ScannerID"])
        .filter(|id| !id.is_empty())
    {
        return Some(id);
    }

    INSTRUMENT_ID_KEYS
        .iter()
        .find_map(|key| run_parameters.get(&["RunParameters", *key]))
        .and_then(|value| value.as_str())
        .filter(|id| !id.is_empty())
}
