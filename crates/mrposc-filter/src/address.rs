//! Address table for the MRP control protocol
//!
//! The table is an immutable set of OSC addresses built once and shared through
//! `Arc`. Membership is exact: case-sensitive full-string equality, with no
//! trimming, no slash canonicalisation and no prefix or wildcard matching.

use crate::filter::FilterResult;
use mrposc_core::error::FilterError;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::HashMap;
use std::sync::Arc;

/// One entry of an address table.
///
/// Only `path` takes part in filtering. `args` and `summary` document the
/// payload the device expects and are never enforced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressSpec {
    /// Slash-delimited OSC address, e.g. `/ui/volume/raw`
    pub path: Cow<'static, str>,
    /// Expected argument shape
    #[serde(default, skip_serializing_if = "str::is_empty")]
    pub args: Cow<'static, str>,
    /// Effect on the device
    #[serde(default, skip_serializing_if = "str::is_empty")]
    pub summary: Cow<'static, str>,
    /// Kept for older control surfaces
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub legacy: bool,
}

impl AddressSpec {
    /// Entry with no documentation
    pub fn new(path: impl Into<Cow<'static, str>>) -> Self {
        Self {
            path: path.into(),
            args: Cow::Borrowed(""),
            summary: Cow::Borrowed(""),
            legacy: false,
        }
    }

    const fn documented(path: &'static str, args: &'static str, summary: &'static str) -> Self {
        Self {
            path: Cow::Borrowed(path),
            args: Cow::Borrowed(args),
            summary: Cow::Borrowed(summary),
            legacy: false,
        }
    }

    const fn legacy(path: &'static str) -> Self {
        Self {
            path: Cow::Borrowed(path),
            args: Cow::Borrowed(""),
            summary: Cow::Borrowed("legacy"),
            legacy: true,
        }
    }

    /// Check that the path can be an OSC address
    pub fn validate(&self) -> Result<(), FilterError> {
        let path = &*self.path;
        if path.is_empty() {
            return Err(FilterError::invalid(path, "address cannot be empty"));
        }
        if !path.starts_with('/') {
            return Err(FilterError::invalid(path, "address must start with '/'"));
        }
        if path.chars().any(char::is_whitespace) {
            return Err(FilterError::invalid(path, "address cannot contain whitespace"));
        }
        Ok(())
    }
}

/// Control addresses understood by the Magnetic Resonator Piano.
pub const MRP_ADDRESSES: &[AddressSpec] = &[
    AddressSpec::documented("/midi", "byte a, byte b, byte c", "standard 3-byte MIDI message, e.g. 144 90 60"),
    AddressSpec::documented("/pedal/damper", "int value | float value", "change damper value"),
    AddressSpec::documented("/pedal/sostenuto", "int value | float value", "change sostenuto value"),
    AddressSpec::documented("/ptrk/mute", "[int notes]", "mute pitch tracking for notes"),
    AddressSpec::documented("/ptrk/pitch", "float freq, float amp", "pitch tracking input"),
    AddressSpec::documented("/quality/brightness", "int channel, int note, float brightness", "harmonic content on a linear scale"),
    AddressSpec::documented("/quality/intensity", "int channel, int note, float intensity", "amplitude and harmonic content, relative to current intensity"),
    AddressSpec::documented("/quality/pitch", "int channel, int note, float pitch", "frequency relative to the note's fundamental"),
    AddressSpec::documented("/quality/pitch/vibrato", "int channel, int note, float pitch", "zero-centred periodic frequency modulation"),
    AddressSpec::documented("/quality/harmonic", "int channel, int note, float harmonic", ""),
    AddressSpec::documented("/quality/harmonics/raw", "int channel, int note, [float harmonics]", ""),
    AddressSpec::documented("/ui/allnotesoff", "", "turn all current notes off"),
    AddressSpec::legacy("/ui/cal/save"),
    AddressSpec::legacy("/ui/cal/load"),
    AddressSpec::documented("/ui/cal/phase", "float p", "calibration phase"),
    AddressSpec::documented("/ui/cal/volume", "float v", "calibration volume"),
    AddressSpec::documented("/ui/cal/currentnote", "int n", "announce the current note to update the UI"),
    AddressSpec::legacy("/ui/gate"),
    AddressSpec::legacy("/ui/harmonic"),
    AddressSpec::documented("/ui/patch/up", "", "increment current program"),
    AddressSpec::documented("/ui/patch/down", "", "decrement current program"),
    AddressSpec::documented("/ui/patch/set", "int p", "set the current program (0-N)"),
    AddressSpec::documented("/ui/pianokey/calibrate/start", "", "start key calibration"),
    AddressSpec::documented("/ui/pianokey/calibrate/finish", "", "finish key calibration"),
    AddressSpec::documented("/ui/pianokey/calibrate/abort", "", "abort key calibration"),
    AddressSpec::documented("/ui/pianokey/calibrate/idle", "", "idle key calibration"),
    AddressSpec::documented("/ui/pianokey/calibrate/disable", "[int keys]", "disable the given keys (0-127)"),
    AddressSpec::documented("/ui/pianokey/calibrate/save", "", "save to mrp-pb-calibration.txt"),
    AddressSpec::documented("/ui/pianokey/calibrate/load", "", "load from mrp-pb-calibration.txt"),
    AddressSpec::documented("/ui/pianokey/calibrate/clear", "", "clear key calibration"),
    AddressSpec::documented("/ui/status/keyboard", "", "real-time calibration status"),
    AddressSpec::legacy("/ui/tuning/global"),
    AddressSpec::legacy("/ui/tuning/stretch"),
    AddressSpec::documented("/ui/volume", "float vol", "0-1, >0.5 ? 4^((vol-0.5)/0.5) : 10^((vol-0.5)/0.5)"),
    AddressSpec::documented("/ui/volume/raw", "float vol", "0-1, set volume directly"),
];

static SHARED_MRP: Lazy<Arc<AddressTable>> = Lazy::new(|| Arc::new(AddressTable::mrp()));

/// Immutable set of recognised addresses
#[derive(Debug, Clone)]
pub struct AddressTable {
    /// Entries in declaration order
    entries: Vec<AddressSpec>,
    /// Path to index into `entries`
    index: HashMap<String, usize>,
}

impl AddressTable {
    /// Build a table from entries, rejecting malformed and duplicate paths
    pub fn new<I>(entries: I) -> Result<Self, FilterError>
    where
        I: IntoIterator<Item = AddressSpec>,
    {
        let mut table = Self {
            entries: Vec::new(),
            index: HashMap::new(),
        };

        for entry in entries {
            entry.validate()?;
            if table.index.contains_key(&*entry.path) {
                return Err(FilterError::DuplicateAddress {
                    address: entry.path.into_owned(),
                });
            }
            table
                .index
                .insert(entry.path.to_string(), table.entries.len());
            table.entries.push(entry);
        }

        Ok(table)
    }

    /// Build a table from bare paths
    pub fn from_paths<I, S>(paths: I) -> Result<Self, FilterError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(
            paths
                .into_iter()
                .map(|p| AddressSpec::new(Into::<String>::into(p))),
        )
    }

    /// The MRP protocol table
    pub fn mrp() -> Self {
        let entries = MRP_ADDRESSES.to_vec();
        let index = entries
            .iter()
            .enumerate()
            .map(|(i, e)| (e.path.to_string(), i))
            .collect();
        Self { entries, index }
    }

    /// Process-wide MRP table, built on first use
    pub fn shared_mrp() -> Arc<AddressTable> {
        Arc::clone(&SHARED_MRP)
    }

    /// Exact membership test
    #[inline]
    pub fn contains(&self, address: &str) -> bool {
        self.index.contains_key(address)
    }

    /// Membership as a filter result
    #[inline]
    pub fn evaluate(&self, address: &str) -> FilterResult {
        if self.contains(address) {
            FilterResult::Pass
        } else {
            FilterResult::Block
        }
    }

    /// Look up the documentation for an address
    pub fn get(&self, address: &str) -> Option<&AddressSpec> {
        self.index.get(address).map(|&i| &self.entries[i])
    }

    /// Entries in declaration order
    pub fn iter(&self) -> impl Iterator<Item = &AddressSpec> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<'a> IntoIterator for &'a AddressTable {
    type Item = &'a AddressSpec;
    type IntoIter = std::slice::Iter<'a, AddressSpec>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
