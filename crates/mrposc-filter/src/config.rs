//! Address table configuration
//!
//! Loads the table a filter runs against from YAML. The table is read once at
//! startup; there is no reload.

use crate::address::{AddressSpec, AddressTable, MRP_ADDRESSES};
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use tracing::{debug, info};

/// A table entry in configuration: a bare path or a documented spec
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AddressEntry {
    /// Just the address
    Path(String),
    /// Address plus documentation
    Spec(AddressSpec),
}

impl AddressEntry {
    pub fn path(&self) -> &str {
        match self {
            AddressEntry::Path(path) => path.as_str(),
            AddressEntry::Spec(spec) => &*spec.path,
        }
    }

    fn into_spec(self) -> AddressSpec {
        match self {
            AddressEntry::Path(path) => AddressSpec::new(path),
            AddressEntry::Spec(spec) => spec,
        }
    }
}

/// Complete address table configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableConfig {
    /// Start from the built-in MRP addresses
    #[serde(default = "default_include_defaults")]
    pub include_defaults: bool,
    /// Drop every built-in entry flagged legacy
    #[serde(default)]
    pub exclude_legacy: bool,
    /// Additional entries
    #[serde(default)]
    pub addresses: Vec<AddressEntry>,
    /// Paths to drop from the table
    #[serde(default)]
    pub exclude: Vec<String>,
}

fn default_include_defaults() -> bool {
    true
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            include_defaults: true,
            exclude_legacy: false,
            addresses: Vec::new(),
            exclude: Vec::new(),
        }
    }
}

impl TableConfig {
    /// Load table configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read table file: {}", path.display()))?;

        let config = Self::from_yaml(&contents)
            .with_context(|| format!("Failed to parse table file: {}", path.display()))?;

        info!(
            path = %path.display(),
            include_defaults = config.include_defaults,
            extra = config.addresses.len(),
            excluded = config.exclude.len(),
            "Loaded address table configuration"
        );

        Ok(config)
    }

    /// Parse and validate table configuration from YAML
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: TableConfig = serde_yaml::from_str(yaml).context("Invalid table YAML")?;
        config.validate()?;
        Ok(config)
    }

    /// Entries before exclusions are applied
    fn candidates(&self) -> Vec<AddressEntry> {
        let mut entries = Vec::new();
        if self.include_defaults {
            entries.extend(
                MRP_ADDRESSES
                    .iter()
                    .filter(|spec| !(self.exclude_legacy && spec.legacy))
                    .cloned()
                    .map(AddressEntry::Spec),
            );
        }
        entries.extend(self.addresses.iter().cloned());
        entries
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for entry in self.candidates() {
            let path = entry.path().to_string();
            entry
                .into_spec()
                .validate()
                .with_context(|| format!("Invalid table entry: {}", path))?;
            if !seen.insert(path.clone()) {
                return Err(anyhow!("Duplicate address in table: {}", path));
            }
        }

        for path in &self.exclude {
            if !seen.contains(path) {
                return Err(anyhow!("Excluded address is not in the table: {}", path));
            }
        }

        Ok(())
    }

    /// Build the immutable table
    pub fn into_table(self) -> Result<AddressTable> {
        self.validate()?;

        let exclude: HashSet<&str> = self.exclude.iter().map(String::as_str).collect();
        let entries: Vec<AddressSpec> = self
            .candidates()
            .into_iter()
            .filter(|entry| !exclude.contains(entry.path()))
            .map(AddressEntry::into_spec)
            .collect();

        let table = AddressTable::new(entries).context("Failed to build address table")?;
        debug!(entries = table.len(), "Address table built");

        Ok(table)
    }

    /// Save configuration to a YAML file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let yaml = serde_yaml::to_string(self).context("Failed to serialize table config")?;

        fs::write(path, yaml)
            .with_context(|| format!("Failed to write table file: {}", path.display()))?;

        info!(path = %path.display(), "Saved address table configuration");

        Ok(())
    }

    /// Example: the MRP table without legacy entries, plus a project address
    pub fn example() -> Self {
        TableConfig {
            include_defaults: true,
            exclude_legacy: true,
            addresses: vec![AddressEntry::Spec(AddressSpec {
                path: "/ui/status/thermal".into(),
                args: "".into(),
                summary: "query coil temperature".into(),
                legacy: false,
            })],
            exclude: vec!["/ptrk/pitch".to_string()],
        }
    }
}
