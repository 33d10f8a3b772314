//! Deployment configuration: serial port list and panel settings.
//!
//! Two files configure a deployment. The ports file is plain text, one
//! serial port identifier per line, first line first — the first port is
//! the primary panel. Settings are JSON and describe the panel geometry
//! and line parameters; every field has the reference deployment's value
//! as its default.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Parsed serial port list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortsFile {
    ports: Vec<String>,
}

impl PortsFile {
    /// Parse the ports file text. Blank lines and `#` comments are
    /// skipped; at least one port must remain.
    pub fn parse(text: &str) -> Result<Self> {
        let ports: Vec<String> = text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .map(String::from)
            .collect();
        if ports.is_empty() {
            bail!("ports file names no serial ports");
        }
        Ok(Self { ports })
    }

    /// Load and parse a ports file.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read ports file {:?}", path.as_ref()))?;
        Self::parse(&text)
            .with_context(|| format!("Failed to parse ports file {:?}", path.as_ref()))
    }

    /// The first listed port drives the primary panel.
    pub fn primary(&self) -> &str {
        &self.ports[0]
    }

    /// Any further ports, for additional panels.
    pub fn secondary(&self) -> &[String] {
        &self.ports[1..]
    }

    pub fn all(&self) -> &[String] {
        &self.ports
    }
}

/// Panel geometry and serial line parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentSettings {
    /// Wells per plate row; also the stride of the export well offset.
    #[serde(default = "default_columns_per_plate")]
    pub columns_per_plate: u8,
    /// Plate rows addressable on the panel.
    #[serde(default = "default_rows_per_plate")]
    pub rows_per_plate: u8,
    #[serde(default = "default_baud_rate")]
    pub baud_rate: u32,
    /// Brightness level pushed at startup.
    #[serde(default = "default_brightness")]
    pub default_brightness: u8,
    /// How long a send waits for the 2-byte echo.
    #[serde(default = "default_read_timeout_ms")]
    pub read_timeout_ms: u64,
}

fn default_columns_per_plate() -> u8 {
    12
}

fn default_rows_per_plate() -> u8 {
    8
}

fn default_baud_rate() -> u32 {
    38_400
}

fn default_brightness() -> u8 {
    200
}

fn default_read_timeout_ms() -> u64 {
    1_000
}

impl Default for DeploymentSettings {
    fn default() -> Self {
        Self {
            columns_per_plate: default_columns_per_plate(),
            rows_per_plate: default_rows_per_plate(),
            baud_rate: default_baud_rate(),
            default_brightness: default_brightness(),
            read_timeout_ms: default_read_timeout_ms(),
        }
    }
}

impl DeploymentSettings {
    /// Load settings from a JSON file.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read settings from {:?}", path.as_ref()))?;
        let settings: Self =
            serde_json::from_str(&content).context("Failed to parse settings JSON")?;
        settings.validate()?;
        Ok(settings)
    }

    /// Save settings to a JSON file.
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("Failed to serialize settings")?;
        fs::write(&path, json)
            .with_context(|| format!("Failed to write settings to {:?}", path.as_ref()))?;
        Ok(())
    }

    /// Check the settings against the wire format's field widths: the
    /// positional frame carries 5 column bits and 4 row bits.
    pub fn validate(&self) -> Result<()> {
        if self.columns_per_plate == 0 || self.columns_per_plate > 32 {
            bail!("columns_per_plate must be between 1 and 32");
        }
        if self.rows_per_plate == 0 || self.rows_per_plate > 16 {
            bail!("rows_per_plate must be between 1 and 16");
        }
        if self.baud_rate == 0 {
            bail!("baud_rate must be non-zero");
        }
        Ok(())
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_ports_file_first_line_is_primary() {
        let ports = PortsFile::parse("COM3\nCOM7\n").unwrap();
        assert_eq!(ports.primary(), "COM3");
        assert_eq!(ports.secondary(), ["COM7".to_string()]);
    }

    #[test]
    fn test_ports_file_skips_blanks_and_comments() {
        let ports = PortsFile::parse("# panels\n\n/dev/ttyUSB0\n  \n/dev/ttyUSB1\n").unwrap();
        assert_eq!(ports.all(), ["/dev/ttyUSB0", "/dev/ttyUSB1"]);
    }

    #[test]
    fn test_empty_ports_file_rejected() {
        assert!(PortsFile::parse("").is_err());
        assert!(PortsFile::parse("# only a comment\n").is_err());
    }

    #[test]
    fn test_ports_load_missing_file() {
        assert!(PortsFile::load_from_file("/nonexistent/ports.txt").is_err());
    }

    #[test]
    fn test_settings_defaults_match_reference_deployment() {
        let settings = DeploymentSettings::default();
        assert_eq!(settings.columns_per_plate, 12);
        assert_eq!(settings.rows_per_plate, 8);
        assert_eq!(settings.baud_rate, 38_400);
        assert_eq!(settings.default_brightness, 200);
        assert_eq!(settings.read_timeout(), Duration::from_millis(1_000));
    }

    #[test]
    fn test_settings_save_load_round_trip() {
        let settings = DeploymentSettings {
            columns_per_plate: 24,
            ..Default::default()
        };
        let file = NamedTempFile::new().unwrap();
        settings.save_to_file(file.path()).unwrap();
        let loaded = DeploymentSettings::load_from_file(file.path()).unwrap();
        assert_eq!(loaded, settings);
    }

    #[test]
    fn test_settings_partial_json_uses_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(br#"{"columns_per_plate": 16}"#).unwrap();
        file.flush().unwrap();

        let loaded = DeploymentSettings::load_from_file(file.path()).unwrap();
        assert_eq!(loaded.columns_per_plate, 16);
        assert_eq!(loaded.baud_rate, 38_400);
    }

    #[test]
    fn test_settings_validation_bounds() {
        let mut settings = DeploymentSettings::default();
        settings.columns_per_plate = 0;
        assert!(settings.validate().is_err());
        settings.columns_per_plate = 33;
        assert!(settings.validate().is_err());

        let mut settings = DeploymentSettings::default();
        settings.rows_per_plate = 17;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_settings_invalid_json_rejected() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"{ invalid json }").unwrap();
        file.flush().unwrap();
        assert!(DeploymentSettings::load_from_file(file.path()).is_err());
    }
}
