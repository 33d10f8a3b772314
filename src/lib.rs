//! platelight library
//!
//! Core functionality for locating and illuminating sample wells on
//! storage plates: the location data model and its ordering semantics,
//! the sorted compound-request store, the plate navigation state machine,
//! and the 2-byte command protocol that drives the LED indicator panels.

pub mod cli;
pub mod config_file;
pub mod error;
pub mod export;
pub mod location;
pub mod navigation;
pub mod panel;
pub mod protocol;
pub mod request;

// Re-export main types for convenience
pub use config_file::{DeploymentSettings, PortsFile};
pub use error::{PlatelightError, Result};
pub use export::{export_file, write_syrup};
pub use location::{well_column, well_row, Location, LocationShape};
pub use navigation::{NavigationEngine, SearchOutcome, TransitionOutcome};
pub use panel::{
    available_ports, clear_panels, close_panels, update_panels, PanelConnection, PanelLink,
    SerialLink,
};
pub use protocol::{
    decode_positional, encode_brightness, encode_positional, Frame, Opcode,
};
pub use request::{CompoundRequest, RequestStore};
