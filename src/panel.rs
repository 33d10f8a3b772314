//! Panel transport: frame delivery with echo acknowledgement.
//!
//! A [`PanelConnection`] owns an optional [`PanelLink`]. With no link the
//! connection is offline (dry run): frames are logged and reported as
//! delivered. With a link, every send writes the 2-byte frame and then
//! reads exactly 2 bytes back; delivery succeeds only when the echo
//! matches the frame byte for byte. Communication problems never raise —
//! they come back as `false` so callers can keep navigating a
//! partially-lit panel.

use std::io::{self, Read, Write};
use std::time::Duration;

use serialport::SerialPort;
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::protocol::{encode_positional, Frame, Opcode};

/// Synchronous transport seam: write one frame, read its 2-byte echo.
pub trait PanelLink {
    fn write_frame(&mut self, frame: &[u8; 2]) -> io::Result<()>;
    fn read_echo(&mut self) -> io::Result<[u8; 2]>;
}

/// An explicit connection handle for one indicator panel.
pub struct PanelConnection {
    link: Option<Box<dyn PanelLink>>,
}

impl PanelConnection {
    /// A connection with no transport: sends log and report success.
    pub fn offline() -> Self {
        Self { link: None }
    }

    /// A connection over a concrete transport.
    pub fn with_link(link: Box<dyn PanelLink>) -> Self {
        Self { link: Some(link) }
    }

    pub fn is_offline(&self) -> bool {
        self.link.is_none()
    }

    /// Deliver one frame. Returns `true` when the panel echoed the frame
    /// back exactly (or the connection is offline); any write failure,
    /// read failure, or echo mismatch returns `false`.
    pub fn send(&mut self, frame: Frame) -> bool {
        let bytes = frame.bytes();
        let Some(link) = self.link.as_mut() else {
            info!("dry-run frame {:08b} {:08b}", bytes[0], bytes[1]);
            return true;
        };
        if let Err(err) = link.write_frame(&bytes) {
            warn!("frame write failed: {err}");
            return false;
        }
        match link.read_echo() {
            Ok(echo) if echo == bytes => {
                debug!("frame {:08b} {:08b} acknowledged", bytes[0], bytes[1]);
                true
            }
            Ok(echo) => {
                warn!(
                    "echo mismatch: sent {:02X?}, received {:02X?}",
                    bytes, echo
                );
                false
            }
            Err(err) => {
                warn!("echo read failed: {err}");
                false
            }
        }
    }
}

/// Broadcast the fixed clear frame to every panel, one flag per panel.
pub fn clear_panels(panels: &mut [PanelConnection]) -> Vec<bool> {
    broadcast(panels, encode_positional('a', 1, Opcode::Clear))
}

/// Broadcast the fixed update frame to every panel, one flag per panel.
pub fn update_panels(panels: &mut [PanelConnection]) -> Vec<bool> {
    broadcast(panels, encode_positional('a', 1, Opcode::Update))
}

fn broadcast(panels: &mut [PanelConnection], frame: Frame) -> Vec<bool> {
    panels.iter_mut().map(|panel| panel.send(frame)).collect()
}

/// Blank every panel, push the blank state, then drop the connections.
/// Closing an offline connection is a no-op.
pub fn close_panels(mut panels: Vec<PanelConnection>) {
    clear_panels(&mut panels);
    update_panels(&mut panels);
    for panel in &mut panels {
        if panel.link.take().is_some() {
            debug!("panel connection closed");
        }
    }
}

/// Production [`PanelLink`] over a serial port, 8 data bits, no parity,
/// one stop bit.
pub struct SerialLink {
    port: Box<dyn SerialPort>,
}

impl SerialLink {
    /// Open `port_name` at the given baud rate. Reads block until the
    /// echo arrives or the timeout elapses.
    pub fn open(port_name: &str, baud_rate: u32, timeout: Duration) -> Result<Self> {
        let port = serialport::new(port_name, baud_rate)
            .data_bits(serialport::DataBits::Eight)
            .parity(serialport::Parity::None)
            .stop_bits(serialport::StopBits::One)
            .timeout(timeout)
            .open()?;
        info!(port_name, baud_rate, "serial panel connected");
        Ok(Self { port })
    }
}

impl PanelLink for SerialLink {
    fn write_frame(&mut self, frame: &[u8; 2]) -> io::Result<()> {
        self.port.write_all(frame)
    }

    fn read_echo(&mut self) -> io::Result<[u8; 2]> {
        let mut echo = [0u8; 2];
        self.port.read_exact(&mut echo)?;
        Ok(echo)
    }
}

/// Names of the serial ports visible on this machine.
pub fn available_ports() -> Result<Vec<String>> {
    let ports = serialport::available_ports()?;
    Ok(ports.into_iter().map(|p| p.port_name).collect())
}
