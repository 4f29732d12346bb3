//! Serial port access

use crate::config::ConnectionConfig;
use crate::error::LinkError;
use serialport::{ClearBuffer, DataBits, FlowControl, Parity, SerialPort, SerialPortType, StopBits};
use std::io::{self, Read};
use tracing::{error, info};

/// Byte source the reader thread pulls records from
pub trait RecordPort: Read + Send {
    /// Discard bytes received by the driver but not yet read
    fn clear_input(&mut self) -> io::Result<()>;
}

impl RecordPort for Box<dyn SerialPort> {
    fn clear_input(&mut self) -> io::Result<()> {
        self.clear(ClearBuffer::Input).map_err(io::Error::from)
    }
}

/// Open the configured port (8N1, no flow control)
pub fn open_port(config: &ConnectionConfig) -> Result<Box<dyn SerialPort>, LinkError> {
    info!(
        "Trying to connect to {} at {} baud",
        config.port, config.baud_rate
    );

    let port = serialport::new(config.port.as_str(), config.baud_rate)
        .data_bits(DataBits::Eight)
        .parity(Parity::None)
        .stop_bits(StopBits::One)
        .flow_control(FlowControl::None)
        .timeout(config.read_timeout())
        .open()
        .map_err(|e| {
            error!(
                "Failed to connect with {} at {} baud: {}",
                config.port, config.baud_rate, e
            );
            LinkError::Connection {
                port: config.port.clone(),
                baud_rate: config.baud_rate,
                reason: e.to_string(),
            }
        })?;

    info!("Connected to {} at {} baud", config.port, config.baud_rate);
    Ok(port)
}

/// A serial port visible to the host
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortSummary {
    /// Device path or COM name
    pub name: String,
    /// Human readable transport description
    pub kind: String,
}

/// List serial ports present on this machine
pub fn available_ports() -> Result<Vec<PortSummary>, LinkError> {
    let ports = serialport::available_ports().map_err(|e| LinkError::Enumeration(e.to_string()))?;

    Ok(ports
        .into_iter()
        .map(|info| PortSummary {
            name: info.port_name,
            kind: describe_port_type(&info.port_type),
        })
        .collect())
}

fn describe_port_type(port_type: &SerialPortType) -> String {
    match port_type {
        SerialPortType::UsbPort(usb) => {
            let mut kind = format!("USB {:04x}:{:04x}", usb.vid, usb.pid);
            if let Some(product) = &usb.product {
                kind.push(' ');
                kind.push_str(product);
            }
            kind
        }
        SerialPortType::PciPort => "PCI".to_string(),
        SerialPortType::BluetoothPort => "Bluetooth".to_string(),
        SerialPortType::Unknown => "Unknown".to_string(),
    }
}
