use std::io::{ErrorKind, Read, Write};
use std::time::Duration;

use crc16::{State, MODBUS};
use log::{debug, info};
use serde_derive::Deserialize;
use serialport::{DataBits, Parity, StopBits};
use thiserror::Error;

static BAUD_RATE: u32 = 9600;
static RESPONSE_TIMEOUT: Duration = Duration::from_secs(3);

/// Input register holding the daily yield, 0.1 kWh per count.
static ENERGY_TODAY_REGISTER: u16 = 3014;
static READ_INPUT_REGISTERS: u8 = 0x04;

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct SerialConfig {
    pub device: String,
    pub address: u8,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            device: "/dev/ttyAMA0".into(),
            address: 1,
        }
    }
}

#[derive(Debug, Error)]
pub enum InverterError {
    #[error("serial port {device}: {source}")]
    Serial {
        device: String,
        source: serialport::Error,
    },
    #[error("serial i/o: {0}")]
    Io(#[from] std::io::Error),
    /// The inverter stayed silent for the whole response timeout.
    #[error("no response from inverter")]
    NoResponse,
    #[error("modbus exception 0x{0:02x}")]
    Exception(u8),
    #[error("malformed response: {0}")]
    Malformed(&'static str),
}

pub struct Inverter<'a> {
    config: &'a SerialConfig,
}

impl<'a> Inverter<'a> {
    pub fn new(config: &'a SerialConfig) -> Self {
        Self { config }
    }

    /// Reads the daily yield counter. The inverter shuts down overnight and
    /// answers zero while powering up; those readings come back as 0.0.
    pub fn read_energy_today(&self) -> Result<f64, InverterError> {
        let mut port = serialport::new(&self.config.device, BAUD_RATE)
            .data_bits(DataBits::Eight)
            .parity(Parity::None)
            .stop_bits(StopBits::One)
            .timeout(RESPONSE_TIMEOUT)
            .open()
            .map_err(|source| InverterError::Serial {
                device: self.config.device.clone(),
                source,
            })?;

        let request =
            read_input_registers_request(self.config.address, ENERGY_TODAY_REGISTER, 1);
        debug!("request frame: {request:02x?}");
        port.write_all(&request)?;

        let raw = read_register_response(&mut *port, self.config.address)?;
        let energy_today = normalize(f64::from(raw) / 10.0);
        info!("{:<23}{energy_today:10.2} kWh", "Generated (today)");
        Ok(energy_today)
    }
}

fn read_input_registers_request(station: u8, register: u16, count: u16) -> Vec<u8> {
    let mut frame = Vec::new();
    frame.push(station);
    frame.push(READ_INPUT_REGISTERS);
    frame.extend_from_slice(&register.to_be_bytes());
    frame.extend_from_slice(&count.to_be_bytes());
    let crc16 = State::<MODBUS>::calculate(&frame);
    // the RTU check field goes out low byte first
    frame.extend_from_slice(&crc16.to_le_bytes());
    frame
}

fn read_register_response<R: Read + ?Sized>(
    port: &mut R,
    station: u8,
) -> Result<u16, InverterError> {
    let mut frame = [0u8; 7];
    read_exact(port, &mut frame[..3])?;
    if frame[0] != station {
        return Err(InverterError::Malformed("response from wrong station"));
    }
    if frame[1] == READ_INPUT_REGISTERS | 0x80 {
        read_exact(port, &mut frame[3..5])?;
        verify_crc(&frame[..5])?;
        return Err(InverterError::Exception(frame[2]));
    }
    if frame[1] != READ_INPUT_REGISTERS {
        return Err(InverterError::Malformed("unexpected function code"));
    }
    if frame[2] != 2 {
        return Err(InverterError::Malformed("unexpected byte count"));
    }
    read_exact(port, &mut frame[3..])?;
    verify_crc(&frame)?;
    Ok(u16::from_be_bytes([frame[3], frame[4]]))
}

fn read_exact<R: Read + ?Sized>(port: &mut R, buf: &mut [u8]) -> Result<(), InverterError> {
    port.read_exact(buf).map_err(|e| match e.kind() {
        ErrorKind::TimedOut | ErrorKind::UnexpectedEof => InverterError::NoResponse,
        _ => InverterError::Io(e),
    })
}

fn verify_crc(frame: &[u8]) -> Result<(), InverterError> {
    let (data, check) = frame.split_at(frame.len() - 2);
    let crc16 = State::<MODBUS>::calculate(data);
    if crc16.to_le_bytes() != check {
        return Err(InverterError::Malformed("crc mismatch"));
    }
    Ok(())
}

fn normalize(energy: f64) -> f64 {
    if energy > 0.0 {
        energy
    } else {
        0.0
    }
}
