//! Device communication client.

use std::io::{Read, Write};
use std::time::{Duration, Instant};

use anyhow::Result;
use serialport::SerialPort;

/// Baud rate that arms the device's bootloader reset
pub const TOUCH_BAUD_RATE: u32 = 1200;

/// Find candidate CDC-ACM ports (Linux ttyACM, macOS usbmodem).
pub fn find_cdc_ports() -> Result<Vec<String>> {
    let ports = serialport::available_ports()?;

    Ok(ports
        .into_iter()
        .map(|info| info.port_name)
        .filter(|name| name.contains("ttyACM") || name.contains("usbmodem"))
        .collect())
}

/// Find an echo port by sending a short message to each CDC-ACM port.
pub fn find_echo_port() -> Result<String> {
    for port_name in find_cdc_ports()? {
        if let Ok(mut client) = DeviceClient::new(&port_name, 115200) {
            client.set_timeout(Duration::from_millis(500));
            if let Ok(echoed) = client.echo(b"ping") {
                if echoed == b"ping" {
                    return Ok(port_name);
                }
            }
        }
    }

    anyhow::bail!("No echo port found - ensure the device is running the echo loop")
}

/// Resolve a port argument - returns the port path if not "auto", otherwise auto-detects.
pub fn resolve_port(port_arg: &str) -> Result<String> {
    if port_arg == "auto" {
        find_echo_port()
    } else {
        Ok(port_arg.to_string())
    }
}

/// Returns true if the port is currently enumerated by the OS.
pub fn port_present(port_name: &str) -> Result<bool> {
    let ports = serialport::available_ports()?;
    Ok(ports.iter().any(|info| info.port_name == port_name))
}

/// Open the port at 1200 baud and close it with DTR dropped.
///
/// A device on the CDC transport arms its bootloader reset when this
/// happens and drops off the bus shortly after.
pub fn bootloader_touch(port_name: &str) -> Result<()> {
    let mut port = serialport::new(port_name, TOUCH_BAUD_RATE)
        .timeout(Duration::from_millis(100))
        .open()?;

    port.write_data_terminal_ready(true)?;
    std::thread::sleep(Duration::from_millis(50));
    port.write_data_terminal_ready(false)?;
    drop(port);

    Ok(())
}

/// Wait for the port to disappear from the OS port list.
pub fn wait_for_disconnect(port_name: &str, timeout: Duration) -> Result<()> {
    let start = Instant::now();
    while start.elapsed() < timeout {
        if !port_present(port_name)? {
            return Ok(());
        }
        std::thread::sleep(Duration::from_millis(50));
    }

    anyhow::bail!("{} still present after {:?}", port_name, timeout)
}

/// Client for a device echoing everything it receives on the CDC port.
pub struct DeviceClient {
    port: Box<dyn SerialPort>,
    timeout: Duration,
}

impl DeviceClient {
    /// Open the port and assert DTR so the device reports it as open.
    pub fn new(port_name: &str, baud_rate: u32) -> Result<Self> {
        let mut port = serialport::new(port_name, baud_rate)
            .timeout(Duration::from_millis(100))
            .open()?;
        port.write_data_terminal_ready(true)?;

        Ok(Self {
            port,
            timeout: Duration::from_secs(2),
        })
    }

    /// Set the response timeout.
    pub fn set_timeout(&mut self, timeout: Duration) {
        self.timeout = timeout;
    }

    /// Change the line coding baud rate (sent to the device as SET_LINE_CODING).
    pub fn set_baud_rate(&mut self, baud_rate: u32) -> Result<()> {
        self.port.set_baud_rate(baud_rate)?;
        Ok(())
    }

    /// Bootloader touch on the already open port: switch to 1200 baud and
    /// drop DTR.
    pub fn touch(&mut self) -> Result<()> {
        self.port.set_baud_rate(TOUCH_BAUD_RATE)?;
        self.port.write_data_terminal_ready(false)?;
        Ok(())
    }

    /// Drain all pending data from the serial port.
    pub fn drain_buffer(&mut self) -> Result<()> {
        self.port.clear(serialport::ClearBuffer::All)?;

        let mut buf = [0u8; 256];
        loop {
            match self.port.read(&mut buf) {
                Ok(0) => break,
                Ok(_) => continue,
                Err(e) if e.kind() == std::io::ErrorKind::TimedOut => break,
                Err(e) => return Err(e.into()),
            }
        }

        Ok(())
    }

    /// Send data and collect the same number of echoed bytes.
    pub fn echo(&mut self, data: &[u8]) -> Result<Vec<u8>> {
        self.port.write_all(data)?;
        self.port.flush()?;
        self.read_exact_len(data.len())
    }

    /// Send a large payload in chunks while reading the echo back, so the
    /// device's receive buffer fills and drains several times.
    pub fn echo_streaming(&mut self, data: &[u8], chunk: usize) -> Result<Vec<u8>> {
        let mut received = Vec::with_capacity(data.len());
        let mut buf = [0u8; 512];
        let start = Instant::now();

        let mut sent = 0;
        for part in data.chunks(chunk) {
            self.port.write_all(part)?;
            self.port.flush()?;
            sent += part.len();

            // Keep at most one chunk in flight
            while received.len() + chunk < sent {
                match self.port.read(&mut buf) {
                    Ok(n) => received.extend_from_slice(&buf[..n]),
                    Err(e) if e.kind() == std::io::ErrorKind::TimedOut => {
                        if start.elapsed() > self.timeout * 4 {
                            anyhow::bail!(
                                "Echo stalled after {} of {} bytes",
                                received.len(),
                                sent
                            );
                        }
                    }
                    Err(e) => return Err(e.into()),
                }
            }
        }

        while received.len() < data.len() && start.elapsed() < self.timeout * 4 {
            match self.port.read(&mut buf) {
                Ok(n) => received.extend_from_slice(&buf[..n]),
                Err(e) if e.kind() == std::io::ErrorKind::TimedOut => continue,
                Err(e) => return Err(e.into()),
            }
        }

        Ok(received)
    }

    /// Read exactly `len` bytes or fail on timeout.
    fn read_exact_len(&mut self, len: usize) -> Result<Vec<u8>> {
        let mut data = Vec::with_capacity(len);
        let mut buf = [0u8; 256];
        let start = Instant::now();

        while data.len() < len && start.elapsed() < self.timeout {
            let want = (len - data.len()).min(buf.len());
            match self.port.read(&mut buf[..want]) {
                Ok(n) => data.extend_from_slice(&buf[..n]),
                Err(e) if e.kind() == std::io::ErrorKind::TimedOut => continue,
                Err(e) => return Err(e.into()),
            }
        }

        if data.len() < len {
            anyhow::bail!(
                "Timeout waiting for echo, got {} of {} bytes: {:02x?}",
                data.len(),
                len,
                data
            );
        }

        Ok(data)
    }

    /// Name of the underlying port.
    pub fn port_name(&self) -> String {
        self.port.name().unwrap_or_default()
    }
}
