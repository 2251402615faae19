//! ELM327 OBD-II adapter over a serial port.

use crate::sensor::{Quantity, SensorError, SensorSource};
use log::{debug, info, trace};
use serialport::SerialPort;
use std::fmt::{Debug, Formatter};
use std::io::{Read, Write};
use std::time::Duration;

/// Answers that mean the adapter could not get a reading.
const ERROR_MESSAGES: [&str; 7] = [
    "UNABLETOCONNECT",
    "CANERROR",
    "BUSERROR",
    "BUSBUSY",
    "DATAERROR",
    "STOPPED",
    "ERROR",
];

/// Longest response accepted before giving up on seeing the prompt.
const MAX_RESPONSE_LEN: usize = 1024;

/// An ELM327 adapter speaking its AT/OBD text protocol over `port`.
pub struct Elm327<P> {
    port: P,
    name: String,
    verbose: bool,
}

impl Elm327<Box<dyn SerialPort>> {
    /// Opens the serial device the adapter is attached to. Call [Elm327::init] before reading.
    pub fn open(path: &str, baud_rate: u32) -> Result<Self, SensorError> {
        debug!("Opening ELM327 at {} ({} baud)...", path, baud_rate);
        let port = serialport::new(path, baud_rate)
            .timeout(Duration::from_secs(5))
            .open()
            .map_err(|e| SensorError::Io(e.into()))?;
        Ok(Elm327::new(port, path.to_string()))
    }
}

impl<P: Read + Write> Elm327<P> {
    pub fn new(port: P, name: String) -> Self {
        Elm327 {
            port,
            name,
            verbose: false,
        }
    }

    /// Logs the raw adapter traffic at debug level instead of trace.
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Resets the adapter and sets it up for plain queries: no echo, no linefeeds, automatic
    /// protocol detection.
    pub fn init(&mut self) -> Result<(), SensorError> {
        let banner = self.command("ATZ")?;
        info!("ELM327 reset: {}", banner.join(" "));
        for setting in ["ATE0", "ATL0", "ATSP0"] {
            let response = self.command(setting)?;
            if !response.iter().any(|line| line.ends_with("OK")) {
                return Err(SensorError::MalformedResponse(response.join(" ")));
            }
        }
        Ok(())
    }

    /// Gets the adapter's identification string.
    pub fn version(&mut self) -> Result<String, SensorError> {
        let response = self.command("ATI")?;
        response
            .into_iter()
            .find(|line| !line.is_empty() && line != "ATI")
            .ok_or_else(|| SensorError::MalformedResponse(String::new()))
    }

    /// Sends one command and returns the non-empty response lines, without the prompt.
    fn command(&mut self, command: &str) -> Result<Vec<String>, SensorError> {
        self.log(format_args!("{} -> {}", self.name, command));
        self.port.write_all(command.as_bytes())?;
        self.port.write_all(b"\r")?;
        self.port.flush()?;

        let response = self.read_until_prompt()?;
        self.log(format_args!("{} <- {:?}", self.name, response));
        Ok(response
            .split(['\r', '\n'])
            .map(|line| line.trim().to_string())
            .filter(|line| !line.is_empty())
            .collect())
    }

    fn read_until_prompt(&mut self) -> Result<String, SensorError> {
        let mut response = Vec::new();
        let mut byte = [0u8; 1];
        loop {
            if self.port.read(&mut byte)? == 0 {
                return Err(SensorError::Io(std::io::ErrorKind::UnexpectedEof.into()));
            }
            match byte[0] {
                b'>' => break,
                // Some clones pad their output with NULs
                0 => {}
                b => response.push(b),
            }
            if response.len() > MAX_RESPONSE_LEN {
                return Err(SensorError::MalformedResponse(
                    String::from_utf8_lossy(&response).into_owned(),
                ));
            }
        }
        Ok(String::from_utf8_lossy(&response).into_owned())
    }

    fn log(&self, args: std::fmt::Arguments) {
        if self.verbose {
            debug!("{}", args);
        } else {
            trace!("{}", args);
        }
    }
}

impl<P> Debug for Elm327<P> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Elm327({})", self.name)
    }
}

impl<P: Read + Write> SensorSource for Elm327<P> {
    fn read_quantity(&mut self, quantity: Quantity) -> Result<String, SensorError> {
        let response = self.command(&format!("01{:02X}", quantity.pid()))?;
        let value = parse_single_byte(quantity.pid(), &response)?;
        trace!("{}: {} {}", quantity, value, quantity.unit());
        Ok(value.to_string())
    }
}

/// Finds the mode 01 answer for `pid` in the response lines and decodes its first data byte.
fn parse_single_byte(pid: u8, lines: &[String]) -> Result<u8, SensorError> {
    let expected = format!("41{:02X}", pid);
    for line in lines {
        let compact: String = line
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect::<String>()
            .to_ascii_uppercase();

        if compact == "NODATA" {
            return Err(SensorError::Unsupported(pid));
        }
        if compact == "?" || ERROR_MESSAGES.iter().any(|msg| compact.contains(msg)) {
            return Err(SensorError::Adapter(line.clone()));
        }
        if compact.starts_with("SEARCHING") || compact.starts_with("BUSINIT") {
            continue;
        }
        if let Some(data) = compact.strip_prefix(&expected) {
            return data
                .get(..2)
                .and_then(|byte| u8::from_str_radix(byte, 16).ok())
                .ok_or_else(|| SensorError::MalformedResponse(line.clone()));
        }
    }
    Err(SensorError::MalformedResponse(lines.join(" ")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    /// A port that replays canned adapter output and keeps what was sent to it.
    struct ScriptedPort {
        input: Cursor<Vec<u8>>,
        sent: Vec<u8>,
    }

    impl ScriptedPort {
        fn new(script: &str) -> Self {
            ScriptedPort {
                input: Cursor::new(script.as_bytes().to_vec()),
                sent: Vec::new(),
            }
        }
    }

    impl Read for ScriptedPort {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            self.input.read(buf)
        }
    }

    impl Write for ScriptedPort {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.sent.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    fn lines(response: &[&str]) -> Vec<String> {
        response.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn parses_spaced_and_compact_responses() {
        assert_eq!(parse_single_byte(0x0B, &lines(&["41 0B 82"])).unwrap(), 130);
        assert_eq!(parse_single_byte(0x33, &lines(&["413362"])).unwrap(), 98);
    }

    #[test]
    fn skips_search_chatter() {
        let response = lines(&["SEARCHING...", "41 0B 64"]);
        assert_eq!(parse_single_byte(0x0B, &response).unwrap(), 100);
    }

    #[test]
    fn no_data_is_unsupported() {
        let err = parse_single_byte(0x33, &lines(&["NO DATA"])).unwrap_err();
        assert!(matches!(err, SensorError::Unsupported(0x33)));
    }

    #[test]
    fn adapter_errors() {
        for response in ["UNABLE TO CONNECT", "CAN ERROR", "?", "STOPPED"] {
            let err = parse_single_byte(0x0B, &lines(&[response])).unwrap_err();
            assert!(matches!(err, SensorError::Adapter(_)), "{}", response);
        }
    }

    #[test]
    fn wrong_pid_or_truncated_data_is_malformed() {
        let err = parse_single_byte(0x0B, &lines(&["41 0C 1A F8"])).unwrap_err();
        assert!(matches!(err, SensorError::MalformedResponse(_)));
        let err = parse_single_byte(0x0B, &lines(&["41 0B 8"])).unwrap_err();
        assert!(matches!(err, SensorError::MalformedResponse(_)));
    }

    #[test]
    fn reads_quantity_over_port() {
        let port = ScriptedPort::new("41 0B 82 \r\r>41 33 62 \r\r>");
        let mut elm = Elm327::new(port, "test".to_string());

        assert_eq!(elm.read_quantity(Quantity::IntakeManifoldPressure).unwrap(), "130");
        assert_eq!(elm.read_quantity(Quantity::BarometricPressure).unwrap(), "98");
        assert_eq!(elm.port.sent, b"010B\r0133\r");
    }

    #[test]
    fn init_and_version() {
        let port = ScriptedPort::new(
            "ATZ\r\r\rELM327 v1.5\r\r>ATE0\rOK\r\r>OK\r\r>OK\r\r>ELM327 v1.5\r\r>",
        );
        let mut elm = Elm327::new(port, "test".to_string());

        elm.init().unwrap();
        assert_eq!(elm.version().unwrap(), "ELM327 v1.5");
        assert_eq!(elm.port.sent, b"ATZ\rATE0\rATL0\rATSP0\rATI\r");
    }

    #[test]
    fn missing_prompt_is_an_io_error() {
        let port = ScriptedPort::new("41 0B 82");
        let mut elm = Elm327::new(port, "test".to_string());
        let err = elm.read_quantity(Quantity::IntakeManifoldPressure).unwrap_err();
        assert!(matches!(err, SensorError::Io(_)));
    }
}
