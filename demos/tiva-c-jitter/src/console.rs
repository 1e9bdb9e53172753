//! Semihosting stdout as an `embedded_io` sink for the report

use cortex_m_semihosting::hio::{self, HostStream};
use embedded_io::{ErrorKind, ErrorType, Write};

/// The debugger refused a write
#[derive(Debug)]
pub struct HostError;

impl embedded_io::Error for HostError {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Other
    }
}

pub struct Console(HostStream);

impl Console {
    pub fn stdout() -> Result<Self, HostError> {
        hio::hstdout().map(Console).map_err(|()| HostError)
    }
}

impl ErrorType for Console {
    type Error = HostError;
}

impl Write for Console {
    fn write(&mut self, buf: &[u8]) -> Result<usize, HostError> {
        self.0.write_all(buf).map_err(|()| HostError)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> Result<(), HostError> {
        Ok(())
    }
}
