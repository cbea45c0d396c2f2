use std::io;
use std::path::Path;

use rapl_raw::MsrError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PowertoolError {
    #[error("No CPU {0}")]
    CoreNotFound(u32),

    #[error("CPU {0} doesn't support MSRs")]
    RegisterUnsupported(u32),

    #[error("{context}: {source}")]
    IoFailure {
        context: String,
        #[source]
        source: io::Error,
    },

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl PowertoolError {
    pub fn io(context: impl Into<String>, source: io::Error) -> Self {
        PowertoolError::IoFailure {
            context: context.into(),
            source,
        }
    }

    pub fn io_at(path: &Path, source: io::Error) -> Self {
        Self::io(format!("Failed to read {}", path.display()), source)
    }

    /// Process exit status for this error
    pub fn exit_code(&self) -> u8 {
        match self {
            PowertoolError::CoreNotFound(_) => 2,
            PowertoolError::RegisterUnsupported(_) => 3,
            PowertoolError::IoFailure { .. } => 127,
            PowertoolError::ConfigError(_) => 1,
        }
    }
}

impl From<MsrError> for PowertoolError {
    fn from(err: MsrError) -> Self {
        match err {
            MsrError::NoSuchCpu { cpu } => PowertoolError::CoreNotFound(cpu),
            MsrError::Unsupported { cpu } => PowertoolError::RegisterUnsupported(cpu),
            MsrError::OpenFailed { cpu, path, source } => PowertoolError::io(
                format!("Failed to open {} for CPU {cpu}", path.display()),
                source,
            ),
            MsrError::ReadFailed { cpu, msr, source } => {
                PowertoolError::io(format!("Failed to read MSR 0x{msr:X} on CPU {cpu}"), source)
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, PowertoolError>;
