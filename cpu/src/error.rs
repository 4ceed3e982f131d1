// error types for thread placement

use std::{error::Error, fmt, io};

#[derive(Debug)]
#[non_exhaustive]
pub enum CpuAffinityError {
    // sched_setaffinity / sysconf failure
    Io(io::Error),

    // no affinity support on this platform
    NotSupported,

    // cpu id beyond the online range
    InvalidCpu { cpu: usize, max: usize },
}

impl fmt::Display for CpuAffinityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CpuAffinityError::Io(err) => write!(f, "I/O error: {}", err),
            CpuAffinityError::NotSupported => {
                write!(f, "thread pinning is not supported on this platform")
            }
            CpuAffinityError::InvalidCpu { cpu, max } => {
                write!(f, "cpu {} is out of range (max cpu is {})", cpu, max)
            }
        }
    }
}

impl Error for CpuAffinityError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            CpuAffinityError::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for CpuAffinityError {
    fn from(err: io::Error) -> Self {
        CpuAffinityError::Io(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let err = CpuAffinityError::InvalidCpu { cpu: 9, max: 3 };
        assert_eq!(err.to_string(), "cpu 9 is out of range (max cpu is 3)");
        assert!(err.source().is_none());
    }

    #[test]
    fn test_io_source() {
        let err: CpuAffinityError = io::Error::from_raw_os_error(libc::EINVAL).into();
        assert!(matches!(err, CpuAffinityError::Io(_)));
        assert!(err.source().is_some());
    }
}
