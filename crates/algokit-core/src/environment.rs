//! Process-wide execution environment
//!
//! The CPU capability is detected once per process behind a one-time guard and
//! never re-detected. Algorithms take the detected [`CpuType`] at construction
//! but accept an injected one, so tests can pin a specific kernel variant.

use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use crate::error::{Error, ErrorDetail, ErrorKind, Result};

/// Environment variable that can lower the detected CPU level
pub const CPU_OVERRIDE_VAR: &str = "ALGOKIT_CPU";

/// CPU capability level a kernel variant is compiled for
///
/// Ordered from baseline to most capable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum CpuType {
    Scalar,
    Sse2,
    Avx2,
    Avx512,
}

impl CpuType {
    pub const ALL: [CpuType; 4] = [
        CpuType::Scalar,
        CpuType::Sse2,
        CpuType::Avx2,
        CpuType::Avx512,
    ];

    pub fn name(self) -> &'static str {
        match self {
            CpuType::Scalar => "scalar",
            CpuType::Sse2 => "sse2",
            CpuType::Avx2 => "avx2",
            CpuType::Avx512 => "avx512",
        }
    }

    /// Whether the variant is compiled in and the host CPU supports it
    pub fn is_supported(self) -> bool {
        match self {
            CpuType::Scalar => true,
            CpuType::Sse2 => {
                #[cfg(all(target_arch = "x86_64", feature = "sse"))]
                {
                    is_x86_feature_detected!("sse2")
                }
                #[cfg(not(all(target_arch = "x86_64", feature = "sse")))]
                {
                    false
                }
            }
            CpuType::Avx2 => {
                #[cfg(all(target_arch = "x86_64", feature = "avx2"))]
                {
                    is_x86_feature_detected!("avx2")
                }
                #[cfg(not(all(target_arch = "x86_64", feature = "avx2")))]
                {
                    false
                }
            }
            CpuType::Avx512 => {
                #[cfg(all(target_arch = "x86_64", feature = "avx512"))]
                {
                    is_x86_feature_detected!("avx512f")
                }
                #[cfg(not(all(target_arch = "x86_64", feature = "avx512")))]
                {
                    false
                }
            }
        }
    }

    /// Most capable supported variant
    pub fn detect() -> CpuType {
        Self::ALL
            .iter()
            .rev()
            .copied()
            .find(|cpu| cpu.is_supported())
            .unwrap_or(CpuType::Scalar)
    }

    /// Fail with `CpuNotSupported` unless this variant can run here
    pub fn ensure_supported(self) -> Result<()> {
        if self.is_supported() {
            Ok(())
        } else {
            Err(Error::new(ErrorKind::CpuNotSupported)
                .with_detail(ErrorDetail::Cpu, self.name())
                .into())
        }
    }
}

impl fmt::Display for CpuType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for CpuType {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "scalar" | "baseline" => Ok(CpuType::Scalar),
            "sse2" | "sse" => Ok(CpuType::Sse2),
            "avx2" => Ok(CpuType::Avx2),
            "avx512" => Ok(CpuType::Avx512),
            other => Err(Error::new(ErrorKind::CpuNotSupported).with_detail(ErrorDetail::Cpu, other)),
        }
    }
}

/// Apply an optional override to the detected level; overrides may only lower it
pub fn resolve_cpu(host: CpuType, requested: Option<&str>) -> CpuType {
    let Some(raw) = requested else {
        return host;
    };
    match raw.parse::<CpuType>() {
        Ok(cpu) if cpu <= host => cpu,
        Ok(cpu) => {
            warn!("{CPU_OVERRIDE_VAR}={cpu} exceeds host capability {host}, keeping {host}");
            host
        }
        Err(_) => {
            warn!("Ignoring unrecognised {CPU_OVERRIDE_VAR} value {raw:?}");
            host
        }
    }
}

/// Execution environment: CPU level and thread budget
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Environment {
    cpu: CpuType,
    number_of_threads: usize,
}

static ENVIRONMENT: OnceLock<Environment> = OnceLock::new();

impl Environment {
    /// The process-wide environment, detected on first use
    pub fn instance() -> &'static Environment {
        ENVIRONMENT.get_or_init(|| {
            let requested = std::env::var(CPU_OVERRIDE_VAR).ok();
            let cpu = resolve_cpu(CpuType::detect(), requested.as_deref());
            let env = Environment {
                cpu,
                number_of_threads: num_cpus::get(),
            };
            debug!(
                "Environment initialised: cpu={}, threads={}",
                env.cpu, env.number_of_threads
            );
            env
        })
    }

    /// An explicit environment, independent of the singleton
    pub fn with_cpu(cpu: CpuType) -> Self {
        Self {
            cpu,
            number_of_threads: num_cpus::get(),
        }
    }

    pub fn with_threads(mut self, number_of_threads: usize) -> Self {
        self.number_of_threads = number_of_threads.max(1);
        self
    }

    pub fn cpu_id(&self) -> CpuType {
        self.cpu
    }

    pub fn number_of_threads(&self) -> usize {
        self.number_of_threads
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_always_supported() {
        assert!(CpuType::Scalar.is_supported());
        assert!(CpuType::Scalar.ensure_supported().is_ok());
        assert!(CpuType::detect() >= CpuType::Scalar);
        assert!(CpuType::detect().is_supported());
    }

    #[test]
    fn test_instance_is_stable() {
        let a = Environment::instance();
        let b = Environment::instance();
        assert!(std::ptr::eq(a, b));
        assert!(a.cpu_id().is_supported());
        assert!(a.number_of_threads() >= 1);
    }

    #[test]
    fn test_parse_cpu_names() {
        assert_eq!("AVX2".parse::<CpuType>().unwrap(), CpuType::Avx2);
        assert_eq!(" sse2 ".parse::<CpuType>().unwrap(), CpuType::Sse2);
        assert_eq!("baseline".parse::<CpuType>().unwrap(), CpuType::Scalar);
        let err = "neon".parse::<CpuType>().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::CpuNotSupported);
    }

    #[test]
    fn test_override_only_lowers() {
        assert_eq!(resolve_cpu(CpuType::Avx2, None), CpuType::Avx2);
        assert_eq!(resolve_cpu(CpuType::Avx2, Some("scalar")), CpuType::Scalar);
        assert_eq!(resolve_cpu(CpuType::Sse2, Some("avx512")), CpuType::Sse2);
        assert_eq!(resolve_cpu(CpuType::Avx2, Some("bogus")), CpuType::Avx2);
    }

    #[test]
    fn test_injected_environment() {
        let env = Environment::with_cpu(CpuType::Scalar).with_threads(0);
        assert_eq!(env.cpu_id(), CpuType::Scalar);
        assert_eq!(env.number_of_threads(), 1);
    }
}
