//! Kernel dispatch
//!
//! A [`Container`] binds one kernel per `(cpu, precision, method)` when the
//! algorithm object is built. The CPU variant becomes the backend type
//! parameter of the kernel, so the compute loop never branches on it again.

use std::fmt;

use algokit_core::{
    Avx2Backend, Avx512Backend, ComputePrimitives, CpuType, DataType, Environment, ExecutionStrategy, Result,
    ScalarBackend, SseBackend,
};
use tracing::debug;

/// Backend a kernel can be instantiated with
pub trait Backend: ComputePrimitives<f64> + ComputePrimitives<f32> + fmt::Debug {}

impl<B> Backend for B where B: ComputePrimitives<f64> + ComputePrimitives<f32> + fmt::Debug {}

/// Creates the kernel of one method and precision for a given backend
pub trait KernelBuilder {
    type Kernel: ?Sized + Send + Sync;

    fn method_name(&self) -> &'static str;

    fn data_type(&self) -> DataType;

    fn build<B: Backend>(&self, backend: B, strategy: ExecutionStrategy) -> Result<Box<Self::Kernel>>;
}

/// Owner of the kernel bound to an algorithm object
pub struct Container<K: ?Sized> {
    kernel: Box<K>,
    cpu: CpuType,
    data_type: DataType,
    method: &'static str,
}

impl<K: ?Sized + Send + Sync> Container<K> {
    /// Bind the kernel for the CPU and thread budget of `env`
    ///
    /// Fails with `CpuNotSupported` if `env` names a CPU variant that is not
    /// compiled in or not present on the host.
    pub fn bind<B: KernelBuilder<Kernel = K>>(env: &Environment, builder: &B) -> Result<Self> {
        let cpu = env.cpu_id();
        let strategy = ExecutionStrategy::auto(env.number_of_threads());
        let kernel = match cpu {
            CpuType::Scalar => builder.build(ScalarBackend::new(), strategy)?,
            CpuType::Sse2 => builder.build(SseBackend::try_new()?, strategy)?,
            CpuType::Avx2 => builder.build(Avx2Backend::try_new()?, strategy)?,
            CpuType::Avx512 => builder.build(Avx512Backend::try_new()?, strategy)?,
        };
        debug!(
            cpu = %cpu,
            data_type = %builder.data_type(),
            method = builder.method_name(),
            ?strategy,
            "bound kernel"
        );
        Ok(Self {
            kernel,
            cpu,
            data_type: builder.data_type(),
            method: builder.method_name(),
        })
    }

    /// Wrap an already built kernel
    pub fn from_kernel(kernel: Box<K>, cpu: CpuType, data_type: DataType, method: &'static str) -> Self {
        Self {
            kernel,
            cpu,
            data_type,
            method,
        }
    }

    pub fn kernel(&self) -> &K {
        &self.kernel
    }

    pub fn cpu_type(&self) -> CpuType {
        self.cpu
    }

    pub fn data_type(&self) -> DataType {
        self.data_type
    }

    pub fn method_name(&self) -> &'static str {
        self.method
    }
}

impl<K: ?Sized> fmt::Debug for Container<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Container")
            .field("cpu", &self.cpu)
            .field("data_type", &self.data_type)
            .field("method", &self.method)
            .finish_non_exhaustive()
    }
}
