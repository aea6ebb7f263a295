//! OpenCL backend.

use std::sync::atomic::{AtomicUsize, Ordering};

/// Application-wide state for OpenCL.
///
/// An OpenCL device must be created before baking with the [`RadeonRays`](crate::ray_tracing::RadeonRays) ray tracer.
/// Energy fields simulated on the device live in [`DeviceBuffer`]s and must be copied back to the host before they are read.
#[derive(Debug)]
pub struct OpenClDevice {
    name: String,
    num_allocated_buffers: AtomicUsize,
}

impl OpenClDevice {
    /// Creates a new OpenCL device handle.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            num_allocated_buffers: AtomicUsize::new(0),
        }
    }

    /// The device name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Allocates a zero-initialized buffer of `len` samples in device memory.
    pub fn allocate(&self, len: usize) -> DeviceBuffer {
        self.num_allocated_buffers.fetch_add(1, Ordering::Relaxed);
        DeviceBuffer(vec![0.0; len])
    }

    /// Total number of buffers allocated on this device so far.
    pub fn num_allocated_buffers(&self) -> usize {
        self.num_allocated_buffers.load(Ordering::Relaxed)
    }
}

/// A buffer resident in device memory.
#[derive(Debug)]
pub struct DeviceBuffer(Vec<f32>);

impl DeviceBuffer {
    /// Number of samples in the buffer.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Mutable access for kernels writing into the buffer.
    pub fn as_mut_slice(&mut self) -> &mut [f32] {
        &mut self.0
    }

    /// Copies the buffer contents into host memory.
    ///
    /// Copies the smaller of the two lengths.
    pub fn read_into(&self, host: &mut [f32]) {
        let len = self.0.len().min(host.len());
        host[..len].copy_from_slice(&self.0[..len]);
    }
}
