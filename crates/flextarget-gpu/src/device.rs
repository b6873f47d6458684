use crate::diff::DiffPipeline;
use crate::threshold::ThresholdPipeline;
use crate::GpuError;

/// Compute device plus the pre-compiled pipelines.
///
/// Create once at startup; construction is the capability probe — a host
/// without a usable adapter gets [`GpuError::NoAdapter`], which is the
/// dispatch layer's signal to route to the reference implementations in
/// `flextarget-color`. Every per-call buffer is created and dropped inside
/// the call that needs it; nothing device-resident outlives a call.
pub struct GpuContext {
    pub(crate) device: wgpu::Device,
    pub(crate) queue: wgpu::Queue,
    pub(crate) threshold: ThresholdPipeline,
    pub(crate) diff: DiffPipeline,
}

impl GpuContext {
    pub fn new() -> Result<Self, GpuError> {
        let instance = wgpu::Instance::default();
        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            force_fallback_adapter: false,
            compatible_surface: None,
        }))
        .ok_or(GpuError::NoAdapter)?;

        log::info!("compute adapter: {}", adapter.get_info().name);

        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("flextarget-gpu"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::downlevel_defaults(),
                memory_hints: wgpu::MemoryHints::default(),
            },
            None,
        ))?;

        let threshold = ThresholdPipeline::new(&device);
        let diff = DiffPipeline::new(&device);

        Ok(Self {
            device,
            queue,
            threshold,
            diff,
        })
    }

    /// Block until a mapped readback is ready.
    pub(crate) fn read_mapped(&self, buffer: &wgpu::Buffer) -> Result<Vec<u8>, GpuError> {
        let slice = buffer.slice(..);
        let (tx, rx) = std::sync::mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |r| {
            let _ = tx.send(r);
        });
        self.device.poll(wgpu::Maintain::Wait);
        rx.recv()
            .map_err(|_| GpuError::Readback)?
            .map_err(|_| GpuError::Readback)?;

        let mapped = slice.get_mapped_range();
        let bytes = mapped.to_vec();
        drop(mapped);
        buffer.unmap();
        Ok(bytes)
    }
}
