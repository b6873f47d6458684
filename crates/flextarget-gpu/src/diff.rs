use wgpu::util::DeviceExt;

use flextarget_color::DiffError;
use flextarget_core::ImageBuffer;

use crate::device::GpuContext;
use crate::GpuError;

const WG_SIZE: usize = 256;

/// Uniform params (must match WGSL struct Params exactly).
#[repr(C)]
#[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
struct DiffParams {
    word_count: u32,
    _pad0: u32,
    _pad1: u32,
    _pad2: u32,
}

pub(crate) struct DiffPipeline {
    pipeline: wgpu::ComputePipeline,
    bgl: wgpu::BindGroupLayout,
}

impl DiffPipeline {
    pub(crate) fn new(device: &wgpu::Device) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("mean_abs_diff.wgsl"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/mean_abs_diff.wgsl").into()),
        });

        let bgl = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("mean_abs_diff BGL"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Storage { read_only: true },
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Storage { read_only: true },
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Storage { read_only: false },
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 3,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
            ],
        });

        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("mean_abs_diff pipeline layout"),
            bind_group_layouts: &[&bgl],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
            label: Some("mean_abs_diff"),
            layout: Some(&layout),
            module: &shader,
            entry_point: "mean_abs_diff",
            compilation_options: wgpu::PipelineCompilationOptions::default(),
            cache: None,
        });

        Self { pipeline, bgl }
    }
}

/// Pad to whole u32 words; both images get identical zero padding, which
/// contributes nothing to the sum.
fn padded_words(data: &[u8]) -> Vec<u8> {
    let mut padded = data.to_vec();
    padded.resize(data.len().div_ceil(4) * 4, 0);
    padded
}

/// GPU rendition of [`flextarget_color::mean_abs_diff`].
///
/// Integer partials are summed on the CPU in u64, so the result agrees with
/// the reference byte-for-byte, not just within a tolerance.
pub(crate) fn run(ctx: &GpuContext, a: &ImageBuffer, b: &ImageBuffer) -> Result<f64, GpuError> {
    if a.width() != b.width() || a.height() != b.height() {
        return Err(DiffError::DimensionMismatch(a.width(), a.height(), b.width(), b.height()).into());
    }
    if a.format() != b.format() {
        return Err(DiffError::FormatMismatch(a.format(), b.format()).into());
    }

    let bytes_a = padded_words(a.data());
    let bytes_b = padded_words(b.data());
    let word_count = bytes_a.len() / 4;
    let n_groups = word_count.div_ceil(WG_SIZE);

    let buf_a = ctx
        .device
        .create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("mean_abs_diff a"),
            contents: &bytes_a,
            usage: wgpu::BufferUsages::STORAGE,
        });
    let buf_b = ctx
        .device
        .create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("mean_abs_diff b"),
            contents: &bytes_b,
            usage: wgpu::BufferUsages::STORAGE,
        });

    let partials_size = (n_groups * std::mem::size_of::<u32>()) as u64;
    let partials_buf = ctx.device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("mean_abs_diff partials"),
        size: partials_size,
        usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_SRC,
        mapped_at_creation: false,
    });

    let params = DiffParams {
        word_count: word_count as u32,
        _pad0: 0,
        _pad1: 0,
        _pad2: 0,
    };
    let params_buf = ctx
        .device
        .create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("mean_abs_diff params"),
            contents: bytemuck::bytes_of(&params),
            usage: wgpu::BufferUsages::UNIFORM,
        });

    let bind_group = ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("mean_abs_diff BG"),
        layout: &ctx.diff.bgl,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: buf_a.as_entire_binding(),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: buf_b.as_entire_binding(),
            },
            wgpu::BindGroupEntry {
                binding: 2,
                resource: partials_buf.as_entire_binding(),
            },
            wgpu::BindGroupEntry {
                binding: 3,
                resource: params_buf.as_entire_binding(),
            },
        ],
    });

    let mut encoder = ctx
        .device
        .create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("mean_abs_diff dispatch"),
        });
    {
        let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
            label: Some("mean_abs_diff"),
            timestamp_writes: None,
        });
        pass.set_pipeline(&ctx.diff.pipeline);
        pass.set_bind_group(0, &bind_group, &[]);
        pass.dispatch_workgroups(n_groups as u32, 1, 1);
    }

    let readback = ctx.device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("mean_abs_diff readback"),
        size: partials_size,
        usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    });
    encoder.copy_buffer_to_buffer(&partials_buf, 0, &readback, 0, partials_size);
    ctx.queue.submit(std::iter::once(encoder.finish()));

    let bytes = ctx.read_mapped(&readback)?;
    let partials: &[u32] = bytemuck::cast_slice(&bytes);
    let sum: u64 = partials.iter().map(|&p| p as u64).sum();

    Ok(sum as f64 / a.data().len() as f64)
}
