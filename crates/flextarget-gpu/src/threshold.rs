use wgpu::util::DeviceExt;

use flextarget_color::{Hsv, RED_HUE_HIGH_MIN, RED_HUE_LOW_MAX, SATURATION_MARGIN, VALUE_FLOOR};
use flextarget_core::{ImageBuffer, PixelFormat};

use crate::device::GpuContext;
use crate::GpuError;

/// Uniform params (must match WGSL struct Params exactly).
#[repr(C)]
#[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
struct ThresholdParams {
    width: u32,
    height: u32,
    hue_low_max: f32,
    hue_high_min: f32,
    sat_min: f32,
    val_min: f32,
    _pad0: u32,
    _pad1: u32,
}

pub(crate) struct ThresholdPipeline {
    pipeline: wgpu::ComputePipeline,
    bgl: wgpu::BindGroupLayout,
}

fn storage_entry(binding: u32, read_only: bool) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::COMPUTE,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Storage { read_only },
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

fn uniform_entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::COMPUTE,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

impl ThresholdPipeline {
    pub(crate) fn new(device: &wgpu::Device) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("binary_red_hsv.wgsl"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/binary_red_hsv.wgsl").into()),
        });

        let bgl = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("binary_red_hsv BGL"),
            entries: &[
                storage_entry(0, true),  // packed RGBA in
                storage_entry(1, false), // 0/255 words out
                uniform_entry(2),
            ],
        });

        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("binary_red_hsv pipeline layout"),
            bind_group_layouts: &[&bgl],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
            label: Some("binary_red_hsv"),
            layout: Some(&layout),
            module: &shader,
            entry_point: "binary_red_hsv",
            compilation_options: wgpu::PipelineCompilationOptions::default(),
            cache: None,
        });

        Self { pipeline, bgl }
    }
}

/// GPU rendition of [`flextarget_color::binary_red_hsv`].
pub(crate) fn run(
    ctx: &GpuContext,
    img: &ImageBuffer,
    baseline: Hsv,
) -> Result<ImageBuffer, GpuError> {
    img.expect_format(PixelFormat::Rgba8)?;
    let w = img.width();
    let h = img.height();
    let n_pixels = w * h;

    let src_buf = ctx
        .device
        .create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("binary_red_hsv src"),
            contents: img.data(),
            usage: wgpu::BufferUsages::STORAGE,
        });

    let dst_size = (n_pixels * std::mem::size_of::<u32>()) as u64;
    let dst_buf = ctx.device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("binary_red_hsv dst"),
        size: dst_size,
        usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_SRC,
        mapped_at_creation: false,
    });

    let params = ThresholdParams {
        width: w as u32,
        height: h as u32,
        hue_low_max: RED_HUE_LOW_MAX,
        hue_high_min: RED_HUE_HIGH_MIN,
        sat_min: baseline.s + SATURATION_MARGIN,
        val_min: VALUE_FLOOR,
        _pad0: 0,
        _pad1: 0,
    };
    let params_buf = ctx
        .device
        .create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("binary_red_hsv params"),
            contents: bytemuck::bytes_of(&params),
            usage: wgpu::BufferUsages::UNIFORM,
        });

    let bind_group = ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("binary_red_hsv BG"),
        layout: &ctx.threshold.bgl,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: src_buf.as_entire_binding(),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: dst_buf.as_entire_binding(),
            },
            wgpu::BindGroupEntry {
                binding: 2,
                resource: params_buf.as_entire_binding(),
            },
        ],
    });

    let mut encoder = ctx
        .device
        .create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("binary_red_hsv dispatch"),
        });
    {
        let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
            label: Some("binary_red_hsv"),
            timestamp_writes: None,
        });
        pass.set_pipeline(&ctx.threshold.pipeline);
        pass.set_bind_group(0, &bind_group, &[]);
        pass.dispatch_workgroups(w.div_ceil(16) as u32, h.div_ceil(16) as u32, 1);
    }

    let readback = ctx.device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("binary_red_hsv readback"),
        size: dst_size,
        usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    });
    encoder.copy_buffer_to_buffer(&dst_buf, 0, &readback, 0, dst_size);
    ctx.queue.submit(std::iter::once(encoder.finish()));

    let bytes = ctx.read_mapped(&readback)?;
    let words: &[u32] = bytemuck::cast_slice(&bytes);
    let mask: Vec<u8> = words.iter().map(|&v| v as u8).collect();

    Ok(ImageBuffer::new(w, h, PixelFormat::Gray8, mask)?)
}
