//! [`GraphicsApi`] over a wgpu device and window surface.
//!
//! Mapping:
//! - a program is a render pipeline plus a CPU-staged uniform block; the block
//!   is written to its GPU buffer right before the program's next draw
//! - a buffer is a `wgpu::Buffer` that grows (power of two) when an upload no
//!   longer fits and is otherwise rewritten in place
//! - `clear` acquires the surface texture and records a clearing pass, each
//!   `draw` records one loading pass, `flush` submits and presents
//!
//! Queue writes land before the frame's command buffer executes, so every
//! buffer and uniform block is expected to be written at most once per frame.

use std::cell::RefCell;
use std::collections::HashMap;

use winit::dpi::PhysicalSize;

use crate::device::{AcquiredFrame, Gpu, SurfaceRecovery};

use super::reflect::{self, LinkedInterface, StageReflection};
use super::{
    ApiLimits, AttributeFormat, BlendMode, BufferKind, DrawCall, GraphicsApi, ParameterLocation,
    ParameterValue, PipelineDesc, RawHandle, ShaderStage, Topology,
};

const MIN_BUFFER_SIZE: u64 = 256;

struct CompiledStage {
    reflection: StageReflection,
    module: wgpu::ShaderModule,
}

struct UniformBinding {
    staging: Vec<u8>,
    dirty: bool,
    buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
}

struct LinkedProgram {
    interface: LinkedInterface,
    pipeline: wgpu::RenderPipeline,
    uniforms: Option<UniformBinding>,
    indexed: bool,
}

#[derive(Default)]
struct Program {
    stages: Vec<CompiledStage>,
    linked: Option<LinkedProgram>,
}

struct GpuBuffer {
    kind: BufferKind,
    buffer: Option<wgpu::Buffer>,
    /// Allocated size in bytes.
    capacity: u64,
    /// Bytes written by the last upload.
    len: u64,
}

#[derive(Default)]
struct State {
    next_handle: RawHandle,
    programs: HashMap<RawHandle, Program>,
    buffers: HashMap<RawHandle, GpuBuffer>,
    frame: Option<AcquiredFrame>,
    surface_lost: bool,
}

pub struct WgpuApi<'w> {
    gpu: RefCell<Gpu<'w>>,
    state: RefCell<State>,
}

impl<'w> WgpuApi<'w> {
    pub fn new(gpu: Gpu<'w>) -> Self {
        let info = gpu.adapter_info();
        log::debug!(
            "wgpu api ready on {} ({:?}), surface format {:?}",
            info.name,
            info.backend,
            gpu.surface_format()
        );

        Self {
            gpu: RefCell::new(gpu),
            state: RefCell::new(State::default()),
        }
    }

    /// True once the surface reported an unrecoverable error.
    pub fn surface_lost(&self) -> bool {
        self.state.borrow().surface_lost
    }

    /// Current drawable size in physical pixels.
    pub fn surface_size(&self) -> PhysicalSize<u32> {
        self.gpu.borrow().size()
    }

    fn build_pipeline(
        &self,
        handle: RawHandle,
        program: &Program,
        interface: &LinkedInterface,
        desc: &PipelineDesc,
    ) -> Result<LinkedProgram, String> {
        let gpu = self.gpu.borrow();
        let device = gpu.device();

        let module_for = |stage: ShaderStage| {
            program
                .stages
                .iter()
                .find(|s| s.reflection.stage == stage)
                .map(|s| &s.module)
                .ok_or_else(|| format!("no {stage} stage attached"))
        };
        let vertex_module = module_for(ShaderStage::Vertex)?;
        let fragment_module = module_for(ShaderStage::Fragment)?;

        let label = format!("shipsim program {handle}");

        let bind_group_layout = match &interface.uniforms {
            Some(block) if block.group != 0 => {
                return Err(format!(
                    "uniform block must use @group(0), found @group({})",
                    block.group
                ));
            }
            Some(block) => Some(device.create_bind_group_layout(
                &wgpu::BindGroupLayoutDescriptor {
                    label: Some(&label),
                    entries: &[wgpu::BindGroupLayoutEntry {
                        binding: block.binding,
                        visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                        ty: wgpu::BindingType::Buffer {
                            ty: wgpu::BufferBindingType::Uniform,
                            has_dynamic_offset: false,
                            min_binding_size: None,
                        },
                        count: None,
                    }],
                },
            )),
            None => None,
        };

        let bind_group_layouts: Vec<&wgpu::BindGroupLayout> =
            bind_group_layout.iter().collect();

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some(&label),
            bind_group_layouts: &bind_group_layouts,
            immediate_size: 0,
        });

        let attributes: Vec<wgpu::VertexAttribute> = desc
            .vertex
            .attributes
            .iter()
            .map(|a| wgpu::VertexAttribute {
                format: vertex_format(a.format),
                offset: a.offset,
                shader_location: a.location,
            })
            .collect();

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(&label),
            layout: Some(&pipeline_layout),

            vertex: wgpu::VertexState {
                module: vertex_module,
                entry_point: Some(&interface.vertex_entry_point),
                compilation_options: Default::default(),
                buffers: &[wgpu::VertexBufferLayout {
                    array_stride: desc.vertex.stride,
                    step_mode: wgpu::VertexStepMode::Vertex,
                    attributes: &attributes,
                }],
            },

            fragment: Some(wgpu::FragmentState {
                module: fragment_module,
                entry_point: Some(&interface.fragment_entry_point),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: gpu.surface_format(),
                    blend: Some(match desc.blend {
                        BlendMode::Replace => wgpu::BlendState::REPLACE,
                        BlendMode::Alpha => wgpu::BlendState::ALPHA_BLENDING,
                    }),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),

            primitive: wgpu::PrimitiveState {
                topology: primitive_topology(desc.topology),
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },

            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        });

        let uniforms = match (&interface.uniforms, &bind_group_layout) {
            (Some(block), Some(layout)) => {
                let size = u64::from(block.size).next_multiple_of(16).max(16);
                let buffer = device.create_buffer(&wgpu::BufferDescriptor {
                    label: Some(&label),
                    size,
                    usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                    mapped_at_creation: false,
                });
                let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
                    label: Some(&label),
                    layout,
                    entries: &[wgpu::BindGroupEntry {
                        binding: block.binding,
                        resource: buffer.as_entire_binding(),
                    }],
                });
                Some(UniformBinding {
                    staging: vec![0; size as usize],
                    dirty: true,
                    buffer,
                    bind_group,
                })
            }
            _ => None,
        };

        Ok(LinkedProgram {
            interface: interface.clone(),
            pipeline,
            uniforms,
            indexed: desc.indexed,
        })
    }
}

impl GraphicsApi for WgpuApi<'_> {
    fn limits(&self) -> ApiLimits {
        let gpu = self.gpu.borrow();
        let info = gpu.adapter_info();
        let limits = gpu.limits();
        ApiLimits {
            description: format!("{} ({:?})", info.name, info.backend),
            max_vertex_attributes: limits.max_vertex_attributes,
        }
    }

    fn create_program(&self) -> RawHandle {
        let mut state = self.state.borrow_mut();
        state.next_handle += 1;
        let handle = state.next_handle;
        state.programs.insert(handle, Program::default());
        handle
    }

    fn compile_stage(
        &self,
        program: RawHandle,
        stage: ShaderStage,
        source: &str,
    ) -> Result<(), String> {
        let reflection = reflect::compile_stage(source, stage)?;

        let module = self
            .gpu
            .borrow()
            .device()
            .create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some(&format!("shipsim program {program} {stage} stage")),
                source: wgpu::ShaderSource::Wgsl(source.into()),
            });

        let mut state = self.state.borrow_mut();
        let slot = state
            .programs
            .get_mut(&program)
            .ok_or_else(|| format!("program {program} does not exist"))?;
        slot.stages.push(CompiledStage { reflection, module });
        Ok(())
    }

    fn link_program(&self, program: RawHandle, desc: &PipelineDesc) -> Result<(), String> {
        let mut state = self.state.borrow_mut();
        let slot = state
            .programs
            .get_mut(&program)
            .ok_or_else(|| format!("program {program} does not exist"))?;

        let reflections: Vec<StageReflection> =
            slot.stages.iter().map(|s| s.reflection.clone()).collect();
        let interface = reflect::link_stages(&reflections, desc)?;

        let linked = self.build_pipeline(program, slot, &interface, desc)?;
        slot.linked = Some(linked);
        Ok(())
    }

    fn parameter_location(&self, program: RawHandle, name: &str) -> Option<ParameterLocation> {
        self.state
            .borrow()
            .programs
            .get(&program)?
            .linked
            .as_ref()?
            .interface
            .parameter(name)
    }

    fn set_parameter(
        &self,
        program: RawHandle,
        location: ParameterLocation,
        value: ParameterValue,
    ) {
        let mut state = self.state.borrow_mut();
        let Some(uniforms) = state
            .programs
            .get_mut(&program)
            .and_then(|p| p.linked.as_mut())
            .and_then(|l| l.uniforms.as_mut())
        else {
            log::warn!("set_parameter on program {program} without a uniform block");
            return;
        };

        let bytes = value.as_bytes();
        debug_assert_eq!(bytes.len(), location.size as usize);

        let start = location.offset as usize;
        let len = bytes.len().min(location.size as usize);
        uniforms.staging[start..start + len].copy_from_slice(&bytes[..len]);
        uniforms.dirty = true;
    }

    fn delete_program(&self, program: RawHandle) {
        self.state.borrow_mut().programs.remove(&program);
    }

    fn create_buffer(&self, kind: BufferKind) -> RawHandle {
        let mut state = self.state.borrow_mut();
        state.next_handle += 1;
        let handle = state.next_handle;
        state.buffers.insert(
            handle,
            GpuBuffer {
                kind,
                buffer: None,
                capacity: 0,
                len: 0,
            },
        );
        handle
    }

    fn upload_buffer(&self, buffer: RawHandle, bytes: &[u8]) {
        let gpu = self.gpu.borrow();
        let mut state = self.state.borrow_mut();
        let Some(slot) = state.buffers.get_mut(&buffer) else {
            log::warn!("upload to unknown buffer {buffer}");
            return;
        };

        slot.len = bytes.len() as u64;
        if bytes.is_empty() {
            return;
        }

        let padded_len = slot.len.next_multiple_of(wgpu::COPY_BUFFER_ALIGNMENT);

        if slot.buffer.is_none() || padded_len > slot.capacity {
            let capacity = padded_len.next_power_of_two().max(MIN_BUFFER_SIZE);
            log::trace!("buffer {buffer}: growing to {capacity} bytes");

            let usage = match slot.kind {
                BufferKind::Vertex => wgpu::BufferUsages::VERTEX,
                BufferKind::Index => wgpu::BufferUsages::INDEX,
            };
            slot.buffer = Some(gpu.device().create_buffer(&wgpu::BufferDescriptor {
                label: Some(&format!("shipsim buffer {buffer}")),
                size: capacity,
                usage: usage | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            }));
            slot.capacity = capacity;
        }

        let Some(target) = slot.buffer.as_ref() else { return };

        if padded_len == slot.len {
            gpu.queue().write_buffer(target, 0, bytes);
        } else {
            let mut padded = bytes.to_vec();
            padded.resize(padded_len as usize, 0);
            gpu.queue().write_buffer(target, 0, &padded);
        }
    }

    fn delete_buffer(&self, buffer: RawHandle) {
        self.state.borrow_mut().buffers.remove(&buffer);
    }

    fn set_viewport(&self, width: u32, height: u32) {
        self.gpu.borrow_mut().resize(PhysicalSize::new(width, height));
    }

    fn clear(&self, color: [f32; 4]) {
        let mut state = self.state.borrow_mut();

        if let Some(stale) = state.frame.take() {
            log::debug!("previous frame was never flushed; submitting it now");
            self.gpu.borrow().present(stale);
        }

        let gpu = self.gpu.borrow();
        let size = gpu.size();
        if size.width == 0 || size.height == 0 {
            log::trace!("canvas has zero area; frame skipped");
            return;
        }

        let mut frame = match gpu.begin_frame() {
            Ok(frame) => frame,
            Err(err) => {
                match gpu.recover(&err) {
                    SurfaceRecovery::Lost => {
                        log::error!("surface lost: {err}");
                        state.surface_lost = true;
                    }
                    recovery => log::debug!("frame skipped ({recovery:?}): {err}"),
                }
                return;
            }
        };

        {
            let _rpass = frame.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("shipsim clear"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &frame.view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: f64::from(color[0]),
                            g: f64::from(color[1]),
                            b: f64::from(color[2]),
                            a: f64::from(color[3]),
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });
        }

        state.frame = Some(frame);
    }

    fn draw(&self, call: &DrawCall) {
        if call.count == 0 {
            return;
        }

        let gpu = self.gpu.borrow();
        let mut state = self.state.borrow_mut();
        let State {
            programs,
            buffers,
            frame,
            ..
        } = &mut *state;

        let Some(frame) = frame.as_mut() else {
            // Acquisition failed in `clear`; the whole frame is dropped.
            return;
        };

        let Some(linked) = programs.get_mut(&call.program).and_then(|p| p.linked.as_mut()) else {
            log::warn!("draw with unlinked program {}", call.program);
            return;
        };
        debug_assert_eq!(linked.indexed, call.index_buffer.is_some());

        if let Some(uniforms) = linked.uniforms.as_mut() {
            if uniforms.dirty {
                gpu.queue().write_buffer(&uniforms.buffer, 0, &uniforms.staging);
                uniforms.dirty = false;
            }
        }

        let Some((vertex_buffer, vertex_len)) = live_buffer(buffers, call.vertex_buffer) else {
            log::warn!("draw with empty vertex buffer {}", call.vertex_buffer);
            return;
        };

        let index = match call.index_buffer {
            Some(handle) => match live_buffer(buffers, handle) {
                Some(found) => Some(found),
                None => {
                    log::warn!("draw with empty index buffer {handle}");
                    return;
                }
            },
            None => None,
        };

        let mut rpass = frame.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("shipsim draw"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: &frame.view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Load,
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });

        rpass.set_pipeline(&linked.pipeline);
        if let Some(uniforms) = linked.uniforms.as_ref() {
            rpass.set_bind_group(0, &uniforms.bind_group, &[]);
        }
        rpass.set_vertex_buffer(0, vertex_buffer.slice(..vertex_len));

        match index {
            Some((index_buffer, index_len)) => {
                rpass.set_index_buffer(index_buffer.slice(..index_len), wgpu::IndexFormat::Uint32);
                rpass.draw_indexed(0..call.count, 0, 0..1);
            }
            None => rpass.draw(0..call.count, 0..1),
        }
    }

    fn flush(&self) {
        let frame = self.state.borrow_mut().frame.take();
        if let Some(frame) = frame {
            self.gpu.borrow().present(frame);
        }
    }
}

fn live_buffer(
    buffers: &HashMap<RawHandle, GpuBuffer>,
    handle: RawHandle,
) -> Option<(&wgpu::Buffer, u64)> {
    let slot = buffers.get(&handle)?;
    let buffer = slot.buffer.as_ref()?;
    (slot.len > 0).then_some((buffer, slot.len))
}

fn vertex_format(format: AttributeFormat) -> wgpu::VertexFormat {
    match format {
        AttributeFormat::Float32x2 => wgpu::VertexFormat::Float32x2,
        AttributeFormat::Float32x3 => wgpu::VertexFormat::Float32x3,
    }
}

fn primitive_topology(topology: Topology) -> wgpu::PrimitiveTopology {
    match topology {
        Topology::PointList => wgpu::PrimitiveTopology::PointList,
        Topology::LineList => wgpu::PrimitiveTopology::LineList,
        Topology::TriangleList => wgpu::PrimitiveTopology::TriangleList,
        Topology::TriangleStrip => wgpu::PrimitiveTopology::TriangleStrip,
    }
}
