//! Headless [`GraphicsApi`] that records calls instead of touching a GPU.
//!
//! Shader stages go through the same WGSL front-end as the wgpu backend, so a
//! program that builds here builds on the device too. Everything else is kept
//! as plain data that tests and diagnostics can inspect.

use std::cell::RefCell;
use std::collections::HashMap;

use super::reflect::{self, LinkedInterface, StageReflection};
use super::{
    ApiLimits, BufferKind, DrawCall, GraphicsApi, ParameterLocation, ParameterValue,
    PipelineDesc, RawHandle, ShaderStage,
};

/// One recorded API call.
#[derive(Debug, Clone, PartialEq)]
pub enum ApiCall {
    CreateProgram(RawHandle),
    CompileStage {
        program: RawHandle,
        stage: ShaderStage,
        ok: bool,
    },
    LinkProgram {
        program: RawHandle,
        desc: PipelineDesc,
        ok: bool,
    },
    DeleteProgram(RawHandle),
    CreateBuffer(RawHandle, BufferKind),
    UploadBuffer {
        buffer: RawHandle,
        len: usize,
    },
    DeleteBuffer(RawHandle),
    SetParameter {
        program: RawHandle,
        location: ParameterLocation,
        value: ParameterValue,
    },
    SetViewport(u32, u32),
    Clear([f32; 4]),
    Draw(DrawCall),
    Flush,
}

#[derive(Default)]
struct RecordedProgram {
    stages: Vec<StageReflection>,
    desc: Option<PipelineDesc>,
    linked: Option<LinkedInterface>,
}

struct RecordedBuffer {
    kind: BufferKind,
    contents: Vec<u8>,
}

#[derive(Default)]
struct State {
    next_handle: RawHandle,
    programs: HashMap<RawHandle, RecordedProgram>,
    buffers: HashMap<RawHandle, RecordedBuffer>,
    calls: Vec<ApiCall>,
}

impl State {
    fn alloc(&mut self) -> RawHandle {
        self.next_handle += 1;
        self.next_handle
    }
}

pub struct RecordingApi {
    limits: ApiLimits,
    state: RefCell<State>,
}

impl Default for RecordingApi {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordingApi {
    pub fn new() -> Self {
        Self::with_limits(ApiLimits {
            description: "recording".to_string(),
            max_vertex_attributes: 16,
        })
    }

    pub fn with_limits(limits: ApiLimits) -> Self {
        Self {
            limits,
            state: RefCell::new(State::default()),
        }
    }

    /// All calls recorded so far.
    pub fn calls(&self) -> Vec<ApiCall> {
        self.state.borrow().calls.clone()
    }

    /// Drains the recorded calls.
    pub fn take_calls(&self) -> Vec<ApiCall> {
        std::mem::take(&mut self.state.borrow_mut().calls)
    }

    /// Recorded draw calls, in order.
    pub fn draws(&self) -> Vec<DrawCall> {
        self.state
            .borrow()
            .calls
            .iter()
            .filter_map(|c| match c {
                ApiCall::Draw(d) => Some(*d),
                _ => None,
            })
            .collect()
    }

    pub fn live_programs(&self) -> usize {
        self.state.borrow().programs.len()
    }

    pub fn live_buffers(&self) -> usize {
        self.state.borrow().buffers.len()
    }

    pub fn buffer_kind(&self, buffer: RawHandle) -> Option<BufferKind> {
        self.state.borrow().buffers.get(&buffer).map(|b| b.kind)
    }

    /// Last uploaded content of `buffer`, if it is live.
    pub fn buffer_contents(&self, buffer: RawHandle) -> Option<Vec<u8>> {
        self.state
            .borrow()
            .buffers
            .get(&buffer)
            .map(|b| b.contents.clone())
    }

    /// Pipeline description a live program was linked with.
    pub fn program_desc(&self, program: RawHandle) -> Option<PipelineDesc> {
        self.state
            .borrow()
            .programs
            .get(&program)
            .and_then(|p| p.desc)
    }

    fn record(&self, call: ApiCall) {
        self.state.borrow_mut().calls.push(call);
    }
}

impl GraphicsApi for RecordingApi {
    fn limits(&self) -> ApiLimits {
        self.limits.clone()
    }

    fn create_program(&self) -> RawHandle {
        let mut state = self.state.borrow_mut();
        let handle = state.alloc();
        state.programs.insert(handle, RecordedProgram::default());
        state.calls.push(ApiCall::CreateProgram(handle));
        handle
    }

    fn compile_stage(
        &self,
        program: RawHandle,
        stage: ShaderStage,
        source: &str,
    ) -> Result<(), String> {
        let result = reflect::compile_stage(source, stage);

        let mut state = self.state.borrow_mut();
        state.calls.push(ApiCall::CompileStage {
            program,
            stage,
            ok: result.is_ok(),
        });

        let reflection = result?;
        let slot = state
            .programs
            .get_mut(&program)
            .ok_or_else(|| format!("program {program} does not exist"))?;
        slot.stages.push(reflection);
        Ok(())
    }

    fn link_program(&self, program: RawHandle, desc: &PipelineDesc) -> Result<(), String> {
        let mut state = self.state.borrow_mut();

        let result = match state.programs.get_mut(&program) {
            Some(slot) => reflect::link_stages(&slot.stages, desc).map(|linked| {
                slot.desc = Some(*desc);
                slot.linked = Some(linked);
            }),
            None => Err(format!("program {program} does not exist")),
        };

        state.calls.push(ApiCall::LinkProgram {
            program,
            desc: *desc,
            ok: result.is_ok(),
        });
        result
    }

    fn parameter_location(&self, program: RawHandle, name: &str) -> Option<ParameterLocation> {
        self.state
            .borrow()
            .programs
            .get(&program)?
            .linked
            .as_ref()?
            .parameter(name)
    }

    fn set_parameter(
        &self,
        program: RawHandle,
        location: ParameterLocation,
        value: ParameterValue,
    ) {
        debug_assert_eq!(value.as_bytes().len(), location.size as usize);
        self.record(ApiCall::SetParameter {
            program,
            location,
            value,
        });
    }

    fn delete_program(&self, program: RawHandle) {
        let mut state = self.state.borrow_mut();
        let existed = state.programs.remove(&program).is_some();
        debug_assert!(existed, "program {program} deleted twice");
        state.calls.push(ApiCall::DeleteProgram(program));
    }

    fn create_buffer(&self, kind: BufferKind) -> RawHandle {
        let mut state = self.state.borrow_mut();
        let handle = state.alloc();
        state.buffers.insert(
            handle,
            RecordedBuffer {
                kind,
                contents: Vec::new(),
            },
        );
        state.calls.push(ApiCall::CreateBuffer(handle, kind));
        handle
    }

    fn upload_buffer(&self, buffer: RawHandle, bytes: &[u8]) {
        let mut state = self.state.borrow_mut();
        if let Some(b) = state.buffers.get_mut(&buffer) {
            b.contents.clear();
            b.contents.extend_from_slice(bytes);
        }
        state.calls.push(ApiCall::UploadBuffer {
            buffer,
            len: bytes.len(),
        });
    }

    fn delete_buffer(&self, buffer: RawHandle) {
        let mut state = self.state.borrow_mut();
        let existed = state.buffers.remove(&buffer).is_some();
        debug_assert!(existed, "buffer {buffer} deleted twice");
        state.calls.push(ApiCall::DeleteBuffer(buffer));
    }

    fn set_viewport(&self, width: u32, height: u32) {
        self.record(ApiCall::SetViewport(width, height));
    }

    fn clear(&self, color: [f32; 4]) {
        self.record(ApiCall::Clear(color));
    }

    fn draw(&self, call: &DrawCall) {
        self.record(ApiCall::Draw(*call));
    }

    fn flush(&self) {
        self.record(ApiCall::Flush);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{AttributeFormat, BlendMode, Topology, VertexAttribute, VertexLayout};

    const SRC: &str = r#"
        @vertex
        fn vs_main(@location(0) p: vec2<f32>) -> @builtin(position) vec4<f32> {
            return vec4<f32>(p, 0.0, 1.0);
        }

        @fragment
        fn fs_main() -> @location(0) vec4<f32> {
            return vec4<f32>(1.0);
        }
    "#;

    const ATTRS: &[VertexAttribute] = &[VertexAttribute {
        location: 0,
        format: AttributeFormat::Float32x2,
        offset: 0,
    }];

    const DESC: PipelineDesc = PipelineDesc {
        topology: Topology::LineList,
        blend: BlendMode::Replace,
        vertex: VertexLayout {
            stride: 8,
            attributes: ATTRS,
        },
        indexed: false,
    };

    #[test]
    fn handles_are_unique_and_non_zero() {
        let api = RecordingApi::new();
        let p = api.create_program();
        let b = api.create_buffer(BufferKind::Vertex);
        assert_ne!(p, 0);
        assert_ne!(b, 0);
        assert_ne!(p, b);
    }

    #[test]
    fn program_builds_and_records_desc() {
        let api = RecordingApi::new();
        let p = api.create_program();
        api.compile_stage(p, ShaderStage::Vertex, SRC).unwrap();
        api.compile_stage(p, ShaderStage::Fragment, SRC).unwrap();
        api.link_program(p, &DESC).unwrap();
        assert_eq!(api.program_desc(p), Some(DESC));
        assert!(api.parameter_location(p, "anything").is_none());
    }

    #[test]
    fn failed_compile_is_recorded() {
        let api = RecordingApi::new();
        let p = api.create_program();
        assert!(api.compile_stage(p, ShaderStage::Vertex, "nonsense").is_err());
        assert!(matches!(
            api.calls().last(),
            Some(ApiCall::CompileStage { ok: false, .. })
        ));
    }

    #[test]
    fn upload_replaces_contents() {
        let api = RecordingApi::new();
        let b = api.create_buffer(BufferKind::Index);
        api.upload_buffer(b, &[1, 2, 3, 4]);
        api.upload_buffer(b, &[9, 9, 9, 9, 9, 9, 9, 9]);
        assert_eq!(api.buffer_contents(b).unwrap().len(), 8);
        assert_eq!(api.buffer_kind(b), Some(BufferKind::Index));
    }

    #[test]
    fn delete_releases_resources() {
        let api = RecordingApi::new();
        let p = api.create_program();
        let b = api.create_buffer(BufferKind::Vertex);
        api.delete_program(p);
        api.delete_buffer(b);
        assert_eq!(api.live_programs(), 0);
        assert_eq!(api.live_buffers(), 0);
    }
}
