//! Shader program construction.

use std::rc::Rc;

use crate::api::{
    GraphicsApi, ParameterLocation, ParameterValue, PipelineDesc, RawHandle, ShaderStage,
};
use crate::error::RenderError;

use super::handle::ProgramHandle;

/// The fixed set of parameters a program may expose.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Parameter {
    OrthoMatrix,
    Color,
    AmbientLightIntensity,
}

impl Parameter {
    /// Member name in the WGSL uniform struct.
    pub const fn name(self) -> &'static str {
        match self {
            Self::OrthoMatrix => "ortho_matrix",
            Self::Color => "color",
            Self::AmbientLightIntensity => "ambient_light_intensity",
        }
    }

    const fn slot(self) -> usize {
        match self {
            Self::OrthoMatrix => 0,
            Self::Color => 1,
            Self::AmbientLightIntensity => 2,
        }
    }
}

/// Everything needed to build one program.
#[derive(Debug, Clone, Copy)]
pub struct ProgramSource {
    /// Human-readable name used in errors and logs.
    pub name: &'static str,
    /// WGSL module holding both the vertex and the fragment entry point.
    pub source: &'static str,
    pub pipeline: PipelineDesc,
    /// Parameters that must resolve for the program to be usable.
    pub parameters: &'static [Parameter],
}

/// A linked program with its resolved parameters.
pub struct ShaderProgram<A: GraphicsApi> {
    name: &'static str,
    handle: ProgramHandle<A>,
    locations: [Option<ParameterLocation>; 3],
}

impl<A: GraphicsApi> ShaderProgram<A> {
    /// Compiles, links and resolves `source`.
    ///
    /// On failure the partially built program is released before returning.
    pub fn build(api: &Rc<A>, source: &ProgramSource) -> Result<Self, RenderError> {
        let handle = ProgramHandle::new(Rc::clone(api), api.create_program());

        for stage in [ShaderStage::Vertex, ShaderStage::Fragment] {
            compile_stage(&**api, handle.raw(), source.name, stage, source.source)?;
        }
        link(&**api, handle.raw(), source.name, &source.pipeline)?;

        let mut locations = [None; 3];
        for &parameter in source.parameters {
            let location =
                resolve_parameter(&**api, handle.raw(), source.name, parameter.name())?;
            locations[parameter.slot()] = Some(location);
        }

        log::debug!(
            "built {} shader program ({} parameters)",
            source.name,
            source.parameters.len()
        );

        Ok(Self {
            name: source.name,
            handle,
            locations,
        })
    }

    pub fn raw(&self) -> RawHandle {
        self.handle.raw()
    }

    pub fn has(&self, parameter: Parameter) -> bool {
        self.locations[parameter.slot()].is_some()
    }

    /// Writes `value` to `parameter`.
    ///
    /// Parameters the program was not built with are ignored.
    pub fn set(&self, api: &A, parameter: Parameter, value: ParameterValue) {
        match self.locations[parameter.slot()] {
            Some(location) => api.set_parameter(self.handle.raw(), location, value),
            None => debug_assert!(
                false,
                "{} shader program has no {} parameter",
                self.name,
                parameter.name()
            ),
        }
    }
}

/// Compiles one stage of `source` and attaches it to `program`.
pub fn compile_stage<A: GraphicsApi + ?Sized>(
    api: &A,
    program: RawHandle,
    program_name: &str,
    stage: ShaderStage,
    source: &str,
) -> Result<(), RenderError> {
    api.compile_stage(program, stage, source)
        .map_err(|log| RenderError::ShaderCompile {
            program: program_name.to_string(),
            stage,
            log,
        })
}

pub fn link<A: GraphicsApi + ?Sized>(
    api: &A,
    program: RawHandle,
    program_name: &str,
    pipeline: &PipelineDesc,
) -> Result<(), RenderError> {
    api.link_program(program, pipeline)
        .map_err(|log| RenderError::ShaderLink {
            program: program_name.to_string(),
            log,
        })
}

pub fn resolve_parameter<A: GraphicsApi + ?Sized>(
    api: &A,
    program: RawHandle,
    program_name: &str,
    parameter: &str,
) -> Result<ParameterLocation, RenderError> {
    api.parameter_location(program, parameter)
        .ok_or_else(|| RenderError::ParameterNotFound {
            program: program_name.to_string(),
            name: parameter.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{ApiCall, BlendMode, RecordingApi, Topology};
    use crate::render::programs;
    use crate::render::records::TILE_VERTEX_LAYOUT;

    fn source(name: &'static str, wgsl: &'static str, parameters: &'static [Parameter]) -> ProgramSource {
        ProgramSource {
            name,
            source: wgsl,
            pipeline: PipelineDesc {
                topology: Topology::TriangleStrip,
                blend: BlendMode::Replace,
                vertex: TILE_VERTEX_LAYOUT,
                indexed: false,
            },
            parameters,
        }
    }

    const ORTHO_ONLY: &str = r#"
        struct Params {
            ortho_matrix: mat4x4<f32>,
        }

        @group(0) @binding(0) var<uniform> params: Params;

        @vertex
        fn vs_main(@location(0) pos: vec2<f32>) -> @builtin(position) vec4<f32> {
            return params.ortho_matrix * vec4<f32>(pos, 0.0, 1.0);
        }

        @fragment
        fn fs_main() -> @location(0) vec4<f32> {
            return vec4<f32>(1.0);
        }
    "#;

    // ── success ───────────────────────────────────────────────────────────

    #[test]
    fn every_category_program_builds() {
        let api = Rc::new(RecordingApi::new());
        for source in programs::ALL {
            let program = ShaderProgram::build(&api, source)
                .unwrap_or_else(|e| panic!("{} failed: {e}", source.name));
            for parameter in source.parameters {
                assert!(program.has(*parameter), "{} lacks {parameter:?}", source.name);
            }
        }
        assert_eq!(api.live_programs(), 0);
    }

    #[test]
    fn set_writes_resolved_location() {
        let api = Rc::new(RecordingApi::new());
        let program =
            ShaderProgram::build(&api, &source("Test", ORTHO_ONLY, &[Parameter::OrthoMatrix]))
                .unwrap();

        program.set(&api, Parameter::OrthoMatrix, ParameterValue::Mat4([[1.0; 4]; 4]));

        assert!(matches!(
            api.calls().last(),
            Some(ApiCall::SetParameter {
                location: ParameterLocation { offset: 0, size: 64 },
                ..
            })
        ));
    }

    // ── failures ──────────────────────────────────────────────────────────

    #[test]
    fn compile_failure_names_program_and_stage() {
        let api = Rc::new(RecordingApi::new());
        let err = ShaderProgram::build(&api, &source("Broken", "fn (", &[]))
            .err()
            .unwrap();

        match err {
            RenderError::ShaderCompile { program, stage, log } => {
                assert_eq!(program, "Broken");
                assert_eq!(stage, ShaderStage::Vertex);
                assert!(!log.is_empty());
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(api.live_programs(), 0);
    }

    #[test]
    fn missing_fragment_entry_is_a_fragment_compile_error() {
        let src = r#"
            @vertex
            fn vs_main(@location(0) pos: vec2<f32>) -> @builtin(position) vec4<f32> {
                return vec4<f32>(pos, 0.0, 1.0);
            }
        "#;
        let api = Rc::new(RecordingApi::new());
        let err = ShaderProgram::build(&api, &source("Half", src, &[])).err().unwrap();
        assert!(matches!(
            err,
            RenderError::ShaderCompile { stage: ShaderStage::Fragment, .. }
        ));
        assert_eq!(api.live_programs(), 0);
    }

    #[test]
    fn link_failure_is_reported() {
        let src = r#"
            @vertex
            fn vs_main(@location(0) pos: vec2<f32>) -> @builtin(position) vec4<f32> {
                return vec4<f32>(pos, 0.0, 1.0);
            }

            @fragment
            fn fs_main(@location(0) c: vec3<f32>) -> @location(0) vec4<f32> {
                return vec4<f32>(c, 1.0);
            }
        "#;
        let api = Rc::new(RecordingApi::new());
        let err = ShaderProgram::build(&api, &source("Unlinked", src, &[])).err().unwrap();
        assert!(matches!(err, RenderError::ShaderLink { ref program, .. } if program == "Unlinked"));
        assert_eq!(api.live_programs(), 0);
    }

    #[test]
    fn missing_parameter_is_strict() {
        let api = Rc::new(RecordingApi::new());
        let err = ShaderProgram::build(
            &api,
            &source("Partial", ORTHO_ONLY, &[Parameter::OrthoMatrix, Parameter::Color]),
        )
        .err()
        .unwrap();

        assert_eq!(
            err,
            RenderError::ParameterNotFound {
                program: "Partial".to_string(),
                name: "color".to_string(),
            }
        );
        assert_eq!(api.live_programs(), 0);
    }
}
