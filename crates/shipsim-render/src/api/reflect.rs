//! WGSL front-end shared by the API implementations.
//!
//! "Compiling" a stage parses and validates the WGSL module with naga and
//! reflects what the stage exchanges with the rest of the pipeline: vertex
//! inputs, inter-stage varyings, and the uniform block. "Linking" checks that
//! the stages of a program agree with each other and with the vertex layout.

use naga::{AddressSpace, Binding, Module, TypeInner};

use super::{ParameterLocation, PipelineDesc, ShaderStage};

/// One member of a uniform block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UniformMember {
    pub name: String,
    pub offset: u32,
    pub size: u32,
}

/// The uniform struct bound by a stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UniformBlock {
    pub group: u32,
    pub binding: u32,
    /// Struct size in bytes, including trailing padding.
    pub size: u32,
    pub members: Vec<UniformMember>,
}

impl UniformBlock {
    pub fn member(&self, name: &str) -> Option<ParameterLocation> {
        self.members
            .iter()
            .find(|m| m.name == name)
            .map(|m| ParameterLocation {
                offset: m.offset,
                size: m.size,
            })
    }
}

/// What a compiled stage exposes to the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageReflection {
    pub stage: ShaderStage,
    pub entry_point: String,
    /// `@location` inputs of the entry point.
    pub inputs: Vec<u32>,
    /// `@location` outputs of the entry point.
    pub outputs: Vec<u32>,
    pub uniforms: Option<UniformBlock>,
}

/// Result of a successful link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkedInterface {
    pub vertex_entry_point: String,
    pub fragment_entry_point: String,
    pub uniforms: Option<UniformBlock>,
}

impl LinkedInterface {
    pub fn parameter(&self, name: &str) -> Option<ParameterLocation> {
        self.uniforms.as_ref().and_then(|u| u.member(name))
    }
}

/// Parses, validates and reflects one stage of `source`.
///
/// The source must contain exactly one entry point for `stage`; entry points
/// for other stages are ignored, so one file may serve both stages.
pub fn compile_stage(source: &str, stage: ShaderStage) -> Result<StageReflection, String> {
    let module = naga::front::wgsl::parse_str(source).map_err(|e| e.emit_to_string(source))?;

    let mut validator = naga::valid::Validator::new(
        naga::valid::ValidationFlags::all(),
        naga::valid::Capabilities::default(),
    );
    validator
        .validate(&module)
        .map_err(|e| e.emit_to_string(source))?;

    let wanted = match stage {
        ShaderStage::Vertex => naga::ShaderStage::Vertex,
        ShaderStage::Fragment => naga::ShaderStage::Fragment,
    };

    let mut entry_points = module.entry_points.iter().filter(|ep| ep.stage == wanted);
    let entry = entry_points
        .next()
        .ok_or_else(|| format!("no {stage} entry point in module"))?;
    if entry_points.next().is_some() {
        return Err(format!("more than one {stage} entry point in module"));
    }

    let mut inputs = Vec::new();
    for arg in &entry.function.arguments {
        collect_locations(&module, arg.ty, arg.binding.as_ref(), &mut inputs);
    }

    let mut outputs = Vec::new();
    if let Some(result) = &entry.function.result {
        collect_locations(&module, result.ty, result.binding.as_ref(), &mut outputs);
    }

    inputs.sort_unstable();
    outputs.sort_unstable();

    Ok(StageReflection {
        stage,
        entry_point: entry.name.clone(),
        inputs,
        outputs,
        uniforms: uniform_block(&module)?,
    })
}

/// Checks the attached stages against each other and against `desc`.
pub fn link_stages(
    stages: &[StageReflection],
    desc: &PipelineDesc,
) -> Result<LinkedInterface, String> {
    let vertex = single_stage(stages, ShaderStage::Vertex)?;
    let fragment = single_stage(stages, ShaderStage::Fragment)?;

    for location in &fragment.inputs {
        if !vertex.outputs.contains(location) {
            return Err(format!(
                "fragment input @location({location}) is not written by the vertex stage"
            ));
        }
    }

    for location in &vertex.inputs {
        if !desc.vertex.attributes.iter().any(|a| a.location == *location) {
            return Err(format!(
                "vertex input @location({location}) has no attribute in the vertex layout"
            ));
        }
    }

    for attr in desc.vertex.attributes {
        if attr.offset + attr.format.size() > desc.vertex.stride {
            return Err(format!(
                "attribute @location({}) overruns the vertex stride of {} bytes",
                attr.location, desc.vertex.stride
            ));
        }
    }

    let uniforms = match (&vertex.uniforms, &fragment.uniforms) {
        (Some(v), Some(f)) if v != f => {
            return Err("uniform block layouts differ between stages".to_string());
        }
        (Some(u), _) | (None, Some(u)) => Some(u.clone()),
        (None, None) => None,
    };

    Ok(LinkedInterface {
        vertex_entry_point: vertex.entry_point.clone(),
        fragment_entry_point: fragment.entry_point.clone(),
        uniforms,
    })
}

fn single_stage(
    stages: &[StageReflection],
    stage: ShaderStage,
) -> Result<&StageReflection, String> {
    let mut found = stages.iter().filter(|s| s.stage == stage);
    let first = found
        .next()
        .ok_or_else(|| format!("no {stage} stage attached"))?;
    if found.next().is_some() {
        return Err(format!("more than one {stage} stage attached"));
    }
    Ok(first)
}

fn collect_locations(
    module: &Module,
    ty: naga::Handle<naga::Type>,
    binding: Option<&Binding>,
    out: &mut Vec<u32>,
) {
    match binding {
        Some(Binding::Location { location, .. }) => out.push(*location),
        Some(_) => {}
        None => {
            if let TypeInner::Struct { members, .. } = &module.types[ty].inner {
                for member in members {
                    collect_locations(module, member.ty, member.binding.as_ref(), out);
                }
            }
        }
    }
}

fn uniform_block(module: &Module) -> Result<Option<UniformBlock>, String> {
    let mut block = None;

    for (_, var) in module.global_variables.iter() {
        if var.space != AddressSpace::Uniform {
            continue;
        }
        if block.is_some() {
            return Err("only one uniform block per module is supported".to_string());
        }

        let Some(binding) = &var.binding else {
            return Err("uniform variable without a resource binding".to_string());
        };

        let TypeInner::Struct { members, span } = &module.types[var.ty].inner else {
            return Err("uniform variable must be a struct".to_string());
        };

        let members = members
            .iter()
            .filter_map(|m| {
                m.name.as_ref().map(|name| UniformMember {
                    name: name.clone(),
                    offset: m.offset,
                    size: module.types[m.ty].inner.size(module.to_ctx()),
                })
            })
            .collect();

        block = Some(UniformBlock {
            group: binding.group,
            binding: binding.binding,
            size: *span,
            members,
        });
    }

    Ok(block)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{AttributeFormat, BlendMode, Topology, VertexAttribute, VertexLayout};

    const POS_ONLY: &[VertexAttribute] = &[VertexAttribute {
        location: 0,
        format: AttributeFormat::Float32x2,
        offset: 0,
    }];

    fn desc() -> PipelineDesc {
        PipelineDesc {
            topology: Topology::TriangleList,
            blend: BlendMode::Replace,
            vertex: VertexLayout {
                stride: 8,
                attributes: POS_ONLY,
            },
            indexed: false,
        }
    }

    const FLAT: &str = r#"
        struct Params {
            ortho_matrix: mat4x4<f32>,
            color: vec4<f32>,
            ambient_light_intensity: f32,
        }

        @group(0) @binding(0) var<uniform> params: Params;

        @vertex
        fn vs_main(@location(0) pos: vec2<f32>) -> @builtin(position) vec4<f32> {
            return params.ortho_matrix * vec4<f32>(pos, 0.0, 1.0);
        }

        @fragment
        fn fs_main() -> @location(0) vec4<f32> {
            return params.color * params.ambient_light_intensity;
        }
    "#;

    // ── compile ───────────────────────────────────────────────────────────

    #[test]
    fn compile_reflects_uniform_members() {
        let r = compile_stage(FLAT, ShaderStage::Vertex).unwrap();
        assert_eq!(r.entry_point, "vs_main");
        assert_eq!(r.inputs, vec![0]);

        let u = r.uniforms.unwrap();
        assert_eq!(u.member("ortho_matrix"), Some(ParameterLocation { offset: 0, size: 64 }));
        assert_eq!(u.member("color"), Some(ParameterLocation { offset: 64, size: 16 }));
        assert_eq!(
            u.member("ambient_light_intensity"),
            Some(ParameterLocation { offset: 80, size: 4 })
        );
        assert_eq!(u.size % 16, 0);
    }

    #[test]
    fn compile_reports_syntax_errors() {
        let log = compile_stage("fn vs_main( {", ShaderStage::Vertex).unwrap_err();
        assert!(!log.is_empty());
    }

    #[test]
    fn compile_reports_validation_errors() {
        let src = r#"
            @vertex
            fn vs_main() -> @builtin(position) vec4<f32> {
                return vec4<f32>(1.0, 2.0);
            }
        "#;
        assert!(compile_stage(src, ShaderStage::Vertex).is_err());
    }

    #[test]
    fn compile_requires_entry_point_for_stage() {
        let src = r#"
            @fragment
            fn fs_main() -> @location(0) vec4<f32> { return vec4<f32>(1.0); }
        "#;
        let log = compile_stage(src, ShaderStage::Vertex).unwrap_err();
        assert!(log.contains("vertex"));
    }

    // ── link ──────────────────────────────────────────────────────────────

    #[test]
    fn link_accepts_matching_stages() {
        let stages = [
            compile_stage(FLAT, ShaderStage::Vertex).unwrap(),
            compile_stage(FLAT, ShaderStage::Fragment).unwrap(),
        ];
        let linked = link_stages(&stages, &desc()).unwrap();
        assert_eq!(linked.fragment_entry_point, "fs_main");
        assert!(linked.parameter("color").is_some());
        assert!(linked.parameter("missing").is_none());
    }

    #[test]
    fn link_rejects_missing_fragment_stage() {
        let stages = [compile_stage(FLAT, ShaderStage::Vertex).unwrap()];
        let log = link_stages(&stages, &desc()).unwrap_err();
        assert!(log.contains("fragment"));
    }

    #[test]
    fn link_rejects_unwritten_varying() {
        let frag = r#"
            @fragment
            fn fs_main(@location(3) c: vec3<f32>) -> @location(0) vec4<f32> {
                return vec4<f32>(c, 1.0);
            }
        "#;
        let stages = [
            compile_stage(FLAT, ShaderStage::Vertex).unwrap(),
            compile_stage(frag, ShaderStage::Fragment).unwrap(),
        ];
        let log = link_stages(&stages, &desc()).unwrap_err();
        assert!(log.contains("@location(3)"));
    }

    #[test]
    fn link_rejects_input_without_attribute() {
        let vert = r#"
            @vertex
            fn vs_main(@location(0) p: vec2<f32>, @location(1) c: vec3<f32>)
                -> @builtin(position) vec4<f32> {
                return vec4<f32>(p, c.x, 1.0);
            }
        "#;
        let stages = [
            compile_stage(vert, ShaderStage::Vertex).unwrap(),
            compile_stage(FLAT, ShaderStage::Fragment).unwrap(),
        ];
        let log = link_stages(&stages, &desc()).unwrap_err();
        assert!(log.contains("@location(1)"));
    }
}
