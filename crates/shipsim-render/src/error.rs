use std::fmt;

use crate::api::ShaderStage;

/// Construction-time failure of the rendering backend. None are transient.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    /// The graphics API or adapter does not meet the backend's requirements.
    Environment { message: String },

    /// A shader stage failed to compile.
    ShaderCompile {
        program: String,
        stage: ShaderStage,
        log: String,
    },

    /// A program failed to link from its attached stages.
    ShaderLink { program: String, log: String },

    /// A required parameter is not declared by the program.
    ParameterNotFound { program: String, name: String },
}

impl RenderError {
    pub(crate) fn environment(message: impl Into<String>) -> Self {
        Self::Environment {
            message: message.into(),
        }
    }

    /// Name of the program involved, if any.
    pub fn program(&self) -> Option<&str> {
        match self {
            Self::Environment { .. } => None,
            Self::ShaderCompile { program, .. }
            | Self::ShaderLink { program, .. }
            | Self::ParameterNotFound { program, .. } => Some(program),
        }
    }
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Environment { message } => {
                write!(f, "unsupported graphics environment: {message}")
            }
            Self::ShaderCompile {
                program,
                stage,
                log,
            } => write!(f, "error compiling {stage} stage of {program} shader program: {log}"),
            Self::ShaderLink { program, log } => {
                write!(f, "error linking {program} shader program: {log}")
            }
            Self::ParameterNotFound { program, name } => write!(
                f,
                "error retrieving location of parameter \"{name}\" in {program} shader program"
            ),
        }
    }
}

impl std::error::Error for RenderError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_carries_program_and_log() {
        let err = RenderError::ShaderCompile {
            program: "Land".into(),
            stage: ShaderStage::Fragment,
            log: "unknown identifier `foo`".into(),
        };
        let text = err.to_string();
        assert!(text.contains("Land"));
        assert!(text.contains("fragment"));
        assert!(text.contains("unknown identifier `foo`"));
    }

    #[test]
    fn parameter_not_found_names_parameter() {
        let err = RenderError::ParameterNotFound {
            program: "Water".into(),
            name: "color".into(),
        };
        assert_eq!(err.program(), Some("Water"));
        assert!(err.to_string().contains("\"color\""));
    }

    #[test]
    fn environment_has_no_program() {
        assert_eq!(RenderError::environment("no adapter").program(), None);
    }
}
