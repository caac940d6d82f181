use std::path::PathBuf;

/// Everything that can go wrong while bringing up the window, the GL context and the GPU
/// resources. None of these are recoverable; callers propagate them up to `main`.
#[derive(thiserror::Error, Debug)]
pub enum BackendError {
    #[error("graphics subsystem initialization failed: {0}")]
    Init(String),

    #[error("error while building OpenGL window: {0}")]
    WindowCreation(String),

    #[error("error while creating OpenGL context: {0}")]
    ContextCreation(String),

    #[error("failed to load OpenGL function pointers")]
    Loader,

    #[error("cannot obtain event pump: {0}")]
    EventPump(String),

    #[error("error reading {path}: {source}")]
    ShaderRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unsupported shader extension: {0} (supported extensions are '.vert', '.frag')")]
    UnsupportedShaderType(PathBuf),

    #[error("gl::CreateProgram() failed")]
    ProgramCreation,

    #[error("{stage} shader compilation error in {path}: {log}")]
    ShaderCompile {
        stage: &'static str,
        path: PathBuf,
        log: String,
    },

    #[error("program link error: {0}")]
    ProgramLink(String),

    #[error("loading image {path} error: {reason}")]
    ImageLoad { path: PathBuf, reason: String },
}
