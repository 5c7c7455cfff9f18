pub mod assembler;
pub mod sink;

pub use assembler::{
    Artifact, OutputAssembler, SavedReplay, SavedReplaySummary, ARTIFACT_MIME_TYPE,
};
pub use sink::ArtifactSink;
