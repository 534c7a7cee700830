pub mod host;
pub mod layout;
pub mod levels;
pub mod memory;
pub mod openings;
pub mod pipeline;

pub mod errors {
    use envelope_core::model::FamilyTypeSelector;
    use thiserror::Error;

    use crate::host::HostError;

    #[derive(Debug, Error)]
    pub enum EngineError {
        #[error("level \"{name}\" not found")]
        LevelNotFound { name: String },
        #[error("family type {selector} not found")]
        FamilyTypeNotFound { selector: FamilyTypeSelector },
        #[error("precondition violated: {0}")]
        Precondition(String),
        #[error("atomic unit \"{label}\" failed to commit: {source}")]
        HostCommit {
            label: String,
            #[source]
            source: HostError,
        },
        #[error("host document error: {0}")]
        Host(#[from] HostError),
    }

    impl EngineError {
        /// 标高或族类型按名称查找失败。
        pub fn is_resolution_failure(&self) -> bool {
            matches!(
                self,
                EngineError::LevelNotFound { .. } | EngineError::FamilyTypeNotFound { .. }
            )
        }
    }
}

pub use errors::EngineError;
pub use host::{HostDocument, HostError};
pub use memory::MemoryHost;
pub use pipeline::{EnvelopeGenerator, FailurePolicy, GenerationOptions, GenerationReport};
