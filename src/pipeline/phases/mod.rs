// Pipeline stages for game generation
//
// Each stage is self-contained with its own prompt and turns every failure
// into state rather than an error.

pub mod fallback;

#[path = "01_requirements.rs"]
pub mod requirements;
#[path = "02_architecture.rs"]
pub mod architecture;
#[path = "03_code.rs"]
pub mod code;
#[path = "04_validation.rs"]
pub mod validation;
#[path = "05_deployment.rs"]
pub mod deployment;

pub use architecture::ArchitectureDesignPhase;
pub use code::CodeGenerationPhase;
pub use deployment::DeploymentPhase;
pub use requirements::RequirementAnalysisPhase;
pub use validation::ValidationPhase;
