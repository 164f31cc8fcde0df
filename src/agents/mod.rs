//! Pipeline agents: collaborator contracts and built-in implementations.
//!
//! Every stage of the pipeline is owned by one agent reached through a trait
//! in [`collaborators`]. The built-in agents are deterministic and work
//! entirely on the local filesystem:
//!
//! | Stage            | Trait              | Built-in              | Name               |
//! |------------------|--------------------|-----------------------|--------------------|
//! | Reverse engineer | `ReverseEngineer`  | `CodebaseAnalyzer`    | `reverse_engineer` |
//! | Market research  | `MarketResearcher` | `CatalogResearcher`   | `web_scraper`      |
//! | Specification    | `SpecWriter`       | `TemplateSpecWriter`  | `pm`               |
//! | Development      | `Developer`        | `ScaffoldDeveloper`   | `dev`              |
//! | Testing          | `Tester`           | `StaticTester`        | `qa`               |
//! | Deployment       | `Deployer`         | `LocalDeployer`       | `deploy`           |
//!
//! Stages share state through the feature artifact in [`FeatureStore`],
//! addressed by feature id.

pub mod collaborators;
pub mod deployer;
pub mod developer;
pub mod error;
pub mod feature_store;
pub mod market_research;
pub mod reverse_engineer;
pub mod spec_writer;
pub mod tester;
pub mod types;

pub use collaborators::{Deployer, Developer, MarketResearcher, ReverseEngineer, SpecWriter, Tester};
pub use deployer::{LocalDeployer, ENVIRONMENTS, PLATFORMS};
pub use developer::{stack_for_preference, ScaffoldDeveloper};
pub use error::{AgentError, AgentResult};
pub use feature_store::FeatureStore;
pub use market_research::CatalogResearcher;
pub use reverse_engineer::CodebaseAnalyzer;
pub use spec_writer::TemplateSpecWriter;
pub use tester::StaticTester;
pub use types::{
    AcceptanceCriterion, CheckResult, DeploymentSummary, DevelopmentSummary, FeatureSpec,
    FileMetrics, MarketResearchSummary, ReconstructedSpec, ReverseEngineerSummary, SpecSummary,
    TechStack, TestReport, TestStatus, TestSummary, UserStory,
};
