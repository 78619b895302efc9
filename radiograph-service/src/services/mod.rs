pub mod analysis_client;
pub mod metrics;
pub mod providers;
pub mod session_registry;

pub use analysis_client::AnalysisClient;
pub use session_registry::SessionRegistry;
