pub mod changelog_updater;
pub mod context;
pub mod project_scanner;
pub mod properties_updater;
pub mod workflow_updater;

pub use changelog_updater::{ChangelogOutcome, ChangelogUpdater};
pub use context::ProjectReport;
pub use project_scanner::ProjectScanner;
pub use properties_updater::PropertiesUpdater;
pub use workflow_updater::WorkflowUpdater;
