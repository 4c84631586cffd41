pub mod config;
pub mod discovery;
pub mod encoding;
pub mod errors;
pub mod filters;
pub mod metrics;
pub mod parser;
pub mod pipeline;
pub mod results;
pub mod scan;
pub mod store;

pub use config::ScanConfig;
pub use errors::{ScanError, ScanResult};
pub use pipeline::{scan_and_store, ScanStatus, ScanSummary};
pub use results::{AbilityRecord, FileResult, ScanOutput};
pub use store::{AbilityStore, SearchCase, StoredAbility};
