//! Data source implementations: the live Azure DevOps client and an
//! in-memory fake for `--demo` runs.

mod azure;
mod fake;

pub use azure::AzureClient;
pub use fake::FakeSource;
