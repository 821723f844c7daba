use crate::error::Result;
use crate::models::TabularResult;
use crate::models::Value;
use crate::query::Dialect;

/// Request/response capability over the warehouse.
///
/// Implementations own their connection lifecycle; callers only submit a
/// statement with its bound parameters and get rows back. Failures of any kind
/// are reported as `ReportError::DataSource` and are never retried here.
pub trait DataSource {
    fn dialect(&self) -> &dyn Dialect;
    fn execute(&self, sql: &str, params: &[Value]) -> Result<TabularResult>;
}
