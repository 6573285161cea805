use super::Value;

use indexmap::IndexMap;

/// A single result row: an ordered mapping from column name to value.
///
/// Order matters for joined results, where the driver reports columns in the
/// same order as the result's field definitions.
pub type Row = IndexMap<String, Value>;
