// PostgreSQL driver glue
//
// - params: `ToSql` for `RowValues` and borrowed parameter views
// - query: statement execution and result set building

pub mod params;
pub mod query;

pub use params::Params;
pub use query::{build_result_set, execute, postgres_extract_value, select, select_batches};
