mod camelize;
mod result_set;
mod row;
mod shape;

pub use camelize::{camelize, camelize_all};
pub use result_set::ResultSet;
pub use row::CustomDbRow;
pub use shape::{as_row, as_rows, as_scalar, as_scalars};
