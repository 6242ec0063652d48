pub mod aggregate;
pub mod canonical;
pub mod normalize;
pub(crate) mod read;
pub mod schema;

pub use aggregate::{AggregatedRow, AggregatedTable, AggregateError};
pub use canonical::{CanonicalNameMap, NameRule};
pub use normalize::NormalizedTable;
pub use schema::SchemaError;
