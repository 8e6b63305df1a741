mod client;
mod connection;
mod query;

pub use client::{FirestoreClient, FirestoreClientBuilder};
pub use connection::{Connection, ConnectionBuilder};
pub use query::{FieldFilter, FilterOperator, StructuredQuery};

pub(crate) const DEFAULT_DATABASE_ID: &str = "(default)";
