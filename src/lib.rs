//! Minimal hand-rolled Firestore REST client with service-account auth.
//!
//! Three pieces, leaves first:
//!
//! - [`value`] converts between native values and Firestore's tagged wire
//!   representation.
//! - [`auth`] mints and caches short-lived OAuth2 bearer tokens through the
//!   signed-JWT (RS256) JWT-bearer grant, with at most one mint in flight
//!   per process.
//! - [`remote`] issues the document operations (get, set/merge, create with
//!   generated id, filtered query, delete) over HTTPS.
//!
//! The crate is a deliberately small primitive: no internal retries, no
//! transactions, no pagination. Callers own orchestration, because only they
//! know which of their operations are safe to repeat.
//!
//! ```no_run
//! use firestore_lite::{FirestoreClient, ServiceAccountCredential, WireValue};
//! use std::collections::BTreeMap;
//!
//! # async fn demo() -> Result<(), firestore_lite::StoreError> {
//! let credential = ServiceAccountCredential::from_env()?;
//! let client = FirestoreClient::new(credential)?;
//!
//! let mut fields = BTreeMap::new();
//! fields.insert("status".to_string(), WireValue::from_string("listed"));
//! client.set_document("listings/tomatoes-42", &fields, true).await?;
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod credentials;
pub mod error;
pub mod model;
pub mod remote;
pub mod value;

pub use credentials::ServiceAccountCredential;
pub use error::{StoreError, StoreResult};
pub use model::{Document, ResourcePath};
pub use remote::{FieldFilter, FilterOperator, FirestoreClient, StructuredQuery};
pub use value::WireValue;
