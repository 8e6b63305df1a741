use std::collections::BTreeMap;
use std::sync::Arc;

use reqwest::Method;
use serde_json::{json, Value as JsonValue};

use crate::auth::{AccessTokenManager, TokenProvider, TokenProviderArc};
use crate::credentials::ServiceAccountCredential;
use crate::error::{auth_failure, query_decode_failure, StoreResult};
use crate::model::{Document, ResourcePath};
use crate::remote::connection::{Connection, ConnectionBuilder};
use crate::remote::query::StructuredQuery;
use crate::remote::DEFAULT_DATABASE_ID;
use crate::value::{decode_fields, encode_fields, WireValue};

/// Document store client: point reads, partial/full writes, id-generated
/// creates and filtered queries against the Firestore REST surface.
///
/// Stateless apart from the shared token provider; operations do not retry
/// internally and are independent of one another.
#[derive(Clone)]
pub struct FirestoreClient {
    connection: Connection,
    token_provider: TokenProviderArc,
    document_prefix: String,
}

pub struct FirestoreClientBuilder {
    project_id: String,
    connection_builder: ConnectionBuilder,
    token_provider: Option<TokenProviderArc>,
}

impl FirestoreClient {
    /// Wires up a client that authenticates with the given service account.
    pub fn new(credential: ServiceAccountCredential) -> StoreResult<Self> {
        let project_id = credential.project_id().to_string();
        let manager = AccessTokenManager::new(credential)?;
        Self::builder(project_id)
            .with_token_provider(Arc::new(manager))
            .build()
    }

    pub fn builder(project_id: impl Into<String>) -> FirestoreClientBuilder {
        FirestoreClientBuilder::new(project_id)
    }

    /// Fetches a single document. A 404 from the store is the expected
    /// "document does not exist" outcome and yields `Ok(None)`.
    pub async fn get_document(&self, path: &str) -> StoreResult<Option<Document>> {
        let path = ResourcePath::document(path)?;
        let token = self.token_provider.bearer_token().await?;
        let request_path = format!("documents/{}", path.canonical_string());

        let response = self
            .connection
            .invoke_json_optional(Method::GET, &request_path, &[], None, &token)
            .await?;

        match response {
            Some(body) => {
                let fields = decode_fields(&body)?;
                Ok(Some(Document::new(path, fields)))
            }
            None => Ok(None),
        }
    }

    /// Writes a document at a known path.
    ///
    /// With `merge` set, the update mask lists exactly the top-level field
    /// names present in `fields`, so remote fields outside the mask are
    /// preserved. Without it no mask is sent and the remote document is
    /// replaced wholesale. A merge with identical input is idempotent.
    ///
    /// A merge with no fields changes nothing and issues no request; an
    /// empty mask on the wire would be indistinguishable from a full
    /// replace and wipe the remote document.
    pub async fn set_document(
        &self,
        path: &str,
        fields: &BTreeMap<String, WireValue>,
        merge: bool,
    ) -> StoreResult<()> {
        let path = ResourcePath::document(path)?;
        if merge && fields.is_empty() {
            return Ok(());
        }
        let token = self.token_provider.bearer_token().await?;
        let request_path = format!("documents/{}", path.canonical_string());
        let body = json!({ "fields": encode_fields(fields) });

        let mask: Vec<(&str, &str)> = if merge {
            fields
                .keys()
                .map(|name| ("updateMask.fieldPaths", name.as_str()))
                .collect()
        } else {
            Vec::new()
        };

        self.connection
            .invoke_json(Method::PATCH, &request_path, &mask, Some(&body), &token)
            .await?;
        Ok(())
    }

    /// Creates a document with a server-assigned id.
    ///
    /// The generated id is deliberately not returned; callers that need the
    /// id pre-generate one and use [`FirestoreClient::set_document`]. This
    /// operation is NOT idempotent: retrying after a `TransportFailure` can
    /// create duplicate documents, so any retry needs a caller-supplied
    /// idempotency key.
    pub async fn create_document_auto_id(
        &self,
        collection_path: &str,
        fields: &BTreeMap<String, WireValue>,
    ) -> StoreResult<()> {
        let path = ResourcePath::collection(collection_path)?;
        let token = self.token_provider.bearer_token().await?;
        let request_path = format!("documents/{}", path.canonical_string());
        let body = json!({ "fields": encode_fields(fields) });

        self.connection
            .invoke_json(Method::POST, &request_path, &[], Some(&body), &token)
            .await?;
        Ok(())
    }

    /// Deletes a document. Deleting an already-absent document succeeds.
    pub async fn delete_document(&self, path: &str) -> StoreResult<()> {
        let path = ResourcePath::document(path)?;
        let token = self.token_provider.bearer_token().await?;
        let request_path = format!("documents/{}", path.canonical_string());

        self.connection
            .invoke_json_optional(Method::DELETE, &request_path, &[], None, &token)
            .await?;
        Ok(())
    }

    /// Runs a filtered query against one collection.
    ///
    /// The response is a stream of result envelopes; entries without a
    /// `document` key (cursor and heartbeat entries) are dropped. Documents
    /// come back in whatever order the store chose; no client-side sort is
    /// applied.
    pub async fn run_structured_query(
        &self,
        query: &StructuredQuery,
    ) -> StoreResult<Vec<Document>> {
        let token = self.token_provider.bearer_token().await?;
        let body = query.to_request_body();

        let response = self
            .connection
            .invoke_json(Method::POST, "documents:runQuery", &[], Some(&body), &token)
            .await?;

        let entries = response
            .as_array()
            .ok_or_else(|| query_decode_failure("runQuery response must be an array"))?;

        let mut documents = Vec::new();
        for entry in entries {
            let document = match entry.get("document") {
                Some(document) => document,
                None => continue,
            };

            let name = document
                .get("name")
                .and_then(JsonValue::as_str)
                .ok_or_else(|| query_decode_failure("result document missing 'name'"))?;
            let path = self.parse_document_name(name)?;
            let fields = decode_fields(document)?;
            documents.push(Document::new(path, fields));
        }

        Ok(documents)
    }

    fn parse_document_name(&self, name: &str) -> StoreResult<ResourcePath> {
        let relative = name.strip_prefix(&self.document_prefix).ok_or_else(|| {
            query_decode_failure(format!("Unexpected document name '{name}'"))
        })?;
        ResourcePath::from_string(relative)
            .map_err(|err| query_decode_failure(err.to_string()))
    }
}

impl FirestoreClientBuilder {
    fn new(project_id: impl Into<String>) -> Self {
        let project_id = project_id.into();
        let connection_builder = Connection::builder(project_id.clone());
        Self {
            project_id,
            connection_builder,
            token_provider: None,
        }
    }

    pub fn with_token_provider(mut self, provider: TokenProviderArc) -> Self {
        self.token_provider = Some(provider);
        self
    }

    pub fn with_connection_builder(mut self, builder: ConnectionBuilder) -> Self {
        self.connection_builder = builder;
        self
    }

    pub fn build(self) -> StoreResult<FirestoreClient> {
        let token_provider = self
            .token_provider
            .ok_or_else(|| auth_failure("A token provider is required"))?;
        let connection = self.connection_builder.build()?;
        let document_prefix = format!(
            "projects/{}/databases/{}/documents/",
            self.project_id, DEFAULT_DATABASE_ID
        );
        Ok(FirestoreClient {
            connection,
            token_provider,
            document_prefix,
        })
    }
}
