//! Generic record helpers.
//!
//! The backend's entities (galleries, awards, chronicles, overview pages)
//! all behave the same way at the wire level, so the helpers here work on
//! untyped [`serde_json::Value`] records rather than per-entity DTOs. List
//! responses go through [`hof_core::envelope::extract_records`] to absorb
//! the backend's inconsistent envelope shapes.

use hof_core::envelope::extract_records;
use hof_core::types::RecordId;
use serde_json::Value;

use crate::error::ApiError;
use crate::request::{ApiClient, RequestOptions};

/// Discriminator for image-accepting endpoints, which overload one route
/// for both creation and image replacement via a `type` form field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadKind {
    /// Create a new record with an image.
    Create,
    /// Replace the image on an existing record.
    EditImage,
}

impl UploadKind {
    /// Wire value of the `type` form field.
    pub fn discriminator(self) -> &'static str {
        match self {
            UploadKind::Create => "create",
            UploadKind::EditImage => "edit-image",
        }
    }
}

impl ApiClient {
    /// List records at `path`, normalizing whatever envelope the endpoint
    /// uses. Query pairs with `None` values are omitted.
    pub async fn list_records(
        &self,
        path: &str,
        query: &[(&str, Option<String>)],
    ) -> Result<Vec<Value>, ApiError> {
        let mut opts = RequestOptions::new();
        for (key, value) in query {
            opts = opts.with_query(*key, value.clone());
        }
        let body = self.get(path, opts).await?;
        Ok(extract_records(&body.into_json()))
    }

    /// Fetch a single record by id.
    pub async fn get_record(&self, path: &str, id: &RecordId) -> Result<Value, ApiError> {
        let body = self
            .get(&format!("{path}/{id}"), RequestOptions::new())
            .await?;
        Ok(body.into_json())
    }

    /// Create a record from a JSON body.
    pub async fn create_record(&self, path: &str, body: Value) -> Result<Value, ApiError> {
        let response = self
            .post(path, RequestOptions::new().with_json(body))
            .await?;
        Ok(response.into_json())
    }

    /// Update a record by id with a partial JSON body.
    pub async fn update_record(
        &self,
        path: &str,
        id: &RecordId,
        body: Value,
    ) -> Result<Value, ApiError> {
        let response = self
            .patch(&format!("{path}/{id}"), RequestOptions::new().with_json(body))
            .await?;
        Ok(response.into_json())
    }

    /// Delete a record by id.
    pub async fn delete_record(&self, path: &str, id: &RecordId) -> Result<(), ApiError> {
        self.delete(&format!("{path}/{id}"), RequestOptions::new())
            .await?;
        Ok(())
    }

    /// Submit a multipart form to an image-accepting endpoint.
    ///
    /// The form carries the `type` discriminator from `kind`, the given
    /// text fields, and the file bytes under the `image` part. No content
    /// type is set here; the transport owns the multipart boundary.
    pub async fn upload_image(
        &self,
        path: &str,
        kind: UploadKind,
        fields: &[(&str, String)],
        file_name: &str,
        bytes: Vec<u8>,
    ) -> Result<Value, ApiError> {
        let mut form = reqwest::multipart::Form::new().text("type", kind.discriminator());
        for (key, value) in fields {
            form = form.text(key.to_string(), value.clone());
        }
        form = form.part(
            "image",
            reqwest::multipart::Part::bytes(bytes).file_name(file_name.to_string()),
        );

        let response = self
            .post(path, RequestOptions::new().with_multipart(form))
            .await?;
        Ok(response.into_json())
    }
}
