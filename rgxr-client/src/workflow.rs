//! Render-then-persist workflows.
//!
//! A stored record must reference a render artifact computed from the tuple
//! being stored, in the same call. `save_fa` and `update_fa` always render
//! first and only then write; the write payload can only be built from the
//! render result of that call, so there is no way to persist with a stale or
//! caller-supplied render id.
//!
//! If the render fails nothing is written. If the write fails after a
//! successful render, the artifact stays on the server unreferenced.

use crate::client::Client;
use crate::error::ClientError;
use reqwest::header::{HeaderName, HeaderValue};
use reqwest::Method;
use rgxr_protocol::endpoint;
use rgxr_protocol::message::{NewRecord, RecordPatch};
use rgxr_protocol::{Fa, FaRecord, Operation, RenderResult};

/// Asks PostgREST to answer writes with the written rows.
const PREFER_REPRESENTATION: &str = "return=representation";

/// A write whose render reference was produced from its own tuple.
struct PendingWrite {
    tuple: Fa,
    render: String,
    description: Option<String>,
}

impl PendingWrite {
    fn from_render(tuple: &Fa, render: RenderResult, description: Option<&str>) -> Self {
        Self {
            tuple: tuple.clone(),
            render: render.id,
            description: description.map(str::to_string),
        }
    }

    fn into_new_record(self, id: String) -> NewRecord {
        NewRecord {
            id,
            tuple: self.tuple,
            render: self.render,
            description: self.description,
        }
    }

    fn into_patch(self) -> RecordPatch {
        RecordPatch {
            tuple: self.tuple,
            render: self.render,
            description: self.description,
        }
    }
}

impl Client {
    /// Renders `fa` and stores it as a new record under a fresh random id.
    ///
    /// Returns the created record as echoed by the server. Saving the same
    /// automaton twice creates two records.
    ///
    /// A success reply without the row fails with
    /// [`ClientError::EmptyResponse`]. The row has been written by then, so
    /// saving again stores a second copy.
    pub async fn save_fa(
        &self,
        fa: &Fa,
        description: Option<&str>,
    ) -> Result<FaRecord, ClientError> {
        let render = self.render_fa(fa).await?;
        tracing::debug!("Rendered {} for save", render.id);

        let id = uuid::Uuid::new_v4().to_string();
        let row = PendingWrite::from_render(fa, render, description).into_new_record(id);

        let rows = self
            .write_rows(
                Operation::SaveFa,
                Method::POST,
                endpoint::RECORDS,
                serde_json::to_value(row)?,
            )
            .await?;
        rows.into_iter()
            .next()
            .ok_or(ClientError::EmptyResponse(Operation::SaveFa))
    }

    /// Renders `fa` and rewrites the record `uuid` with it.
    ///
    /// Returns `None` when no record has this id; the render artifact is
    /// still created in that case.
    pub async fn update_fa(
        &self,
        uuid: &str,
        fa: &Fa,
        description: Option<&str>,
    ) -> Result<Option<FaRecord>, ClientError> {
        let render = self.render_fa(fa).await?;
        tracing::debug!("Rendered {} for update of {}", render.id, uuid);

        let patch = PendingWrite::from_render(fa, render, description).into_patch();

        let rows = self
            .write_rows(
                Operation::UpdateFa,
                Method::PATCH,
                &endpoint::record(uuid),
                serde_json::to_value(patch)?,
            )
            .await?;
        Ok(rows.into_iter().next())
    }

    async fn write_rows(
        &self,
        op: Operation,
        method: Method,
        path: &str,
        body: serde_json::Value,
    ) -> Result<Vec<FaRecord>, ClientError> {
        let mut headers = self.auth_headers();
        headers.insert(
            HeaderName::from_static("prefer"),
            HeaderValue::from_static(PREFER_REPRESENTATION),
        );

        let text = self
            .transport
            .exchange(op, method, path, Some(body), headers)
            .await?;
        if text.trim().is_empty() {
            return Ok(Vec::new());
        }
        Ok(serde_json::from_str(&text)?)
    }
}
