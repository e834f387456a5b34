//! High-level client API.

use crate::auth::Credentials;
use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::store::{FileTokenStore, MemoryTokenStore, TokenStore};
use crate::transport::Transport;
use reqwest::header::HeaderMap;
use reqwest::Method;
use rgxr_protocol::endpoint;
use rgxr_protocol::message::*;
use rgxr_protocol::{Fa, FaRecord, FaSource, Operation, RenderResult, RunResult};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

/// High-level client for the rgxr services.
///
/// Every method performs its remote calls in order and returns the first
/// failure unchanged. Requests for the same operation issued concurrently
/// are independent; nothing is deduplicated.
pub struct Client {
    pub(crate) transport: Transport,
    credentials: Credentials,
}

impl Client {
    /// Creates a client from the configuration.
    ///
    /// The token store is a file when `token_file` is set, memory otherwise.
    /// A token found in the store is restored; a store that cannot be read
    /// leaves the client unauthenticated. `auth_token` from the
    /// configuration takes precedence over it.
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        let store: Arc<dyn TokenStore> = match config.token_file {
            Some(ref path) => Arc::new(FileTokenStore::new(path)),
            None => Arc::new(MemoryTokenStore::new()),
        };
        Self::with_token_store(config, store)
    }

    /// Creates a client backed by a caller-supplied token store.
    pub fn with_token_store(
        config: ClientConfig,
        store: Arc<dyn TokenStore>,
    ) -> Result<Self, ClientError> {
        let transport = Transport::new(&config)?;
        let credentials = Credentials::new(store);
        if let Err(e) = credentials.restore() {
            tracing::warn!("Ignoring unreadable stored token: {}", e);
        }
        if let Some(token) = config.auth_token {
            credentials.set(token);
        }

        Ok(Self {
            transport,
            credentials,
        })
    }

    /// Returns the configured base URL.
    pub fn base_url(&self) -> &str {
        self.transport.base_url()
    }

    // =========================================================================
    // Credentials
    // =========================================================================

    /// Exchanges an email and password for a bearer token.
    ///
    /// On success the token is persisted to the token store and used by every
    /// later authenticated call. On failure the client keeps whatever token
    /// it held before.
    pub async fn login(&self, email: &str, password: &str) -> Result<(), ClientError> {
        let params = LoginParams {
            email: email.to_string(),
            pass: password.to_string(),
        };
        let reply: Value = self
            .transport
            .exchange_json(
                Operation::Login,
                Method::POST,
                endpoint::LOGIN,
                Some(serde_json::to_value(params)?),
                Credentials::json_headers(),
            )
            .await?;

        // PostgREST may wrap a function result in a one-row array
        let reply = match reply {
            Value::Array(mut rows) if !rows.is_empty() => rows.swap_remove(0),
            other => other,
        };
        let LoginResult { token } = serde_json::from_value(reply)?;

        self.credentials.accept(token)?;
        tracing::debug!("Login succeeded");
        Ok(())
    }

    /// Sets the bearer token directly, without validating or persisting it.
    pub fn set_token(&self, token: impl Into<String>) {
        self.credentials.set(token.into());
    }

    /// Returns whether a bearer token is held.
    pub fn is_authenticated(&self) -> bool {
        self.credentials.is_authenticated()
    }

    /// Returns the currently held token.
    pub fn token(&self) -> Option<String> {
        self.credentials.token()
    }

    /// Headers sent with authenticated calls: always the JSON content type,
    /// plus the bearer header once a token is held.
    pub fn auth_headers(&self) -> HeaderMap {
        self.credentials.headers()
    }

    // =========================================================================
    // Helper methods
    // =========================================================================

    /// Authenticated JSON POST.
    pub(crate) async fn post<P, T>(
        &self,
        op: Operation,
        path: &str,
        params: P,
    ) -> Result<T, ClientError>
    where
        P: Serialize,
        T: DeserializeOwned,
    {
        let body = serde_json::to_value(params)?;
        self.transport
            .exchange_json(op, Method::POST, path, Some(body), self.auth_headers())
            .await
    }

    /// Unauthenticated GET returning the raw body.
    async fn get_text(&self, op: Operation, path: &str) -> Result<String, ClientError> {
        self.transport
            .exchange(op, Method::GET, path, None, Credentials::json_headers())
            .await
    }

    /// Unauthenticated GET decoding a JSON body.
    async fn get_json<T: DeserializeOwned>(
        &self,
        op: Operation,
        path: &str,
    ) -> Result<T, ClientError> {
        self.transport
            .exchange_json(op, Method::GET, path, None, Credentials::json_headers())
            .await
    }

    fn uuid_list<I, S>(uuids: I) -> UuidsParams
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        UuidsParams {
            uuids: uuids.into_iter().map(Into::into).collect(),
        }
    }

    fn uuid(uuid: &str) -> UuidParams {
        UuidParams {
            uuid: uuid.to_string(),
        }
    }

    // =========================================================================
    // Health
    // =========================================================================

    /// Checks that the conversion service is up. The reply body is ignored.
    pub async fn live(&self) -> Result<(), ClientError> {
        self.get_text(Operation::Live, endpoint::LIVE).await?;
        Ok(())
    }

    // =========================================================================
    // Conversion
    // =========================================================================

    /// Converts an automaton to its SVG, TeX and DOT renderings.
    pub async fn convert_fa(&self, fa: &Fa) -> Result<RenderResult, ClientError> {
        self.post(Operation::Convert, endpoint::CONVERT, FaSource::Fa(fa.clone()))
            .await
    }

    /// Converts a stored automaton, looked up server-side by id.
    pub async fn convert_by_uuid(&self, uuid: &str) -> Result<RenderResult, ClientError> {
        self.post(
            Operation::Convert,
            endpoint::CONVERT,
            FaSource::Uuid(uuid.to_string()),
        )
        .await
    }

    /// Builds an NFA from a regular expression.
    pub async fn regex_to_nfa(&self, regex: &str) -> Result<Fa, ClientError> {
        let params = RegexParams {
            regex: regex.to_string(),
        };
        self.post(Operation::RegexToNfa, endpoint::REGEX_TO_NFA, params)
            .await
    }

    /// Determinizes a stored automaton.
    pub async fn nfa_to_dfa(&self, uuid: &str) -> Result<Fa, ClientError> {
        self.post(Operation::NfaToDfa, endpoint::NFA_TO_DFA, Self::uuid(uuid))
            .await
    }

    /// Minimizes a stored DFA.
    pub async fn minimize_dfa(&self, uuid: &str) -> Result<Fa, ClientError> {
        self.post(Operation::MinimizeDfa, endpoint::MINIMIZE_DFA, Self::uuid(uuid))
            .await
    }

    /// Derives a regular expression from a stored automaton.
    ///
    /// Accepts either a `{"regex": ...}` object or the bare expression as
    /// the response body.
    pub async fn fa_to_regex(&self, uuid: &str) -> Result<String, ClientError> {
        let body = serde_json::to_value(Self::uuid(uuid))?;
        let text = self
            .transport
            .exchange(
                Operation::FaToRegex,
                Method::POST,
                endpoint::FA_TO_REGEX,
                Some(body),
                self.auth_headers(),
            )
            .await?;

        match serde_json::from_str::<RegexResult>(&text) {
            Ok(result) => Ok(result.regex),
            Err(_) => Ok(text.trim_end_matches(['\r', '\n']).to_string()),
        }
    }

    // =========================================================================
    // Rendering
    // =========================================================================

    /// Renders an automaton, storing the artifact server-side.
    pub async fn render_fa(&self, fa: &Fa) -> Result<RenderResult, ClientError> {
        self.post(Operation::Render, endpoint::RENDER, FaSource::Fa(fa.clone()))
            .await
    }

    /// Renders a stored automaton.
    pub async fn render_by_uuid(&self, uuid: &str) -> Result<RenderResult, ClientError> {
        self.post(
            Operation::Render,
            endpoint::RENDER,
            FaSource::Uuid(uuid.to_string()),
        )
        .await
    }

    /// Fetches the TeX source of a render artifact.
    pub async fn get_tex(&self, render_id: &str) -> Result<String, ClientError> {
        self.get_text(Operation::GetTex, &endpoint::tex(render_id))
            .await
    }

    /// Fetches the SVG markup of a render artifact.
    pub async fn get_svg(&self, render_id: &str) -> Result<String, ClientError> {
        self.get_text(Operation::GetSvg, &endpoint::svg(render_id))
            .await
    }

    // =========================================================================
    // Combination
    // =========================================================================

    /// Union of the stored automata. Order does not matter.
    pub async fn union<I, S>(&self, uuids: I) -> Result<Fa, ClientError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.post(Operation::Union, endpoint::UNION, Self::uuid_list(uuids))
            .await
    }

    /// Intersection of the stored automata.
    pub async fn intersection<I, S>(&self, uuids: I) -> Result<Fa, ClientError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.post(
            Operation::Intersection,
            endpoint::INTERSECTION,
            Self::uuid_list(uuids),
        )
        .await
    }

    /// Concatenation of the stored automata, in the order given.
    pub async fn concatenation<I, S>(&self, uuids: I) -> Result<Fa, ClientError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.post(
            Operation::Concatenation,
            endpoint::CONCATENATION,
            Self::uuid_list(uuids),
        )
        .await
    }

    /// Complement of a stored automaton.
    pub async fn complement(&self, uuid: &str) -> Result<Fa, ClientError> {
        self.post(Operation::Complement, endpoint::COMPLEMENT, Self::uuid(uuid))
            .await
    }

    // =========================================================================
    // Execution
    // =========================================================================

    /// Runs `input` through a stored automaton.
    pub async fn run_string(&self, uuid: &str, input: &str) -> Result<RunResult, ClientError> {
        let params = RunStringParams {
            uuid: uuid.to_string(),
            string: input.to_string(),
        };
        self.post(Operation::RunString, endpoint::RUN_STRING, params)
            .await
    }

    // =========================================================================
    // Persistence
    // =========================================================================

    /// Lists every stored automaton.
    pub async fn list_fas(&self) -> Result<Vec<FaRecord>, ClientError> {
        self.get_json(Operation::ListFas, endpoint::RECORDS).await
    }

    /// Fetches one stored automaton.
    ///
    /// Fails with [`ClientError::NotFound`] when no record has this id.
    pub async fn get_fa(&self, uuid: &str) -> Result<FaRecord, ClientError> {
        let rows: Vec<FaRecord> = self
            .get_json(Operation::GetFa, &endpoint::record(uuid))
            .await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| ClientError::NotFound(uuid.to_string()))
    }

    /// Deletes a stored automaton. Render artifacts it referenced are kept.
    pub async fn delete_fa(&self, uuid: &str) -> Result<(), ClientError> {
        self.transport
            .exchange(
                Operation::DeleteFa,
                Method::DELETE,
                &endpoint::record(uuid),
                None,
                self.auth_headers(),
            )
            .await?;
        Ok(())
    }
}
