//! Endpoint paths, relative to the configured base URL.

/// Conversion service prefix.
pub const API: &str = "/api";

/// Persistence service prefix.
pub const PGAPI: &str = "/pgapi";

pub const CONVERT: &str = "/api/convert";
pub const RENDER: &str = "/api/render";
pub const UNION: &str = "/api/union";
pub const INTERSECTION: &str = "/api/intersection";
pub const CONCATENATION: &str = "/api/concatenation";
pub const COMPLEMENT: &str = "/api/complement";
pub const FA_TO_REGEX: &str = "/api/fa-to-regex";
pub const REGEX_TO_NFA: &str = "/api/regex-to-nfa";
pub const NFA_TO_DFA: &str = "/api/nfa-to-dfa";
pub const MINIMIZE_DFA: &str = "/api/minimize-dfa";
pub const RUN_STRING: &str = "/api/run-string";

/// Liveness check of the conversion service.
pub const LIVE: &str = "/api/live";

/// The `finite_automatas` collection.
pub const RECORDS: &str = "/pgapi/finite_automatas";

/// Login RPC.
pub const LOGIN: &str = "/pgapi/rpc/login";

/// Stored TeX source of a render artifact.
pub fn tex(uuid: &str) -> String {
    format!("{API}/tex/{uuid}")
}

/// Stored SVG markup of a render artifact.
pub fn svg(uuid: &str) -> String {
    format!("{API}/svg/{uuid}")
}

/// The collection filtered down to the row with `id = uuid`.
pub fn record(uuid: &str) -> String {
    format!("{RECORDS}?id=eq.{uuid}")
}
