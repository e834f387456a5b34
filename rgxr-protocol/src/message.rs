//! JSON payloads exchanged with the conversion and persistence services.

use crate::fa::Fa;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Marker emitted in a run trace when no state remains active.
pub const DEAD_STATE: &str = "∅";

/// Remote operations exposed by the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    // Session
    Login,
    Live,

    // Conversion
    Convert,
    RegexToNfa,
    NfaToDfa,
    FaToRegex,
    MinimizeDfa,

    // Rendering
    Render,
    GetTex,
    GetSvg,

    // Combination
    Union,
    Intersection,
    Concatenation,
    Complement,

    // Execution
    RunString,

    // Persistence
    ListFas,
    GetFa,
    SaveFa,
    UpdateFa,
    DeleteFa,
}

impl Operation {
    /// Human-readable name, used as the prefix of failure messages.
    pub fn name(&self) -> &'static str {
        match self {
            Operation::Login => "Login",
            Operation::Live => "Live check",
            Operation::Convert => "Conversion",
            Operation::RegexToNfa => "Regex to NFA",
            Operation::NfaToDfa => "NFA to DFA",
            Operation::FaToRegex => "FA to regex",
            Operation::MinimizeDfa => "DFA minimization",
            Operation::Render => "Render",
            Operation::GetTex => "Get TeX",
            Operation::GetSvg => "Get SVG",
            Operation::Union => "Union",
            Operation::Intersection => "Intersection",
            Operation::Concatenation => "Concatenation",
            Operation::Complement => "Complement",
            Operation::RunString => "Run string",
            Operation::ListFas => "List FAs",
            Operation::GetFa => "Get FA",
            Operation::SaveFa => "Save FA",
            Operation::UpdateFa => "Update FA",
            Operation::DeleteFa => "Delete FA",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ============================================================================
// Conversion service payloads
// ============================================================================

/// Body for convert and render: either a full tuple or a stored FA id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FaSource {
    Fa(Fa),
    Uuid(String),
}

/// The three renderings of one automaton, produced together.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderResult {
    /// Identifier of the render artifact.
    pub id: String,
    pub svg: String,
    pub tex: String,
    pub dot: String,
}

/// Parameters for operations taking a single stored FA.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UuidParams {
    pub uuid: String,
}

/// Parameters for union, intersection and concatenation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UuidsParams {
    pub uuids: Vec<String>,
}

/// Parameters for regex-to-NFA.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegexParams {
    pub regex: String,
}

/// Result for FA-to-regex.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegexResult {
    pub regex: String,
}

/// Parameters for run-string.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunStringParams {
    pub uuid: String,
    pub string: String,
}

/// Result for run-string.
///
/// `path` starts with the initial configuration, so a run that consumes the
/// whole input has one more entry than the input has symbols. Entries for an
/// NFA list every active state separated by commas.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunResult {
    pub accepted: bool,
    pub path: Vec<String>,
}

impl RunResult {
    /// Returns the set of active states at each step of the trace.
    pub fn steps(&self) -> Vec<Vec<&str>> {
        self.path
            .iter()
            .map(|entry| {
                if entry == DEAD_STATE {
                    Vec::new()
                } else {
                    entry.split(',').filter(|s| !s.is_empty()).collect()
                }
            })
            .collect()
    }

    /// Returns whether the run stopped because no state remained active.
    pub fn died(&self) -> bool {
        self.path.last().is_some_and(|s| s == DEAD_STATE)
    }
}

// ============================================================================
// Persistence service payloads
// ============================================================================

/// Parameters for the login RPC.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginParams {
    pub email: String,
    pub pass: String,
}

/// Result of the login RPC.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResult {
    pub token: String,
}

/// Row inserted by a save.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewRecord {
    pub id: String,
    pub tuple: Fa,
    pub render: String,
    pub description: Option<String>,
}

/// Columns rewritten by an update.
///
/// A `None` description leaves the stored one as it is.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordPatch {
    pub tuple: Fa,
    pub render: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}
