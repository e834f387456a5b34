//! Finite automaton data contract.
//!
//! The transition table is a matrix indexed by `(state index, symbol index)`
//! following the order of `states` and `alphabet`. A cell holds either one
//! target state or a list of targets; list cells are how nondeterminism is
//! expressed on the wire.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// Alphabet symbol denoting an epsilon move.
pub const EPSILON: &str = "@e";

/// Cell value denoting "no transition".
pub const VOID: &str = "@v";

/// A finite automaton, deterministic or not.
///
/// The client never checks that `initial` is a member of `states` or that
/// `acceptance` is a subset of it; that is the conversion service's job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fa {
    pub alphabet: Vec<String>,
    pub states: Vec<String>,
    pub initial: String,
    pub acceptance: Vec<String>,
    pub transitions: Vec<Vec<Transition>>,
}

/// One cell of the transition table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Transition {
    /// Exactly one target state.
    Single(String),
    /// Any number of target states.
    Multi(Vec<String>),
}

impl Transition {
    /// Returns the target states of this cell, whatever its arity.
    ///
    /// The void marker and empty names are dropped, so a cell with no real
    /// target yields an empty list.
    pub fn targets(&self) -> Vec<&str> {
        let keep = |s: &&String| !s.is_empty() && s.as_str() != VOID;
        match self {
            Transition::Single(s) => std::iter::once(s).filter(keep).map(String::as_str).collect(),
            Transition::Multi(v) => v.iter().filter(keep).map(String::as_str).collect(),
        }
    }

    /// Returns whether this cell fans out to more than one state.
    pub fn is_branching(&self) -> bool {
        self.targets().len() > 1
    }
}

impl From<&str> for Transition {
    fn from(s: &str) -> Self {
        Transition::Single(s.to_string())
    }
}

impl From<Vec<&str>> for Transition {
    fn from(v: Vec<&str>) -> Self {
        Transition::Multi(v.into_iter().map(str::to_string).collect())
    }
}

impl Fa {
    /// Returns the targets reached from `state` on `symbol`.
    ///
    /// Unknown states, unknown symbols and short rows all yield no targets.
    pub fn next(&self, state: &str, symbol: &str) -> Vec<&str> {
        let row = self.states.iter().position(|s| s == state);
        let col = self.alphabet.iter().position(|s| s == symbol);
        match (row, col) {
            (Some(r), Some(c)) => self
                .transitions
                .get(r)
                .and_then(|cells| cells.get(c))
                .map(Transition::targets)
                .unwrap_or_default(),
            _ => Vec::new(),
        }
    }

    /// Returns whether the alphabet contains the epsilon symbol.
    pub fn has_epsilon(&self) -> bool {
        self.alphabet.iter().any(|s| s == EPSILON)
    }

    /// Returns whether every cell has at most one target and there are no
    /// epsilon moves.
    pub fn is_deterministic(&self) -> bool {
        !self.has_epsilon()
            && self
                .transitions
                .iter()
                .flatten()
                .all(|cell| !cell.is_branching())
    }
}

/// A persisted automaton as stored in the `finite_automatas` collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaRecord {
    pub id: String,
    #[serde(default)]
    pub description: Option<String>,
    pub tuple: Fa,
    pub render: String,
    /// Server-assigned timestamp, kept verbatim.
    pub created_at: String,
}

impl FaRecord {
    /// Parses `created_at`.
    ///
    /// Accepts RFC 3339 and PostgreSQL's offset-less `timestamp` text, the
    /// latter read as UTC.
    pub fn created_at_utc(&self) -> Option<DateTime<Utc>> {
        if let Ok(ts) = DateTime::parse_from_rfc3339(&self.created_at) {
            return Some(ts.with_timezone(&Utc));
        }
        NaiveDateTime::parse_from_str(&self.created_at, "%Y-%m-%dT%H:%M:%S%.f")
            .or_else(|_| NaiveDateTime::parse_from_str(&self.created_at, "%Y-%m-%d %H:%M:%S%.f"))
            .ok()
            .map(|naive| naive.and_utc())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> Fa {
        serde_json::from_value(json!({
            "alphabet": ["a", "b"],
            "states": ["s0", "s1"],
            "initial": "s0",
            "acceptance": ["s1"],
            "transitions": [["s0", "s1"], ["s1", "s1"]]
        }))
        .unwrap()
    }

    #[test]
    fn test_scalar_cells_decode_as_single() {
        let fa = sample();
        assert_eq!(fa.transitions[0][1], Transition::Single("s1".into()));
        assert!(fa.is_deterministic());
        assert_eq!(fa.next("s0", "b"), vec!["s1"]);
    }

    #[test]
    fn test_array_cells_decode_as_multi() {
        let fa: Fa = serde_json::from_value(json!({
            "alphabet": ["a", "@e"],
            "states": ["q0", "q1", "q2"],
            "initial": "q0",
            "acceptance": ["q2"],
            "transitions": [[["q0", "q1"], "q2"], ["@v", []], ["q2", "@v"]]
        }))
        .unwrap();

        assert_eq!(fa.next("q0", "a"), vec!["q0", "q1"]);
        assert!(fa.next("q1", "a").is_empty());
        assert!(fa.next("q1", "@e").is_empty());
        assert!(fa.has_epsilon());
        assert!(!fa.is_deterministic());
    }

    #[test]
    fn test_next_on_unknown_inputs() {
        let fa = sample();
        assert!(fa.next("missing", "a").is_empty());
        assert!(fa.next("s0", "z").is_empty());

        let mut short = sample();
        short.transitions[1].truncate(1);
        assert!(short.next("s1", "b").is_empty());
    }

    #[test]
    fn test_transition_serializes_in_wire_shape() {
        let single = serde_json::to_value(Transition::from("s1")).unwrap();
        assert_eq!(single, json!("s1"));

        let multi = serde_json::to_value(Transition::from(vec!["s0", "s1"])).unwrap();
        assert_eq!(multi, json!(["s0", "s1"]));
    }

    #[test]
    fn test_single_element_multi_is_not_branching() {
        let cell = Transition::from(vec!["s0", VOID]);
        assert_eq!(cell.targets(), vec!["s0"]);
        assert!(!cell.is_branching());
    }

    #[test]
    fn test_record_decodes_null_description() {
        let record: FaRecord = serde_json::from_value(json!({
            "id": "6f1c",
            "description": null,
            "tuple": sample(),
            "render": "6f1c-render",
            "created_at": "2025-03-01T10:20:30.123456+00:00"
        }))
        .unwrap();

        assert!(record.description.is_none());
        assert_eq!(record.tuple, sample());
        let ts = record.created_at_utc().unwrap();
        assert_eq!(ts.to_rfc3339(), "2025-03-01T10:20:30.123456+00:00");
    }

    #[test]
    fn test_created_at_without_offset() {
        let record = FaRecord {
            id: "x".into(),
            description: Some("d".into()),
            tuple: sample(),
            render: "r".into(),
            created_at: "2025-03-01T10:20:30.5".into(),
        };
        assert!(record.created_at_utc().is_some());

        let bad = FaRecord {
            created_at: "yesterday".into(),
            ..record
        };
        assert!(bad.created_at_utc().is_none());
    }
}
