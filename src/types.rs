//! Core types for the deposit ledger.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

/// Microseconds since Unix epoch.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Timestamp(pub i64);

impl Timestamp {
    /// Current time.
    pub fn now() -> Self {
        let duration = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("Time went backwards");
        Timestamp(duration.as_micros() as i64)
    }
}

impl fmt::Debug for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Timestamp({})", self.0)
    }
}

/// Identifier of an accounting period.
///
/// Derived from the timestamp at which the period became current. Ordered
/// only by position in the snapshot history, never parsed back.
#[derive(Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PeriodId(pub String);

impl PeriodId {
    /// Derive a fresh period id from a timestamp.
    pub fn derive(ts: Timestamp) -> Self {
        PeriodId(format!("period-{}", ts.0))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for PeriodId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PeriodId({})", self.0)
    }
}

impl fmt::Display for PeriodId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Deterministic slug of a display name.
///
/// Diacritics are folded to ASCII, letters lowercased, whitespace removed,
/// so "José Río" and "jose rio" derive the same id.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ContributorId(pub String);

impl ContributorId {
    /// Derive the id for a display name.
    pub fn derive(name: &str) -> Self {
        let mut out = String::with_capacity(name.len());
        for ch in name.chars() {
            if ch.is_whitespace() {
                continue;
            }
            out.push(fold_diacritic(ch).to_ascii_lowercase());
        }
        ContributorId(out)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ContributorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContributorId({})", self.0)
    }
}

impl fmt::Display for ContributorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Fold a Latin letter with a diacritic to its bare ASCII form.
///
/// Covers the Latin-1 and Latin Extended-A letters that occur in member
/// names; anything else passes through unchanged.
pub(crate) fn fold_diacritic(ch: char) -> char {
    match ch {
        'á' | 'à' | 'â' | 'ä' | 'ã' | 'å' | 'ā' | 'ă' => 'a',
        'Á' | 'À' | 'Â' | 'Ä' | 'Ã' | 'Å' | 'Ā' | 'Ă' => 'A',
        'é' | 'è' | 'ê' | 'ë' | 'ē' | 'ė' | 'ę' => 'e',
        'É' | 'È' | 'Ê' | 'Ë' | 'Ē' | 'Ė' | 'Ę' => 'E',
        'í' | 'ì' | 'î' | 'ï' | 'ī' => 'i',
        'Í' | 'Ì' | 'Î' | 'Ï' | 'Ī' => 'I',
        'ó' | 'ò' | 'ô' | 'ö' | 'õ' | 'ō' | 'ő' => 'o',
        'Ó' | 'Ò' | 'Ô' | 'Ö' | 'Õ' | 'Ō' | 'Ő' => 'O',
        'ú' | 'ù' | 'û' | 'ü' | 'ū' | 'ű' => 'u',
        'Ú' | 'Ù' | 'Û' | 'Ü' | 'Ū' | 'Ű' => 'U',
        'ç' | 'ć' | 'č' => 'c',
        'Ç' | 'Ć' | 'Č' => 'C',
        'ñ' | 'ń' => 'n',
        'Ñ' | 'Ń' => 'N',
        'ß' => 's',
        'ý' | 'ÿ' => 'y',
        'Ý' => 'Y',
        'š' => 's',
        'Š' => 'S',
        'ž' => 'z',
        'Ž' => 'Z',
        'ł' => 'l',
        'Ł' => 'L',
        other => other,
    }
}

/// A single deposit inside a contributor series, with a back-reference to
/// its position in the aggregate series.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DepositEntry {
    pub time: String,
    pub value: f64,
    pub aggregate_index: usize,
}

/// An ordered deposit timeline.
///
/// `labels` and `values` are index-aligned and always the same length. For
/// contributor series, `entries` carries one element per deposit mirroring
/// the label/value pair plus the aggregate cross-reference; the aggregate
/// series keeps `entries` empty.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DepositSeries {
    pub labels: Vec<String>,
    pub values: Vec<f64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub entries: Vec<DepositEntry>,
}

impl DepositSeries {
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Sum of all deposit values.
    pub fn total(&self) -> f64 {
        self.values.iter().sum()
    }

    /// Append a deposit, keeping labels and values aligned.
    pub fn push(&mut self, label: impl Into<String>, value: f64) {
        self.labels.push(label.into());
        self.values.push(value);
    }
}

/// A team roster entry.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RosterMember {
    pub id: ContributorId,
    pub name: String,
    pub description: String,
}

/// Per-contributor summary produced by `list_contributors`.
///
/// Computed fresh on every call, never cached.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ContributorSummary {
    pub id: ContributorId,
    pub name: String,
    pub deposit_count: usize,
    pub total: f64,
}

/// Complete live state, as pushed to subscribers and returned by
/// `Tally::full_state`.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct FullState {
    pub aggregate: DepositSeries,
    pub contributors: BTreeMap<String, DepositSeries>,
    pub roster: Vec<RosterMember>,
    pub period: PeriodId,
}

/// Ledger statistics.
#[derive(Clone, Debug, Default)]
pub struct TallyStats {
    pub aggregate_deposits: usize,
    pub contributor_count: usize,
    pub roster_size: usize,
    pub period_count: usize,
    pub audit_entries: usize,
    pub subscriber_count: usize,
}
