use serde::{Deserialize, Serialize};

/// Which scoring module produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreKind {
    Novelty,
    Cost,
    Plagiarism,
}

impl ScoreKind {
    /// Declared inclusive value range for this kind.
    pub fn range(&self) -> (f64, f64) {
        match self {
            Self::Novelty | Self::Plagiarism => (0.0, 1.0),
            Self::Cost => (0.0, 1_000_000_000.0),
        }
    }

    /// Unit of the numeric value.
    pub fn unit(&self) -> &'static str {
        match self {
            Self::Novelty | Self::Plagiarism => "score",
            Self::Cost => "USD",
        }
    }
}

/// A bounded numeric verdict with its rationale and the passages behind it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreResult {
    pub kind: ScoreKind,
    pub value: f64,
    pub unit: String,
    pub rationale: String,
    /// Ids of the passages the rationale rests on. Empty only for trivial
    /// defaults (e.g. zero plagiarism with no matches) or estimates
    /// explicitly marked unsupported.
    pub supporting: Vec<String>,
}

impl ScoreResult {
    /// Build a result, clamping the value into the kind's declared range
    /// so the range invariant holds by construction.
    pub fn new(
        kind: ScoreKind,
        value: f64,
        rationale: impl Into<String>,
        supporting: Vec<String>,
    ) -> Self {
        let (min, max) = kind.range();
        Self {
            kind,
            value: value.clamp(min, max),
            unit: kind.unit().to_string(),
            rationale: rationale.into(),
            supporting,
        }
    }

    pub fn in_range(&self) -> bool {
        let (min, max) = self.kind.range();
        (min..=max).contains(&self.value)
    }
}
