use serde::{Deserialize, Serialize};

/// Qualitative tier derived from a visit's conformity percentage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvaluationLabel {
    Insatisfatorio,
    Regular,
    Satisfatorio,
    Otimo,
    Excelente,
}

impl EvaluationLabel {
    pub const fn ordered() -> [Self; 5] {
        [
            Self::Excelente,
            Self::Otimo,
            Self::Satisfatorio,
            Self::Regular,
            Self::Insatisfatorio,
        ]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Excelente => "EXCELENTE",
            Self::Otimo => "ÓTIMO",
            Self::Satisfatorio => "SATISFATÓRIO",
            Self::Regular => "REGULAR",
            Self::Insatisfatorio => "INSATISFATÓRIO",
        }
    }

    /// Inclusive lower bound of the tier.
    pub const fn minimum(self) -> i32 {
        match self {
            Self::Excelente => 100,
            Self::Otimo => 90,
            Self::Satisfatorio => 80,
            Self::Regular => 70,
            Self::Insatisfatorio => 0,
        }
    }
}

/// Canonical step table, checked from the highest threshold down.
pub const EVALUATION_SCALE: [(i32, EvaluationLabel); 5] = [
    (100, EvaluationLabel::Excelente),
    (90, EvaluationLabel::Otimo),
    (80, EvaluationLabel::Satisfatorio),
    (70, EvaluationLabel::Regular),
    (0, EvaluationLabel::Insatisfatorio),
];

pub fn classify(percentage: i32) -> EvaluationLabel {
    EVALUATION_SCALE
        .iter()
        .find(|(minimum, _)| percentage >= *minimum)
        .map(|(_, label)| *label)
        .unwrap_or(EvaluationLabel::Insatisfatorio)
}

/// Row of the printed evaluation standard shown next to a visit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReferenceRow {
    pub percentage: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<EvaluationLabel>,
}

/// Display rows of the checklist standard. Rows without a label only pad the table; the
/// tiers themselves come from [`EVALUATION_SCALE`].
pub fn reference_rows() -> Vec<ReferenceRow> {
    const ROWS: [(u8, Option<EvaluationLabel>); 10] = [
        (100, Some(EvaluationLabel::Excelente)),
        (99, Some(EvaluationLabel::Otimo)),
        (93, None),
        (90, None),
        (89, Some(EvaluationLabel::Satisfatorio)),
        (83, None),
        (80, None),
        (79, Some(EvaluationLabel::Regular)),
        (73, None),
        (70, None),
    ];

    ROWS.iter()
        .map(|(percentage, label)| ReferenceRow {
            percentage: *percentage,
            label: *label,
        })
        .collect()
}
