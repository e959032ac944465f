use serde::{Deserialize, Serialize};

use super::super::domain::{PointValues, Weight};

/// Default point values applied to newly created checklist items, per weight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoringConfig {
    pub weight_one: PointValues,
    pub weight_two: PointValues,
}

impl ScoringConfig {
    pub fn points_for(&self, weight: Weight) -> PointValues {
        match weight {
            Weight::One => self.weight_one,
            Weight::Two => self.weight_two,
        }
    }
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            weight_one: PointValues {
                positive: 50,
                negative: -100,
            },
            weight_two: PointValues {
                positive: 100,
                negative: -200,
            },
        }
    }
}
