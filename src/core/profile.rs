use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Fraction of the final portfolio assumed sustainable as annual income.
pub const DEFAULT_WITHDRAWAL_RATE: f64 = 0.04;

pub const MAX_INVESTMENT_RETURN: f64 = 50.0;

/// Oldest retirement age a profile may project to. Bounds the projection at
/// `MAX_AGE + 1` entries.
pub const MAX_AGE: u32 = 150;

/// Inputs for a single projection run. Percentages are expressed as whole
/// percents (7.0 means 7%), monetary amounts in today's currency units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub current_age: u32,
    pub retirement_age: u32,
    pub current_savings: f64,
    pub monthly_investment: f64,
    pub investment_return: f64,
    pub windfall_amount: f64,
    pub windfall_end_year: i32,
    pub rent: f64,
    pub other_expenses: f64,
    pub expense_inflation: f64,
}

impl Default for Profile {
    fn default() -> Self {
        Self {
            current_age: 47,
            retirement_age: 67,
            current_savings: 0.0,
            monthly_investment: 250.0,
            investment_return: 7.0,
            windfall_amount: 10_000.0,
            windfall_end_year: 2030,
            rent: 1_200.0,
            other_expenses: 800.0,
            expense_inflation: 3.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProfileError {
    #[error(
        "current age ({current_age}) must be less than retirement age ({retirement_age}), which cannot exceed {max}",
        max = MAX_AGE
    )]
    InvalidTimeline {
        current_age: u32,
        retirement_age: u32,
    },

    #[error("investment return must be between 0% and 50%, got {0}%")]
    InvalidReturnRate(f64),

    #[error("windfall amount cannot be negative, got {0}")]
    InvalidWindfall(f64),
}

impl ProfileError {
    /// Stable identifier of the violated rule, for callers that branch on it.
    pub fn rule(&self) -> &'static str {
        match self {
            ProfileError::InvalidTimeline { .. } => "invalid-timeline",
            ProfileError::InvalidReturnRate(_) => "invalid-return-rate",
            ProfileError::InvalidWindfall(_) => "invalid-windfall",
        }
    }
}

impl Profile {
    /// Checks the timeline, then the return rate, then the windfall. The first
    /// violated rule is reported.
    pub fn validate(&self) -> Result<(), ProfileError> {
        if self.current_age >= self.retirement_age || self.retirement_age > MAX_AGE {
            return Err(ProfileError::InvalidTimeline {
                current_age: self.current_age,
                retirement_age: self.retirement_age,
            });
        }

        if !(0.0..=MAX_INVESTMENT_RETURN).contains(&self.investment_return) {
            return Err(ProfileError::InvalidReturnRate(self.investment_return));
        }

        // NaN fails here too.
        if !(self.windfall_amount >= 0.0) {
            return Err(ProfileError::InvalidWindfall(self.windfall_amount));
        }

        Ok(())
    }

    /// Number of yearly entries a projection of this profile produces.
    pub fn projection_len(&self) -> usize {
        self.retirement_age.saturating_sub(self.current_age) as usize + 1
    }
}
