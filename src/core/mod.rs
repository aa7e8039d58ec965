mod engine;
mod format;
mod profile;
mod types;

pub use engine::{
    MAX_REFERENCE_YEAR, MIN_REFERENCE_YEAR, chart_series, project, safe_monthly_withdrawal,
    summarize, windfall_applies,
};
pub use format::{format_currency, group_thousands};
pub use profile::{DEFAULT_WITHDRAWAL_RATE, MAX_AGE, MAX_INVESTMENT_RETURN, Profile, ProfileError};
pub use types::{ChartPoint, ProjectionSummary, YearlyResult};
