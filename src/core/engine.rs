use tracing::debug;

use super::profile::{Profile, ProfileError};
use super::types::{ChartPoint, ProjectionSummary, YearlyResult};

const MONTHS_PER_YEAR: f64 = 12.0;

/// Calendar years accepted as a projection's reference year.
pub const MIN_REFERENCE_YEAR: i32 = 1;
pub const MAX_REFERENCE_YEAR: i32 = 9_999;

/// Validates `profile` and projects it one entry per year from the current
/// age through the retirement age inclusive. `reference_year` is the calendar
/// year the first entry belongs to; years past `i32::MAX` saturate, so keep it
/// within `MIN_REFERENCE_YEAR..=MAX_REFERENCE_YEAR`.
pub fn project(profile: &Profile, reference_year: i32) -> Result<Vec<YearlyResult>, ProfileError> {
    profile.validate()?;
    let years = simulate_years(profile, reference_year);
    debug!(
        reference_year,
        entries = years.len(),
        "projected profile to retirement"
    );
    Ok(years)
}

/// Whether the windfall lands in `target_year`: the holder is still short of
/// retirement that year, the year is not past the windfall end year, and
/// there is a windfall at all.
pub fn windfall_applies(profile: &Profile, target_year: i32, reference_year: i32) -> bool {
    let years_from_now = i64::from(target_year) - i64::from(reference_year);
    let age_at_year = i64::from(profile.current_age) + years_from_now;
    age_at_year < i64::from(profile.retirement_age)
        && target_year <= profile.windfall_end_year
        && profile.windfall_amount > 0.0
}

/// Monthly income sustainable from `portfolio_value` at an annual
/// `withdrawal_rate` (0.04 for 4%), rounded to a whole currency unit.
pub fn safe_monthly_withdrawal(portfolio_value: f64, withdrawal_rate: f64) -> f64 {
    (portfolio_value * withdrawal_rate / MONTHS_PER_YEAR).round()
}

pub fn summarize(
    profile: &Profile,
    years: &[YearlyResult],
    withdrawal_rate: f64,
) -> Option<ProjectionSummary> {
    let last = years.last()?;
    let windfall_years = years.iter().filter(|y| y.windfall_received).count() as u32;
    Some(ProjectionSummary {
        retirement_year: last.year,
        retirement_age: last.age,
        final_portfolio: last.portfolio,
        safe_monthly_withdrawal: safe_monthly_withdrawal(last.portfolio, withdrawal_rate),
        final_monthly_expenses: last.total_expenses,
        total_contributions: profile.monthly_investment * MONTHS_PER_YEAR * years.len() as f64,
        total_windfalls: profile.windfall_amount * f64::from(windfall_years),
        windfall_years,
    })
}

pub fn chart_series(years: &[YearlyResult]) -> Vec<ChartPoint> {
    years
        .iter()
        .map(|y| ChartPoint {
            year: y.year,
            age: y.age,
            portfolio: y.portfolio,
            annual_expenses: y.total_expenses * MONTHS_PER_YEAR,
        })
        .collect()
}

fn simulate_years(profile: &Profile, reference_year: i32) -> Vec<YearlyResult> {
    let growth = 1.0 + profile.investment_return / 100.0;
    let annual_contribution = profile.monthly_investment * MONTHS_PER_YEAR;
    let inflation = 1.0 + profile.expense_inflation / 100.0;
    // Validated profiles span at most MAX_AGE years.
    let span = profile.retirement_age.saturating_sub(profile.current_age) as i32;

    let mut portfolio = profile.current_savings;
    let mut results = Vec::with_capacity(profile.projection_len());
    for offset in 0..=span {
        let year = reference_year.saturating_add(offset);

        // Growth applies to last year's balance before this year's inflows.
        portfolio *= growth;
        portfolio += annual_contribution;
        let windfall_received = windfall_applies(profile, year, reference_year);
        if windfall_received {
            portfolio += profile.windfall_amount;
        }

        // Offset 0 reports today's expenses unadjusted.
        let inflation_factor = inflation.powi(offset);
        let rent = profile.rent * inflation_factor;
        let other_expenses = profile.other_expenses * inflation_factor;

        results.push(YearlyResult {
            year,
            age: profile.current_age + offset as u32,
            portfolio,
            rent,
            other_expenses,
            total_expenses: rent + other_expenses,
            windfall_received,
        });
    }
    results
}
