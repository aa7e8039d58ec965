use serde::Serialize;

/// One simulated year. Expense figures are monthly and in nominal terms for
/// that year.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct YearlyResult {
    pub year: i32,
    pub age: u32,
    pub portfolio: f64,
    pub rent: f64,
    pub other_expenses: f64,
    pub total_expenses: f64,
    pub windfall_received: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectionSummary {
    pub retirement_year: i32,
    pub retirement_age: u32,
    pub final_portfolio: f64,
    pub safe_monthly_withdrawal: f64,
    pub final_monthly_expenses: f64,
    pub total_contributions: f64,
    pub total_windfalls: f64,
    pub windfall_years: u32,
}

/// A point on the portfolio vs annual expenses chart.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartPoint {
    pub year: i32,
    pub age: u32,
    pub portfolio: f64,
    pub annual_expenses: f64,
}
