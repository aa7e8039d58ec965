use axum::{
    Router,
    extract::{Json, Query},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use chrono::Datelike;
use clap::Parser;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt::{self, Write as _};
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::core::{
    ChartPoint, DEFAULT_WITHDRAWAL_RATE, MAX_REFERENCE_YEAR, MIN_REFERENCE_YEAR, Profile,
    ProfileError, ProjectionSummary, YearlyResult, chart_series, format_currency, project,
    summarize,
};

const EXIT_FAILURE: i32 = 1;
const EXIT_INVALID_PROFILE: i32 = 2;

/// Raw field values from a request, a stored profile file, or CLI flags.
/// Each field may be a JSON number or a numeric string; anything missing,
/// blank, or unparseable leaves the previous value in place.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct ProjectPayload {
    current_age: Option<Value>,
    retirement_age: Option<Value>,
    current_savings: Option<Value>,
    monthly_investment: Option<Value>,
    investment_return: Option<Value>,
    windfall_amount: Option<Value>,
    windfall_end_year: Option<Value>,
    rent: Option<Value>,
    other_expenses: Option<Value>,
    expense_inflation: Option<Value>,
    withdrawal_rate: Option<Value>,
    reference_year: Option<Value>,
}

#[derive(Parser, Debug)]
#[command(
    name = "nestegg",
    about = "Year-by-year retirement projection with a recurring windfall and inflating expenses",
    after_help = "Run `nestegg serve [port]` to start the HTTP API instead."
)]
struct Cli {
    #[arg(long, help = "JSON file with stored profile fields (same keys as the HTTP API)")]
    profile: Option<PathBuf>,
    #[arg(long, help = "Ignore --profile and project from the default configuration")]
    reset: bool,
    #[arg(long)]
    current_age: Option<u32>,
    #[arg(long)]
    retirement_age: Option<u32>,
    #[arg(long)]
    current_savings: Option<f64>,
    #[arg(long, help = "Amount invested every month")]
    monthly_investment: Option<f64>,
    #[arg(long, help = "Expected annual return in percent, between 0 and 50")]
    investment_return: Option<f64>,
    #[arg(long, help = "Windfall added once per eligible year")]
    windfall_amount: Option<f64>,
    #[arg(long, help = "Last calendar year the windfall may be received")]
    windfall_end_year: Option<i32>,
    #[arg(long, help = "Monthly rent in today's money")]
    rent: Option<f64>,
    #[arg(long, help = "Other monthly expenses in today's money")]
    other_expenses: Option<f64>,
    #[arg(long, help = "Annual expense inflation in percent")]
    expense_inflation: Option<f64>,
    #[arg(long, help = "Safe withdrawal rate in percent, defaults to 4")]
    withdrawal_rate: Option<f64>,
    #[arg(long, help = "Calendar year of the first projected entry, defaults to this year")]
    reference_year: Option<i32>,
    #[arg(long, help = "Print the full projection document as JSON")]
    json: bool,
}

impl From<&Cli> for ProjectPayload {
    fn from(cli: &Cli) -> Self {
        Self {
            current_age: cli.current_age.map(Value::from),
            retirement_age: cli.retirement_age.map(Value::from),
            current_savings: cli.current_savings.map(Value::from),
            monthly_investment: cli.monthly_investment.map(Value::from),
            investment_return: cli.investment_return.map(Value::from),
            windfall_amount: cli.windfall_amount.map(Value::from),
            windfall_end_year: cli.windfall_end_year.map(Value::from),
            rent: cli.rent.map(Value::from),
            other_expenses: cli.other_expenses.map(Value::from),
            expense_inflation: cli.expense_inflation.map(Value::from),
            withdrawal_rate: cli.withdrawal_rate.map(Value::from),
            reference_year: cli.reference_year.map(Value::from),
        }
    }
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read profile file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid profile file {path}: {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Profile and options accumulated from successive override layers.
#[derive(Debug, Clone)]
struct Draft {
    profile: Profile,
    withdrawal_rate_percent: f64,
    reference_year: Option<i32>,
}

impl Default for Draft {
    fn default() -> Self {
        Self {
            profile: Profile::default(),
            withdrawal_rate_percent: DEFAULT_WITHDRAWAL_RATE * 100.0,
            reference_year: None,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq)]
struct ProjectionOptions {
    withdrawal_rate: f64,
    reference_year: i32,
}

#[derive(Debug, Clone)]
struct ProjectionRequest {
    profile: Profile,
    options: ProjectionOptions,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SummaryDisplay {
    final_portfolio: String,
    safe_monthly_withdrawal: String,
    final_monthly_expenses: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ProjectResponse {
    reference_year: i32,
    withdrawal_rate: f64,
    profile: Profile,
    years: Vec<YearlyResult>,
    summary: Option<ProjectionSummary>,
    display: Option<SummaryDisplay>,
    chart: Vec<ChartPoint>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct DefaultsResponse {
    profile: Profile,
    withdrawal_rate: f64,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    rule: Option<&'static str>,
}

fn number_field(value: Option<&Value>) -> Option<f64> {
    let parsed = match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    parsed.is_finite().then_some(parsed)
}

fn age_field(value: Option<&Value>) -> Option<u32> {
    number_field(value)
        .filter(|v| (0.0..=f64::from(u32::MAX)).contains(v))
        .map(|v| v.trunc() as u32)
}

fn year_field(value: Option<&Value>) -> Option<i32> {
    number_field(value)
        .filter(|v| (f64::from(i32::MIN)..=f64::from(i32::MAX)).contains(v))
        .map(|v| v.trunc() as i32)
}

fn apply_payload(draft: &mut Draft, payload: &ProjectPayload) {
    let profile = &mut draft.profile;

    if let Some(v) = age_field(payload.current_age.as_ref()) {
        profile.current_age = v;
    }
    if let Some(v) = age_field(payload.retirement_age.as_ref()) {
        profile.retirement_age = v;
    }
    if let Some(v) = number_field(payload.current_savings.as_ref()) {
        profile.current_savings = v;
    }
    if let Some(v) = number_field(payload.monthly_investment.as_ref()) {
        profile.monthly_investment = v;
    }
    if let Some(v) = number_field(payload.investment_return.as_ref()) {
        profile.investment_return = v;
    }
    if let Some(v) = number_field(payload.windfall_amount.as_ref()) {
        profile.windfall_amount = v;
    }
    if let Some(v) = year_field(payload.windfall_end_year.as_ref()) {
        profile.windfall_end_year = v;
    }
    if let Some(v) = number_field(payload.rent.as_ref()) {
        profile.rent = v;
    }
    if let Some(v) = number_field(payload.other_expenses.as_ref()) {
        profile.other_expenses = v;
    }
    if let Some(v) = number_field(payload.expense_inflation.as_ref()) {
        profile.expense_inflation = v;
    }

    if let Some(v) = number_field(payload.withdrawal_rate.as_ref()) {
        draft.withdrawal_rate_percent = v;
    }
    if let Some(v) = year_field(payload.reference_year.as_ref()) {
        draft.reference_year = Some(v);
    }
}

fn finish_request(draft: Draft, current_year: i32) -> Result<ProjectionRequest, String> {
    if !(draft.withdrawal_rate_percent > 0.0 && draft.withdrawal_rate_percent <= 100.0) {
        return Err(format!(
            "withdrawal rate must be greater than 0% and at most 100%, got {}%",
            draft.withdrawal_rate_percent
        ));
    }

    let reference_year = draft.reference_year.unwrap_or(current_year);
    if !(MIN_REFERENCE_YEAR..=MAX_REFERENCE_YEAR).contains(&reference_year) {
        return Err(format!(
            "reference year must be between {MIN_REFERENCE_YEAR} and {MAX_REFERENCE_YEAR}, got {reference_year}"
        ));
    }

    Ok(ProjectionRequest {
        profile: draft.profile,
        options: ProjectionOptions {
            withdrawal_rate: draft.withdrawal_rate_percent / 100.0,
            reference_year,
        },
    })
}

fn current_year() -> i32 {
    chrono::Local::now().year()
}

fn load_profile_file(path: &Path) -> Result<ProjectPayload, LoadError> {
    let display = path.display().to_string();
    let raw = fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: display.clone(),
        source,
    })?;
    serde_json::from_str(&raw).map_err(|source| LoadError::Json {
        path: display,
        source,
    })
}

fn build_project_response(request: ProjectionRequest) -> Result<ProjectResponse, ProfileError> {
    let ProjectionRequest { profile, options } = request;
    let years = project(&profile, options.reference_year)?;
    let summary = summarize(&profile, &years, options.withdrawal_rate);
    let display = summary.as_ref().map(|s| SummaryDisplay {
        final_portfolio: format_currency(s.final_portfolio),
        safe_monthly_withdrawal: format_currency(s.safe_monthly_withdrawal),
        final_monthly_expenses: format_currency(s.final_monthly_expenses),
    });
    let chart = chart_series(&years);

    Ok(ProjectResponse {
        reference_year: options.reference_year,
        withdrawal_rate: options.withdrawal_rate * 100.0,
        profile,
        years,
        summary,
        display,
        chart,
    })
}

fn render_table(response: &ProjectResponse) -> Result<String, fmt::Error> {
    let mut out = String::new();
    writeln!(
        out,
        "{:<6} {:>4} {:>12} {:>18} {:>9}",
        "Year", "Age", "Portfolio", "Monthly expenses", "Windfall"
    )?;
    for y in &response.years {
        writeln!(
            out,
            "{:<6} {:>4} {:>12} {:>18} {:>9}",
            y.year,
            y.age,
            format_currency(y.portfolio),
            format_currency(y.total_expenses),
            if y.windfall_received { "yes" } else { "" }
        )?;
    }

    if let Some(summary) = &response.summary {
        writeln!(out)?;
        writeln!(
            out,
            "Portfolio at {} (age {}): {}",
            summary.retirement_year,
            summary.retirement_age,
            format_currency(summary.final_portfolio)
        )?;
        writeln!(
            out,
            "Safe monthly withdrawal at {}%: {}",
            response.withdrawal_rate,
            format_currency(summary.safe_monthly_withdrawal)
        )?;
        writeln!(
            out,
            "Monthly expenses at retirement: {}",
            format_currency(summary.final_monthly_expenses)
        )?;
        writeln!(
            out,
            "Contributions: {}  Windfalls: {} over {} year(s)",
            format_currency(summary.total_contributions),
            format_currency(summary.total_windfalls),
            summary.windfall_years
        )?;
    }
    Ok(out)
}

/// Runs the command-line projection and returns the process exit code.
pub fn run_cli<I, T>(args: I) -> i32
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    let cli = match Cli::try_parse_from(args) {
        Ok(cli) => cli,
        Err(e) => e.exit(),
    };

    let mut draft = Draft::default();
    if let Some(path) = cli.profile.as_deref().filter(|_| !cli.reset) {
        match load_profile_file(path) {
            Ok(stored) => apply_payload(&mut draft, &stored),
            Err(e) => {
                eprintln!("{e}");
                return EXIT_FAILURE;
            }
        }
    }
    apply_payload(&mut draft, &ProjectPayload::from(&cli));

    let request = match finish_request(draft, current_year()) {
        Ok(request) => request,
        Err(msg) => {
            eprintln!("{msg}");
            return EXIT_FAILURE;
        }
    };

    let response = match build_project_response(request) {
        Ok(response) => response,
        Err(e) => {
            warn!(rule = e.rule(), "rejected profile");
            eprintln!("Invalid profile: {e}");
            return EXIT_INVALID_PROFILE;
        }
    };

    if cli.json {
        match serde_json::to_string_pretty(&response) {
            Ok(json) => println!("{json}"),
            Err(e) => {
                eprintln!("Failed to serialize projection: {e}");
                return EXIT_FAILURE;
            }
        }
    } else {
        match render_table(&response) {
            Ok(table) => print!("{table}"),
            Err(e) => {
                eprintln!("Failed to render projection: {e}");
                return EXIT_FAILURE;
            }
        }
    }
    0
}

pub async fn run_http_server(port: u16) -> std::io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let app = Router::new()
        .route(
            "/api/project",
            get(project_get_handler).post(project_post_handler),
        )
        .route("/api/defaults", get(defaults_handler))
        .fallback(not_found_handler);

    let listener = TcpListener::bind(addr).await?;
    info!(%addr, "projection HTTP API listening");
    println!("Projection HTTP API listening on http://{addr}");
    println!("Local access: http://127.0.0.1:{port}/api/project");

    axum::serve(listener, app).await
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found", None)
}

async fn defaults_handler() -> Response {
    json_response(
        StatusCode::OK,
        DefaultsResponse {
            profile: Profile::default(),
            withdrawal_rate: DEFAULT_WITHDRAWAL_RATE * 100.0,
        },
    )
}

async fn project_get_handler(Query(payload): Query<ProjectPayload>) -> Response {
    project_handler_impl(payload).await
}

async fn project_post_handler(Json(payload): Json<ProjectPayload>) -> Response {
    project_handler_impl(payload).await
}

async fn project_handler_impl(payload: ProjectPayload) -> Response {
    let mut draft = Draft::default();
    apply_payload(&mut draft, &payload);
    let request = match finish_request(draft, current_year()) {
        Ok(request) => request,
        Err(msg) => return error_response(StatusCode::BAD_REQUEST, &msg, None),
    };

    let reference_year = request.options.reference_year;
    match build_project_response(request) {
        Ok(response) => {
            info!(
                reference_year,
                entries = response.years.len(),
                "served projection"
            );
            json_response(StatusCode::OK, response)
        }
        Err(e) => {
            warn!(rule = e.rule(), "rejected profile");
            error_response(StatusCode::BAD_REQUEST, &e.to_string(), Some(e.rule()))
        }
    }
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    let mut response = (status, Json(body)).into_response();
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        "no-store".parse().expect("valid header"),
    );
    response
}

fn error_response(status: StatusCode, msg: &str, rule: Option<&'static str>) -> Response {
    json_response(
        status,
        ErrorResponse {
            error: msg.to_string(),
            rule,
        },
    )
}

#[cfg(test)]
fn request_from_json(json: &str, current_year: i32) -> Result<ProjectionRequest, String> {
    let payload = serde_json::from_str::<ProjectPayload>(json)
        .map_err(|e| format!("Invalid API JSON payload: {e}"))?;
    let mut draft = Draft::default();
    apply_payload(&mut draft, &payload);
    finish_request(draft, current_year)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Uri;
    use std::sync::atomic::{AtomicU32, Ordering};

    const EPS: f64 = 1e-6;

    fn assert_approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() <= EPS,
            "expected {expected}, got {actual}"
        );
    }

    fn temp_profile_path(contents: &str) -> PathBuf {
        static COUNTER: AtomicU32 = AtomicU32::new(0);
        let name = format!(
            "nestegg-profile-{}-{}.json",
            std::process::id(),
            COUNTER.fetch_add(1, Ordering::Relaxed)
        );
        let path = std::env::temp_dir().join(name);
        fs::write(&path, contents).expect("failed to write temp profile");
        path
    }

    #[test]
    fn request_from_json_parses_web_keys() {
        let json = r#"{
          "currentAge": 35,
          "retirementAge": 60,
          "currentSavings": 25000,
          "monthlyInvestment": "500",
          "investmentReturn": 6.5,
          "windfallAmount": "2500.50",
          "windfallEndYear": 2035,
          "rent": 1500,
          "otherExpenses": " 650 ",
          "expenseInflation": 2.5,
          "withdrawalRate": 3.5,
          "referenceYear": 2030
        }"#;
        let request = request_from_json(json, 2026).expect("json should parse");
        let profile = request.profile;

        assert_eq!(profile.current_age, 35);
        assert_eq!(profile.retirement_age, 60);
        assert_approx(profile.current_savings, 25_000.0);
        assert_approx(profile.monthly_investment, 500.0);
        assert_approx(profile.investment_return, 6.5);
        assert_approx(profile.windfall_amount, 2_500.5);
        assert_eq!(profile.windfall_end_year, 2035);
        assert_approx(profile.rent, 1_500.0);
        assert_approx(profile.other_expenses, 650.0);
        assert_approx(profile.expense_inflation, 2.5);
        assert_approx(request.options.withdrawal_rate, 0.035);
        assert_eq!(request.options.reference_year, 2030);
    }

    #[test]
    fn blank_or_invalid_fields_keep_previous_values() {
        let json = r#"{
          "currentAge": "",
          "retirementAge": "soon",
          "currentSavings": null,
          "monthlyInvestment": true,
          "rent": "1e999",
          "windfallEndYear": -3.7e12
        }"#;
        let request = request_from_json(json, 2026).expect("json should parse");
        assert_eq!(request.profile, Profile::default());
        assert_approx(request.options.withdrawal_rate, DEFAULT_WITHDRAWAL_RATE);
        assert_eq!(request.options.reference_year, 2026);
    }

    #[test]
    fn integer_fields_truncate_and_reject_negative_ages() {
        let json = r#"{ "currentAge": "50.9", "retirementAge": -70, "windfallEndYear": 2031.6 }"#;
        let request = request_from_json(json, 2026).expect("json should parse");
        assert_eq!(request.profile.current_age, 50);
        assert_eq!(request.profile.retirement_age, 67);
        assert_eq!(request.profile.windfall_end_year, 2031);
    }

    #[test]
    fn negative_windfall_is_passed_through_for_validation() {
        let request =
            request_from_json(r#"{ "windfallAmount": -10 }"#, 2026).expect("json should parse");
        let err = build_project_response(request).expect_err("must reject negative windfall");
        assert_eq!(err.rule(), "invalid-windfall");
    }

    #[test]
    fn finish_request_rejects_out_of_range_withdrawal_rate() {
        for rate in ["0", "-1", "100.5"] {
            let json = format!(r#"{{ "withdrawalRate": "{rate}" }}"#);
            let err = request_from_json(&json, 2026).expect_err("must reject withdrawal rate");
            assert!(err.contains("withdrawal rate"), "unexpected message: {err}");
        }
        assert!(request_from_json(r#"{ "withdrawalRate": 100 }"#, 2026).is_ok());
    }

    #[test]
    fn finish_request_bounds_reference_year() {
        for year in ["0", "10000", "2147483647", "-2147483648"] {
            let json = format!(r#"{{ "referenceYear": "{year}" }}"#);
            let err = request_from_json(&json, 2026).expect_err("must reject reference year");
            assert!(err.contains("reference year"), "unexpected message: {err}");
        }
        let err = request_from_json("{}", i32::MAX).expect_err("clock year is bounded too");
        assert!(err.contains("reference year"));

        let request = request_from_json(r#"{ "referenceYear": 9999 }"#, 2026).expect("valid");
        assert_eq!(request.options.reference_year, MAX_REFERENCE_YEAR);
    }

    #[test]
    fn retirement_age_beyond_lifespan_is_rejected_before_projection() {
        let request = request_from_json(r#"{ "currentAge": 0, "retirementAge": 4294967295 }"#, 2026)
            .expect("fields parse");
        assert_eq!(request.profile.retirement_age, u32::MAX);
        let err = build_project_response(request).expect_err("must reject");
        assert_eq!(err.rule(), "invalid-timeline");
    }

    #[test]
    fn project_response_serialization_contains_expected_fields() {
        let request = request_from_json(r#"{ "referenceYear": 2026 }"#, 2000).expect("valid");
        let response = build_project_response(request).expect("default profile is valid");

        assert_eq!(response.reference_year, 2026);
        assert_eq!(response.years.len(), 21);
        assert_eq!(response.chart.len(), 21);
        assert_approx(response.withdrawal_rate, 4.0);

        let json = serde_json::to_string(&response).expect("response should serialize");
        for key in [
            "\"referenceYear\"",
            "\"withdrawalRate\"",
            "\"profile\"",
            "\"currentAge\"",
            "\"years\"",
            "\"windfallReceived\"",
            "\"totalExpenses\"",
            "\"summary\"",
            "\"safeMonthlyWithdrawal\"",
            "\"display\"",
            "\"chart\"",
            "\"annualExpenses\"",
        ] {
            assert!(json.contains(key), "missing {key} in {json}");
        }
    }

    #[test]
    fn display_figures_use_compact_currency() {
        let request = request_from_json(
            r#"{
              "currentAge": 47, "retirementAge": 48, "currentSavings": 0,
              "monthlyInvestment": 250, "investmentReturn": 7, "windfallAmount": 0,
              "rent": 0, "otherExpenses": 0, "referenceYear": 2026
            }"#,
            2026,
        )
        .expect("valid");
        let response = build_project_response(request).expect("valid profile");
        let display = response.display.expect("summary present");
        assert_eq!(display.final_portfolio, "$6.2k");
        assert_eq!(display.safe_monthly_withdrawal, "$21");
        assert_eq!(display.final_monthly_expenses, "$0");
    }

    #[test]
    fn error_body_carries_rule_identifier() {
        let body = ErrorResponse {
            error: "bad".to_string(),
            rule: Some("invalid-timeline"),
        };
        let json = serde_json::to_string(&body).expect("serialize");
        assert_eq!(json, r#"{"error":"bad","rule":"invalid-timeline"}"#);

        let body = ErrorResponse {
            error: "Not found".to_string(),
            rule: None,
        };
        let json = serde_json::to_string(&body).expect("serialize");
        assert_eq!(json, r#"{"error":"Not found"}"#);
    }

    #[test]
    fn cli_flags_override_stored_profile() {
        let path = temp_profile_path(
            r#"{ "currentAge": 40, "retirementAge": 55, "rent": "900", "withdrawalRate": 3 }"#,
        );
        let cli = Cli::try_parse_from([
            "nestegg",
            "--profile",
            path.to_str().expect("utf-8 temp path"),
            "--retirement-age",
            "60",
        ])
        .expect("valid args");

        let mut draft = Draft::default();
        let stored = load_profile_file(cli.profile.as_deref().expect("profile flag"))
            .expect("stored profile loads");
        apply_payload(&mut draft, &stored);
        apply_payload(&mut draft, &ProjectPayload::from(&cli));
        let request = finish_request(draft, 2026).expect("valid request");
        let _ = fs::remove_file(&path);

        assert_eq!(request.profile.current_age, 40);
        assert_eq!(request.profile.retirement_age, 60);
        assert_approx(request.profile.rent, 900.0);
        assert_approx(request.options.withdrawal_rate, 0.03);
    }

    #[test]
    fn load_profile_file_reports_missing_and_malformed_files() {
        let missing = std::env::temp_dir().join("nestegg-profile-does-not-exist.json");
        let err = load_profile_file(&missing).expect_err("missing file must fail");
        assert!(matches!(err, LoadError::Io { .. }));

        let path = temp_profile_path("{ not json");
        let err = load_profile_file(&path).expect_err("malformed file must fail");
        let _ = fs::remove_file(&path);
        assert!(matches!(err, LoadError::Json { .. }));
        assert!(err.to_string().contains("invalid profile file"));
    }

    #[test]
    fn run_cli_exit_codes_follow_outcome() {
        assert_eq!(run_cli(["nestegg", "--reference-year", "2026"]), 0);
        assert_eq!(
            run_cli(["nestegg", "--current-age", "70", "--retirement-age", "65"]),
            EXIT_INVALID_PROFILE
        );
        assert_eq!(
            run_cli(["nestegg", "--profile", "/nonexistent/nestegg.json"]),
            EXIT_FAILURE
        );
        assert_eq!(
            run_cli(["nestegg", "--profile", "/nonexistent/nestegg.json", "--reset"]),
            0
        );
    }

    #[test]
    fn render_table_lists_every_year_and_summary() {
        let request = request_from_json(r#"{ "referenceYear": 2026 }"#, 2026).expect("valid");
        let response = build_project_response(request).expect("valid profile");
        let table = render_table(&response).expect("table renders");

        assert!(table.starts_with("Year"));
        assert!(table.contains("2026"));
        assert!(table.contains("2046"));
        assert!(table.contains("Safe monthly withdrawal at 4%"));
        assert_eq!(table.lines().filter(|l| l.ends_with("yes")).count(), 5);
    }

    #[tokio::test]
    async fn handler_maps_validation_failure_to_bad_request() {
        let payload = serde_json::from_str::<ProjectPayload>(
            r#"{ "currentAge": 67, "retirementAge": 67 }"#,
        )
        .expect("payload parses");
        let response = project_handler_impl(payload).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            response
                .headers()
                .get(header::CACHE_CONTROL)
                .map(|v| v.as_bytes()),
            Some(&b"no-store"[..])
        );

        let response = project_handler_impl(ProjectPayload::default()).await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn get_handler_reads_numeric_strings_from_query() {
        let uri: Uri = "/api/project?currentAge=50&retirementAge=60&currentSavings=1000.5\
                        &investmentReturn=6.5&rent=&windfallEndYear=2031.9&referenceYear=2027"
            .parse()
            .expect("valid uri");
        let Query(payload) = Query::<ProjectPayload>::try_from_uri(&uri).expect("query parses");

        let mut draft = Draft::default();
        apply_payload(&mut draft, &payload);
        let request = finish_request(draft, 2026).expect("valid request");
        assert_eq!(request.profile.current_age, 50);
        assert_eq!(request.profile.retirement_age, 60);
        assert_approx(request.profile.current_savings, 1_000.5);
        assert_approx(request.profile.investment_return, 6.5);
        assert_approx(request.profile.rent, 1_200.0);
        assert_eq!(request.profile.windfall_end_year, 2031);
        assert_eq!(request.options.reference_year, 2027);

        let response = project_get_handler(Query(payload)).await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn get_handler_rejects_unbounded_inputs() {
        for query in [
            "/api/project?referenceYear=2147483647",
            "/api/project?currentAge=0&retirementAge=4294967295",
        ] {
            let uri: Uri = query.parse().expect("valid uri");
            let Query(payload) =
                Query::<ProjectPayload>::try_from_uri(&uri).expect("query parses");
            let response = project_get_handler(Query(payload)).await;
            assert_eq!(response.status(), StatusCode::BAD_REQUEST, "query {query}");
        }
    }
}
