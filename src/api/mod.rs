use std::io::Write;
use std::net::{IpAddr, SocketAddr};

use axum::{
    Router,
    extract::{Json, Query},
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use clap::{Args, Parser, Subcommand};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;

use crate::core::{
    ChartSeries, Figure, InputField, Normalized, ProjectionInput, ProjectionResult,
    RawProjectionInput, RawScalar, SeriesSelection, chart_series, project,
};
use crate::error::{Error, Result};

#[derive(Parser, Debug)]
#[command(
    name = "inflation-explorer",
    about = "Inflation, investment growth and monthly contribution projections"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Serve the JSON projection API
    Serve(ServeArgs),
    /// Print one projection to stdout
    Project(ProjectArgs),
}

#[derive(Args, Debug, Clone)]
pub struct ServeArgs {
    #[arg(long, env = "INFLATION_EXPLORER_HOST", default_value = "0.0.0.0")]
    pub host: IpAddr,
    #[arg(long, env = "INFLATION_EXPLORER_PORT", default_value_t = 8080)]
    pub port: u16,
}

impl ServeArgs {
    pub fn addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

/// Values are taken verbatim and normalized like API input, so a malformed
/// flag falls back to its default instead of failing argument parsing.
#[derive(Args, Debug, Clone, Default)]
pub struct ProjectArgs {
    #[arg(
        long,
        allow_hyphen_values = true,
        help = "Starting amount (default 1000)"
    )]
    pub principal: Option<String>,
    #[arg(
        long,
        allow_hyphen_values = true,
        help = "Horizon in whole years, clamped to 1..=50 (default 10)"
    )]
    pub years: Option<String>,
    #[arg(
        long,
        allow_hyphen_values = true,
        help = "Annual inflation in percent, e.g. 2.5"
    )]
    pub inflation_rate: Option<String>,
    #[arg(
        long,
        allow_hyphen_values = true,
        help = "Annual investment return in percent, e.g. 7.5"
    )]
    pub return_rate: Option<String>,
    #[arg(
        long,
        allow_hyphen_values = true,
        help = "Amount added at the end of every month (default 0)"
    )]
    pub monthly_contribution: Option<String>,
    #[arg(
        long,
        help = "Comma separated series to show: initial, inflation, investment, contribution"
    )]
    pub series: Option<String>,
    #[arg(long, help = "Print the API JSON body instead of a table")]
    pub json: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct ProjectPayload {
    #[serde(alias = "initialAmount")]
    principal: Option<RawScalar>,
    #[serde(alias = "horizonYears")]
    years: Option<RawScalar>,
    inflation_rate: Option<RawScalar>,
    #[serde(alias = "investmentReturn")]
    return_rate: Option<RawScalar>,
    monthly_contribution: Option<RawScalar>,
    series: Option<String>,
}

impl From<ProjectArgs> for ProjectPayload {
    fn from(args: ProjectArgs) -> Self {
        Self {
            principal: args.principal.map(RawScalar::from),
            years: args.years.map(RawScalar::from),
            inflation_rate: args.inflation_rate.map(RawScalar::from),
            return_rate: args.return_rate.map(RawScalar::from),
            monthly_contribution: args.monthly_contribution.map(RawScalar::from),
            series: args.series,
        }
    }
}

#[derive(Debug)]
struct ProjectRequest {
    raw: RawProjectionInput,
    selection: SeriesSelection,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ProjectResponse {
    input: ProjectionInput,
    defaulted_fields: Vec<InputField>,
    #[serde(flatten)]
    projection: ProjectionResult,
    chart: Vec<ChartSeries>,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

pub fn router() -> Router {
    Router::new()
        .route(
            "/api/project",
            get(project_get_handler).post(project_post_handler),
        )
        .fallback(not_found_handler)
}

pub async fn run_http_server(addr: SocketAddr) -> Result<()> {
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|source| Error::Bind { addr, source })?;
    log::info!("Inflation explorer API listening on http://{addr}");
    log::info!(
        "Local access: http://127.0.0.1:{}/api/project",
        addr.port()
    );

    axum::serve(listener, router()).await.map_err(Error::Serve)
}

pub fn run_project_command(args: ProjectArgs) -> Result<()> {
    let as_json = args.json;
    let request = project_request_from_payload(args.into())?;
    let response = build_project_response(&request);

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    if as_json {
        serde_json::to_writer_pretty(&mut out, &response)?;
        writeln!(out)?;
    } else {
        write_report(&mut out, &response)?;
    }
    out.flush()?;
    Ok(())
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

async fn project_get_handler(Query(payload): Query<ProjectPayload>) -> Response {
    project_handler_impl(payload)
}

async fn project_post_handler(Json(payload): Json<ProjectPayload>) -> Response {
    project_handler_impl(payload)
}

fn project_handler_impl(payload: ProjectPayload) -> Response {
    match project_request_from_payload(payload) {
        Ok(request) => json_response(StatusCode::OK, build_project_response(&request)),
        Err(err) => error_response(status_for_error(&err), &err.to_string()),
    }
}

fn status_for_error(err: &Error) -> StatusCode {
    match err {
        Error::UnknownSeries(_) => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    let mut response = (status, Json(body)).into_response();
    response
        .headers_mut()
        .insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
    response
}

fn error_response(status: StatusCode, msg: &str) -> Response {
    json_response(
        status,
        ErrorResponse {
            error: msg.to_string(),
        },
    )
}

#[cfg(test)]
fn project_request_from_json(json: &str) -> std::result::Result<ProjectRequest, String> {
    let payload = serde_json::from_str::<ProjectPayload>(json)
        .map_err(|e| format!("Invalid API JSON payload: {e}"))?;
    project_request_from_payload(payload).map_err(|e| e.to_string())
}

fn project_request_from_payload(payload: ProjectPayload) -> Result<ProjectRequest> {
    let selection = match payload.series.as_deref() {
        Some(list) => SeriesSelection::parse(list)?,
        None => SeriesSelection::default(),
    };

    Ok(ProjectRequest {
        raw: RawProjectionInput {
            principal: payload.principal,
            years: payload.years,
            inflation_rate: payload.inflation_rate,
            return_rate: payload.return_rate,
            monthly_contribution: payload.monthly_contribution,
        },
        selection,
    })
}

fn build_project_response(request: &ProjectRequest) -> ProjectResponse {
    let Normalized { input, defaulted } = ProjectionInput::normalize(&request.raw);
    if !defaulted.is_empty() {
        let fields: Vec<&str> = defaulted.iter().map(|field| field.name()).collect();
        log::warn!("Using defaults for missing or malformed fields: {}", fields.join(", "));
    }

    let projection = project(&input);
    log::debug!(
        "Projected {} years: principal={} inflation={}% return={}% monthly={}",
        input.horizon_years(),
        input.principal(),
        input.inflation_rate_percent(),
        input.return_rate_percent(),
        input.monthly_contribution()
    );

    let chart = chart_series(&projection, &request.selection);
    ProjectResponse {
        input,
        defaulted_fields: defaulted,
        projection,
        chart,
    }
}

fn write_report<W: Write>(out: &mut W, response: &ProjectResponse) -> std::io::Result<()> {
    let input = &response.input;
    writeln!(
        out,
        "Principal {:.2} over {} years, inflation {}%, return {}%, monthly contribution {:.2}",
        input.principal(),
        input.horizon_years(),
        input.inflation_rate_percent(),
        input.return_rate_percent(),
        input.monthly_contribution()
    )?;
    if !response.defaulted_fields.is_empty() {
        let fields: Vec<&str> = response
            .defaulted_fields
            .iter()
            .map(|field| field.name())
            .collect();
        writeln!(out, "Defaults used for: {}", fields.join(", "))?;
    }
    writeln!(out)?;

    write!(out, "{:>5}", "Year")?;
    for series in &response.chart {
        write!(out, " {:>40}", series.label)?;
    }
    writeln!(out)?;
    for (row, year) in response.projection.time_points.iter().enumerate() {
        write!(out, "{year:>5}")?;
        for series in &response.chart {
            write!(out, " {:>40.2}", series.values[row])?;
        }
        writeln!(out)?;
    }
    writeln!(out)?;

    let summary = &response.projection.summary;
    writeln!(out, "Summary")?;
    writeln!(out, "  Initial amount:        {:>16.2}", summary.initial_amount)?;
    writeln!(out, "  Total contributed:     {:>16.2}", summary.total_contributed)?;
    writeln!(out, "  Investment growth:     {:>16.2}", summary.investment_growth)?;
    writeln!(out, "  Final amount:          {:>16.2}", summary.final_amount)?;
    writeln!(
        out,
        "  Vs. uninvested:        {:>16.2}",
        summary.comparison_vs_uninvested
    )?;
    writeln!(out, "  Return on investment:  {:>15.1}%", summary.roi_percent)?;

    let break_even = response.projection.break_even;
    match break_even.year {
        Some(year) => writeln!(out, "  Break-even year:       {year:>16}")?,
        None => writeln!(
            out,
            "  Break-even year:       none within horizon (chart marker at year {})",
            break_even.marker_year
        )?,
    }
    writeln!(out)?;

    let insights = &response.projection.insights;
    writeln!(out, "Insights")?;
    writeln!(
        out,
        "  Purchasing power lost: {:>15.1}%",
        insights.purchasing_power_loss_percent
    )?;
    write_multiple(out, "Growth multiple:", insights.growth_multiple)?;
    write_multiple(out, "Vs. uninvested:", insights.vs_uninvested_multiple)?;
    write_multiple(out, "With contributions:", insights.contribution_growth_multiple)?;
    Ok(())
}

fn write_multiple<W: Write>(out: &mut W, label: &str, value: Figure) -> std::io::Result<()> {
    writeln!(out, "  {label:<22}{value:>15.1}x")
}
