mod engine;
mod types;

pub use engine::{chart_series, project};
pub use types::{
    BreakEven, ChartSeries, Figure, InputField, Insights, Normalized, ProjectionInput,
    ProjectionResult, RawProjectionInput, RawScalar, SeriesKind, SeriesSelection, Summary,
    DEFAULT_HORIZON_YEARS, DEFAULT_INFLATION_RATE_PERCENT, DEFAULT_MONTHLY_CONTRIBUTION,
    DEFAULT_PRINCIPAL, DEFAULT_RETURN_RATE_PERCENT, MAX_HORIZON_YEARS, MIN_HORIZON_YEARS,
};
