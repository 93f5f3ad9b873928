use std::fmt;

use serde::de::IgnoredAny;
use serde::{Deserialize, Serialize, Serializer};

use crate::error::Error;

pub const DEFAULT_PRINCIPAL: f64 = 1000.0;
pub const DEFAULT_HORIZON_YEARS: u32 = 10;
pub const DEFAULT_INFLATION_RATE_PERCENT: f64 = 2.5;
pub const DEFAULT_RETURN_RATE_PERCENT: f64 = 7.5;
pub const DEFAULT_MONTHLY_CONTRIBUTION: f64 = 0.0;

pub const MIN_HORIZON_YEARS: u32 = 1;
pub const MAX_HORIZON_YEARS: u32 = 50;

/// A single user-supplied value before normalization.
///
/// Form fields arrive as numbers, as text that may or may not parse, or as
/// something else entirely (booleans, arrays). Only finite numbers survive
/// [`RawScalar::as_number`].
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum RawScalar {
    Number(f64),
    Text(String),
    Other(IgnoredAny),
}

impl RawScalar {
    pub fn as_number(&self) -> Option<f64> {
        let value = match self {
            RawScalar::Number(v) => *v,
            RawScalar::Text(text) => text.trim().parse::<f64>().ok()?,
            RawScalar::Other(_) => return None,
        };
        value.is_finite().then_some(value)
    }
}

impl From<f64> for RawScalar {
    fn from(value: f64) -> Self {
        RawScalar::Number(value)
    }
}

impl From<&str> for RawScalar {
    fn from(value: &str) -> Self {
        RawScalar::Text(value.to_string())
    }
}

impl From<String> for RawScalar {
    fn from(value: String) -> Self {
        RawScalar::Text(value)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawProjectionInput {
    pub principal: Option<RawScalar>,
    pub years: Option<RawScalar>,
    pub inflation_rate: Option<RawScalar>,
    pub return_rate: Option<RawScalar>,
    pub monthly_contribution: Option<RawScalar>,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum InputField {
    Principal,
    Years,
    InflationRate,
    ReturnRate,
    MonthlyContribution,
}

impl InputField {
    pub fn name(self) -> &'static str {
        match self {
            InputField::Principal => "principal",
            InputField::Years => "years",
            InputField::InflationRate => "inflationRate",
            InputField::ReturnRate => "returnRate",
            InputField::MonthlyContribution => "monthlyContribution",
        }
    }
}

impl fmt::Display for InputField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Normalized projection parameters. Construct through [`ProjectionInput::normalize`]
/// or [`ProjectionInput::from_values`]; both apply the same defaulting and clamping,
/// so every value reachable here is finite and in range.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectionInput {
    principal: f64,
    horizon_years: u32,
    inflation_rate_percent: f64,
    return_rate_percent: f64,
    monthly_contribution: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Normalized {
    pub input: ProjectionInput,
    pub defaulted: Vec<InputField>,
}

impl ProjectionInput {
    pub fn normalize(raw: &RawProjectionInput) -> Normalized {
        let mut defaulted = Vec::new();
        let mut resolve = |field: InputField, value: &Option<RawScalar>, default: f64| {
            match value.as_ref().and_then(RawScalar::as_number) {
                Some(v) => v,
                None => {
                    defaulted.push(field);
                    default
                }
            }
        };

        let principal = resolve(InputField::Principal, &raw.principal, DEFAULT_PRINCIPAL);
        let years = resolve(
            InputField::Years,
            &raw.years,
            DEFAULT_HORIZON_YEARS as f64,
        );
        let inflation = resolve(
            InputField::InflationRate,
            &raw.inflation_rate,
            DEFAULT_INFLATION_RATE_PERCENT,
        );
        let return_rate = resolve(
            InputField::ReturnRate,
            &raw.return_rate,
            DEFAULT_RETURN_RATE_PERCENT,
        );
        let contribution = resolve(
            InputField::MonthlyContribution,
            &raw.monthly_contribution,
            DEFAULT_MONTHLY_CONTRIBUTION,
        );

        Normalized {
            input: Self::from_values(principal, years, inflation, return_rate, contribution),
            defaulted,
        }
    }

    pub fn from_values(
        principal: f64,
        horizon_years: f64,
        inflation_rate_percent: f64,
        return_rate_percent: f64,
        monthly_contribution: f64,
    ) -> Self {
        let horizon_years = finite_or(horizon_years, DEFAULT_HORIZON_YEARS as f64)
            .floor()
            .clamp(MIN_HORIZON_YEARS as f64, MAX_HORIZON_YEARS as f64)
            as u32;

        Self {
            principal: finite_or(principal, DEFAULT_PRINCIPAL).max(0.0),
            horizon_years,
            inflation_rate_percent: finite_or(
                inflation_rate_percent,
                DEFAULT_INFLATION_RATE_PERCENT,
            ),
            return_rate_percent: finite_or(return_rate_percent, DEFAULT_RETURN_RATE_PERCENT),
            monthly_contribution: finite_or(monthly_contribution, DEFAULT_MONTHLY_CONTRIBUTION)
                .max(0.0),
        }
    }

    pub fn principal(&self) -> f64 {
        self.principal
    }

    pub fn horizon_years(&self) -> u32 {
        self.horizon_years
    }

    pub fn inflation_rate_percent(&self) -> f64 {
        self.inflation_rate_percent
    }

    pub fn return_rate_percent(&self) -> f64 {
        self.return_rate_percent
    }

    pub fn monthly_contribution(&self) -> f64 {
        self.monthly_contribution
    }
}

impl Default for ProjectionInput {
    fn default() -> Self {
        Self::from_values(
            DEFAULT_PRINCIPAL,
            DEFAULT_HORIZON_YEARS as f64,
            DEFAULT_INFLATION_RATE_PERCENT,
            DEFAULT_RETURN_RATE_PERCENT,
            DEFAULT_MONTHLY_CONTRIBUTION,
        )
    }
}

fn finite_or(value: f64, default: f64) -> f64 {
    if value.is_finite() { value } else { default }
}

/// A projected value. Anything that leaves the finite `f64` range is carried as an
/// explicit marker instead of an infinity or NaN.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Figure {
    Finite(f64),
    Unbounded,
    NegativeUnbounded,
    Indeterminate,
}

impl Figure {
    pub fn from_f64(value: f64) -> Self {
        if value.is_finite() {
            Figure::Finite(value)
        } else if value.is_nan() {
            Figure::Indeterminate
        } else if value > 0.0 {
            Figure::Unbounded
        } else {
            Figure::NegativeUnbounded
        }
    }

    pub fn finite(self) -> Option<f64> {
        match self {
            Figure::Finite(v) => Some(v),
            _ => None,
        }
    }

    pub fn is_finite(self) -> bool {
        matches!(self, Figure::Finite(_))
    }

    fn marker(self) -> &'static str {
        match self {
            Figure::Finite(_) => "finite",
            Figure::Unbounded => "unbounded",
            Figure::NegativeUnbounded => "-unbounded",
            Figure::Indeterminate => "indeterminate",
        }
    }
}

impl From<f64> for Figure {
    fn from(value: f64) -> Self {
        Figure::from_f64(value)
    }
}

impl Serialize for Figure {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match *self {
            Figure::Finite(v) => serializer.serialize_f64(v),
            other => serializer.serialize_str(other.marker()),
        }
    }
}

impl fmt::Display for Figure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Figure::Finite(v) => fmt::Display::fmt(&v, f),
            // precision applies to the number only; markers keep their full text
            other => match f.width() {
                Some(width) => write!(f, "{:>width$}", other.marker()),
                None => f.write_str(other.marker()),
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub initial_amount: f64,
    pub total_contributed: Figure,
    pub investment_growth: Figure,
    pub final_amount: Figure,
    pub comparison_vs_uninvested: Figure,
    pub roi_percent: Figure,
}

/// `year` is the first year the principal-only investment climbs above the
/// principal, if that happens within the horizon. `marker_year` is where a chart
/// places its break-even annotation and falls back to year 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BreakEven {
    pub year: Option<u32>,
    pub marker_year: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Insights {
    pub purchasing_power_loss_percent: Figure,
    pub growth_multiple: Figure,
    pub vs_uninvested_multiple: Figure,
    pub contribution_growth_multiple: Figure,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectionResult {
    pub time_points: Vec<u32>,
    pub flat_principal: Vec<f64>,
    pub purchasing_power: Vec<Figure>,
    pub compounded_no_contribution: Vec<Figure>,
    pub compounded_with_contribution: Vec<Figure>,
    pub summary: Summary,
    pub break_even: BreakEven,
    pub insights: Insights,
}

impl ProjectionResult {
    pub fn series(&self, kind: SeriesKind) -> Vec<Figure> {
        match kind {
            SeriesKind::InitialAmount => self
                .flat_principal
                .iter()
                .copied()
                .map(Figure::from_f64)
                .collect(),
            SeriesKind::PurchasingPower => self.purchasing_power.clone(),
            SeriesKind::InvestmentOnly => self.compounded_no_contribution.clone(),
            SeriesKind::InvestmentWithContributions => self.compounded_with_contribution.clone(),
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SeriesKind {
    InitialAmount,
    PurchasingPower,
    InvestmentOnly,
    InvestmentWithContributions,
}

impl SeriesKind {
    pub const ALL: [SeriesKind; 4] = [
        SeriesKind::InitialAmount,
        SeriesKind::PurchasingPower,
        SeriesKind::InvestmentOnly,
        SeriesKind::InvestmentWithContributions,
    ];

    pub fn label(self) -> &'static str {
        match self {
            SeriesKind::InitialAmount => "Initial Amount",
            SeriesKind::PurchasingPower => "Purchasing Power (Inflation Adjusted)",
            SeriesKind::InvestmentOnly => "Investment (Initial Amount Only)",
            SeriesKind::InvestmentWithContributions => "Investment with Monthly Contributions",
        }
    }

    pub fn key(self) -> &'static str {
        match self {
            SeriesKind::InitialAmount => "initial",
            SeriesKind::PurchasingPower => "inflation",
            SeriesKind::InvestmentOnly => "investment",
            SeriesKind::InvestmentWithContributions => "contribution",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.key().eq_ignore_ascii_case(key))
    }
}

/// Which series a chart draws. Series always come out in [`SeriesKind::ALL`] order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeriesSelection {
    kinds: Vec<SeriesKind>,
}

impl SeriesSelection {
    pub fn only(kinds: &[SeriesKind]) -> Self {
        Self {
            kinds: SeriesKind::ALL
                .into_iter()
                .filter(|kind| kinds.contains(kind))
                .collect(),
        }
    }

    /// Parses a comma separated list of series keys, e.g. `"initial,investment"`.
    /// An empty list selects nothing.
    pub fn parse(list: &str) -> Result<Self, Error> {
        let mut kinds = Vec::new();
        for key in list.split(',').map(str::trim).filter(|key| !key.is_empty()) {
            let kind =
                SeriesKind::from_key(key).ok_or_else(|| Error::UnknownSeries(key.to_string()))?;
            kinds.push(kind);
        }
        Ok(Self::only(&kinds))
    }

    pub fn kinds(&self) -> &[SeriesKind] {
        &self.kinds
    }

    pub fn contains(&self, kind: SeriesKind) -> bool {
        self.kinds.contains(&kind)
    }
}

impl Default for SeriesSelection {
    fn default() -> Self {
        Self::only(&SeriesKind::ALL)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartSeries {
    pub kind: SeriesKind,
    pub label: &'static str,
    pub values: Vec<Figure>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(
        principal: &str,
        years: &str,
        inflation: &str,
        return_rate: &str,
        contribution: &str,
    ) -> RawProjectionInput {
        RawProjectionInput {
            principal: Some(principal.into()),
            years: Some(years.into()),
            inflation_rate: Some(inflation.into()),
            return_rate: Some(return_rate.into()),
            monthly_contribution: Some(contribution.into()),
        }
    }

    #[test]
    fn raw_scalar_parses_trimmed_text_and_rejects_non_finite() {
        assert_eq!(RawScalar::from(" 12.5 ").as_number(), Some(12.5));
        assert_eq!(RawScalar::from("1e3").as_number(), Some(1000.0));
        assert_eq!(RawScalar::from("").as_number(), None);
        assert_eq!(RawScalar::from("abc").as_number(), None);
        assert_eq!(RawScalar::from("inf").as_number(), None);
        assert_eq!(RawScalar::from("NaN").as_number(), None);
        assert_eq!(RawScalar::from(f64::NAN).as_number(), None);
        assert_eq!(RawScalar::Other(IgnoredAny).as_number(), None);
    }

    #[test]
    fn normalize_missing_fields_fall_back_to_defaults() {
        let normalized = ProjectionInput::normalize(&RawProjectionInput::default());
        assert_eq!(normalized.input, ProjectionInput::default());
        assert_eq!(
            normalized.defaulted,
            vec![
                InputField::Principal,
                InputField::Years,
                InputField::InflationRate,
                InputField::ReturnRate,
                InputField::MonthlyContribution,
            ]
        );

        let input = normalized.input;
        assert_eq!(input.principal(), 1000.0);
        assert_eq!(input.horizon_years(), 10);
        assert_eq!(input.inflation_rate_percent(), 2.5);
        assert_eq!(input.return_rate_percent(), 7.5);
        assert_eq!(input.monthly_contribution(), 0.0);
    }

    #[test]
    fn normalize_non_numeric_principal_uses_default_and_reports_it() {
        let normalized = ProjectionInput::normalize(&raw("lots", "20", "3", "6", "50"));
        assert_eq!(normalized.input.principal(), 1000.0);
        assert_eq!(normalized.input.horizon_years(), 20);
        assert_eq!(normalized.input.monthly_contribution(), 50.0);
        assert_eq!(normalized.defaulted, vec![InputField::Principal]);
    }

    #[test]
    fn normalize_keeps_explicit_zero_values() {
        let normalized = ProjectionInput::normalize(&raw("0", "5", "0", "0", "0"));
        assert!(normalized.defaulted.is_empty());
        assert_eq!(normalized.input.principal(), 0.0);
        assert_eq!(normalized.input.inflation_rate_percent(), 0.0);
        assert_eq!(normalized.input.return_rate_percent(), 0.0);
    }

    #[test]
    fn horizon_is_floored_and_clamped() {
        let years = |value: f64| ProjectionInput::from_values(1000.0, value, 2.5, 7.5, 0.0);
        assert_eq!(years(0.0).horizon_years(), 1);
        assert_eq!(years(-4.0).horizon_years(), 1);
        assert_eq!(years(7.9).horizon_years(), 7);
        assert_eq!(years(50.0).horizon_years(), 50);
        assert_eq!(years(51.0).horizon_years(), 50);
        assert_eq!(years(1e12).horizon_years(), 50);
        assert_eq!(years(f64::NAN).horizon_years(), 10);
    }

    #[test]
    fn negative_amounts_are_clamped_but_rates_below_total_loss_are_kept() {
        let input = ProjectionInput::from_values(-500.0, 10.0, -250.0, -120.0, -10.0);
        assert_eq!(input.principal(), 0.0);
        assert_eq!(input.monthly_contribution(), 0.0);
        assert_eq!(input.inflation_rate_percent(), -250.0);
        assert_eq!(input.return_rate_percent(), -120.0);
    }

    #[test]
    fn figure_maps_non_finite_values_to_markers() {
        assert_eq!(Figure::from_f64(12.0), Figure::Finite(12.0));
        assert_eq!(Figure::from_f64(f64::INFINITY), Figure::Unbounded);
        assert_eq!(Figure::from_f64(f64::NEG_INFINITY), Figure::NegativeUnbounded);
        assert_eq!(Figure::from_f64(f64::NAN), Figure::Indeterminate);
        assert_eq!(Figure::Unbounded.finite(), None);
    }

    #[test]
    fn figure_serializes_numbers_and_markers() {
        let json = serde_json::to_string(&vec![
            Figure::Finite(1.5),
            Figure::Unbounded,
            Figure::NegativeUnbounded,
            Figure::Indeterminate,
        ])
        .expect("figures should serialize");
        assert_eq!(json, r#"[1.5,"unbounded","-unbounded","indeterminate"]"#);
    }

    #[test]
    fn figure_display_honours_precision_and_width() {
        assert_eq!(format!("{:.2}", Figure::Finite(781.19840)), "781.20");
        assert_eq!(format!("{:>10.1}", Figure::Finite(3.14159)), "       3.1");
        assert_eq!(format!("{:>10}", Figure::Unbounded), " unbounded");
    }

    #[test]
    fn series_selection_parses_keys_in_canonical_order() {
        let selection =
            SeriesSelection::parse("contribution, INITIAL,investment,initial").expect("valid keys");
        assert_eq!(
            selection.kinds(),
            &[
                SeriesKind::InitialAmount,
                SeriesKind::InvestmentOnly,
                SeriesKind::InvestmentWithContributions,
            ]
        );
        assert!(!selection.contains(SeriesKind::PurchasingPower));
    }

    #[test]
    fn series_selection_empty_list_selects_nothing() {
        let selection = SeriesSelection::parse(" , ").expect("empty list is valid");
        assert!(selection.kinds().is_empty());
        assert_eq!(SeriesSelection::default().kinds(), &SeriesKind::ALL);
    }

    #[test]
    fn series_selection_rejects_unknown_key() {
        let err = SeriesSelection::parse("initial,bonds").expect_err("must reject unknown key");
        assert!(matches!(err, Error::UnknownSeries(ref key) if key == "bonds"));
    }
}
