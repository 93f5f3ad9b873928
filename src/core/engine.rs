use super::types::{
    BreakEven, ChartSeries, Figure, Insights, ProjectionInput, ProjectionResult, SeriesSelection,
    Summary,
};

const MONTHS_PER_YEAR: u32 = 12;
const BREAK_EVEN_FALLBACK_YEAR: u32 = 1;

/// Projects `input` over every year of its horizon.
///
/// Raw series are computed in `f64` and only converted to [`Figure`] at the end,
/// so comparisons (break-even) and final-year metrics see the unrounded values.
pub fn project(input: &ProjectionInput) -> ProjectionResult {
    let principal = input.principal();
    let horizon = input.horizon_years();
    let time_points: Vec<u32> = (0..=horizon).collect();

    let inflation_factor = 1.0 + input.inflation_rate_percent() / 100.0;
    let return_factor = 1.0 + input.return_rate_percent() / 100.0;

    let purchasing_power: Vec<f64> = time_points
        .iter()
        .map(|&year| purchasing_power_at(principal, inflation_factor, year))
        .collect();
    let compounded: Vec<f64> = time_points
        .iter()
        .map(|&year| principal * return_factor.powi(year as i32))
        .collect();
    let with_contribution: Vec<f64> = time_points
        .iter()
        .zip(&compounded)
        .map(|(&year, &base)| {
            if input.monthly_contribution() <= 0.0 || year == 0 {
                base
            } else {
                base + contribution_future_value(
                    input.monthly_contribution(),
                    input.return_rate_percent(),
                    year,
                )
            }
        })
        .collect();

    let final_index = horizon as usize;
    let final_purchasing_power = purchasing_power[final_index];
    let final_compounded = compounded[final_index];
    let final_with_contribution = with_contribution[final_index];

    ProjectionResult {
        flat_principal: vec![principal; time_points.len()],
        summary: summarize(input, final_with_contribution, final_purchasing_power),
        break_even: find_break_even(principal, &compounded),
        insights: Insights {
            purchasing_power_loss_percent: Figure::from_f64(
                (principal - final_purchasing_power) / principal * 100.0,
            ),
            growth_multiple: Figure::from_f64(final_compounded / principal),
            vs_uninvested_multiple: Figure::from_f64(final_compounded / final_purchasing_power),
            contribution_growth_multiple: Figure::from_f64(final_with_contribution / principal),
        },
        purchasing_power: to_figures(&purchasing_power),
        compounded_no_contribution: to_figures(&compounded),
        compounded_with_contribution: to_figures(&with_contribution),
        time_points,
    }
}

/// The selected series as chart datasets, each aligned with `result.time_points`.
pub fn chart_series(result: &ProjectionResult, selection: &SeriesSelection) -> Vec<ChartSeries> {
    selection
        .kinds()
        .iter()
        .map(|&kind| ChartSeries {
            kind,
            label: kind.label(),
            values: result.series(kind),
        })
        .collect()
}

fn purchasing_power_at(principal: f64, inflation_factor: f64, year: u32) -> f64 {
    if year == 0 {
        return principal;
    }

    // -100% inflation: every later year divides by zero
    if inflation_factor == 0.0 {
        return if principal == 0.0 { 0.0 } else { f64::INFINITY };
    }

    principal / inflation_factor.powi(year as i32)
}

/// Future value of an ordinary annuity: `contribution` paid at the end of every
/// month for `year * 12` months, compounding monthly at `return_rate_percent / 12`.
fn contribution_future_value(contribution: f64, return_rate_percent: f64, year: u32) -> f64 {
    let months = year * MONTHS_PER_YEAR;
    let monthly_rate = return_rate_percent / 100.0 / MONTHS_PER_YEAR as f64;
    if monthly_rate == 0.0 {
        return contribution * months as f64;
    }

    // (1 + r)^n - 1 via exp_m1/ln_1p keeps its precision for rates near zero
    let growth = if monthly_rate > -1.0 {
        (months as f64 * monthly_rate.ln_1p()).exp_m1()
    } else {
        (1.0 + monthly_rate).powi(months as i32) - 1.0
    };
    contribution * growth / monthly_rate
}

fn find_break_even(principal: f64, compounded: &[f64]) -> BreakEven {
    let year = compounded
        .windows(2)
        .position(|pair| pair[0] <= principal && pair[1] > principal)
        .map(|index| index as u32 + 1);

    BreakEven {
        year,
        marker_year: year.unwrap_or(BREAK_EVEN_FALLBACK_YEAR),
    }
}

fn summarize(
    input: &ProjectionInput,
    final_with_contribution: f64,
    final_purchasing_power: f64,
) -> Summary {
    let principal = input.principal();
    let total_contributed =
        input.monthly_contribution() * MONTHS_PER_YEAR as f64 * input.horizon_years() as f64;
    let invested = principal + total_contributed;
    let investment_growth = final_with_contribution - invested;

    Summary {
        initial_amount: principal,
        total_contributed: Figure::from_f64(total_contributed),
        investment_growth: Figure::from_f64(investment_growth),
        final_amount: Figure::from_f64(final_with_contribution),
        comparison_vs_uninvested: Figure::from_f64(
            final_with_contribution - final_purchasing_power,
        ),
        roi_percent: Figure::from_f64(investment_growth / invested * 100.0),
    }
}

fn to_figures(values: &[f64]) -> Vec<Figure> {
    values.iter().copied().map(Figure::from_f64).collect()
}
