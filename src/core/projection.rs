use super::engine::round2;
use super::types::{
    AnnualExpenses, CalculationResult, CashflowYear, ExpenseShare, ProjectionAssumptions,
};

/// Compounds effective rent and total expenses forward. Year 1 is already one
/// period of growth past the computed figures.
pub fn project_cashflow(
    result: &CalculationResult,
    assumptions: &ProjectionAssumptions,
) -> Vec<CashflowYear> {
    let rent_factor = 1.0 + assumptions.rent_growth_pct / 100.0;
    let expense_factor = 1.0 + assumptions.expense_inflation_pct / 100.0;

    (1..=assumptions.years)
        .map(|year| {
            let exponent = year as i32;
            let rent = result.effective_annual_rent * rent_factor.powi(exponent);
            let expenses = result.annual_expenses.total * expense_factor.powi(exponent);
            CashflowYear {
                year,
                rent: round2(rent),
                expenses: round2(expenses),
                cash_flow: round2(rent - expenses),
            }
        })
        .collect()
}

pub fn expense_shares(expenses: &AnnualExpenses) -> Vec<ExpenseShare> {
    if expenses.total <= 0.0 {
        return Vec::new();
    }

    [
        ("Maintenance", expenses.maintenance),
        ("Management Fees", expenses.management_fees),
        ("Insurance", expenses.insurance),
        ("Council Rates", expenses.council_rates),
        ("Mortgage", expenses.mortgage_payment),
    ]
    .into_iter()
    .map(|(label, amount)| ExpenseShare {
        label,
        amount,
        share_pct: round2(amount / expenses.total * 100.0),
    })
    .collect()
}
