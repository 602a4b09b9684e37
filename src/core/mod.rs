mod engine;
mod export;
mod projection;
mod types;

pub use engine::{amortized_payment, compute};
pub use export::{CASHFLOW_CSV_FILENAME, cashflow_csv};
pub use projection::{expense_shares, project_cashflow};
pub(crate) use types::check_percentage;
pub use types::{
    AnnualExpenses, CalculationInputs, CalculationResult, CashflowYear, ExpenseShare,
    MortgageFieldNames, MortgageSummary, MortgageTerms, ProjectionAssumptions,
    ProjectionFieldNames, RunningCosts, UpfrontCostSummary, UpfrontCosts,
};
