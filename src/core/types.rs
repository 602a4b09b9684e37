use serde::Serialize;

use crate::error::InputError;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UpfrontCosts {
    pub stamp_duty: f64,
    pub legal_fees: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunningCosts {
    pub maintenance: f64,
    pub management_fees: f64,
    pub insurance: f64,
    pub council_rates: f64,
}

/// Names a caller uses for the mortgage inputs, so a rejection can point at
/// the flag or JSON key that was actually sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MortgageFieldNames {
    pub interest_rate: &'static str,
    pub term_years: &'static str,
    pub loan_to_value: &'static str,
}

/// Financing block. Rate and LTV are percentages in `[0, 100]`, the term is
/// `1..=MAX_TERM_YEARS`; only `new` can build one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MortgageTerms {
    interest_rate_pct: f64,
    term_years: u32,
    loan_to_value_pct: f64,
}

impl MortgageTerms {
    pub const MAX_TERM_YEARS: u32 = 40;

    pub fn new(
        interest_rate_pct: f64,
        term_years: u32,
        loan_to_value_pct: f64,
        names: &MortgageFieldNames,
    ) -> Result<Self, InputError> {
        check_percentage(names.interest_rate, interest_rate_pct)?;
        check_percentage(names.loan_to_value, loan_to_value_pct)?;
        if !(1..=Self::MAX_TERM_YEARS).contains(&term_years) {
            return Err(InputError::OutOfRange {
                field: names.term_years,
                min: 1.0,
                max: f64::from(Self::MAX_TERM_YEARS),
            });
        }
        Ok(Self {
            interest_rate_pct,
            term_years,
            loan_to_value_pct,
        })
    }

    pub fn interest_rate_pct(&self) -> f64 {
        self.interest_rate_pct
    }

    pub fn term_years(&self) -> u32 {
        self.term_years
    }

    pub fn loan_to_value_pct(&self) -> f64 {
        self.loan_to_value_pct
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CalculationInputs {
    pub purchase_price: f64,
    pub annual_rent: f64,
    pub upfront: UpfrontCosts,
    pub running: RunningCosts,
    pub vacancy_rate_pct: f64,
    pub mortgage: Option<MortgageTerms>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnualExpenses {
    pub maintenance: f64,
    pub management_fees: f64,
    pub insurance: f64,
    pub council_rates: f64,
    pub mortgage_payment: f64,
    pub total: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpfrontCostSummary {
    pub stamp_duty: f64,
    pub legal_fees: f64,
    pub total: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MortgageSummary {
    pub loan_amount: f64,
    pub monthly_payment: f64,
    pub annual_payment: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CalculationResult {
    pub gross_yield_pct: f64,
    pub net_yield_pct: f64,
    pub effective_annual_rent: f64,
    pub annual_expenses: AnnualExpenses,
    pub upfront_costs: UpfrontCostSummary,
    pub mortgage: Option<MortgageSummary>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectionAssumptions {
    pub years: u32,
    pub rent_growth_pct: f64,
    pub expense_inflation_pct: f64,
}

impl Default for ProjectionAssumptions {
    fn default() -> Self {
        Self {
            years: 10,
            rent_growth_pct: 3.0,
            expense_inflation_pct: 2.0,
        }
    }
}

/// Names a caller uses for the projection inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProjectionFieldNames {
    pub years: &'static str,
    pub rent_growth: &'static str,
    pub expense_inflation: &'static str,
}

impl ProjectionAssumptions {
    pub const MAX_YEARS: u32 = 50;

    /// Years must be `1..=MAX_YEARS`; growth rates must stay above -100%.
    pub fn validate(&self, names: &ProjectionFieldNames) -> Result<(), InputError> {
        if !(1..=Self::MAX_YEARS).contains(&self.years) {
            return Err(InputError::OutOfRange {
                field: names.years,
                min: 1.0,
                max: f64::from(Self::MAX_YEARS),
            });
        }
        check_growth_rate(names.rent_growth, self.rent_growth_pct)?;
        check_growth_rate(names.expense_inflation, self.expense_inflation_pct)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CashflowYear {
    pub year: u32,
    pub rent: f64,
    pub expenses: f64,
    pub cash_flow: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseShare {
    pub label: &'static str,
    pub amount: f64,
    pub share_pct: f64,
}

pub(crate) fn check_percentage(field: &'static str, value: f64) -> Result<(), InputError> {
    if !value.is_finite() {
        return Err(InputError::NotFinite { field });
    }
    if !(0.0..=100.0).contains(&value) {
        return Err(InputError::OutOfRange {
            field,
            min: 0.0,
            max: 100.0,
        });
    }
    Ok(())
}

fn check_growth_rate(field: &'static str, value: f64) -> Result<(), InputError> {
    if !value.is_finite() {
        return Err(InputError::NotFinite { field });
    }
    if value <= -100.0 {
        return Err(InputError::RateBelowFloor { field });
    }
    Ok(())
}
