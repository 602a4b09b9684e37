use std::fmt::Write as _;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use super::{CalculationRequest, build_calculate_response};
use crate::core::{
    CalculationInputs, CalculationResult, CashflowYear, MortgageFieldNames, MortgageTerms,
    ProjectionAssumptions, ProjectionFieldNames, RunningCosts, UpfrontCosts, cashflow_csv,
    check_percentage,
};
use crate::error::{CalculateError, InputError};

#[derive(Parser, Debug)]
#[command(
    name = "rental-yield",
    about = "Rental property yield calculator (gross/net yield, mortgage, cash-flow projection)"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Compute yields for one property and print a report
    Calculate {
        #[command(flatten)]
        args: CalculateArgs,
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
    /// Serve the web form and JSON API
    Serve {
        #[arg(long, help = "Port to listen on, overrides the config file")]
        port: Option<u16>,
        #[arg(long, help = "Address to bind, overrides the config file")]
        host: Option<String>,
        #[arg(long, help = "Path to a TOML config file")]
        config: Option<PathBuf>,
    },
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
    Csv,
}

#[derive(Args, Debug, Clone)]
pub struct CalculateArgs {
    #[arg(long)]
    pub purchase_price: f64,
    #[arg(long, help = "Annual rental income before vacancy")]
    pub annual_rent: f64,
    #[arg(long, default_value_t = 0.0)]
    pub stamp_duty: f64,
    #[arg(long, default_value_t = 0.0)]
    pub legal_fees: f64,
    #[arg(long, default_value_t = 0.0, help = "Annual maintenance costs")]
    pub maintenance_costs: f64,
    #[arg(long, default_value_t = 0.0, help = "Annual management fees")]
    pub management_fees: f64,
    #[arg(long, default_value_t = 0.0, help = "Annual insurance costs")]
    pub insurance_costs: f64,
    #[arg(long, default_value_t = 0.0, help = "Annual council rates")]
    pub council_rates: f64,
    #[arg(
        long,
        default_value_t = 5.0,
        help = "Expected vacancy in percent of the year"
    )]
    pub vacancy_rate: f64,
    #[arg(long)]
    pub include_mortgage: bool,
    #[arg(
        long,
        help = "Mortgage interest rate in percent; required with --include-mortgage"
    )]
    pub mortgage_interest_rate: Option<f64>,
    #[arg(long, help = "Mortgage term in years (1-40); required with --include-mortgage")]
    pub mortgage_term_years: Option<u32>,
    #[arg(
        long,
        help = "Loan to value ratio in percent; required with --include-mortgage"
    )]
    pub loan_to_value_ratio: Option<f64>,
    #[arg(long, help = "Years of cash flow to project, default 10")]
    pub projection_years: Option<u32>,
    #[arg(long, help = "Annual rent growth in percent, default 3")]
    pub rent_growth: Option<f64>,
    #[arg(long, help = "Annual expense inflation in percent, default 2")]
    pub expense_inflation: Option<f64>,
}

/// The names validation errors use for each input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldNames {
    pub purchase_price: &'static str,
    pub annual_rent: &'static str,
    pub stamp_duty: &'static str,
    pub legal_fees: &'static str,
    pub maintenance_costs: &'static str,
    pub management_fees: &'static str,
    pub insurance_costs: &'static str,
    pub council_rates: &'static str,
    pub vacancy_rate: &'static str,
    pub include_mortgage: &'static str,
    pub mortgage: MortgageFieldNames,
    pub projection: ProjectionFieldNames,
}

impl FieldNames {
    pub const CLI: Self = Self {
        purchase_price: "--purchase-price",
        annual_rent: "--annual-rent",
        stamp_duty: "--stamp-duty",
        legal_fees: "--legal-fees",
        maintenance_costs: "--maintenance-costs",
        management_fees: "--management-fees",
        insurance_costs: "--insurance-costs",
        council_rates: "--council-rates",
        vacancy_rate: "--vacancy-rate",
        include_mortgage: "--include-mortgage",
        mortgage: MortgageFieldNames {
            interest_rate: "--mortgage-interest-rate",
            term_years: "--mortgage-term-years",
            loan_to_value: "--loan-to-value-ratio",
        },
        projection: ProjectionFieldNames {
            years: "--projection-years",
            rent_growth: "--rent-growth",
            expense_inflation: "--expense-inflation",
        },
    };

    /// Keys of the web form's JSON/query payload.
    pub const JSON: Self = Self {
        purchase_price: "purchasePrice",
        annual_rent: "annualRent",
        stamp_duty: "stampDuty",
        legal_fees: "legalFees",
        maintenance_costs: "maintenanceCosts",
        management_fees: "managementFees",
        insurance_costs: "insuranceCosts",
        council_rates: "councilRates",
        vacancy_rate: "vacancyRate",
        include_mortgage: "includeMortgage",
        mortgage: MortgageFieldNames {
            interest_rate: "mortgageInterestRate",
            term_years: "mortgageTermYears",
            loan_to_value: "loanToValueRatio",
        },
        projection: ProjectionFieldNames {
            years: "projectionYears",
            rent_growth: "rentGrowth",
            expense_inflation: "expenseInflation",
        },
    };
}

pub fn build_request(
    args: &CalculateArgs,
    projection_defaults: ProjectionAssumptions,
    names: &FieldNames,
) -> Result<CalculationRequest, InputError> {
    for (name, amount) in [
        (names.purchase_price, args.purchase_price),
        (names.annual_rent, args.annual_rent),
        (names.stamp_duty, args.stamp_duty),
        (names.legal_fees, args.legal_fees),
        (names.maintenance_costs, args.maintenance_costs),
        (names.management_fees, args.management_fees),
        (names.insurance_costs, args.insurance_costs),
        (names.council_rates, args.council_rates),
    ] {
        check_amount(name, amount)?;
    }

    check_percentage(names.vacancy_rate, args.vacancy_rate)?;

    let mortgage = if args.include_mortgage {
        let missing = |field: &'static str| InputError::MissingMortgageField {
            field,
            toggle: names.include_mortgage,
        };
        let interest_rate = args
            .mortgage_interest_rate
            .ok_or_else(|| missing(names.mortgage.interest_rate))?;
        let term_years = args
            .mortgage_term_years
            .ok_or_else(|| missing(names.mortgage.term_years))?;
        let ltv = args
            .loan_to_value_ratio
            .ok_or_else(|| missing(names.mortgage.loan_to_value))?;
        Some(MortgageTerms::new(
            interest_rate,
            term_years,
            ltv,
            &names.mortgage,
        )?)
    } else {
        None
    };

    let assumptions = ProjectionAssumptions {
        years: args.projection_years.unwrap_or(projection_defaults.years),
        rent_growth_pct: args.rent_growth.unwrap_or(projection_defaults.rent_growth_pct),
        expense_inflation_pct: args
            .expense_inflation
            .unwrap_or(projection_defaults.expense_inflation_pct),
    };
    assumptions.validate(&names.projection)?;

    Ok(CalculationRequest {
        inputs: CalculationInputs {
            purchase_price: args.purchase_price,
            annual_rent: args.annual_rent,
            upfront: UpfrontCosts {
                stamp_duty: args.stamp_duty,
                legal_fees: args.legal_fees,
            },
            running: RunningCosts {
                maintenance: args.maintenance_costs,
                management_fees: args.management_fees,
                insurance: args.insurance_costs,
                council_rates: args.council_rates,
            },
            vacancy_rate_pct: args.vacancy_rate,
            mortgage,
        },
        assumptions,
    })
}

fn check_amount(field: &'static str, value: f64) -> Result<(), InputError> {
    if !value.is_finite() {
        return Err(InputError::NotFinite { field });
    }
    if value < 0.0 {
        return Err(InputError::Negative { field });
    }
    Ok(())
}

pub fn render_calculation(
    request: &CalculationRequest,
    format: OutputFormat,
) -> Result<String, CalculateError> {
    let response = build_calculate_response(request);
    match format {
        OutputFormat::Text => Ok(text_report(&response.result, &response.projection)?),
        OutputFormat::Json => Ok(format!("{}\n", serde_json::to_string_pretty(&response)?)),
        OutputFormat::Csv => Ok(cashflow_csv(&response.projection)?),
    }
}

fn text_report(
    result: &CalculationResult,
    projection: &[CashflowYear],
) -> Result<String, std::fmt::Error> {
    let mut out = String::new();
    writeln!(out, "Gross Rental Yield: {:.2}%", result.gross_yield_pct)?;
    writeln!(out, "Net Rental Yield: {:.2}%", result.net_yield_pct)?;
    writeln!(
        out,
        "Effective Annual Rent: ${:.2}",
        result.effective_annual_rent
    )?;

    let expenses = &result.annual_expenses;
    writeln!(out, "\nAnnual Expenses Breakdown")?;
    for (label, amount) in [
        ("Maintenance", expenses.maintenance),
        ("Management Fees", expenses.management_fees),
        ("Insurance", expenses.insurance),
        ("Council Rates", expenses.council_rates),
        ("Mortgage (if any)", expenses.mortgage_payment),
        ("Total", expenses.total),
    ] {
        writeln!(out, "  {label}: ${amount:.2}")?;
    }

    let upfront = &result.upfront_costs;
    writeln!(out, "\nUpfront Costs")?;
    for (label, amount) in [
        ("Stamp Duty", upfront.stamp_duty),
        ("Legal Fees", upfront.legal_fees),
        ("Total", upfront.total),
    ] {
        writeln!(out, "  {label}: ${amount:.2}")?;
    }

    if let Some(mortgage) = &result.mortgage {
        writeln!(out, "\nMortgage")?;
        writeln!(out, "  Loan Amount: ${:.2}", mortgage.loan_amount)?;
        writeln!(out, "  Monthly Payment: ${:.2}", mortgage.monthly_payment)?;
        writeln!(out, "  Annual Payment: ${:.2}", mortgage.annual_payment)?;
    }

    writeln!(out, "\n{}-Year Cash Flow Projection", projection.len())?;
    writeln!(
        out,
        "{:>4}  {:>14}  {:>14}  {:>14}",
        "Year", "Rent", "Expenses", "Cash Flow"
    )?;
    for row in projection {
        writeln!(
            out,
            "{:>4}  {:>14.2}  {:>14.2}  {:>14.2}",
            row.year, row.rent, row.expenses, row.cash_flow
        )?;
    }
    Ok(out)
}
