use super::types::{
    AnnualExpenses, CalculationInputs, CalculationResult, MortgageSummary, MortgageTerms,
    UpfrontCostSummary,
};

const MONTHS_PER_YEAR: u32 = 12;

pub fn compute(inputs: &CalculationInputs) -> CalculationResult {
    let gross_yield = ratio_pct(inputs.annual_rent, inputs.purchase_price);

    let vacancy_loss = (inputs.vacancy_rate_pct / 100.0) * inputs.annual_rent;
    let effective_rent = inputs.annual_rent - vacancy_loss;

    let mortgage = inputs
        .mortgage
        .and_then(|terms| mortgage_summary(inputs.purchase_price, &terms));
    let mortgage_payment = mortgage.map_or(0.0, |m| m.annual_payment);

    let running = &inputs.running;
    let total_annual_expenses = running.maintenance
        + running.management_fees
        + running.insurance
        + running.council_rates
        + mortgage_payment;

    let upfront_total = inputs.upfront.stamp_duty + inputs.upfront.legal_fees;
    let net_yield = ratio_pct(
        effective_rent - total_annual_expenses,
        inputs.purchase_price + upfront_total,
    );

    CalculationResult {
        gross_yield_pct: round2(gross_yield),
        net_yield_pct: round2(net_yield),
        effective_annual_rent: round2(effective_rent),
        annual_expenses: AnnualExpenses {
            maintenance: round2(running.maintenance),
            management_fees: round2(running.management_fees),
            insurance: round2(running.insurance),
            council_rates: round2(running.council_rates),
            mortgage_payment: round2(mortgage_payment),
            total: round2(total_annual_expenses),
        },
        upfront_costs: UpfrontCostSummary {
            stamp_duty: round2(inputs.upfront.stamp_duty),
            legal_fees: round2(inputs.upfront.legal_fees),
            total: round2(upfront_total),
        },
        mortgage: mortgage.map(|m| MortgageSummary {
            loan_amount: round2(m.loan_amount),
            monthly_payment: round2(m.monthly_payment),
            annual_payment: round2(m.annual_payment),
        }),
    }
}

// Unrounded; `None` means the block contributes nothing.
fn mortgage_summary(purchase_price: f64, terms: &MortgageTerms) -> Option<MortgageSummary> {
    if terms.loan_to_value_pct() <= 0.0 {
        return None;
    }

    let loan_amount = (terms.loan_to_value_pct() / 100.0) * purchase_price;
    let monthly_rate = (terms.interest_rate_pct() / 100.0) / f64::from(MONTHS_PER_YEAR);
    let periods = terms.term_years().max(1).saturating_mul(MONTHS_PER_YEAR);
    let monthly_payment = amortized_payment(loan_amount, monthly_rate, periods);

    Some(MortgageSummary {
        loan_amount,
        monthly_payment,
        annual_payment: monthly_payment * f64::from(MONTHS_PER_YEAR),
    })
}

/// Level payment that retires `principal` over `periods` at `rate` per period.
/// At zero interest the annuity formula is 0/0, so repayment is straight-line.
pub fn amortized_payment(principal: f64, rate: f64, periods: u32) -> f64 {
    let n = f64::from(periods.max(1));
    if rate.abs() < 1e-12 {
        return principal / n;
    }

    // Discount form; `(1 + rate)^n` overflows for long schedules.
    let discount = (1.0 + rate).powf(-n);
    principal * rate / (1.0 - discount)
}

fn ratio_pct(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        0.0
    } else {
        numerator / denominator * 100.0
    }
}

/// Half away from zero to cents. Adding `0.0` folds `-0.0` into `0.0`.
pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0 + 0.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{MortgageFieldNames, RunningCosts, UpfrontCosts};
    use crate::error::InputError;
    use proptest::prelude::{prop_assert, prop_assert_eq, proptest};

    const EPS: f64 = 1e-9;

    fn assert_approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() <= EPS,
            "expected {expected}, got {actual}"
        );
    }

    fn assert_approx_tol(actual: f64, expected: f64, tol: f64) {
        assert!(
            (actual - expected).abs() <= tol,
            "expected {expected}, got {actual}, tolerance {tol}"
        );
    }

    fn bare_inputs() -> CalculationInputs {
        CalculationInputs {
            purchase_price: 500_000.0,
            annual_rent: 26_000.0,
            upfront: UpfrontCosts {
                stamp_duty: 0.0,
                legal_fees: 0.0,
            },
            running: RunningCosts {
                maintenance: 0.0,
                management_fees: 0.0,
                insurance: 0.0,
                council_rates: 0.0,
            },
            vacancy_rate_pct: 0.0,
            mortgage: None,
        }
    }

    fn sample_inputs() -> CalculationInputs {
        CalculationInputs {
            purchase_price: 500_000.0,
            annual_rent: 26_000.0,
            upfront: UpfrontCosts {
                stamp_duty: 18_000.0,
                legal_fees: 1_500.0,
            },
            running: RunningCosts {
                maintenance: 1_000.0,
                management_fees: 2_000.0,
                insurance: 1_200.0,
                council_rates: 1_800.0,
            },
            vacancy_rate_pct: 5.0,
            mortgage: None,
        }
    }

    fn set_running_cost(costs: &mut RunningCosts, component: usize, value: f64) {
        match component {
            0 => costs.maintenance = value,
            1 => costs.management_fees = value,
            2 => costs.insurance = value,
            _ => costs.council_rates = value,
        }
    }

    const NAMES: MortgageFieldNames = MortgageFieldNames {
        interest_rate: "rate",
        term_years: "term",
        loan_to_value: "ltv",
    };

    fn terms(interest_rate_pct: f64, term_years: u32, loan_to_value_pct: f64) -> MortgageTerms {
        MortgageTerms::new(interest_rate_pct, term_years, loan_to_value_pct, &NAMES)
            .expect("valid mortgage terms")
    }

    fn standard_mortgage() -> MortgageTerms {
        terms(6.0, 30, 80.0)
    }

    #[test]
    fn compute_unlevered_rent_only_yields_match() {
        let result = compute(&bare_inputs());
        assert_approx(result.gross_yield_pct, 5.2);
        assert_approx(result.effective_annual_rent, 26_000.0);
        assert_approx(result.net_yield_pct, 5.2);
        assert_approx(result.annual_expenses.total, 0.0);
        assert_approx(result.upfront_costs.total, 0.0);
        assert!(result.mortgage.is_none());
    }

    #[test]
    fn compute_zero_purchase_price_reports_zero_yields() {
        let mut inputs = sample_inputs();
        inputs.purchase_price = 0.0;
        inputs.upfront.stamp_duty = 0.0;
        inputs.upfront.legal_fees = 0.0;
        inputs.mortgage = Some(standard_mortgage());

        let result = compute(&inputs);
        assert_eq!(result.gross_yield_pct, 0.0);
        assert_eq!(result.net_yield_pct, 0.0);
    }

    #[test]
    fn compute_zero_price_with_upfront_costs_keeps_net_denominator() {
        let mut inputs = bare_inputs();
        inputs.purchase_price = 0.0;
        inputs.upfront.legal_fees = 1_000.0;
        inputs.annual_rent = 100.0;

        let result = compute(&inputs);
        assert_eq!(result.gross_yield_pct, 0.0);
        assert_approx(result.net_yield_pct, 10.0);
    }

    #[test]
    fn compute_applies_vacancy_as_linear_haircut() {
        let mut inputs = bare_inputs();
        inputs.vacancy_rate_pct = 5.0;

        let result = compute(&inputs);
        assert_eq!(result.effective_annual_rent, 24_700.0);
        assert_approx(result.gross_yield_pct, 5.2);
        assert_approx(result.net_yield_pct, 4.94);
    }

    #[test]
    fn compute_full_vacancy_leaves_no_rent() {
        let mut inputs = sample_inputs();
        inputs.vacancy_rate_pct = 100.0;

        let result = compute(&inputs);
        assert_approx(result.effective_annual_rent, 0.0);
        assert!(result.net_yield_pct < 0.0);
    }

    #[test]
    fn compute_sums_running_and_upfront_costs() {
        let result = compute(&sample_inputs());
        assert_approx(result.annual_expenses.maintenance, 1_000.0);
        assert_approx(result.annual_expenses.management_fees, 2_000.0);
        assert_approx(result.annual_expenses.insurance, 1_200.0);
        assert_approx(result.annual_expenses.council_rates, 1_800.0);
        assert_approx(result.annual_expenses.mortgage_payment, 0.0);
        assert_approx(result.annual_expenses.total, 6_000.0);
        assert_approx(result.upfront_costs.stamp_duty, 18_000.0);
        assert_approx(result.upfront_costs.legal_fees, 1_500.0);
        assert_approx(result.upfront_costs.total, 19_500.0);
        // (24_700 - 6_000) / 519_500
        assert_approx(result.net_yield_pct, 3.6);
    }

    #[test]
    fn compute_standard_mortgage_matches_amortization_table() {
        let mut inputs = bare_inputs();
        inputs.mortgage = Some(standard_mortgage());

        let result = compute(&inputs);
        let mortgage = result.mortgage.expect("mortgage summary");
        assert_approx(mortgage.loan_amount, 400_000.0);
        assert_approx_tol(mortgage.monthly_payment, 2_398.20, 0.01);
        assert_approx_tol(mortgage.annual_payment, 28_778.40, 0.05);
        assert_approx(result.annual_expenses.mortgage_payment, mortgage.annual_payment);
        assert_approx(result.annual_expenses.total, 28_778.43);
    }

    #[test]
    fn compute_net_yield_uses_unrounded_mortgage_payment() {
        let mut inputs = sample_inputs();
        inputs.mortgage = Some(standard_mortgage());

        let result = compute(&inputs);
        // (24_700 - 34_778.4252...) / 519_500 * 100 = -1.94002...
        assert_approx(result.net_yield_pct, -1.94);
        assert_approx(result.annual_expenses.total, 34_778.43);
    }

    #[test]
    fn compute_zero_interest_mortgage_repays_straight_line() {
        let mut inputs = bare_inputs();
        inputs.mortgage = Some(terms(0.0, 25, 60.0));

        let result = compute(&inputs);
        let mortgage = result.mortgage.expect("mortgage summary");
        assert!(mortgage.monthly_payment.is_finite());
        assert_approx(mortgage.loan_amount, 300_000.0);
        assert_approx(mortgage.monthly_payment, 1_000.0);
        assert_approx(mortgage.annual_payment, 12_000.0);
        assert!(result.net_yield_pct.is_finite());
    }

    #[test]
    fn compute_zero_ltv_disables_mortgage() {
        let mut inputs = sample_inputs();
        inputs.mortgage = Some(terms(6.0, 30, 0.0));

        let with_block = compute(&inputs);
        inputs.mortgage = None;
        let without_block = compute(&inputs);

        assert!(with_block.mortgage.is_none());
        assert_eq!(with_block, without_block);
    }

    #[test]
    fn amortized_payment_single_period_repays_principal_plus_interest() {
        assert_approx(amortized_payment(1_000.0, 0.01, 1), 1_010.0);
        assert_approx(amortized_payment(1_200.0, 0.0, 12), 100.0);
    }

    #[test]
    fn amortized_payment_guards_zero_periods() {
        assert_approx(amortized_payment(500.0, 0.0, 0), 500.0);
    }

    #[test]
    fn round2_keeps_two_decimal_places() {
        assert_approx(round2(2.5), 2.5);
        assert_approx(round2(2_398.202_100_611), 2_398.2);
        assert_approx(round2(-1.9400241), -1.94);
        assert_approx(round2(3.599615), 3.6);
    }

    #[test]
    fn round2_never_returns_negative_zero() {
        for value in [-0.001, -0.004_999, -0.0] {
            let rounded = round2(value);
            assert_eq!(rounded, 0.0);
            assert!(rounded.is_sign_positive(), "round2({value}) gave {rounded}");
        }
    }

    #[test]
    fn compute_tiny_loss_reports_unsigned_zero_net_yield() {
        let mut inputs = bare_inputs();
        inputs.annual_rent = 0.0;
        inputs.running.insurance = 1.0;

        let result = compute(&inputs);
        assert!(result.net_yield_pct.is_sign_positive());
        let json = serde_json::to_string(&result).expect("result should serialize");
        assert!(json.contains("\"netYieldPct\":0.0"), "{json}");
    }

    #[test]
    fn mortgage_terms_reject_term_beyond_limit() {
        let err = MortgageTerms::new(6.0, u32::MAX, 80.0, &NAMES).expect_err("term too long");
        assert_eq!(
            err,
            InputError::OutOfRange {
                field: "term",
                min: 1.0,
                max: 40.0,
            }
        );
    }

    #[test]
    fn mortgage_terms_report_caller_field_names() {
        let err = MortgageTerms::new(101.0, 30, 80.0, &NAMES).expect_err("rate too high");
        assert!(err.to_string().starts_with("rate "));
        let err = MortgageTerms::new(6.0, 30, f64::NAN, &NAMES).expect_err("ltv not finite");
        assert_eq!(err, InputError::NotFinite { field: "ltv" });
    }

    #[test]
    fn amortized_payment_stays_finite_for_saturated_period_count() {
        let payment = amortized_payment(400_000.0, 0.005, u32::MAX);
        assert!(payment.is_finite());
        assert_approx_tol(payment, 2_000.0, 1e-6);
    }

    proptest! {
        #![proptest_config(proptest::test_runner::Config::with_cases(64))]

        #[test]
        fn prop_zero_price_always_zero_gross_yield(
            rent in 0u32..200_000,
            vacancy in 0u32..=100,
            maintenance in 0u32..20_000,
            rate_bp in 0u32..2_000,
            ltv in 0u32..=100,
        ) {
            let mut inputs = sample_inputs();
            inputs.purchase_price = 0.0;
            inputs.upfront.stamp_duty = 0.0;
            inputs.upfront.legal_fees = 0.0;
            inputs.annual_rent = rent as f64;
            inputs.vacancy_rate_pct = vacancy as f64;
            inputs.running.maintenance = maintenance as f64;
            inputs.mortgage = Some(terms(rate_bp as f64 / 100.0, 30, ltv as f64));

            let result = compute(&inputs);
            prop_assert_eq!(result.gross_yield_pct, 0.0);
            prop_assert_eq!(result.net_yield_pct, 0.0);
        }

        #[test]
        fn prop_net_yield_non_increasing_in_each_running_cost(
            price in 1u32..2_000_000,
            rent in 0u32..200_000,
            vacancy in 0u32..=100,
            base in 0u32..20_000,
            bump in 0u32..20_000,
            component in 0usize..4,
            with_mortgage in proptest::bool::ANY,
        ) {
            let mut inputs = sample_inputs();
            inputs.purchase_price = price as f64;
            inputs.annual_rent = rent as f64;
            inputs.vacancy_rate_pct = vacancy as f64;
            if with_mortgage {
                inputs.mortgage = Some(standard_mortgage());
            }

            let mut cheaper = inputs;
            let mut dearer = inputs;
            set_running_cost(&mut cheaper.running, component, base as f64);
            set_running_cost(&mut dearer.running, component, (base + bump) as f64);

            let low = compute(&cheaper);
            let high = compute(&dearer);
            prop_assert!(high.net_yield_pct <= low.net_yield_pct);
            prop_assert!(high.annual_expenses.total >= low.annual_expenses.total);
        }

        #[test]
        fn prop_compute_is_idempotent_and_finite(
            price in 0u32..2_000_000,
            rent in 0u32..200_000,
            stamp in 0u32..100_000,
            vacancy in 0u32..=100,
            rate_bp in 0u32..=10_000,
            term in 1u32..=40,
            ltv in 0u32..=100,
        ) {
            let mut inputs = sample_inputs();
            inputs.purchase_price = price as f64;
            inputs.annual_rent = rent as f64;
            inputs.upfront.stamp_duty = stamp as f64;
            inputs.vacancy_rate_pct = vacancy as f64;
            inputs.mortgage = Some(terms(rate_bp as f64 / 100.0, term, ltv as f64));

            let first = compute(&inputs);
            let second = compute(&inputs);
            prop_assert_eq!(first.gross_yield_pct.to_bits(), second.gross_yield_pct.to_bits());
            prop_assert_eq!(first.net_yield_pct.to_bits(), second.net_yield_pct.to_bits());
            prop_assert_eq!(first, second);
            prop_assert!(first.net_yield_pct.is_finite());
            prop_assert!(first.annual_expenses.total.is_finite());
            prop_assert!(first.annual_expenses.mortgage_payment >= 0.0);
        }

        #[test]
        fn prop_mortgage_payment_covers_principal(
            price in 10_000u32..2_000_000,
            rate_bp in 0u32..2_000,
            term in 1u32..=40,
            ltv in 1u32..=100,
        ) {
            let mut inputs = bare_inputs();
            inputs.purchase_price = price as f64;
            inputs.mortgage = Some(terms(rate_bp as f64 / 100.0, term, ltv as f64));

            let mortgage = compute(&inputs).mortgage.expect("mortgage summary");
            let repaid = mortgage.annual_payment * term as f64;
            prop_assert!(repaid + 0.01 * (term as f64 * 12.0) >= mortgage.loan_amount);
        }
    }
}
