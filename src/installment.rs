use crate::error::InstallmentError;

/// Fixed monthly interest rate (1.5%).
pub const MONTHLY_RATE: f64 = 0.015;

/// Fixed-payment amortization: `amount * r / (1 - (1 + r)^-term)`, rounded
/// to cents.
pub fn monthly_installment(amount: f64, term_months: u32) -> Result<f64, InstallmentError> {
    if term_months == 0 {
        return Err(InstallmentError::ZeroTerm);
    }
    let exponent = i32::try_from(term_months)
        .map_err(|_| InstallmentError::InvalidTerm(term_months.to_string()))?;
    if !amount.is_finite() {
        return Err(InstallmentError::InvalidAmount(amount.to_string()));
    }
    if amount <= 0.0 {
        return Err(InstallmentError::NonPositiveAmount(amount));
    }

    let discount = 1.0 - (1.0 + MONTHLY_RATE).powi(-exponent);
    Ok(round_cents(amount * MONTHLY_RATE / discount))
}

/// Estimate from the raw field text. `Ok(None)` while either field is empty.
pub fn estimate(amount: &str, term: &str) -> Result<Option<f64>, InstallmentError> {
    if amount.is_empty() || term.is_empty() {
        return Ok(None);
    }

    let amount: f64 = amount
        .parse()
        .map_err(|_| InstallmentError::InvalidAmount(amount.to_string()))?;
    let term: u32 = term
        .parse()
        .map_err(|_| InstallmentError::InvalidTerm(term.to_string()))?;

    monthly_installment(amount, term).map(Some)
}

fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
