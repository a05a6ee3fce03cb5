//! Field-level validation rules.
//!
//! Every check is a pure function of one field's text. The error map shown
//! by the form is a [`ValidationReport`] rebuilt from the current inputs
//! each time it is needed, so it can never hold a stale message.

use regex::Regex;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::LazyLock;

use crate::request::{CreditType, Field, FormInputs, MIN_AMOUNT, TERMS};

pub const NAME_TOO_SHORT: &str = "must be at least 3 characters";
pub const BAD_NATIONAL_ID: &str = "must be 6–10 digits";
pub const BAD_EMAIL: &str = "invalid email";
pub const BAD_PHONE: &str = "must be 10 digits";
pub const BAD_CREDIT_TYPE: &str = "select a credit type";
pub const NOT_A_NUMBER: &str = "must be a number";
pub const AMOUNT_TOO_LOW: &str = "must be at least 500000";
pub const BAD_TERM: &str = "must be 6, 12, 18 or 24 months";

static NATIONAL_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]{6,10}$").expect("national id pattern"));
static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern"));
static PHONE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]{10}$").expect("phone pattern"));

/// Check a single field. `Err` carries the message to show next to it.
pub fn validate_field(field: Field, value: &str) -> Result<(), &'static str> {
    match field {
        Field::FullName if value.trim().chars().count() < 3 => Err(NAME_TOO_SHORT),
        Field::NationalId if !NATIONAL_ID_RE.is_match(value) => Err(BAD_NATIONAL_ID),
        Field::Email if !EMAIL_RE.is_match(value) => Err(BAD_EMAIL),
        Field::Phone if !PHONE_RE.is_match(value) => Err(BAD_PHONE),
        Field::CreditType if !CreditType::ALL.iter().any(|t| t.label() == value) => {
            Err(BAD_CREDIT_TYPE)
        }
        Field::Amount => match value.parse::<f64>() {
            Ok(n) if !n.is_finite() => Err(NOT_A_NUMBER),
            Ok(n) if n < MIN_AMOUNT => Err(AMOUNT_TOO_LOW),
            Ok(_) => Ok(()),
            Err(_) => Err(NOT_A_NUMBER),
        },
        Field::Term => match value.parse::<u32>() {
            Ok(n) if TERMS.contains(&n) => Ok(()),
            _ => Err(BAD_TERM),
        },
        Field::MonthlyIncome => match value.parse::<f64>() {
            Ok(n) if n.is_finite() && n >= 0.0 => Ok(()),
            _ => Err(NOT_A_NUMBER),
        },
        _ => Ok(()),
    }
}

/// Currently-invalid fields and their messages.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    errors: BTreeMap<Field, &'static str>,
}

impl ValidationReport {
    /// Full pass: run every rule against the current inputs.
    pub fn of(inputs: &FormInputs) -> Self {
        Self::of_fields(inputs, Field::ALL)
    }

    /// Run the rules for the given fields only.
    pub fn of_fields(inputs: &FormInputs, fields: impl IntoIterator<Item = Field>) -> Self {
        let errors = fields
            .into_iter()
            .filter_map(|field| {
                validate_field(field, inputs.get(field))
                    .err()
                    .map(|msg| (field, msg))
            })
            .collect();
        Self { errors }
    }

    /// Like [`ValidationReport::of_fields`] for the fields the user has edited.
    pub fn of_touched(inputs: &FormInputs, touched: &BTreeSet<Field>) -> Self {
        Self::of_fields(inputs, touched.iter().copied())
    }

    pub fn get(&self, field: Field) -> Option<&'static str> {
        self.errors.get(&field).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Field, &'static str)> + '_ {
        self.errors.iter().map(|(f, m)| (*f, *m))
    }
}
