//! Field identifiers, raw form inputs and the persisted credit request record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::FormError;

/// Smallest amount that can be requested.
pub const MIN_AMOUNT: f64 = 500_000.0;

/// Terms offered, in months.
pub const TERMS: [u32; 4] = [6, 12, 18, 24];

/// Every input on the form, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Field {
    FullName,
    NationalId,
    Email,
    Phone,
    CreditType,
    Amount,
    Term,
    Purpose,
    Employer,
    JobTitle,
    MonthlyIncome,
}

impl Field {
    pub const ALL: [Field; 11] = [
        Field::FullName,
        Field::NationalId,
        Field::Email,
        Field::Phone,
        Field::CreditType,
        Field::Amount,
        Field::Term,
        Field::Purpose,
        Field::Employer,
        Field::JobTitle,
        Field::MonthlyIncome,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Field::FullName => "Full Name",
            Field::NationalId => "National ID",
            Field::Email => "Email",
            Field::Phone => "Phone",
            Field::CreditType => "Credit Type",
            Field::Amount => "Amount Requested",
            Field::Term => "Term (months)",
            Field::Purpose => "Purpose of the Credit",
            Field::Employer => "Employer",
            Field::JobTitle => "Job Title",
            Field::MonthlyIncome => "Monthly Income",
        }
    }

    /// Section heading the field is grouped under.
    pub fn section(self) -> &'static str {
        match self {
            Field::FullName | Field::NationalId | Field::Email | Field::Phone => "Personal Data",
            Field::CreditType | Field::Amount | Field::Term | Field::Purpose => "Credit Data",
            Field::Employer | Field::JobTitle | Field::MonthlyIncome => "Employment Data",
        }
    }

    /// Whether typing `c` into this field is allowed. Amounts take a decimal point.
    pub fn accepts_char(self, c: char) -> bool {
        match self {
            Field::NationalId | Field::Phone => c.is_ascii_digit(),
            Field::Amount | Field::MonthlyIncome => c.is_ascii_digit() || c == '.',
            Field::CreditType | Field::Term => false,
            _ => !c.is_control(),
        }
    }

    /// Fields chosen from a fixed list instead of typed.
    pub fn is_choice(self) -> bool {
        matches!(self, Field::CreditType | Field::Term)
    }

    pub fn next(self) -> Field {
        let idx = self.index();
        Field::ALL[(idx + 1) % Field::ALL.len()]
    }

    pub fn prev(self) -> Field {
        let idx = self.index();
        Field::ALL[(idx + Field::ALL.len() - 1) % Field::ALL.len()]
    }

    fn index(self) -> usize {
        Field::ALL.iter().position(|f| *f == self).unwrap_or(0)
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CreditType {
    #[serde(rename = "Free Investment")]
    FreeInvestment,
    Vehicle,
    Housing,
    Education,
    Agricultural,
    Business,
}

impl CreditType {
    pub const ALL: [CreditType; 6] = [
        CreditType::FreeInvestment,
        CreditType::Vehicle,
        CreditType::Housing,
        CreditType::Education,
        CreditType::Agricultural,
        CreditType::Business,
    ];

    pub fn label(self) -> &'static str {
        match self {
            CreditType::FreeInvestment => "Free Investment",
            CreditType::Vehicle => "Vehicle",
            CreditType::Housing => "Housing",
            CreditType::Education => "Education",
            CreditType::Agricultural => "Agricultural",
            CreditType::Business => "Business",
        }
    }
}

impl fmt::Display for CreditType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for CreditType {
    type Err = FormError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CreditType::ALL
            .into_iter()
            .find(|t| t.label() == s)
            .ok_or_else(|| FormError::InvalidValue {
                field: Field::CreditType,
                value: s.to_string(),
            })
    }
}

/// Raw text of every field as the user typed or selected it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormInputs {
    pub full_name: String,
    pub national_id: String,
    pub email: String,
    pub phone: String,
    pub credit_type: String,
    pub amount: String,
    pub term: String,
    pub purpose: String,
    pub employer: String,
    pub job_title: String,
    pub monthly_income: String,
}

impl FormInputs {
    pub fn get(&self, field: Field) -> &str {
        match field {
            Field::FullName => &self.full_name,
            Field::NationalId => &self.national_id,
            Field::Email => &self.email,
            Field::Phone => &self.phone,
            Field::CreditType => &self.credit_type,
            Field::Amount => &self.amount,
            Field::Term => &self.term,
            Field::Purpose => &self.purpose,
            Field::Employer => &self.employer,
            Field::JobTitle => &self.job_title,
            Field::MonthlyIncome => &self.monthly_income,
        }
    }

    pub(crate) fn get_mut(&mut self, field: Field) -> &mut String {
        match field {
            Field::FullName => &mut self.full_name,
            Field::NationalId => &mut self.national_id,
            Field::Email => &mut self.email,
            Field::Phone => &mut self.phone,
            Field::CreditType => &mut self.credit_type,
            Field::Amount => &mut self.amount,
            Field::Term => &mut self.term,
            Field::Purpose => &mut self.purpose,
            Field::Employer => &mut self.employer,
            Field::JobTitle => &mut self.job_title,
            Field::MonthlyIncome => &mut self.monthly_income,
        }
    }

    /// Fields left empty, in display order.
    pub fn missing(&self) -> Vec<Field> {
        Field::ALL
            .into_iter()
            .filter(|f| self.get(*f).is_empty())
            .collect()
    }

    pub fn is_complete(&self) -> bool {
        self.missing().is_empty()
    }
}

/// A completed request, as handed to the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreditRequest {
    pub full_name: String,
    pub national_id: String,
    pub email: String,
    pub phone: String,
    pub credit_type: CreditType,
    pub amount: f64,
    pub term_months: u32,
    pub installment: f64,
    pub purpose: String,
    pub employer: String,
    pub job_title: String,
    pub monthly_income: f64,
    pub created_at: DateTime<Utc>,
}

impl CreditRequest {
    /// Snapshot the inputs into a typed record stamped with `created_at`.
    pub fn from_inputs(
        inputs: &FormInputs,
        installment: f64,
        created_at: DateTime<Utc>,
    ) -> Result<Self, FormError> {
        Ok(Self {
            full_name: inputs.full_name.trim().to_string(),
            national_id: inputs.national_id.clone(),
            email: inputs.email.clone(),
            phone: inputs.phone.clone(),
            credit_type: inputs.credit_type.parse()?,
            amount: parse_number(Field::Amount, &inputs.amount)?,
            term_months: inputs.term.parse().map_err(|_| FormError::InvalidValue {
                field: Field::Term,
                value: inputs.term.clone(),
            })?,
            installment,
            purpose: inputs.purpose.clone(),
            employer: inputs.employer.clone(),
            job_title: inputs.job_title.clone(),
            monthly_income: parse_number(Field::MonthlyIncome, &inputs.monthly_income)?,
            created_at,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StoredRequest {
    pub id: String,
    pub request: CreditRequest,
}

fn parse_number(field: Field, value: &str) -> Result<f64, FormError> {
    value
        .parse::<f64>()
        .ok()
        .filter(|n| n.is_finite())
        .ok_or_else(|| FormError::InvalidValue {
            field,
            value: value.to_string(),
        })
}
