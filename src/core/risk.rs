//! Fraud hold policy
//!
//! The stock policy is a single threshold: anything strictly above it is held
//! for admin review. It is a placeholder, not a scoring model.

use rust_decimal::Decimal;

use crate::core::traits::{RiskAssessment, RiskPolicy};
use crate::types::User;

/// Holds transfers above a fixed amount
#[derive(Debug, Clone, PartialEq)]
pub struct ThresholdPolicy {
    threshold: Decimal,
    reason: String,
}

impl ThresholdPolicy {
    pub fn new(threshold: Decimal) -> Self {
        Self {
            threshold,
            reason: format!("High Value Transaction (> {})", group_thousands(threshold)),
        }
    }

    pub fn threshold(&self) -> Decimal {
        self.threshold
    }
}

impl Default for ThresholdPolicy {
    fn default() -> Self {
        Self::new(Decimal::new(5_000, 0))
    }
}

impl RiskPolicy for ThresholdPolicy {
    fn evaluate(&self, amount: Decimal, _sender: &User, _recipient: &User) -> RiskAssessment {
        if amount > self.threshold {
            RiskAssessment::hold(self.reason.clone())
        } else {
            RiskAssessment::clear()
        }
    }
}

/// `12500.5` -> `12,500.5`
fn group_thousands(value: Decimal) -> String {
    let text = value.normalize().to_string();
    let (sign, unsigned) = match text.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", text.as_str()),
    };
    let (integer, fraction) = match unsigned.split_once('.') {
        Some((integer, fraction)) => (integer, Some(fraction)),
        None => (unsigned, None),
    };

    let mut grouped = String::with_capacity(integer.len() + integer.len() / 3);
    for (i, digit) in integer.chars().enumerate() {
        if i > 0 && (integer.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    match fraction {
        Some(fraction) => format!("{}{}.{}", sign, grouped, fraction),
        None => format!("{}{}", sign, grouped),
    }
}
