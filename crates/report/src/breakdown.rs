use rust_decimal::Decimal;

use summa_core::Money;

/// Minimum fraction of the total a counterparty must represent to appear
/// individually; smaller ones are folded into "Other".
pub fn default_threshold() -> Decimal {
    Decimal::new(1, 2) // 0.01
}

/// Label used for the synthetic below-threshold bucket.
pub const OTHER_LABEL: &str = "Other";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryShare {
    pub label: String,
    pub value: Money,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Breakdown {
    pub shares: Vec<CategoryShare>,
    pub total: Money,
}

impl Breakdown {
    /// Total formatted for display, one decimal place.
    pub fn formatted_total(&self) -> String {
        format!("{:.1}", self.total.to_decimal())
    }
}

/// Builds the thresholded share breakdown from raw per-row label/amount
/// lists. Missing entries degrade to placeholders rather than dropping
/// rows: a missing amount turns the whole amount list into 1-per-row, a
/// missing label turns the whole label list into "Company {i}".
pub fn build(
    labels: &[Option<String>],
    amounts: &[Option<Money>],
    threshold: Decimal,
) -> Breakdown {
    let mut amounts: Vec<Money> = if amounts.is_empty() || amounts.iter().any(Option::is_none) {
        tracing::warn!("invalid amount data, substituting placeholder values");
        vec![Money::one(); labels.len()]
    } else {
        amounts.iter().flatten().copied().collect()
    };

    let mut labels: Vec<String> = if labels.is_empty() || labels.iter().any(Option::is_none) {
        tracing::warn!("invalid label data, substituting placeholder names");
        (0..amounts.len()).map(|i| format!("Company {i}")).collect()
    } else {
        labels.iter().flatten().cloned().collect()
    };

    if labels.len() != amounts.len() {
        let min = labels.len().min(amounts.len());
        tracing::warn!(
            labels = labels.len(),
            amounts = amounts.len(),
            "label/amount length mismatch, truncating to {min}"
        );
        labels.truncate(min);
        amounts.truncate(min);
    }

    let total: Money = amounts.iter().copied().sum();
    if total.is_zero() {
        return Breakdown { shares: Vec::new(), total };
    }

    let mut shares = Vec::new();
    let mut other = Money::zero();
    for (label, amount) in labels.into_iter().zip(amounts) {
        let share = amount.to_decimal() / total.to_decimal();
        if share >= threshold {
            shares.push(CategoryShare { label, value: amount });
        } else {
            other += amount;
        }
    }
    if other.is_positive() {
        shares.push(CategoryShare { label: OTHER_LABEL.to_string(), value: other });
    }

    Breakdown { shares, total }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn money(s: &str) -> Money {
        Money::parse(s).unwrap()
    }

    fn some_labels(labels: &[&str]) -> Vec<Option<String>> {
        labels.iter().map(|l| Some(l.to_string())).collect()
    }

    fn some_amounts(amounts: &[&str]) -> Vec<Option<Money>> {
        amounts.iter().map(|a| Some(money(a))).collect()
    }

    #[test]
    fn below_threshold_folds_into_other() {
        // Shares 0.50 / 0.30 / 0.15 / 0.05 at threshold 0.10.
        let breakdown = build(
            &some_labels(&["A", "B", "C", "D"]),
            &some_amounts(&["50.00", "30.00", "15.00", "5.00"]),
            Decimal::from_str("0.10").unwrap(),
        );
        assert_eq!(breakdown.total, money("100.00"));
        assert_eq!(breakdown.shares.len(), 3 + 1);
        assert_eq!(breakdown.shares[0].label, "A");
        assert_eq!(breakdown.shares[2].label, "C");
        let other = breakdown.shares.last().unwrap();
        assert_eq!(other.label, OTHER_LABEL);
        assert_eq!(other.value, money("5.00"));
    }

    #[test]
    fn no_other_entry_when_everything_clears_threshold() {
        let breakdown = build(
            &some_labels(&["A", "B"]),
            &some_amounts(&["60.00", "40.00"]),
            default_threshold(),
        );
        assert_eq!(breakdown.shares.len(), 2);
        assert!(breakdown.shares.iter().all(|s| s.label != OTHER_LABEL));
    }

    #[test]
    fn share_values_sum_to_total() {
        let breakdown = build(
            &some_labels(&["A", "B", "C", "D", "E"]),
            &some_amounts(&["97.01", "1.00", "0.99", "0.50", "0.50"]),
            default_threshold(),
        );
        let sum: Money = breakdown.shares.iter().map(|s| s.value).sum();
        assert_eq!(sum, breakdown.total);
    }

    #[test]
    fn missing_amounts_become_placeholder_ones() {
        let breakdown = build(
            &some_labels(&["A", "B", "C"]),
            &[Some(money("5.00")), None, Some(money("2.00"))],
            default_threshold(),
        );
        // Every amount replaced by 1, so all shares are equal thirds.
        assert_eq!(breakdown.total, money("3.00"));
        assert_eq!(breakdown.shares.len(), 3);
        assert!(breakdown.shares.iter().all(|s| s.value == money("1.00")));
    }

    #[test]
    fn missing_labels_become_placeholder_names() {
        let breakdown = build(
            &[Some("A".to_string()), None],
            &some_amounts(&["60.00", "40.00"]),
            default_threshold(),
        );
        assert_eq!(breakdown.shares[0].label, "Company 0");
        assert_eq!(breakdown.shares[1].label, "Company 1");
    }

    #[test]
    fn mismatched_lengths_truncate_to_shorter() {
        let breakdown = build(
            &some_labels(&["A", "B", "C"]),
            &some_amounts(&["60.00", "40.00"]),
            default_threshold(),
        );
        assert_eq!(breakdown.shares.len(), 2);
        assert_eq!(breakdown.total, money("100.00"));
    }

    #[test]
    fn empty_inputs_yield_empty_breakdown() {
        let breakdown = build(&[], &[], default_threshold());
        assert!(breakdown.shares.is_empty());
        assert!(breakdown.total.is_zero());
    }

    #[test]
    fn formatted_total_has_one_decimal_place() {
        let breakdown = build(
            &some_labels(&["A"]),
            &some_amounts(&["1234.56"]),
            default_threshold(),
        );
        assert_eq!(breakdown.formatted_total(), "1234.6");
    }
}
