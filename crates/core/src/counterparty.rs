use serde::{Deserialize, Serialize};
use std::fmt;

/// Lengths a counterparty tax identifier may legitimately have.
const VALID_ID_LENGTHS: [usize; 2] = [9, 12];

/// A counterparty tax identifier as it appeared in the source table.
/// Malformed identifiers are kept; callers flag them, never reject.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CounterpartyId(pub String);

impl CounterpartyId {
    pub fn new(id: impl Into<String>) -> Self {
        CounterpartyId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the identifier has one of the expected lengths.
    pub fn is_well_formed(&self) -> bool {
        VALID_ID_LENGTHS.contains(&self.0.chars().count())
    }
}

impl fmt::Display for CounterpartyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nine_and_twelve_char_ids_are_well_formed() {
        assert!(CounterpartyId::new("123456789").is_well_formed());
        assert!(CounterpartyId::new("123456789012").is_well_formed());
    }

    #[test]
    fn other_lengths_are_flagged() {
        assert!(!CounterpartyId::new("1234567").is_well_formed());
        assert!(!CounterpartyId::new("1234567890").is_well_formed());
        assert!(!CounterpartyId::new("").is_well_formed());
    }
}
