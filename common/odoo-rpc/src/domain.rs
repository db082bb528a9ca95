//! Search expressions ("domains")
//!
//! A domain is a flat list of condition triples, implicitly AND-combined,
//! optionally interleaved with prefix operators: `&` and `|` consume the two
//! expressions that follow, `!` consumes one.
//!
//! ```rust,ignore
//! // state = 'sale' AND (partner_id = 7 OR user_id = 2)
//! let domain = Domain::new()
//!     .condition("state", "=", "sale")
//!     .or()
//!     .condition("partner_id", "=", 7)
//!     .condition("user_id", "=", 2);
//! ```

use serde::ser::{Serialize, SerializeSeq, Serializer};
use serde_json::Value;

/// One element of a domain
#[derive(Debug, Clone, PartialEq)]
pub enum Term {
    /// `&` - both of the next two expressions
    And,
    /// `|` - either of the next two expressions
    Or,
    /// `!` - negation of the next expression
    Not,
    /// `(field, operator, value)`
    Condition {
        field: String,
        operator: String,
        value: Value,
    },
}

impl Term {
    /// Number of operands a prefix operator consumes (0 for conditions)
    fn arity(&self) -> usize {
        match self {
            Term::And | Term::Or => 2,
            Term::Not => 1,
            Term::Condition { .. } => 0,
        }
    }
}

impl Serialize for Term {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Term::And => serializer.serialize_str("&"),
            Term::Or => serializer.serialize_str("|"),
            Term::Not => serializer.serialize_str("!"),
            Term::Condition {
                field,
                operator,
                value,
            } => {
                let mut seq = serializer.serialize_seq(Some(3))?;
                seq.serialize_element(field)?;
                seq.serialize_element(operator)?;
                seq.serialize_element(value)?;
                seq.end()
            }
        }
    }
}

/// Ordered search expression
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Domain {
    terms: Vec<Term>,
}

impl Domain {
    /// Empty domain (matches every record)
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a condition, builder style
    pub fn condition(mut self, field: &str, operator: &str, value: impl Into<Value>) -> Self {
        self.push(field, operator, value);
        self
    }

    /// Append a condition in place
    pub fn push(&mut self, field: &str, operator: &str, value: impl Into<Value>) {
        self.terms.push(Term::Condition {
            field: field.to_string(),
            operator: operator.to_string(),
            value: value.into(),
        });
    }

    /// Append a `&` prefix operator
    pub fn and(mut self) -> Self {
        self.terms.push(Term::And);
        self
    }

    /// Append a `|` prefix operator
    pub fn or(mut self) -> Self {
        self.terms.push(Term::Or);
        self
    }

    /// Append a `!` prefix operator
    pub fn not(mut self) -> Self {
        self.terms.push(Term::Not);
        self
    }

    /// Append every term of another domain
    pub fn extend(&mut self, other: Domain) {
        self.terms.extend(other.terms);
    }

    pub fn terms(&self) -> &[Term] {
        &self.terms
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    /// Check that every prefix operator has enough operands after it
    pub fn arity_ok(&self) -> bool {
        let mut available = 0usize;
        for term in self.terms.iter().rev() {
            match term.arity() {
                0 => available += 1,
                n if available >= n => available = available - n + 1,
                _ => return false,
            }
        }
        true
    }

    /// Wire form: a list of lists and operator strings
    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or_else(|_| Value::Array(Vec::new()))
    }
}

impl Serialize for Domain {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.terms.len()))?;
        for term in &self.terms {
            seq.serialize_element(term)?;
        }
        seq.end()
    }
}

impl From<Domain> for Value {
    fn from(domain: Domain) -> Self {
        domain.to_value()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_conditions_serialize_as_triples() {
        let domain = Domain::new()
            .condition("name", "=", "Acme")
            .condition("id", "in", json!([1, 2]));
        assert_eq!(
            domain.to_value(),
            json!([["name", "=", "Acme"], ["id", "in", [1, 2]]])
        );
    }

    #[test]
    fn test_prefix_operators_keep_order() {
        let domain = Domain::new()
            .and()
            .condition("start_datetime", "<=", "2024-01-31 22:59:59")
            .condition("stop_datetime", ">=", "2023-12-31 23:00:00");
        assert_eq!(
            domain.to_value(),
            json!([
                "&",
                ["start_datetime", "<=", "2024-01-31 22:59:59"],
                ["stop_datetime", ">=", "2023-12-31 23:00:00"]
            ])
        );
        assert!(domain.arity_ok());
    }

    #[test]
    fn test_arity_check() {
        assert!(Domain::new().arity_ok());
        assert!(Domain::new().not().condition("active", "=", true).arity_ok());
        assert!(!Domain::new().or().condition("a", "=", 1).arity_ok());
        assert!(!Domain::new().condition("a", "=", 1).not().arity_ok());
        assert!(Domain::new()
            .or()
            .and()
            .condition("a", "=", 1)
            .condition("b", "=", 2)
            .condition("c", "=", 3)
            .arity_ok());
    }

    #[test]
    fn test_extend_and_len() {
        let mut domain = Domain::new().condition("state", "=", "sale");
        domain.extend(Domain::new().condition("partner_id", "=", 7));
        assert_eq!(domain.len(), 2);
        assert!(!domain.is_empty());
    }
}
