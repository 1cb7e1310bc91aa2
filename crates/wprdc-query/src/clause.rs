//! WHERE-clause validation.
//!
//! A clause is accepted when at least one of its whitespace-separated tokens
//! is a comparison operator. Nothing else about the clause is checked.

use thiserror::Error;

/// Operator tokens recognised in a WHERE-clause fragment. Keywords are
/// upper-case; tokens are upper-cased before comparison.
pub const OPERATORS: &[&str] = &[
    "=", ">", "<", ">=", "<=", "<>", "!=", "BETWEEN", "LIKE", "IN",
];

/// Construction-time errors raised while assembling a query.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ClauseError {
    #[error("No operator found in the WHERE clause {clause}.")]
    MissingOperator { clause: String },
}

/// Check that `clause` asserts at least one comparison.
///
/// `"DogName" LIKE 'DOGZ%'` passes, `"DogName" 'DOGZ%'` does not. A token
/// must be an operator on its own: `"x"=1` has no standalone `=` and fails.
pub fn validate_where_clause(clause: &str) -> Result<(), ClauseError> {
    let has_operator = clause
        .split_whitespace()
        .map(str::to_uppercase)
        .any(|token| OPERATORS.contains(&token.as_str()));

    if has_operator {
        Ok(())
    } else {
        Err(ClauseError::MissingOperator {
            clause: clause.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn accepts_like() {
        assert!(validate_where_clause(r#""DogName" LIKE 'DOGZ%'"#).is_ok());
    }

    #[test]
    fn keywords_are_case_insensitive() {
        assert!(validate_where_clause(r#""Breed" like 'POODLE%'"#).is_ok());
        assert!(validate_where_clause(r#""ExpYear" between 2020 AND 2030"#).is_ok());
        assert!(validate_where_clause(r#""OwnerZip" in ('15102', '15213')"#).is_ok());
    }

    #[test]
    fn accepts_every_symbolic_operator() {
        for op in ["=", ">", "<", ">=", "<=", "<>", "!="] {
            let clause = format!(r#""x" {op} 1"#);
            assert!(validate_where_clause(&clause).is_ok(), "rejected: {clause}");
        }
    }

    #[test]
    fn rejects_clause_without_operator() {
        let err = validate_where_clause(r#""DogName" 'DOGZ%'"#).unwrap_err();
        assert_eq!(
            err,
            ClauseError::MissingOperator {
                clause: r#""DogName" 'DOGZ%'"#.to_string()
            }
        );
        assert!(err.to_string().contains("No operator found"));
    }

    #[test]
    fn operator_must_be_its_own_token() {
        assert!(validate_where_clause(r#""x"=1"#).is_err());
        assert!(validate_where_clause("LIKELY").is_err());
    }

    #[test]
    fn malformed_sql_with_operator_passes() {
        // Only operator presence is checked.
        assert!(validate_where_clause("= = =").is_ok());
    }

    #[test]
    fn empty_clause_is_rejected() {
        assert!(validate_where_clause("").is_err());
        assert!(validate_where_clause("   ").is_err());
    }

    proptest! {
        #[test]
        fn any_clause_containing_an_operator_token_passes(
            lhs in "[a-z_]{1,12}",
            rhs in "[0-9]{1,6}",
            idx in 0..OPERATORS.len(),
            lower in any::<bool>(),
        ) {
            let op = if lower {
                OPERATORS[idx].to_lowercase()
            } else {
                OPERATORS[idx].to_string()
            };
            let clause = format!("\"{lhs}\" {op} {rhs}");
            prop_assert!(validate_where_clause(&clause).is_ok());
        }

        #[test]
        fn clauses_of_plain_words_fail(words in proptest::collection::vec("[a-z\"']{1,8}", 0..6)) {
            prop_assume!(words
                .iter()
                .all(|w| !OPERATORS.contains(&w.to_uppercase().as_str())));
            let clause = words.join(" ");
            prop_assert!(validate_where_clause(&clause).is_err());
        }
    }
}
