use bitmc_core::names::{is_name, KEYWORDS};
use bitmc_core::{check_funds, ContractError, Expr, Precondition, TxOutput};
use proptest::prelude::*;
use rust_decimal::Decimal;

fn deposit(amount: i64) -> Precondition {
    Precondition::Deposit {
        participant: "A".to_owned(),
        amount: Decimal::from(amount),
        tx: TxOutput {
            tx_identifier: "txA".to_owned(),
            index: 0,
        },
    }
}

fn split_of(amounts: &[i64]) -> Expr {
    Expr::split(
        amounts
            .iter()
            .map(|&a| (Decimal::from(a), Expr::withdraw("A")))
            .collect(),
    )
}

proptest! {
    #[test]
    fn identifiers_matching_the_pattern_are_names(s in "[A-Za-z_][A-Za-z0-9_]{0,12}") {
        prop_assert_eq!(is_name(&s), !KEYWORDS.contains(&s.as_str()));
    }

    #[test]
    fn leading_digit_is_never_a_name(s in "[0-9][A-Za-z0-9_]{0,8}") {
        prop_assert!(!is_name(&s));
    }

    #[test]
    fn split_accepts_exactly_its_funds(
        amounts in prop::collection::vec(0i64..50, 2..6),
        delta in 1i64..5,
    ) {
        let total: i64 = amounts.iter().sum();
        prop_assert!(check_funds(&[deposit(total)], &split_of(&amounts)).is_ok());

        let err = check_funds(&[deposit(total + delta)], &split_of(&amounts)).unwrap_err();
        prop_assert_eq!(
            err,
            ContractError::SplitMismatch {
                spends: Decimal::from(total),
                receives: Decimal::from(total + delta),
            }
        );
    }
}
