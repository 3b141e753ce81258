//! Property tests over generated contract trees: graph numbering, funds
//! bookkeeping and determinism of the full compilation.

use bitmc_compiler::{Compiler, ExecutionGraph, NodeKind};
use bitmc_core::{Contract, Expr, Participant, Precondition, TxOutput};
use bitmc_ispl::{to_ispl, Formula};
use proptest::prelude::*;
use rust_decimal::Decimal;

const PARTICIPANTS: [&str; 3] = ["A", "B", "C"];
const FUNDS: i64 = 12;

/// Tree shape without amounts; amounts are filled in by [`realise`] so that
/// every split spends exactly what it receives.
#[derive(Debug, Clone)]
enum Shape {
    Withdraw(usize),
    Auth(usize, Box<Shape>),
    After(u32, Box<Shape>),
    Choice(Vec<Shape>),
    Split(Vec<Shape>),
}

fn shape() -> impl Strategy<Value = Shape> {
    let leaf = (0..PARTICIPANTS.len()).prop_map(Shape::Withdraw);
    leaf.prop_recursive(4, 24, 3, |inner| {
        prop_oneof![
            (0..PARTICIPANTS.len(), inner.clone()).prop_map(|(p, s)| Shape::Auth(p, Box::new(s))),
            (0u32..6, inner.clone()).prop_map(|(t, s)| Shape::After(t, Box::new(s))),
            prop::collection::vec(inner.clone(), 2..4).prop_map(Shape::Choice),
            prop::collection::vec(inner, 2..4).prop_map(Shape::Split),
        ]
    })
}

/// Builds a well-funded expression from `shape` for `funds` coins.
///
/// Guards directly above a choice are dropped and splits that cannot give
/// every branch at least one coin become choices.
fn realise(shape: &Shape, funds: i64) -> Expr {
    match shape {
        Shape::Withdraw(p) => Expr::withdraw(PARTICIPANTS[*p]),
        Shape::Auth(p, s) => guard(s, funds, |e| Expr::auth(PARTICIPANTS[*p], e)),
        Shape::After(t, s) => guard(s, funds, |e| Expr::after(*t, e)),
        Shape::Choice(branches) => {
            Expr::choice(branches.iter().map(|b| realise(b, funds)).collect())
        }
        Shape::Split(branches) => {
            let k = branches.len() as i64;
            if funds < k {
                return Expr::choice(branches.iter().map(|b| realise(b, funds)).collect());
            }
            let last = funds - (k - 1);
            Expr::split(
                branches
                    .iter()
                    .enumerate()
                    .map(|(i, b)| {
                        let amount = if i as i64 == k - 1 { last } else { 1 };
                        (Decimal::from(amount), realise(b, amount))
                    })
                    .collect(),
            )
        }
    }
}

fn guard(inner: &Shape, funds: i64, wrap: impl Fn(Expr) -> Expr) -> Expr {
    let body = realise(inner, funds);
    if matches!(body, Expr::Choice { .. }) {
        body
    } else {
        wrap(body)
    }
}

fn contract(root: Expr) -> Contract {
    let participants = PARTICIPANTS
        .iter()
        .enumerate()
        .map(|(i, id)| Participant {
            identifier: (*id).to_owned(),
            pubkey: format!("{:02x}", i + 1),
        })
        .collect();
    let deposit = Precondition::Deposit {
        participant: "A".to_owned(),
        amount: Decimal::from(FUNDS),
        tx: TxOutput {
            tx_identifier: "t0".to_owned(),
            index: 0,
        },
    };
    Contract::new(participants, vec![deposit], root).unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn children_are_numbered_before_their_parent(s in shape()) {
        let graph = ExecutionGraph::build(&contract(realise(&s, FUNDS))).unwrap();
        let nodes = graph.nodes();
        prop_assert_eq!(graph.root().id, nodes.len() - 1);
        prop_assert!(graph.root().parent.is_none());
        for (i, node) in nodes.iter().enumerate() {
            prop_assert_eq!(node.id, i);
            for &c in &node.children {
                prop_assert!(c < node.id);
                prop_assert_eq!(nodes[c].parent, Some(node.id));
            }
        }
    }

    #[test]
    fn funds_are_conserved_along_the_graph(s in shape()) {
        let graph = ExecutionGraph::build(&contract(realise(&s, FUNDS))).unwrap();
        prop_assert_eq!(graph.root().funds, Decimal::from(FUNDS));
        for node in graph.nodes() {
            match node.kind {
                NodeKind::Split => {
                    let sum: Decimal = node.children.iter().map(|&c| graph.node(c).funds).sum();
                    prop_assert_eq!(sum, node.funds);
                }
                NodeKind::Choice => {
                    for &c in &node.children {
                        prop_assert_eq!(graph.node(c).funds, node.funds);
                    }
                }
                _ => {}
            }
            prop_assert!(node.funds > Decimal::ZERO);
        }
    }

    #[test]
    fn timeouts_are_collected_from_every_node(s in shape()) {
        let graph = ExecutionGraph::build(&contract(realise(&s, FUNDS))).unwrap();
        let stamped: std::collections::BTreeSet<u32> = graph
            .nodes()
            .iter()
            .flat_map(|n| n.afters.iter().copied())
            .collect();
        prop_assert_eq!(&stamped, graph.timeouts());
        prop_assert_eq!(graph.max_timeout(), stamped.last().copied());
    }

    #[test]
    fn compilation_is_deterministic(s in shape()) {
        let compiler = Compiler::new(
            contract(realise(&s, FUNDS)),
            vec![Formula::ef(Formula::atom("contract_is_initialized"))],
        )
        .unwrap();
        let first = to_ispl(&compiler.compile().unwrap());
        let second = to_ispl(&compiler.compile().unwrap());
        prop_assert_eq!(first, second);
    }
}
