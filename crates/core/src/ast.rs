//! Contract AST types.
//!
//! These are the in-memory shapes handed over by a front end (or read from
//! JSON). Nothing here is validated on its own: [`crate::Contract::new`]
//! runs both validation passes before a contract can be used.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

// ──────────────────────────────────────────────
// Participants and transaction outputs
// ──────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub identifier: String,
    /// Lowercase hex-encoded public key.
    pub pubkey: String,
}

/// A transaction output locked by a deposit-like precondition.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TxOutput {
    pub tx_identifier: String,
    pub index: u32,
}

impl fmt::Display for TxOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.tx_identifier, self.index)
    }
}

// ──────────────────────────────────────────────
// Preconditions
// ──────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Precondition {
    Deposit {
        participant: String,
        amount: Decimal,
        tx: TxOutput,
    },
    VolatileDeposit {
        participant: String,
        deposit_id: String,
        amount: Decimal,
        tx: TxOutput,
    },
    Fee {
        participant: String,
        amount: Decimal,
        tx: TxOutput,
    },
    Secret {
        participant: String,
        secret_id: String,
        secret_hash: String,
    },
}

impl Precondition {
    pub fn participant(&self) -> &str {
        match self {
            Precondition::Deposit { participant, .. }
            | Precondition::VolatileDeposit { participant, .. }
            | Precondition::Fee { participant, .. }
            | Precondition::Secret { participant, .. } => participant,
        }
    }

    /// The transaction output this precondition locks, if any.
    pub fn tx(&self) -> Option<&TxOutput> {
        match self {
            Precondition::Deposit { tx, .. }
            | Precondition::VolatileDeposit { tx, .. }
            | Precondition::Fee { tx, .. } => Some(tx),
            Precondition::Secret { .. } => None,
        }
    }
}

impl fmt::Display for Precondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Precondition::Deposit {
                participant,
                amount,
                tx,
            } => write!(f, "(deposit \"{participant}\" {amount} \"{tx}\")"),
            Precondition::VolatileDeposit {
                participant,
                deposit_id,
                amount,
                tx,
            } => write!(
                f,
                "(vol-deposit \"{participant}\" {deposit_id} {amount} \"{tx}\")"
            ),
            Precondition::Fee {
                participant,
                amount,
                tx,
            } => write!(f, "(fee \"{participant}\" {amount} \"{tx}\")"),
            Precondition::Secret {
                participant,
                secret_id,
                secret_hash,
            } => write!(f, "(secret \"{participant}\" {secret_id} \"{secret_hash}\")"),
        }
    }
}

// ──────────────────────────────────────────────
// Predicates over secrets
// ──────────────────────────────────────────────

/// Arithmetic term used inside a [`Predicate`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Term {
    Int { value: i64 },
    /// The length of a committed secret.
    Secret { secret_id: String },
    Plus { left: Box<Term>, right: Box<Term> },
    Minus { left: Box<Term>, right: Box<Term> },
}

impl Term {
    /// Push every secret id mentioned by this term onto `out`.
    pub fn collect_secrets<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Term::Int { .. } => {}
            Term::Secret { secret_id } => out.push(secret_id),
            Term::Plus { left, right } | Term::Minus { left, right } => {
                left.collect_secrets(out);
                right.collect_secrets(out);
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Predicate {
    Eq { left: Term, right: Term },
    Ne { left: Term, right: Term },
    Lt { left: Term, right: Term },
    Le { left: Term, right: Term },
    Gt { left: Term, right: Term },
    Ge { left: Term, right: Term },
    Between { arg: Term, left: Term, right: Term },
    Not { arg: Box<Predicate> },
    And { left: Box<Predicate>, right: Box<Predicate> },
    Or { left: Box<Predicate>, right: Box<Predicate> },
}

impl Predicate {
    pub fn collect_secrets<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Predicate::Eq { left, right }
            | Predicate::Ne { left, right }
            | Predicate::Lt { left, right }
            | Predicate::Le { left, right }
            | Predicate::Gt { left, right }
            | Predicate::Ge { left, right } => {
                left.collect_secrets(out);
                right.collect_secrets(out);
            }
            Predicate::Between { arg, left, right } => {
                arg.collect_secrets(out);
                left.collect_secrets(out);
                right.collect_secrets(out);
            }
            Predicate::Not { arg } => arg.collect_secrets(out),
            Predicate::And { left, right } | Predicate::Or { left, right } => {
                left.collect_secrets(out);
                right.collect_secrets(out);
            }
        }
    }
}

// ──────────────────────────────────────────────
// Contract expressions
// ──────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SplitBranch {
    pub amount: Decimal,
    pub branch: Expr,
}

/// A contract expression. The root of a contract is one of these.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Expr {
    Withdraw {
        participant: String,
    },
    After {
        timeout: u32,
        branch: Box<Expr>,
    },
    Choice {
        branches: Vec<Expr>,
    },
    Auth {
        participant: String,
        branch: Box<Expr>,
    },
    Split {
        branches: Vec<SplitBranch>,
    },
    Put {
        deposit_ids: Vec<String>,
        branch: Box<Expr>,
    },
    PutReveal {
        deposit_ids: Vec<String>,
        secret_ids: Vec<String>,
        branch: Box<Expr>,
    },
    PutRevealIf {
        deposit_ids: Vec<String>,
        secret_ids: Vec<String>,
        predicate: Predicate,
        branch: Box<Expr>,
    },
    RevealIf {
        secret_ids: Vec<String>,
        predicate: Predicate,
        branch: Box<Expr>,
    },
    Reveal {
        secret_ids: Vec<String>,
        branch: Box<Expr>,
    },
}

impl Expr {
    /// Keyword naming this expression kind, as written in contract source.
    pub fn keyword(&self) -> &'static str {
        match self {
            Expr::Withdraw { .. } => "withdraw",
            Expr::After { .. } => "after",
            Expr::Choice { .. } => "choice",
            Expr::Auth { .. } => "auth",
            Expr::Split { .. } => "split",
            Expr::Put { .. } => "put",
            Expr::PutReveal { .. } => "putreveal",
            Expr::PutRevealIf { .. } => "putrevealif",
            Expr::RevealIf { .. } => "revealif",
            Expr::Reveal { .. } => "reveal",
        }
    }

    /// Direct sub-expressions, left to right.
    pub fn children(&self) -> Vec<&Expr> {
        match self {
            Expr::Withdraw { .. } => Vec::new(),
            Expr::Choice { branches } => branches.iter().collect(),
            Expr::Split { branches } => branches.iter().map(|b| &b.branch).collect(),
            Expr::After { branch, .. }
            | Expr::Auth { branch, .. }
            | Expr::Put { branch, .. }
            | Expr::PutReveal { branch, .. }
            | Expr::PutRevealIf { branch, .. }
            | Expr::RevealIf { branch, .. }
            | Expr::Reveal { branch, .. } => vec![branch.as_ref()],
        }
    }

    /// Volatile deposit ids consumed by a `put`-family expression.
    pub fn deposit_ids(&self) -> &[String] {
        match self {
            Expr::Put { deposit_ids, .. }
            | Expr::PutReveal { deposit_ids, .. }
            | Expr::PutRevealIf { deposit_ids, .. } => deposit_ids,
            _ => &[],
        }
    }

    /// Secret ids revealed by a `reveal`-family expression.
    pub fn secret_ids(&self) -> &[String] {
        match self {
            Expr::PutReveal { secret_ids, .. }
            | Expr::PutRevealIf { secret_ids, .. }
            | Expr::RevealIf { secret_ids, .. }
            | Expr::Reveal { secret_ids, .. } => secret_ids,
            _ => &[],
        }
    }
}

// ── Construction helpers ─────────────────────────────────────────────

impl Expr {
    pub fn withdraw(participant: impl Into<String>) -> Self {
        Expr::Withdraw {
            participant: participant.into(),
        }
    }

    pub fn after(timeout: u32, branch: Expr) -> Self {
        Expr::After {
            timeout,
            branch: Box::new(branch),
        }
    }

    pub fn auth(participant: impl Into<String>, branch: Expr) -> Self {
        Expr::Auth {
            participant: participant.into(),
            branch: Box::new(branch),
        }
    }

    pub fn choice(branches: Vec<Expr>) -> Self {
        Expr::Choice { branches }
    }

    pub fn split(branches: Vec<(Decimal, Expr)>) -> Self {
        Expr::Split {
            branches: branches
                .into_iter()
                .map(|(amount, branch)| SplitBranch { amount, branch })
                .collect(),
        }
    }

    pub fn put(deposit_ids: &[&str], branch: Expr) -> Self {
        Expr::Put {
            deposit_ids: to_owned_ids(deposit_ids),
            branch: Box::new(branch),
        }
    }

    pub fn put_reveal(deposit_ids: &[&str], secret_ids: &[&str], branch: Expr) -> Self {
        Expr::PutReveal {
            deposit_ids: to_owned_ids(deposit_ids),
            secret_ids: to_owned_ids(secret_ids),
            branch: Box::new(branch),
        }
    }

    pub fn reveal(secret_ids: &[&str], branch: Expr) -> Self {
        Expr::Reveal {
            secret_ids: to_owned_ids(secret_ids),
            branch: Box::new(branch),
        }
    }
}

fn to_owned_ids(ids: &[&str]) -> Vec<String> {
    ids.iter().map(|s| (*s).to_owned()).collect()
}
