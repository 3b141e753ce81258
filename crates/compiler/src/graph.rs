//! Execution graph: the contract tree linearised into addressable nodes.
//!
//! `After` and `Auth` never become nodes. They accumulate on the way down
//! and are stamped on the next node below them. Nodes are numbered in
//! post-order, so every id in a subtree is below the subtree root's id.
//! Generated model identifiers derive from these ids.

use crate::error::CompileError;
use bitmc_core::{Contract, ContractError, Expr, Precondition};
use rust_decimal::Decimal;
use std::collections::{BTreeSet, HashMap};
use tracing::debug;

pub type NodeId = usize;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    Withdraw { participant: String },
    Choice,
    Put { deposit_ids: Vec<String> },
    Reveal { secret_ids: Vec<String> },
    PutReveal {
        deposit_ids: Vec<String>,
        secret_ids: Vec<String>,
    },
    Split,
}

impl NodeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::Withdraw { .. } => "withdraw",
            NodeKind::Choice => "choice",
            NodeKind::Put { .. } => "put",
            NodeKind::Reveal { .. } => "reveal",
            NodeKind::PutReveal { .. } => "putreveal",
            NodeKind::Split => "split",
        }
    }

    pub fn is_choice(&self) -> bool {
        matches!(self, NodeKind::Choice)
    }

    pub fn deposit_ids(&self) -> &[String] {
        match self {
            NodeKind::Put { deposit_ids } | NodeKind::PutReveal { deposit_ids, .. } => deposit_ids,
            _ => &[],
        }
    }

    pub fn secret_ids(&self) -> &[String] {
        match self {
            NodeKind::Reveal { secret_ids } | NodeKind::PutReveal { secret_ids, .. } => secret_ids,
            _ => &[],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub id: NodeId,
    pub kind: NodeKind,
    /// Participants whose authorization the node waits for.
    pub auths: BTreeSet<String>,
    /// Timeouts the node waits for.
    pub afters: BTreeSet<u32>,
    /// Funds held by the contract when the node executes.
    pub funds: Decimal,
    pub children: Vec<NodeId>,
    pub parent: Option<NodeId>,
}

impl Node {
    /// `node_<id>`
    pub fn name(&self) -> String {
        format!("node_{}", self.id)
    }

    /// `node_<id>_<kind>`, the stem of every identifier generated for the node.
    pub fn full_id(&self) -> String {
        format!("{}_{}", self.name(), self.kind.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionGraph {
    nodes: Vec<Node>,
    root: NodeId,
    timeouts: BTreeSet<u32>,
}

impl ExecutionGraph {
    pub fn build(contract: &Contract) -> Result<Self, CompileError> {
        let mut volatile = HashMap::new();
        let mut persistent = Decimal::ZERO;
        for prec in contract.preconditions() {
            match prec {
                Precondition::Deposit { amount, .. } => {
                    persistent = persistent
                        .checked_add(*amount)
                        .ok_or_else(|| CompileError::overflow("total of the deposits"))?;
                }
                Precondition::VolatileDeposit {
                    deposit_id, amount, ..
                } => {
                    volatile.insert(deposit_id.as_str(), *amount);
                }
                Precondition::Fee { .. } | Precondition::Secret { .. } => {}
            }
        }

        let mut builder = GraphBuilder {
            nodes: Vec::new(),
            timeouts: BTreeSet::new(),
            volatile,
        };
        let root = builder.visit(contract.root(), Guards::default(), persistent)?;
        debug!(
            nodes = builder.nodes.len(),
            timeouts = ?builder.timeouts,
            "execution graph built"
        );
        Ok(ExecutionGraph {
            nodes: builder.nodes,
            root,
            timeouts: builder.timeouts,
        })
    }

    /// Nodes in id order.
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id]
    }

    pub fn root(&self) -> &Node {
        &self.nodes[self.root]
    }

    pub fn parent(&self, node: &Node) -> Option<&Node> {
        node.parent.map(|p| &self.nodes[p])
    }

    /// Closest ancestor that is not a `Choice`. A choice has no execution
    /// state of its own, so this is what "the parent was executed" refers to.
    pub fn executable_ancestor(&self, node: &Node) -> Option<&Node> {
        let mut cur = self.parent(node);
        while let Some(n) = cur {
            if !n.kind.is_choice() {
                return Some(n);
            }
            cur = self.parent(n);
        }
        None
    }

    /// Branches that exclude `node`: the other branches of the `Choice`
    /// directly above it, and of every `Choice` directly above that one.
    /// `None` when `node` is not a choice branch.
    pub fn choice_siblings(&self, node: &Node) -> Option<Vec<&Node>> {
        let mut siblings = Vec::new();
        let mut cur = node;
        while let Some(parent) = self.parent(cur).filter(|p| p.kind.is_choice()) {
            siblings.extend(
                parent
                    .children
                    .iter()
                    .filter(|&&c| c != cur.id)
                    .map(|&c| &self.nodes[c]),
            );
            cur = parent;
        }
        (!siblings.is_empty()).then_some(siblings)
    }

    pub fn timeouts(&self) -> &BTreeSet<u32> {
        &self.timeouts
    }

    pub fn has_timeouts(&self) -> bool {
        !self.timeouts.is_empty()
    }

    pub fn max_timeout(&self) -> Option<u32> {
        self.timeouts.last().copied()
    }
}

/// `Auth` and `After` requirements accumulated above the next node.
#[derive(Debug, Default, Clone)]
struct Guards {
    auths: BTreeSet<String>,
    afters: BTreeSet<u32>,
}

impl Guards {
    fn is_empty(&self) -> bool {
        self.auths.is_empty() && self.afters.is_empty()
    }
}

struct GraphBuilder<'a> {
    nodes: Vec<Node>,
    timeouts: BTreeSet<u32>,
    volatile: HashMap<&'a str, Decimal>,
}

impl GraphBuilder<'_> {
    fn visit(
        &mut self,
        expr: &Expr,
        mut guards: Guards,
        funds: Decimal,
    ) -> Result<NodeId, CompileError> {
        match expr {
            Expr::Withdraw { participant } => Ok(self.push(
                NodeKind::Withdraw {
                    participant: participant.clone(),
                },
                guards,
                funds,
                Vec::new(),
            )),
            Expr::Auth {
                participant,
                branch,
            } => {
                guards.auths.insert(participant.clone());
                self.visit(branch, guards, funds)
            }
            Expr::After { timeout, branch } => {
                guards.afters.insert(*timeout);
                self.visit(branch, guards, funds)
            }
            Expr::Choice { branches } => {
                if !guards.is_empty() {
                    return Err(CompileError::unsupported(
                        "authorization or timeout guard directly above a choice",
                    ));
                }
                let children = branches
                    .iter()
                    .map(|b| self.visit(b, Guards::default(), funds))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(self.push(NodeKind::Choice, guards, funds, children))
            }
            Expr::Split { branches } => {
                let children = branches
                    .iter()
                    .map(|b| self.visit(&b.branch, Guards::default(), b.amount))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(self.push(NodeKind::Split, guards, funds, children))
            }
            Expr::Put {
                deposit_ids,
                branch,
            } => {
                let child_funds = self.with_deposits(funds, deposit_ids)?;
                let child = self.visit(branch, Guards::default(), child_funds)?;
                let kind = NodeKind::Put {
                    deposit_ids: deposit_ids.clone(),
                };
                Ok(self.push(kind, guards, funds, vec![child]))
            }
            Expr::PutReveal {
                deposit_ids,
                secret_ids,
                branch,
            } => {
                let child_funds = self.with_deposits(funds, deposit_ids)?;
                let child = self.visit(branch, Guards::default(), child_funds)?;
                let kind = NodeKind::PutReveal {
                    deposit_ids: deposit_ids.clone(),
                    secret_ids: secret_ids.clone(),
                };
                Ok(self.push(kind, guards, funds, vec![child]))
            }
            Expr::Reveal { secret_ids, branch } => {
                let child = self.visit(branch, Guards::default(), funds)?;
                let kind = NodeKind::Reveal {
                    secret_ids: secret_ids.clone(),
                };
                Ok(self.push(kind, guards, funds, vec![child]))
            }
            Expr::RevealIf { .. } | Expr::PutRevealIf { .. } => {
                Err(CompileError::unsupported(expr.keyword()))
            }
        }
    }

    fn with_deposits(
        &self,
        funds: Decimal,
        deposit_ids: &[String],
    ) -> Result<Decimal, CompileError> {
        deposit_ids.iter().try_fold(funds, |acc, id| {
            let amount = self.volatile.get(id.as_str()).ok_or_else(|| {
                ContractError::VolatileDepositNotDefined {
                    deposit_id: id.clone(),
                }
            })?;
            acc.checked_add(*amount)
                .ok_or_else(|| CompileError::overflow("funds after put"))
        })
    }

    fn push(
        &mut self,
        kind: NodeKind,
        guards: Guards,
        funds: Decimal,
        children: Vec<NodeId>,
    ) -> NodeId {
        let id = self.nodes.len();
        for &child in &children {
            self.nodes[child].parent = Some(id);
        }
        self.timeouts.extend(guards.afters.iter().copied());
        self.nodes.push(Node {
            id,
            kind,
            auths: guards.auths,
            afters: guards.afters,
            funds,
            children,
            parent: None,
        });
        id
    }
}
