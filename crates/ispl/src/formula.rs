//! CTL/ATL formulae.

use crate::ids::ENVIRONMENT;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::ops;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Formula {
    /// An evaluation proposition.
    Atom(String),
    GreenStates(String),
    RedStates(String),
    EnvGreenStates,
    EnvRedStates,
    /// `AG`
    AllGlobally(Box<Formula>),
    /// `EG`
    ExistsGlobally(Box<Formula>),
    /// `AX`
    AllNext(Box<Formula>),
    /// `EX`
    ExistsNext(Box<Formula>),
    /// `AF`
    AllEventually(Box<Formula>),
    /// `EF`
    ExistsEventually(Box<Formula>),
    AllUntil(Box<Formula>, Box<Formula>),
    ExistsUntil(Box<Formula>, Box<Formula>),
    /// `<g>X`
    GroupNext(String, Box<Formula>),
    /// `<g>F`
    GroupEventually(String, Box<Formula>),
    /// `<g>G`
    GroupAlways(String, Box<Formula>),
    /// `<g>(l U r)`
    GroupUntil(String, Box<Formula>, Box<Formula>),
    Not(Box<Formula>),
    And(Box<Formula>, Box<Formula>),
    Or(Box<Formula>, Box<Formula>),
    Implies(Box<Formula>, Box<Formula>),
}

impl Formula {
    pub fn atom(prop: impl Into<String>) -> Self {
        Formula::Atom(prop.into())
    }

    pub fn ag(arg: Formula) -> Self {
        Formula::AllGlobally(Box::new(arg))
    }

    pub fn af(arg: Formula) -> Self {
        Formula::AllEventually(Box::new(arg))
    }

    pub fn ef(arg: Formula) -> Self {
        Formula::ExistsEventually(Box::new(arg))
    }

    pub fn group_eventually(group: impl Into<String>, arg: Formula) -> Self {
        Formula::GroupEventually(group.into(), Box::new(arg))
    }

    pub fn or(left: Formula, right: Formula) -> Self {
        Formula::Or(Box::new(left), Box::new(right))
    }

    pub fn and(left: Formula, right: Formula) -> Self {
        Formula::And(Box::new(left), Box::new(right))
    }

    pub fn implies(left: Formula, right: Formula) -> Self {
        Formula::Implies(Box::new(left), Box::new(right))
    }

    /// Direct sub-formulae.
    fn children(&self) -> Vec<&Formula> {
        match self {
            Formula::Atom(_)
            | Formula::GreenStates(_)
            | Formula::RedStates(_)
            | Formula::EnvGreenStates
            | Formula::EnvRedStates => Vec::new(),
            Formula::AllGlobally(a)
            | Formula::ExistsGlobally(a)
            | Formula::AllNext(a)
            | Formula::ExistsNext(a)
            | Formula::AllEventually(a)
            | Formula::ExistsEventually(a)
            | Formula::GroupNext(_, a)
            | Formula::GroupEventually(_, a)
            | Formula::GroupAlways(_, a)
            | Formula::Not(a) => vec![a.as_ref()],
            Formula::AllUntil(l, r)
            | Formula::ExistsUntil(l, r)
            | Formula::GroupUntil(_, l, r)
            | Formula::And(l, r)
            | Formula::Or(l, r)
            | Formula::Implies(l, r) => vec![l.as_ref(), r.as_ref()],
        }
    }

    fn group(&self) -> Option<&str> {
        match self {
            Formula::GroupNext(g, _)
            | Formula::GroupEventually(g, _)
            | Formula::GroupAlways(g, _)
            | Formula::GroupUntil(g, ..) => Some(g),
            _ => None,
        }
    }

    /// A fair formula uses no strategic (`<g>`) operator.
    pub fn is_fair(&self) -> bool {
        self.group().is_none() && self.children().into_iter().all(Formula::is_fair)
    }

    /// Every proposition referenced by an [`Formula::Atom`].
    pub fn atoms(&self) -> BTreeSet<&str> {
        let mut out = BTreeSet::new();
        self.walk(&mut |f| {
            if let Formula::Atom(p) = f {
                out.insert(p.as_str());
            }
        });
        out
    }

    /// Every group quantified over.
    pub fn groups(&self) -> BTreeSet<&str> {
        let mut out = BTreeSet::new();
        self.walk(&mut |f| {
            if let Some(g) = f.group() {
                out.insert(g);
            }
        });
        out
    }

    /// Agents named by `GreenStates`/`RedStates` atoms.
    pub fn agents(&self) -> BTreeSet<&str> {
        let mut out = BTreeSet::new();
        self.walk(&mut |f| {
            if let Formula::GreenStates(a) | Formula::RedStates(a) = f {
                out.insert(a.as_str());
            }
        });
        out
    }

    fn walk<'a>(&'a self, visit: &mut impl FnMut(&'a Formula)) {
        visit(self);
        for child in self.children() {
            child.walk(visit);
        }
    }
}

impl ops::Not for Formula {
    type Output = Formula;

    fn not(self) -> Formula {
        Formula::Not(Box::new(self))
    }
}

impl fmt::Display for Formula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Formula::Atom(p) => f.write_str(p),
            Formula::GreenStates(agent) => write!(f, "{agent}.GreenStates"),
            Formula::RedStates(agent) => write!(f, "{agent}.RedStates"),
            Formula::EnvGreenStates => write!(f, "{ENVIRONMENT}.GreenStates"),
            Formula::EnvRedStates => write!(f, "{ENVIRONMENT}.RedStates"),
            Formula::AllGlobally(a) => write!(f, "(AG ({a}))"),
            Formula::ExistsGlobally(a) => write!(f, "(EG {a})"),
            Formula::AllNext(a) => write!(f, "(AX {a})"),
            Formula::ExistsNext(a) => write!(f, "(EX {a})"),
            Formula::AllEventually(a) => write!(f, "(AF {a})"),
            Formula::ExistsEventually(a) => write!(f, "(EF {a})"),
            Formula::AllUntil(l, r) => write!(f, "(A {l} U {r})"),
            Formula::ExistsUntil(l, r) => write!(f, "(E {l} U {r})"),
            Formula::GroupNext(g, a) => write!(f, "(<{g}>X({a}))"),
            Formula::GroupEventually(g, a) => write!(f, "(<{g}>F({a}))"),
            Formula::GroupAlways(g, a) => write!(f, "(<{g}>G({a}))"),
            Formula::GroupUntil(g, l, r) => write!(f, "(<{g}>({l} U {r}))"),
            Formula::Not(a) => write!(f, "(!{a})"),
            Formula::And(l, r) => write!(f, "({l} and {r})"),
            Formula::Or(l, r) => write!(f, "({l} or {r})"),
            Formula::Implies(l, r) => write!(f, "({l}) -> ({r})"),
        }
    }
}
