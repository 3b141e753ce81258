//! Generated identifiers.
//!
//! These names are part of the interface with downstream tooling (formulae
//! are written against them), so they must stay stable.

use std::fmt;

pub const NOP: &str = "nop";
pub const DELAY: &str = "delay";
pub const INITIALIZE_CONTRACT: &str = "initialize_contract";

pub const LAST_ACTION: &str = "last_action";
pub const UNSET_ACTION: &str = "unset";
pub const CONTRACT_FUNDS: &str = "contract_funds";
pub const CONTRACT_INITIALIZED: &str = "contract_initialized";
pub const TIME: &str = "time";
pub const DUMMY_VAR: &str = "dummy";

pub const CONTRACT_IS_INITIALIZED: &str = "contract_is_initialized";
pub const TIME_PROGRESSES_FOREVER: &str = "time_progresses_forever";
pub const TIME_REACHES_MAXIMUM: &str = "time_reaches_maximum";

pub const PARTICIPANTS_GROUP: &str = "Participants";
pub const ENV_GROUP: &str = "Env";
pub const PARTICIPANTS_AND_ENV_GROUP: &str = "ParticipantsAndEnv";

// ── Enumerated values ────────────────────────────────────────────────

/// Lifecycle of an execution node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeStatus {
    Disabled,
    Enabled,
    Executed,
}

impl NodeStatus {
    pub const ALL: [NodeStatus; 3] = [
        NodeStatus::Disabled,
        NodeStatus::Enabled,
        NodeStatus::Executed,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            NodeStatus::Disabled => "disabled",
            NodeStatus::Enabled => "enabled",
            NodeStatus::Executed => "executed",
        }
    }
}

/// A secret as seen by everybody.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PublicSecret {
    Committed,
    NotCommitted,
    Valid,
}

impl PublicSecret {
    pub const ALL: [PublicSecret; 3] = [
        PublicSecret::Committed,
        PublicSecret::NotCommitted,
        PublicSecret::Valid,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            PublicSecret::Committed => "committed",
            PublicSecret::NotCommitted => "not_committed",
            PublicSecret::Valid => "valid",
        }
    }
}

/// A secret as seen by its owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrivateSecret {
    Valid,
    Invalid,
    NotCommitted,
}

impl PrivateSecret {
    pub const ALL: [PrivateSecret; 3] = [
        PrivateSecret::Valid,
        PrivateSecret::Invalid,
        PrivateSecret::NotCommitted,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            PrivateSecret::Valid => "valid",
            PrivateSecret::Invalid => "invalid",
            PrivateSecret::NotCommitted => "not_committed",
        }
    }
}

macro_rules! display_as_str {
    ($($t:ty),*) => {
        $(impl fmt::Display for $t {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        })*
    };
}

display_as_str!(NodeStatus, PublicSecret, PrivateSecret);

// ── Participants and scheduling ──────────────────────────────────────

pub fn agent_name(participant: &str) -> String {
    format!("Agent_{participant}")
}

fn part(participant: &str) -> String {
    format!("part_{participant}")
}

pub fn schedule_action(participant: &str) -> String {
    format!("schedule_{}", part(participant))
}

pub fn scheduled_prop(participant: &str) -> String {
    format!("{}_is_scheduled", part(participant))
}

/// Value of `last_action` after the environment took `action`.
pub fn action_value(action: &str) -> String {
    format!("action_{action}")
}

/// Environment variable, and proposition, for the time-step barrier.
pub fn done_var(participant: &str) -> String {
    format!("{}_is_done", part(participant))
}

pub fn timeout_expired_prop(timeout: u32) -> String {
    format!("timeout_{timeout}_has_expired")
}

// ── Deposits and secrets ─────────────────────────────────────────────

pub fn total_deposits_var(participant: &str) -> String {
    format!("{}_total_deposits", part(participant))
}

pub fn spent_var(deposit_id: &str) -> String {
    format!("spent_deposit_{deposit_id}")
}

fn secret(secret_id: &str) -> String {
    format!("secret_{secret_id}")
}

pub fn public_secret_var(secret_id: &str) -> String {
    format!("public_{}", secret(secret_id))
}

pub fn private_secret_var(secret_id: &str) -> String {
    format!("private_{}", secret(secret_id))
}

pub fn public_secret_prop(secret_id: &str, value: PublicSecret) -> String {
    format!("{}_is_{value}", public_secret_var(secret_id))
}

pub fn private_secret_prop(secret_id: &str, value: PrivateSecret) -> String {
    format!("{}_is_{value}", private_secret_var(secret_id))
}

pub fn commit_valid_action(secret_id: &str) -> String {
    format!("commit_valid_{}", secret(secret_id))
}

pub fn commit_invalid_action(secret_id: &str) -> String {
    format!("commit_invalid_{}", secret(secret_id))
}

pub fn reveal_action(secret_id: &str) -> String {
    format!("reveal_{}", secret(secret_id))
}

// ── Execution nodes ──────────────────────────────────────────────────
//
// `full_id` is `node_<n>_<kind>`, see `Node::full_id`.

pub fn status_var(full_id: &str) -> String {
    format!("status_{full_id}")
}

pub fn status_prop(full_id: &str, status: NodeStatus) -> String {
    format!("{full_id}_is_{status}")
}

pub fn exec_action(full_id: &str) -> String {
    format!("exec_{full_id}")
}

pub fn authorize_action(full_id: &str) -> String {
    format!("authorize_{full_id}")
}

pub fn authorized_var(full_id: &str, participant: &str) -> String {
    format!("{full_id}_authorized_by_{}", part(participant))
}

pub fn authorized_prop(full_id: &str, participant: &str) -> String {
    format!("{full_id}_is_authorized_by_{participant}")
}
