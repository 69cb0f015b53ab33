//! v1 cross-boundary contracts for the pact coordinator, API, and simulation harness.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const SCHEMA_VERSION_V1: &str = "1.0";

/// Stable, opaque identifier for a connected participant. Survives across a
/// participant's sessions; the coordinator never holds anything heavier.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParticipantId(String);

impl ParticipantId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ParticipantId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for ParticipantId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// World-space position as reported by the host engine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Position {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum DamageCause {
    Suicide,
    Attack,
    Environment,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum DamageKind {
    Poison,
    Physical,
}

/// Classification handed to the host with every damage request. The ritual
/// uses suicide-source poison damage so the host's own respawn flow (not the
/// coordinator) handles the transition to a dead state.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct DamageClass {
    pub cause: DamageCause,
    pub kind: DamageKind,
}

impl DamageClass {
    pub const fn pact_ritual() -> Self {
        Self {
            cause: DamageCause::Suicide,
            kind: DamageKind::Poison,
        }
    }
}

/// Directed offer key: (requester, target). Distinct from its reverse pair.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct OfferKey {
    pub requester: ParticipantId,
    pub target: ParticipantId,
}

impl OfferKey {
    pub fn new(requester: ParticipantId, target: ParticipantId) -> Self {
        Self { requester, target }
    }

    /// The key a matching counter-offer would occupy.
    pub fn reversed(&self) -> Self {
        Self {
            requester: self.target.clone(),
            target: self.requester.clone(),
        }
    }

    pub fn is_self_offer(&self) -> bool {
        self.requester == self.target
    }
}

/// Outcome of a single offer request, per the negotiation contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum OfferOutcome {
    /// requester == target; no state change.
    SelfOffer,
    /// A reverse offer existed; both keys were removed. The caller must
    /// invoke pact creation exactly once.
    Matched { partner: ParticipantId },
    /// The forward key already exists; offers cannot be refreshed.
    Duplicate,
    /// A new forward offer was recorded and its expiry scheduled.
    Created,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CoordinatorConfig {
    pub schema_version: String,
    /// Delay before an unmatched offer expires, in logical milliseconds.
    pub offer_expiry_ms: u64,
    /// Base maximum health used for the revive penalty formula.
    pub base_max_health: f64,
    /// Command name shown in usage messages.
    pub command_name: String,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            schema_version: SCHEMA_VERSION_V1.to_string(),
            offer_expiry_ms: 60_000,
            base_max_health: 9.0,
            command_name: "pact".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ActorRef {
    pub actor_id: String,
    pub actor_kind: String,
}

impl ActorRef {
    pub fn participant(id: &ParticipantId) -> Self {
        Self {
            actor_id: id.to_string(),
            actor_kind: "participant".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    OfferCreated,
    OfferMatched,
    OfferRenewalRefused,
    SelfOfferRefused,
    OfferExpired,
    PactBegun,
    PactAwaitingPartner,
    PactCompleted,
    ReviveIgnored,
    CommandApplied,
    CommandRejected,
}

/// Append-only operational log entry. Every observable coordinator
/// transition appends exactly one of these.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Event {
    pub schema_version: String,
    pub event_id: String,
    /// Logical clock reading when the event was appended.
    pub at_ms: u64,
    pub sequence: u64,
    pub event_type: EventType,
    pub actors: Vec<ActorRef>,
    pub details: Option<Value>,
}

/// Kind of entity a revive signal originated from, as classified by the
/// host-side adapter that feeds the coordinator.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Player,
    Creature,
    Object,
}

/// A revive event as delivered by the host adapter. The coordinator ignores
/// (and logs) anything that is not an authoritative player signal.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReviveSignal {
    pub participant_id: Option<ParticipantId>,
    pub entity_kind: EntityKind,
    /// Whether the signal came from the authoritative (server) side.
    pub authoritative: bool,
}

impl ReviveSignal {
    /// An authoritative server-side player revive.
    pub fn player(id: ParticipantId) -> Self {
        Self {
            participant_id: Some(id),
            entity_kind: EntityKind::Player,
            authoritative: true,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CommandType {
    PactRequest,
    InjectJoin,
    InjectLeave,
    InjectRevive,
    AdvanceClock,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CommandPayload {
    /// The pact chat command, with its raw argument list. Argument-count and
    /// name-resolution errors surface as chat messages, not rejections.
    PactRequest {
        requester_id: String,
        args: Vec<String>,
    },
    InjectJoin {
        participant_id: String,
        display_name: String,
        position: Position,
        bonus_health: f64,
    },
    InjectLeave {
        participant_id: String,
    },
    InjectRevive {
        participant_id: String,
    },
    AdvanceClock {
        delta_ms: u64,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Command {
    pub schema_version: String,
    pub command_id: String,
    pub issued_at_ms: u64,
    pub command_type: CommandType,
    pub payload: CommandPayload,
}

impl Command {
    pub fn new(
        command_id: impl Into<String>,
        issued_at_ms: u64,
        command_type: CommandType,
        payload: CommandPayload,
    ) -> Self {
        Self {
            schema_version: SCHEMA_VERSION_V1.to_string(),
            command_id: command_id.into(),
            issued_at_ms,
            command_type,
            payload,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    InvalidCommand,
    InvalidQuery,
    ParticipantNotFound,
    StateConflict,
    ContractVersionUnsupported,
    InternalError,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ApiError {
    pub schema_version: String,
    pub error_code: ErrorCode,
    pub message: String,
    pub details: Option<String>,
}

impl ApiError {
    pub fn new(error_code: ErrorCode, message: impl Into<String>, details: Option<String>) -> Self {
        Self {
            schema_version: SCHEMA_VERSION_V1.to_string(),
            error_code,
            message: message.into(),
            details,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CommandResult {
    pub schema_version: String,
    pub command_id: String,
    pub accepted: bool,
    pub error: Option<ApiError>,
}

impl CommandResult {
    pub fn accepted(command: &Command) -> Self {
        Self {
            schema_version: SCHEMA_VERSION_V1.to_string(),
            command_id: command.command_id.clone(),
            accepted: true,
            error: None,
        }
    }

    pub fn rejected(command: &Command, error: ApiError) -> Self {
        Self {
            schema_version: SCHEMA_VERSION_V1.to_string(),
            command_id: command.command_id.clone(),
            accepted: false,
            error: Some(error),
        }
    }
}

/// Read-only view of a pending offer, for inspection surfaces.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OfferSnapshot {
    pub schema_version: String,
    pub requester_id: String,
    pub requester_name: String,
    pub target_id: String,
    pub target_name: String,
    pub offered_at_ms: u64,
    pub expires_at_ms: u64,
}

/// Read-only view of one direction of an active pact link.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PactLinkSnapshot {
    pub schema_version: String,
    pub participant_id: String,
    pub partner_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CoordinatorStatus {
    pub schema_version: String,
    pub clock_ms: u64,
    pub online_participants: usize,
    pub pending_offers: usize,
    pub active_pact_links: usize,
    pub event_count: usize,
}

impl fmt::Display for CoordinatorStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "clock_ms={} online={} offers={} pact_links={} events={}",
            self.clock_ms,
            self.online_participants,
            self.pending_offers,
            self.active_pact_links,
            self.event_count
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offer_key_reversal_swaps_direction() {
        let key = OfferKey::new("alice".into(), "bob".into());
        let reversed = key.reversed();
        assert_eq!(reversed.requester, ParticipantId::from("bob"));
        assert_eq!(reversed.target, ParticipantId::from("alice"));
        assert_ne!(key, reversed);
        assert_eq!(reversed.reversed(), key);
    }

    #[test]
    fn self_offer_detected() {
        let key = OfferKey::new("alice".into(), "alice".into());
        assert!(key.is_self_offer());
        assert!(!OfferKey::new("alice".into(), "bob".into()).is_self_offer());
    }

    #[test]
    fn config_defaults_match_observed_constants() {
        let config = CoordinatorConfig::default();
        assert_eq!(config.offer_expiry_ms, 60_000);
        assert_eq!(config.base_max_health, 9.0);
    }

    #[test]
    fn participant_id_serializes_transparently() {
        let id = ParticipantId::from("uid-123");
        let json = serde_json::to_string(&id).expect("serialize");
        assert_eq!(json, "\"uid-123\"");
        let back: ParticipantId = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, id);
    }

    #[test]
    fn command_result_helpers_carry_command_id() {
        let command = Command::new(
            "cmd-1",
            0,
            CommandType::AdvanceClock,
            CommandPayload::AdvanceClock { delta_ms: 100 },
        );
        let ok = CommandResult::accepted(&command);
        assert!(ok.accepted);
        assert_eq!(ok.command_id, "cmd-1");

        let err = CommandResult::rejected(
            &command,
            ApiError::new(ErrorCode::InvalidCommand, "bad", None),
        );
        assert!(!err.accepted);
        assert_eq!(
            err.error.expect("error").error_code,
            ErrorCode::InvalidCommand
        );
    }
}
