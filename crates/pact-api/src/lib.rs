//! In-process API facade with command validation, a command audit trail, and
//! an operator HTTP/WS server over the pact coordinator.

mod server;

use contracts::{
    ApiError, Command, CommandPayload, CommandResult, CommandType, CoordinatorConfig,
    CoordinatorStatus, ErrorCode, Event, OfferSnapshot, PactLinkSnapshot, ParticipantId,
    ReviveSignal, SCHEMA_VERSION_V1,
};
use pact_core::{PactCoordinator, SimWorld};

pub use server::{serve, ServerError};

/// Facade pairing a coordinator with its (simulated) host world. All access
/// is serial; the server wraps one of these behind a single mutex.
#[derive(Debug)]
pub struct CoordinatorApi {
    coordinator: PactCoordinator,
    world: SimWorld,
    command_audit: Vec<CommandResult>,
}

impl CoordinatorApi {
    pub fn from_config(config: CoordinatorConfig) -> Self {
        Self {
            coordinator: PactCoordinator::new(config),
            world: SimWorld::new(),
            command_audit: Vec::new(),
        }
    }

    /// Validate and apply a command. Chat-level failures of the pact command
    /// (argument count, unknown name, self-target, duplicate offer) are
    /// delivered to the requester as messages and still count as accepted;
    /// rejections are reserved for commands the coordinator never saw.
    pub fn submit_command(&mut self, command: Command) -> CommandResult {
        let result = self.apply_command(&command);
        self.command_audit.push(result.clone());
        result
    }

    fn apply_command(&mut self, command: &Command) -> CommandResult {
        if command.schema_version != SCHEMA_VERSION_V1 {
            return CommandResult::rejected(
                command,
                ApiError::new(
                    ErrorCode::ContractVersionUnsupported,
                    "unsupported contract schema version",
                    Some(format!("schema_version={}", command.schema_version)),
                ),
            );
        }

        if !payload_matches_type(command) {
            return CommandResult::rejected(
                command,
                ApiError::new(
                    ErrorCode::InvalidCommand,
                    "command payload does not match command_type",
                    None,
                ),
            );
        }

        match &command.payload {
            CommandPayload::InjectJoin {
                participant_id,
                display_name,
                position,
                bonus_health,
            } => {
                if participant_id.trim().is_empty() || display_name.trim().is_empty() {
                    return CommandResult::rejected(
                        command,
                        ApiError::new(
                            ErrorCode::InvalidCommand,
                            "participant_id and display_name must be non-empty",
                            None,
                        ),
                    );
                }
                self.world.join(
                    ParticipantId::from(participant_id.clone()),
                    display_name.clone(),
                    *position,
                    *bonus_health,
                );
                CommandResult::accepted(command)
            }
            CommandPayload::InjectLeave { participant_id } => {
                let id = ParticipantId::from(participant_id.clone());
                if self.world.leave(&id) {
                    CommandResult::accepted(command)
                } else {
                    CommandResult::rejected(command, unknown_participant(participant_id))
                }
            }
            CommandPayload::InjectRevive { participant_id } => {
                let id = ParticipantId::from(participant_id.clone());
                if !self.world.revive(&id) {
                    return CommandResult::rejected(command, unknown_participant(participant_id));
                }
                self.coordinator
                    .on_entity_revived(&mut self.world, &ReviveSignal::player(id));
                CommandResult::accepted(command)
            }
            CommandPayload::AdvanceClock { delta_ms } => {
                let target = self.coordinator.clock_ms().saturating_add(*delta_ms);
                self.coordinator.advance_to(&mut self.world, target);
                CommandResult::accepted(command)
            }
            CommandPayload::PactRequest { requester_id, args } => {
                let requester = ParticipantId::from(requester_id.clone());
                if !self.world.contains(&requester) {
                    return CommandResult::rejected(command, unknown_participant(requester_id));
                }
                self.coordinator
                    .handle_pact_command(&mut self.world, &requester, args);
                CommandResult::accepted(command)
            }
        }
    }

    pub fn status(&self) -> CoordinatorStatus {
        self.coordinator.status(&self.world)
    }

    pub fn events(&self) -> &[Event] {
        self.coordinator.events()
    }

    pub fn offers(&self) -> Vec<OfferSnapshot> {
        self.coordinator.offer_snapshots()
    }

    pub fn pacts(&self) -> Vec<PactLinkSnapshot> {
        self.coordinator.pact_snapshots()
    }

    pub fn command_audit(&self) -> &[CommandResult] {
        &self.command_audit
    }

    pub fn config(&self) -> &CoordinatorConfig {
        self.coordinator.config()
    }

    pub fn clock_ms(&self) -> u64 {
        self.coordinator.clock_ms()
    }

    /// Chat messages delivered to a participant so far (oldest first).
    pub fn participant_inbox(&self, participant_id: &str) -> Vec<String> {
        self.world
            .inbox(&ParticipantId::from(participant_id))
            .to_vec()
    }

    /// Take and clear a participant's delivered chat messages.
    pub fn drain_participant_inbox(&mut self, participant_id: &str) -> Vec<String> {
        self.world
            .drain_inbox(&ParticipantId::from(participant_id))
    }

    pub fn broadcasts(&self) -> &[String] {
        self.world.broadcasts()
    }
}

fn payload_matches_type(command: &Command) -> bool {
    matches!(
        (&command.command_type, &command.payload),
        (CommandType::PactRequest, CommandPayload::PactRequest { .. })
            | (CommandType::InjectJoin, CommandPayload::InjectJoin { .. })
            | (CommandType::InjectLeave, CommandPayload::InjectLeave { .. })
            | (CommandType::InjectRevive, CommandPayload::InjectRevive { .. })
            | (CommandType::AdvanceClock, CommandPayload::AdvanceClock { .. })
    )
}

fn unknown_participant(participant_id: &str) -> ApiError {
    ApiError::new(
        ErrorCode::ParticipantNotFound,
        "participant is not online",
        Some(format!("participant_id={participant_id}")),
    )
}
