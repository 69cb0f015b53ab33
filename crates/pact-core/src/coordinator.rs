//! Coordinator facade: owns the offer book, the pact registry, the deferred
//! queue, and the operational event log, and exposes the three entrypoints
//! the host dispatcher drives — the pact command, revive events, and clock
//! advancement. All entrypoints are serial; nothing blocks or waits.

use serde_json::json;

use contracts::{
    ActorRef, CoordinatorConfig, CoordinatorStatus, EntityKind, Event, EventType, OfferKey,
    OfferOutcome, OfferSnapshot, PactLinkSnapshot, ParticipantId, ReviveSignal,
    SCHEMA_VERSION_V1,
};

use crate::host::{display_name, resolve_by_name, Host};
use crate::lifecycle::{PactRegistry, ReviveOutcome};
use crate::messages;
use crate::negotiator::{OfferBook, PendingOffer};
use crate::scheduler::DeferredQueue;

/// Work scheduled for a later clock reading. Interpreted by the coordinator
/// when it falls due; a task whose subject is already gone is a no-op.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeferredTask {
    ExpireOffer { key: OfferKey },
}

#[derive(Debug)]
pub struct PactCoordinator {
    config: CoordinatorConfig,
    offers: OfferBook,
    registry: PactRegistry,
    deferred: DeferredQueue<DeferredTask>,
    event_log: Vec<Event>,
    next_sequence: u64,
}

impl PactCoordinator {
    pub fn new(config: CoordinatorConfig) -> Self {
        Self {
            config,
            offers: OfferBook::new(),
            registry: PactRegistry::new(),
            deferred: DeferredQueue::new(),
            event_log: Vec::new(),
            next_sequence: 0,
        }
    }

    /// Handle the pact chat command for `requester` with its raw arguments.
    ///
    /// Every failure surfaces as a chat message to the requester; none of
    /// them mutates coordinator state.
    pub fn handle_pact_command(
        &mut self,
        host: &mut dyn Host,
        requester: &ParticipantId,
        args: &[String],
    ) {
        let target_name = match args {
            [] => {
                host.send_notification(requester, messages::MISSING_ARGS);
                self.push_event(
                    EventType::CommandRejected,
                    vec![ActorRef::participant(requester)],
                    Some(json!({ "reason": "missing_args" })),
                );
                return;
            }
            [target_name] => target_name,
            _ => {
                host.send_notification(requester, messages::TOO_MANY_ARGS);
                self.push_event(
                    EventType::CommandRejected,
                    vec![ActorRef::participant(requester)],
                    Some(json!({ "reason": "too_many_args" })),
                );
                return;
            }
        };

        let Some((target_id, target_display)) = resolve_by_name(host, target_name) else {
            host.send_notification(requester, messages::PLAYER_NOT_FOUND);
            self.push_event(
                EventType::CommandRejected,
                vec![ActorRef::participant(requester)],
                Some(json!({ "reason": "target_not_found", "target_name": target_name })),
            );
            return;
        };

        let requester_name = display_name(host, requester);
        let key = OfferKey::new(requester.clone(), target_id.clone());
        let now_ms = self.deferred.clock_ms();
        let expires_at_ms = now_ms.saturating_add(self.config.offer_expiry_ms);
        let pending = PendingOffer {
            requester_name: requester_name.clone(),
            target_name: target_display.clone(),
            offered_at_ms: now_ms,
            expires_at_ms,
        };

        match self.offers.request(key.clone(), pending) {
            OfferOutcome::SelfOffer => {
                host.send_notification(requester, messages::SELF_PACT);
                self.push_event(
                    EventType::SelfOfferRefused,
                    vec![ActorRef::participant(requester)],
                    None,
                );
            }
            OfferOutcome::Duplicate => {
                host.send_notification(requester, messages::OFFER_NOT_RENEWABLE);
                self.push_event(
                    EventType::OfferRenewalRefused,
                    vec![
                        ActorRef::participant(requester),
                        ActorRef::participant(&target_id),
                    ],
                    None,
                );
            }
            OfferOutcome::Created => {
                self.deferred
                    .schedule_after(self.config.offer_expiry_ms, DeferredTask::ExpireOffer { key });
                host.send_notification(
                    requester,
                    &messages::offer_made(&target_display, &requester_name),
                );
                host.send_notification(&target_id, &messages::offer_received(&requester_name));
                self.push_event(
                    EventType::OfferCreated,
                    vec![
                        ActorRef::participant(requester),
                        ActorRef::participant(&target_id),
                    ],
                    Some(json!({ "expires_at_ms": expires_at_ms })),
                );
            }
            OfferOutcome::Matched { partner } => {
                self.push_event(
                    EventType::OfferMatched,
                    vec![
                        ActorRef::participant(requester),
                        ActorRef::participant(&partner),
                    ],
                    None,
                );
                match self.registry.begin(host, requester, &partner) {
                    Ok(()) => {
                        self.push_event(
                            EventType::PactBegun,
                            vec![
                                ActorRef::participant(requester),
                                ActorRef::participant(&partner),
                            ],
                            None,
                        );
                    }
                    Err(err) => {
                        // Must never escape into the host's dispatch; record
                        // the conflict and move on.
                        self.push_event(
                            EventType::CommandRejected,
                            vec![
                                ActorRef::participant(requester),
                                ActorRef::participant(&partner),
                            ],
                            Some(json!({
                                "reason": "state_conflict",
                                "detail": err.to_string(),
                            })),
                        );
                    }
                }
            }
        }
    }

    /// Entry point for host revive events. Signals that are not
    /// authoritative player revives are recorded and dropped; a player with
    /// no pact link is a silent no-op.
    pub fn on_entity_revived(&mut self, host: &mut dyn Host, signal: &ReviveSignal) {
        let authoritative_player =
            signal.authoritative && signal.entity_kind == EntityKind::Player;
        let Some(reviving) = signal
            .participant_id
            .as_ref()
            .filter(|_| authoritative_player)
        else {
            self.push_event(
                EventType::ReviveIgnored,
                Vec::new(),
                Some(json!({
                    "entity_kind": signal.entity_kind,
                    "authoritative": signal.authoritative,
                    "participant_id": signal.participant_id.as_ref().map(ToString::to_string),
                })),
            );
            return;
        };
        let reviving = reviving.clone();

        match self
            .registry
            .on_revive(host, &reviving, self.config.base_max_health)
        {
            ReviveOutcome::NotInPact => {}
            ReviveOutcome::AwaitingPartner { partner } => {
                self.push_event(
                    EventType::PactAwaitingPartner,
                    vec![
                        ActorRef::participant(&reviving),
                        ActorRef::participant(&partner),
                    ],
                    None,
                );
            }
            ReviveOutcome::Completed { partner } => {
                self.push_event(
                    EventType::PactCompleted,
                    vec![
                        ActorRef::participant(&reviving),
                        ActorRef::participant(&partner),
                    ],
                    None,
                );
            }
        }
    }

    /// Advance the logical clock and interpret every deferred task that has
    /// fallen due.
    pub fn advance_to(&mut self, host: &mut dyn Host, now_ms: u64) {
        self.deferred.advance_to(now_ms);
        for task in self.deferred.drain_due() {
            match task {
                DeferredTask::ExpireOffer { key } => {
                    // Only fires if the offer is still outstanding; a key
                    // removed by a match makes this a no-op.
                    if let Some(pending) = self.offers.expire(&key) {
                        host.send_notification(
                            &key.requester,
                            &messages::offer_expired(&pending.target_name),
                        );
                        self.push_event(
                            EventType::OfferExpired,
                            vec![
                                ActorRef::participant(&key.requester),
                                ActorRef::participant(&key.target),
                            ],
                            Some(json!({ "target_name": pending.target_name })),
                        );
                    }
                }
            }
        }
    }

    pub fn clock_ms(&self) -> u64 {
        self.deferred.clock_ms()
    }

    pub fn config(&self) -> &CoordinatorConfig {
        &self.config
    }

    pub fn events(&self) -> &[Event] {
        &self.event_log
    }

    pub fn offer_snapshots(&self) -> Vec<OfferSnapshot> {
        self.offers.snapshots()
    }

    pub fn pact_snapshots(&self) -> Vec<PactLinkSnapshot> {
        self.registry.snapshots()
    }

    pub fn status(&self, host: &dyn Host) -> CoordinatorStatus {
        CoordinatorStatus {
            schema_version: SCHEMA_VERSION_V1.to_string(),
            clock_ms: self.deferred.clock_ms(),
            online_participants: host.online_participants().len(),
            pending_offers: self.offers.len(),
            active_pact_links: self.registry.len(),
            event_count: self.event_log.len(),
        }
    }

    fn push_event(
        &mut self,
        event_type: EventType,
        actors: Vec<ActorRef>,
        details: Option<serde_json::Value>,
    ) {
        let sequence = self.next_sequence;
        self.next_sequence += 1;
        self.event_log.push(Event {
            schema_version: SCHEMA_VERSION_V1.to_string(),
            event_id: format!("evt-{sequence:06}"),
            at_ms: self.deferred.clock_ms(),
            sequence,
            event_type,
            actors,
            details,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::Position;

    use crate::sim::SimWorld;

    fn alice() -> ParticipantId {
        ParticipantId::from("uid-alice")
    }

    fn bob() -> ParticipantId {
        ParticipantId::from("uid-bob")
    }

    fn setup() -> (PactCoordinator, SimWorld) {
        let mut world = SimWorld::new();
        world.join(alice(), "Alice", Position::new(0.0, 64.0, 0.0), 0.0);
        world.join(bob(), "Bob", Position::new(50.0, 64.0, 50.0), 0.0);
        (PactCoordinator::new(CoordinatorConfig::default()), world)
    }

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(ToString::to_string).collect()
    }

    fn event_types(coordinator: &PactCoordinator) -> Vec<EventType> {
        coordinator
            .events()
            .iter()
            .map(|event| event.event_type)
            .collect()
    }

    #[test]
    fn missing_and_extra_args_produce_distinct_errors() {
        let (mut coordinator, mut world) = setup();

        coordinator.handle_pact_command(&mut world, &alice(), &args(&[]));
        coordinator.handle_pact_command(&mut world, &alice(), &args(&["Bob", "Carol"]));

        assert_eq!(
            world.inbox(&alice()),
            [messages::MISSING_ARGS, messages::TOO_MANY_ARGS]
        );
        assert_eq!(
            event_types(&coordinator),
            [EventType::CommandRejected, EventType::CommandRejected]
        );
        assert!(coordinator.offer_snapshots().is_empty());
    }

    #[test]
    fn unknown_target_name_is_reported() {
        let (mut coordinator, mut world) = setup();

        coordinator.handle_pact_command(&mut world, &alice(), &args(&["Mallory"]));

        assert_eq!(world.inbox(&alice()), [messages::PLAYER_NOT_FOUND]);
        assert!(coordinator.offer_snapshots().is_empty());
    }

    #[test]
    fn self_target_is_refused() {
        let (mut coordinator, mut world) = setup();

        coordinator.handle_pact_command(&mut world, &alice(), &args(&["Alice"]));

        assert_eq!(world.inbox(&alice()), [messages::SELF_PACT]);
        assert_eq!(event_types(&coordinator), [EventType::SelfOfferRefused]);
        assert!(coordinator.offer_snapshots().is_empty());
    }

    #[test]
    fn created_offer_notifies_both_and_schedules_expiry() {
        let (mut coordinator, mut world) = setup();

        coordinator.handle_pact_command(&mut world, &alice(), &args(&["Bob"]));

        assert_eq!(
            world.inbox(&alice()),
            [messages::offer_made("Bob", "Alice")]
        );
        assert_eq!(world.inbox(&bob()), [messages::offer_received("Alice")]);
        assert_eq!(event_types(&coordinator), [EventType::OfferCreated]);

        let offers = coordinator.offer_snapshots();
        assert_eq!(offers.len(), 1);
        assert_eq!(offers[0].expires_at_ms, 60_000);
    }

    #[test]
    fn duplicate_offer_is_refused_with_message() {
        let (mut coordinator, mut world) = setup();

        coordinator.handle_pact_command(&mut world, &alice(), &args(&["Bob"]));
        world.drain_inbox(&alice());

        coordinator.handle_pact_command(&mut world, &alice(), &args(&["Bob"]));
        assert_eq!(world.inbox(&alice()), [messages::OFFER_NOT_RENEWABLE]);
        assert_eq!(coordinator.offer_snapshots().len(), 1);
    }

    #[test]
    fn mutual_offers_begin_the_pact() {
        let (mut coordinator, mut world) = setup();

        coordinator.handle_pact_command(&mut world, &alice(), &args(&["Bob"]));
        coordinator.handle_pact_command(&mut world, &bob(), &args(&["Alice"]));

        assert!(coordinator.offer_snapshots().is_empty());
        assert_eq!(coordinator.pact_snapshots().len(), 2);
        assert!(!world.is_alive(&alice()));
        assert!(!world.is_alive(&bob()));
        assert_eq!(
            event_types(&coordinator),
            [
                EventType::OfferCreated,
                EventType::OfferMatched,
                EventType::PactBegun,
            ]
        );
    }

    #[test]
    fn unmatched_offer_expires_exactly_once() {
        let (mut coordinator, mut world) = setup();
        coordinator.handle_pact_command(&mut world, &alice(), &args(&["Bob"]));
        world.drain_inbox(&alice());
        world.drain_inbox(&bob());

        // One tick before the deadline: nothing.
        coordinator.advance_to(&mut world, 59_999);
        assert_eq!(coordinator.offer_snapshots().len(), 1);
        assert!(world.inbox(&alice()).is_empty());

        coordinator.advance_to(&mut world, 60_000);
        assert!(coordinator.offer_snapshots().is_empty());
        assert_eq!(world.inbox(&alice()), [messages::offer_expired("Bob")]);
        assert!(world.inbox(&bob()).is_empty());

        // The timer cannot fire twice.
        coordinator.advance_to(&mut world, 120_000);
        assert_eq!(world.inbox(&alice()).len(), 1);
    }

    #[test]
    fn expiry_after_match_is_a_noop() {
        let (mut coordinator, mut world) = setup();
        coordinator.handle_pact_command(&mut world, &alice(), &args(&["Bob"]));
        coordinator.handle_pact_command(&mut world, &bob(), &args(&["Alice"]));
        world.drain_inbox(&alice());
        world.drain_inbox(&bob());

        coordinator.advance_to(&mut world, 120_000);
        assert!(world.inbox(&alice()).is_empty());
        assert!(world.inbox(&bob()).is_empty());
        assert!(!event_types(&coordinator).contains(&EventType::OfferExpired));
    }

    #[test]
    fn non_player_revive_signals_are_logged_and_ignored() {
        let (mut coordinator, mut world) = setup();

        coordinator.on_entity_revived(
            &mut world,
            &ReviveSignal {
                participant_id: None,
                entity_kind: EntityKind::Creature,
                authoritative: true,
            },
        );
        coordinator.on_entity_revived(
            &mut world,
            &ReviveSignal {
                participant_id: Some(alice()),
                entity_kind: EntityKind::Player,
                authoritative: false,
            },
        );

        assert_eq!(
            event_types(&coordinator),
            [EventType::ReviveIgnored, EventType::ReviveIgnored]
        );
        assert!(world.damage_log().is_empty());
    }

    #[test]
    fn ordinary_revive_without_pact_is_silent() {
        let (mut coordinator, mut world) = setup();

        coordinator.on_entity_revived(&mut world, &ReviveSignal::player(alice()));

        assert!(coordinator.events().is_empty());
        assert!(world.damage_log().is_empty());
        assert!(world.inbox(&alice()).is_empty());
    }

    #[test]
    fn status_reflects_coordinator_state() {
        let (mut coordinator, mut world) = setup();
        coordinator.handle_pact_command(&mut world, &alice(), &args(&["Bob"]));

        let status = coordinator.status(&world);
        assert_eq!(status.online_participants, 2);
        assert_eq!(status.pending_offers, 1);
        assert_eq!(status.active_pact_links, 0);
        assert_eq!(status.event_count, 1);
    }
}
