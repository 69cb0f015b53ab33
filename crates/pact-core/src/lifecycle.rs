//! Pact lifecycle: the kill step for both members of a freshly matched pact,
//! and the revive-side effects that rendezvous the pair back together.

use std::collections::BTreeMap;
use std::fmt;

use contracts::{DamageClass, PactLinkSnapshot, ParticipantId, SCHEMA_VERSION_V1};

use crate::host::{display_name, Host};
use crate::messages;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecycleError {
    /// One of the participants already has an active pact link. A pact
    /// cannot be re-entered while one is pending.
    AlreadyPaired(ParticipantId),
}

impl fmt::Display for LifecycleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AlreadyPaired(id) => {
                write!(f, "participant {id} already has an active pact link")
            }
        }
    }
}

impl std::error::Error for LifecycleError {}

/// What a revive event meant for the pact, from the reviving side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReviveOutcome {
    /// The reviving participant had no pact link; nothing happened.
    NotInPact,
    /// The partner has not revived yet; both sides were notified.
    AwaitingPartner { partner: ParticipantId },
    /// The partner was already alive: teleport + completion broadcast.
    Completed { partner: ParticipantId },
}

/// Symmetric participant → partner map for active, unconsummated pacts.
///
/// Both directions are inserted together by `begin`; each direction is
/// removed independently as its participant revives. The second removal is
/// what distinguishes the completing revive — no phase flag is stored, the
/// partner's liveness at query time decides the path.
#[derive(Debug, Default)]
pub struct PactRegistry {
    links: BTreeMap<ParticipantId, ParticipantId>,
}

impl PactRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start the ritual for a matched pair: record both link directions,
    /// then drive the kill step for each participant independently.
    ///
    /// Rejects the pair (without mutating anything) when either participant
    /// is already mid-pact.
    pub fn begin(
        &mut self,
        host: &mut dyn Host,
        a: &ParticipantId,
        b: &ParticipantId,
    ) -> Result<(), LifecycleError> {
        if self.links.contains_key(a) {
            return Err(LifecycleError::AlreadyPaired(a.clone()));
        }
        if self.links.contains_key(b) {
            return Err(LifecycleError::AlreadyPaired(b.clone()));
        }

        self.links.insert(a.clone(), b.clone());
        self.links.insert(b.clone(), a.clone());

        self.kill_for_pact(host, a);
        self.kill_for_pact(host, b);
        Ok(())
    }

    fn kill_for_pact(&self, host: &mut dyn Host, id: &ParticipantId) {
        host.send_notification(id, messages::PACT_START);
        host.clear_respawn_location(id);
        host.inflict_fatal_damage(id, DamageClass::pact_ritual());
    }

    /// Apply the revive-side effects for a participant coming back to life.
    ///
    /// Cheap no-op for participants without a link (the common case for
    /// ordinary respawns). Otherwise: remove the reviving side's link only,
    /// apply the survival penalty, then branch on the partner's liveness at
    /// this instant — not on any stored ordering metadata.
    pub fn on_revive(
        &mut self,
        host: &mut dyn Host,
        reviving: &ParticipantId,
        base_max_health: f64,
    ) -> ReviveOutcome {
        let Some(partner) = self.links.remove(reviving) else {
            return ReviveOutcome::NotInPact;
        };

        let penalty = (base_max_health + host.bonus_health_stat(reviving)) / 2.0;
        host.inflict_damage(reviving, DamageClass::pact_ritual(), penalty);

        let reviver_name = display_name(host, reviving);
        let partner_name = display_name(host, &partner);

        if !host.is_alive(&partner) {
            host.send_notification(reviving, &messages::partner_joining_soon(&partner_name));
            host.send_notification(&partner, &messages::partner_awaits(&reviver_name));
            return ReviveOutcome::AwaitingPartner { partner };
        }

        if let Some(position) = host.position(&partner) {
            host.teleport_to(reviving, position);
        }
        host.broadcast(&messages::pact_complete(&reviver_name, &partner_name));
        ReviveOutcome::Completed { partner }
    }

    pub fn partner_of(&self, id: &ParticipantId) -> Option<&ParticipantId> {
        self.links.get(id)
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    pub fn snapshots(&self) -> Vec<PactLinkSnapshot> {
        self.links
            .iter()
            .map(|(participant, partner)| PactLinkSnapshot {
                schema_version: SCHEMA_VERSION_V1.to_string(),
                participant_id: participant.to_string(),
                partner_id: partner.to_string(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::Position;

    use crate::sim::{AppliedDamage, SimWorld};

    fn alice() -> ParticipantId {
        ParticipantId::from("uid-alice")
    }

    fn bob() -> ParticipantId {
        ParticipantId::from("uid-bob")
    }

    fn world_with_pair() -> SimWorld {
        let mut world = SimWorld::new();
        world.join(alice(), "Alice", Position::new(10.0, 64.0, 10.0), 0.0);
        world.join(bob(), "Bob", Position::new(-40.0, 70.0, 3.0), 4.0);
        world
    }

    #[test]
    fn begin_links_both_directions_and_kills_both() {
        let mut world = world_with_pair();
        let mut registry = PactRegistry::new();

        registry
            .begin(&mut world, &alice(), &bob())
            .expect("fresh pair");

        assert_eq!(registry.partner_of(&alice()), Some(&bob()));
        assert_eq!(registry.partner_of(&bob()), Some(&alice()));
        assert!(!world.is_alive(&alice()));
        assert!(!world.is_alive(&bob()));
        assert_eq!(world.respawn_location(&alice()), None);
        assert_eq!(world.respawn_location(&bob()), None);
        assert_eq!(world.inbox(&alice()), [messages::PACT_START]);
        assert_eq!(world.inbox(&bob()), [messages::PACT_START]);
        assert_eq!(world.damage_log().len(), 2);
        assert!(world
            .damage_log()
            .iter()
            .all(|record| record.applied == AppliedDamage::Fatal
                && record.class == DamageClass::pact_ritual()));
    }

    #[test]
    fn begin_rejects_overlapping_pact() {
        let mut world = world_with_pair();
        world.join("uid-carol".into(), "Carol", Position::default(), 0.0);
        let mut registry = PactRegistry::new();

        registry
            .begin(&mut world, &alice(), &bob())
            .expect("fresh pair");
        let messages_before = world.inbox(&alice()).len();

        let err = registry
            .begin(&mut world, &alice(), &"uid-carol".into())
            .expect_err("alice is mid-pact");
        assert_eq!(err, LifecycleError::AlreadyPaired(alice()));

        // No mutation: links unchanged, no extra kill or message.
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.partner_of(&alice()), Some(&bob()));
        assert!(registry.partner_of(&"uid-carol".into()).is_none());
        assert!(world.is_alive(&"uid-carol".into()));
        assert_eq!(world.inbox(&alice()).len(), messages_before);
    }

    #[test]
    fn revive_without_link_is_pure_noop() {
        let mut world = world_with_pair();
        let mut registry = PactRegistry::new();

        let outcome = registry.on_revive(&mut world, &alice(), 9.0);
        assert_eq!(outcome, ReviveOutcome::NotInPact);
        assert!(world.damage_log().is_empty());
        assert!(world.inbox(&alice()).is_empty());
        assert!(world.broadcasts().is_empty());
    }

    #[test]
    fn first_revive_removes_one_direction_and_notifies_both() {
        let mut world = world_with_pair();
        let mut registry = PactRegistry::new();
        registry
            .begin(&mut world, &alice(), &bob())
            .expect("fresh pair");
        world.revive(&alice());
        world.drain_inbox(&alice());
        world.drain_inbox(&bob());

        let outcome = registry.on_revive(&mut world, &alice(), 9.0);
        assert_eq!(outcome, ReviveOutcome::AwaitingPartner { partner: bob() });

        assert!(registry.partner_of(&alice()).is_none());
        assert_eq!(registry.partner_of(&bob()), Some(&alice()));
        assert_eq!(world.inbox(&alice()), ["Bob will join you soon."]);
        assert_eq!(world.inbox(&bob()), ["Alice has respawned and awaits you."]);
        assert!(world.broadcasts().is_empty());
    }

    #[test]
    fn second_revive_teleports_and_broadcasts() {
        let mut world = world_with_pair();
        let mut registry = PactRegistry::new();
        registry
            .begin(&mut world, &alice(), &bob())
            .expect("fresh pair");

        world.revive(&alice());
        registry.on_revive(&mut world, &alice(), 9.0);
        let alice_position = world.position(&alice()).expect("alice online");

        world.revive(&bob());
        let outcome = registry.on_revive(&mut world, &bob(), 9.0);
        assert_eq!(outcome, ReviveOutcome::Completed { partner: alice() });

        assert!(registry.is_empty());
        assert_eq!(world.position(&bob()), Some(alice_position));
        assert_eq!(world.broadcasts().len(), 1);
        let broadcast = &world.broadcasts()[0];
        assert!(broadcast.contains("Alice"));
        assert!(broadcast.contains("Bob"));
    }

    #[test]
    fn revive_penalty_uses_bonus_health_stat() {
        let mut world = world_with_pair();
        let mut registry = PactRegistry::new();
        registry
            .begin(&mut world, &alice(), &bob())
            .expect("fresh pair");

        world.revive(&bob());
        registry.on_revive(&mut world, &bob(), 9.0);

        let penalty = world
            .damage_log()
            .iter()
            .rev()
            .find(|record| record.participant == bob())
            .expect("penalty recorded");
        // Bob joined with a bonus-health stat of 4.0.
        assert_eq!(penalty.applied, AppliedDamage::Amount((9.0 + 4.0) / 2.0));
    }

    #[test]
    fn completion_with_unknown_partner_position_skips_teleport() {
        let mut world = world_with_pair();
        let mut registry = PactRegistry::new();
        registry
            .begin(&mut world, &alice(), &bob())
            .expect("fresh pair");

        world.revive(&alice());
        registry.on_revive(&mut world, &alice(), 9.0);

        // Alice's session drops but her link side is already consumed; Bob
        // revives against a partner the host considers gone.
        world.leave(&alice());
        world.revive(&bob());
        let position_before = world.position(&bob()).expect("bob online");
        let outcome = registry.on_revive(&mut world, &bob(), 9.0);

        // Partner not alive per the host: the awaiting path is taken and the
        // partner-side message degrades to a dropped delivery.
        assert_eq!(outcome, ReviveOutcome::AwaitingPartner { partner: alice() });
        assert_eq!(world.position(&bob()), Some(position_before));
        assert!(registry.is_empty());
    }
}
