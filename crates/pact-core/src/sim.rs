//! Deterministic in-memory host used by unit tests, the property suite, the
//! CLI scenario runner, and the API server.

use std::collections::BTreeMap;

use contracts::{DamageClass, ParticipantId, Position};

use crate::host::Host;

/// How a damage request was applied, for later inspection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AppliedDamage {
    Fatal,
    Amount(f64),
}

#[derive(Debug, Clone, PartialEq)]
pub struct DamageRecord {
    pub participant: ParticipantId,
    pub class: DamageClass,
    pub applied: AppliedDamage,
}

#[derive(Debug, Clone)]
struct SimParticipant {
    display_name: String,
    alive: bool,
    position: Position,
    bonus_health: f64,
    respawn_location: Option<Position>,
}

/// In-memory world: participants with liveness, position, per-participant
/// chat inboxes, a broadcast log, and a damage log. Join order is the
/// iteration order surfaced to `online_participants`.
#[derive(Debug, Default)]
pub struct SimWorld {
    participants: BTreeMap<ParticipantId, SimParticipant>,
    join_order: Vec<ParticipantId>,
    inboxes: BTreeMap<ParticipantId, Vec<String>>,
    broadcasts: Vec<String>,
    damage_log: Vec<DamageRecord>,
    world_spawn: Position,
}

impl SimWorld {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_world_spawn(world_spawn: Position) -> Self {
        Self {
            world_spawn,
            ..Self::default()
        }
    }

    pub fn join(
        &mut self,
        id: ParticipantId,
        display_name: impl Into<String>,
        position: Position,
        bonus_health: f64,
    ) {
        if !self.participants.contains_key(&id) {
            self.join_order.push(id.clone());
        }
        self.participants.insert(
            id.clone(),
            SimParticipant {
                display_name: display_name.into(),
                alive: true,
                position,
                bonus_health,
                respawn_location: Some(position),
            },
        );
        self.inboxes.entry(id).or_default();
    }

    /// Disconnect a participant. Returns false when the id is unknown.
    pub fn leave(&mut self, id: &ParticipantId) -> bool {
        let known = self.participants.remove(id).is_some();
        if known {
            self.join_order.retain(|joined| joined != id);
            self.inboxes.remove(id);
        }
        known
    }

    pub fn contains(&self, id: &ParticipantId) -> bool {
        self.participants.contains_key(id)
    }

    /// Bring a dead participant back: alive again, standing at the stored
    /// respawn location or the world spawn when none is stored.
    pub fn revive(&mut self, id: &ParticipantId) -> bool {
        let world_spawn = self.world_spawn;
        match self.participants.get_mut(id) {
            Some(participant) => {
                participant.alive = true;
                participant.position = participant.respawn_location.unwrap_or(world_spawn);
                true
            }
            None => false,
        }
    }

    pub fn set_position(&mut self, id: &ParticipantId, position: Position) {
        if let Some(participant) = self.participants.get_mut(id) {
            participant.position = position;
        }
    }

    pub fn respawn_location(&self, id: &ParticipantId) -> Option<Position> {
        self.participants
            .get(id)
            .and_then(|participant| participant.respawn_location)
    }

    pub fn inbox(&self, id: &ParticipantId) -> &[String] {
        self.inboxes
            .get(id)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn drain_inbox(&mut self, id: &ParticipantId) -> Vec<String> {
        self.inboxes
            .get_mut(id)
            .map(std::mem::take)
            .unwrap_or_default()
    }

    pub fn broadcasts(&self) -> &[String] {
        &self.broadcasts
    }

    pub fn damage_log(&self) -> &[DamageRecord] {
        &self.damage_log
    }

    pub fn online_count(&self) -> usize {
        self.participants.len()
    }
}

impl Host for SimWorld {
    fn online_participants(&self) -> Vec<(ParticipantId, String)> {
        self.join_order
            .iter()
            .filter_map(|id| {
                self.participants
                    .get(id)
                    .map(|participant| (id.clone(), participant.display_name.clone()))
            })
            .collect()
    }

    fn send_notification(&mut self, id: &ParticipantId, message: &str) {
        // Best-effort: a gone session silently drops the message.
        if let Some(inbox) = self.inboxes.get_mut(id) {
            inbox.push(message.to_string());
        }
    }

    fn broadcast(&mut self, message: &str) {
        self.broadcasts.push(message.to_string());
        for inbox in self.inboxes.values_mut() {
            inbox.push(message.to_string());
        }
    }

    fn clear_respawn_location(&mut self, id: &ParticipantId) {
        if let Some(participant) = self.participants.get_mut(id) {
            participant.respawn_location = None;
        }
    }

    fn inflict_fatal_damage(&mut self, id: &ParticipantId, class: DamageClass) {
        if let Some(participant) = self.participants.get_mut(id) {
            participant.alive = false;
            self.damage_log.push(DamageRecord {
                participant: id.clone(),
                class,
                applied: AppliedDamage::Fatal,
            });
        }
    }

    fn inflict_damage(&mut self, id: &ParticipantId, class: DamageClass, amount: f64) {
        if self.participants.contains_key(id) {
            self.damage_log.push(DamageRecord {
                participant: id.clone(),
                class,
                applied: AppliedDamage::Amount(amount),
            });
        }
    }

    fn is_alive(&self, id: &ParticipantId) -> bool {
        self.participants
            .get(id)
            .map(|participant| participant.alive)
            .unwrap_or(false)
    }

    fn position(&self, id: &ParticipantId) -> Option<Position> {
        self.participants
            .get(id)
            .map(|participant| participant.position)
    }

    fn teleport_to(&mut self, id: &ParticipantId, position: Position) {
        if let Some(participant) = self.participants.get_mut(id) {
            participant.position = position;
        }
    }

    fn bonus_health_stat(&self, id: &ParticipantId) -> f64 {
        self.participants
            .get(id)
            .map(|participant| participant.bonus_health)
            .unwrap_or(0.0)
    }
}
