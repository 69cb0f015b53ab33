//! The narrow interface the coordinator consumes from the surrounding host
//! engine. Entities are referenced by identifier only; the coordinator never
//! owns world state.

use contracts::{DamageClass, ParticipantId, Position};

/// Host-engine seam. Every method is best-effort: unknown or offline
/// identifiers degrade to no-ops (or `None`/`false`), never errors — a
/// negotiation or ritual problem must never propagate a failure into the
/// host's event dispatch.
pub trait Host {
    /// Currently connected participants as (id, display name) pairs.
    fn online_participants(&self) -> Vec<(ParticipantId, String)>;

    /// Fire-and-forget chat delivery to one participant.
    fn send_notification(&mut self, id: &ParticipantId, message: &str);

    /// Fire-and-forget chat delivery to all connected participants.
    fn broadcast(&mut self, message: &str);

    /// Forget the participant's stored respawn location so the host picks a
    /// fresh spawn on the next revive.
    fn clear_respawn_location(&mut self, id: &ParticipantId);

    /// Lethal, non-retriable damage. The host's own respawn flow handles the
    /// transition to a dead state.
    fn inflict_fatal_damage(&mut self, id: &ParticipantId, class: DamageClass);

    fn inflict_damage(&mut self, id: &ParticipantId, class: DamageClass, amount: f64);

    fn is_alive(&self, id: &ParticipantId) -> bool;

    fn position(&self, id: &ParticipantId) -> Option<Position>;

    fn teleport_to(&mut self, id: &ParticipantId, position: Position);

    /// The participant's bonus-health stat (0.0 when unknown).
    fn bonus_health_stat(&self, id: &ParticipantId) -> f64;
}

/// Resolve a participant's display name, falling back to the raw identifier
/// when the session is gone.
pub fn display_name(host: &dyn Host, id: &ParticipantId) -> String {
    host.online_participants()
        .into_iter()
        .find(|(online_id, _)| online_id == id)
        .map(|(_, name)| name)
        .unwrap_or_else(|| id.to_string())
}

/// Resolve a typed display name to an online participant.
pub fn resolve_by_name(host: &dyn Host, name: &str) -> Option<(ParticipantId, String)> {
    host.online_participants()
        .into_iter()
        .find(|(_, online_name)| online_name == name)
}
