//! User-facing chat texts for the pact command and ritual.

pub const MISSING_ARGS: &str = "You must specify a pact mate by name: /pact PactMateName";
pub const TOO_MANY_ARGS: &str = "You may not specify more than one pact mate.";
pub const SELF_PACT: &str = "You may not form a pact with yourself.";
pub const PLAYER_NOT_FOUND: &str = "Could not find a player online with the specified name.";
pub const OFFER_NOT_RENEWABLE: &str =
    "For arcane reasons, your pact offer cannot be renewed until it expires.";
pub const PACT_START: &str = "The pact has been made.";

pub fn offer_made(target_name: &str, requester_name: &str) -> String {
    format!("Pact offered. {target_name} must now type /pact {requester_name}")
}

pub fn offer_received(requester_name: &str) -> String {
    format!(
        "{requester_name} has offered a pact. To accept, type: /pact {requester_name}\n\
         If you accept, you will lose your spawn point, die, and respawn beside {requester_name}."
    )
}

pub fn offer_expired(target_name: &str) -> String {
    format!("Your pact offer with {target_name} has expired.")
}

pub fn partner_joining_soon(partner_name: &str) -> String {
    format!("{partner_name} will join you soon.")
}

pub fn partner_awaits(reviver_name: &str) -> String {
    format!("{reviver_name} has respawned and awaits you.")
}

pub fn pact_complete(reviver_name: &str, partner_name: &str) -> String {
    format!("{reviver_name} and {partner_name} have formed a pact.")
}
