//! Metric names and descriptions
//!
//! The core only records through the `metrics` facade; installing an
//! exporter is up to the process embedding it.

use metrics::describe_counter;

pub const INTENTS_EMITTED: &str = "bansync.intents.emitted";
pub const INTENTS_FAILED: &str = "bansync.intents.failed";
pub const COMMANDS_HANDLED: &str = "bansync.commands.handled";
pub const JOIN_ATTEMPTS: &str = "bansync.join.attempts";

/// Register metric descriptions with the installed recorder
pub fn init_metrics() {
    describe_counter!(INTENTS_EMITTED, "Ban/unban intents produced by propagation");
    describe_counter!(INTENTS_FAILED, "Intents the transport failed to execute");
    describe_counter!(COMMANDS_HANDLED, "Owner commands handled");
    describe_counter!(JOIN_ATTEMPTS, "Attempts to join rooms after an owner invite");
}
