//! The seam between the executor and whatever world it pumps commands into.
//!
//! The executor owns a [`Simulation`] value and moves it onto the
//! simulation thread; implementations never need to be `Sync` because all
//! calls happen from that one thread. The front end never touches the
//! simulation directly -- everything flows through the bridge.

use serde_json::Value;

use warden_types::{ColonyEvent, ErrorCode, MessageStyle};

/// State-mutating and state-reading operations the executor delegates to.
///
/// Every method returns a taxonomy code on failure; implementations must
/// not panic -- a refused operation is a result, not a crash.
pub trait Simulation: Send {
    /// Advance the world by one scheduling tick. Called once per executor
    /// tick before any commands are drained.
    fn advance(&mut self) {}

    /// Whether a colony is currently loaded and able to answer queries.
    fn colony_loaded(&self) -> bool;

    /// Build a state snapshot.
    ///
    /// Fails with [`ErrorCode::NoColonyLoaded`] when nothing is loaded.
    /// The payload shape is owned by the simulation, not the bridge.
    fn snapshot(
        &self,
        include_colonists: bool,
        include_resources: bool,
    ) -> Result<Value, ErrorCode>;

    /// Trigger a colony event with a threat-point budget (0 = let the
    /// simulation choose its own sizing).
    fn trigger_event(&mut self, event: ColonyEvent, points: u32) -> Result<(), ErrorCode>;

    /// Post a message into the colony's in-game log.
    fn post_message(&mut self, text: &str, style: MessageStyle) -> Result<(), ErrorCode>;
}
