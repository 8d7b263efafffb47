//! Observer and gating traits at the engine boundary
//!
//! Hosts register listeners for board happenings (animation requests, clears,
//! scoring signals) and may install a single gate that decides whether input
//! is re-enabled once the board stabilizes. All methods default to no-ops so
//! a listener implements only what it cares about.

use std::cell::RefCell;
use std::rc::Rc;

/// Fan-out notifications from the engine. Registered with
/// `CascadeEngine::add_listener`; every registered listener sees every event.
pub trait BoardListener {
    /// A piece started an interpolated move toward (x, y). The engine drives
    /// the interpolation itself; hosts that animate externally may overwrite
    /// the piece's visual position instead.
    fn move_requested(&mut self, _piece_id: u32, _x: i32, _y: i32, _duration_ms: u32) {}

    /// A piece was cleared off the board
    fn piece_cleared(&mut self, _x: i32, _y: i32, _was_bomb: bool) {}

    /// A breakable tile took a hit; `remaining` hits left before Normal
    fn tile_broken(&mut self, _remaining: u8, _x: i32, _y: i32) {}

    /// A collectible left the board
    fn collectible_collected(&mut self, _x: i32, _y: i32) {}

    /// The cascade bonus chain changed; `true` while it keeps growing,
    /// `false` when a fresh user move resets it
    fn bonus_chain_updated(&mut self, _increasing: bool) {}

    /// A group of the given size cleared at once (bonus calculation input)
    fn group_cleared(&mut self, _group_size: usize) {}

    /// The board entered (`true`) or left (`false`) its refilling state
    fn refill_state_changed(&mut self, _refilling: bool) {}

    /// The player committed a swap that produced a match
    fn user_moved(&mut self) {}
}

/// Synchronous query deciding whether play may continue. Consulted when the
/// board stabilizes; input stays disabled if the gate says no.
pub trait InputGate {
    fn can_play(&self) -> bool;
}

/// Shared-ownership handles, so hosts keep access to the listeners they
/// register
pub type SharedListener = Rc<RefCell<dyn BoardListener>>;
pub type SharedGate = Rc<RefCell<dyn InputGate>>;
