// Map session module
// Click pairing, view state and the controller that requests routes
// for completed pairs
//
// Numan Thabit 2025 Nov

pub mod controller;
pub mod pairing;
pub mod view;

pub use controller::{Completion, MapController};
pub use pairing::{ClickOutcome, InFlight, PairState, Pairing, RequestId};
pub use view::{Bounds, LayerEvent, LayerId, RouteView};
