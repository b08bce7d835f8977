// Click pairing state machine
//
// Empty -> OnePending -> (second click) Resolving -> Empty. While a pair is
// resolving, clicks start filling the next pair; when that pair completes it
// supersedes the one in flight.
//
// Numan Thabit 2025 Nov

use crate::network::GeoPoint;
use crate::router::RouteRequest;

/// Identifies one dispatched pair; strictly increasing per session
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InFlight {
    pub id: RequestId,
    pub request: RouteRequest,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PairState {
    Empty,
    OnePending(GeoPoint),
    Resolving {
        in_flight: InFlight,
        next: Option<GeoPoint>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ClickOutcome {
    /// The point waits for its partner
    Buffered,
    /// A pair is complete and must be requested
    Dispatch {
        in_flight: InFlight,
        superseded: Option<RequestId>,
    },
}

#[derive(Debug)]
pub struct Pairing {
    state: PairState,
    next_id: u64,
}

impl Default for Pairing {
    fn default() -> Self {
        Self {
            state: PairState::Empty,
            next_id: 1,
        }
    }
}

impl Pairing {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &PairState {
        &self.state
    }

    /// Points waiting for a partner; never more than one
    pub fn pending(&self) -> Option<GeoPoint> {
        match self.state {
            PairState::Empty => None,
            PairState::OnePending(p) => Some(p),
            PairState::Resolving { next, .. } => next,
        }
    }

    pub fn in_flight(&self) -> Option<InFlight> {
        match self.state {
            PairState::Resolving { in_flight, .. } => Some(in_flight),
            _ => None,
        }
    }

    pub fn click(&mut self, point: GeoPoint) -> ClickOutcome {
        let (state, outcome) = match self.state {
            PairState::Empty => (PairState::OnePending(point), ClickOutcome::Buffered),
            PairState::OnePending(start) => {
                let in_flight = self.issue(RouteRequest::new(start, point));
                (
                    PairState::Resolving {
                        in_flight,
                        next: None,
                    },
                    ClickOutcome::Dispatch {
                        in_flight,
                        superseded: None,
                    },
                )
            }
            PairState::Resolving {
                in_flight,
                next: None,
            } => (
                PairState::Resolving {
                    in_flight,
                    next: Some(point),
                },
                ClickOutcome::Buffered,
            ),
            PairState::Resolving {
                in_flight: old,
                next: Some(start),
            } => {
                let in_flight = self.issue(RouteRequest::new(start, point));
                (
                    PairState::Resolving {
                        in_flight,
                        next: None,
                    },
                    ClickOutcome::Dispatch {
                        in_flight,
                        superseded: Some(old.id),
                    },
                )
            }
        };
        self.state = state;
        outcome
    }

    /// Re-dispatch a request outside the click flow, superseding whatever is
    /// resolving. A half-filled pair stays pending.
    pub fn reissue(&mut self, request: RouteRequest) -> ClickOutcome {
        let superseded = self.in_flight().map(|f| f.id);
        let next = self.pending();
        let in_flight = self.issue(request);
        self.state = PairState::Resolving { in_flight, next };
        ClickOutcome::Dispatch {
            in_flight,
            superseded,
        }
    }

    /// Settle a completion. Returns the request if `id` is the pair currently
    /// resolving; stale ids leave the state untouched and return `None`.
    pub fn complete(&mut self, id: RequestId) -> Option<RouteRequest> {
        match self.state {
            PairState::Resolving { in_flight, next } if in_flight.id == id => {
                self.state = next.map_or(PairState::Empty, PairState::OnePending);
                Some(in_flight.request)
            }
            _ => None,
        }
    }

    fn issue(&mut self, request: RouteRequest) -> InFlight {
        let id = RequestId(self.next_id);
        self.next_id += 1;
        InFlight { id, request }
    }
}
