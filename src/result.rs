use std::rc::Rc;

use crate::error::RaptorError;
use crate::graph::{GraphView, RaptorModel};
use crate::path::PathElement;
use crate::{Cost, RouteStopIndex, StopIndex, Timestamp};

// Guards against a cyclic predecessor chain, which would only happen from a bug.
const MAX_LEGS: usize = 1000;

// Whether a walk leg borders the journey's access/egress ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NonPtMode {
    AccessWalk,
    TransitWalk,
    EgressWalk,
}

#[derive(Debug, Clone)]
pub enum Leg<G: RaptorModel> {
    Pt {
        from_stop: StopIndex,
        to_stop: StopIndex,
        line: G::Ref,
        route: G::Ref,
        mode: G::Mode,
        departure_time: Timestamp,
        travel_time: Timestamp,
        distance: f32,
    },
    NonPt {
        from_stop: Option<StopIndex>,
        to_stop: Option<StopIndex>,
        departure_time: Timestamp,
        travel_time: Timestamp,
        distance: f32,
        mode: NonPtMode,
    },
    // The caller-supplied access/egress plan elements, forwarded verbatim.
    PlanElements {
        departure_time: Timestamp,
        travel_time: Timestamp,
        elements: Vec<G::PlanElement>,
    },
}

#[derive(Debug, Clone)]
pub struct RaptorRoute<G: RaptorModel> {
    legs: Vec<Leg<G>>,
    arrival_cost: Cost,
    transfer_count: u32,
    departure_time: Timestamp,
    travel_time: Timestamp,
}

impl<G: RaptorModel> RaptorRoute<G> {
    // No route found: empty legs, arrival_cost == +inf.
    pub fn empty() -> Self {
        Self {
            legs: Vec::new(),
            arrival_cost: Cost::INFINITY,
            transfer_count: 0,
            departure_time: 0,
            travel_time: 0,
        }
    }

    pub fn legs(&self) -> &[Leg<G>] {
        &self.legs
    }

    pub fn arrival_cost(&self) -> Cost {
        self.arrival_cost
    }

    pub fn is_found(&self) -> bool {
        self.arrival_cost.is_finite()
    }

    // Count of non-PT legs between PT legs, excluding access/egress walks.
    pub fn get_number_of_transfers(&self) -> u32 {
        self.transfer_count
    }

    pub fn get_departure_time(&self) -> Timestamp {
        self.departure_time
    }

    pub fn get_travel_time(&self) -> Timestamp {
        self.travel_time
    }

    // Overrides the reported departure time, preserving the actual arrival
    // time by adjusting travel_time to match. Used by the window driver to
    // report a safety-buffered departure distinct from the root PathElement's
    // own boarding_time.
    pub(crate) fn set_departure_time(&mut self, departure_time: Timestamp) {
        let arrival_time = self.departure_time + self.travel_time;
        self.departure_time = departure_time;
        self.travel_time = arrival_time.saturating_sub(departure_time);
    }

    pub(crate) fn add_pt(
        &mut self,
        from_stop: StopIndex,
        to_stop: StopIndex,
        line: G::Ref,
        route: G::Ref,
        mode: G::Mode,
        departure_time: Timestamp,
        travel_time: Timestamp,
        distance: f32,
    ) {
        self.legs.push(Leg::Pt {
            from_stop,
            to_stop,
            line,
            route,
            mode,
            departure_time,
            travel_time,
            distance,
        });
    }

    pub(crate) fn add_non_pt(
        &mut self,
        from_stop: Option<StopIndex>,
        to_stop: Option<StopIndex>,
        departure_time: Timestamp,
        travel_time: Timestamp,
        distance: f32,
        mode: NonPtMode,
    ) {
        self.legs.push(Leg::NonPt {
            from_stop,
            to_stop,
            departure_time,
            travel_time,
            distance,
            mode,
        });
    }

    pub(crate) fn add_plan_elements(&mut self, departure_time: Timestamp, travel_time: Timestamp, elements: Vec<G::PlanElement>) {
        self.legs.push(Leg::PlanElements {
            departure_time,
            travel_time,
            elements,
        });
    }
}

// Predecessor chain from terminal to its root, oldest (root) first.
fn chain_from_root<G: RaptorModel>(terminal: &Rc<PathElement<G>>) -> Result<Vec<Rc<PathElement<G>>>, RaptorError> {
    let mut chain = Vec::new();
    let mut current = Rc::clone(terminal);
    loop {
        if chain.len() >= MAX_LEGS {
            return Err(RaptorError::PredecessorCycle { max_legs: MAX_LEGS });
        }
        let next = current.coming_from.clone();
        chain.push(Rc::clone(&current));
        match next {
            Some(prev) => current = prev,
            None => break,
        }
    }
    chain.reverse();
    Ok(chain)
}

// The stop-facility an element arrives at, for everything but the root
// access leg (whose "stop" is its initial_stop, not a route-stop).
fn arrival_stop<G: RaptorModel>(graph: &GraphView<G>, pe: &PathElement<G>) -> Option<StopIndex> {
    pe.to_route_stop.map(|rs| graph.route_stop(rs).stop_facility)
}

// Builds a RaptorRoute from the terminal (egress) PathElement of a completed
// search. terminal must trace back to a root access element
// (coming_from == None && initial_stop.is_some()).
pub(crate) fn reconstruct<G: RaptorModel>(graph: &GraphView<G>, terminal: &Rc<PathElement<G>>, arrival_cost: Cost) -> Result<RaptorRoute<G>, RaptorError> {
    let chain = chain_from_root(terminal)?;
    if chain[0].coming_from.is_some() || chain[0].initial_stop.is_none() {
        return Err(RaptorError::InvalidGraphView("predecessor chain root is missing its access leg".to_string()));
    }

    let mut route = RaptorRoute {
        legs: Vec::new(),
        arrival_cost,
        transfer_count: terminal.transfer_count,
        departure_time: chain[0].boarding_time,
        travel_time: terminal.arrival_time.saturating_sub(chain[0].boarding_time),
    };

    let root = &chain[0];
    let root_initial = root.initial_stop.as_ref().expect("root must carry the access leg");
    route.add_plan_elements(root.boarding_time, root.arrival_time.saturating_sub(root.boarding_time), root_initial.plan_elements.clone());

    // The second-to-last element is skipped when it is a mid-journey
    // transfer, so it merges into the final egress walk rather than being
    // emitted as its own leg.
    let skip_index = if chain.len() >= 2 {
        let candidate = &chain[chain.len() - 2];
        if candidate.is_transfer && candidate.to_route_stop.is_some() {
            Some(chain.len() - 2)
        } else {
            None
        }
    } else {
        None
    };

    let mut from_stop = Some(root_initial.stop);

    for (i, pe) in chain.iter().enumerate().skip(1) {
        let is_terminal = i + 1 == chain.len();

        if is_terminal {
            if let Some(egress) = &pe.initial_stop {
                route.add_plan_elements(pe.boarding_time, pe.arrival_time.saturating_sub(pe.boarding_time), egress.plan_elements.clone());
            }
            continue;
        }

        if Some(i) == skip_index {
            // Merged into the egress walk above.
            continue;
        }

        let to_stop = arrival_stop(graph, pe);

        if pe.is_transfer {
            if from_stop == to_stop {
                continue;
            }
            let mode = if from_stop.is_none() { NonPtMode::AccessWalk } else { NonPtMode::TransitWalk };
            let leg_distance = pe.distance - pe.coming_from.as_ref().map(|p| p.distance).unwrap_or(0.0);
            route.add_non_pt(from_stop, to_stop, pe.boarding_time, pe.arrival_time.saturating_sub(pe.boarding_time), leg_distance, mode);
        } else if let Some(to_route_stop) = pe.to_route_stop {
            let rs = graph.route_stop(to_route_stop);
            let leg_distance = pe.distance - pe.coming_from.as_ref().map(|p| p.distance).unwrap_or(0.0);
            route.add_pt(
                from_stop.unwrap_or(rs.stop_facility),
                rs.stop_facility,
                rs.refs.line.clone(),
                rs.refs.route.clone(),
                rs.mode.clone(),
                pe.boarding_time,
                pe.arrival_time.saturating_sub(pe.boarding_time),
                leg_distance,
            );
        }

        from_stop = to_stop;
    }

    Ok(route)
}
