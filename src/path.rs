// A PathElement owns nothing exclusively: it references its predecessor
// through an Rc and may be reachable from up to two scratch slots plus
// whatever result was built from it. Transfers strictly advance time, so
// the chain is a DAG and there's no cycle risk.

use std::rc::Rc;

use crate::graph::RaptorModel;
use crate::{Cost, RouteStopIndex, StopIndex, Timestamp};

// An access or egress leg.
#[derive(Debug, Clone)]
pub struct InitialStop<G: RaptorModel> {
    pub stop: StopIndex,
    pub access_time: Timestamp,
    pub access_cost: Cost,
    pub distance: f32,
    pub plan_elements: Vec<G::PlanElement>,
}

impl<G: RaptorModel> InitialStop<G> {
    pub fn new(stop: StopIndex, access_time: Timestamp, access_cost: Cost, distance: f32) -> Self {
        Self {
            stop,
            access_time,
            access_cost,
            distance,
            plan_elements: Vec::new(),
        }
    }

    pub fn with_plan_elements(mut self, plan_elements: Vec<G::PlanElement>) -> Self {
        self.plan_elements = plan_elements;
        self
    }
}

// One hop of a journey under construction: a PT boarding-and-ride, a
// footpath transfer, or the access/egress leg anchoring the chain's root.
pub struct PathElement<G: RaptorModel> {
    pub coming_from: Option<Rc<PathElement<G>>>,
    pub to_route_stop: Option<RouteStopIndex>,
    // None means no first departure has been set yet.
    pub first_departure_time: Option<Timestamp>,
    // When this hop began (boarded the vehicle, started walking, or left
    // the origin).
    pub boarding_time: Timestamp,
    pub arrival_time: Timestamp,
    pub arrival_travel_cost: Cost,
    pub arrival_transfer_cost: Cost,
    pub distance: f32,
    pub transfer_count: u32,
    pub is_transfer: bool,
    pub initial_stop: Option<Rc<InitialStop<G>>>,
}

impl<G: RaptorModel> PathElement<G> {
    pub fn total_cost(&self) -> Cost {
        self.arrival_travel_cost + self.arrival_transfer_cost
    }

    // Every predecessor chain terminates at an element with coming_from
    // == None and initial_stop set.
    pub fn root(self: &Rc<Self>) -> Rc<Self> {
        let mut current = Rc::clone(self);
        while let Some(prev) = current.coming_from.clone() {
            current = prev;
        }
        current
    }

    pub fn access(initial_stop: Rc<InitialStop<G>>, to_route_stop: RouteStopIndex, arrival_time: Timestamp) -> Self {
        Self {
            coming_from: None,
            to_route_stop: Some(to_route_stop),
            first_departure_time: None,
            boarding_time: arrival_time.saturating_sub(initial_stop.access_time),
            arrival_time,
            arrival_travel_cost: initial_stop.access_cost,
            arrival_transfer_cost: 0.0,
            distance: initial_stop.distance,
            transfer_count: 0,
            is_transfer: true,
            initial_stop: Some(initial_stop),
        }
    }
}
