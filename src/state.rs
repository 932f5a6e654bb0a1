use std::rc::Rc;

use crate::graph::{GraphView, RaptorModel};
use crate::path::PathElement;
use crate::{Cost, RouteStopIndex, StopIndex};

// Keeps a list of touched indices alongside the bool array so clearing is
// proportional to what was touched this round, not to network size.
#[derive(Debug)]
pub(crate) struct IndexSet {
    touched: Vec<u32>,
    marked: Vec<bool>,
}

impl IndexSet {
    pub(crate) fn new(len: usize) -> Self {
        Self {
            touched: Vec::new(),
            marked: vec![false; len],
        }
    }

    pub(crate) fn clear(&mut self) {
        for &i in &self.touched {
            self.marked[i as usize] = false;
        }
        self.touched.clear();
    }

    pub(crate) fn insert(&mut self, index: u32) {
        if !self.marked[index as usize] {
            self.marked[index as usize] = true;
            self.touched.push(index);
        }
    }

    pub(crate) fn contains(&self, index: u32) -> bool {
        self.marked[index as usize]
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.touched.is_empty()
    }

    pub(crate) fn len(&self) -> usize {
        self.touched.len()
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = u32> + '_ {
        self.touched.iter().copied()
    }
}

// Sized once from the graph view's counts and reset, not reallocated, at
// the start of every query.
pub struct SearchState<G: RaptorModel> {
    pub(crate) arrival_path_per_route_stop: Vec<Option<Rc<PathElement<G>>>>,
    pub(crate) arrival_path_per_stop: Vec<Option<Rc<PathElement<G>>>>,
    pub(crate) least_arrival_cost_at_route_stop: Vec<Cost>,
    pub(crate) least_arrival_cost_at_stop: Vec<Cost>,
    pub(crate) egress_cost_per_route_stop: Vec<Cost>,

    pub(crate) improved_route_stops: IndexSet,
    pub(crate) improved_stops: IndexSet,
    pub(crate) destination_route_stops: IndexSet,

    pub(crate) tmp_arrival_path_per_stop: Vec<Option<Rc<PathElement<G>>>>,
    pub(crate) tmp_improved_stops: IndexSet,

    pub(crate) best_arrival_cost: Cost,
}

impl<G: RaptorModel> SearchState<G> {
    pub fn new(graph: &GraphView<G>) -> Self {
        let num_route_stops = graph.num_route_stops();
        let num_stops = graph.num_stops();
        Self {
            arrival_path_per_route_stop: vec![None; num_route_stops],
            arrival_path_per_stop: vec![None; num_stops],
            least_arrival_cost_at_route_stop: vec![Cost::INFINITY; num_route_stops],
            least_arrival_cost_at_stop: vec![Cost::INFINITY; num_stops],
            egress_cost_per_route_stop: vec![Cost::INFINITY; num_route_stops],
            improved_route_stops: IndexSet::new(num_route_stops),
            improved_stops: IndexSet::new(num_stops),
            destination_route_stops: IndexSet::new(num_route_stops),
            tmp_arrival_path_per_stop: vec![None; num_stops],
            tmp_improved_stops: IndexSet::new(num_stops),
            best_arrival_cost: Cost::INFINITY,
        }
    }

    pub fn reset(&mut self) {
        for slot in self.arrival_path_per_route_stop.iter_mut() {
            *slot = None;
        }
        for slot in self.arrival_path_per_stop.iter_mut() {
            *slot = None;
        }
        self.least_arrival_cost_at_route_stop.fill(Cost::INFINITY);
        self.least_arrival_cost_at_stop.fill(Cost::INFINITY);
        self.egress_cost_per_route_stop.fill(Cost::INFINITY);
        self.improved_route_stops.clear();
        self.improved_stops.clear();
        self.destination_route_stops.clear();
        for slot in self.tmp_arrival_path_per_stop.iter_mut() {
            *slot = None;
        }
        self.tmp_improved_stops.clear();
        self.best_arrival_cost = Cost::INFINITY;
    }

    pub fn best_arrival_cost(&self) -> Cost {
        self.best_arrival_cost
    }

    pub(crate) fn mark_destination(&mut self, route_stop: RouteStopIndex, egress_cost: Cost) {
        self.destination_route_stops.insert(route_stop);
        self.egress_cost_per_route_stop[route_stop as usize] = egress_cost;
    }

    pub(crate) fn is_destination(&self, route_stop: RouteStopIndex) -> bool {
        self.destination_route_stops.contains(route_stop)
    }

    pub(crate) fn initial_improve_route_stop(
        &mut self,
        route_stop: RouteStopIndex,
        stop: StopIndex,
        path: Rc<PathElement<G>>,
    ) {
        let total = path.total_cost();
        self.arrival_path_per_route_stop[route_stop as usize] = Some(Rc::clone(&path));
        self.least_arrival_cost_at_route_stop[route_stop as usize] = total;
        self.improved_route_stops.insert(route_stop);

        if total <= self.least_arrival_cost_at_stop[stop as usize] {
            self.least_arrival_cost_at_stop[stop as usize] = total;
            self.arrival_path_per_stop[stop as usize] = Some(path);
            // Without this, an access stop whose only onward connection is a
            // transfer (no route ride precedes it) would never get relaxed:
            // `relax_transfers` only ever looks at stops `explore_routes`
            // touched this round.
            self.improved_stops.insert(stop);
        }
    }
}
