// Callers build a GraphView however suits their source data (GTFS, a
// simulation's own network model, ...) and hand the engine a handle to it.
// GraphViewBuilder assembles one from already-flattened arrays.

use crate::error::RaptorError;
use crate::{Cost, RouteIndex, RouteStopIndex, StopIndex, Timestamp};

// Opaque, caller-owned types threaded through the engine: used only when
// emitting results, never constructed here.
pub trait RaptorModel {
    type Mode: Clone + Eq + std::hash::Hash;
    type Ref: Clone;
    type PlanElement: Clone;
}

#[derive(Debug, Clone, Copy)]
pub struct RouteMeta {
    pub first_route_stop: RouteStopIndex,
    pub count_route_stops: u32,
    pub first_departure: u32,
    pub count_departures: u32,
}

#[derive(Debug, Clone)]
pub struct RouteStopRefs<R> {
    pub line: R,
    pub route: R,
    pub route_stop: R,
}

#[derive(Debug, Clone)]
pub struct RouteStopMeta<G: RaptorModel> {
    pub route: RouteIndex,
    pub stop_facility: StopIndex,
    pub arrival_offset: Timestamp,
    pub departure_offset: Timestamp,
    pub distance_along_route: f32,
    pub first_transfer: u32,
    pub count_transfers: u32,
    pub mode: G::Mode,
    pub refs: RouteStopRefs<G::Ref>,
}

// A walking edge from one route-stop to another.
#[derive(Debug, Clone, Copy)]
pub struct Transfer {
    pub to_route_stop: RouteStopIndex,
    pub transfer_time: Timestamp,
    pub transfer_cost: Cost,
    pub transfer_distance: f32,
}

// Route-stops of the same route are contiguous and in travel order
// (routes[r].first_route_stop .. +count_route_stops), and the outgoing
// transfers of one route-stop are likewise contiguous.
pub struct GraphView<G: RaptorModel> {
    routes: Vec<RouteMeta>,
    route_stops: Vec<RouteStopMeta<G>>,
    departures: Vec<Timestamp>,
    transfers: Vec<Transfer>,
    route_stops_per_stop_facility: Vec<Vec<RouteStopIndex>>,
    minimal_transfer_time: Timestamp,
}

impl<G: RaptorModel> GraphView<G> {
    pub fn num_stops(&self) -> usize {
        self.route_stops_per_stop_facility.len()
    }

    pub fn num_route_stops(&self) -> usize {
        self.route_stops.len()
    }

    pub fn num_routes(&self) -> usize {
        self.routes.len()
    }

    pub fn minimal_transfer_time(&self) -> Timestamp {
        self.minimal_transfer_time
    }

    pub fn route(&self, route: RouteIndex) -> &RouteMeta {
        &self.routes[route as usize]
    }

    pub fn route_stop(&self, route_stop: RouteStopIndex) -> &RouteStopMeta<G> {
        &self.route_stops[route_stop as usize]
    }

    pub fn route_stops_of(&self, route: RouteIndex) -> std::ops::Range<RouteStopIndex> {
        let meta = self.route(route);
        meta.first_route_stop..(meta.first_route_stop + meta.count_route_stops)
    }

    // Sorted ascending.
    pub fn departures_of(&self, route: RouteIndex) -> &[Timestamp] {
        let meta = self.route(route);
        let start = meta.first_departure as usize;
        let end = start + meta.count_departures as usize;
        &self.departures[start..end]
    }

    pub fn transfers_from(&self, route_stop: RouteStopIndex) -> &[Transfer] {
        let meta = self.route_stop(route_stop);
        let start = meta.first_transfer as usize;
        let end = start + meta.count_transfers as usize;
        &self.transfers[start..end]
    }

    pub fn route_stops_at(&self, stop: StopIndex) -> &[RouteStopIndex] {
        &self.route_stops_per_stop_facility[stop as usize]
    }
}

// Builds up by accretion: push routes, then their route-stops, then
// trip/departure data, taking already-flattened input instead of parsing
// GTFS directly.
pub struct GraphViewBuilder<G: RaptorModel> {
    routes: Vec<RouteMeta>,
    route_stops: Vec<RouteStopMeta<G>>,
    departures: Vec<Timestamp>,
    transfers: Vec<Transfer>,
    num_stops: usize,
    minimal_transfer_time: Timestamp,
}

impl<G: RaptorModel> GraphViewBuilder<G> {
    pub fn new(num_stops: usize, minimal_transfer_time: Timestamp) -> Self {
        Self {
            routes: Vec::new(),
            route_stops: Vec::new(),
            departures: Vec::new(),
            transfers: Vec::new(),
            num_stops,
            minimal_transfer_time,
        }
    }

    // Adds one route: its stops in travel order (each with its outgoing
    // transfers) and its sorted departure times. Returns the new route's
    // index.
    pub fn add_route(
        &mut self,
        stops: Vec<(RouteStopMeta<G>, Vec<Transfer>)>,
        departures: Vec<Timestamp>,
    ) -> RouteIndex {
        let route_index = self.routes.len() as RouteIndex;
        let first_route_stop = self.route_stops.len() as RouteStopIndex;
        let first_departure = self.departures.len() as u32;

        for (mut meta, route_transfers) in stops {
            meta.route = route_index;
            meta.first_transfer = self.transfers.len() as u32;
            meta.count_transfers = route_transfers.len() as u32;
            self.route_stops.push(meta);
            self.transfers.extend(route_transfers);
        }

        let count_route_stops = (self.route_stops.len() as RouteStopIndex) - first_route_stop;
        let count_departures = departures.len() as u32;
        self.departures.extend(departures);

        self.routes.push(RouteMeta {
            first_route_stop,
            count_route_stops,
            first_departure,
            count_departures,
        });
        route_index
    }

    pub fn build(self) -> Result<GraphView<G>, RaptorError> {
        let num_route_stops = self.route_stops.len();

        for (i, route) in self.routes.iter().enumerate() {
            let rs_end = route.first_route_stop as usize + route.count_route_stops as usize;
            if rs_end > num_route_stops {
                return Err(RaptorError::InvalidGraphView(format!(
                    "route {i} references route-stops out of bounds ({rs_end} > {num_route_stops})"
                )));
            }
            let dep_end = route.first_departure as usize + route.count_departures as usize;
            if dep_end > self.departures.len() {
                return Err(RaptorError::InvalidGraphView(format!(
                    "route {i} references departures out of bounds ({dep_end} > {})",
                    self.departures.len()
                )));
            }
            let departures = &self.departures[route.first_departure as usize..dep_end];
            if !departures.windows(2).all(|w| w[0] <= w[1]) {
                return Err(RaptorError::InvalidGraphView(format!(
                    "route {i} departures are not sorted ascending"
                )));
            }
        }

        for (i, rs) in self.route_stops.iter().enumerate() {
            if rs.stop_facility as usize >= self.num_stops {
                return Err(RaptorError::InvalidGraphView(format!(
                    "route-stop {i} references out-of-bounds stop facility {}",
                    rs.stop_facility
                )));
            }
            let t_end = rs.first_transfer as usize + rs.count_transfers as usize;
            if t_end > self.transfers.len() {
                return Err(RaptorError::InvalidGraphView(format!(
                    "route-stop {i} references transfers out of bounds ({t_end} > {})",
                    self.transfers.len()
                )));
            }
        }

        for (i, t) in self.transfers.iter().enumerate() {
            if t.to_route_stop as usize >= num_route_stops {
                return Err(RaptorError::InvalidGraphView(format!(
                    "transfer {i} targets out-of-bounds route-stop {}",
                    t.to_route_stop
                )));
            }
        }

        let mut route_stops_per_stop_facility = vec![Vec::new(); self.num_stops];
        for (i, rs) in self.route_stops.iter().enumerate() {
            route_stops_per_stop_facility[rs.stop_facility as usize].push(i as RouteStopIndex);
        }

        Ok(GraphView {
            routes: self.routes,
            route_stops: self.route_stops,
            departures: self.departures,
            transfers: self.transfers,
            route_stops_per_stop_facility,
            minimal_transfer_time: self.minimal_transfer_time,
        })
    }
}
