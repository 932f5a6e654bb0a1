use std::rc::Rc;

use crate::graph::{GraphView, RaptorModel, RouteStopMeta};
use crate::params::{ModeUtilityCache, RaptorParameters};
use crate::path::PathElement;
use crate::state::SearchState;
use crate::utils::earliest_departure_at_or_after;
use crate::{Cost, RouteIndex, RouteStopIndex, Timestamp};

// The vehicle an agent is currently riding: where they boarded, what cost
// that boarding has accrued so far, and the journey-level anchor used for
// the transfer-penalty term.
struct BoardingFrame<G: RaptorModel> {
    predecessor: Rc<PathElement<G>>,
    departure_time: Timestamp,
    boarding_time: Timestamp,
    boarding_travel_cost: Cost,
    boarding_distance_along_route: f32,
    first_departure_time: Timestamp,
    transfer_count: u32,
    travel_time_utility: Cost,
}

// Chooses the next boardable departure at rs for an agent arriving at
// agent_arrival. Returns None when no later departure exists.
fn board<G: RaptorModel>(
    departures: &[Timestamp],
    rs: &RouteStopMeta<G>,
    agent_arrival: Timestamp,
    predecessor: &Rc<PathElement<G>>,
    params: &RaptorParameters<G::Mode>,
    mode_cache: &mut ModeUtilityCache<G::Mode>,
) -> Option<BoardingFrame<G>> {
    let key = agent_arrival.checked_sub(rs.departure_offset).unwrap_or(0);
    let departure_index = earliest_departure_at_or_after(departures, key);
    if departure_index >= departures.len() {
        return None;
    }

    let departure_time = departures[departure_index];
    let vehicle_arrival_time = departure_time + rs.arrival_offset;
    let boarding_time = agent_arrival.max(vehicle_arrival_time);
    let waiting_cost = -params.marginal_utility_of_waiting_pt * (boarding_time - agent_arrival) as f32;
    let boarding_travel_cost = predecessor.arrival_travel_cost + waiting_cost;
    let first_departure_time = predecessor.first_departure_time.unwrap_or(boarding_time);

    Some(BoardingFrame {
        predecessor: Rc::clone(predecessor),
        departure_time,
        boarding_time,
        boarding_distance_along_route: rs.distance_along_route,
        first_departure_time,
        transfer_count: predecessor.transfer_count,
        travel_time_utility: mode_cache.get(params, &rs.mode),
    })
}

fn check_for_best_arrival<G: RaptorModel>(state: &mut SearchState<G>, route_stop: RouteStopIndex, total: Cost) {
    if state.is_destination(route_stop) {
        let combined = total + state.egress_cost_per_route_stop[route_stop as usize];
        if combined < state.best_arrival_cost {
            state.best_arrival_cost = combined;
        }
    }
}

fn record_arrival<G: RaptorModel>(
    graph: &GraphView<G>,
    state: &mut SearchState<G>,
    route_stop: RouteStopIndex,
    path: Rc<PathElement<G>>,
    total: Cost,
) {
    state.arrival_path_per_route_stop[route_stop as usize] = Some(Rc::clone(&path));
    state.least_arrival_cost_at_route_stop[route_stop as usize] = total;

    let stop = graph.route_stop(route_stop).stop_facility;
    if total <= state.least_arrival_cost_at_stop[stop as usize] {
        state.least_arrival_cost_at_stop[stop as usize] = total;
        state.arrival_path_per_stop[stop as usize] = Some(path);
        state.improved_stops.insert(stop);
        check_for_best_arrival(state, route_stop, total);
    }
}

pub(crate) fn explore_routes<G: RaptorModel>(
    graph: &GraphView<G>,
    params: &RaptorParameters<G::Mode>,
    state: &mut SearchState<G>,
    mode_cache: &mut ModeUtilityCache<G::Mode>,
) {
    mode_cache.clear();

    // Route-stops of one route are contiguous, so a route-stop-index sort
    // groups every touched route-stop of the same route together.
    let mut touched: Vec<RouteStopIndex> = state.improved_route_stops.iter().collect();
    touched.sort_unstable();

    let mut last_route: Option<RouteIndex> = None;
    for entry_route_stop in touched {
        let route = graph.route_stop(entry_route_stop).route;
        if last_route == Some(route) {
            continue;
        }
        last_route = Some(route);
        explore_one_route(graph, params, state, mode_cache, route, entry_route_stop);
    }
}

fn explore_one_route<G: RaptorModel>(
    graph: &GraphView<G>,
    params: &RaptorParameters<G::Mode>,
    state: &mut SearchState<G>,
    mode_cache: &mut ModeUtilityCache<G::Mode>,
    route: RouteIndex,
    entry_route_stop: RouteStopIndex,
) {
    let route_meta = *graph.route(route);
    let departures = graph.departures_of(route).to_vec();
    let first_rs = route_meta.first_route_stop;

    let Some(entry_predecessor) = state.arrival_path_per_route_stop[entry_route_stop as usize].clone() else {
        return;
    };
    let entry_rs = graph.route_stop(entry_route_stop).clone();
    let agent_arrival = entry_predecessor.arrival_time;

    let Some(mut frame) = board(&departures, &entry_rs, agent_arrival, &entry_predecessor, params, mode_cache) else {
        return;
    };

    let entry_total = frame.boarding_travel_cost + entry_predecessor.arrival_transfer_cost;
    if entry_total > state.best_arrival_cost {
        return;
    }

    let start_pos = (entry_route_stop - first_rs) as usize + 1;
    for pos in start_pos..route_meta.count_route_stops as usize {
        let j = first_rs + pos as RouteStopIndex;
        let rs_j = graph.route_stop(j).clone();

        let arrival_time_j = frame.departure_time + rs_j.arrival_offset;
        let in_vehicle_time = arrival_time_j.saturating_sub(frame.boarding_time);
        let in_vehicle_cost = in_vehicle_time as f32 * (-frame.travel_time_utility);
        let arrival_travel_cost_j = frame.boarding_travel_cost + in_vehicle_cost;
        let arrival_transfer_cost_j = (arrival_time_j as f64 - frame.first_departure_time as f64) as f32
            * params.transfer_penalty_travel_time_to_cost_factor
            * frame.transfer_count as f32;
        let total_j = arrival_travel_cost_j + arrival_transfer_cost_j;

        let existing_cost_at_j = state.least_arrival_cost_at_route_stop[j as usize];

        if total_j <= existing_cost_at_j {
            let distance = frame.predecessor.distance + (rs_j.distance_along_route - frame.boarding_distance_along_route);
            let pe = Rc::new(PathElement {
                coming_from: Some(Rc::clone(&frame.predecessor)),
                to_route_stop: Some(j),
                first_departure_time: Some(frame.first_departure_time),
                boarding_time: frame.boarding_time,
                arrival_time: arrival_time_j,
                arrival_travel_cost: arrival_travel_cost_j,
                arrival_transfer_cost: arrival_transfer_cost_j,
                distance,
                transfer_count: frame.transfer_count,
                is_transfer: false,
                initial_stop: None,
            });
            record_arrival(graph, state, j, pe, total_j);
        } else if let Some(existing_path) = state.arrival_path_per_route_stop[j as usize].clone() {
            // A cheaper path already reaches j on another vehicle/route.
            // See if catching a later departure of this route from j beats
            // staying on the current one.
            if let Some(reboard_frame) = board(&departures, &rs_j, existing_path.arrival_time, &existing_path, params, mode_cache) {
                let reboard_total = reboard_frame.boarding_travel_cost + existing_path.arrival_transfer_cost;
                if reboard_total < total_j {
                    frame = reboard_frame;
                    continue;
                }
            }
        }
    }
}
