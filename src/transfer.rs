use std::rc::Rc;

use crate::graph::{GraphView, RaptorModel};
use crate::params::RaptorParameters;
use crate::path::PathElement;
use crate::state::SearchState;
use crate::Cost;

// strict selects < (single-departure query) vs <= (window query) for the
// route-stop/stop-facility comparators.
pub(crate) fn relax_transfers<G: RaptorModel>(graph: &GraphView<G>, params: &RaptorParameters<G::Mode>, state: &mut SearchState<G>, strict: bool) {
    let improved_stops: Vec<u32> = state.improved_stops.iter().collect();

    for stop in improved_stops {
        let Some(from) = state.arrival_path_per_stop[stop as usize].clone() else {
            continue;
        };
        if from.total_cost() > state.best_arrival_cost {
            continue;
        }
        let Some(from_route_stop) = from.to_route_stop else {
            continue;
        };

        for &t in graph.transfers_from(from_route_stop) {
            let new_time = from.arrival_time + t.transfer_time;
            let new_travel = from.arrival_travel_cost + t.transfer_cost;
            let new_transfer_count = from.transfer_count + 1;
            // An access/walk predecessor has no PT boarding yet to anchor
            // on, so this transfer becomes the anchor instead, the same
            // way board() falls back to its own boarding time.
            let first_departure_time = from.first_departure_time.unwrap_or(new_time);
            let new_transfer = (new_time as f64 - first_departure_time as f64) as f32
                * params.transfer_penalty_travel_time_to_cost_factor
                * new_transfer_count as f32;
            let new_total: Cost = new_travel + new_transfer;

            let accepted = if strict {
                new_total < state.least_arrival_cost_at_route_stop[t.to_route_stop as usize]
            } else {
                new_total <= state.least_arrival_cost_at_route_stop[t.to_route_stop as usize]
            };
            if !accepted {
                continue;
            }

            let pe = Rc::new(PathElement {
                coming_from: Some(Rc::clone(&from)),
                to_route_stop: Some(t.to_route_stop),
                first_departure_time: Some(first_departure_time),
                boarding_time: from.arrival_time,
                arrival_time: new_time,
                arrival_travel_cost: new_travel,
                arrival_transfer_cost: new_transfer,
                distance: from.distance + t.transfer_distance,
                transfer_count: new_transfer_count,
                is_transfer: true,
                initial_stop: None,
            });

            state.least_arrival_cost_at_route_stop[t.to_route_stop as usize] = new_total;
            state.arrival_path_per_route_stop[t.to_route_stop as usize] = Some(Rc::clone(&pe));
            state.improved_route_stops.insert(t.to_route_stop);

            let dest_stop = graph.route_stop(t.to_route_stop).stop_facility;
            let improves_stop = if strict {
                new_total < state.least_arrival_cost_at_stop[dest_stop as usize]
            } else {
                new_total <= state.least_arrival_cost_at_stop[dest_stop as usize]
            };
            if improves_stop {
                state.least_arrival_cost_at_stop[dest_stop as usize] = new_total;
                state.tmp_arrival_path_per_stop[dest_stop as usize] = Some(pe);
                state.tmp_improved_stops.insert(dest_stop);
            }
        }
    }

    // Stage the new stop-facility paths so a transfer relaxed from stop A
    // this round cannot itself be used as the source of another transfer
    // within the same round.
    for stop in state.tmp_improved_stops.iter() {
        state.arrival_path_per_stop[stop as usize] = state.tmp_arrival_path_per_stop[stop as usize].take();
    }
    state.tmp_improved_stops.clear();
}
