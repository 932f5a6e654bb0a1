// Synthetic GraphView construction for demos, benchmarks and integration
// tests, built directly from flat arrays instead of parsed from a feed.

use raptor_core::graph::{GraphViewBuilder, RouteStopMeta, RouteStopRefs, Transfer};
use raptor_core::params::RaptorParameters;
use raptor_core::{GraphView, InitialStop, RaptorModel};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    Rail,
    Bus,
}

// Small mode enum, u32 opaque refs (line/route/route-stop ids), and a
// String plan-element payload standing in for whatever a real caller's
// access/egress planner would attach.
#[derive(Debug, Clone, Copy)]
pub struct DemoModel;

impl RaptorModel for DemoModel {
    type Mode = Mode;
    type Ref = u32;
    type PlanElement = String;
}

// route_stop_id is an arbitrary opaque id forwarded into the three refs
// fields; these fixtures never distinguish line/route/route-stop identity
// beyond "something the result carries back to the caller".
fn rs(stop: u32, arrival_offset: u32, departure_offset: u32, distance: f32, mode: Mode, route_stop_id: u32) -> RouteStopMeta<DemoModel> {
    RouteStopMeta {
        route: 0, // overwritten by GraphViewBuilder::add_route
        stop_facility: stop,
        arrival_offset,
        departure_offset,
        distance_along_route: distance,
        first_transfer: 0, // overwritten by GraphViewBuilder::add_route
        count_transfers: 0,
        mode,
        refs: RouteStopRefs {
            line: route_stop_id,
            route: route_stop_id,
            route_stop: route_stop_id,
        },
    }
}

// Negative marginal utilities of travel time and waiting, so both are
// penalised as positive costs, plus a modest transfer-penalty factor.
pub fn default_params() -> RaptorParameters<Mode> {
    let mut params = RaptorParameters::new(-0.06, -0.12, 0.2);
    params.set_marginal_utility_of_travel_time(Mode::Rail, -0.06);
    params.set_marginal_utility_of_travel_time(Mode::Bus, -0.08);
    params
}

// A single line with 15-minute headway, optionally with two express trips
// layered on top.
//
// Stops 0..=2 (boarding, middle, destination), one ride each. Local
// departures at 07:50, 08:05, ..., 09:05 (every 15 min, stop 0 -> stop 2
// in 10 minutes). If with_express is set, two express trips at 08:22
// and 08:48 do the same run in 5 minutes.
pub fn single_line_with_optional_express(with_express: bool) -> GraphView<DemoModel> {
    const SEC: u32 = 1;
    let mut builder = GraphViewBuilder::new(3, 60);

    let local_stops = vec![
        (rs(0, 0, 0, 0.0, Mode::Rail, 0), Vec::new()),
        (rs(1, 5 * 60 * SEC, 5 * 60 * SEC, 2500.0, Mode::Rail, 1), Vec::new()),
        (rs(2, 10 * 60 * SEC, 10 * 60 * SEC, 5000.0, Mode::Rail, 2), Vec::new()),
    ];
    let local_departures: Vec<u32> = [7 * 3600 + 50 * 60, 8 * 3600 + 5 * 60, 8 * 3600 + 20 * 60, 8 * 3600 + 35 * 60, 8 * 3600 + 50 * 60, 9 * 3600 + 5 * 60]
        .into_iter()
        .collect();
    builder.add_route(local_stops, local_departures);

    if with_express {
        let express_stops = vec![
            (rs(0, 0, 0, 0.0, Mode::Rail, 10), Vec::new()),
            (rs(1, 2 * 60 * SEC, 2 * 60 * SEC, 2500.0, Mode::Rail, 11), Vec::new()),
            (rs(2, 5 * 60 * SEC, 5 * 60 * SEC, 5000.0, Mode::Rail, 12), Vec::new()),
        ];
        let express_departures: Vec<u32> = [8 * 3600 + 22 * 60, 8 * 3600 + 48 * 60].into_iter().collect();
        builder.add_route(express_stops, express_departures);
    }

    builder.build().expect("scenario graph is internally consistent")
}

// Re-boarding. Route B runs straight through from the origin (stop 0) to
// the destination (stop 2) via stop X (stop 1); Route A only serves
// X -> destination, starting later but covering that leg far faster. A
// same-facility (zero time/cost) transfer links Route B's stop-1 position
// to Route A's boarding position, so a traveller riding B should find it
// cheaper to hop off at X and re-board A than to stay on B for the whole
// trip, exercising the re-boarding path within route exploration rather
// than the ordinary transfer-relaxation path.
//
// Stops: 0 = origin, 1 = X, 2 = destination.
// - Route B (Mode::Bus, route-stop ids 0/1/2): one departure at t=0,
//   reaching X at t=100 and the destination at t=1000.
// - Route A (Mode::Rail, route-stop ids 10/11): departures at t=150
//   and t=2000; the 150 departure reaches the destination at t=350.
//
// Use uniform_cost_params with this scenario: it gives every mode the
// same marginal utility and zeroes the transfer penalty, so the
// accumulated cost is simply proportional to elapsed time and the
// intended dominance (re-board beats staying on B) is unambiguous.
pub fn reboarding_scenario() -> GraphView<DemoModel> {
    let mut builder = GraphViewBuilder::new(3, 10);

    let route_b_stops = vec![
        (rs(0, 0, 0, 0.0, Mode::Bus, 0), Vec::new()),
        (rs(1, 100, 100, 100.0, Mode::Bus, 1), vec![Transfer {
            to_route_stop: 3, // Route A's boarding route-stop at X, same facility
            transfer_time: 0,
            transfer_cost: 0.0,
            transfer_distance: 0.0,
        }]),
        (rs(2, 1000, 1000, 1000.0, Mode::Bus, 2), Vec::new()),
    ];
    builder.add_route(route_b_stops, vec![0]);

    let route_a_stops = vec![
        (rs(1, 0, 0, 0.0, Mode::Rail, 10), Vec::new()),
        (rs(2, 200, 200, 200.0, Mode::Rail, 11), Vec::new()),
    ];
    builder.add_route(route_a_stops, vec![150, 2000]);

    builder.build().expect("scenario graph is internally consistent")
}

// Every mode shares one marginal utility of travel time, waiting costs the
// same per second, and the transfer penalty factor is zero, so total cost
// is exactly proportional to elapsed time and the cheapest path is simply
// the fastest one.
pub fn uniform_cost_params() -> RaptorParameters<Mode> {
    RaptorParameters::new(-0.1, -0.1, 0.0)
}

// Two footpath transfers out of stops S1/S2, both leading to a route-stop
// R on a shared downstream route. Exercises parallel-update staging:
// whichever of S1/S2 is processed second must not see the other's
// in-round stop-facility path.
//
// Stops: 0 = S1, 1 = S2, 2 = R's stop facility, 3 = downstream destination.
// Route: a single rail line whose only route-stop is at stop facility 2,
// reached only by transfer (no access stop sits on it directly), then
// continuing to stop 3.
pub fn parallel_update_scenario() -> GraphView<DemoModel> {
    let mut builder = GraphViewBuilder::new(4, 30);

    // Two feeder routes whose sole purpose is to seed S1 and S2 with an
    // arrival that then transfers onward to R.
    let feeder_s1 = vec![(rs(0, 0, 0, 0.0, Mode::Bus, 0), vec![Transfer {
        to_route_stop: 2, // R's boarding route-stop; see the index note below
        transfer_time: 3 * 60,
        transfer_cost: 1.0,
        transfer_distance: 400.0,
    }])];
    let feeder_s2 = vec![(rs(1, 0, 0, 0.0, Mode::Bus, 1), vec![Transfer {
        to_route_stop: 2,
        transfer_time: 2 * 60,
        transfer_cost: 1.5,
        transfer_distance: 300.0,
    }])];

    // R's route: stop facility 2 then downstream stop facility 3.
    let main_route_stops = vec![
        (rs(2, 0, 0, 0.0, Mode::Rail, 20), Vec::new()),
        (rs(3, 6 * 60, 6 * 60, 3000.0, Mode::Rail, 21), Vec::new()),
    ];

    // Route-stops are assigned indices in `add_route` call order: feeder_s1
    // (index 0), feeder_s2 (index 1), then the main route's two stops
    // (indices 2, 3). Both feeders' transfer already targets route-stop 2,
    // matching the main route's boarding position, so no post-hoc fixup is
    // needed as long as this call order is preserved.
    builder.add_route(feeder_s1, vec![7 * 3600 + 50 * 60]);
    builder.add_route(feeder_s2, vec![7 * 3600 + 52 * 60]);
    builder.add_route(main_route_stops, vec![8 * 3600, 8 * 3600 + 15 * 60, 8 * 3600 + 30 * 60]);

    builder.build().expect("scenario graph is internally consistent")
}

// A chain of hops single-stop-pair shuttle routes, each linked to the next
// by a free (zero time/cost) footpath transfer, with the destination
// egress placed at the first shuttle's arrival stop. Every later shuttle
// is reachable too (each one round further out) but never improves on the
// first arrival, since every extra hop only adds transfer-penalty cost.
// The transfer budget after first arrival should keep the query from
// walking the whole chain once the first (and only ever best) destination
// is found.
//
// Stop facilities: 0 (origin), 1 (destination, end of shuttle 0),
// 2, 3, ..., hops (one more per subsequent shuttle).
pub fn transfer_budget_scenario(hops: u32) -> GraphView<DemoModel> {
    let mut builder = GraphViewBuilder::new(hops as usize + 1, 30);

    for hop in 0..hops {
        let from_facility = if hop == 0 { 0 } else { hop };
        let to_facility = hop + 1;
        let onward_transfer = if hop + 1 < hops {
            vec![Transfer {
                // The next hop's boarding route-stop is two route-stops
                // per hop further along (`add_route` assigns indices in
                // call order), i.e. `(hop + 1) * 2`.
                to_route_stop: (hop + 1) * 2,
                transfer_time: 0,
                transfer_cost: 0.0,
                transfer_distance: 0.0,
            }]
        } else {
            Vec::new()
        };
        let stops = vec![
            (rs(from_facility, 0, 0, 0.0, Mode::Rail, hop * 10), Vec::new()),
            (rs(to_facility, 5 * 60, 5 * 60, 2000.0, Mode::Rail, hop * 10 + 1), onward_transfer),
        ];
        // Stagger departures five minutes apart per hop so a traveller who
        // arrives via the previous hop's transfer can always catch the
        // next one straight away.
        builder.add_route(stops, vec![8 * 3600 + hop * 5 * 60]);
    }

    builder.build().expect("scenario graph is internally consistent")
}

// A single zero-cost, zero-distance walk of access_time seconds onto/off
// of stop.
pub fn access(stop: u32, access_time: u32, access_cost: f32) -> InitialStop<DemoModel> {
    InitialStop::new(stop, access_time, access_cost, access_time as f32 * 1.3)
}

// A small fastrand-seeded random network: num_routes straight-line routes
// over num_stops stops, each with departures_per_route departures spread
// across a day, random positive per-stop-time costs, and no footpath
// transfers (routes alone are enough to stress route exploration's
// re-boarding logic when routes share stops).
pub fn random_network(seed: u64, num_stops: u32, num_routes: u32, stops_per_route: u32, departures_per_route: u32) -> GraphView<DemoModel> {
    let rng = fastrand::Rng::with_seed(seed);
    let mut builder = GraphViewBuilder::new(num_stops as usize, 60);

    for route_idx in 0..num_routes {
        let mut facilities = Vec::with_capacity(stops_per_route as usize);
        for _ in 0..stops_per_route {
            facilities.push(rng.u32(0..num_stops));
        }

        let mut stops = Vec::with_capacity(stops_per_route as usize);
        let mut cumulative_offset = 0u32;
        let mut cumulative_distance = 0.0f32;
        for (pos, &facility) in facilities.iter().enumerate() {
            if pos > 0 {
                cumulative_offset += rng.u32(120..600);
                cumulative_distance += rng.f32() * 4000.0 + 500.0;
            }
            let mode = if rng.bool() { Mode::Rail } else { Mode::Bus };
            stops.push((rs(facility, cumulative_offset, cumulative_offset, cumulative_distance, mode, route_idx * 1000 + pos as u32), Vec::new()));
        }

        let mut departures = Vec::with_capacity(departures_per_route as usize);
        let mut t = rng.u32(5 * 3600..7 * 3600);
        for _ in 0..departures_per_route {
            departures.push(t);
            t += rng.u32(300..1200);
        }

        builder.add_route(stops, departures);
    }

    builder.build().expect("random scenario graph is internally consistent")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_line_scenario_has_three_stops_and_six_departures() {
        let graph = single_line_with_optional_express(false);
        assert_eq!(graph.num_stops(), 3);
        assert_eq!(graph.num_routes(), 1);
        assert_eq!(graph.departures_of(0).len(), 6);
    }

    #[test]
    fn express_scenario_adds_a_second_route() {
        let graph = single_line_with_optional_express(true);
        assert_eq!(graph.num_routes(), 2);
        assert_eq!(graph.departures_of(1).len(), 2);
    }

    #[test]
    fn random_network_respects_requested_shape() {
        let graph = random_network(42, 50, 10, 4, 8);
        assert_eq!(graph.num_stops(), 50);
        assert_eq!(graph.num_routes(), 10);
        for route in 0..10 {
            assert_eq!(graph.departures_of(route).len(), 8);
        }
    }
}
