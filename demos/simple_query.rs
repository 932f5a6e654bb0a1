// Runs a single-departure query against a 15-minute-headway line and
// prints the resulting itinerary.

use raptor_core::RaptorEngine;
use scenarios::{access, default_params, single_line_with_optional_express};

fn main() {
    let graph = single_line_with_optional_express(false);
    let params = default_params();
    let mut engine = RaptorEngine::new(&graph);

    let access_stops = vec![access(0, 60, 0.0)];
    let egress_stops = vec![access(2, 60, 0.0)];
    let dep_time = 8 * 3600;

    let route = engine.calc_least_cost_route(dep_time, 0, 2, &access_stops, &egress_stops, &params);

    if !route.is_found() {
        println!("No journey found.");
        return;
    }

    println!(
        "Departs {}, travels {}s, {} transfer(s), cost {:.2}",
        route.get_departure_time(),
        route.get_travel_time(),
        route.get_number_of_transfers(),
        route.arrival_cost()
    );
    for leg in route.legs() {
        println!("  {leg:?}");
    }
}
