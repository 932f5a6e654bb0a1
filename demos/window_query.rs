// Runs a time-window query against the 15-minute local plus two express
// departures and prints every surviving, dominance-filtered alternative.

use raptor_core::RaptorEngine;
use scenarios::{access, default_params, single_line_with_optional_express};

fn main() {
    let graph = single_line_with_optional_express(true);
    let params = default_params();
    let mut engine = RaptorEngine::new(&graph);

    let access_stops = vec![access(0, 60, 0.0)];
    let egress_stops = vec![access(2, 60, 0.0)];

    let earliest = 8 * 3600;
    let latest = 9 * 3600;
    let desired = 8 * 3600 + 30 * 60;

    let routes = engine.calc_routes(earliest, desired, latest, 0, 2, &access_stops, &egress_stops, &params);

    println!("{} alternative(s) survived dominance filtering:", routes.len());
    for route in &routes {
        println!(
            "  departs {} travels {}s {} transfer(s) cost {:.2}",
            route.get_departure_time(),
            route.get_travel_time(),
            route.get_number_of_transfers(),
            route.arrival_cost()
        );
    }
}
