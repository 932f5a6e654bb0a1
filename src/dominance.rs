use crate::graph::RaptorModel;
use crate::result::RaptorRoute;
use crate::Timestamp;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct Key {
    transfer_count: u32,
    departure_time: Timestamp,
    travel_time: Timestamp,
}

impl Key {
    fn of<G: RaptorModel>(route: &RaptorRoute<G>) -> Self {
        Self {
            transfer_count: route.get_number_of_transfers(),
            departure_time: route.get_departure_time(),
            travel_time: route.get_travel_time(),
        }
    }

    // self is dominated by other iff other has no-more transfers, no-earlier
    // departure, and no-later arrival. The all-equal case is handled by the
    // dedup pass, so this need not special-case it.
    fn dominated_by(&self, other: &Key) -> bool {
        let other_arrival = other.departure_time + other.travel_time;
        let self_arrival = self.departure_time + self.travel_time;
        other.transfer_count <= self.transfer_count && other.departure_time >= self.departure_time && other_arrival <= self_arrival
    }
}

// Sorts by (transfer_count, departure_time, travel_time) ascending,
// deduplicates exactly-equal triples, then removes dominated alternatives.
// The surviving order is the sort order.
pub(crate) fn filter_alternatives<G: RaptorModel>(mut routes: Vec<RaptorRoute<G>>) -> Vec<RaptorRoute<G>> {
    routes.sort_by_key(Key::of);
    routes.dedup_by_key(|r| Key::of(r));

    let keys: Vec<Key> = routes.iter().map(Key::of).collect();
    let mut surviving = Vec::with_capacity(routes.len());
    for (i, route) in routes.into_iter().enumerate() {
        let dominated = keys.iter().enumerate().any(|(j, other)| i != j && keys[i].dominated_by(other));
        if !dominated {
            surviving.push(route);
        }
    }
    surviving
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strictly_better_in_all_three_dominates() {
        let slower = Key {
            transfer_count: 1,
            departure_time: 100,
            travel_time: 50,
        };
        let faster = Key {
            transfer_count: 0,
            departure_time: 100,
            travel_time: 40,
        };
        assert!(slower.dominated_by(&faster));
        assert!(!faster.dominated_by(&slower));
    }

    #[test]
    fn incomparable_alternatives_do_not_dominate() {
        let earlier_but_slower = Key {
            transfer_count: 0,
            departure_time: 90,
            travel_time: 60,
        };
        let later_but_faster = Key {
            transfer_count: 0,
            departure_time: 100,
            travel_time: 40,
        };
        assert!(!earlier_but_slower.dominated_by(&later_but_faster));
        assert!(!later_but_faster.dominated_by(&earlier_but_slower));
    }
}
