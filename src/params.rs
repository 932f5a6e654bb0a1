use std::collections::HashMap;
use std::hash::Hash;

use crate::Cost;

// Per-mode marginal utility lookup is a small map, not a dense array: the
// set of modes is small, known ahead of time, and cheap to look up by value.
#[derive(Debug, Clone)]
pub struct RaptorParameters<Mode: Eq + Hash> {
    marginal_utility_of_travel_time: HashMap<Mode, Cost>,
    default_marginal_utility_of_travel_time: Cost,
    pub marginal_utility_of_waiting_pt: Cost,
    pub transfer_penalty_travel_time_to_cost_factor: Cost,
}

impl<Mode: Eq + Hash> RaptorParameters<Mode> {
    pub fn new(
        default_marginal_utility_of_travel_time: Cost,
        marginal_utility_of_waiting_pt: Cost,
        transfer_penalty_travel_time_to_cost_factor: Cost,
    ) -> Self {
        Self {
            marginal_utility_of_travel_time: HashMap::new(),
            default_marginal_utility_of_travel_time,
            marginal_utility_of_waiting_pt,
            transfer_penalty_travel_time_to_cost_factor,
        }
    }

    pub fn set_marginal_utility_of_travel_time(&mut self, mode: Mode, value: Cost) {
        self.marginal_utility_of_travel_time.insert(mode, value);
    }

    pub fn marginal_utility_of_travel_time(&self, mode: &Mode) -> Cost {
        self.marginal_utility_of_travel_time
            .get(mode)
            .copied()
            .unwrap_or(self.default_marginal_utility_of_travel_time)
    }
}

// Memoizes marginal_utility_of_travel_time lookups across one route
// exploration round, since the inner loop may query the same mode repeatedly.
pub(crate) struct ModeUtilityCache<Mode: Eq + Hash> {
    cached: HashMap<Mode, Cost>,
}

impl<Mode: Eq + Hash + Clone> ModeUtilityCache<Mode> {
    pub(crate) fn new() -> Self {
        Self {
            cached: HashMap::new(),
        }
    }

    pub(crate) fn clear(&mut self) {
        self.cached.clear();
    }

    pub(crate) fn get(&mut self, params: &RaptorParameters<Mode>, mode: &Mode) -> Cost {
        if let Some(&value) = self.cached.get(mode) {
            return value;
        }
        let value = params.marginal_utility_of_travel_time(mode);
        self.cached.insert(mode.clone(), value);
        value
    }
}
