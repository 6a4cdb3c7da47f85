use chrono::{DateTime, Utc};

/// Sorted start and stop instants of a set of closed intervals.
#[derive(Debug, Clone, Default)]
pub struct Endpoints {
    starts: Vec<DateTime<Utc>>,
    stops: Vec<DateTime<Utc>>,
}

impl Endpoints {
    pub fn push(&mut self, start: DateTime<Utc>, stop: DateTime<Utc>) {
        self.starts.push(start);
        self.stops.push(stop);
    }

    pub fn len(&self) -> usize {
        self.starts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.starts.is_empty()
    }

    /// Sort both endpoint lists so the sweep can advance monotonically.
    pub fn into_sweep(mut self) -> Sweep {
        self.starts.sort_unstable();
        self.stops.sort_unstable();
        Sweep {
            endpoints: self,
            started: 0,
            stopped: 0,
        }
    }
}

/// Running counter over sorted endpoints.
///
/// Windows must be queried in non-decreasing order; each endpoint is passed
/// over exactly once across all queries.
#[derive(Debug)]
pub struct Sweep {
    endpoints: Endpoints,
    started: usize,
    stopped: usize,
}

impl Sweep {
    /// Intervals with `start <= window_end` and `stop >= window_start`.
    ///
    /// Every interval that stopped before the window also started before its
    /// end, so the difference of the two prefix counts is the overlap count.
    pub fn active_in(&mut self, window_start: DateTime<Utc>, window_end: DateTime<Utc>) -> usize {
        let starts = &self.endpoints.starts;
        while self.started < starts.len() && starts[self.started] <= window_end {
            self.started += 1;
        }

        let stops = &self.endpoints.stops;
        while self.stopped < stops.len() && stops[self.stopped] < window_start {
            self.stopped += 1;
        }

        self.started - self.stopped
    }
}
