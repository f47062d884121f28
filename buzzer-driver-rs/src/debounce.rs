/// Software debounce for a single button edge stream.
///
/// An edge is accepted only if at least `window` ticks have elapsed since
/// the last *accepted* edge. Rejected edges do not restart the window.
/// Tick arithmetic wraps, so a free-running counter may overflow.
#[derive(Debug, Clone, Copy)]
pub struct Debouncer {
    window: u64,
    last_accepted: Option<u64>,
}

impl Debouncer {
    pub const fn new(window: u64) -> Self {
        Self {
            window,
            last_accepted: None,
        }
    }

    /// Feed an edge observed at `now`. Returns `true` if it is accepted.
    pub fn accept(&mut self, now: u64) -> bool {
        if let Some(last) = self.last_accepted {
            if now.wrapping_sub(last) < self.window {
                return false;
            }
        }
        self.last_accepted = Some(now);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_edge_is_always_accepted() {
        let mut d = Debouncer::new(20);
        assert!(d.accept(0));
    }

    #[test]
    fn edge_inside_window_is_rejected() {
        let mut d = Debouncer::new(20);
        assert!(d.accept(100));
        assert!(!d.accept(101));
        assert!(!d.accept(119));
        assert!(d.accept(120));
    }

    #[test]
    fn rejected_edges_do_not_extend_window() {
        let mut d = Debouncer::new(20);
        assert!(d.accept(0));
        assert!(!d.accept(10));
        assert!(!d.accept(19));
        // Measured from 0, not from 19.
        assert!(d.accept(20));
    }

    #[test]
    fn window_survives_counter_wrap() {
        let mut d = Debouncer::new(20);
        assert!(d.accept(u64::MAX - 5));
        assert!(!d.accept(3));
        assert!(d.accept(14));
    }

    #[test]
    fn zero_window_accepts_everything() {
        let mut d = Debouncer::new(0);
        assert!(d.accept(5));
        assert!(d.accept(5));
    }
}
