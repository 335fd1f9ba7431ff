//! Frozen simulator configuration, passed in once at construction rather
//! than mutated mid-run.

/// Default guard cycle cap, overridable at construction.
pub const DEFAULT_CYCLE_CAP: u64 = 10_000;

#[derive(Clone, Copy, Debug)]
pub struct SimConfig {
    pub pipelining: bool,
    pub forwarding: bool,
    pub cycle_cap: u64,
    pub dump_registers: bool,
    pub dump_latches: bool,
    pub dump_btb: bool,
    pub trace_instruction: Option<u64>,
}

impl Default for SimConfig {
    fn default() -> SimConfig {
        SimConfig {
            pipelining: true,
            forwarding: true,
            cycle_cap: DEFAULT_CYCLE_CAP,
            dump_registers: false,
            dump_latches: false,
            dump_btb: false,
            trace_instruction: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_fully_pipelined_with_forwarding() {
        let config = SimConfig::default();
        assert!(config.pipelining);
        assert!(config.forwarding);
        assert_eq!(config.cycle_cap, DEFAULT_CYCLE_CAP);
    }
}
