//! Cycle-accurate statistics gathered over a simulation run.

use std::fmt;

use crate::stage::InstructionCategory;

#[derive(Clone, Copy, Debug, Default)]
pub struct StallBreakdown {
    pub data_hazard_cycles: u64,
    pub control_hazard_cycles: u64,
}

impl StallBreakdown {
    pub fn total(&self) -> u64 {
        self.data_hazard_cycles + self.control_hazard_cycles
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct CategoryCounts {
    pub data_transfer: u64,
    pub alu: u64,
    pub control: u64,
}

impl CategoryCounts {
    fn record(&mut self, category: InstructionCategory) {
        match category {
            InstructionCategory::DataTransfer => self.data_transfer += 1,
            InstructionCategory::Alu => self.alu += 1,
            InstructionCategory::Control => self.control += 1,
        }
    }

    pub fn total(&self) -> u64 {
        self.data_transfer + self.alu + self.control
    }
}

/// Running counters the simulator updates once per cycle.
#[derive(Clone, Copy, Debug, Default)]
pub struct Statistics {
    pub total_cycles: u64,
    pub committed_instructions: u64,
    pub categories: CategoryCounts,
    pub stalls: StallBreakdown,
    pub distinct_data_hazards: u64,
    pub distinct_control_hazards: u64,
    pub branch_mispredictions: u64,
}

impl Statistics {
    pub fn new() -> Statistics {
        Statistics::default()
    }

    pub fn record_cycle(&mut self) {
        self.total_cycles += 1;
    }

    pub fn record_commit(&mut self, category: InstructionCategory) {
        self.committed_instructions += 1;
        self.categories.record(category);
    }

    pub fn record_data_stall(&mut self, is_new_occurrence: bool) {
        self.stalls.data_hazard_cycles += 1;
        if is_new_occurrence {
            self.distinct_data_hazards += 1;
        }
    }

    pub fn record_control_stall(&mut self) {
        self.stalls.control_hazard_cycles += 1;
        self.distinct_control_hazards += 1;
        self.branch_mispredictions += 1;
    }

    /// Cycles-per-instruction; `None` until at least one instruction has
    /// committed.
    pub fn cpi(&self) -> Option<f64> {
        if self.committed_instructions == 0 {
            None
        } else {
            Some(self.total_cycles as f64 / self.committed_instructions as f64)
        }
    }
}

impl fmt::Display for Statistics {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "cycles: {}", self.total_cycles)?;
        writeln!(f, "committed instructions: {}", self.committed_instructions)?;
        match self.cpi() {
            Some(cpi) => writeln!(f, "CPI: {:.3}", cpi)?,
            None => writeln!(f, "CPI: n/a (no instructions committed)")?,
        }
        writeln!(
            f,
            "categories: data-transfer={} alu={} control={}",
            self.categories.data_transfer, self.categories.alu, self.categories.control
        )?;
        writeln!(
            f,
            "stalls: data-hazard={} control-hazard={} total={}",
            self.stalls.data_hazard_cycles,
            self.stalls.control_hazard_cycles,
            self.stalls.total()
        )?;
        writeln!(f, "distinct data hazards: {}", self.distinct_data_hazards)?;
        writeln!(f, "distinct control hazards: {}", self.distinct_control_hazards)?;
        write!(f, "branch mispredictions: {}", self.branch_mispredictions)
    }
}
