//! Dynamic branch predictor: a never-evicting branch-target buffer keyed
//! by PC, one-bit last-outcome direction.
//!
//! A two-bit saturating counter would predict more accurately through
//! alternating branches, but the one-bit scheme keeps a BTB entry to a
//! `u32` PC plus a `u32` target plus a bool — see `DESIGN.md`.

#[derive(Clone, Copy, Debug)]
struct BtbEntry {
    pc: u32,
    target: u32,
    last_taken: bool,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Prediction {
    pub taken: bool,
    pub target: u32,
}

/// Ordered, never-evicting BTB.
#[derive(Clone, Debug, Default)]
pub struct BranchPredictor {
    entries: Vec<BtbEntry>,
}

impl BranchPredictor {
    pub fn new() -> BranchPredictor {
        BranchPredictor { entries: Vec::new() }
    }

    fn find(&self, pc: u32) -> Option<&BtbEntry> {
        self.entries.iter().find(|e| e.pc == pc)
    }

    fn find_mut(&mut self, pc: u32) -> Option<&mut BtbEntry> {
        self.entries.iter_mut().find(|e| e.pc == pc)
    }

    /// Prediction used at fetch time for the instruction at `pc`.
    pub fn predict(&self, pc: u32) -> Prediction {
        match self.find(pc) {
            Some(e) if e.last_taken => Prediction { taken: true, target: e.target },
            _ => Prediction { taken: false, target: pc.wrapping_add(4) },
        }
    }

    /// Records the resolved outcome of the branch at `pc`. Returns `true`
    /// if this call changed the BTB (an "update" the tracer should note).
    pub fn update(&mut self, pc: u32, taken: bool, target: u32) -> bool {
        match self.find_mut(pc) {
            Some(e) => {
                if e.last_taken == taken && e.target == target {
                    false
                } else {
                    e.last_taken = taken;
                    e.target = target;
                    true
                }
            }
            None => {
                self.entries.push(BtbEntry { pc, target, last_taken: taken });
                true
            }
        }
    }

    pub fn dump(&self) -> Vec<(u32, u32, bool)> {
        self.entries.iter().map(|e| (e.pc, e.target, e.last_taken)).collect()
    }
}
