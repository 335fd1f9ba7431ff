//! The simulator: an explicit value owning all pipeline state, with each
//! stage a pure function called over it.
//!
//! `step` runs exactly one cycle, evaluating the five stages in **reverse
//! order** so that a stage reading a latch this cycle always sees what the
//! previous cycle left there, while the stage that writes that latch (one
//! position earlier in the pipe) has already run and overwritten it by the
//! time a *later* stage goes looking this same cycle — the same-cycle
//! forwarding shortcut, without any latch ever being read and written
//! concurrently.

use rv32core::image::{DataImage, TextImage};
use rv32core::instruction::Instruction;
use rv32core::registers::RegisterFile;

use crate::config::SimConfig;
use crate::decode;
use crate::hazard;
use crate::latch::{ExMem, IdEx, IfId, MemWb};
use crate::memory::DataMemory;
use crate::predictor::BranchPredictor;
use crate::stage;
use crate::stats::Statistics;
use crate::trace::{Stage as TraceStage, Tracer};

/// A machine word no valid encoding ever produces (opcode `0x7F` doesn't
/// exist in the RV32I+M table), reserved to let a program request a clean
/// halt. The exact bit pattern is otherwise arbitrary, see `DESIGN.md`.
pub const EXIT_SENTINEL: u32 = 0xFFFF_FFFF;

pub struct Simulator {
    config: SimConfig,
    regs: RegisterFile,
    text: TextImage,
    data: DataMemory,
    predictor: BranchPredictor,
    stats: Statistics,
    tracer: Tracer,

    pc: u32,
    if_id: Option<IfId>,
    id_ex: Option<IdEx>,
    ex_mem: Option<ExMem>,
    mem_wb: Option<MemWb>,

    next_seq: u64,
    last_stall_pc: Option<u32>,
    halted: bool,
    exited: bool,
}

impl Simulator {
    pub fn new(text: TextImage, data: DataImage, config: SimConfig) -> Simulator {
        Simulator {
            tracer: Tracer::new(config.trace_instruction),
            config,
            regs: RegisterFile::new(),
            text,
            data: DataMemory::new(data),
            predictor: BranchPredictor::new(),
            stats: Statistics::new(),
            pc: 0,
            if_id: None,
            id_ex: None,
            ex_mem: None,
            mem_wb: None,
            next_seq: 0,
            last_stall_pc: None,
            halted: false,
            exited: false,
        }
    }

    pub fn regs(&self) -> &RegisterFile {
        &self.regs
    }

    pub fn stats(&self) -> &Statistics {
        &self.stats
    }

    pub fn tracer(&self) -> &Tracer {
        &self.tracer
    }

    pub fn predictor(&self) -> &BranchPredictor {
        &self.predictor
    }

    pub fn pc(&self) -> u32 {
        self.pc
    }

    pub fn is_halted(&self) -> bool {
        self.halted
    }

    /// Consumes the simulator and returns the final data image for
    /// write-back to disk at program termination.
    pub fn into_data_image(self) -> DataImage {
        self.data.into_image()
    }

    /// Runs cycles until the program drains, the cycle cap is hit, or an
    /// EXIT sentinel is reached.
    pub fn run(&mut self) {
        while self.step() {}
    }

    /// Advances the simulator by exactly one cycle. Returns `false` once
    /// the simulator has halted (this call was a no-op).
    pub fn step(&mut self) -> bool {
        if self.halted {
            return false;
        }

        if self.stats.total_cycles >= self.config.cycle_cap {
            eprintln!("warning: cycle cap ({}) reached, terminating", self.config.cycle_cap);
            self.halted = true;
            return false;
        }

        if self.config.pipelining {
            self.step_pipelined();
        } else {
            self.step_single_cycle();
        }

        self.stats.record_cycle();

        if self.drained() {
            self.halted = true;
        }

        if self.config.dump_registers {
            self.dump_registers();
        }
        if self.config.dump_latches {
            self.dump_latches();
        }

        !self.halted
    }

    fn drained(&self) -> bool {
        self.if_id.is_none()
            && self.id_ex.is_none()
            && self.ex_mem.is_none()
            && self.mem_wb.is_none()
            && (self.exited || self.text.get(self.pc).is_none())
    }

    fn dump_registers(&self) {
        let snapshot = self.regs.snapshot();
        for (i, value) in snapshot.iter().enumerate() {
            println!("x{:<2} = 0x{:08X}", i, *value as u32);
        }
    }

    /// Prints every latch's contents as of the cycle just completed (spec
    /// §4.10 "per-cycle latch dump"). A bubble prints as `<bubble>`.
    fn dump_latches(&self) {
        println!(
            "cycle {}: IF/ID={} ID/EX={} EX/MEM={} MEM/WB={}",
            self.stats.total_cycles,
            self.if_id.as_ref().map(|l| format!("pc=0x{:08X} seq={}", l.pc, l.seq)).unwrap_or_else(|| "<bubble>".to_string()),
            self.id_ex.as_ref().map(|l| format!("pc=0x{:08X} seq={}", l.pc, l.seq)).unwrap_or_else(|| "<bubble>".to_string()),
            self.ex_mem.as_ref().map(|l| format!("pc=0x{:08X} seq={}", l.pc, l.seq)).unwrap_or_else(|| "<bubble>".to_string()),
            self.mem_wb.as_ref().map(|l| format!("pc=0x{:08X} seq={}", l.pc, l.seq)).unwrap_or_else(|| "<bubble>".to_string()),
        );
    }

    /// Prints the branch-target buffer's current contents. Left for the
    /// caller to gate on `config.dump_btb`, typically once after the run
    /// rather than per cycle.
    pub fn dump_btb(&self) {
        for (pc, target, last_taken) in self.predictor.dump() {
            println!("btb: pc=0x{:08X} target=0x{:08X} last_taken={}", pc, target, last_taken);
        }
    }

    fn step_pipelined(&mut self) {
        let cycle = self.stats.total_cycles;
        let stall = hazard::detect_stall(
            self.if_id.as_ref(),
            self.id_ex.as_ref(),
            self.ex_mem.as_ref(),
            self.mem_wb.as_ref(),
            self.config.forwarding,
        );

        // 2. Writeback: commits the *previous* cycle's MEM/WB.
        if let Some(mem_wb) = self.mem_wb.clone() {
            self.tracer.enter_stage(mem_wb.seq, TraceStage::Writeback, cycle);
            let result = stage::writeback(&mem_wb, &mut self.regs);
            if result.committed {
                self.stats.record_commit(stage::categorize(&mem_wb.control));
            }
        }

        // 3. Memory: reads the *previous* cycle's EX/MEM, still intact.
        let ex_mem_snapshot = self.ex_mem.clone();
        let new_mem_wb = match &ex_mem_snapshot {
            Some(ex_mem) => {
                self.tracer.enter_stage(ex_mem.seq, TraceStage::Memory, cycle);
                Some(stage::memory(ex_mem, &mut self.data))
            }
            None => None,
        };

        // 4. Execute: reads the *previous* cycle's ID/EX, forwarding from
        // the EX/MEM that memory just consumed (not yet overwritten) and
        // the MEM/WB memory just produced.
        let id_ex_snapshot = self.id_ex.clone();
        let new_ex_mem = match &id_ex_snapshot {
            Some(id_ex) => {
                self.tracer.enter_stage(id_ex.seq, TraceStage::Execute, cycle);
                for reg in [id_ex.instruction.rs1, id_ex.instruction.rs2] {
                    if let Some(from) = decode::forward_source(reg, ex_mem_snapshot.as_ref(), new_mem_wb.as_ref()) {
                        self.tracer.record_forward(id_ex.seq, reg, from);
                    }
                }
                Some(stage::execute(id_ex, &self.regs, ex_mem_snapshot.as_ref(), new_mem_wb.as_ref()))
            }
            None => None,
        };

        self.mem_wb = new_mem_wb;
        self.ex_mem = new_ex_mem;

        // 5. Decode: reads the *previous* cycle's IF/ID, forwarding from
        // the EX/MEM and MEM/WB just written above this same cycle.
        let mut redirect: Option<u32> = None;
        let new_id_ex = if stall {
            let if_id_pc = self.if_id.as_ref().map(|f| f.pc);
            let is_new_occurrence = if_id_pc != self.last_stall_pc;
            self.stats.record_data_stall(is_new_occurrence);
            self.last_stall_pc = if_id_pc;
            None
        } else {
            self.last_stall_pc = None;
            match self.if_id.clone() {
                None => None,
                Some(if_id) => {
                    self.tracer.enter_stage(if_id.seq, TraceStage::Decode, cycle);
                    match decode::decode(if_id.raw, if_id.pc, &self.regs, self.ex_mem.as_ref(), self.mem_wb.as_ref()) {
                        Some(decoded) => {
                            for reg in [decoded.instruction.rs1, decoded.instruction.rs2] {
                                if let Some(from) = decode::forward_source(reg, self.ex_mem.as_ref(), self.mem_wb.as_ref()) {
                                    self.tracer.record_forward(if_id.seq, reg, from);
                                }
                            }
                            if let Some(branch) = decoded.branch {
                                let mispredicted = branch.taken != if_id.predicted_taken
                                    || (branch.taken && branch.target != if_id.predicted_target);
                                if self.predictor.update(if_id.pc, branch.taken, branch.target) {
                                    self.tracer.record_btb_update(if_id.seq);
                                }
                                if mispredicted {
                                    redirect = Some(branch.target);
                                    self.stats.record_control_stall();
                                }
                            }
                            Some(IdEx {
                                pc: if_id.pc,
                                seq: if_id.seq,
                                rd: decoded.instruction.rd,
                                instruction: decoded.instruction,
                                control: decoded.control,
                                rs1_val: decoded.rs1_val,
                                rs2_val: decoded.rs2_val,
                            })
                        }
                        None => {
                            eprintln!(
                                "warning: unrecognized instruction word 0x{:08X} at pc 0x{:08X}, treated as a bubble",
                                if_id.raw, if_id.pc
                            );
                            None
                        }
                    }
                }
            }
        };
        self.id_ex = new_id_ex;

        // 6. Fetch.
        if stall {
            // PC and IF/ID frozen; the load-use consumer is replayed next cycle.
        } else if let Some(target) = redirect {
            self.pc = target;
            self.if_id = None; // one-cycle control-hazard bubble
        } else {
            self.fetch(cycle);
        }
    }

    fn fetch(&mut self, cycle: u64) {
        match self.text.get(self.pc) {
            Some(word) if word == EXIT_SENTINEL => {
                self.exited = true;
                self.if_id = None;
            }
            Some(word) => {
                let seq = self.next_seq;
                self.next_seq += 1;
                self.tracer.enter_stage(seq, TraceStage::Fetch, cycle);
                if let Some(instr) = Instruction::decode(word) {
                    self.tracer.set_disassembly(seq, &instr);
                }
                let prediction = self.predictor.predict(self.pc);
                self.if_id = Some(IfId {
                    pc: self.pc,
                    seq,
                    raw: word,
                    predicted_taken: prediction.taken,
                    predicted_target: prediction.target,
                });
                self.pc = if prediction.taken { prediction.target } else { self.pc.wrapping_add(4) };
            }
            None => {
                self.if_id = None;
            }
        }
    }

    /// Non-pipelined mode: one instruction fully fetched, decoded, executed,
    /// memory-accessed and written back per `step` call. No latches, no
    /// hazards, no speculation — always correct, useful only as a
    /// timing-free baseline to compare against.
    fn step_single_cycle(&mut self) {
        let cycle = self.stats.total_cycles;
        let word = match self.text.get(self.pc) {
            Some(word) if word != EXIT_SENTINEL => word,
            Some(_) => {
                self.exited = true;
                return;
            }
            None => return,
        };

        let seq = self.next_seq;
        self.next_seq += 1;
        self.tracer.enter_stage(seq, TraceStage::Fetch, cycle);

        let decoded = match decode::decode(word, self.pc, &self.regs, None, None) {
            Some(decoded) => decoded,
            None => {
                eprintln!("warning: unrecognized instruction word 0x{:08X} at pc 0x{:08X}", word, self.pc);
                self.pc = self.pc.wrapping_add(4);
                return;
            }
        };
        self.tracer.set_disassembly(seq, &decoded.instruction);

        let id_ex = IdEx {
            pc: self.pc,
            seq,
            rd: decoded.instruction.rd,
            instruction: decoded.instruction,
            control: decoded.control,
            rs1_val: decoded.rs1_val,
            rs2_val: decoded.rs2_val,
        };
        let ex_mem = stage::execute(&id_ex, &self.regs, None, None);
        let mem_wb = stage::memory(&ex_mem, &mut self.data);
        let result = stage::writeback(&mem_wb, &mut self.regs);
        if result.committed {
            self.stats.record_commit(stage::categorize(&mem_wb.control));
        }

        self.pc = match decoded.branch {
            Some(outcome) if outcome.taken => outcome.target,
            _ => self.pc.wrapping_add(4),
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rv32core::isa::Mnemonic;
    use rv32core::registers::Reg;
    use rv32core::Instruction as RawInstruction;

    fn reg(n: u32) -> Reg {
        Reg::from_index(n).unwrap()
    }

    fn text_of(instrs: &[RawInstruction]) -> TextImage {
        let mut text = TextImage::new();
        for (i, instr) in instrs.iter().enumerate() {
            text.insert((i * 4) as u32, instr.encode());
        }
        text
    }

    #[test]
    fn scenario_one_three_instruction_add_commits_twelve() {
        let text = text_of(&[
            RawInstruction::i(Mnemonic::Addi, reg(1), Reg::ZERO, 5),
            RawInstruction::i(Mnemonic::Addi, reg(2), Reg::ZERO, 7),
            RawInstruction::r(Mnemonic::Add, reg(3), reg(1), reg(2)),
        ]);
        let mut sim = Simulator::new(text, DataImage::new(), SimConfig::default());
        sim.run();
        assert_eq!(sim.regs().read(reg(3)), 12);
        assert_eq!(sim.stats().committed_instructions, 3);
    }

    #[test]
    fn scenario_three_unconditional_branch_skips_the_instruction_after_it() {
        let text = text_of(&[
            RawInstruction::b(Mnemonic::Beq, Reg::ZERO, Reg::ZERO, 8),
            RawInstruction::i(Mnemonic::Addi, reg(1), Reg::ZERO, 99),
            RawInstruction::i(Mnemonic::Addi, reg(2), Reg::ZERO, 1),
        ]);
        let mut sim = Simulator::new(text, DataImage::new(), SimConfig::default());
        sim.run();
        assert_eq!(sim.regs().read(reg(1)), 0);
        assert_eq!(sim.regs().read(reg(2)), 1);
        assert_eq!(sim.stats().branch_mispredictions, 1);
    }

    #[test]
    fn scenario_four_jal_jalr_round_trips_the_return_address() {
        let text = text_of(&[
            RawInstruction::j(Mnemonic::Jal, reg(1), 8),   // pc 0: jal x1, FN (FN at pc 8)
            RawInstruction::i(Mnemonic::Addi, reg(5), Reg::ZERO, 0), // pc 4: skipped
            RawInstruction::i(Mnemonic::Jalr, Reg::ZERO, reg(1), 0), // pc 8: jalr x0, 0(x1)
        ]);
        let mut sim = Simulator::new(text, DataImage::new(), SimConfig::default());
        sim.run();
        assert_eq!(sim.regs().read(reg(1)), 4);
    }

    #[test]
    fn scenario_two_load_use_stalls_exactly_once_with_forwarding() {
        let mut data = DataImage::new();
        data.insert(rv32core::image::DATA_BASE, 0x2A);
        let text = text_of(&[
            RawInstruction::i(Mnemonic::Addi, reg(2), Reg::ZERO, rv32core::image::DATA_BASE as i32),
            RawInstruction::i(Mnemonic::Lw, reg(1), reg(2), 0),
            RawInstruction::r(Mnemonic::Add, reg(3), reg(1), reg(4)),
        ]);
        let mut sim = Simulator::new(text, data, SimConfig::default());
        sim.run();
        assert_eq!(sim.regs().read(reg(3)), 0x2A);
        assert_eq!(sim.stats().stalls.data_hazard_cycles, 1);
        assert_eq!(sim.stats().distinct_data_hazards, 1);
    }

    #[test]
    fn without_forwarding_the_same_program_stalls_more() {
        let mut data = DataImage::new();
        data.insert(rv32core::image::DATA_BASE, 0x2A);
        let text = text_of(&[
            RawInstruction::i(Mnemonic::Addi, reg(2), Reg::ZERO, rv32core::image::DATA_BASE as i32),
            RawInstruction::i(Mnemonic::Lw, reg(1), reg(2), 0),
            RawInstruction::r(Mnemonic::Add, reg(3), reg(1), reg(4)),
        ]);
        let config = SimConfig { forwarding: false, ..SimConfig::default() };
        let mut sim = Simulator::new(text, data, config);
        sim.run();
        assert_eq!(sim.regs().read(reg(3)), 0x2A);
        assert!(sim.stats().stalls.data_hazard_cycles > 1);
    }

    #[test]
    fn x0_in_the_register_file_stays_zero_across_the_whole_run() {
        let text = text_of(&[
            RawInstruction::i(Mnemonic::Addi, Reg::ZERO, Reg::ZERO, 5),
            RawInstruction::r(Mnemonic::Add, reg(1), Reg::ZERO, Reg::ZERO),
        ]);
        let mut sim = Simulator::new(text, DataImage::new(), SimConfig::default());
        sim.run();
        assert_eq!(sim.regs().read(Reg::ZERO), 0);
    }

    #[test]
    fn cycle_cap_halts_an_infinite_loop() {
        let text = text_of(&[RawInstruction::b(Mnemonic::Beq, Reg::ZERO, Reg::ZERO, 0)]);
        let config = SimConfig { cycle_cap: 50, ..SimConfig::default() };
        let mut sim = Simulator::new(text, DataImage::new(), config);
        sim.run();
        assert!(sim.is_halted());
        assert_eq!(sim.stats().total_cycles, 50);
    }

    #[test]
    fn two_runs_over_the_same_program_are_identical() {
        let text = text_of(&[
            RawInstruction::i(Mnemonic::Addi, reg(1), Reg::ZERO, 5),
            RawInstruction::i(Mnemonic::Addi, reg(2), Reg::ZERO, 7),
            RawInstruction::r(Mnemonic::Add, reg(3), reg(1), reg(2)),
        ]);
        let mut a = Simulator::new(text.clone(), DataImage::new(), SimConfig::default());
        let mut b = Simulator::new(text, DataImage::new(), SimConfig::default());
        a.run();
        b.run();
        assert_eq!(a.regs().snapshot(), b.regs().snapshot());
        assert_eq!(a.stats().total_cycles, b.stats().total_cycles);
        assert_eq!(a.stats().committed_instructions, b.stats().committed_instructions);
    }

    #[test]
    fn tracer_records_the_forward_that_fed_the_load_use_consumer() {
        let text = text_of(&[
            RawInstruction::i(Mnemonic::Addi, reg(1), Reg::ZERO, 5),
            RawInstruction::r(Mnemonic::Add, reg(3), reg(1), reg(4)),
        ]);
        let mut sim = Simulator::new(text, DataImage::new(), SimConfig::default());
        sim.run();
        let add_trace = sim.tracer().get(1).expect("add instruction should have a trace entry");
        assert!(add_trace.forwards.iter().any(|f| f.register == reg(1)));
    }

    #[test]
    fn non_pipelined_mode_computes_the_same_result() {
        let text = text_of(&[
            RawInstruction::i(Mnemonic::Addi, reg(1), Reg::ZERO, 5),
            RawInstruction::i(Mnemonic::Addi, reg(2), Reg::ZERO, 7),
            RawInstruction::r(Mnemonic::Add, reg(3), reg(1), reg(2)),
        ]);
        let config = SimConfig { pipelining: false, ..SimConfig::default() };
        let mut sim = Simulator::new(text, DataImage::new(), config);
        sim.run();
        assert_eq!(sim.regs().read(reg(3)), 12);
        assert_eq!(sim.stats().committed_instructions, 3);
    }
}
