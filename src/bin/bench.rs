//! VM benchmark binary.
//!
//! Measures dispatch throughput for representative programs.
//! Run with: `cargo run --release --bin bench`

use std::time::{Duration, Instant};

use quoha::{Cell, NullSink, Op, PanicKind, RunResult, Vm, VmConfig};

// ---------------------------------------------------------------------------
// Benchmark harness
// ---------------------------------------------------------------------------

struct BenchResult {
    name: &'static str,
    iterations: u64,
    total: Duration,
    ticks: u64,
}

impl BenchResult {
    fn avg(&self) -> Duration {
        self.total / self.iterations.max(1) as u32
    }

    fn print(&self) {
        let avg = self.avg();
        let ns_per_op = avg.as_nanos();
        let ns_per_tick = if self.ticks > 0 {
            format!("{:>8.2}", ns_per_op as f64 / self.ticks as f64)
        } else {
            "       -".to_string()
        };
        println!(
            "  {:<30} {:>7} iters {:>10.3} us/iter {:>10} ticks  {} ns/tick",
            self.name,
            self.iterations,
            ns_per_op as f64 / 1000.0,
            self.ticks,
            ns_per_tick,
        );
    }
}

/// Runs `f` for at least `min_duration`, returning aggregated results.
fn bench<F>(name: &'static str, min_duration: Duration, mut f: F) -> BenchResult
where
    F: FnMut() -> u64,
{
    // Warmup
    for _ in 0..5 {
        f();
    }

    let mut iterations = 0u64;
    let mut last_ticks = 0u64;
    let start = Instant::now();
    while start.elapsed() < min_duration {
        last_ticks = f();
        iterations += 1;
    }
    let total = start.elapsed();

    BenchResult {
        name,
        iterations,
        total,
        ticks: last_ticks,
    }
}

/// Restarts `vm` at cell 0 and returns the ticks the run consumed.
fn run_ticks(vm: &mut Vm, expect_watchdog: bool) -> u64 {
    vm.clear_stacks();
    vm.set_program_counter(0).expect("empty core");
    let result: RunResult = vm.run(&mut NullSink);
    match result {
        Ok(stats) => stats.ticks,
        Err(panic) if expect_watchdog && panic.kind == PanicKind::WatchdogExpired => {
            vm.tick_profile().total()
        }
        Err(panic) => panic!("unexpected vm panic: {panic}"),
    }
}

fn load(config: VmConfig, program: &[Cell]) -> Vm {
    let mut vm = Vm::new(config).expect("vm new failed");
    vm.write_program(0, program).expect("program does not fit");
    vm
}

// ---------------------------------------------------------------------------
// Benchmark definitions
// ---------------------------------------------------------------------------

const TIGHT_LOOP_TICKS: u64 = 100_000;
const CALLS: usize = 10_000;
const COUNTDOWN: usize = 10_000;

/// `JMP +0` forever; the watchdog ends it.
fn tight_loop() -> Vm {
    let config = VmConfig::new(1, 1, 1).with_tick_budget(TIGHT_LOOP_TICKS);
    load(config, &[Cell::offset(0).with_op(Op::Jmp)])
}

/// `CALLS` straight-line calls into a `RTRN` subroutine, then `HALT`.
fn call_overhead() -> Vm {
    let sub = CALLS + 1;
    let mut program = vec![Cell::address(sub).with_op(Op::Gosub); CALLS];
    program.push(Cell::instruction(Op::Halt));
    program.push(Cell::instruction(Op::Rtrn));
    load(VmConfig::new(program.len(), 1, 1), &program)
}

/// `JNZ +0` over `COUNTDOWN` truthy operands and a final zero, then `HALT`.
fn jnz_countdown() -> Vm {
    let program = [Cell::offset(0).with_op(Op::Jnz), Cell::instruction(Op::Halt)];
    load(VmConfig::new(2, COUNTDOWN + 1, 1), &program)
}

fn seed_countdown(vm: &mut Vm) {
    vm.push_data(Some(Cell::integer(0))).expect("seed");
    for n in 1..=COUNTDOWN {
        vm.push_data(Some(Cell::integer(n as i64))).expect("seed");
    }
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() {
    let min = Duration::from_secs(2);

    println!("VM Benchmarks (each runs for >= 2s)\n");
    println!(
        "  {:<30} {:>7}       {:>14} {:>16}  {:>10}",
        "benchmark", "iters", "avg time", "ticks/run", "ns/tick"
    );
    println!("  {}", "-".repeat(86));

    // 1. Tight JMP loop (100K ticks)
    let mut vm = tight_loop();
    let r = bench("jmp_loop(100K)", min, || run_ticks(&mut vm, true));
    r.print();

    // 2. GOSUB/RTRN overhead (10K calls)
    let mut vm = call_overhead();
    let r = bench("call_overhead(10K)", min, || run_ticks(&mut vm, false));
    r.print();

    // 3. JNZ countdown (10K branches, operand seeding included)
    let mut vm = jnz_countdown();
    let r = bench("jnz_countdown(10K)", min, || {
        vm.clear_stacks();
        seed_countdown(&mut vm);
        vm.set_program_counter(0).expect("empty core");
        match vm.run(&mut NullSink) {
            Ok(stats) => stats.ticks,
            Err(panic) => panic!("unexpected vm panic: {panic}"),
        }
    });
    r.print();

    println!();
}
