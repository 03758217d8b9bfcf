//! Quoha VM harness.
//!
//! Builds a VM from command-line arguments, prints its memory layout, and runs a
//! small demonstration program once.
//!
//! # Usage
//! ```text
//! quoha [OPTIONS]
//! ```
//!
//! # Options
//! - `--core-kib <n>`: Core size in KiB (default 64)
//! - `--data-kib <n>`: Data stack size in KiB (default 4)
//! - `--return-kib <n>`: Return stack size in KiB (default 4)
//! - `--budget <n>`: Maximum ticks per run
//! - `--halt-advance`: Treat `HALT` as a no-op instead of ending the run
//! - `--panic-demo`: End the demo on `PANIC "done"` instead of `HALT`
//!
//! The process exits with status 1 if the run panicked.

use quoha::virtual_machine::config::{DEFAULT_CORE_KIB, DEFAULT_STACK_KIB};
use quoha::{Cell, HaltMode, LogSink, Op, Value, Vm, VmConfig, debug, error, info};
use std::env;
use std::process;
use std::str::FromStr;

fn main() {
    let args: Vec<String> = env::args().collect();
    let (config, panic_demo) = parse_args(&args);

    print_sizes();

    let mut vm = match Vm::new(config) {
        Ok(vm) => vm,
        Err(e) => {
            error!("Failed to create VM: {e}");
            process::exit(1);
        }
    };
    print_layout(&vm);

    let program = demo_program(panic_demo);
    if let Err(e) = vm.write_program(0, &program) {
        error!("Failed to load demo program: {e}");
        process::exit(1);
    }
    for (index, cell) in program.iter().enumerate() {
        debug!("{index:>4}: {cell}");
    }
    if let Err(e) = vm.set_program_counter(0) {
        error!("Failed to set program counter: {e}");
        process::exit(1);
    }

    match vm.run(&mut LogSink) {
        Ok(stats) => {
            info!(
                "Halted at cell {} after {} ticks",
                stats.halted_at, stats.ticks
            );
            for (op, count) in stats.profile.iter() {
                info!("  {:<6} {}", op.mnemonic(), count);
            }
        }
        Err(_) => {
            for (op, count) in vm.tick_profile().iter() {
                info!("  {:<6} {}", op.mnemonic(), count);
            }
            process::exit(1);
        }
    }
}

/// NOOP, a call into a subroutine that yields and returns, then `HALT`, or
/// `PANIC "done"` when `panic_demo` is set.
fn demo_program(panic_demo: bool) -> Vec<Cell> {
    let last = if panic_demo {
        Cell::text("done").with_op(Op::Panic)
    } else {
        Cell::instruction(Op::Halt)
    };
    vec![
        Cell::instruction(Op::Noop),
        Cell::address(3).with_op(Op::Gosub),
        last,
        Cell::instruction(Op::Yield),
        Cell::instruction(Op::Rtrn),
    ]
}

fn print_sizes() {
    info!("size_of::<Cell>()  = {}", size_of::<Cell>());
    info!("size_of::<Value>() = {}", size_of::<Value>());
    info!("size_of::<Vm>()    = {}", size_of::<Vm>());
    info!("size_of::<usize>() = {}", size_of::<usize>());
    info!("size_of::<u64>()   = {}", size_of::<u64>());
}

fn print_layout(vm: &Vm) {
    let (core, data, ret) = vm.regions();
    info!("core   {:>8} cells  [{}..{})", core.len(), core.start, core.end);
    info!("data   {:>8} cells  [{}..{})", data.len(), data.start, data.end);
    info!("return {:>8} cells  [{}..{})", ret.len(), ret.start, ret.end);
    info!(
        "tick budget {}, halt mode {:?}",
        vm.tick_budget(),
        vm.halt_mode()
    );
}

/// Returns the VM configuration and whether to run the panicking demo.
fn parse_args(args: &[String]) -> (VmConfig, bool) {
    let mut core_kib = DEFAULT_CORE_KIB;
    let mut data_kib = DEFAULT_STACK_KIB;
    let mut return_kib = DEFAULT_STACK_KIB;
    let mut budget: Option<u64> = None;
    let mut halt_mode = HaltMode::Stop;
    let mut panic_demo = false;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "-h" | "--help" => {
                print_usage(&args[0]);
                process::exit(0);
            }
            "--core-kib" => {
                core_kib = flag_value(args, i);
                i += 2;
            }
            "--data-kib" => {
                data_kib = flag_value(args, i);
                i += 2;
            }
            "--return-kib" => {
                return_kib = flag_value(args, i);
                i += 2;
            }
            "--budget" => {
                budget = Some(flag_value(args, i));
                i += 2;
            }
            "--halt-advance" => {
                halt_mode = HaltMode::Advance;
                i += 1;
            }
            "--panic-demo" => {
                panic_demo = true;
                i += 1;
            }
            other => {
                eprintln!("Unexpected argument: {}\n", other);
                print_usage(&args[0]);
                process::exit(1);
            }
        }
    }

    let config = VmConfig::from_kib(core_kib, data_kib, return_kib).with_halt_mode(halt_mode);
    let config = match budget {
        Some(budget) => config.with_tick_budget(budget),
        None => config,
    };
    (config, panic_demo)
}

/// Parses the value following the flag at `args[i]`, exiting on a missing or bad value.
fn flag_value<T: FromStr>(args: &[String], i: usize) -> T {
    let flag = &args[i];
    let Some(raw) = args.get(i + 1) else {
        eprintln!("{flag} requires an argument");
        process::exit(1);
    };
    match raw.parse() {
        Ok(value) => value,
        Err(_) => {
            eprintln!("Invalid value for {flag}: {raw}");
            process::exit(1);
        }
    }
}

const USAGE: &str = "\
Quoha VM harness

USAGE:
    {program} [OPTIONS]

OPTIONS:
    --core-kib <n>      Core size in KiB (default 64)
    --data-kib <n>      Data stack size in KiB (default 4)
    --return-kib <n>    Return stack size in KiB (default 4)
    --budget <n>        Maximum ticks per run (default 1000000)
    --halt-advance      Treat HALT as a no-op instead of ending the run
    --panic-demo        End the demo on PANIC \"done\" instead of HALT
    -h, --help          Print this help message

ENVIRONMENT:
    QUOHA_LOG    Minimum log level: debug, info, warn, error, off (default info)

EXAMPLES:
    # Run the demo with default sizes
    {program}

    # Show the panic report path
    {program} --panic-demo

    # Tiny stacks and a short watchdog
    {program} --data-kib 1 --return-kib 1 --budget 100
";

/// Prints usage information to stderr.
fn print_usage(program: &str) {
    eprintln!("{}", USAGE.replace("{program}", program));
}

#[cfg(test)]
mod tests {
    use super::*;
    use quoha::{NullSink, PanicKind};

    fn run_demo(panic_demo: bool) -> quoha::RunResult {
        let mut vm = Vm::new(VmConfig::default()).unwrap();
        vm.write_program(0, &demo_program(panic_demo)).unwrap();
        vm.set_program_counter(0).unwrap();
        vm.run(&mut NullSink)
    }

    #[test]
    fn demo_halts_cleanly_by_default() {
        let stats = run_demo(false).unwrap();
        assert_eq!(stats.halted_at, 2);
        assert_eq!(stats.ticks, 5);
        assert_eq!(stats.profile.count(Op::Rtrn), 1);
    }

    #[test]
    fn panic_demo_reports_done() {
        let panic = run_demo(true).unwrap_err();
        assert_eq!(panic.kind, PanicKind::ExplicitPanic);
        assert_eq!(panic.message, Some("done"));
        assert_eq!(panic.index, 2);
    }

    #[test]
    fn panic_demo_flag_is_parsed() {
        let args: Vec<String> = ["quoha", "--panic-demo", "--budget", "7"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let (config, panic_demo) = parse_args(&args);
        assert!(panic_demo);
        assert_eq!(config.tick_budget, 7);

        let (_, panic_demo) = parse_args(&["quoha".to_string()]);
        assert!(!panic_demo);
    }
}
