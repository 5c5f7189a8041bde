//! The main loop of the tsh program.

use std::env;
use std::fs::File;
use std::ops::ControlFlow;
use std::os::fd::IntoRawFd;
use std::sync::atomic::Ordering;

use tsh::{
    builtins::shared::{STATUS_CMD_ERROR, STATUS_CMD_OK},
    common::{program_name, PROGRAM_NAME},
    flog::{self, activate_flog_categories_by_pattern, set_flog_file_fd, FLOG},
    getopt::{longopt, ArgType::*, Getopter, LongOpt},
    io::{FdOutputStream, IoStreams, OutputStream},
    reader::{reader_read, ReaderConfig},
    shell::Shell,
    signal::{signal_set_handlers, signal_unblock_all},
    wutil::fatal_os_error,
};

#[derive(Default)]
struct TshCmdOpts {
    verbose: bool,
    no_prompt: bool,
    debug_output: Option<String>,
}

const USAGE: &str = "\
Usage: tsh [-hvp]
   -h   print this message
   -v   print additional diagnostic information
   -p   do not emit a command prompt
   -d CATEGORIES   enable debug output for the given categories
   -o PATH         write debug output to PATH
";

fn usage(out: &mut OutputStream) {
    out.append(USAGE);
}

/// Parse the command line. Break with a status if the program should exit right away.
fn tsh_parse_opt(args: &[&str], opts: &mut TshCmdOpts) -> ControlFlow<i32> {
    const PRINT_DEBUG_CATEGORIES_ARG: char = 1 as char;

    const SHORT_OPTS: &str = "hvpd:o:";
    const LONG_OPTS: &[LongOpt<'static>] = &[
        longopt("help", NoArgument, 'h'),
        longopt("verbose", NoArgument, 'v'),
        longopt("no-prompt", NoArgument, 'p'),
        longopt("debug", RequiredArgument, 'd'),
        longopt("debug-output", RequiredArgument, 'o'),
        longopt(
            "print-debug-categories",
            NoArgument,
            PRINT_DEBUG_CATEGORIES_ARG,
        ),
    ];

    let mut out = OutputStream::Fd(FdOutputStream::new(libc::STDOUT_FILENO));
    let mut w = Getopter::new(SHORT_OPTS, LONG_OPTS, args);
    while let Some(c) = w.next_opt() {
        match c {
            'h' => {
                usage(&mut out);
                return ControlFlow::Break(STATUS_CMD_ERROR);
            }
            'v' => opts.verbose = true,
            'p' => opts.no_prompt = true,
            'd' => {
                activate_flog_categories_by_pattern(w.optarg.unwrap_or_default());
                for cat in flog::categories::all_categories() {
                    if cat.enabled.load(Ordering::Relaxed) {
                        out.appendln(format!("Debug enabled for category: {}", cat.name));
                    }
                }
            }
            'o' => opts.debug_output = w.optarg.map(str::to_owned),
            PRINT_DEBUG_CATEGORIES_ARG => {
                let cats = flog::categories::all_categories();
                let name_width = cats.iter().map(|cat| cat.name.len()).max().unwrap_or(0);
                for cat in cats {
                    out.appendln(format!(
                        "{:<width$} {}",
                        cat.name,
                        cat.description,
                        width = name_width
                    ));
                }
                return ControlFlow::Break(STATUS_CMD_OK);
            }
            ':' => {
                out.appendln(format!(
                    "{}: option requires an argument -- {}",
                    program_name(),
                    w.bad_option.as_deref().unwrap_or_default()
                ));
                usage(&mut out);
                return ControlFlow::Break(STATUS_CMD_ERROR);
            }
            ';' => {
                out.appendln(format!(
                    "{}: option does not take an argument -- {}",
                    program_name(),
                    w.bad_option.as_deref().unwrap_or_default()
                ));
                usage(&mut out);
                return ControlFlow::Break(STATUS_CMD_ERROR);
            }
            _ => {
                out.appendln(format!(
                    "{}: invalid option -- {}",
                    program_name(),
                    w.bad_option.as_deref().unwrap_or_default()
                ));
                usage(&mut out);
                return ControlFlow::Break(STATUS_CMD_ERROR);
            }
        }
    }
    ControlFlow::Continue(())
}

fn main() {
    let _ = PROGRAM_NAME.set("tsh");
    let status = throwing_main();
    std::process::exit(status)
}

fn throwing_main() -> i32 {
    // Diagnostics share stdout, so a driver reading one pipe sees everything in order.
    if unsafe { libc::dup2(libc::STDOUT_FILENO, libc::STDERR_FILENO) } < 0 {
        fatal_os_error("dup2");
    }

    let args: Vec<String> = env::args_os()
        .map(|arg| arg.to_string_lossy().into_owned())
        .collect();
    let mut args: Vec<&str> = args.iter().map(String::as_str).collect();
    if args.is_empty() {
        args.push("tsh");
    }

    // Enable debug categories set in TSH_DEBUG, in addition to the ones given via --debug.
    if let Ok(debug_categories) = env::var("TSH_DEBUG") {
        activate_flog_categories_by_pattern(&debug_categories);
    }

    let mut opts = TshCmdOpts::default();
    if let ControlFlow::Break(status) = tsh_parse_opt(&args, &mut opts) {
        return status;
    }

    // --debug-output takes precedence, otherwise $TSH_DEBUG_OUTPUT is used.
    if opts.debug_output.is_none() {
        opts.debug_output = env::var("TSH_DEBUG_OUTPUT").ok();
    }
    if let Some(debug_path) = opts.debug_output {
        match File::options()
            .write(true)
            .truncate(true)
            .create(true)
            .open(&debug_path)
        {
            Ok(dbg_file) => set_flog_file_fd(dbg_file.into_raw_fd()),
            Err(e) => {
                let mut err = OutputStream::Fd(FdOutputStream::new(libc::STDERR_FILENO));
                err.appendln(format!("Could not open file {:?}", debug_path));
                err.appendln(e.to_string());
                return STATUS_CMD_ERROR;
            }
        }
    }

    signal_unblock_all();
    signal_set_handlers();

    let mut shell = Shell::default();
    shell.verbose = opts.verbose;

    let mut out = OutputStream::Fd(FdOutputStream::new(libc::STDOUT_FILENO));
    let mut err = OutputStream::Fd(FdOutputStream::new(libc::STDERR_FILENO));
    let mut streams = IoStreams::new(&mut out, &mut err);
    let config = ReaderConfig {
        emit_prompt: !opts.no_prompt,
    };
    let status = reader_read(&mut shell, std::io::stdin().lock(), &mut streams, config);
    FLOG!(reader, "Exiting with status", status);
    status
}
