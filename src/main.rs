//! Minimal CLI harness driving the wipe engine end to end. This binary stands in for the
//! external configuration-file/CLI parser referenced by §6 of the engine's design: it
//! builds a [`Configuration`], enumerates devices, and hands both to [`Supervisor`]. Device
//! selection UI, PDF certificates, and temperature probing are real external collaborators
//! the engine only talks to through traits -- none of that is implemented here.

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand, ValueEnum};
use sayonara_wipe::algorithms::pattern_engine::MethodKind;
use sayonara_wipe::algorithms::round_size::VerifyMode;
use sayonara_wipe::crypto::PrngAlgorithm;
use sayonara_wipe::drives::DriveDetector;
use sayonara_wipe::io::{IOMode, SyncPolicy};
use sayonara_wipe::wipe_orchestrator::{EXIT_NON_PRIVILEGED, EXIT_REPORT_DIR_FAILURE};
use sayonara_wipe::{logging, BusClass, Configuration, DeviceContext, Supervisor};
use std::io::Write;

#[derive(Parser)]
#[command(name = "sayonara")]
#[command(about = "Secure block-device erasure engine")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Emit debug-level log events
    #[arg(long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// List block devices this host can enumerate
    List {
        /// Include USB-attached devices
        #[arg(long)]
        include_usb: bool,
    },

    /// Wipe a single device
    Wipe {
        /// Device path, e.g. /dev/sdb
        device: String,

        #[command(flatten)]
        opts: WipeOpts,

        /// Skip the interactive confirmation prompt
        #[arg(long)]
        autonuke: bool,
    },

    /// Wipe every enumerated device except those named with --exclude (EXTREMELY DANGEROUS)
    WipeAll {
        #[command(flatten)]
        opts: WipeOpts,

        /// Device paths to exclude, comma-separated (up to 32)
        #[arg(long, value_delimiter = ',')]
        exclude: Vec<String>,

        /// Exclude USB-attached devices
        #[arg(long)]
        nousb: bool,

        /// Skip the interactive confirmation prompt
        #[arg(long)]
        autonuke: bool,

        /// Run the (stub) auto-poweroff collaborator after a fully successful run
        #[arg(long)]
        autopoweroff: bool,
    },
}

#[derive(clap::Args)]
struct WipeOpts {
    /// Overwrite method
    #[arg(short, long, default_value = "dod-short")]
    method: CliMethod,

    /// PRNG feeding random passes
    #[arg(long, default_value = "aes-ctr")]
    prng: CliPrng,

    /// Number of times to repeat the method body
    #[arg(long, default_value_t = 1)]
    rounds: u32,

    /// Verification mode applied after write passes
    #[arg(long, default_value = "last")]
    verify: CliVerify,

    /// Skip the trailing 0x00 blank pass
    #[arg(long)]
    noblank: bool,

    /// Data-sync cadence: 0 = once at pass end, N>=1 = every N writes
    #[arg(long, default_value_t = 0)]
    sync: u32,

    /// I/O mode
    #[arg(long, default_value = "auto")]
    io_mode: CliIoMode,

    /// Anonymize serial numbers in logs
    #[arg(long)]
    quiet: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum CliMethod {
    Zero,
    One,
    Random,
    #[value(name = "dod-short")]
    DodShort,
    #[value(name = "dod-522022m")]
    Dod522022M,
    Gutmann,
    Ops2,
    Bruce7,
    Bmb,
    Is5Enh,
    VerifyZero,
    VerifyOne,
    SecureErase,
    SecureErasePrngVerify,
    SanitizeCryptoErase,
    SanitizeBlockErase,
    SanitizeOverwrite,
}

impl From<CliMethod> for MethodKind {
    fn from(m: CliMethod) -> Self {
        match m {
            CliMethod::Zero => MethodKind::Zero,
            CliMethod::One => MethodKind::One,
            CliMethod::Random => MethodKind::Random,
            CliMethod::DodShort => MethodKind::DodShort,
            CliMethod::Dod522022M => MethodKind::Dod522022M,
            CliMethod::Gutmann => MethodKind::Gutmann,
            CliMethod::Ops2 => MethodKind::Ops2,
            CliMethod::Bruce7 => MethodKind::Bruce7,
            CliMethod::Bmb => MethodKind::Bmb,
            CliMethod::Is5Enh => MethodKind::Is5Enh,
            CliMethod::VerifyZero => MethodKind::VerifyZero,
            CliMethod::VerifyOne => MethodKind::VerifyOne,
            CliMethod::SecureErase => MethodKind::SecureErase,
            CliMethod::SecureErasePrngVerify => MethodKind::SecureErasePrngVerify,
            CliMethod::SanitizeCryptoErase => MethodKind::SanitizeCryptoErase,
            CliMethod::SanitizeBlockErase => MethodKind::SanitizeBlockErase,
            CliMethod::SanitizeOverwrite => MethodKind::SanitizeOverwrite,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum CliPrng {
    Twister,
    Isaac,
    Xoshiro256,
    #[value(name = "aes-ctr")]
    AesCtr,
    #[value(name = "aes-xts")]
    AesXts,
    Ascon,
}

impl From<CliPrng> for PrngAlgorithm {
    fn from(p: CliPrng) -> Self {
        match p {
            CliPrng::Twister => PrngAlgorithm::Twister,
            CliPrng::Isaac => PrngAlgorithm::Isaac,
            CliPrng::Xoshiro256 => PrngAlgorithm::Xoshiro256,
            CliPrng::AesCtr => PrngAlgorithm::AesCtr,
            CliPrng::AesXts => PrngAlgorithm::AesXts,
            CliPrng::Ascon => PrngAlgorithm::Ascon,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum CliVerify {
    Off,
    Last,
    All,
}

impl From<CliVerify> for VerifyMode {
    fn from(v: CliVerify) -> Self {
        match v {
            CliVerify::Off => VerifyMode::None,
            CliVerify::Last => VerifyMode::Last,
            CliVerify::All => VerifyMode::All,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum CliIoMode {
    Auto,
    Direct,
    Cached,
}

impl From<CliIoMode> for IOMode {
    fn from(m: CliIoMode) -> Self {
        match m {
            CliIoMode::Auto => IOMode::Auto,
            CliIoMode::Direct => IOMode::Direct,
            CliIoMode::Cached => IOMode::Cached,
        }
    }
}

impl WipeOpts {
    fn into_configuration(self, exclude: Vec<String>, nousb: bool, autonuke: bool, autopoweroff: bool) -> Configuration {
        Configuration {
            method: self.method.into(),
            prng: self.prng.into(),
            rounds: self.rounds,
            blank_after: !self.noblank,
            verify_mode: self.verify.into(),
            sync_policy: SyncPolicy::from_n(self.sync),
            io_mode: self.io_mode.into(),
            exclude,
            nousb,
            quiet: self.quiet,
            verbose: false,
            autonuke,
            autopoweroff,
            nowait: autonuke,
            nosignals: false,
            nogui: true,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init_tracing(cli.verbose);

    if let Err(code) = sayonara_wipe::wipe_orchestrator::preflight_checks(None) {
        if code == EXIT_NON_PRIVILEGED {
            eprintln!("sayonara: this engine overwrites raw block devices and requires root privileges");
        } else if code == EXIT_REPORT_DIR_FAILURE {
            eprintln!("sayonara: report directory is not writable");
        }
        std::process::exit(code);
    }

    let exit_code = match cli.command {
        Commands::List { include_usb } => {
            list_devices(include_usb)?;
            0
        }
        Commands::Wipe { device, opts, autonuke } => run_wipe_one(&device, opts, autonuke)?,
        Commands::WipeAll { opts, exclude, nousb, autonuke, autopoweroff } => {
            run_wipe_all(opts, exclude, nousb, autonuke, autopoweroff)?
        }
    };

    std::process::exit(exit_code);
}

fn list_devices(include_usb: bool) -> Result<()> {
    let devices = DriveDetector::detect_all_drives().map_err(|e| anyhow!("enumerating devices: {e}"))?;
    for ctx in devices.iter().filter(|d| include_usb || d.bus_class != BusClass::Usb) {
        println!(
            "{:<14} {:<22} {:>12} sectors  bus={:?} ssd={}",
            ctx.device_path,
            ctx.model,
            ctx.total_size_bytes / ctx.logical_sector_size.max(1),
            ctx.bus_class,
            ctx.is_ssd,
        );
    }
    Ok(())
}

fn run_wipe_one(device: &str, opts: WipeOpts, autonuke: bool) -> Result<i32> {
    let all = DriveDetector::detect_all_drives().map_err(|e| anyhow!("enumerating devices: {e}"))?;
    let target: Vec<DeviceContext> = all.into_iter().filter(|d| d.device_path == device).collect();
    if target.is_empty() {
        return Err(anyhow!("no such device: {device}"));
    }

    if !autonuke && !confirm_destructive(&target) {
        println!("aborted");
        return Ok(1);
    }

    let config = opts.into_configuration(Vec::new(), false, autonuke, false);
    let supervisor = Supervisor::new(config);
    let outcome = supervisor.run(target);
    print_outcome(&outcome);
    Ok(outcome.exit_code)
}

fn run_wipe_all(opts: WipeOpts, exclude: Vec<String>, nousb: bool, autonuke: bool, autopoweroff: bool) -> Result<i32> {
    let all = DriveDetector::detect_all_drives().map_err(|e| anyhow!("enumerating devices: {e}"))?;
    let candidates: Vec<DeviceContext> = all
        .into_iter()
        .filter(|d| !exclude.iter().any(|p| p == &d.device_path))
        .filter(|d| !(nousb && d.bus_class == BusClass::Usb))
        .collect();

    if candidates.is_empty() {
        println!("no selectable devices");
        return Ok(1);
    }

    if !autonuke && !confirm_destructive(&candidates) {
        println!("aborted");
        return Ok(1);
    }

    let config = opts.into_configuration(exclude, nousb, autonuke, autopoweroff);
    let supervisor = Supervisor::new(config);
    let outcome = supervisor.run(candidates);
    print_outcome(&outcome);
    Ok(outcome.exit_code)
}

fn confirm_destructive(devices: &[DeviceContext]) -> bool {
    println!("the following device(s) will be irreversibly erased:");
    for d in devices {
        println!("  {} ({}, {} bytes)", d.device_path, d.model, d.total_size_bytes);
    }
    print!("type \"yes\" to continue: ");
    std::io::stdout().flush().ok();

    let mut answer = String::new();
    if std::io::stdin().read_line(&mut answer).is_err() {
        return false;
    }
    answer.trim().eq_ignore_ascii_case("yes")
}

fn print_outcome(outcome: &sayonara_wipe::wipe_orchestrator::SupervisorOutcome) {
    for report in &outcome.reports {
        println!(
            "{:<14} {:?} bytes_erased={} passes={}",
            report.result.device_path,
            report.status,
            report.result.bytes_erased,
            report.result.passes.len(),
        );
    }
}
