use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use tracing::{Level, info};

use wifi_sweep_abstract::ExperimentPlan;
use wifi_sweep_harness::{
    CancelToken, Confirm, Launcher, Ns3Launcher, ResultsWorkspace, StalePolicy, SweepReport,
    SweepRunner, clear_stale_output, dry_run,
};

/// Experiment driver for wifi simulation sweeps.
///
/// Enumerates parameter combinations, launches the simulator once per
/// combination and repetition, collects the appended result rows and turns
/// them into per-combination aggregates and charts.
#[derive(Parser)]
#[command(name = "wifi-sweep", version, about)]
struct Cli {
    /// Verbose logging
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run a sweep from a preset or a plan file
    Run(RunArgs),
    /// List the built-in presets
    List,
    /// Parse and validate a plan without running it
    Validate(ValidateArgs),
    /// Re-render the charts of a finished results directory
    Replot(ReplotArgs),
}

#[derive(clap::Args)]
struct RunArgs {
    /// Preset name, see `list`
    #[arg(long, conflicts_with = "plan")]
    preset: Option<String>,

    /// Plan file (TOML)
    #[arg(long)]
    plan: Option<PathBuf>,

    /// Root of a built ns-3 tree
    #[arg(long)]
    sim_root: PathBuf,

    /// Directory results directories are created under
    #[arg(long, default_value = "results")]
    results_root: PathBuf,

    /// Override the plan's base seed
    #[arg(long)]
    seed: Option<u64>,

    /// Remove a stale output file without asking
    #[arg(long, short = 'y')]
    yes: bool,

    /// Print every command the sweep would run, without running anything
    #[arg(long)]
    dry_run: bool,
}

#[derive(clap::Args)]
struct ValidateArgs {
    /// Preset name, see `list`
    #[arg(long, conflicts_with = "plan")]
    preset: Option<String>,

    /// Plan file (TOML)
    #[arg(long)]
    plan: Option<PathBuf>,

    /// Print the effective plan as TOML
    #[arg(long)]
    print: bool,
}

#[derive(clap::Args)]
struct ReplotArgs {
    /// Results directory holding plan.toml and sweep-report.json
    #[arg(long)]
    dir: PathBuf,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    match cli.command {
        Command::Run(args) => cmd_run(args),
        Command::List => cmd_list(),
        Command::Validate(args) => cmd_validate(args),
        Command::Replot(args) => cmd_replot(args),
    }
}

fn init_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .init();
}

fn load_plan(preset: Option<&str>, plan: Option<&Path>) -> Result<ExperimentPlan> {
    match (preset, plan) {
        (Some(name), None) => wifi_sweep_presets::by_name(name),
        (None, Some(path)) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read plan {}", path.display()))?;
            let plan = toml::from_str(&text)
                .with_context(|| format!("failed to parse plan {}", path.display()))?;
            Ok(plan)
        }
        (None, None) => bail!("pass --preset NAME or --plan FILE"),
        (Some(_), Some(_)) => bail!("--preset and --plan cannot be used together"),
    }
}

fn cmd_run(args: RunArgs) -> Result<()> {
    let mut plan = load_plan(args.preset.as_deref(), args.plan.as_deref())?;
    if let Some(seed) = args.seed {
        plan.base_seed = seed;
    }
    plan.validate().context("invalid experiment plan")?;

    let launcher = Ns3Launcher::new(args.sim_root);
    launcher.check()?;

    if args.dry_run {
        for line in dry_run(&launcher, &plan)? {
            println!("{line}");
        }
        return Ok(());
    }

    let output_path = launcher.output_dir().join(&plan.output_file);
    let policy = if args.yes {
        StalePolicy::Remove
    } else {
        StalePolicy::Prompt
    };
    clear_stale_output(&output_path, policy, &mut StdinConfirm)?;

    let cancel = CancelToken::new();
    cancel.install_ctrlc_handler()?;

    let workspace = ResultsWorkspace::create(&args.results_root, &plan.name)?;
    let runner = SweepRunner::new(Box::new(launcher), plan, workspace, cancel)?;
    let report = runner.run()?;

    let charts = wifi_sweep_plot::render_all(runner.plan(), &report, runner.results_dir());
    info!("{} charts rendered", charts.len());
    println!("results: {}", runner.results_dir().display());
    Ok(())
}

fn cmd_list() -> Result<()> {
    for plan in wifi_sweep_presets::all() {
        println!("{:<20} {}", plan.name, plan.description);
    }
    Ok(())
}

fn cmd_validate(args: ValidateArgs) -> Result<()> {
    let plan = load_plan(args.preset.as_deref(), args.plan.as_deref())?;
    plan.validate().context("invalid experiment plan")?;
    println!(
        "plan '{}' is valid: {} combinations, {} invocations, {} metrics, {} charts",
        plan.name,
        plan.combination_count(),
        plan.combination_count() * plan.repetitions as usize,
        plan.metrics.len(),
        plan.charts.len()
    );
    if args.print {
        print!("{}", toml::to_string_pretty(&plan)?);
    }
    Ok(())
}

fn cmd_replot(args: ReplotArgs) -> Result<()> {
    let plan = ResultsWorkspace::read_plan(&args.dir)?;
    plan.validate().context("invalid experiment plan")?;
    let report = SweepReport::load(&args.dir)?;
    let charts = wifi_sweep_plot::render_all(&plan, &report, &args.dir);
    println!("{} charts rendered into {}", charts.len(), args.dir.display());
    Ok(())
}

/// Asks on stdout and reads one line from stdin; `yes` and `y` accept.
struct StdinConfirm;

impl Confirm for StdinConfirm {
    fn confirm(&mut self, message: &str) -> Result<bool> {
        print!("{message} ");
        io::stdout().flush().context("failed to flush stdout")?;
        let mut answer = String::new();
        io::stdin()
            .lock()
            .read_line(&mut answer)
            .context("failed to read answer")?;
        let answer = answer.trim().to_lowercase();
        Ok(answer == "yes" || answer == "y")
    }
}
