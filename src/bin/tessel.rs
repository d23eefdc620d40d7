use std::{
    fs::File,
    io::{BufReader, Write as _},
    path::{Path, PathBuf},
};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

#[derive(Parser, Debug)]
#[command(name = "tessel", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run every pass against the reference renderer and write the final scene.
    Replay(ReplayArgs),
    /// Print the per-pass transition plans without advancing time.
    Plan(PlanArgs),
}

#[derive(Parser, Debug)]
struct ReplayArgs {
    /// Input passes JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Reconciler options JSON.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Clock step used while advancing between passes, in milliseconds.
    #[arg(long, default_value_t = 16.0)]
    step_ms: f64,

    /// Output snapshot path; stdout when omitted.
    #[arg(long)]
    out: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct PlanArgs {
    /// Input passes JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Reconciler options JSON.
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct Script {
    animation: tessel::AnimationOptions,
    passes: Vec<Pass>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct Pass {
    items: Vec<Option<tessel::ElementOption>>,
    payload: Option<tessel::AnimationPayload>,
    advance_ms: f64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PlanOutput {
    pass: usize,
    report: tessel::PassReport,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    match cli.cmd {
        Command::Replay(args) => cmd_replay(args),
        Command::Plan(args) => cmd_plan(args),
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path, what: &str) -> anyhow::Result<T> {
    let f = File::open(path).with_context(|| format!("open {what} '{}'", path.display()))?;
    serde_json::from_reader(BufReader::new(f)).with_context(|| format!("parse {what} JSON"))
}

fn read_opts(path: Option<&Path>) -> anyhow::Result<tessel::ReconcileOpts> {
    match path {
        Some(p) => read_json(p, "reconciler options"),
        None => Ok(tessel::ReconcileOpts::default()),
    }
}

fn cmd_replay(args: ReplayArgs) -> anyhow::Result<()> {
    if !(args.step_ms.is_finite() && args.step_ms > 0.0) {
        anyhow::bail!("--step-ms must be a positive number, got {}", args.step_ms);
    }
    let script: Script = read_json(&args.in_path, "passes")?;
    let opts = read_opts(args.config.as_deref())?;
    let model = tessel::SeriesModel::new(script.animation);

    let mut renderer = tessel::SceneRenderer::new();
    let mut rec = tessel::Reconciler::new(opts);
    for (i, pass) in script.passes.iter().enumerate() {
        rec.reconcile(&mut renderer, &model, &pass.items, pass.payload.as_ref())
            .with_context(|| format!("pass {i}"))?;
        let mut left = pass.advance_ms.max(0.0);
        while left > 0.0 {
            let dt = left.min(args.step_ms);
            rec.advance(&mut renderer, dt)
                .with_context(|| format!("advance after pass {i}"))?;
            left -= dt;
        }
    }

    let json = serde_json::to_string_pretty(&renderer.snapshot()).context("encode snapshot")?;
    match &args.out {
        Some(out) => {
            if let Some(parent) = out.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("create output dir '{}'", parent.display()))?;
            }
            std::fs::write(out, json).with_context(|| format!("write '{}'", out.display()))?;
            eprintln!("wrote {}", out.display());
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            writeln!(stdout, "{json}").context("write snapshot")?;
        }
    }
    Ok(())
}

fn cmd_plan(args: PlanArgs) -> anyhow::Result<()> {
    let script: Script = read_json(&args.in_path, "passes")?;
    let opts = read_opts(args.config.as_deref())?;
    let model = tessel::SeriesModel::new(script.animation);

    let mut renderer = tessel::SceneRenderer::new();
    let mut rec = tessel::Reconciler::new(opts);
    let mut out = Vec::with_capacity(script.passes.len());
    for (i, pass) in script.passes.iter().enumerate() {
        let report = rec
            .reconcile(&mut renderer, &model, &pass.items, pass.payload.as_ref())
            .with_context(|| format!("pass {i}"))?;
        out.push(PlanOutput { pass: i, report });
    }
    let json = serde_json::to_string_pretty(&out).context("encode plans")?;
    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "{json}").context("write plans")?;
    Ok(())
}
