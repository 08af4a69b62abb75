use anyhow::Context;
use clap::Parser;
use tryon_dataset::{summarize_alignment, ModalityCount, ValidationOutcome};
use tryon_tools::{init_tracing, DatasetArgs};

#[derive(Parser, Debug)]
#[command(
    name = "dataset_check",
    about = "Survey a try-on dataset root for per-subject modality misalignment"
)]
struct Args {
    #[command(flatten)]
    dataset: DatasetArgs,
    /// Print the report as JSON instead of a table.
    #[arg(long, default_value_t = false)]
    json: bool,
    /// Only survey counts; skip building the full index.
    #[arg(long, default_value_t = false)]
    survey_only: bool,
}

fn main() -> anyhow::Result<()> {
    init_tracing();
    let args = Args::parse();
    let cfg = args.dataset.load_config()?;
    let layout = cfg.folder_layout();

    let report = summarize_alignment(
        layout.as_ref(),
        &cfg.root,
        &cfg.manifest,
        cfg.subjects.as_deref(),
    )
    .with_context(|| format!("surveying {}", cfg.root.display()))?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!(
            "Alignment outcome: {} (subjects={} frames={} misaligned={})",
            report.outcome.as_str(),
            report.subjects.len(),
            report.total_frames,
            report.misaligned_subjects
        );
        for subject in &report.subjects {
            let counts = subject
                .modalities
                .iter()
                .map(|(name, count)| match count {
                    ModalityCount::Present(n) => format!("{name}={n}"),
                    ModalityCount::Missing => format!("{name}=-"),
                })
                .collect::<Vec<_>>()
                .join(" ");
            let mark = if subject.aligned { "ok " } else { "BAD" };
            println!("  {mark} {:<32} {counts}", subject.subject);
        }
        for reason in &report.reasons {
            println!("  - {reason}");
        }
    }

    if report.outcome == ValidationOutcome::Fail {
        anyhow::bail!(
            "{} of {} subjects are misaligned",
            report.misaligned_subjects,
            report.subjects.len()
        );
    }
    if args.survey_only {
        return Ok(());
    }

    // The survey ignores the frame-number policy; the full build applies it.
    let dataset = cfg
        .open()
        .with_context(|| format!("indexing {}", cfg.root.display()))?;
    tracing::info!(name = dataset.name(), frames = dataset.len(), "dataset indexed");
    if !args.json {
        println!("Indexed {} frames as '{}'", dataset.len(), dataset.name());
    }
    Ok(())
}
