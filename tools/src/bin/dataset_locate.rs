use clap::Parser;
use tryon_dataset::flat_index;
use tryon_tools::{init_tracing, DatasetArgs};

#[derive(Parser, Debug)]
#[command(
    name = "dataset_locate",
    about = "Print the aligned bundle behind a flat dataset index as JSON"
)]
struct Args {
    #[command(flatten)]
    dataset: DatasetArgs,
    /// Flat index into the dataset.
    #[arg(allow_negative_numbers = true)]
    index: i64,
    /// Load artifacts (decoded images, parsed JSON) instead of printing paths.
    #[arg(long, default_value_t = false)]
    load: bool,
}

fn main() -> anyhow::Result<()> {
    init_tracing();
    let args = Args::parse();
    let cfg = args.dataset.load_config()?;
    let dataset = cfg.open()?;
    let index = flat_index(args.index, dataset.len())?;

    let out = if args.load {
        serde_json::to_string_pretty(&dataset.get_item(index)?)?
    } else {
        serde_json::to_string_pretty(&dataset.paths(index)?)?
    };
    println!("{out}");
    Ok(())
}
