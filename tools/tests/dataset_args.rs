use std::fs;
use std::path::{Path, PathBuf};

use clap::Parser;
use data_contracts::Split;
use tryon_dataset::AlignmentPolicy;
use tryon_tools::{parse_fine_size, DatasetArgs};

#[derive(Parser, Debug)]
struct Cli {
    #[command(flatten)]
    dataset: DatasetArgs,
}

fn write_config(dir: &Path, contents: &str) -> PathBuf {
    let path = dir.join("tryon-dataset.toml");
    fs::write(&path, contents).expect("write temp config");
    path
}

#[test]
fn flags_override_config_file() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let config = write_config(tmp.path(), "root = \"/datasets/vvt\"\nsplit = \"train\"\n");
    let cli = Cli::parse_from([
        "tool",
        "--config",
        config.to_str().unwrap(),
        "--split",
        "test",
        "--strict",
        "--fine-size",
        "96x128",
    ]);
    let cfg = cli.dataset.load_config().expect("load config");
    assert_eq!(cfg.root, PathBuf::from("/datasets/vvt"));
    assert_eq!(cfg.split, Split::Test);
    assert_eq!(cfg.policy, AlignmentPolicy::StrictFrameNumbers);
    assert_eq!(cfg.fine_size, (96, 128));
}

#[test]
fn config_values_survive_without_flags() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let config = write_config(
        tmp.path(),
        "root = \"/datasets/vvt\"\nstrict_frame_numbers = true\nfine_width = 64\n",
    );
    let cli = Cli::parse_from(["tool", "--config", config.to_str().unwrap()]);
    let cfg = cli.dataset.load_config().expect("load config");
    assert_eq!(cfg.split, Split::Train);
    assert_eq!(cfg.policy, AlignmentPolicy::StrictFrameNumbers);
    assert_eq!(cfg.fine_size, (64, 256));

    let cli = Cli::parse_from([
        "tool",
        "--config",
        config.to_str().unwrap(),
        "--root",
        "/elsewhere",
    ]);
    assert_eq!(
        cli.dataset.load_config().expect("load config").root,
        PathBuf::from("/elsewhere")
    );
}

#[test]
fn bad_config_reports_path() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let config = write_config(tmp.path(), "not_a_key = 1\n");
    let cli = Cli::parse_from(["tool", "--config", config.to_str().unwrap()]);
    let err = cli.dataset.load_config().unwrap_err();
    assert!(format!("{err:#}").contains("tryon-dataset.toml"));
}

#[test]
fn unknown_split_is_a_parse_error() {
    assert!(Cli::try_parse_from(["tool", "--split", "val"]).is_err());
}

#[test]
fn fine_size_parsing() {
    assert_eq!(parse_fine_size("192x256"), Ok((192, 256)));
    assert!(parse_fine_size("192").is_err());
    assert!(parse_fine_size("0x256").is_err());
    assert!(parse_fine_size("ax1").is_err());
}
