use anyhow::{bail, Result};
use bodycomp_estimator::config::Config;
use bodycomp_estimator::estimator::{Sex, SubjectMetadata};
use bodycomp_estimator::photo::Photo;
use bodycomp_estimator::pipeline::{self, EstimateOutcome};
use bodycomp_estimator::pose::OnnxPoseProvider;
use std::env;

const CONFIG_PATH: &str = "config.toml";

fn usage() -> ! {
    eprintln!(
        "Usage: estimate <image> [--sex female|male|unknown] [--age <years>] [--height <cm>] [--weight <kg>] [--json]"
    );
    std::process::exit(1);
}

fn next_value<'a>(iter: &mut impl Iterator<Item = &'a String>, flag: &str) -> Result<&'a String> {
    match iter.next() {
        Some(v) => Ok(v),
        None => bail!("{} requires a value", flag),
    }
}

fn main() -> Result<()> {
    let args: Vec<String> = env::args().skip(1).collect();
    if args.is_empty() {
        usage();
    }

    let mut image_path: Option<String> = None;
    let mut meta = SubjectMetadata::default();
    let mut json = false;

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--sex" => meta.sex = next_value(&mut iter, "--sex")?.parse::<Sex>()?,
            "--age" => meta.age_years = Some(next_value(&mut iter, "--age")?.parse()?),
            "--height" => meta.height_cm = Some(next_value(&mut iter, "--height")?.parse()?),
            "--weight" => meta.weight_kg = Some(next_value(&mut iter, "--weight")?.parse()?),
            "--json" => json = true,
            other if other.starts_with("--") => bail!("Unknown option: {}", other),
            other => image_path = Some(other.to_string()),
        }
    }

    let Some(image_path) = image_path else { usage() };

    let config = Config::load_or_default(CONFIG_PATH);
    let photo = Photo::from_path(&image_path)?;
    let mut provider = OnnxPoseProvider::from_config(&config.pose)?;

    let outcome = pipeline::run(&photo, &mut provider, &meta, &config)?;

    match outcome {
        EstimateOutcome::Rejected(reason) => {
            eprintln!("却下 [{}]: {}", reason.code(), reason.message());
            std::process::exit(2);
        }
        EstimateOutcome::NoPoseDetected => {
            eprintln!("却下 [no_pose]: {}", pipeline::NO_POSE_MESSAGE);
            std::process::exit(2);
        }
        EstimateOutcome::Estimated(result) => {
            if json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                println!("=== BodyComp Estimator ({}) ===", env!("GIT_VERSION"));
                println!("推定体脂肪率: {:.1}%", result.body_fat_percent);
                println!(
                    "範囲: {:.1}% 〜 {:.1}%",
                    result.low_percent, result.high_percent
                );
                println!("信頼度: {:.2}", result.confidence);
                println!();
                for note in &result.notes {
                    println!("  - {}", note);
                }
            }
        }
    }

    Ok(())
}
