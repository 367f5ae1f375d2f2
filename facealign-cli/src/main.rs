use clap::Parser;
use facealign::io::{load_rgb_image, save_rgb_image};
use facealign::{
    AffineMatrix, AlignConfig, AlignMode, AlignedFace, Aligner, LandmarkSet, NormCrop,
    TemplateGroup,
};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

const SCHEMA_JSON: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/config.schema.json"));
const EXAMPLE_JSON: &str =
    include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/config.example.json"));

#[derive(Parser, Debug)]
#[command(author, version, about = "Face alignment CLI (JSON config driven)")]
struct Cli {
    /// Path to the JSON configuration file.
    #[arg(short, long, value_name = "FILE", default_value = "config.json")]
    config: PathBuf,
    /// Print the JSON schema and exit.
    #[arg(long)]
    print_schema: bool,
    /// Print an example config and exit.
    #[arg(long)]
    print_example: bool,
    /// Enable tracing output.
    #[arg(long)]
    trace: bool,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct Config {
    image_path: String,
    faces: Vec<Vec<[f64; 2]>>,
    crop_size: usize,
    mode: String,
    border_value: u8,
    parallel: bool,
    output_dir: Option<PathBuf>,
    report_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        let cfg = AlignConfig::default();
        Self {
            image_path: String::new(),
            faces: Vec::new(),
            crop_size: cfg.crop_size,
            mode: cfg.group.name().to_string(),
            border_value: cfg.border_value,
            parallel: cfg.parallel,
            output_dir: None,
            report_path: None,
        }
    }
}

#[derive(Debug, Serialize)]
struct FaceRecord {
    face: usize,
    group: &'static str,
    template_index: usize,
    pose: Option<String>,
    reprojection_error: f64,
    matrix: [[f64; 3]; 2],
    inverse: Option<[[f64; 3]; 2]>,
    crop_path: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
struct Report {
    image_path: String,
    crop_size: usize,
    mode: String,
    faces: Vec<FaceRecord>,
}

fn record(
    face: usize,
    aligned: &AlignedFace,
    output_dir: Option<&Path>,
    suffix: &str,
) -> Result<FaceRecord, Box<dyn std::error::Error>> {
    let crop_path = match output_dir {
        Some(dir) => {
            let path = dir.join(format!("face_{face}{suffix}.png"));
            save_rgb_image(&aligned.crop, &path)?;
            Some(path)
        }
        None => None,
    };
    let t = &aligned.transform;
    if t.reprojection_error > 0.25 * aligned.crop.width() as f64 {
        tracing::warn!(face, error = t.reprojection_error, "poor landmark fit");
    }
    Ok(FaceRecord {
        face,
        group: t.group.name(),
        template_index: t.template_index,
        pose: t.pose().map(|p| format!("{p:?}")),
        reprojection_error: t.reprojection_error,
        matrix: t.matrix.rows(),
        inverse: aligned.inverse().ok().map(|m: AffineMatrix| m.rows()),
        crop_path,
    })
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if cli.trace {
        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env().add_directive("facealign=info".parse()?))
            .with_target(false)
            .init();
    }

    if cli.print_schema {
        println!("{SCHEMA_JSON}");
        return Ok(());
    }
    if cli.print_example {
        println!("{EXAMPLE_JSON}");
        return Ok(());
    }

    let config_text = fs::read_to_string(&cli.config)?;
    let config: Config = serde_json::from_str(&config_text)?;
    if config.image_path.is_empty() {
        return Err("image_path must be set in the config".into());
    }
    let mode: AlignMode = config.mode.parse()?;
    let batch = config
        .faces
        .iter()
        .map(|rows| LandmarkSet::from_rows(rows))
        .collect::<Result<Vec<_>, _>>()?;

    let group = match mode {
        AlignMode::Single(group) => group,
        AlignMode::Both => TemplateGroup::Ffhq,
    };
    let aligner = Aligner::new(AlignConfig {
        crop_size: config.crop_size,
        group,
        border_value: config.border_value,
        parallel: config.parallel,
    })?;

    let image = load_rgb_image(&config.image_path)?;
    let view = image.view();
    if let Some(dir) = &config.output_dir {
        fs::create_dir_all(dir)?;
    }
    let out_dir = config.output_dir.as_deref();

    let mut faces = Vec::new();
    match mode {
        AlignMode::Single(_) => {
            for (i, aligned) in aligner.align_faces(view, &batch)?.iter().enumerate() {
                faces.push(record(i, aligned, out_dir, "")?);
            }
        }
        AlignMode::Both => {
            for (i, lmk) in batch.iter().enumerate() {
                if let NormCrop::Both { ffhq, default } = aligner.norm_crop(view, lmk, mode)? {
                    faces.push(record(i, &ffhq, out_dir, "_ffhq")?);
                    faces.push(record(i, &default, out_dir, "_default")?);
                }
            }
        }
    }
    tracing::info!(faces = batch.len(), "alignment finished");

    let report = Report {
        image_path: config.image_path,
        crop_size: config.crop_size,
        mode: config.mode,
        faces,
    };
    let json = serde_json::to_string_pretty(&report)?;
    match config.report_path {
        Some(path) => fs::write(path, json)?,
        None => println!("{json}"),
    }

    Ok(())
}
