use anyhow::{Context, Result};
use clap::Parser;
use laserkit::{
    init_logging, run_job, ExportFormat, Mesh3D, PlaneSlicer, Settings, TracingObserver, Widget,
    BUILD_DATE, VERSION,
};
use std::fs;
use std::path::PathBuf;
use tracing::info;

#[derive(Parser)]
#[command(name = "laserkit")]
#[command(about = "Slice STL meshes into laser or drag-knife cutting jobs", long_about = None)]
struct Cli {
    /// STL files to slice; each becomes its own widget
    #[arg(required_unless_present = "print_settings")]
    meshes: Vec<PathBuf>,

    /// Settings file (.json or .toml)
    #[arg(short, long)]
    settings: Option<PathBuf>,

    /// Output format
    #[arg(short, long, default_value = "gcode")]
    format: ExportFormat,

    /// Output file (stdout when omitted)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Drag-knife mode
    #[arg(long)]
    knife: bool,

    /// Merge identical outlines across layers
    #[arg(long)]
    merged: bool,

    /// Score each layer with the outline of the layer above
    #[arg(long)]
    stacked: bool,

    /// Layer pitch override
    #[arg(long)]
    slice_height: Option<f64>,

    /// Kerf offset override
    #[arg(long)]
    offset: Option<f64>,

    /// Print the effective settings as TOML and exit
    #[arg(long)]
    print_settings: bool,
}

impl Cli {
    fn settings(&self) -> Result<Settings> {
        let mut settings = match &self.settings {
            Some(path) => Settings::load_from_file(path)
                .with_context(|| format!("loading settings from {}", path.display()))?,
            None => Settings::default(),
        };
        let process = &mut settings.process;
        process.knife_on |= self.knife;
        process.merged |= self.merged;
        process.stack |= self.stacked;
        if let Some(height) = self.slice_height {
            process.slice_height = height;
        }
        if let Some(offset) = self.offset {
            process.laser_offset = offset;
        }
        settings.validate().context("invalid settings")?;
        Ok(settings)
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging()?;
    info!("laserkit {} (built {})", VERSION, BUILD_DATE);

    let settings = cli.settings()?;
    if cli.print_settings {
        println!("{}", settings.to_toml()?);
        return Ok(());
    }

    let widgets = cli
        .meshes
        .iter()
        .map(|path| {
            let mesh = Mesh3D::load_stl(path)
                .with_context(|| format!("loading mesh {}", path.display()))?;
            let name = path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string());
            Ok::<_, anyhow::Error>(Widget::new(name, mesh))
        })
        .collect::<Result<Vec<_>>>()?;

    let output = run_job(
        &widgets,
        &settings,
        &PlaneSlicer::new(),
        cli.format,
        &TracingObserver,
    )
    .context("job failed")?;

    match &cli.output {
        Some(path) => {
            fs::write(path, &output).with_context(|| format!("writing {}", path.display()))?;
            info!("Wrote {} bytes to {}", output.len(), path.display());
        }
        None => println!("{}", output),
    }

    Ok(())
}
