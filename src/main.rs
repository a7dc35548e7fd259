//! DataTrack command-line client for native builds.

#[cfg(not(target_arch = "wasm32"))]
mod cli {
    use std::path::{Path, PathBuf};
    use std::sync::Arc;

    use clap::{Parser, Subcommand};

    use datatrack::backend::{Backend, BackendError, HttpBackend, JobId, SharedBackend, VideoSource};
    use datatrack::config::{AppConfig, ConfigError};
    use datatrack::coords::IntrinsicSize;
    use datatrack::export::{ExportError, ExportFormat};
    use datatrack::job::{JobStatus, PollSettings};
    use datatrack::message::{EditorMessage, JobMessage, Message};
    use datatrack::model::RegionPayload;
    use datatrack::runtime::Runtime;
    use datatrack::DataTrackApp;

    #[derive(Debug, thiserror::Error)]
    pub enum CliError {
        #[error("{path}: {source}")]
        Io {
            path: PathBuf,
            source: std::io::Error,
        },
        #[error(transparent)]
        Config(#[from] ConfigError),
        #[error("Invalid regions file: {0}")]
        Regions(#[from] serde_json::Error),
        #[error(transparent)]
        Backend(#[from] BackendError),
        #[error(transparent)]
        Export(#[from] ExportError),
        #[error("{0}")]
        Rejected(String),
    }

    fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> CliError + '_ {
        move |source| CliError::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    #[derive(Debug, Parser)]
    #[command(
        name = "datatrack",
        version,
        about = "Count vehicles inside drawn regions using a detection backend"
    )]
    struct Cli {
        /// Config file; defaults to the user config directory
        #[arg(long, global = true, value_name = "PATH")]
        config: Option<PathBuf>,
        /// Backend API root, overriding the config
        #[arg(long, global = true, value_name = "URL")]
        backend: Option<String>,
        #[command(subcommand)]
        command: Command,
    }

    #[derive(Debug, Subcommand)]
    enum Command {
        /// Upload a video, count vehicles inside the saved regions, print the summary
        Run {
            video: PathBuf,
            /// JSON list of saved regions
            #[arg(long, value_name = "PATH")]
            regions: PathBuf,
            /// Frame size the region coordinates refer to
            #[arg(long, default_value_t = 1920)]
            width: u32,
            #[arg(long, default_value_t = 1080)]
            height: u32,
            /// Minimum detector confidence, 0-1
            #[arg(long)]
            conf: Option<f32>,
            /// Process every Nth frame
            #[arg(long)]
            frame_skip: Option<u32>,
            /// Write the results here; defaults to the configured export folder
            #[arg(long, value_name = "PATH")]
            out: Option<PathBuf>,
            #[arg(long, default_value = "json")]
            format: ExportFormat,
        },
        /// Render saved regions to a PNG
        Preview {
            regions: PathBuf,
            #[arg(long, default_value_t = 1920)]
            width: u32,
            #[arg(long, default_value_t = 1080)]
            height: u32,
            /// Video frame to draw underneath (PNG or JPEG)
            #[arg(long, value_name = "PATH")]
            frame: Option<PathBuf>,
            #[arg(long, default_value = "regions.png")]
            out: PathBuf,
        },
        /// List jobs known to the backend
        Jobs,
        /// Download the backend's CSV report for a job
        Report {
            job_id: String,
            #[arg(long, value_name = "PATH")]
            out: Option<PathBuf>,
        },
        /// Print the effective configuration
        Config {
            /// Also write it to the config file
            #[arg(long)]
            save: bool,
        },
    }

    fn load_config(cli: &Cli) -> Result<AppConfig, CliError> {
        let mut config = match &cli.config {
            Some(path) => AppConfig::load_from_path(path)?,
            None => AppConfig::load_from_default_path().unwrap_or_default(),
        };
        if let Some(url) = &cli.backend {
            config.backend.base_url = url.clone();
        }
        Ok(config)
    }

    fn read_regions(path: &Path) -> Result<Vec<RegionPayload>, CliError> {
        let json = std::fs::read_to_string(path).map_err(io_error(path))?;
        Ok(serde_json::from_str(&json)?)
    }

    fn write_file(path: &Path, bytes: &[u8]) -> Result<(), CliError> {
        std::fs::write(path, bytes).map_err(io_error(path))?;
        println!("Wrote {} ({} bytes)", path.display(), bytes.len());
        Ok(())
    }

    /// Apply a message and fail on an error notice.
    fn apply(app: &mut DataTrackApp, runtime: &mut Runtime, message: Message) -> Result<(), CliError> {
        let effects = app.update(message);
        runtime.execute(effects);
        match app.take_notice() {
            Some(notice) if notice.is_error() => Err(CliError::Rejected(notice.text().to_string())),
            Some(notice) => {
                log::info!("{}", notice.text());
                Ok(())
            }
            None => Ok(()),
        }
    }

    #[allow(clippy::too_many_arguments)]
    async fn run(
        config: AppConfig,
        video: &Path,
        regions: &Path,
        size: IntrinsicSize,
        conf: Option<f32>,
        frame_skip: Option<u32>,
        out: Option<&Path>,
        format: ExportFormat,
    ) -> Result<(), CliError> {
        let http = HttpBackend::from_config(&config.backend)?;
        let backend: SharedBackend = Arc::new(http);
        let mut runtime = Runtime::new(backend.clone(), PollSettings::from(&config.polling));
        let mut app = DataTrackApp::new(config.clone());

        if config.detection.use_hardware_defaults {
            match backend.hardware_info().await {
                Ok(info) => apply(&mut app, &mut runtime, Message::Job(JobMessage::HardwareInfo(info)))?,
                Err(e) => log::warn!("Hardware info unavailable: {}", e),
            }
        }
        if let Some(conf) = conf {
            apply(&mut app, &mut runtime, Message::Job(JobMessage::ConfidenceChanged(conf)))?;
        }
        if let Some(frame_skip) = frame_skip {
            apply(&mut app, &mut runtime, Message::Job(JobMessage::FrameSkipChanged(frame_skip)))?;
        }

        let source = VideoSource::read(video).map_err(io_error(video))?;
        apply(
            &mut app,
            &mut runtime,
            Message::VideoLoaded {
                video: Arc::new(source),
                size,
            },
        )?;
        let saved = read_regions(regions)?;
        apply(
            &mut app,
            &mut runtime,
            Message::Editor(EditorMessage::LoadRegions(saved)),
        )?;

        let params = app.params();
        println!(
            "Submitting {} with {} regions (conf {:.2}, every {} frame(s))",
            video.display(),
            app.editor().store().len(),
            params.conf_threshold,
            params.frame_skip
        );
        apply(&mut app, &mut runtime, Message::Job(JobMessage::Submit))?;

        let mut last_progress = None;
        while app.jobs().is_active() {
            let Some(message) = runtime.next_message().await else {
                break;
            };
            let effects = app.update(message);
            runtime.execute(effects);

            let progress = app.jobs().job().and_then(|job| job.progress());
            if progress.is_some() && progress != last_progress {
                if let Some(p) = progress {
                    println!("Processing... {:.0}%", p);
                }
                last_progress = progress;
            }
        }

        let job = app.jobs().job();
        match job.map(|j| j.status) {
            Some(JobStatus::Completed) => {}
            _ => {
                let reason = job
                    .and_then(|j| j.error.as_ref())
                    .map(ToString::to_string)
                    .unwrap_or_else(|| "Job did not complete".to_string());
                return Err(CliError::Rejected(reason));
            }
        }

        if let Some(view) = app.results_view() {
            println!();
            println!("Total vehicles: {}", view.total_vehicles);
            println!(
                "Cars: {}  Motorcycles: {}  Other: {}",
                view.cars, view.motorcycles, view.other
            );
            for row in &view.types {
                println!(
                    "  {:<12} {:>6} unique, avg {} detections/vehicle",
                    row.vehicle_type, row.unique, row.avg_detections_per_vehicle
                );
            }
            for region in &view.regions {
                println!("  {:<20} {:>6} detections", region.label, region.count);
            }
            for anomaly in &view.anomalies {
                log::warn!("{}", anomaly);
            }
        }

        let artifact = app.export(format)?;
        let target = out
            .map(Path::to_path_buf)
            .or_else(|| config.preferences.export_path(&artifact.file_name));
        if let Some(target) = target {
            write_file(&target, &artifact.bytes)?;
        }
        Ok(())
    }

    fn preview(
        config: AppConfig,
        regions: &Path,
        size: IntrinsicSize,
        frame: Option<&Path>,
        out: &Path,
    ) -> Result<(), CliError> {
        let mut app = DataTrackApp::new(config);
        app.update(Message::VideoLoaded {
            video: Arc::new(VideoSource::new("preview", Vec::new())),
            size,
        });
        app.update(Message::Editor(EditorMessage::LoadRegions(read_regions(regions)?)));
        if let Some(notice) = app.take_notice().filter(|n| n.is_error()) {
            return Err(CliError::Rejected(notice.text().to_string()));
        }

        let background = match frame {
            Some(path) => {
                let decoded = image::open(path)
                    .map_err(|e| CliError::Rejected(format!("{}: {}", path.display(), e)))?
                    .resize_exact(size.width, size.height, image::imageops::FilterType::Triangle)
                    .to_rgba8();
                Some(decoded.into_raw())
            }
            None => None,
        };

        let artifact = app.snapshot(background.as_deref())?;
        write_file(out, &artifact.bytes)
    }

    async fn list_jobs(config: &AppConfig) -> Result<(), CliError> {
        let backend = HttpBackend::from_config(&config.backend)?;
        let jobs = backend.jobs().await?;
        if jobs.is_empty() {
            println!("No jobs");
        }
        for (id, summary) in jobs {
            let progress = summary
                .progress
                .map(|p| format!("{:.0}%", p))
                .unwrap_or_default();
            let status = format!("{:?}", summary.status);
            println!("{:<40} {:<12} {}", id, status, progress);
        }
        Ok(())
    }

    async fn report(config: &AppConfig, job_id: String, out: Option<&Path>) -> Result<(), CliError> {
        let backend = HttpBackend::from_config(&config.backend)?;
        let id = JobId::new(job_id);
        let csv = backend.export_csv(&id).await?;
        match out {
            Some(path) => write_file(path, &csv),
            None => {
                print!("{}", String::from_utf8_lossy(&csv));
                Ok(())
            }
        }
    }

    pub async fn main() -> Result<(), CliError> {
        let cli = Cli::parse();

        // Up before the config loads so its warnings are seen; RUST_LOG wins
        // over the configured level.
        let from_env = std::env::var_os("RUST_LOG").is_some();
        env_logger::Builder::new()
            .filter_level(log::LevelFilter::Trace)
            .parse_default_env()
            .init();
        if !from_env {
            log::set_max_level(log::LevelFilter::Info);
        }

        let config = load_config(&cli)?;
        if !from_env {
            log::set_max_level(config.preferences.log_level.to_level_filter());
        }

        match cli.command {
            Command::Run {
                ref video,
                ref regions,
                width,
                height,
                conf,
                frame_skip,
                ref out,
                format,
            } => {
                run(
                    config,
                    video,
                    regions,
                    IntrinsicSize::new(width, height),
                    conf,
                    frame_skip,
                    out.as_deref(),
                    format,
                )
                .await
            }
            Command::Preview {
                ref regions,
                width,
                height,
                ref frame,
                ref out,
            } => preview(
                config,
                regions,
                IntrinsicSize::new(width, height),
                frame.as_deref(),
                out,
            ),
            Command::Jobs => list_jobs(&config).await,
            Command::Report { job_id, ref out } => report(&config, job_id, out.as_deref()).await,
            Command::Config { save } => {
                println!("{}", config.to_json().map_err(ConfigError::from)?);
                if save {
                    config.save_to_default_path()?;
                    if let Some(path) = AppConfig::default_path() {
                        println!("Saved to {}", path.display());
                    }
                }
                Ok(())
            }
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
#[tokio::main]
async fn main() {
    if let Err(e) = cli::main().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

// WASM doesn't use main(), it uses wasm_bindgen's start function
#[cfg(target_arch = "wasm32")]
fn main() {}
