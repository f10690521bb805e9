mod cli;

use jobreel::{
    config,
    pipeline::RenderService,
    server,
    state::{InMemoryJobStore, RenderRequest},
};
use jobreel_av::Toolchain;
use jobreel_common::{check_hex_contrast, JobStatus};

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands};
use std::path::Path;
use std::sync::Arc;

async fn start_server(host: String, port: u16, config_path: Option<&Path>) -> Result<()> {
    // Load config
    let mut config = config::load_config_or_default(config_path)?;

    // Override host/port from CLI if specified
    config.server.host = host;
    config.server.port = port;

    tracing::info!("Starting jobreel server");
    tracing::info!(
        "Server will listen on {}:{}",
        config.server.host,
        config.server.port
    );

    server::start_server(config).await
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Respect RUST_LOG env var if set, otherwise use defaults based on verbose flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "jobreel=trace,jobreel_av=debug,tower_http=debug".to_string()
        } else {
            "jobreel=debug,jobreel_av=info,tower_http=info".to_string()
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Serve { host, port } => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(start_server(host, port, cli.config.as_deref()))
        }
        Commands::Render {
            posting,
            scenes,
            duration,
            tone,
            engine,
            primary,
            secondary,
            reuse,
            pitch,
        } => {
            let mut request = RenderRequest::new(
                std::fs::read_to_string(&posting)
                    .with_context(|| format!("Failed to read posting: {:?}", posting))?,
            );
            request.scene_count = scenes;
            request.duration_secs = duration;
            request.tone = tone;
            request.engine = engine;
            if let Some(primary) = primary {
                request.brand.primary_color = primary;
            }
            if let Some(secondary) = secondary {
                request.brand.secondary_color = secondary;
            }
            request.reuse_existing_clips = reuse;
            request.enrich_pitch = pitch;

            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(render(request, cli.config.as_deref()))
        }
        Commands::Probe { file, json } => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(probe_file(&file, json, cli.config.as_deref()))
        }
        Commands::CheckTools => check_tools(cli.config.as_deref()),
        Commands::Validate {
            config: config_path,
        } => {
            let path = config_path.or(cli.config);
            validate_config(path.as_deref())
        }
        Commands::Contrast {
            foreground,
            background,
        } => contrast(&foreground, &background),
        Commands::Version => {
            println!("jobreel {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

fn toolchain(config: &config::Config) -> Toolchain {
    Toolchain::resolve(
        config.tools.ffmpeg_path.as_deref(),
        config.tools.ffprobe_path.as_deref(),
    )
    .unwrap_or_default()
}

async fn render(request: RenderRequest, config_path: Option<&Path>) -> Result<()> {
    let config = Arc::new(config::load_config_or_default(config_path)?);
    let service = RenderService::from_config(config, InMemoryJobStore::shared())?;

    let job = service.render_and_wait(request).await?;
    println!("{}", serde_json::to_string_pretty(&job)?);

    if job.status != JobStatus::Ready {
        anyhow::bail!(
            "Render failed: {}",
            job.error.as_deref().unwrap_or("unknown error")
        );
    }
    Ok(())
}

async fn probe_file(file: &Path, json: bool, config_path: Option<&Path>) -> Result<()> {
    if !file.exists() {
        anyhow::bail!("File does not exist: {:?}", file);
    }

    let config = config::load_config_or_default(config_path)?;
    let media_info = jobreel_av::probe(&toolchain(&config), file).await?;

    if json {
        let json_str = serde_json::to_string_pretty(&media_info)?;
        println!("{}", json_str);
    } else {
        println!("File: {}", media_info.file_path.display());
        println!("Container: {}", media_info.container);
        println!("Size: {} bytes", media_info.file_size);
        if let Some(secs) = media_info.duration_secs() {
            let whole = secs as u64;
            println!(
                "Duration: {:02}:{:02}:{:02} ({:.3}s)",
                whole / 3600,
                (whole / 60) % 60,
                whole % 60,
                secs
            );
        }

        println!("\nVideo Tracks: {}", media_info.video_tracks.len());
        for (i, track) in media_info.video_tracks.iter().enumerate() {
            print!("  [{}] {} {}x{}", i, track.codec, track.width, track.height);
            if let Some(fps) = track.frame_rate {
                print!(", {:.3} fps", fps);
            }
            println!();
        }

        println!("\nAudio Tracks: {}", media_info.audio_tracks.len());
        for (i, track) in media_info.audio_tracks.iter().enumerate() {
            print!("  [{}] {} {}", i, track.codec, track.layout_name());
            if let Some(rate) = track.sample_rate {
                print!(" {} Hz", rate);
            }
            println!();
        }
    }

    Ok(())
}

fn check_tools(config_path: Option<&Path>) -> Result<()> {
    println!("Checking external tools...\n");

    let config = config::load_config_or_default(config_path)?;
    let tools = jobreel_av::check_tools(&toolchain(&config));
    let mut all_ok = true;

    for tool in &tools {
        let status = if tool.available {
            "✓"
        } else {
            all_ok = false;
            "✗"
        };

        print!("{} {}", status, tool.name);

        if let Some(ref version) = tool.version {
            print!(" ({})", version.lines().next().unwrap_or(""));
        }

        if let Some(ref path) = tool.path {
            print!(" - {}", path.display());
        }

        println!();
    }

    println!();
    if all_ok {
        println!("All required tools are available!");
    } else {
        println!("Some tools are missing. Rendering needs both ffmpeg and ffprobe.");
    }

    Ok(())
}

fn validate_config(path: Option<&Path>) -> Result<()> {
    match path {
        Some(p) => {
            println!("Validating config: {:?}", p);
            let config = config::load_config(p)?;
            println!("✓ Configuration is valid");
            println!("  Server: {}:{}", config.server.host, config.server.port);
            println!("  Work dir: {}", config.work_dir.display());
            println!("  Output dir: {}", config.storage.output_dir.display());
            println!(
                "  Render: {}x{} @ {} fps, {} scenes x {}s",
                config.render.width,
                config.render.height,
                config.render.fps,
                config.render.default_scene_count,
                config.render.scene_seconds
            );
            println!(
                "  Generation service: {}",
                config.generation.base_url.as_deref().unwrap_or("not configured")
            );
        }
        None => {
            println!("No config file specified, using defaults");
            let config = config::Config::default();
            println!("Default config:");
            println!("  Server: {}:{}", config.server.host, config.server.port);
        }
    }

    Ok(())
}

fn contrast(foreground: &str, background: &str) -> Result<()> {
    let check = check_hex_contrast(foreground, background)?;
    println!(
        "{} on {}: {:.2}:1 {}",
        check.foreground,
        check.background,
        check.ratio,
        if check.passes { "PASS" } else { "FAIL" }
    );
    if !check.passes {
        anyhow::bail!("Contrast ratio {:.2}:1 is below 4.5:1", check.ratio);
    }
    Ok(())
}
