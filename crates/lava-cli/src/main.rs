use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use lava_manifest::{validate_manifest, Frame, Manifest};
use lava_player::{FsFetcher, Player, SoftwareBackend};

#[derive(Parser)]
#[command(
    name = "lava",
    version,
    about = "Lava — sprite-atlas animation playback",
    long_about = "Inspect and decode Lava animations: manifests plus atlas images,\nwith frames expressed as sparse tile patches against a persistent composite."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate an animation directory and print a manifest summary
    Info {
        /// Directory containing manifest.json and the atlas images
        path: PathBuf,

        /// Print the full manifest as JSON instead of a summary
        #[arg(long)]
        json: bool,
    },

    /// Decode every frame of an animation to PNG files
    Render {
        /// Directory containing manifest.json and the atlas images
        path: PathBuf,

        /// Output directory for frame_NNNN.png files
        #[arg(short, long, default_value = "frames")]
        output: PathBuf,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Info { path, json } => cmd_info(&path, json),
        Commands::Render { path, output } => cmd_render(&path, &output),
    }
}

fn cmd_info(path: &Path, json: bool) -> Result<()> {
    let manifest_path = path.join("manifest.json");
    let bytes = fs::read(&manifest_path)
        .with_context(|| format!("reading {}", manifest_path.display()))?;
    let manifest: Manifest =
        serde_json::from_slice(&bytes).context("manifest does not match the Lava schema")?;

    if let Err(errors) = validate_manifest(&manifest) {
        for error in &errors {
            eprintln!("error: {}", error);
        }
        anyhow::bail!("manifest failed validation with {} error(s)", errors.len());
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&manifest)?);
        return Ok(());
    }

    let key_frames = manifest
        .frames
        .iter()
        .filter(|f| matches!(f, Frame::Key { .. }))
        .count();
    let patches: usize = manifest
        .frames
        .iter()
        .map(|f| match f {
            Frame::Diff { diffs } => diffs.len(),
            Frame::Key { .. } => 0,
        })
        .sum();

    println!("canvas:    {}x{} px (density {})", manifest.width, manifest.height, manifest.density);
    println!("playback:  {} fps, {} frames ({:.1}s loop)", manifest.fps, manifest.frame_count(), manifest.frame_count() as f64 / manifest.fps as f64);
    println!("tiles:     {} px cells", manifest.cell_size);
    println!("images:    {}", manifest.images.len());
    println!("frames:    {} key, {} diff ({} patches total)", key_frames, manifest.frame_count() - key_frames, patches);
    println!("alpha:     {}", manifest.alpha);
    Ok(())
}

fn cmd_render(path: &Path, output: &Path) -> Result<()> {
    let locator = path.to_str().context("animation path is not valid UTF-8")?;

    let mut player = Player::new(SoftwareBackend::new());
    player.load(&FsFetcher::new(), locator)?;

    let frame_count = player.frame_count();
    let fps = player.manifest().map(|m| m.fps).unwrap_or(1);
    let frame_duration = 1000.0 / fps as f64;

    fs::create_dir_all(output)
        .with_context(|| format!("creating output directory {}", output.display()))?;

    player.play();
    for index in 0..frame_count {
        // One synthetic clock tick per frame duration decodes the whole
        // sequence in order.
        player.advance(index as f64 * frame_duration);

        let surface = player.composite_surface().context("player lost its composite surface")?;
        let pixels = player
            .backend()
            .surface(surface)
            .context("composite surface missing from backend")?;
        let frame = image::RgbaImage::from_raw(pixels.width, pixels.height, pixels.data.clone())
            .context("composite buffer does not match its dimensions")?;

        let file = output.join(format!("frame_{:04}.png", index));
        frame
            .save(&file)
            .with_context(|| format!("writing {}", file.display()))?;
    }

    println!("wrote {} frames to {}", frame_count, output.display());
    Ok(())
}
