use std::{
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
};

use anyhow::Context as _;
use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug)]
#[command(name = "stratum", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render a scene as a PNG.
    Frame(FrameArgs),
    /// Print the flattened draw list and cache counters of a scene.
    Inspect(InspectArgs),
}

#[derive(Parser, Debug)]
struct FrameArgs {
    /// Input scene JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,

    /// Backend to use.
    #[arg(long, value_enum, default_value_t = BackendChoice::Cpu)]
    backend: BackendChoice,

    /// Tile edge override; takes precedence over the scene file.
    #[arg(long)]
    tile_unit: Option<u32>,

    /// Issue one draw call per quad.
    #[arg(long)]
    no_batching: bool,
}

#[derive(Parser, Debug)]
struct InspectArgs {
    /// Input scene JSON.
    #[arg(long = "in")]
    in_path: PathBuf,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum BackendChoice {
    Cpu,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    match cli.cmd {
        Command::Frame(args) => cmd_frame(args),
        Command::Inspect(args) => cmd_inspect(args),
    }
}

fn read_scene_json(path: &Path) -> anyhow::Result<stratum::SceneDef> {
    let f = File::open(path).with_context(|| format!("open scene '{}'", path.display()))?;
    let r = BufReader::new(f);
    let scene: stratum::SceneDef =
        serde_json::from_reader(r).with_context(|| "parse scene JSON")?;
    Ok(scene)
}

fn make_root(
    scene: &stratum::SceneDef,
    in_path: &Path,
    choice: BackendChoice,
    tile_unit: Option<u32>,
    batching: bool,
) -> anyhow::Result<stratum::Root> {
    scene.validate()?;
    let kind = match choice {
        BackendChoice::Cpu => stratum::BackendKind::Cpu,
    };
    let gpu = stratum::create_backend(
        kind,
        stratum::CpuBackendOpts::default().with_batching(batching),
    );

    let mut opts = stratum::RootOpts::new(scene.canvas.width, scene.canvas.height);
    opts.clear_rgba = scene.clear.premul().to_array();
    if let Some(unit) = tile_unit.or(scene.tile_unit) {
        opts.tile_unit = unit;
    }
    let mut root = stratum::Root::new(opts, gpu)?;

    let base_dir = in_path.parent().unwrap_or_else(|| Path::new("."));
    scene.build(&mut root, base_dir)?;
    Ok(root)
}

fn cmd_frame(args: FrameArgs) -> anyhow::Result<()> {
    let scene = read_scene_json(&args.in_path)?;
    let mut root = make_root(
        &scene,
        &args.in_path,
        args.backend,
        args.tile_unit,
        !args.no_batching,
    )?;

    let report = root.draw()?;
    let mut frame = root.read_pixels()?;
    frame.unpremultiply();

    if let Some(parent) = args.out.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }

    image::save_buffer_with_format(
        &args.out,
        &frame.data,
        frame.width,
        frame.height,
        image::ColorType::Rgba8,
        image::ImageFormat::Png,
    )
    .with_context(|| format!("write png '{}'", args.out.display()))?;

    eprintln!(
        "wrote {} ({} quads, {} draw calls, {} composites)",
        args.out.display(),
        report.render.quads,
        report.render.draw_calls,
        report.merge.generated
    );
    Ok(())
}

fn cmd_inspect(args: InspectArgs) -> anyhow::Result<()> {
    let scene = read_scene_json(&args.in_path)?;
    let mut root = make_root(&scene, &args.in_path, BackendChoice::Cpu, None, true)?;
    root.draw()?;

    for e in root.structure() {
        let name = root
            .name(e.node)?
            .map(str::to_owned)
            .unwrap_or_else(|| format!("#{}", e.node.raw()));
        let caches = root.cache_state(e.node)?;
        println!(
            "{:indent$}{name} subtree={} reach={} own={} total={} filter={} mask={}",
            "",
            e.total,
            e.next,
            caches.own,
            caches.total,
            caches.filter,
            caches.mask,
            indent = e.lv * 2,
        );
    }
    let stats = root.stats();
    println!(
        "textures: live={} created={} deleted={}; shared: live={} handles={}",
        stats.backend.live_textures,
        stats.backend.textures_created,
        stats.backend.textures_deleted,
        stats.shared.live,
        stats.shared.handles,
    );
    Ok(())
}
