use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context as _;
use clap::{Parser, Subcommand};

use rankrace::{
    Animator, AnimatorOpts, ChartLayout, ChartScene, CpuRenderer, Dataset, DEFAULT_RANK_CAP,
    Palette, PngDirSink, RenderOptions,
};

#[derive(Parser, Debug)]
#[command(name = "rankrace", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print a summary of the dataset (years, entities, totals).
    Inspect(InspectArgs),
    /// Dump one resolved scene as JSON.
    Scene(SceneArgs),
    /// Render a single dataset frame as a PNG.
    Frame(FrameArgs),
    /// Play the whole race and write numbered PNG frames.
    Render(RenderArgs),
}

#[derive(Parser, Debug)]
struct DataArgs {
    /// Input CSV with `Year,Country name,Population` columns.
    #[arg(long = "data")]
    data_path: PathBuf,

    /// Entities kept per year after ranking.
    #[arg(long, default_value_t = DEFAULT_RANK_CAP)]
    rank_cap: usize,
}

#[derive(Parser, Debug)]
struct InspectArgs {
    #[command(flatten)]
    data: DataArgs,
}

#[derive(Parser, Debug)]
struct SceneArgs {
    #[command(flatten)]
    data: DataArgs,

    /// Frame index (0-based).
    #[arg(long)]
    frame: usize,
}

#[derive(Parser, Debug)]
struct FrameArgs {
    #[command(flatten)]
    data: DataArgs,

    /// Frame index (0-based).
    #[arg(long)]
    frame: usize,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,

    /// TTF/OTF used for all chart text; text is omitted without it.
    #[arg(long)]
    font: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct RenderArgs {
    #[command(flatten)]
    data: DataArgs,

    /// Output directory for `frame_#####.png` files.
    #[arg(long)]
    out: PathBuf,

    /// Rendered frames per dataset year (eased in-betweens above 1).
    #[arg(long, default_value_t = 1)]
    steps: usize,

    /// Tick interval in milliseconds; 0 renders as fast as possible.
    #[arg(long, default_value_t = 0)]
    interval_ms: u64,

    /// TTF/OTF used for all chart text; text is omitted without it.
    #[arg(long)]
    font: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    match cli.cmd {
        Command::Inspect(args) => cmd_inspect(args),
        Command::Scene(args) => cmd_scene(args),
        Command::Frame(args) => cmd_frame(args),
        Command::Render(args) => cmd_render(args),
    }
}

fn read_dataset(args: &DataArgs) -> anyhow::Result<Dataset> {
    let file = std::fs::File::open(&args.data_path)
        .with_context(|| format!("open dataset '{}'", args.data_path.display()))?;
    let dataset = Dataset::from_reader(std::io::BufReader::new(file), args.rank_cap)
        .with_context(|| format!("load dataset '{}'", args.data_path.display()))?;
    Ok(dataset)
}

fn make_renderer(font: Option<&Path>) -> anyhow::Result<CpuRenderer> {
    let font_bytes = match font {
        Some(path) => Some(
            std::fs::read(path).with_context(|| format!("read font '{}'", path.display()))?,
        ),
        None => None,
    };
    let renderer = CpuRenderer::new(RenderOptions {
        font_bytes,
        ..RenderOptions::default()
    })?;
    Ok(renderer)
}

fn cmd_inspect(args: InspectArgs) -> anyhow::Result<()> {
    let dataset = read_dataset(&args.data)?;
    println!("years: {}", dataset.len());
    if let Some((first, last)) = dataset.year_span() {
        println!("span:  {first}..={last}");
    }
    for snap in dataset.snapshots() {
        let top = snap.data.first();
        println!(
            "{}: {} ranked, total {}, leader {}",
            snap.year,
            snap.data.len(),
            snap.total,
            top.map(|e| e.name.as_str()).unwrap_or("-"),
        );
    }
    Ok(())
}

fn cmd_scene(args: SceneArgs) -> anyhow::Result<()> {
    let dataset = read_dataset(&args.data)?;
    let layout = ChartLayout::default();
    let palette = Palette::from_dataset(&dataset);
    let scene = ChartScene::build(&dataset, args.frame, &layout, &palette)?;
    let json = serde_json::to_string_pretty(&scene).context("serialize scene")?;
    println!("{json}");
    Ok(())
}

fn cmd_frame(args: FrameArgs) -> anyhow::Result<()> {
    let dataset = read_dataset(&args.data)?;
    let layout = ChartLayout::default();
    let palette = Palette::from_dataset(&dataset);
    let scene = ChartScene::build(&dataset, args.frame, &layout, &palette)?;

    let mut renderer = make_renderer(args.font.as_deref())?;
    let frame = renderer.render_scene(&scene, &layout)?;

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

    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn cmd_render(args: RenderArgs) -> anyhow::Result<()> {
    anyhow::ensure!(args.steps > 0, "--steps must be at least 1");

    let dataset = read_dataset(&args.data)?;
    let renderer = make_renderer(args.font.as_deref())?;
    let opts = AnimatorOpts {
        steps_per_frame: args.steps,
        interval: Duration::from_millis(args.interval_ms),
        ..AnimatorOpts::default()
    };
    let mut animator = Animator::new(dataset, ChartLayout::default(), renderer, opts);

    let mut sink = PngDirSink::new(&args.out);
    let stats = animator.run(&mut sink)?;

    eprintln!(
        "wrote {} frames ({} years) to {}",
        stats.frames_rendered,
        stats.years_played,
        args.out.display()
    );
    Ok(())
}
