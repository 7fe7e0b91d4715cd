//! Tessera CLI - approximate triangle meshes with planar proxies.
//!
//! Usage: tessera <COMMAND> [OPTIONS] <INPUT> [OUTPUT]
//!
//! Run `tessera --help` for available commands.

use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use log::LevelFilter;

use tessera::algo::approximate::{approximate, ApproximateOptions, Seeding};
use tessera::io;
use tessera::mesh::HalfEdgeMesh;

#[derive(Parser)]
#[command(name = "tessera")]
#[command(author, version, about = "Variational shape approximation CLI", long_about = None)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Display mesh information
    Info {
        /// Input mesh file
        input: PathBuf,
    },

    /// Approximate a mesh by planar regions
    Approximate {
        /// Input mesh file
        input: PathBuf,

        /// Output mesh file (.stl or .ply)
        output: PathBuf,

        /// Number of planar proxies
        #[arg(short = 'n', long, default_value = "20")]
        proxies: usize,

        /// Number of flood/fit iterations
        #[arg(short, long, default_value = "10")]
        iterations: usize,

        /// Seeding strategy
        #[arg(short, long, value_enum, default_value = "hierarchical")]
        seeding: SeedingArg,

        /// Chord subdivision threshold
        #[arg(short = 't', long, default_value = "0.2")]
        threshold: f64,

        /// Also write the partition as a coloured PLY file
        #[arg(long)]
        segments: Option<PathBuf>,

        /// Use single-threaded execution (for benchmarking)
        #[arg(long)]
        sequential: bool,
    },
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum SeedingArg {
    /// Evenly spaced seeds
    Random,
    /// Insert proxies one at a time at the worst face
    Incremental,
    /// Grow the proxy count by error diffusion
    Hierarchical,
}

impl From<SeedingArg> for Seeding {
    fn from(arg: SeedingArg) -> Self {
        match arg {
            SeedingArg::Random => Seeding::Random,
            SeedingArg::Incremental => Seeding::Incremental,
            SeedingArg::Hierarchical => Seeding::Hierarchical,
        }
    }
}

fn main() {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Info { input } => cmd_info(&input)?,

        Commands::Approximate {
            input,
            output,
            proxies,
            iterations,
            seeding,
            threshold,
            segments,
            sequential,
        } => {
            let options = ApproximateOptions::default()
                .with_num_proxies(proxies)
                .with_iterations(iterations)
                .with_seeding(seeding.into())
                .with_subdivision_threshold(threshold)
                .with_parallel(!sequential);
            cmd_approximate(&input, &output, segments.as_deref(), &options)?;
        }
    }

    Ok(())
}

fn cmd_info(input: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let mesh: HalfEdgeMesh = io::load(input)?;

    println!("File: {}", input.display());
    println!("Vertices: {}", mesh.num_vertices());
    println!("Faces: {}", mesh.num_faces());
    println!("Half-edges: {}", mesh.num_halfedges());

    let (min_area, max_area) = mesh
        .face_ids()
        .map(|f| mesh.face_area(f))
        .fold((f64::MAX, 0.0_f64), |(lo, hi), a| (lo.min(a), hi.max(a)));
    println!("Surface area: {:.6}", mesh.surface_area());
    println!("Face area range: [{:.6}, {:.6}]", min_area, max_area);

    if let Some((min, max)) = mesh.bounding_box() {
        println!(
            "Bounding box: ({:.3}, {:.3}, {:.3}) to ({:.3}, {:.3}, {:.3})",
            min.x, min.y, min.z, max.x, max.y, max.z
        );
    }

    let boundary = mesh
        .vertex_ids()
        .filter(|&v| mesh.is_boundary_vertex(v))
        .count();
    if boundary == 0 {
        println!("Topology: Closed (no boundary)");
    } else {
        println!("Topology: Open ({} boundary vertices)", boundary);
    }
    println!("Face components: {}", mesh.num_face_components());

    Ok(())
}

fn cmd_approximate(
    input: &Path,
    output: &Path,
    segments: Option<&Path>,
    options: &ApproximateOptions,
) -> Result<(), Box<dyn std::error::Error>> {
    let mesh: HalfEdgeMesh = io::load(input)?;
    println!("Loaded: {} vertices, {} faces", mesh.num_vertices(), mesh.num_faces());

    let mode = if options.parallel { "parallel" } else { "sequential" };
    println!(
        "Approximating with {} proxies ({:?} seeding, {} iterations, {})...",
        options.num_proxies, options.seeding, options.iterations, mode
    );

    let start = Instant::now();
    let result = approximate(&mesh, options)?;
    let elapsed = start.elapsed();

    println!(
        "Result: {} anchors, {} triangles, {} borders",
        result.mesh.num_vertices(),
        result.mesh.num_triangles(),
        result.borders.len()
    );
    println!("Fitting error: {:.6}", result.fitting_error);
    println!("Manifold: {}", if result.manifold { "yes" } else { "no" });

    io::save_triangles(&result.mesh, output)?;
    println!("Saved: {} ({:.2?})", output.display(), elapsed);

    if let Some(path) = segments {
        io::ply::save_segmentation(&mesh, &result.segments, path)?;
        println!("Saved segmentation: {}", path.display());
    }

    Ok(())
}
