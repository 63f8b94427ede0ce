//! Headless growth run over a generated attraction point cloud.
//!
//! [`Runner`] owns the point cloud and the resolved parameters, grows the
//! skeleton once, and reports the result on stdout.

use anyhow::{Context, Result, bail};
use clap::{Parser, ValueEnum};
use glam::{Mat4, Vec3};
use grower_core::{
    GrowthOutput, GrowthParameters, PointSnapshot, RelativeParameters, attractor::PointCloud,
    grow_with_diagnostics, input,
};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::path::PathBuf;

/// Volume the attraction points are sampled from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum CloudShape {
    Sphere,
    Box,
}

/// Grow a space-colonization skeleton through a random point cloud.
#[derive(Parser, Debug)]
#[command(name = "grower")]
#[command(
    about = "Grow a branching skeleton toward a cloud of attraction points",
    long_about = None
)]
pub struct Args {
    /// Number of attraction points to generate
    #[arg(short = 'n', long, default_value_t = 1000)]
    pub points: usize,

    /// Volume the cloud is sampled from
    #[arg(long, value_enum, default_value_t = CloudShape::Sphere)]
    pub shape: CloudShape,

    /// Radius of the cloud; half the side length for a box
    #[arg(long, default_value_t = 100.0)]
    pub cloud_radius: f32,

    /// Center of the cloud, as x y z
    #[arg(long, num_args = 3, default_values_t = [0.0, 120.0, 0.0], allow_negative_numbers = true)]
    pub cloud_center: Vec<f32>,

    /// World-space seed position, as x y z; mapped into the cloud's frame
    #[arg(long, num_args = 3, default_values_t = [0.0, 0.0, 0.0], allow_negative_numbers = true)]
    pub seed: Vec<f32>,

    /// World-space position of the cloud frame's origin, as x y z
    #[arg(long, num_args = 3, default_values_t = [0.0, 0.0, 0.0], allow_negative_numbers = true)]
    pub frame_origin: Vec<f32>,

    /// Cloud frame units per world unit
    #[arg(long, default_value_t = 1.0)]
    pub frame_scale: f32,

    /// RNG seed for the point cloud
    #[arg(long, default_value_t = 12345)]
    pub rng_seed: u64,

    /// JSON file with relative parameters; missing fields use defaults
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Search radius as a fraction of the cloud extent
    #[arg(long)]
    pub search_radius: Option<f32>,

    /// Kill radius as a fraction of the cloud extent
    #[arg(long)]
    pub kill_radius: Option<f32>,

    /// Grow step as a fraction of the cloud extent
    #[arg(long)]
    pub grow_step: Option<f32>,

    /// Maximum neighbors considered per query
    #[arg(long)]
    pub max_neighbors: Option<usize>,

    /// Print every node after the summary
    #[arg(long)]
    pub dump: bool,
}

/// Maps world space onto the cloud frame: shift by the frame origin, then
/// scale.
fn world_to_local(args: &Args) -> Result<Mat4> {
    if args.frame_scale.is_nan() || args.frame_scale <= 0.0 {
        bail!("frame_scale must be positive, got {}", args.frame_scale);
    }
    let origin = Vec3::from_slice(&args.frame_origin);
    Ok(Mat4::from_scale(Vec3::splat(args.frame_scale)) * Mat4::from_translation(-origin))
}

pub struct Runner {
    cloud: PointCloud,
    seed: Vec3,
    params: GrowthParameters,
    dump: bool,
}

impl Runner {
    /// Generates the cloud and resolves the parameters against its extent.
    pub fn new(args: Args) -> Result<Self> {
        let relative = Self::relative_parameters(&args)?;

        let mut rng = ChaCha8Rng::seed_from_u64(args.rng_seed);
        let center = Vec3::from_slice(&args.cloud_center);
        let cloud = match args.shape {
            CloudShape::Sphere => {
                PointCloud::random_in_sphere(center, args.cloud_radius, args.points, &mut rng)
            }
            CloudShape::Box => PointCloud::random_in_box(
                center,
                Vec3::splat(args.cloud_radius),
                args.points,
                &mut rng,
            ),
        };

        let seed = input::seed_to_local(Vec3::from_slice(&args.seed), &world_to_local(&args)?);
        log::debug!("[CLI] seed {:?} -> {seed} in cloud frame", args.seed);

        let params = input::resolve_parameters(&cloud.positions, &relative);
        log::info!(
            "[CLI] {} points, extent {:.3}, params {:?}",
            cloud.len(),
            input::max_extent(&cloud.positions),
            params
        );

        Ok(Self {
            cloud,
            seed,
            params,
            dump: args.dump,
        })
    }

    /// Point cloud the run grows through.
    pub fn cloud(&self) -> &PointCloud {
        &self.cloud
    }

    /// Seed in the cloud's frame.
    pub fn seed(&self) -> Vec3 {
        self.seed
    }

    /// Config file first, then command-line overrides on top.
    fn relative_parameters(args: &Args) -> Result<RelativeParameters> {
        let mut rel = match &args.config {
            Some(path) => {
                let text = std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read config {}", path.display()))?;
                serde_json::from_str(&text)
                    .with_context(|| format!("Failed to parse config {}", path.display()))?
            }
            None => RelativeParameters::default(),
        };

        if let Some(v) = args.search_radius {
            rel.search_radius = v;
        }
        if let Some(v) = args.kill_radius {
            rel.kill_radius = v;
        }
        if let Some(v) = args.grow_step {
            rel.grow_step = v;
        }
        if let Some(v) = args.max_neighbors {
            rel.max_neighbors = v;
        }

        if rel.grow_step <= 0.0 || rel.kill_radius <= 0.0 {
            bail!("grow_step and kill_radius must be positive, or growth never stops");
        }
        Ok(rel)
    }

    /// Grows the skeleton and prints the report.
    pub fn run(self) -> Result<()> {
        let mut snapshot: Vec<PointSnapshot> = Vec::new();
        let out = grow_with_diagnostics(
            &self.cloud.positions,
            &self.cloud.normals,
            self.seed,
            self.params,
            Some(&mut snapshot),
        )
        .context("Growth rejected its parameters")?;

        self.report(&out, &snapshot);
        Ok(())
    }

    fn report(&self, out: &GrowthOutput, snapshot: &[PointSnapshot]) {
        let sk = &out.skeleton;
        let consumed = snapshot.iter().filter(|p| !p.active).count();
        let tips = sk.nodes.iter().filter(|n| n.children.is_empty()).count();
        let max_depth = (0..sk.len()).filter_map(|id| sk.depth(id)).max().unwrap_or(0);

        println!("nodes        = {}", sk.len());
        println!("tips         = {tips}");
        println!("max depth    = {max_depth}");
        println!("consumed     = {consumed} / {}", snapshot.len());
        println!("iterations   = {}", out.stats.iterations);
        println!("duplicates   = {}", out.stats.duplicates_suppressed);
        println!("stalled      = {}", out.stats.stalled);
        println!("re-parented  = {}", out.stats.reparented);
        if let Some((lo, hi)) = sk.bounds() {
            println!("bounds       = {lo} .. {hi}");
        }

        if self.dump {
            for (id, n) in sk.nodes.iter().enumerate() {
                let parent = n.parent.map_or_else(|| "-".to_string(), |p| p.to_string());
                println!("{id}\t{parent}\t{}\t{}", n.pos, n.normal);
            }
        }
    }
}
