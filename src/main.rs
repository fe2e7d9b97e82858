use clap::{Parser, Subcommand};
use std::io::IsTerminal;
use std::path::PathBuf;
use std::process::ExitCode;
use waifu2x_ncnn_vulkan::config::ModelFiles;
use waifu2x_ncnn_vulkan::{Options, Waifu2x, batch, config, engine, imaging, output};

/// Upscaler options; each flag overrides the config file.
#[derive(clap::Args, Clone, Default)]
struct UpscaleArgs {
    /// GPU device ordinal, -1 for CPU
    #[arg(short = 'g', long, allow_negative_numbers = true)]
    gpu_id: Option<i32>,

    /// Upscale ratio (1 or 2)
    #[arg(short, long)]
    scale: Option<u32>,

    /// Denoise level (-1 to 3, -1 disables denoising)
    #[arg(short, long, allow_negative_numbers = true)]
    noise: Option<i32>,

    /// Tile size, 0 for automatic
    #[arg(short, long)]
    tile_size: Option<i32>,

    /// Model family name or model directory
    #[arg(short, long)]
    model: Option<String>,

    /// Enable test-time augmentation
    #[arg(short = 'x', long, conflicts_with = "no_tta")]
    tta: bool,

    /// Disable test-time augmentation, overriding the config file
    #[arg(long)]
    no_tta: bool,

    /// Engine worker threads
    #[arg(short = 'j', long)]
    threads: Option<u32>,

    /// Directory holding model families
    #[arg(long)]
    models_dir: Option<PathBuf>,

    /// Explicit model .param file, bypassing lookup by noise and scale
    #[arg(long, requires = "model_bin")]
    model_param: Option<PathBuf>,

    /// Explicit model .bin file, paired with --model-param
    #[arg(long, requires = "model_param")]
    model_bin: Option<PathBuf>,
}

impl UpscaleArgs {
    fn apply(&self, options: &mut Options) {
        if let Some(v) = self.gpu_id {
            options.gpu_id = v;
        }
        if let Some(v) = self.scale {
            options.scale = v;
        }
        if let Some(v) = self.noise {
            options.noise = v;
        }
        if let Some(v) = self.tile_size {
            options.tile_size = v;
        }
        if let Some(v) = &self.model {
            options.model = v.clone();
        }
        if self.tta {
            options.tta_mode = true;
        }
        if self.no_tta {
            options.tta_mode = false;
        }
        if let Some(v) = self.threads {
            options.num_threads = v;
        }
        if let Some(v) = &self.models_dir {
            options.models_dir = Some(v.clone());
        }
        if let (Some(param), Some(bin)) = (&self.model_param, &self.model_bin) {
            options.model_files = Some(ModelFiles {
                param: param.clone(),
                bin: bin.clone(),
            });
        }
    }
}

fn version_string() -> &'static str {
    let on_tag = env!("ON_RELEASE_TAG");
    if on_tag == "true" {
        env!("CARGO_PKG_VERSION")
    } else {
        let hash = env!("GIT_HASH");
        if hash.is_empty() {
            "dev@unknown"
        } else {
            // Leaked once at startup
            Box::leak(format!("dev@{hash}").into_boxed_str())
        }
    }
}

#[derive(Parser)]
#[command(name = "waifu2x")]
#[command(about = "Image super-resolution with waifu2x on Vulkan")]
#[command(long_about = "\
Image super-resolution with waifu2x on Vulkan

Models are looked up in models/ next to the executable unless --models-dir
or a model directory path is given:

  models/
  ├── models-cunet/
  │   ├── noise0_model.{param,bin}             # scale 1
  │   ├── noise0_scale2.0x_model.{param,bin}   # scale 2
  │   └── scale2.0x_model.{param,bin}          # noise -1
  ├── models-upconv_7_anime_style_art_rgb/
  └── models-upconv_7_photo/

Noise -1 only has a 2x model and always upscales 2x.

Run 'waifu2x gen-config' to generate a documented config file.")]
#[command(version = version_string())]
struct Cli {
    /// Config file (TOML); flags override its values
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Upscale an image file or every image in a directory
    Upscale {
        /// Input image or directory
        #[arg(short, long)]
        input: PathBuf,

        /// Output image or directory
        #[arg(short, long)]
        output: PathBuf,

        /// Output format when the output path has no image extension (png, jpg, webp, tiff)
        #[arg(short, long, default_value = "png")]
        format: String,

        #[command(flatten)]
        options: UpscaleArgs,
    },
    /// List Vulkan devices visible to the engine
    Devices,
    /// Print a stock config file with all options documented
    GenConfig,
}

fn main() -> ExitCode {
    init_tracing();
    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Command::Upscale {
            input,
            output: out_path,
            format,
            options: args,
        } => {
            let mut options = match &cli.config {
                Some(path) => config::load_options(path)?,
                None => Options::default(),
            };
            args.apply(&mut options);
            let format = imaging::output_format(&format)?;
            let jobs = batch::plan_jobs(&input, &out_path, format)?;

            let gpu = engine::GpuInstance::new();
            let summary = {
                let mut upscaler = Waifu2x::new(&options)?;
                output::print_model(&upscaler);
                println!();
                batch::run(&mut upscaler, &jobs, format, |event| {
                    for line in output::format_batch_event(&event) {
                        println!("{}", line);
                    }
                })
            };
            drop(gpu);

            println!();
            println!("{}", output::format_summary(&summary));
            if summary.failed > 0 {
                return Err(format!("{} of {} images failed", summary.failed, jobs.len()).into());
            }
        }
        Command::Devices => {
            let _gpu = engine::GpuInstance::new();
            for line in output::format_devices(engine::gpu_count()) {
                println!("{}", line);
            }
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

fn init_tracing() {
    let ansi_enabled = std::env::var_os("NO_COLOR").is_none() && std::io::stderr().is_terminal();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_ansi(ansi_enabled)
        .init();
}
