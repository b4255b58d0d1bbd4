#[macro_use]
extern crate tracing;

use std::{path::PathBuf, str::FromStr, time::Duration};

use color_eyre::eyre::{bail, eyre, WrapErr};
use structopt::StructOpt;
use tokio::{runtime::Builder, signal};

use twinkly::{
    color::{BlendMode, Color, Rgb, Rgbw},
    device::{self, DeviceArray, DeviceClient, LedMode, Xled},
    frame::PixelFrame,
    models::Config,
    sequence::{
        FrameSequence, PlayOptions, Playable, PlaybackHandle, TransitionDirection, TransitionType,
    },
};

const VERSION: &str = git_version::git_version!(
    prefix = "twinkly-",
    args = ["--always", "--tags"],
    fallback = env!("CARGO_PKG_VERSION")
);

#[derive(Debug, StructOpt)]
struct Opts {
    /// Log more, repeat for debug and trace output
    #[structopt(short, long, parse(from_occurrences))]
    verbose: u32,
    /// Only log errors
    #[structopt(short, long, conflicts_with = "verbose")]
    quiet: bool,
    /// Runtime worker threads, defaults to the CPU count up to 4
    #[structopt(long)]
    threads: Option<usize>,
    #[structopt(short, long = "config")]
    config_path: Option<PathBuf>,
    #[structopt(subcommand)]
    command: Command,
}

#[derive(Debug, StructOpt)]
enum Command {
    /// List devices answering on the local network
    Discover {
        #[structopt(long)]
        timeout_ms: Option<u64>,
    },
    /// Print the properties of a device or array
    Info { target: String },
    /// Switch the LED mode
    Mode { target: String, mode: LedMode },
    /// Switch the LEDs on
    On { target: String },
    /// Switch the LEDs off
    Off { target: String },
    /// Set the brightness, in percent
    Brightness { target: String, percent: u8 },
    /// Show a static color, as rrggbb or rrggbbww hex
    Color { target: String, color: String },
    /// Stream an image for some time
    Show {
        target: String,
        image: PathBuf,
        #[structopt(long, default_value = "10")]
        seconds: u64,
    },
    /// Stream the PNG images of a directory, or the frames of a GIF
    Play {
        target: String,
        source: PathBuf,
        /// Delay between frames
        #[structopt(long, default_value = "1000")]
        frame_delay_ms: u64,
        /// Number of passes, -1 to loop until interrupted
        #[structopt(long = "loop", default_value = "-1", allow_hyphen_values = true)]
        loop_count: i32,
        #[structopt(long)]
        random: bool,
        #[structopt(long, default_value = "straight")]
        transition: TransitionType,
        /// Random among the supported ones if omitted
        #[structopt(long)]
        direction: Option<TransitionDirection>,
        /// Random if omitted
        #[structopt(long)]
        blend_mode: Option<BlendMode>,
        #[structopt(long, default_value = "2000")]
        transition_ms: u64,
    },
}

fn parse_color(s: &str) -> color_eyre::eyre::Result<Color> {
    let digits = s.trim_start_matches('#').trim_start_matches("0x");

    Ok(match digits.len() {
        8 => Rgbw::from_str(s)?.into(),
        6 => Rgb::from_str(s)?.into(),
        other => bail!("expected 6 or 8 hex digits, got {}", other),
    })
}

/// Connect to the device or array called `name`
async fn open_target(config: &Config, name: &str) -> color_eyre::eyre::Result<Box<dyn Xled>> {
    if let Some(device) = config.devices.get(name) {
        let mut client = DeviceClient::from_config(name, device, config)?;
        if !client.connect().await {
            warn!(device = %name, "device unreachable");
        }

        return Ok(Box::new(client));
    }

    if let Some(array) = config.arrays.get(name) {
        let mut array = DeviceArray::from_config(array, config)?;
        if !array.connect().await {
            warn!(array = %name, "some devices are unreachable");
        }

        return Ok(Box::new(array));
    }

    Err(eyre!("no device or array named {}", name))
}

/// Play `playable` until it ends or Ctrl-C is pressed
async fn play_until_interrupted(
    playable: &Playable,
    target: &mut dyn Xled,
    options: &PlayOptions,
) {
    let handle = PlaybackHandle::new();

    let interrupt = tokio::spawn({
        let handle = handle.clone();

        async move {
            if signal::ctrl_c().await.is_ok() {
                info!("stopping playback");
                handle.stop();
            }
        }
    });

    playable.play(target, options, &handle).await;
    interrupt.abort();
}

async fn load_config(opts: &Opts) -> color_eyre::eyre::Result<Config> {
    let path = match &opts.config_path {
        Some(path) => path.clone(),
        None => match Config::default_path() {
            Some(path) if path.exists() => path,
            _ => return Ok(Config::default()),
        },
    };

    Config::load_file(&path)
        .await
        .wrap_err_with(|| format!("loading {}", path.display()))
}

async fn run(opts: Opts) -> color_eyre::eyre::Result<()> {
    debug!(version = VERSION, "starting");
    let config = load_config(&opts).await?;

    match opts.command {
        Command::Discover { timeout_ms } => {
            let window =
                Duration::from_millis(timeout_ms.unwrap_or(config.streaming.discovery_timeout_ms));

            for found in device::discover(config.streaming.discovery_port, window).await? {
                println!(
                    "{}\t{}",
                    found.address,
                    found.name.as_deref().unwrap_or("-")
                );
            }
        }
        Command::Info { target } => {
            let mut target = open_target(&config, &target).await?;

            println!("size: {}x{}", target.width(), target.height());
            println!("logged in: {}", target.is_logged_in());
            if let Some(mode) = target.led_mode().await {
                println!("mode: {}", <&'static str>::from(mode));
            }
            if let Some(brightness) = target.brightness().await {
                println!("brightness: {:.0}%", brightness * 100.0);
            }
            if let Some(color) = target.color().await {
                println!("color: {}", color.web());
            }
        }
        Command::Mode { target, mode } => {
            open_target(&config, &target)
                .await?
                .set_led_mode(mode)
                .await
                .ok_or_else(|| eyre!("failed to set mode"))?;
        }
        Command::On { target } => {
            open_target(&config, &target)
                .await?
                .power_on()
                .await
                .ok_or_else(|| eyre!("failed to switch on"))?;
        }
        Command::Off { target } => {
            open_target(&config, &target)
                .await?
                .power_off()
                .await
                .ok_or_else(|| eyre!("failed to switch off"))?;
        }
        Command::Brightness { target, percent } => {
            open_target(&config, &target)
                .await?
                .set_brightness(f64::from(percent.min(100)) / 100.0)
                .await
                .ok_or_else(|| eyre!("failed to set brightness"))?;
        }
        Command::Color { target, color } => {
            let color = parse_color(&color)?;
            let mut target = open_target(&config, &target).await?;

            target
                .set_led_mode(LedMode::Color)
                .await
                .ok_or_else(|| eyre!("failed to switch to color mode"))?;
            target
                .set_color(color)
                .await
                .ok_or_else(|| eyre!("failed to set color"))?;
        }
        Command::Show {
            target,
            image,
            seconds,
        } => {
            let frame = PixelFrame::open(&image)
                .wrap_err_with(|| format!("loading {}", image.display()))?
                .with_frame_delay(Duration::from_secs(seconds));
            let mut target = open_target(&config, &target).await?;

            play_until_interrupted(&frame.into(), target.as_mut(), &PlayOptions::default()).await;
        }
        Command::Play {
            target,
            source,
            frame_delay_ms,
            loop_count,
            random,
            transition,
            direction,
            blend_mode,
            transition_ms,
        } => {
            let mut sequence = FrameSequence::new(Duration::from_millis(frame_delay_ms));

            if source.is_dir() {
                sequence.add_images_from_directory(&source)?;
            } else {
                let file = std::io::BufReader::new(std::fs::File::open(&source)?);
                sequence.add_animated_gif(file, usize::MAX)?;
            }

            if sequence.is_empty() {
                bail!("no frames found in {}", source.display());
            }

            info!(frames = sequence.len(), "loaded");

            let options = PlayOptions {
                loop_count,
                random,
                transition,
                direction,
                blend_mode,
                transition_duration: Duration::from_millis(transition_ms),
            };

            let mut target = open_target(&config, &target).await?;
            play_until_interrupted(&sequence.into(), target.as_mut(), &options).await;
        }
    }

    Ok(())
}

/// Environment variable overriding the `-v`/`-q` log filter
const LOG_ENV: &str = "TWINKLY_LOG";

fn log_level(verbose: u32, quiet: bool) -> &'static str {
    match (quiet, verbose) {
        (true, _) => "error",
        (false, 0) => "warn",
        (false, 1) => "info",
        (false, 2) => "debug",
        (false, _) => "trace",
    }
}

/// Log to stderr, stdout carries command output
fn install_tracing(opts: &Opts) -> Result<(), tracing_subscriber::util::TryInitError> {
    use tracing_error::ErrorLayer;
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter_layer = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| {
        EnvFilter::new(format!("twinkly={}", log_level(opts.verbose, opts.quiet)))
    });

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(opts.verbose > 1)
        .compact();

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt_layer)
        .with(ErrorLayer::default())
        .try_init()
}

#[paw::main]
fn main(opts: Opts) -> color_eyre::eyre::Result<()> {
    color_eyre::install()?;
    install_tracing(&opts)?;

    let workers = opts
        .threads
        .unwrap_or_else(|| num_cpus::get().min(4))
        .max(1);
    debug!(workers, "starting runtime");

    Builder::new_multi_thread()
        .worker_threads(workers)
        .thread_name("twinkly-worker")
        .enable_all()
        .build()?
        .block_on(run(opts))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level() {
        assert_eq!(log_level(0, false), "warn");
        assert_eq!(log_level(2, false), "debug");
        assert_eq!(log_level(7, false), "trace");
        assert_eq!(log_level(0, true), "error");
    }

    #[test]
    fn test_parse_color() {
        assert_eq!(parse_color("#ff8000").unwrap(), Rgb::new(255, 128, 0).into());
        assert_eq!(
            parse_color("0x01020304").unwrap(),
            Rgbw::new(1, 2, 3, 4).into()
        );
        assert!(parse_color("fff").is_err());
    }

    #[test]
    fn test_options() {
        let opts = Opts::from_iter(&["twinkly", "-vv", "play", "tree", "frames", "--loop", "-1"]);
        assert_eq!(opts.verbose, 2);
        assert!(matches!(opts.command, Command::Play { loop_count: -1, .. }));

        assert!(Opts::from_iter_safe(&["twinkly", "-q", "-v", "on", "tree"]).is_err());
    }
}
