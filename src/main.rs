use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use clap::{Parser, Subcommand};

use syncgrab_lib::camera::backend::CameraBackend;
use syncgrab_lib::camera::simulator::SimulatedBackend;
use syncgrab_lib::camera::types::DeviceId;
use syncgrab_lib::grab::handler::{AcquireOutcome, SyncGrab};
use syncgrab_lib::settings::store::SettingsStore;
use syncgrab_lib::settings::types::GrabSettings;

/// How often `watch` drains hot-plug events.
const WATCH_TICK: Duration = Duration::from_millis(200);

/// Grab single frames from a camera
#[derive(Parser, Debug)]
#[command(name = "syncgrab")]
#[command(version, about = "Synchronous single-frame camera grabber", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Settings file path
    #[arg(long, short)]
    config: Option<PathBuf>,

    /// Use the simulated camera even when the Vimba backend is built in
    #[arg(long)]
    simulate: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List connected cameras
    List {
        /// Print the list as JSON
        #[arg(long)]
        json: bool,
    },
    /// Acquire one frame from a camera
    Grab {
        /// Camera ID (default: preferred camera, else the first one)
        #[arg(long)]
        camera: Option<String>,

        /// Write the image to this file as binary PPM
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
    /// Report cameras being plugged in and out
    Watch {
        /// Stop after this many seconds
        #[arg(long, default_value = "10")]
        seconds: u64,
    },
}

/// Create the camera backend.
///
/// With the `vimba` feature the real API is used unless `--simulate` is set.
fn create_backend(settings: &GrabSettings, simulate: bool) -> Box<dyn CameraBackend> {
    #[cfg(feature = "vimba")]
    {
        if !simulate {
            use syncgrab_lib::camera::vimba::VimbaSdk;
            return Box::new(VimbaSdk::new(settings.hotplug_poll_interval()));
        }
    }

    #[cfg(not(feature = "vimba"))]
    {
        if !simulate {
            tracing::debug!("Built without Vimba support, using the simulated camera");
        }
    }

    Box::new(SimulatedBackend::new(
        &settings.simulator,
        settings.hotplug_poll_interval(),
    ))
}

fn settings_path(config: Option<PathBuf>) -> PathBuf {
    config
        .or_else(SettingsStore::default_path)
        .unwrap_or_else(|| PathBuf::from("syncgrab-settings.json"))
}

/// Print the log oldest-first, the order it was written in.
fn print_log<B: CameraBackend>(grab: &SyncGrab<B>) {
    for line in grab.log().oldest_first() {
        println!("{line}");
    }
}

fn run_list<B: CameraBackend>(grab: &SyncGrab<B>, json: bool) -> Result<(), String> {
    let cameras = grab.cameras();
    if json {
        let out = serde_json::to_string_pretty(cameras.entries()).map_err(|e| e.to_string())?;
        println!("{out}");
        return Ok(());
    }

    print_log(grab);
    for (index, entry) in cameras.entries().iter().enumerate() {
        let marker = if cameras.selected_index() == Some(index) {
            '*'
        } else {
            ' '
        };
        println!("{marker} {}", entry.label);
    }
    Ok(())
}

fn write_image<B: CameraBackend>(grab: &SyncGrab<B>, path: &Path) -> Result<(), String> {
    let image = grab
        .image()
        .ok_or_else(|| "no image to write".to_string())?;
    let file = File::create(path).map_err(|e| format!("{}: {e}", path.display()))?;
    image
        .write_ppm(BufWriter::new(file))
        .map_err(|e| format!("{}: {e}", path.display()))?;
    tracing::info!("Wrote {}x{} image to {}", image.width(), image.height(), path.display());
    Ok(())
}

fn run_grab<B: CameraBackend>(
    grab: &mut SyncGrab<B>,
    store: &SettingsStore,
    camera: Option<String>,
    output: Option<PathBuf>,
) -> Result<(), String> {
    if let Some(id) = camera {
        let id = DeviceId::new(id);
        if !grab.cameras_mut().select_id(&id) {
            tracing::warn!("Camera {id} is not connected");
            grab.cameras_mut().clear_selection();
        }
    }

    let outcome = grab.acquire();
    print_log(grab);

    match outcome {
        AcquireOutcome::Displayed { .. } => {
            if let Some(id) = grab.cameras().selected_id() {
                store.set_preferred_camera(id.as_str());
            }
            if let Err(e) = store.save_if_dirty() {
                tracing::warn!("Failed to save settings: {e}");
            }
            match output {
                Some(path) => write_image(grab, &path),
                None => Ok(()),
            }
        }
        AcquireOutcome::NoSelection => Err("no camera selected".to_string()),
        AcquireOutcome::Failed(e) => Err(e.to_string()),
    }
}

fn run_watch<B: CameraBackend>(grab: &mut SyncGrab<B>, seconds: u64) {
    let deadline = Instant::now() + Duration::from_secs(seconds);
    while Instant::now() < deadline {
        if grab.process_hotplug_events() {
            let labels: Vec<&str> = grab
                .cameras()
                .entries()
                .iter()
                .map(|entry| entry.label.as_str())
                .collect();
            tracing::info!("Cameras: {labels:?}");
        }
        std::thread::sleep(WATCH_TICK);
    }
    print_log(grab);
}

/// Start the camera API and run one command.
///
/// `grab` is dropped before this returns, so the API is shut down on every
/// path, including a failed start-up.
fn run<B: CameraBackend>(
    mut grab: SyncGrab<B>,
    store: &SettingsStore,
    command: Command,
) -> Result<(), String> {
    if let Err(e) = grab.start_up() {
        print_log(&grab);
        return Err(e.to_string());
    }

    match command {
        Command::List { json } => run_list(&grab, json),
        Command::Grab { camera, output } => run_grab(&mut grab, store, camera, output),
        Command::Watch { seconds } => {
            run_watch(&mut grab, seconds);
            Ok(())
        }
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let store = SettingsStore::new(settings_path(cli.config));
    let settings = store.get();

    let backend = create_backend(&settings, cli.simulate);
    let grab = SyncGrab::new(backend, settings.log_capacity)
        .with_preferred_camera(settings.preferred_camera.clone().map(DeviceId::new));

    if let Err(e) = run(grab, &store, cli.command) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
