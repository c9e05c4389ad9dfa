//! Character playback command implementations

use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use clap::Subcommand;
use console::style;
use wolf_character::{AnimationTable, Character, TaskQueue};
use wolf_data::SurfaceSource;

use crate::utils::{add_table_row, create_spinner, create_table, format_percentage, format_vec3};

/// Animation table looked up in the character directory.
const DEFAULT_ANIM_FILE: &str = "wolfanim.cfg";

#[derive(Subcommand)]
pub enum CharacterCommands {
    /// Load a character and step its animation at a fixed rate
    Play {
        /// Directory holding body.mds, the head model and skins
        dir: PathBuf,

        /// Skin name, selects body_<skin>.skin and head_<skin>.skin
        #[arg(short, long, default_value = "default")]
        skin: String,

        /// Animation to play
        #[arg(short, long)]
        anim: Option<String>,

        /// Animation table (defaults to wolfanim.cfg in the character directory)
        #[arg(long)]
        anim_file: Option<PathBuf>,

        /// Number of updates to run
        #[arg(short, long, default_value = "10")]
        ticks: usize,

        /// Seconds per update
        #[arg(long, default_value = "0.05")]
        dt: f32,
    },
}

pub fn execute(cmd: CharacterCommands) -> Result<()> {
    match cmd {
        CharacterCommands::Play {
            dir,
            skin,
            anim,
            anim_file,
            ticks,
            dt,
        } => handle_play(&dir, &skin, anim.as_deref(), anim_file, ticks, dt),
    }
}

/// State owned by the main loop.
#[derive(Default)]
struct Viewer {
    character: Option<Character>,
    load_error: Option<String>,
}

/// Loads the character on a worker thread and waits for the queue to
/// deliver it.
fn load_in_background(dir: &Path, skin: &str) -> Result<Character> {
    let queue = TaskQueue::<Viewer>::new();
    let sender = queue.sender();
    let worker_dir = dir.to_path_buf();
    let worker_skin = skin.to_string();

    let worker = thread::spawn(move || {
        let loaded = Character::load(&worker_dir, &worker_skin);
        sender.push(move |viewer: &mut Viewer| match loaded {
            Ok(character) => viewer.character = Some(character),
            Err(e) => viewer.load_error = Some(e.to_string()),
        });
    });

    // -q lowers the log level to errors only
    let quiet = !log::log_enabled!(log::Level::Warn);
    let spinner = create_spinner(&format!("Loading {}", dir.display()), quiet);
    let mut viewer = Viewer::default();
    while viewer.character.is_none() && viewer.load_error.is_none() {
        if queue.poll(&mut viewer) == 0 {
            if worker.is_finished() && queue.is_empty() {
                break;
            }
            thread::sleep(Duration::from_millis(10));
        }
    }
    spinner.finish_and_clear();

    if worker.join().is_err() {
        return Err(anyhow!("Loader thread panicked"));
    }
    if let Some(error) = viewer.load_error {
        return Err(anyhow!(error)).with_context(|| format!("Failed to load {}", dir.display()));
    }
    viewer
        .character
        .ok_or_else(|| anyhow!("Loader finished without a character"))
}

fn handle_play(
    dir: &Path,
    skin: &str,
    anim: Option<&str>,
    anim_file: Option<PathBuf>,
    ticks: usize,
    dt: f32,
) -> Result<()> {
    let mut character = load_in_background(dir, skin)?;

    println!(
        "{} {} with skin {}: {} body surfaces, {} head surfaces, {} textures",
        style("Loaded").bold(),
        style(character.name()).cyan(),
        style(skin).yellow(),
        character.body().surface_count(),
        character.head().surface_count(),
        character.textures().len()
    );

    if let Some(name) = anim {
        let table_path = anim_file.unwrap_or_else(|| dir.join(DEFAULT_ANIM_FILE));
        let table = AnimationTable::load(&table_path).with_context(|| {
            format!("Failed to read animation table: {}", table_path.display())
        })?;
        let entry = table.get(name)?;
        println!(
            "Playing {} (frames {}..{} at {} fps)",
            style(&entry.name).yellow(),
            entry.first_frame,
            entry.first_frame + entry.length,
            entry.fps
        );
        character.set_animation(entry);
    }

    let mut pose = character.allocate_pose();
    let mut table = create_table(&["Tick", "Time", "Frame", "Old frame", "Lerp", "Head tag"]);
    for tick in 0..ticks {
        character.update(dt);
        character
            .pose_into(&mut pose)
            .with_context(|| format!("Failed to pose {} at tick {tick}", character.name()))?;

        let info = pose.frame_info;
        add_table_row(
            &mut table,
            vec![
                tick.to_string(),
                format!("{:.3}", character.clock().time()),
                info.frame.to_string(),
                info.old_frame.to_string(),
                format_percentage(info.lerp),
                format_vec3(pose.head_transform.w_axis.truncate()),
            ],
        );
    }
    table.printstd();

    Ok(())
}
