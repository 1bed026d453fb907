use std::io::{self, Write};

use crossterm::{
    cursor::{Hide, Show},
    event::{
        DisableMouseCapture, EnableMouseCapture, KeyboardEnhancementFlags, PopKeyboardEnhancementFlags,
        PushKeyboardEnhancementFlags,
    },
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode, size},
};
use log::{error, info};

use space_dodge::assets::Assets;
use space_dodge::audio::{AudioSystem, SoundBank};
use space_dodge::config::GameConfig;
use space_dodge::rendering::OutputTarget;
use space_dodge::screens::App;
use space_dodge::terminal_io::TerminalInput;

fn main() -> io::Result<()> {
    let config = GameConfig::from_env();
    simple_logging::log_to_file(&config.log_file, config.log_level)?;
    info!("Starting {} application.", config.title);
    info!("Assets from {}", config.asset_dir.display());

    // Asset failures only produce warnings; the game runs with whatever loaded.
    let assets = Assets::load(&config);
    let sounds = SoundBank::load(&config);
    let audio = AudioSystem::open(&config);

    info!("Attempting to enable raw mode.");
    enable_raw_mode().map_err(|e| { error!("Failed to enable raw mode: {}", e); e })?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, Hide, EnableMouseCapture)
        .map_err(|e| { error!("Failed to prepare terminal: {}", e); e })?;
    // Release events where the terminal supports them; others ignore this.
    let keyboard_enhanced = execute!(stdout, PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)).is_ok();

    let result = size()
        .map_err(|e| { error!("Failed to get terminal size: {}", e); e })
        .and_then(|terminal_size| {
            info!("Terminal size: {}x{}", terminal_size.0, terminal_size.1);
            let mut app = App::new(
                config,
                assets,
                sounds,
                audio,
                Box::new(TerminalInput),
                OutputTarget::stdout(),
                terminal_size,
            );
            app.run()
        });

    if keyboard_enhanced {
        let _ = execute!(stdout, PopKeyboardEnhancementFlags);
    }
    let _ = execute!(stdout, DisableMouseCapture, Show, LeaveAlternateScreen);
    let _ = stdout.flush();
    disable_raw_mode().map_err(|e| { error!("Failed to disable raw mode on exit: {}", e); e })?;

    match &result {
        Ok(()) => info!("Exiting application."),
        Err(e) => error!("Game loop failed: {}", e),
    }
    result
}
