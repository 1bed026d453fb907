// --- Screen ---
pub const SCREEN_WIDTH: f64 = 800.0;
pub const SCREEN_HEIGHT: f64 = 600.0;
pub const FRAMES_PER_SECOND: u32 = 60;
pub const GAME_TITLE: &str = "Space Dodge";

// One terminal cell in logical units is measured against this grid.
pub const REFERENCE_COLUMNS: u16 = 80;
pub const REFERENCE_ROWS: u16 = 24;

// --- Session ---
pub const STARTING_LIVES: u32 = 5;
pub const INITIAL_SPAWN_INTERVAL: u32 = 60; // Frames between missile spawns
pub const MIN_SPAWN_INTERVAL: u32 = 20;
pub const INITIAL_MISSILE_SPEED: f64 = 5.0;
pub const MISSILE_SPEED_INCREASE: f64 = 0.5;
pub const SPEED_UP_SCORE_STEP: u32 = 10;

// --- Player ---
pub const PLAYER_SPEED: f64 = 5.0;
pub const PLAYER_BOTTOM_OFFSET: f64 = 100.0; // Player row sits this far above the bottom edge

// --- Monster ---
pub const MONSTER_SPEED: f64 = 5.0;
pub const MONSTER_SCORE_THRESHOLD: u32 = 10; // Monster wakes up once score exceeds this
pub const MONSTER_MOVE_EVERY: u64 = 4; // Frames
pub const HEAVY_MISSILE_EVERY: u64 = 60; // Frames

// --- HUD ---
pub const LIFE_ICON_SPACING: f64 = 30.0;
pub const LIFE_ICON_Y: f64 = 25.0;
pub const STAR_COUNT: usize = 20;

// --- Input ---
pub const KEY_HOLD_WINDOW: u64 = 8; // Frames a press/repeat keeps a key "held"

// --- Audio ---
pub const MUSIC_VOLUME: f32 = 0.4;
