use std::collections::HashMap;
use std::error::Error;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crossterm::style::Color;
use log::{info, warn};

use crate::config::GameConfig;

#[derive(Debug)]
pub enum AssetError {
    Io { path: PathBuf, source: io::Error },
    Malformed { path: PathBuf, reason: String },
    UnsupportedFormat { path: PathBuf, expected: &'static str },
}

impl fmt::Display for AssetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssetError::Io { path, source } => write!(f, "cannot read {}: {}", path.display(), source),
            AssetError::Malformed { path, reason } => write!(f, "malformed asset {}: {}", path.display(), reason),
            AssetError::UnsupportedFormat { path, expected } => {
                write!(f, "{} is not a {} file", path.display(), expected)
            }
        }
    }
}

impl Error for AssetError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            AssetError::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

pub(crate) fn read_text(path: &Path) -> Result<String, AssetError> {
    fs::read_to_string(path).map_err(|source| AssetError::Io { path: path.to_path_buf(), source })
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SpriteKind {
    Player,
    Missile,
    Monster,
    HeavyMissile,
    Life,
}

impl SpriteKind {
    pub const ALL: [SpriteKind; 5] = [
        SpriteKind::Player,
        SpriteKind::Missile,
        SpriteKind::Monster,
        SpriteKind::HeavyMissile,
        SpriteKind::Life,
    ];

    pub fn file_name(self) -> &'static str {
        match self {
            SpriteKind::Player => "plane.txt",
            SpriteKind::Missile => "missile.txt",
            SpriteKind::Monster => "monster.txt",
            SpriteKind::HeavyMissile => "big_missile.txt",
            SpriteKind::Life => "life.txt",
        }
    }

    /// Size in cells used when the sprite file could not be loaded.
    pub fn default_cells(self) -> (u16, u16) {
        match self {
            SpriteKind::Player => (5, 2),
            SpriteKind::Missile => (1, 1),
            SpriteKind::Monster => (7, 2),
            SpriteKind::HeavyMissile => (3, 2),
            SpriteKind::Life => (2, 1),
        }
    }

    pub fn placeholder(self) -> char {
        match self {
            SpriteKind::Player => 'A',
            SpriteKind::Missile => '|',
            SpriteKind::Monster => 'M',
            SpriteKind::HeavyMissile => '#',
            SpriteKind::Life => '+',
        }
    }

    pub fn color(self) -> Color {
        match self {
            SpriteKind::Player => Color::Cyan,
            SpriteKind::Missile => Color::Red,
            SpriteKind::Monster => Color::Magenta,
            SpriteKind::HeavyMissile => Color::Yellow,
            SpriteKind::Life => Color::Green,
        }
    }
}

/// Text-art image. Spaces are transparent.
#[derive(Clone, Debug, PartialEq)]
pub struct Sprite {
    rows: Vec<Vec<char>>,
    columns: u16,
}

impl Sprite {
    /// Returns `None` when the text has no visible rows.
    pub fn parse(text: &str) -> Option<Sprite> {
        let lines: Vec<&str> = text.lines().map(|line| line.trim_end()).collect();
        let first = lines.iter().position(|line| !line.is_empty())?;
        let last = lines.iter().rposition(|line| !line.is_empty())?;
        let lines = &lines[first..=last];

        let columns = lines.iter().map(|line| line.chars().count()).max().unwrap_or(0);
        let rows = lines
            .iter()
            .map(|line| {
                let mut row: Vec<char> = line.chars().collect();
                row.resize(columns, ' ');
                row
            })
            .collect();
        Some(Sprite { rows, columns: columns as u16 })
    }

    pub fn load(path: &Path) -> Result<Sprite, AssetError> {
        let text = read_text(path)?;
        Sprite::parse(&text).ok_or_else(|| AssetError::Malformed {
            path: path.to_path_buf(),
            reason: "sprite has no visible rows".to_string(),
        })
    }

    pub fn rows(&self) -> &[Vec<char>] {
        &self.rows
    }

    pub fn columns(&self) -> u16 {
        self.columns
    }

    pub fn height_cells(&self) -> u16 {
        self.rows.len() as u16
    }

    /// Logical width and height for a given cell size.
    pub fn extent(&self, cell: (f64, f64)) -> (f64, f64) {
        (self.columns as f64 * cell.0, self.height_cells() as f64 * cell.1)
    }
}

/// Logical sizes the simulation needs for bounding boxes.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpriteExtents {
    pub player: (f64, f64),
    pub missile: (f64, f64),
    pub monster: (f64, f64),
    pub life: (f64, f64),
}

impl SpriteExtents {
    pub fn defaults(config: &GameConfig) -> Self {
        SpriteSet::empty().extents(config)
    }
}

#[derive(Clone, Debug, Default)]
pub struct SpriteSet {
    sprites: HashMap<SpriteKind, Sprite>,
}

impl SpriteSet {
    pub fn empty() -> Self {
        SpriteSet::default()
    }

    /// Loads every sprite, logging a warning for each one that is missing or broken.
    pub fn load(config: &GameConfig) -> Self {
        let mut set = SpriteSet::empty();
        for kind in SpriteKind::ALL {
            let path = config.sprite_path(kind.file_name());
            match Sprite::load(&path) {
                Ok(sprite) => {
                    info!("Loaded sprite {:?} ({}x{} cells)", kind, sprite.columns(), sprite.height_cells());
                    set.insert(kind, sprite);
                }
                Err(e) => warn!("Could not load sprite {:?}: {}", kind, e),
            }
        }
        set
    }

    pub fn insert(&mut self, kind: SpriteKind, sprite: Sprite) {
        self.sprites.insert(kind, sprite);
    }

    pub fn get(&self, kind: SpriteKind) -> Option<&Sprite> {
        self.sprites.get(&kind)
    }

    pub fn extent(&self, kind: SpriteKind, config: &GameConfig) -> (f64, f64) {
        let cell = config.cell_size();
        match self.get(kind) {
            Some(sprite) => sprite.extent(cell),
            None => {
                let (columns, rows) = kind.default_cells();
                (columns as f64 * cell.0, rows as f64 * cell.1)
            }
        }
    }

    pub fn extents(&self, config: &GameConfig) -> SpriteExtents {
        SpriteExtents {
            player: self.extent(SpriteKind::Player, config),
            missile: self.extent(SpriteKind::Missile, config),
            monster: self.extent(SpriteKind::Monster, config),
            life: self.extent(SpriteKind::Life, config),
        }
    }
}

/// Multi-row glyph font used for large titles.
///
/// File format: `#` comment lines, a `height N` line, then for every glyph a
/// `:C` header line followed by exactly `N` rows of art.
#[derive(Clone, Debug, PartialEq)]
pub struct BannerFont {
    height: usize,
    glyphs: HashMap<char, Vec<String>>,
}

impl BannerFont {
    pub fn parse(text: &str, path: &Path) -> Result<BannerFont, AssetError> {
        let malformed = |reason: String| AssetError::Malformed { path: path.to_path_buf(), reason };

        let mut lines = text.lines().map(|line| line.trim_end_matches('\r'));
        let mut height = None;
        let mut glyphs = HashMap::new();

        while let Some(line) = lines.next() {
            if line.trim().is_empty() || line.starts_with('#') {
                continue;
            }
            if let Some(value) = line.strip_prefix("height ") {
                if height.is_some() || !glyphs.is_empty() {
                    return Err(malformed("height must appear once, before any glyph".to_string()));
                }
                let parsed = value
                    .trim()
                    .parse::<usize>()
                    .ok()
                    .filter(|h| *h > 0)
                    .ok_or_else(|| malformed(format!("bad height {:?}", value)))?;
                height = Some(parsed);
                continue;
            }
            let Some(header) = line.strip_prefix(':') else {
                return Err(malformed(format!("unexpected line {:?}", line)));
            };
            let mut chars = header.chars();
            let (Some(glyph), None) = (chars.next(), chars.next()) else {
                return Err(malformed(format!("glyph header {:?} must name one character", line)));
            };
            let Some(height) = height else {
                return Err(malformed("glyph defined before height".to_string()));
            };

            let mut rows: Vec<String> = Vec::with_capacity(height);
            for _ in 0..height {
                match lines.next() {
                    Some(row) => rows.push(row.to_string()),
                    None => return Err(malformed(format!("glyph {:?} is cut short", glyph))),
                }
            }
            let width = rows.iter().map(|row| row.chars().count()).max().unwrap_or(0);
            for row in rows.iter_mut() {
                let pad = width - row.chars().count();
                row.extend(std::iter::repeat(' ').take(pad));
            }
            glyphs.insert(glyph, rows);
        }

        let height = height.ok_or_else(|| malformed("missing height line".to_string()))?;
        if glyphs.is_empty() {
            return Err(malformed("font defines no glyphs".to_string()));
        }
        Ok(BannerFont { height, glyphs })
    }

    pub fn load(path: &Path) -> Result<BannerFont, AssetError> {
        let text = read_text(path)?;
        BannerFont::parse(&text, path)
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Renders `text` upper-cased, or `None` if any character has no glyph.
    pub fn render(&self, text: &str) -> Option<Vec<String>> {
        let glyphs: Option<Vec<&Vec<String>>> = text
            .chars()
            .map(|c| self.glyphs.get(&c.to_ascii_uppercase()))
            .collect();
        let glyphs = glyphs?;
        (0..self.height)
            .map(|row| {
                glyphs
                    .iter()
                    .map(|glyph| glyph.get(row).map(String::as_str))
                    .collect::<Option<Vec<_>>>()
                    .map(|parts| parts.join(" "))
            })
            .collect()
    }
}

/// Images and font loaded once at startup.
#[derive(Clone, Debug, Default)]
pub struct Assets {
    pub sprites: SpriteSet,
    pub font: Option<BannerFont>,
}

impl Assets {
    pub fn load(config: &GameConfig) -> Self {
        let sprites = SpriteSet::load(config);
        let font_path = config.font_path();
        let font = match BannerFont::load(&font_path) {
            Ok(font) => Some(font),
            Err(e) => {
                warn!("Could not load font, falling back to plain text: {}", e);
                None
            }
        };
        Assets { sprites, font }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FONT: &str = "# test font\nheight 2\n:H\n|_|\n| |\n:I\n|\n|\n: \n \n \n";

    #[test]
    fn sprite_parse_trims_and_pads() {
        let sprite = Sprite::parse("\n /^\\\n<|#|>\n\n").unwrap();
        assert_eq!(sprite.columns(), 5);
        assert_eq!(sprite.height_cells(), 2);
        assert_eq!(sprite.rows()[0], vec![' ', '/', '^', '\\', ' ']);
        assert_eq!(sprite.extent((10.0, 25.0)), (50.0, 50.0));
    }

    #[test]
    fn blank_sprite_is_rejected() {
        assert!(Sprite::parse("   \n\n").is_none());
    }

    #[test]
    fn missing_sprite_file_is_io_error() {
        let err = Sprite::load(Path::new("/definitely/not/here/plane.txt")).unwrap_err();
        assert!(matches!(err, AssetError::Io { .. }));
        assert!(err.source().is_some());
        assert!(err.to_string().contains("plane.txt"));
    }

    #[test]
    fn empty_set_uses_default_extents() {
        let config = GameConfig::default();
        let extents = SpriteSet::empty().extents(&config);
        assert_eq!(extents.player, (50.0, 50.0));
        assert_eq!(extents.missile, (10.0, 25.0));
        assert_eq!(extents.monster, (70.0, 50.0));
        assert_eq!(extents.life, (20.0, 25.0));
    }

    #[test]
    fn loaded_sprite_overrides_default_extent() {
        let config = GameConfig::default();
        let mut set = SpriteSet::empty();
        set.insert(SpriteKind::Missile, Sprite::parse("||\n||\n||").unwrap());
        assert_eq!(set.extent(SpriteKind::Missile, &config), (20.0, 75.0));
        assert!(set.get(SpriteKind::Player).is_none());
    }

    #[test]
    fn font_renders_known_text() {
        let font = BannerFont::parse(FONT, Path::new("test.txt")).unwrap();
        assert_eq!(font.height(), 2);
        let rows = font.render("hi").unwrap();
        assert_eq!(rows, vec!["|_| |".to_string(), "| | |".to_string()]);
    }

    #[test]
    fn font_rejects_height_redefined_after_glyphs() {
        let err = BannerFont::parse("height 1\n:A\nx\nheight 2\n:B\ny\nz\n", Path::new("f.txt")).unwrap_err();
        assert!(matches!(err, AssetError::Malformed { .. }));
        assert!(BannerFont::parse("height 1\nheight 1\n:A\nx\n", Path::new("f.txt")).is_err());
    }

    #[test]
    fn font_render_skips_glyph_with_missing_rows() {
        let font = BannerFont { height: 2, glyphs: HashMap::from([('A', vec!["x".to_string()])]) };
        assert!(font.render("A").is_none());
    }

    #[test]
    fn font_render_fails_on_unknown_glyph() {
        let font = BannerFont::parse(FONT, Path::new("test.txt")).unwrap();
        assert!(font.render("HX").is_none());
    }

    #[test]
    fn font_without_height_is_malformed() {
        let err = BannerFont::parse(":A\n#\n", Path::new("bad.txt")).unwrap_err();
        assert!(matches!(err, AssetError::Malformed { .. }));
    }

    #[test]
    fn truncated_glyph_is_malformed() {
        let err = BannerFont::parse("height 3\n:A\n_\n", Path::new("bad.txt")).unwrap_err();
        assert!(err.to_string().contains("cut short"));
    }
}
