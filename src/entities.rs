use crate::assets::{SpriteKind, SpriteSet};
use crate::constants::*;
use crate::rendering::Canvas;
use crate::types::{Rect, Vector2D, clamp_coordinate};

/// Horizontal intent for one frame, taken from the held-key state.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Steering {
    pub left: bool,
    pub right: bool,
}

// --- Player ---
#[derive(Clone, Debug, PartialEq)]
pub struct Player {
    pub position: Vector2D,
    pub speed: f64,
    pub width: f64,
    pub height: f64,
}

impl Player {
    pub fn new(screen_width: f64, screen_height: f64, extent: (f64, f64)) -> Self {
        let (width, height) = extent;
        Player {
            position: Vector2D::new((screen_width / 2.0 - width / 2.0).floor(), screen_height - PLAYER_BOTTOM_OFFSET),
            speed: PLAYER_SPEED,
            width,
            height,
        }
    }

    /// Right is applied before left, each clamped to the screen.
    pub fn steer(&mut self, steering: Steering, screen_width: f64) {
        let max_x = (screen_width - self.width).max(0.0);
        if steering.right {
            self.position.x = clamp_coordinate(self.position.x + self.speed, 0.0, max_x);
        }
        if steering.left {
            self.position.x = clamp_coordinate(self.position.x - self.speed, 0.0, max_x);
        }
    }

    pub fn bounding_box(&self) -> Rect {
        Rect::at(self.position, self.width, self.height)
    }

    pub fn draw(&self, canvas: &mut Canvas, sprites: &SpriteSet) {
        canvas.draw_entity(SpriteKind::Player, sprites.get(SpriteKind::Player), self.bounding_box());
    }
}

// --- Monster ---
#[derive(Clone, Debug, PartialEq)]
pub struct Monster {
    pub position: Vector2D,
    pub speed: f64,
    pub width: f64,
    pub height: f64,
}

impl Monster {
    pub fn new(screen_width: f64, extent: (f64, f64)) -> Self {
        let (width, height) = extent;
        Monster {
            position: Vector2D::new((screen_width / 2.0 - width / 2.0).floor(), 0.0),
            speed: MONSTER_SPEED,
            width,
            height,
        }
    }

    /// Steps toward `target_x` without overshooting it.
    pub fn chase(&mut self, target_x: f64) {
        if target_x > self.position.x {
            self.position.x = (self.position.x + self.speed).min(target_x);
        } else {
            self.position.x = (self.position.x - self.speed).max(target_x);
        }
    }

    pub fn bounding_box(&self) -> Rect {
        Rect::at(self.position, self.width, self.height)
    }

    pub fn draw(&self, canvas: &mut Canvas, sprites: &SpriteSet) {
        canvas.draw_entity(SpriteKind::Monster, sprites.get(SpriteKind::Monster), self.bounding_box());
    }
}

// --- Missiles ---
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MissileKind {
    /// Dropped at a random column.
    Standard,
    /// Fired from the monster's column.
    Heavy,
}

impl MissileKind {
    pub fn sprite(self) -> SpriteKind {
        match self {
            MissileKind::Standard => SpriteKind::Missile,
            MissileKind::Heavy => SpriteKind::HeavyMissile,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Missile {
    pub kind: MissileKind,
    pub position: Vector2D,
    pub velocity: Vector2D,
    pub width: f64,
    pub height: f64,
}

impl Missile {
    /// Spawns with its bottom edge on the top of the screen.
    pub fn new(kind: MissileKind, x: f64, speed: f64, extent: (f64, f64)) -> Self {
        let (width, height) = extent;
        Missile {
            kind,
            position: Vector2D::new(x, -height),
            velocity: Vector2D::new(0.0, speed),
            width,
            height,
        }
    }

    pub fn speed(&self) -> f64 {
        self.velocity.y
    }

    /// Moves one frame and reports whether the missile has left the bottom of the screen.
    pub fn advance(&mut self, screen_height: f64) -> bool {
        self.position = self.position.add(self.velocity);
        self.position.y >= screen_height
    }

    pub fn bounding_box(&self) -> Rect {
        Rect::at(self.position, self.width, self.height)
    }

    pub fn draw(&self, canvas: &mut Canvas, sprites: &SpriteSet) {
        let kind = self.kind.sprite();
        canvas.draw_entity(kind, sprites.get(kind), self.bounding_box());
    }
}

// --- Life indicators ---
/// One icon per remaining life. Derived from the life counter every frame.
#[derive(Clone, Debug, PartialEq)]
pub struct LifeIndicator {
    pub position: Vector2D,
}

impl LifeIndicator {
    pub fn row(lives: u32) -> Vec<LifeIndicator> {
        (0..lives)
            .map(|i| LifeIndicator { position: Vector2D::new(LIFE_ICON_SPACING * i as f64, LIFE_ICON_Y) })
            .collect()
    }

    pub fn draw(&self, canvas: &mut Canvas, sprites: &SpriteSet, extent: (f64, f64)) {
        let area = Rect::at(self.position, extent.0, extent.1);
        canvas.draw_entity(SpriteKind::Life, sprites.get(SpriteKind::Life), area);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn player_starts_centered_above_bottom() {
        let player = Player::new(800.0, 600.0, (50.0, 50.0));
        assert_eq!(player.position, Vector2D::new(375.0, 500.0));
    }

    #[test]
    fn holding_both_directions_cancels_out() {
        let mut player = Player::new(800.0, 600.0, (50.0, 50.0));
        player.steer(Steering { left: true, right: true }, 800.0);
        assert_eq!(player.position.x, 375.0);
    }

    #[test]
    fn player_is_clamped_to_screen() {
        let mut player = Player::new(800.0, 600.0, (50.0, 50.0));
        for _ in 0..500 {
            player.steer(Steering { left: false, right: true }, 800.0);
            assert!(player.position.x <= 750.0);
        }
        assert_eq!(player.position.x, 750.0);
        for _ in 0..500 {
            player.steer(Steering { left: true, right: false }, 800.0);
            assert!(player.position.x >= 0.0);
        }
        assert_eq!(player.position.x, 0.0);
    }

    #[test]
    fn monster_never_overshoots() {
        let mut monster = Monster::new(800.0, (70.0, 50.0));
        assert_eq!(monster.position.x, 365.0);
        monster.chase(367.0);
        assert_eq!(monster.position.x, 367.0);
        monster.chase(360.0);
        assert_eq!(monster.position.x, 362.0);
        monster.chase(360.0);
        assert_eq!(monster.position.x, 360.0);
        monster.chase(360.0);
        assert_eq!(monster.position.x, 360.0);
    }

    #[test]
    fn missile_reports_leaving_the_screen() {
        let mut missile = Missile::new(MissileKind::Standard, 100.0, 5.0, (10.0, 25.0));
        assert_eq!(missile.position.y, -25.0);
        let mut frames = 0;
        while !missile.advance(600.0) {
            frames += 1;
        }
        assert_eq!(missile.position.y, 600.0);
        assert_eq!(frames, 124);
    }

    #[test]
    fn heavy_missile_differs_only_in_sprite() {
        let standard = Missile::new(MissileKind::Standard, 40.0, 6.5, (10.0, 25.0));
        let heavy = Missile::new(MissileKind::Heavy, 40.0, 6.5, (10.0, 25.0));
        assert_eq!(standard.bounding_box(), heavy.bounding_box());
        assert_eq!(standard.speed(), heavy.speed());
        assert_eq!(heavy.kind.sprite(), SpriteKind::HeavyMissile);
    }

    #[test]
    fn life_row_is_laid_out_left_to_right() {
        let row = LifeIndicator::row(3);
        let xs: Vec<f64> = row.iter().map(|l| l.position.x).collect();
        assert_eq!(xs, vec![0.0, 30.0, 60.0]);
        assert!(LifeIndicator::row(0).is_empty());
    }
}
