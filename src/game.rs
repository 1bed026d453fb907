use crossterm::style::Color;
use log::{debug, info};
use rand::Rng;

use crate::assets::{BannerFont, SpriteExtents, SpriteSet};
use crate::config::GameConfig;
use crate::constants::*;
use crate::entities::{LifeIndicator, Missile, MissileKind, Monster, Player, Steering};
use crate::rendering::{Canvas, TextSize};
use crate::types::Vector2D;

/// Things that happened during one `Session::step`, in order.
#[derive(Clone, Debug, PartialEq)]
pub enum GameEvent {
    MissileSpawned { kind: MissileKind, x: f64 },
    SpeedIncreased { speed: f64 },
    MissileDodged { score: u32 },
    PlayerHit { lives: u32 },
    GameOver { score: u32 },
}

/// State of one playthrough. Built fresh for every start or restart.
#[derive(Clone, Debug, PartialEq)]
pub struct Session {
    pub screen_width: f64,
    pub screen_height: f64,
    pub extents: SpriteExtents,
    pub player: Player,
    pub monster: Monster,
    pub missiles: Vec<Missile>,
    pub score: u32,
    pub lives: u32,
    pub spawn_timer: u32,
    pub spawn_interval: u32,
    pub missile_speed: f64,
    pub monster_timer: u64,
    /// Highest score multiple that already raised the missile speed.
    pub last_speed_up_score: u32,
    pub frame: u64,
    over: bool,
}

impl Session {
    pub fn new(config: &GameConfig, extents: SpriteExtents) -> Self {
        Session {
            screen_width: config.screen_width,
            screen_height: config.screen_height,
            extents,
            player: Player::new(config.screen_width, config.screen_height, extents.player),
            monster: Monster::new(config.screen_width, extents.monster),
            missiles: Vec::new(),
            score: 0,
            lives: STARTING_LIVES,
            spawn_timer: 0,
            spawn_interval: INITIAL_SPAWN_INTERVAL,
            missile_speed: INITIAL_MISSILE_SPEED,
            monster_timer: 0,
            last_speed_up_score: 0,
            frame: 0,
            over: false,
        }
    }

    pub fn is_over(&self) -> bool {
        self.over
    }

    pub fn monster_active(&self) -> bool {
        self.score > MONSTER_SCORE_THRESHOLD
    }

    pub fn life_indicators(&self) -> Vec<LifeIndicator> {
        LifeIndicator::row(self.lives)
    }

    /// Advances the simulation one frame: steer, spawn, move and collide,
    /// sweep, then monster behaviour. Does nothing once the game is over.
    pub fn step(&mut self, steering: Steering, rng: &mut impl Rng) -> Vec<GameEvent> {
        let mut events = Vec::new();
        if self.over {
            return events;
        }
        self.frame += 1;

        self.player.steer(steering, self.screen_width);

        self.spawn_timer += 1;
        if self.spawn_timer >= self.spawn_interval {
            self.spawn_standard_missile(rng, &mut events);
        }

        self.update_missiles(&mut events);
        if self.over {
            return events;
        }

        if self.monster_active() {
            self.monster_timer += 1;
            if self.monster_timer % MONSTER_MOVE_EVERY == 0 {
                self.monster.chase(self.player.position.x);
            }
            if self.monster_timer % HEAVY_MISSILE_EVERY == 0 {
                // Heavy missiles share the standard hitbox; only the sprite differs.
                let x = self.monster.position.x;
                self.missiles.push(Missile::new(MissileKind::Heavy, x, self.missile_speed, self.extents.missile));
                debug!("Heavy missile launched at x: {}", x);
                events.push(GameEvent::MissileSpawned { kind: MissileKind::Heavy, x });
            }
        }
        events
    }

    fn spawn_standard_missile(&mut self, rng: &mut impl Rng, events: &mut Vec<GameEvent>) {
        let max_x = (self.screen_width - self.extents.missile.0).max(0.0) as u32;
        let x = rng.gen_range(0..=max_x) as f64;
        self.missiles.push(Missile::new(MissileKind::Standard, x, self.missile_speed, self.extents.missile));
        self.spawn_timer = 0;
        debug!("Missile spawned at x: {}, speed: {}", x, self.missile_speed);
        events.push(GameEvent::MissileSpawned { kind: MissileKind::Standard, x });

        if self.spawn_interval > MIN_SPAWN_INTERVAL {
            self.spawn_interval -= 1;
        }
        if self.score > 0 && self.score % SPEED_UP_SCORE_STEP == 0 && self.score > self.last_speed_up_score {
            self.missile_speed += MISSILE_SPEED_INCREASE;
            self.last_speed_up_score = self.score;
            info!("Difficulty increased. Score: {}, missile speed: {}", self.score, self.missile_speed);
            events.push(GameEvent::SpeedIncreased { speed: self.missile_speed });
        }
    }

    fn update_missiles(&mut self, events: &mut Vec<GameEvent>) {
        let player_box = self.player.bounding_box();
        let mut missiles = std::mem::take(&mut self.missiles);

        missiles.retain_mut(|missile| {
            if self.over {
                return true;
            }
            let off_screen = missile.advance(self.screen_height);
            if off_screen {
                self.score += 1;
                events.push(GameEvent::MissileDodged { score: self.score });
            }

            let hit = missile.bounding_box().intersects(&player_box);
            if hit {
                self.lives = self.lives.saturating_sub(1);
                info!("Player hit. Lives: {}", self.lives);
                events.push(GameEvent::PlayerHit { lives: self.lives });
                if self.lives == 0 {
                    self.over = true;
                    info!("No lives left. Game over with score {}", self.score);
                    events.push(GameEvent::GameOver { score: self.score });
                }
            }
            !(off_screen || hit)
        });

        self.missiles = missiles;
    }

    pub fn draw(&self, canvas: &mut Canvas, sprites: &SpriteSet, font: Option<&BannerFont>, rng: &mut impl Rng) {
        canvas.fill(Color::Black);

        for _ in 0..STAR_COUNT {
            let star = Vector2D::new(rng.gen_range(0.0..=self.screen_width), rng.gen_range(0.0..=self.screen_height));
            canvas.plot_point(star, '.', Color::White);
        }

        for life in self.life_indicators() {
            life.draw(canvas, sprites, self.extents.life);
        }

        self.player.draw(canvas, sprites);
        if self.monster_active() {
            self.monster.draw(canvas, sprites);
        }
        for missile in &self.missiles {
            missile.draw(canvas, sprites);
        }

        canvas.draw_text(&format!("Score: {}", self.score), TextSize::Small, Color::White, Vector2D::new(90.0, 20.0), font);
        canvas.draw_text(
            "Press P to Pause",
            TextSize::Small,
            Color::White,
            Vector2D::new(self.screen_width - 150.0, 20.0),
            font,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn session() -> Session {
        let config = GameConfig::default();
        Session::new(&config, SpriteExtents::defaults(&config))
    }

    fn idle() -> Steering {
        Steering::default()
    }

    #[test]
    fn first_missile_spawns_on_frame_sixty() {
        let mut s = session();
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..59 {
            assert!(s.step(idle(), &mut rng).is_empty());
        }
        let events = s.step(idle(), &mut rng);
        assert_eq!(s.missiles.len(), 1);
        assert!(matches!(events[0], GameEvent::MissileSpawned { kind: MissileKind::Standard, .. }));
        assert_eq!(s.spawn_interval, 59);
        assert_eq!(s.spawn_timer, 0);
    }

    #[test]
    fn step_is_no_op_after_game_over() {
        let mut s = session();
        s.lives = 1;
        let player = s.player.bounding_box();
        s.missiles.push(Missile::new(MissileKind::Standard, player.x, 5.0, (10.0, 25.0)));
        s.missiles[0].position.y = player.y;
        let mut rng = StdRng::seed_from_u64(2);
        let events = s.step(idle(), &mut rng);
        assert!(events.contains(&GameEvent::GameOver { score: 0 }));
        let frame = s.frame;
        assert!(s.step(idle(), &mut rng).is_empty());
        assert_eq!(s.frame, frame);
        assert_eq!(s.lives, 0);
    }

    #[test]
    fn monster_wakes_after_threshold() {
        let mut s = session();
        let mut rng = StdRng::seed_from_u64(3);
        s.score = 10;
        s.player.position.x = 0.0;
        let start = s.monster.position.x;
        for _ in 0..8 {
            s.step(idle(), &mut rng);
        }
        assert_eq!(s.monster_timer, 0);
        assert_eq!(s.monster.position.x, start);

        s.score = 11;
        for _ in 0..4 {
            s.step(idle(), &mut rng);
        }
        assert_eq!(s.monster_timer, 4);
        assert_eq!(s.monster.position.x, start - MONSTER_SPEED);
    }
}
