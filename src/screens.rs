use std::io;

use crossterm::event::KeyCode;
use crossterm::style::Color;
use log::info;
use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::assets::Assets;
use crate::audio::{AudioSystem, SoundBank};
use crate::config::GameConfig;
use crate::entities::Steering;
use crate::game::{GameEvent, Session};
use crate::rendering::{Canvas, FrameClock, OutputTarget, TextSize};
use crate::terminal_io::{FrameEvents, InputSource, InputState, Pointer};
use crate::types::{Rect, Vector2D};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Screen {
    MainMenu,
    Playing,
    Paused,
    GameOver { score: u32 },
    Quit,
}

/// Rectangular widget that turns white under the pointer and fires its
/// action on a left click while hovered.
#[derive(Clone, Debug, PartialEq)]
pub struct Button<A> {
    pub area: Rect,
    pub label: &'static str,
    pub color: Color,
    pub action: A,
    hovered: bool,
}

impl<A: Copy> Button<A> {
    pub fn new(area: Rect, label: &'static str, color: Color, action: A) -> Self {
        Button { area, label, color, action, hovered: false }
    }

    pub fn is_hovered(&self) -> bool {
        self.hovered
    }

    pub fn update(&mut self, pointer: Pointer, canvas: &Canvas) -> Option<A> {
        self.hovered = pointer
            .position
            .map(|(column, row)| self.area.contains(canvas.to_logical(column, row)))
            .unwrap_or(false);
        (self.hovered && pointer.clicked).then_some(self.action)
    }

    pub fn draw(&self, canvas: &mut Canvas) {
        let fill = if self.hovered { Color::White } else { self.color };
        canvas.fill_rect(self.area, fill);
        canvas.draw_text(self.label, TextSize::Small, Color::Black, self.area.center(), None);
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum MenuAction {
    Start,
    Quit,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum PauseAction {
    Continue,
    MainMenu,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum GameOverAction {
    Restart,
    MainMenu,
}

/// Top-level driver: owns the platform pieces and runs one screen at a time.
pub struct App {
    config: GameConfig,
    assets: Assets,
    sounds: SoundBank,
    audio: AudioSystem,
    input: InputState,
    output: OutputTarget,
    canvas: Canvas,
    clock: FrameClock,
    rng: StdRng,
    session: Option<Session>,
    /// Steering of the frame interrupted by a pause, finished on resume.
    paused_steering: Option<Steering>,
    frame: u64,
    max_frames: Option<u64>,
}

impl App {
    pub fn new(
        config: GameConfig,
        assets: Assets,
        sounds: SoundBank,
        audio: AudioSystem,
        input: Box<dyn InputSource>,
        output: OutputTarget,
        terminal_size: (u16, u16),
    ) -> Self {
        let canvas = Canvas::new(terminal_size.0, terminal_size.1, config.screen_width, config.screen_height);
        let clock = FrameClock::new(config.frame_duration());
        App {
            config,
            assets,
            sounds,
            audio,
            input: InputState::new(input),
            output,
            canvas,
            clock,
            rng: StdRng::from_entropy(),
            session: None,
            paused_steering: None,
            frame: 0,
            max_frames: None,
        }
    }

    /// Stops with `Screen::Quit` once this many frames have been polled.
    pub fn with_max_frames(mut self, max_frames: u64) -> Self {
        self.max_frames = Some(max_frames);
        self
    }

    pub fn with_clock(mut self, clock: FrameClock) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn session_mut(&mut self) -> Option<&mut Session> {
        self.session.as_mut()
    }

    pub fn output(&self) -> &OutputTarget {
        &self.output
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn run(&mut self) -> io::Result<()> {
        let mut screen = Screen::MainMenu;
        info!("Entering {:?}", screen);
        while screen != Screen::Quit {
            let next = self.run_screen(screen)?;
            info!("Screen transition: {:?} -> {:?}", screen, next);
            screen = next;
        }
        Ok(())
    }

    pub fn run_screen(&mut self, screen: Screen) -> io::Result<Screen> {
        match screen {
            Screen::MainMenu => self.main_menu(),
            Screen::Playing => self.play(),
            Screen::Paused => self.pause_screen(),
            Screen::GameOver { score } => self.game_over_screen(score),
            Screen::Quit => Ok(Screen::Quit),
        }
    }

    /// Polls input for the next frame. `None` means the app should close.
    fn next_frame(&mut self) -> io::Result<Option<FrameEvents>> {
        if self.max_frames.is_some_and(|max| self.frame >= max) {
            info!("Frame limit reached after {} frames", self.frame);
            return Ok(None);
        }
        let events = self.input.poll(self.frame)?;
        self.frame += 1;
        if let Some((columns, rows)) = events.resized {
            info!("Terminal resized to {}x{}", columns, rows);
            self.canvas.resize(columns, rows);
        }
        if events.close_requested {
            return Ok(None);
        }
        Ok(Some(events))
    }

    fn present(&mut self) -> io::Result<()> {
        self.output.present(&self.canvas)?;
        self.clock.wait();
        Ok(())
    }

    fn start_session(&mut self) {
        let extents = self.assets.sprites.extents(&self.config);
        self.session = Some(Session::new(&self.config, extents));
        self.paused_steering = None;
        self.input.release_all();
        self.audio.start_music(self.sounds.music.as_ref());
        info!("New session started");
    }

    fn main_menu(&mut self) -> io::Result<Screen> {
        self.session = None;
        let center_x = self.config.screen_width / 2.0;
        let mut buttons = [
            Button::new(Rect::new(center_x - 175.0, 125.0, 350.0, 50.0), "Start(Space)", Color::Green, MenuAction::Start),
            Button::new(Rect::new(center_x - 175.0, 450.0, 350.0, 50.0), "Quit(Q)", Color::Red, MenuAction::Quit),
        ];

        loop {
            let Some(events) = self.next_frame()? else {
                return Ok(Screen::Quit);
            };

            let pointer = self.input.pointer();
            let mut action = None;
            for button in buttons.iter_mut() {
                action = action.or(button.update(pointer, &self.canvas));
            }
            if events.was_pressed(KeyCode::Char(' ')) {
                action = Some(MenuAction::Start);
            } else if events.was_pressed(KeyCode::Char('q')) {
                action = action.or(Some(MenuAction::Quit));
            }

            match action {
                Some(MenuAction::Start) => {
                    self.start_session();
                    return Ok(Screen::Playing);
                }
                Some(MenuAction::Quit) => return Ok(Screen::Quit),
                None => {}
            }

            let font = self.assets.font.as_ref();
            self.canvas.fill(Color::Black);
            for button in &buttons {
                button.draw(&mut self.canvas);
            }
            let center = Vector2D::new(center_x, self.config.screen_height / 2.0);
            self.canvas.draw_text(&self.config.title, TextSize::Large, Color::White, center, font);
            self.canvas.draw_text(
                "Use A/D or LEFT/RIGHT keys to move",
                TextSize::Small,
                Color::Yellow,
                Vector2D::new(center_x, 400.0),
                font,
            );
            self.present()?;
        }
    }

    fn play(&mut self) -> io::Result<Screen> {
        if self.session.is_none() {
            self.start_session();
        }

        if let Some(steering) = self.paused_steering.take() {
            if let Some(next) = self.advance(steering)? {
                return Ok(next);
            }
        }

        loop {
            let Some(events) = self.next_frame()? else {
                return Ok(Screen::Quit);
            };
            let steering = self.input.steering(self.frame - 1);
            if events.was_pressed(KeyCode::Char('p')) {
                self.paused_steering = Some(steering);
                return Ok(Screen::Paused);
            }
            if let Some(next) = self.advance(steering)? {
                return Ok(next);
            }
        }
    }

    /// Steps, draws and presents one game frame. Returns the next screen when
    /// the frame ends play.
    fn advance(&mut self, steering: Steering) -> io::Result<Option<Screen>> {
        let Some(session) = self.session.as_mut() else {
            return Ok(Some(Screen::MainMenu));
        };
        let outcome = session.step(steering, &mut self.rng);

        for event in outcome {
            match event {
                GameEvent::PlayerHit { .. } => {
                    self.audio.play(self.sounds.collision.as_ref());
                }
                GameEvent::GameOver { score } => {
                    self.session = None;
                    return Ok(Some(Screen::GameOver { score }));
                }
                _ => {}
            }
        }

        if let Some(session) = self.session.as_ref() {
            session.draw(&mut self.canvas, &self.assets.sprites, self.assets.font.as_ref(), &mut self.rng);
        }
        self.present()?;
        Ok(None)
    }

    fn pause_screen(&mut self) -> io::Result<Screen> {
        let center_x = self.config.screen_width / 2.0;
        let panel = Rect::new(200.0, 200.0, 400.0, 200.0);
        let mut buttons = [
            Button::new(Rect::new(center_x - 150.0, 300.0, 300.0, 30.0), "Continue(P)", Color::Green, PauseAction::Continue),
            Button::new(Rect::new(center_x - 150.0, 350.0, 300.0, 30.0), "Main Menu(M)", Color::Yellow, PauseAction::MainMenu),
        ];

        loop {
            let Some(events) = self.next_frame()? else {
                return Ok(Screen::Quit);
            };

            let pointer = self.input.pointer();
            let mut action = None;
            for button in buttons.iter_mut() {
                action = action.or(button.update(pointer, &self.canvas));
            }
            if events.was_pressed(KeyCode::Char('p')) {
                action = Some(PauseAction::Continue);
            } else if events.was_pressed(KeyCode::Char('m')) {
                action = Some(PauseAction::MainMenu);
            }

            match action {
                Some(PauseAction::Continue) => {
                    self.input.release_all();
                    return Ok(Screen::Playing);
                }
                Some(PauseAction::MainMenu) => {
                    info!("Session abandoned from pause");
                    self.session = None;
                    self.paused_steering = None;
                    return Ok(Screen::MainMenu);
                }
                None => {}
            }

            // The panel overlays whatever the last game frame left on the canvas.
            self.canvas.fill_rect(panel, Color::Black);
            self.canvas.outline_rect(panel, Color::White);
            self.canvas.draw_text(
                "PAUSED",
                TextSize::Medium,
                Color::White,
                Vector2D::new(center_x, 250.0),
                self.assets.font.as_ref(),
            );
            for button in &buttons {
                button.draw(&mut self.canvas);
            }
            self.present()?;
        }
    }

    fn game_over_screen(&mut self, score: u32) -> io::Result<Screen> {
        self.session = None;
        let center_x = self.config.screen_width / 2.0;
        let mut buttons = [
            Button::new(Rect::new(center_x - 175.0, 275.0, 350.0, 50.0), "Restart(R)", Color::Green, GameOverAction::Restart),
            Button::new(Rect::new(center_x - 175.0, 375.0, 350.0, 50.0), "Main Menu(M)", Color::Yellow, GameOverAction::MainMenu),
        ];

        loop {
            let Some(events) = self.next_frame()? else {
                return Ok(Screen::Quit);
            };

            let pointer = self.input.pointer();
            let mut action = None;
            for button in buttons.iter_mut() {
                action = action.or(button.update(pointer, &self.canvas));
            }
            if events.was_pressed(KeyCode::Char('r')) {
                action = Some(GameOverAction::Restart);
            } else if events.was_pressed(KeyCode::Char('m')) {
                action = Some(GameOverAction::MainMenu);
            }

            match action {
                Some(GameOverAction::Restart) => {
                    self.start_session();
                    return Ok(Screen::Playing);
                }
                Some(GameOverAction::MainMenu) => return Ok(Screen::MainMenu),
                None => {}
            }

            let font = self.assets.font.as_ref();
            self.canvas.fill(Color::Black);
            self.canvas.draw_text("GAME OVER", TextSize::Large, Color::Red, Vector2D::new(center_x, 100.0), font);
            self.canvas.draw_text(
                &format!("Score: {}", score),
                TextSize::Medium,
                Color::White,
                Vector2D::new(center_x, 200.0),
                font,
            );
            for button in &buttons {
                button.draw(&mut self.canvas);
            }
            self.present()?;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::terminal_io::SimulatedInput;

    fn canvas() -> Canvas {
        Canvas::new(80, 24, 800.0, 600.0)
    }

    #[test]
    fn button_hovers_and_fires_on_click() {
        let c = canvas();
        let mut button = Button::new(Rect::new(225.0, 125.0, 350.0, 50.0), "Start", Color::Green, 7u8);

        assert_eq!(button.update(Pointer { position: Some((30, 5)), clicked: false }, &c), None);
        assert!(button.is_hovered());

        assert_eq!(button.update(Pointer { position: Some((30, 5)), clicked: true }, &c), Some(7));
        assert_eq!(button.update(Pointer { position: Some((10, 5)), clicked: true }, &c), None);
        assert!(!button.is_hovered());
    }

    #[test]
    fn hovered_button_is_drawn_white() {
        let mut c = canvas();
        let mut button = Button::new(Rect::new(225.0, 125.0, 350.0, 50.0), "Quit(Q)", Color::Red, ());
        button.draw(&mut c);
        assert_eq!(c.cell(23, 5).map(|cell| cell.bg), Some(Color::Red));
        button.update(Pointer { position: Some((23, 5)), clicked: false }, &c);
        button.draw(&mut c);
        assert_eq!(c.cell(23, 5).map(|cell| cell.bg), Some(Color::White));
        assert!(c.row_text(6).contains("Quit(Q)"));
    }

    #[test]
    fn headless_app_runs_until_frame_limit() {
        let input = SimulatedInput::new();
        let mut app = App::new(
            GameConfig::default(),
            Assets::default(),
            SoundBank::default(),
            AudioSystem::disabled(),
            Box::new(input),
            OutputTarget::ScreenBuffer(crate::rendering::ScreenBuffer::new(80, 24)),
            (80, 24),
        )
        .with_clock(FrameClock::unpaced())
        .with_max_frames(3);
        app.run().unwrap();
        assert_eq!(app.frame(), 3);
        assert!(app.output().screen_buffer().unwrap().contains("Start(Space)"));
    }
}
