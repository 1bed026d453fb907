use std::io::{self, BufWriter, Write};
use std::thread;
use std::time::{Duration, Instant};

use crossterm::{
    cursor::MoveTo,
    queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
};

use crate::assets::{BannerFont, Sprite, SpriteKind};
use crate::types::{Rect, Vector2D};

// --- ScreenBuffer for headless rendering ---
pub struct ScreenBuffer {
    pub buffer: Vec<Vec<char>>,
    pub width: u16,
    pub height: u16,
}

impl ScreenBuffer {
    pub fn new(width: u16, height: u16) -> Self {
        ScreenBuffer { buffer: vec![vec![' '; width as usize]; height as usize], width, height }
    }

    pub fn row_text(&self, y: u16) -> String {
        self.buffer.get(y as usize).map(|row| row.iter().collect()).unwrap_or_default()
    }

    pub fn contains(&self, text: &str) -> bool {
        (0..self.height).any(|y| self.row_text(y).contains(text))
    }
}

// --- OutputTarget enum to handle stdout or ScreenBuffer ---
pub enum OutputTarget {
    Stdout(BufWriter<io::Stdout>),
    ScreenBuffer(ScreenBuffer),
}

impl OutputTarget {
    pub fn stdout() -> Self {
        OutputTarget::Stdout(BufWriter::new(io::stdout()))
    }

    pub fn present(&mut self, canvas: &Canvas) -> io::Result<()> {
        match self {
            OutputTarget::Stdout(out) => {
                let mut colors: Option<(Color, Color)> = None;
                for (y, row) in canvas.cells.iter().enumerate() {
                    queue!(out, MoveTo(0, y as u16))?;
                    for cell in row {
                        if colors != Some((cell.fg, cell.bg)) {
                            queue!(out, SetForegroundColor(cell.fg), SetBackgroundColor(cell.bg))?;
                            colors = Some((cell.fg, cell.bg));
                        }
                        queue!(out, Print(cell.ch))?;
                    }
                }
                queue!(out, ResetColor)?;
                out.flush()
            }
            OutputTarget::ScreenBuffer(sb) => {
                if sb.width != canvas.columns || sb.height != canvas.rows {
                    *sb = ScreenBuffer::new(canvas.columns, canvas.rows);
                }
                for (y, row) in canvas.cells.iter().enumerate() {
                    for (x, cell) in row.iter().enumerate() {
                        sb.buffer[y][x] = cell.ch;
                    }
                }
                Ok(())
            }
        }
    }

    pub fn screen_buffer(&self) -> Option<&ScreenBuffer> {
        match self {
            OutputTarget::ScreenBuffer(sb) => Some(sb),
            OutputTarget::Stdout(_) => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Cell {
    pub ch: char,
    pub fg: Color,
    pub bg: Color,
}

impl Cell {
    const BLANK: Cell = Cell { ch: ' ', fg: Color::White, bg: Color::Black };
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TextSize {
    /// Banner font when available.
    Large,
    /// Letter-spaced.
    Medium,
    Small,
}

// --- Canvas: logical 2D surface projected onto the terminal grid ---
pub struct Canvas {
    cells: Vec<Vec<Cell>>,
    columns: u16,
    rows: u16,
    logical_width: f64,
    logical_height: f64,
}

impl Canvas {
    pub fn new(columns: u16, rows: u16, logical_width: f64, logical_height: f64) -> Self {
        let columns = columns.max(1);
        let rows = rows.max(1);
        Canvas {
            cells: vec![vec![Cell::BLANK; columns as usize]; rows as usize],
            columns,
            rows,
            logical_width,
            logical_height,
        }
    }

    /// Follows a terminal resize. Contents are cleared.
    pub fn resize(&mut self, columns: u16, rows: u16) {
        *self = Canvas::new(columns, rows, self.logical_width, self.logical_height);
    }

    pub fn cell(&self, column: u16, row: u16) -> Option<&Cell> {
        self.cells.get(row as usize).and_then(|r| r.get(column as usize))
    }

    pub fn row_text(&self, row: u16) -> String {
        self.cells.get(row as usize).map(|r| r.iter().map(|c| c.ch).collect()).unwrap_or_default()
    }

    pub fn to_cell(&self, point: Vector2D) -> (i32, i32) {
        let column = (point.x * self.columns as f64 / self.logical_width).floor() as i32;
        let row = (point.y * self.rows as f64 / self.logical_height).floor() as i32;
        (column, row)
    }

    /// Logical point at the center of a cell.
    pub fn to_logical(&self, column: u16, row: u16) -> Vector2D {
        Vector2D::new(
            (column as f64 + 0.5) * self.logical_width / self.columns as f64,
            (row as f64 + 0.5) * self.logical_height / self.rows as f64,
        )
    }

    fn cell_span(&self, rect: Rect) -> (i32, i32, i32, i32) {
        let (x0, y0) = self.to_cell(Vector2D::new(rect.x, rect.y));
        let x1 = (rect.right() * self.columns as f64 / self.logical_width).ceil() as i32;
        let y1 = (rect.bottom() * self.rows as f64 / self.logical_height).ceil() as i32;
        (x0, y0, x1.max(x0 + 1), y1.max(y0 + 1))
    }

    fn cell_mut(&mut self, column: i32, row: i32) -> Option<&mut Cell> {
        if column < 0 || row < 0 {
            return None;
        }
        self.cells.get_mut(row as usize).and_then(|r| r.get_mut(column as usize))
    }

    pub fn fill(&mut self, bg: Color) {
        for row in self.cells.iter_mut() {
            for cell in row.iter_mut() {
                *cell = Cell { ch: ' ', fg: Color::White, bg };
            }
        }
    }

    /// Sets a character and its color, keeping the cell's background.
    pub fn plot(&mut self, column: i32, row: i32, ch: char, fg: Color) {
        if let Some(cell) = self.cell_mut(column, row) {
            cell.ch = ch;
            cell.fg = fg;
        }
    }

    pub fn plot_point(&mut self, point: Vector2D, ch: char, fg: Color) {
        let (column, row) = self.to_cell(point);
        self.plot(column, row, ch, fg);
    }

    pub fn fill_rect(&mut self, rect: Rect, bg: Color) {
        let (x0, y0, x1, y1) = self.cell_span(rect);
        for row in y0..y1 {
            for column in x0..x1 {
                if let Some(cell) = self.cell_mut(column, row) {
                    *cell = Cell { ch: ' ', fg: Color::White, bg };
                }
            }
        }
    }

    pub fn outline_rect(&mut self, rect: Rect, fg: Color) {
        let (x0, y0, x1, y1) = self.cell_span(rect);
        let (right, bottom) = (x1 - 1, y1 - 1);
        for column in x0..x1 {
            self.plot(column, y0, '-', fg);
            self.plot(column, bottom, '-', fg);
        }
        for row in y0..y1 {
            self.plot(x0, row, '|', fg);
            self.plot(right, row, '|', fg);
        }
        for (column, row) in [(x0, y0), (right, y0), (x0, bottom), (right, bottom)] {
            self.plot(column, row, '+', fg);
        }
    }

    pub fn draw_sprite(&mut self, sprite: &Sprite, top_left: Vector2D, fg: Color) {
        let (x0, y0) = self.to_cell(top_left);
        for (dy, row) in sprite.rows().iter().enumerate() {
            for (dx, &ch) in row.iter().enumerate() {
                if ch != ' ' {
                    self.plot(x0 + dx as i32, y0 + dy as i32, ch, fg);
                }
            }
        }
    }

    /// Draws a loaded sprite, or fills `area` with the kind's placeholder glyph.
    pub fn draw_entity(&mut self, kind: SpriteKind, sprite: Option<&Sprite>, area: Rect) {
        match sprite {
            Some(sprite) => self.draw_sprite(sprite, Vector2D::new(area.x, area.y), kind.color()),
            None => {
                let (x0, y0, x1, y1) = self.cell_span(area);
                for row in y0..y1 {
                    for column in x0..x1 {
                        self.plot(column, row, kind.placeholder(), kind.color());
                    }
                }
            }
        }
    }

    /// Draws text centered on a logical point.
    pub fn draw_text(&mut self, text: &str, size: TextSize, fg: Color, center: Vector2D, font: Option<&BannerFont>) {
        let lines: Vec<String> = match size {
            TextSize::Large => font
                .and_then(|f| f.render(text))
                .unwrap_or_else(|| vec![text.to_string()]),
            TextSize::Medium => vec![text.chars().map(|c| c.to_string()).collect::<Vec<_>>().join(" ")],
            TextSize::Small => vec![text.to_string()],
        };
        let (cx, cy) = self.to_cell(center);
        let top = cy - lines.len() as i32 / 2;
        for (i, line) in lines.iter().enumerate() {
            let left = cx - line.chars().count() as i32 / 2;
            for (dx, ch) in line.chars().enumerate() {
                self.plot(left + dx as i32, top + i as i32, ch, fg);
            }
        }
    }
}

/// Sleeps out the remainder of each frame to hold a fixed rate.
pub struct FrameClock {
    frame: Option<Duration>,
    last: Instant,
}

impl FrameClock {
    pub fn new(frame: Duration) -> Self {
        FrameClock { frame: Some(frame), last: Instant::now() }
    }

    pub fn unpaced() -> Self {
        FrameClock { frame: None, last: Instant::now() }
    }

    pub fn wait(&mut self) {
        if let Some(frame) = self.frame {
            let elapsed = self.last.elapsed();
            if elapsed < frame {
                thread::sleep(frame - elapsed);
            }
        }
        self.last = Instant::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn canvas() -> Canvas {
        Canvas::new(80, 24, 800.0, 600.0)
    }

    #[test]
    fn projection_maps_reference_grid() {
        let c = canvas();
        assert_eq!(c.to_cell(Vector2D::new(0.0, 0.0)), (0, 0));
        assert_eq!(c.to_cell(Vector2D::new(795.0, 599.0)), (79, 23));
        assert_eq!(c.to_cell(Vector2D::new(400.0, 300.0)), (40, 12));
        assert_eq!(c.to_logical(40, 12), Vector2D::new(405.0, 312.5));
    }

    #[test]
    fn text_is_centered() {
        let mut c = canvas();
        c.draw_text("Score: 7", TextSize::Small, Color::White, Vector2D::new(400.0, 300.0), None);
        assert_eq!(&c.row_text(12)[36..44], "Score: 7");
    }

    #[test]
    fn large_text_uses_banner_font() {
        let font = BannerFont::parse("height 2\n:O\n/\\\n\\/\n", Path::new("f.txt")).unwrap();
        let mut c = canvas();
        c.draw_text("oo", TextSize::Large, Color::White, Vector2D::new(400.0, 300.0), Some(&font));
        assert!(c.row_text(11).contains("/\\ /\\"));
        assert!(c.row_text(12).contains("\\/ \\/"));
    }

    #[test]
    fn placeholder_fills_entity_area() {
        let mut c = canvas();
        c.draw_entity(SpriteKind::Player, None, Rect::new(100.0, 50.0, 50.0, 50.0));
        assert_eq!(&c.row_text(2)[10..15], "AAAAA");
        assert_eq!(&c.row_text(3)[10..15], "AAAAA");
        assert_eq!(c.row_text(4).trim(), "");
    }

    #[test]
    fn sprite_spaces_are_transparent() {
        let mut c = canvas();
        c.plot(1, 0, 'x', Color::White);
        let sprite = Sprite::parse("a b").unwrap();
        c.draw_sprite(&sprite, Vector2D::new(0.0, 0.0), Color::Cyan);
        assert_eq!(&c.row_text(0)[0..3], "axb");
    }

    #[test]
    fn drawing_off_canvas_is_ignored() {
        let mut c = canvas();
        c.plot(-1, 0, 'x', Color::White);
        c.plot(0, 99, 'x', Color::White);
        c.plot_point(Vector2D::new(10.0, -25.0), 'x', Color::White);
        assert!((0..24).all(|r| !c.row_text(r).contains('x')));
    }

    #[test]
    fn screen_buffer_follows_canvas_size() {
        let mut out = OutputTarget::ScreenBuffer(ScreenBuffer::new(10, 5));
        let mut c = Canvas::new(20, 6, 800.0, 600.0);
        c.draw_text("hi", TextSize::Small, Color::White, Vector2D::new(400.0, 300.0), None);
        out.present(&c).unwrap();
        let sb = out.screen_buffer().unwrap();
        assert_eq!((sb.width, sb.height), (20, 6));
        assert!(sb.contains("hi"));
    }
}
