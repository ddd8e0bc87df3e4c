//! Line-based text overlay.
//!
//! Scenes write diagnostic lines (adapter name, frame rate) by index; a
//! text renderer keyed by a font atlas reads them back with `get_line`.
//! Glyph layout is not done here.

/// Line-addressed text sink.
pub trait Overlay: Send {
    /// Replace line `index`, growing the line list as needed.
    fn write(&mut self, index: usize, text: &str);
    fn get_line(&self, index: usize) -> Option<&str>;
    fn line_count(&self) -> usize;
}

/// In-memory overlay with change tracking.
#[derive(Debug, Default, Clone)]
pub struct Console {
    lines: Vec<String>,
    revision: u64,
}

impl Console {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bumped whenever any line's text actually changes.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().map(String::as_str)
    }
}

impl Overlay for Console {
    fn write(&mut self, index: usize, text: &str) {
        if index >= self.lines.len() {
            self.lines.resize_with(index + 1, String::new);
        }
        let line = &mut self.lines[index];
        if line != text {
            line.clear();
            line.push_str(text);
            self.revision += 1;
        }
    }

    fn get_line(&self, index: usize) -> Option<&str> {
        self.lines.get(index).map(String::as_str)
    }

    fn line_count(&self) -> usize {
        self.lines.len()
    }
}
