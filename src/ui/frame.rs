use ratatui::buffer::{Buffer, Cell};
use ratatui::layout::Rect;

/// One fully laid-out screen: a grid of styled cells plus cursor visibility.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    buffer: Buffer,
    cursor_visible: bool,
}

impl Frame {
    pub fn new(buffer: Buffer) -> Self {
        Self {
            buffer,
            cursor_visible: false,
        }
    }

    pub fn area(&self) -> Rect {
        self.buffer.area
    }

    pub fn cursor_visible(&self) -> bool {
        self.cursor_visible
    }

    /// Cells to write so the terminal goes from `previous` to this frame.
    ///
    /// Without a previous frame of the same size the terminal is assumed to be
    /// freshly cleared, so the diff is taken against a blank buffer.
    pub fn diff<'a>(&'a self, previous: Option<&Frame>) -> Vec<(u16, u16, &'a Cell)> {
        match previous {
            Some(previous) if previous.area() == self.area() => previous.buffer.diff(&self.buffer),
            _ => Buffer::empty(self.area()).diff(&self.buffer),
        }
    }

    /// Text of one row, for tests and debugging.
    #[cfg(test)]
    pub fn row(&self, y: u16) -> String {
        let area = self.area();
        (area.left()..area.right())
            .filter_map(|x| self.buffer.cell((x, y)))
            .map(|cell| cell.symbol())
            .collect()
    }

    #[cfg(test)]
    pub fn text(&self) -> String {
        let area = self.area();
        (area.top()..area.bottom())
            .map(|y| self.row(y))
            .collect::<Vec<_>>()
            .join("\n")
    }
}
