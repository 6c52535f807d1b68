use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    symbols::Marker,
    text::Span,
    widgets::{
        canvas::{Canvas, Rectangle},
        Block, Borders, Widget,
    },
};

use plank::detector::FaceRegion;

/// Face boxes from the latest frame, drawn in normalized frame space
pub struct CameraPanel<'a> {
    faces: &'a [FaceRegion],
    face_present: bool,
}

impl<'a> CameraPanel<'a> {
    pub fn new(faces: &'a [FaceRegion], face_present: bool) -> Self {
        Self { faces, face_present }
    }

    fn title(&self) -> Span<'static> {
        if self.face_present {
            Span::styled(" лицо в кадре ", Style::default().fg(Color::Green))
        } else {
            Span::styled(" лицо не найдено ", Style::default().fg(Color::Red))
        }
    }
}

impl Widget for CameraPanel<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::default().borders(Borders::ALL).title(self.title());
        let faces = self.faces;

        Canvas::default()
            .block(block)
            .marker(Marker::Braille)
            .x_bounds([0.0, 1.0])
            .y_bounds([0.0, 1.0])
            .paint(move |ctx| {
                for face in faces {
                    ctx.draw(&Rectangle {
                        x: face.x,
                        y: face.y,
                        width: face.width,
                        height: face.height,
                        color: Color::Green,
                    });
                }
            })
            .render(area, buf);
    }
}
