use egui::{Response, Slider, TextEdit, Ui, Widget};
use tuba_core::{from_position, parse_position, to_position, SLIDER_STEPS};

const LABEL_WIDTH: f32 = 110.0;
const TEXT_WIDTH: f32 = 48.0;

/// Horizontal fader: label, 0..=1000 slider and a position text field
///
/// `text` is the field buffer and must outlive the frame; it is resynced from
/// the value whenever the field is not being edited.
pub struct ChannelFader<'a> {
    label: &'a str,
    value: &'a mut f32,
    text: &'a mut String,
}

impl<'a> ChannelFader<'a> {
    pub fn new(label: &'a str, value: &'a mut f32, text: &'a mut String) -> Self {
        Self { label, value, text }
    }
}

impl<'a> Widget for ChannelFader<'a> {
    fn ui(self, ui: &mut Ui) -> Response {
        ui.horizontal(|ui| {
            ui.add_sized([LABEL_WIDTH, 20.0], egui::Label::new(self.label));

            let mut position = to_position(*self.value);
            let mut response = ui.add(Slider::new(&mut position, 0..=SLIDER_STEPS).show_value(false));
            if response.changed() {
                *self.value = from_position(position);
            }

            let field = ui.add(TextEdit::singleline(&mut *self.text).desired_width(TEXT_WIDTH));
            if field.lost_focus() {
                let (committed, shown) = commit_text(self.text, *self.value);
                if let Some(value) = committed {
                    *self.value = value;
                    response.mark_changed();
                }
                *self.text = shown;
            } else if !field.has_focus() {
                *self.text = to_position(*self.value).to_string();
            }

            response
        })
        .inner
    }
}

/// Resolve typed text against the current value
///
/// Returns the new value if the text names a different position, and the
/// text the field should show afterwards. Invalid text reverts to the
/// current position.
pub fn commit_text(text: &str, current: f32) -> (Option<f32>, String) {
    match parse_position(text) {
        Some(position) => {
            let changed = (position != to_position(current)).then(|| from_position(position));
            (changed, position.to_string())
        }
        None => (None, to_position(current).to_string()),
    }
}
