use embedded_graphics::mono_font::MonoTextStyle;
use embedded_graphics::mono_font::ascii::FONT_10X20;
use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use embedded_graphics::text::{Alignment, Baseline, Text, TextStyleBuilder};

use thermo_badge_core::display::format_number;
use thermo_badge_core::{DisplayMessage, TextDisplay};

/// Renders one message at a time, centred on a cleared screen.
pub struct LcdDisplay<T> {
    target: T,
    last: heapless::String<32>,
}

impl<T> LcdDisplay<T>
where
    T: DrawTarget<Color = Rgb565>,
{
    pub fn new(target: T) -> Self {
        Self {
            target,
            last: heapless::String::new(),
        }
    }

    fn render(&mut self, text: &str) -> Result<(), T::Error> {
        // The monitor rewrites the screen every pass; skip redundant redraws
        if self.last.as_str() == text {
            return Ok(());
        }

        self.target.clear(Rgb565::BLACK)?;
        let centre = self.target.bounding_box().center();
        let character_style = MonoTextStyle::new(&FONT_10X20, Rgb565::WHITE);
        let text_style = TextStyleBuilder::new()
            .alignment(Alignment::Center)
            .baseline(Baseline::Middle)
            .build();
        Text::with_text_style(text, centre, character_style, text_style).draw(&mut self.target)?;

        self.last.clear();
        // Longer than the cache: leave it empty so the next call redraws
        let _ = self.last.push_str(text);
        Ok(())
    }
}

impl<T> TextDisplay for LcdDisplay<T>
where
    T: DrawTarget<Color = Rgb565>,
    T::Error: core::fmt::Debug,
{
    type Error = T::Error;

    fn show(&mut self, message: DisplayMessage<'_>) -> Result<(), Self::Error> {
        match message {
            DisplayMessage::Number(value) => self.render(format_number(value).as_str()),
            DisplayMessage::Text(text) => self.render(text),
        }
    }
}
