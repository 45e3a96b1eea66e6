use crate::domain::StyleToken;
use ratatui::style::Color;

// Dark grays with an orange accent. Entry kinds get their own small set of hues
// below; everything else should reuse the roles here.
pub const BG: Color = Color::Rgb(11, 13, 16);
pub const SURFACE: Color = Color::Rgb(17, 21, 27);
pub const BAR_BG: Color = Color::Rgb(14, 18, 24);

pub const FG: Color = Color::Rgb(229, 231, 235);
pub const MUTED: Color = Color::Rgb(156, 163, 175);
pub const DIM: Color = Color::Rgb(107, 114, 128);
pub const BORDER: Color = Color::Rgb(55, 65, 81);

pub const ACCENT: Color = Color::Rgb(255, 159, 26);
pub const ACCENT_BG: Color = Color::Rgb(44, 32, 16);
pub const CURSOR_BG: Color = Color::Rgb(38, 46, 58);

pub const ERROR: Color = Color::Rgb(248, 113, 113);

const DIRECTORY: Color = Color::Rgb(96, 165, 250);
const ARCHIVE: Color = Color::Rgb(244, 114, 182);
const IMAGE: Color = Color::Rgb(167, 139, 250);
const SOURCE: Color = Color::Rgb(134, 239, 172);
const DOCUMENT: Color = Color::Rgb(253, 224, 71);

pub fn token_color(token: StyleToken) -> Color {
    match token {
        StyleToken::Directory => DIRECTORY,
        StyleToken::Hidden => DIM,
        StyleToken::Archive => ARCHIVE,
        StyleToken::Image => IMAGE,
        StyleToken::Source => SOURCE,
        StyleToken::Document => DOCUMENT,
        StyleToken::Plain => FG,
    }
}
