mod image;
mod interaction;

pub use image::{Category, Image, UnknownCategory};
pub use interaction::{CategoryScore, PreferenceInsights, PreferenceRecord, Rating, ViewRecord};
