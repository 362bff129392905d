//! `{base^reading}` ruby annotations.

use multimark_core::MultimarkError;
use multimark_core::furigana::{self as ruby, FuriganaOptions};
use serde_json::Value;

use super::{Extension, parse_options};
use crate::engine::Engine;

/// Registers the furigana inline rule.
pub struct Furigana;

impl Extension for Furigana {
    fn name(&self) -> &str {
        "furigana"
    }

    fn register(&self, engine: &mut Engine, options: &Value) -> Result<(), MultimarkError> {
        let options: FuriganaOptions = parse_options(self.name(), options)?;
        ruby::register(engine.inline_mut(), options)
    }
}
