//! User-tunable settings and their validated, runtime-ready forms.
//!
//! Reading settings from a file is left to the platform; the core only ever sees a [`Settings`] snapshot obtained
//! through [`ProvideSettings`].

mod sensor_map;
pub use sensor_map::*;

mod settings;
pub use settings::*;

/// A source of [`Settings`].
///
/// The core takes a snapshot at construction and never writes back.
pub trait ProvideSettings {
    /// Returns the current settings.
    fn settings(&self) -> Settings;
}

impl ProvideSettings for Settings {
    fn settings(&self) -> Settings {
        self.clone()
    }
}
