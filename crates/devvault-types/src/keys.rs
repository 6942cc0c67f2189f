// ABOUTME: Keyboard chord data type
// ABOUTME: Platform-neutral description of a key press with modifiers

/// A key press with modifiers, as delivered by the view layer
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct KeyChord {
    pub key: String,
    pub ctrl: bool,
    pub meta: bool,
    pub alt: bool,
    pub shift: bool,
}

impl KeyChord {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            ..Default::default()
        }
    }

    pub fn with_ctrl(mut self) -> Self {
        self.ctrl = true;
        self
    }

    pub fn with_meta(mut self) -> Self {
        self.meta = true;
        self
    }

    /// `Ctrl+S` or `Cmd+S`, either case
    pub fn is_save(&self) -> bool {
        (self.ctrl || self.meta) && self.key.eq_ignore_ascii_case("s")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_chord() {
        assert!(KeyChord::new("s").with_ctrl().is_save());
        assert!(KeyChord::new("S").with_meta().is_save());
        assert!(!KeyChord::new("s").is_save());
        assert!(!KeyChord::new("d").with_ctrl().is_save());
    }
}
