// Growable owned-string payload behind a Text handle.

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Text {
    value: String,
}

impl Text {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
        }
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn set(&mut self, value: impl Into<String>) {
        self.value = value.into();
    }

    pub fn append(&mut self, suffix: &str) {
        self.value.push_str(suffix);
    }

    /// Byte length, not character count.
    pub fn len(&self) -> usize {
        self.value.len()
    }

    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }

    pub fn make_uppercase(&mut self) {
        self.value = self.value.to_uppercase();
    }
}
