//! Option forms
//!
//! An `OptionsForm` pairs a displayable [`FormWidget`] with a getter that is
//! evaluated later, at the moment the user asks to run. The widget's input
//! buffers are shared, so whatever the user typed in between is what the
//! getter sees.

use parking_lot::RwLock;
use std::sync::Arc;
use twirtee_foundation::{Error, OptionKind, OptionValues, Result};

/// Declaration of one editable option
#[derive(Debug, Clone, PartialEq)]
pub struct OptionField {
    pub key: String,
    pub label: String,
    pub kind: OptionKind,
    pub default: String,
}

impl OptionField {
    pub fn new(key: impl Into<String>, kind: OptionKind, default: impl Into<String>) -> Self {
        let key = key.into();
        Self {
            label: key.clone(),
            key,
            kind,
            default: default.into(),
        }
    }

    pub fn text(key: impl Into<String>, default: impl Into<String>) -> Self {
        Self::new(key, OptionKind::Text, default)
    }

    pub fn integer(key: impl Into<String>, default: i64) -> Self {
        Self::new(key, OptionKind::Integer, default.to_string())
    }

    pub fn float(key: impl Into<String>, default: f64) -> Self {
        Self::new(key, OptionKind::Float, default.to_string())
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }
}

/// Displayable part of an option form
///
/// Cloning shares the input buffers.
#[derive(Debug, Clone)]
pub struct FormWidget {
    fields: Arc<[OptionField]>,
    inputs: Arc<RwLock<Vec<String>>>,
    notes: Arc<[String]>,
}

impl FormWidget {
    pub fn new(fields: Vec<OptionField>) -> Self {
        let inputs = fields.iter().map(|f| f.default.clone()).collect();
        Self {
            fields: fields.into(),
            inputs: Arc::new(RwLock::new(inputs)),
            notes: Arc::from(Vec::new()),
        }
    }

    /// Read-only lines shown under the fields
    pub fn with_notes(mut self, notes: Vec<String>) -> Self {
        self.notes = notes.into();
        self
    }

    pub fn fields(&self) -> &[OptionField] {
        &self.fields
    }

    pub fn notes(&self) -> &[String] {
        &self.notes
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Current text of field `index`
    pub fn input(&self, index: usize) -> Option<String> {
        self.inputs.read().get(index).cloned()
    }

    pub fn inputs(&self) -> Vec<String> {
        self.inputs.read().clone()
    }

    pub fn set_input(&self, index: usize, text: impl Into<String>) {
        if let Some(slot) = self.inputs.write().get_mut(index) {
            *slot = text.into();
        }
    }

    /// Apply a closure to the text of field `index`
    pub fn edit_input(&self, index: usize, f: impl FnOnce(&mut String)) {
        if let Some(slot) = self.inputs.write().get_mut(index) {
            f(slot);
        }
    }

    /// Set a field by key
    pub fn set(&self, key: &str, text: impl Into<String>) -> Result<()> {
        let index = self
            .fields
            .iter()
            .position(|f| f.key == key)
            .ok_or_else(|| Error::invalid_option(key, "no such option"))?;
        self.set_input(index, text);
        Ok(())
    }

    /// Parse every field by its declared kind
    pub fn parse(&self) -> Result<OptionValues> {
        let inputs = self.inputs.read();
        let mut values = OptionValues::new();
        for (field, raw) in self.fields.iter().zip(inputs.iter()) {
            values.insert(field.key.clone(), field.kind.parse(&field.key, raw)?);
        }
        Ok(values)
    }
}

/// Late-bound option values getter
pub type ValuesGetter = Box<dyn Fn() -> Result<OptionValues> + Send + Sync>;

/// Option form returned by [`Feature::options`](super::Feature::options)
pub struct OptionsForm {
    widget: FormWidget,
    getter: ValuesGetter,
}

impl OptionsForm {
    /// Form whose getter parses every field by its declared kind
    pub fn new(widget: FormWidget) -> Self {
        let reader = widget.clone();
        Self {
            widget,
            getter: Box::new(move || reader.parse()),
        }
    }

    /// Form with a custom getter reading from the shared widget
    pub fn with_getter<F>(widget: FormWidget, getter: F) -> Self
    where
        F: Fn(&FormWidget) -> Result<OptionValues> + Send + Sync + 'static,
    {
        let reader = widget.clone();
        Self {
            widget,
            getter: Box::new(move || getter(&reader)),
        }
    }

    /// Feature without options
    pub fn empty() -> Self {
        Self::new(FormWidget::new(Vec::new()))
    }

    pub fn widget(&self) -> &FormWidget {
        &self.widget
    }

    /// Resolve the current values
    pub fn values(&self) -> Result<OptionValues> {
        (self.getter)()
    }
}

impl std::fmt::Debug for OptionsForm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OptionsForm")
            .field("widget", &self.widget)
            .finish_non_exhaustive()
    }
}
