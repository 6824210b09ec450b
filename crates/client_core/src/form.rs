use crate::error::WorkflowError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FormMode {
    #[default]
    Create,
    Edit,
}

/// Input fields shared by the mint and edit flows.
///
/// Owned by the UI layer. While in [`FormMode::Edit`] the domain is pinned to
/// the name being edited and `set_domain` refuses changes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormState {
    domain: String,
    record: String,
    mode: FormMode,
}

impl FormState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    pub fn record(&self) -> &str {
        &self.record
    }

    pub fn mode(&self) -> FormMode {
        self.mode
    }

    pub fn set_domain(&mut self, domain: impl Into<String>) -> Result<(), WorkflowError> {
        if self.mode == FormMode::Edit {
            return Err(WorkflowError::InvalidInput(format!(
                "domain is fixed to '{}' while editing",
                self.domain
            )));
        }
        self.domain = domain.into();
        Ok(())
    }

    pub fn set_record(&mut self, record: impl Into<String>) {
        self.record = record.into();
    }

    pub(crate) fn clear_fields(&mut self) {
        self.domain.clear();
        self.record.clear();
    }

    pub(crate) fn pin_for_edit(&mut self, name: &str) {
        self.mode = FormMode::Edit;
        self.domain = name.to_string();
        self.record.clear();
    }

    pub(crate) fn reset(&mut self) {
        self.mode = FormMode::Create;
        self.clear_fields();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edit_mode_pins_domain() {
        let mut form = FormState::new();
        form.set_domain("alice").expect("create mode accepts domain");
        form.pin_for_edit("bob");
        assert!(form.set_domain("mallory").is_err());
        assert_eq!(form.domain(), "bob");
        form.set_record("new record");
        assert_eq!(form.record(), "new record");
    }
}
