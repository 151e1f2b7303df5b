pub mod actuacion;
pub mod alerta;
pub mod law_case;
pub mod nota;
pub mod user;

pub use actuacion::{Actuacion, ActuacionInput, ActuacionPatch, NewActuacion};
pub use alerta::{Alerta, AlertaFilter, AlertaInput, AlertaPatch, NewAlerta};
pub use law_case::{internal_code, CaseDetail, CaseFilter, CaseInput, CasePatch, CaseSummary, LawCase};
pub use nota::{NewNota, Nota, NotaInput, NotaPatch};
pub use user::{CreateUserRequest, NewUser, User, UserPatch, UserView, PROTECTED_USER_ID};

use serde::Deserialize;
use std::collections::HashMap;

use crate::types::blank_as_none;

/// Per-field validation messages collected from a request body
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ValidationErrors(HashMap<String, String>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0.entry(field.to_string()).or_insert_with(|| message.into());
    }

    /// Record an error when a required text field is blank
    pub fn require_text(&mut self, field: &str, value: &str) {
        if value.trim().is_empty() {
            self.add(field, "This field may not be blank.");
        }
    }

    /// Record an error when a required value is missing
    pub fn require<T>(&mut self, field: &str, value: &Option<T>) {
        if value.is_none() {
            self.add(field, "This field is required.");
        }
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_inner(self) -> HashMap<String, String> {
        self.0
    }

    pub fn into_result(self) -> Result<(), ValidationErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

/// `?caso=` filter shared by the nested record listings
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RecordFilter {
    #[serde(default, deserialize_with = "blank_as_none")]
    pub caso: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_message_per_field_wins() {
        let mut errors = ValidationErrors::new();
        errors.require::<i64>("caso", &None);
        errors.add("caso", "second");
        errors.require_text("titulo", "   ");
        errors.require_text("contenido", "ok");

        assert_eq!(errors.get("caso"), Some("This field is required."));
        assert_eq!(errors.get("titulo"), Some("This field may not be blank."));
        assert!(errors.get("contenido").is_none());
        assert!(errors.into_result().is_err());
    }

    #[test]
    fn empty_errors_are_ok() {
        assert!(ValidationErrors::new().into_result().is_ok());
    }
}
