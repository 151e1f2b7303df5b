use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::ValidationErrors;

/// Strategic note on a case
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Nota {
    pub id: i64,
    pub caso: i64,
    pub titulo: String,
    pub contenido: String,
    pub etiqueta: String,
    pub created_at: DateTime<Utc>,
    pub created_by: Option<i64>,
    #[serde(default)]
    pub created_by_username: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewNota {
    pub caso: i64,
    pub titulo: String,
    pub contenido: String,
    pub etiqueta: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NotaInput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caso: Option<i64>,
    #[serde(default)]
    pub titulo: String,
    #[serde(default)]
    pub contenido: String,
    #[serde(default)]
    pub etiqueta: String,
}

impl NotaInput {
    pub fn validate(self, caso: Option<i64>) -> Result<NewNota, ValidationErrors> {
        let caso = caso.or(self.caso);
        let mut errors = ValidationErrors::new();
        errors.require("caso", &caso);
        errors.require_text("titulo", &self.titulo);

        match caso {
            Some(caso) if errors.is_empty() => Ok(NewNota {
                caso,
                titulo: self.titulo,
                contenido: self.contenido,
                etiqueta: self.etiqueta,
            }),
            _ => Err(errors),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NotaPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub caso: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub titulo: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contenido: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub etiqueta: Option<String>,
}

impl NotaPatch {
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if let Some(titulo) = &self.titulo {
            errors.require_text("titulo", titulo);
        }
        errors.into_result()
    }

    pub fn apply(self, nota: &mut Nota) {
        if let Some(v) = self.caso {
            nota.caso = v;
        }
        if let Some(v) = self.titulo {
            nota.titulo = v;
        }
        if let Some(v) = self.contenido {
            nota.contenido = v;
        }
        if let Some(v) = self.etiqueta {
            nota.etiqueta = v;
        }
    }
}

impl From<NewNota> for NotaPatch {
    fn from(new: NewNota) -> Self {
        Self {
            caso: Some(new.caso),
            titulo: Some(new.titulo),
            contenido: Some(new.contenido),
            etiqueta: Some(new.etiqueta),
        }
    }
}
