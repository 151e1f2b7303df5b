use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::ValidationErrors;
use crate::types::blank_as_none;

/// Procedural action recorded on a case
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Actuacion {
    pub id: i64,
    pub caso: i64,
    pub fecha: NaiveDate,
    pub descripcion: String,
    pub tipo: String,
    pub created_at: DateTime<Utc>,
    pub created_by: Option<i64>,
    #[serde(default)]
    pub created_by_username: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewActuacion {
    pub caso: i64,
    pub fecha: NaiveDate,
    pub descripcion: String,
    pub tipo: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ActuacionInput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caso: Option<i64>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub fecha: Option<NaiveDate>,
    #[serde(default)]
    pub descripcion: String,
    #[serde(default)]
    pub tipo: String,
}

impl ActuacionInput {
    /// `caso` comes from the URL for nested creation, otherwise from the body
    pub fn validate(self, caso: Option<i64>) -> Result<NewActuacion, ValidationErrors> {
        let caso = caso.or(self.caso);
        let mut errors = ValidationErrors::new();
        errors.require("caso", &caso);
        errors.require("fecha", &self.fecha);
        errors.require_text("descripcion", &self.descripcion);

        match (caso, self.fecha) {
            (Some(caso), Some(fecha)) if errors.is_empty() => Ok(NewActuacion {
                caso,
                fecha,
                descripcion: self.descripcion,
                tipo: self.tipo,
            }),
            _ => Err(errors),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ActuacionPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub caso: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fecha: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub descripcion: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tipo: Option<String>,
}

impl ActuacionPatch {
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if let Some(descripcion) = &self.descripcion {
            errors.require_text("descripcion", descripcion);
        }
        errors.into_result()
    }

    pub fn apply(self, actuacion: &mut Actuacion) {
        if let Some(v) = self.caso {
            actuacion.caso = v;
        }
        if let Some(v) = self.fecha {
            actuacion.fecha = v;
        }
        if let Some(v) = self.descripcion {
            actuacion.descripcion = v;
        }
        if let Some(v) = self.tipo {
            actuacion.tipo = v;
        }
    }
}

impl From<NewActuacion> for ActuacionPatch {
    fn from(new: NewActuacion) -> Self {
        Self {
            caso: Some(new.caso),
            fecha: Some(new.fecha),
            descripcion: Some(new.descripcion),
            tipo: Some(new.tipo),
        }
    }
}
