use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::ValidationErrors;
use crate::types::{blank_as_none, patch_time_blank_as_none, time_blank_as_none, Priority};

/// Deadline alert attached to a case
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Alerta {
    pub id: i64,
    pub caso: i64,
    pub titulo: String,
    pub resumen: String,
    pub hora: Option<NaiveTime>,
    pub fecha_vencimiento: NaiveDate,
    pub cumplida: bool,
    #[sqlx(try_from = "String")]
    pub prioridad: Priority,
    pub created_at: DateTime<Utc>,
    pub created_by: Option<i64>,
    #[serde(default)]
    pub created_by_username: Option<String>,
    pub completed_by: Option<i64>,
    #[serde(default)]
    pub completed_by_username: Option<String>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl Alerta {
    /// Flip `cumplida`, stamping who completed it and when, or clearing both
    pub fn toggle(&mut self, actor: i64, now: DateTime<Utc>) {
        self.cumplida = !self.cumplida;
        if self.cumplida {
            self.completed_by = Some(actor);
            self.completed_at = Some(now);
        } else {
            self.completed_by = None;
            self.completed_at = None;
        }
        self.completed_by_username = None;
    }
}

#[derive(Debug, Clone)]
pub struct NewAlerta {
    pub caso: i64,
    pub titulo: String,
    pub resumen: String,
    pub hora: Option<NaiveTime>,
    pub fecha_vencimiento: NaiveDate,
    pub cumplida: bool,
    pub prioridad: Priority,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AlertaInput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caso: Option<i64>,
    #[serde(default)]
    pub titulo: String,
    #[serde(default)]
    pub resumen: String,
    #[serde(default, deserialize_with = "time_blank_as_none")]
    pub hora: Option<NaiveTime>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub fecha_vencimiento: Option<NaiveDate>,
    #[serde(default)]
    pub cumplida: bool,
    #[serde(default)]
    pub prioridad: Priority,
}

impl AlertaInput {
    pub fn validate(self, caso: Option<i64>) -> Result<NewAlerta, ValidationErrors> {
        let caso = caso.or(self.caso);
        let mut errors = ValidationErrors::new();
        errors.require("caso", &caso);
        errors.require_text("titulo", &self.titulo);
        errors.require("fecha_vencimiento", &self.fecha_vencimiento);

        match (caso, self.fecha_vencimiento) {
            (Some(caso), Some(fecha_vencimiento)) if errors.is_empty() => Ok(NewAlerta {
                caso,
                titulo: self.titulo,
                resumen: self.resumen,
                hora: self.hora,
                fecha_vencimiento,
                cumplida: self.cumplida,
                prioridad: self.prioridad,
            }),
            _ => Err(errors),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AlertaPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub caso: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub titulo: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resumen: Option<String>,
    #[serde(
        default,
        deserialize_with = "patch_time_blank_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub hora: Option<Option<NaiveTime>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fecha_vencimiento: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cumplida: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prioridad: Option<Priority>,
}

impl AlertaPatch {
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if let Some(titulo) = &self.titulo {
            errors.require_text("titulo", titulo);
        }
        errors.into_result()
    }

    pub fn apply(self, alerta: &mut Alerta) {
        if let Some(v) = self.caso {
            alerta.caso = v;
        }
        if let Some(v) = self.titulo {
            alerta.titulo = v;
        }
        if let Some(v) = self.resumen {
            alerta.resumen = v;
        }
        if let Some(v) = self.hora {
            alerta.hora = v;
        }
        if let Some(v) = self.fecha_vencimiento {
            alerta.fecha_vencimiento = v;
        }
        if let Some(v) = self.cumplida {
            alerta.cumplida = v;
        }
        if let Some(v) = self.prioridad {
            alerta.prioridad = v;
        }
    }
}

impl From<NewAlerta> for AlertaPatch {
    fn from(new: NewAlerta) -> Self {
        Self {
            caso: Some(new.caso),
            titulo: Some(new.titulo),
            resumen: Some(new.resumen),
            hora: Some(new.hora),
            fecha_vencimiento: Some(new.fecha_vencimiento),
            cumplida: Some(new.cumplida),
            prioridad: Some(new.prioridad),
        }
    }
}

/// `?caso=&cumplida=` filter for alert listings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AlertaFilter {
    #[serde(default, deserialize_with = "blank_as_none")]
    pub caso: Option<i64>,
    pub cumplida: Option<String>,
}

impl AlertaFilter {
    /// Any value other than a case-insensitive `true` selects pending alerts
    pub fn cumplida(&self) -> Option<bool> {
        self.cumplida.as_deref().map(|v| v.eq_ignore_ascii_case("true"))
    }

    pub fn matches(&self, alerta: &Alerta) -> bool {
        self.caso.map_or(true, |caso| alerta.caso == caso)
            && self.cumplida().map_or(true, |cumplida| alerta.cumplida == cumplida)
    }
}
