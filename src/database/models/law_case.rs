use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::{Actuacion, Alerta, Nota, ValidationErrors};
use crate::types::{blank_as_none, patch_blank_as_none, CaseStatus};

/// Internal reference assigned to every new case: `ENT-0001-2025-JLCA`
pub fn internal_code(sequence: i64, year: i32) -> String {
    format!("ENT-{:04}-{}-JLCA", sequence, year)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct LawCase {
    pub id: i64,
    pub codigo_interno: String,
    pub caratula: String,
    pub nro_expediente: String,
    pub juzgado: String,
    pub fuero: String,
    #[sqlx(try_from = "String")]
    pub estado: CaseStatus,
    pub abogado_responsable: String,
    pub cliente_nombre: String,
    pub cliente_dni: String,
    pub contraparte: String,
    pub fecha_inicio: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub created_by: Option<i64>,
    pub last_modified_by: Option<i64>,
    #[serde(default)]
    pub created_by_username: Option<String>,
    #[serde(default)]
    pub last_modified_by_username: Option<String>,
}

/// Case as shown in listings and on the dashboard
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseSummary {
    pub id: i64,
    pub codigo_interno: String,
    pub caratula: String,
    pub nro_expediente: String,
    pub juzgado: String,
    pub fuero: String,
    pub estado: CaseStatus,
    pub cliente_nombre: String,
    pub abogado_responsable: String,
    pub fecha_inicio: Option<NaiveDate>,
    pub updated_at: DateTime<Utc>,
    pub created_by_username: Option<String>,
    pub last_modified_by_username: Option<String>,
}

impl From<LawCase> for CaseSummary {
    fn from(case: LawCase) -> Self {
        Self {
            id: case.id,
            codigo_interno: case.codigo_interno,
            caratula: case.caratula,
            nro_expediente: case.nro_expediente,
            juzgado: case.juzgado,
            fuero: case.fuero,
            estado: case.estado,
            cliente_nombre: case.cliente_nombre,
            abogado_responsable: case.abogado_responsable,
            fecha_inicio: case.fecha_inicio,
            updated_at: case.updated_at,
            created_by_username: case.created_by_username,
            last_modified_by_username: case.last_modified_by_username,
        }
    }
}

/// Case with its actions, alerts and notes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseDetail {
    #[serde(flatten)]
    pub case: LawCase,
    #[serde(default)]
    pub actuaciones: Vec<Actuacion>,
    #[serde(default)]
    pub alertas: Vec<Alerta>,
    #[serde(default)]
    pub notas: Vec<Nota>,
}

/// Writable case fields. Read-only fields in the body are ignored.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CaseInput {
    #[serde(default)]
    pub caratula: String,
    #[serde(default)]
    pub nro_expediente: String,
    #[serde(default)]
    pub juzgado: String,
    #[serde(default)]
    pub fuero: String,
    #[serde(default)]
    pub estado: CaseStatus,
    #[serde(default)]
    pub abogado_responsable: String,
    #[serde(default)]
    pub cliente_nombre: String,
    #[serde(default)]
    pub cliente_dni: String,
    #[serde(default)]
    pub contraparte: String,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub fecha_inicio: Option<NaiveDate>,
}

impl CaseInput {
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.require_text("caratula", &self.caratula);
        errors.into_result()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CasePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub caratula: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nro_expediente: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub juzgado: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fuero: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estado: Option<CaseStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub abogado_responsable: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cliente_nombre: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cliente_dni: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contraparte: Option<String>,
    #[serde(
        default,
        deserialize_with = "patch_blank_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub fecha_inicio: Option<Option<NaiveDate>>,
}

impl CasePatch {
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if let Some(caratula) = &self.caratula {
            errors.require_text("caratula", caratula);
        }
        errors.into_result()
    }

    /// Copy the present fields onto `case`. Audit columns are left to the store.
    pub fn apply(self, case: &mut LawCase) {
        if let Some(v) = self.caratula {
            case.caratula = v;
        }
        if let Some(v) = self.nro_expediente {
            case.nro_expediente = v;
        }
        if let Some(v) = self.juzgado {
            case.juzgado = v;
        }
        if let Some(v) = self.fuero {
            case.fuero = v;
        }
        if let Some(v) = self.estado {
            case.estado = v;
        }
        if let Some(v) = self.abogado_responsable {
            case.abogado_responsable = v;
        }
        if let Some(v) = self.cliente_nombre {
            case.cliente_nombre = v;
        }
        if let Some(v) = self.cliente_dni {
            case.cliente_dni = v;
        }
        if let Some(v) = self.contraparte {
            case.contraparte = v;
        }
        if let Some(v) = self.fecha_inicio {
            case.fecha_inicio = v;
        }
    }
}

impl From<CaseInput> for CasePatch {
    fn from(input: CaseInput) -> Self {
        Self {
            caratula: Some(input.caratula),
            nro_expediente: Some(input.nro_expediente),
            juzgado: Some(input.juzgado),
            fuero: Some(input.fuero),
            estado: Some(input.estado),
            abogado_responsable: Some(input.abogado_responsable),
            cliente_nombre: Some(input.cliente_nombre),
            cliente_dni: Some(input.cliente_dni),
            contraparte: Some(input.contraparte),
            fecha_inicio: Some(input.fecha_inicio),
        }
    }
}

/// `?search=&estado=` filter for case listings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CaseFilter {
    pub search: Option<String>,
    pub estado: Option<String>,
}

impl CaseFilter {
    pub fn search_term(&self) -> Option<&str> {
        self.search.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }

    /// `Some(Err(()))` when an estado was given that matches no known status
    pub fn status(&self) -> Option<Result<CaseStatus, ()>> {
        self.estado
            .as_deref()
            .filter(|s| !s.is_empty())
            .map(|s| s.parse::<CaseStatus>().map_err(|_| ()))
    }

    /// Case-insensitive substring match over caratula, client name, file number and internal code
    pub fn matches(&self, case: &LawCase) -> bool {
        let status_ok = match self.status() {
            None => true,
            Some(Ok(status)) => case.estado == status,
            Some(Err(())) => false,
        };
        if !status_ok {
            return false;
        }

        match self.search_term() {
            None => true,
            Some(term) => {
                let term = term.to_lowercase();
                [
                    &case.caratula,
                    &case.cliente_nombre,
                    &case.nro_expediente,
                    &case.codigo_interno,
                ]
                .iter()
                .any(|field| field.to_lowercase().contains(&term))
            }
        }
    }
}
