use async_trait::async_trait;
use chrono::{Datelike, Utc};
use sqlx::{postgres::PgPoolOptions, PgPool, Postgres, QueryBuilder};
use std::time::Duration;
use tracing::info;

use super::models::*;
use super::{Store, StoreError, StoreResult};
use crate::config::DatabaseConfig;
use crate::types::CaseStatus;

const SCHEMA: &[&str] = &[
    r#"CREATE TABLE IF NOT EXISTS users (
        id BIGSERIAL PRIMARY KEY,
        username TEXT NOT NULL UNIQUE,
        password_hash TEXT NOT NULL,
        is_admin BOOLEAN NOT NULL DEFAULT FALSE,
        is_staff BOOLEAN NOT NULL DEFAULT FALSE,
        is_active BOOLEAN NOT NULL DEFAULT TRUE,
        date_joined TIMESTAMPTZ NOT NULL DEFAULT now()
    )"#,
    r#"CREATE TABLE IF NOT EXISTS law_cases (
        id BIGSERIAL PRIMARY KEY,
        codigo_interno TEXT NOT NULL UNIQUE,
        caratula TEXT NOT NULL,
        nro_expediente TEXT NOT NULL DEFAULT '',
        juzgado TEXT NOT NULL DEFAULT '',
        fuero TEXT NOT NULL DEFAULT '',
        estado TEXT NOT NULL DEFAULT 'Abierto',
        abogado_responsable TEXT NOT NULL DEFAULT '',
        cliente_nombre TEXT NOT NULL DEFAULT '',
        cliente_dni TEXT NOT NULL DEFAULT '',
        contraparte TEXT NOT NULL DEFAULT '',
        fecha_inicio DATE,
        created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
        created_by BIGINT REFERENCES users(id) ON DELETE SET NULL,
        last_modified_by BIGINT REFERENCES users(id) ON DELETE SET NULL
    )"#,
    r#"CREATE TABLE IF NOT EXISTS case_actuaciones (
        id BIGSERIAL PRIMARY KEY,
        caso BIGINT NOT NULL REFERENCES law_cases(id) ON DELETE CASCADE,
        fecha DATE NOT NULL,
        descripcion TEXT NOT NULL,
        tipo TEXT NOT NULL DEFAULT '',
        created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
        created_by BIGINT REFERENCES users(id) ON DELETE SET NULL
    )"#,
    r#"CREATE TABLE IF NOT EXISTS case_alertas (
        id BIGSERIAL PRIMARY KEY,
        caso BIGINT NOT NULL REFERENCES law_cases(id) ON DELETE CASCADE,
        titulo TEXT NOT NULL,
        resumen TEXT NOT NULL DEFAULT '',
        hora TIME,
        fecha_vencimiento DATE NOT NULL,
        cumplida BOOLEAN NOT NULL DEFAULT FALSE,
        prioridad TEXT NOT NULL DEFAULT 'Media',
        created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
        created_by BIGINT REFERENCES users(id) ON DELETE SET NULL,
        completed_by BIGINT REFERENCES users(id) ON DELETE SET NULL,
        completed_at TIMESTAMPTZ
    )"#,
    r#"CREATE TABLE IF NOT EXISTS case_notas (
        id BIGSERIAL PRIMARY KEY,
        caso BIGINT NOT NULL REFERENCES law_cases(id) ON DELETE CASCADE,
        titulo TEXT NOT NULL,
        contenido TEXT NOT NULL DEFAULT '',
        etiqueta TEXT NOT NULL DEFAULT '',
        created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
        created_by BIGINT REFERENCES users(id) ON DELETE SET NULL
    )"#,
    "CREATE INDEX IF NOT EXISTS law_cases_updated_at_idx ON law_cases (updated_at DESC)",
    "CREATE INDEX IF NOT EXISTS case_actuaciones_caso_idx ON case_actuaciones (caso)",
    "CREATE INDEX IF NOT EXISTS case_alertas_caso_idx ON case_alertas (caso)",
    "CREATE INDEX IF NOT EXISTS case_notas_caso_idx ON case_notas (caso)",
];

const CASE_SELECT: &str = "SELECT c.id, c.codigo_interno, c.caratula, c.nro_expediente, c.juzgado, \
     c.fuero, c.estado, c.abogado_responsable, c.cliente_nombre, c.cliente_dni, c.contraparte, \
     c.fecha_inicio, c.created_at, c.updated_at, c.created_by, c.last_modified_by, \
     cu.username AS created_by_username, mu.username AS last_modified_by_username \
     FROM law_cases c \
     LEFT JOIN users cu ON cu.id = c.created_by \
     LEFT JOIN users mu ON mu.id = c.last_modified_by";

const ACTUACION_SELECT: &str = "SELECT a.id, a.caso, a.fecha, a.descripcion, a.tipo, a.created_at, \
     a.created_by, u.username AS created_by_username \
     FROM case_actuaciones a LEFT JOIN users u ON u.id = a.created_by";

const ALERTA_SELECT: &str = "SELECT a.id, a.caso, a.titulo, a.resumen, a.hora, a.fecha_vencimiento, \
     a.cumplida, a.prioridad, a.created_at, a.created_by, cu.username AS created_by_username, \
     a.completed_by, du.username AS completed_by_username, a.completed_at \
     FROM case_alertas a \
     LEFT JOIN users cu ON cu.id = a.created_by \
     LEFT JOIN users du ON du.id = a.completed_by";

const NOTA_SELECT: &str = "SELECT n.id, n.caso, n.titulo, n.contenido, n.etiqueta, n.created_at, \
     n.created_by, u.username AS created_by_username \
     FROM case_notas n LEFT JOIN users u ON u.id = n.created_by";

/// Escape LIKE wildcards so user input matches literally
fn like_pattern(term: &str) -> String {
    let escaped = term
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

fn map_unique(err: sqlx::Error, what: &str) -> StoreError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            StoreError::Conflict(format!("{} already exists", what))
        }
        sqlx::Error::Database(db) if db.is_foreign_key_violation() => StoreError::NotFound("Case"),
        _ => StoreError::Sqlx(err),
    }
}

/// Postgres-backed store
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub async fn connect(database_url: &str, config: &DatabaseConfig) -> StoreResult<Self> {
        let url = url::Url::parse(database_url)
            .map_err(|_| StoreError::Config("invalid DATABASE_URL".to_string()))?;

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.connection_timeout))
            .connect(database_url)
            .await?;

        info!(
            "Connected to database {} on {}",
            url.path().trim_start_matches('/'),
            url.host_str().unwrap_or("localhost")
        );
        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create tables and indexes that do not exist yet
    pub async fn migrate(&self) -> StoreResult<()> {
        for statement in SCHEMA {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .map_err(|e| StoreError::Migration(e.to_string()))?;
        }
        info!("Database schema is up to date");
        Ok(())
    }

    async fn fetch_case(&self, id: i64) -> StoreResult<LawCase> {
        self.case_by_id(id).await?.ok_or(StoreError::NotFound("Case"))
    }

    async fn fetch_actuacion(&self, id: i64) -> StoreResult<Actuacion> {
        self.actuacion_by_id(id).await?.ok_or(StoreError::NotFound("Actuacion"))
    }

    async fn fetch_alerta(&self, id: i64) -> StoreResult<Alerta> {
        self.alerta_by_id(id).await?.ok_or(StoreError::NotFound("Alerta"))
    }

    async fn fetch_nota(&self, id: i64) -> StoreResult<Nota> {
        self.nota_by_id(id).await?.ok_or(StoreError::NotFound("Nota"))
    }

    async fn delete_from(&self, table: &str, id: i64, what: &'static str) -> StoreResult<()> {
        let result = sqlx::query(&format!("DELETE FROM {} WHERE id = $1", table))
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(what));
        }
        Ok(())
    }
}

#[async_trait]
impl Store for PgStore {
    async fn ping(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn create_user(&self, new: NewUser) -> StoreResult<User> {
        sqlx::query_as::<_, User>(
            "INSERT INTO users (username, password_hash, is_admin, is_staff) \
             VALUES ($1, $2, $3, $4) RETURNING *",
        )
        .bind(&new.username)
        .bind(&new.password_hash)
        .bind(new.is_admin)
        .bind(new.is_staff)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_unique(e, &format!("username '{}'", new.username)))
    }

    async fn user_by_id(&self, id: i64) -> StoreResult<Option<User>> {
        Ok(sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn user_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        Ok(sqlx::query_as::<_, User>("SELECT * FROM users WHERE username = $1")
            .bind(username)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn list_users(&self) -> StoreResult<Vec<User>> {
        Ok(sqlx::query_as::<_, User>("SELECT * FROM users ORDER BY id")
            .fetch_all(&self.pool)
            .await?)
    }

    async fn update_user(&self, id: i64, patch: UserPatch) -> StoreResult<User> {
        let mut user = self.user_by_id(id).await?.ok_or(StoreError::NotFound("User"))?;
        patch.apply(&mut user);
        sqlx::query_as::<_, User>(
            "UPDATE users SET username = $2, is_admin = $3, is_staff = $4 WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(&user.username)
        .bind(user.is_admin)
        .bind(user.is_staff)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_unique(e, &format!("username '{}'", user.username)))
    }

    async fn delete_user(&self, id: i64) -> StoreResult<()> {
        self.delete_from("users", id, "User").await
    }

    async fn count_users(&self) -> StoreResult<i64> {
        Ok(sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?)
    }

    async fn create_case(&self, input: CaseInput, actor: i64) -> StoreResult<LawCase> {
        let mut tx = self.pool.begin().await?;

        // Serialize code assignment between concurrent creators
        sqlx::query("LOCK TABLE law_cases IN SHARE ROW EXCLUSIVE MODE")
            .execute(&mut *tx)
            .await?;

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM law_cases")
            .fetch_one(&mut *tx)
            .await?;
        let year = Utc::now().year();
        let mut sequence = count + 1;
        let codigo = loop {
            let candidate = internal_code(sequence, year);
            let taken: bool =
                sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM law_cases WHERE codigo_interno = $1)")
                    .bind(&candidate)
                    .fetch_one(&mut *tx)
                    .await?;
            if !taken {
                break candidate;
            }
            sequence += 1;
        };

        let id: i64 = sqlx::query_scalar(
            "INSERT INTO law_cases (codigo_interno, caratula, nro_expediente, juzgado, fuero, estado, \
             abogado_responsable, cliente_nombre, cliente_dni, contraparte, fecha_inicio, \
             created_by, last_modified_by) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $12) RETURNING id",
        )
        .bind(&codigo)
        .bind(&input.caratula)
        .bind(&input.nro_expediente)
        .bind(&input.juzgado)
        .bind(&input.fuero)
        .bind(input.estado.as_str())
        .bind(&input.abogado_responsable)
        .bind(&input.cliente_nombre)
        .bind(&input.cliente_dni)
        .bind(&input.contraparte)
        .bind(input.fecha_inicio)
        .bind(actor)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        info!("Created case {} ({})", id, codigo);
        self.fetch_case(id).await
    }

    async fn case_by_id(&self, id: i64) -> StoreResult<Option<LawCase>> {
        Ok(sqlx::query_as::<_, LawCase>(&format!("{} WHERE c.id = $1", CASE_SELECT))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn list_cases(&self, filter: &CaseFilter) -> StoreResult<Vec<LawCase>> {
        let mut qb: QueryBuilder<Postgres> = QueryBuilder::new(CASE_SELECT);
        qb.push(" WHERE TRUE");

        match filter.status() {
            None => {}
            Some(Ok(status)) => {
                qb.push(" AND c.estado = ").push_bind(status.as_str());
            }
            Some(Err(())) => return Ok(Vec::new()),
        }

        if let Some(term) = filter.search_term() {
            let pattern = like_pattern(term);
            qb.push(" AND (");
            let mut fields = qb.separated(" OR ");
            for column in ["c.caratula", "c.cliente_nombre", "c.nro_expediente", "c.codigo_interno"] {
                fields.push(format!("{} ILIKE ", column)).push_bind_unseparated(pattern.clone());
            }
            qb.push(")");
        }

        qb.push(" ORDER BY c.updated_at DESC, c.id DESC");
        Ok(qb.build_query_as::<LawCase>().fetch_all(&self.pool).await?)
    }

    async fn update_case(&self, id: i64, patch: CasePatch, actor: i64) -> StoreResult<LawCase> {
        let mut case = self.fetch_case(id).await?;
        patch.apply(&mut case);

        sqlx::query(
            "UPDATE law_cases SET caratula = $2, nro_expediente = $3, juzgado = $4, fuero = $5, \
             estado = $6, abogado_responsable = $7, cliente_nombre = $8, cliente_dni = $9, \
             contraparte = $10, fecha_inicio = $11, last_modified_by = $12, updated_at = now() \
             WHERE id = $1",
        )
        .bind(id)
        .bind(&case.caratula)
        .bind(&case.nro_expediente)
        .bind(&case.juzgado)
        .bind(&case.fuero)
        .bind(case.estado.as_str())
        .bind(&case.abogado_responsable)
        .bind(&case.cliente_nombre)
        .bind(&case.cliente_dni)
        .bind(&case.contraparte)
        .bind(case.fecha_inicio)
        .bind(actor)
        .execute(&self.pool)
        .await?;

        self.fetch_case(id).await
    }

    async fn delete_case(&self, id: i64) -> StoreResult<()> {
        self.delete_from("law_cases", id, "Case").await
    }

    async fn count_cases(&self) -> StoreResult<i64> {
        Ok(sqlx::query_scalar("SELECT COUNT(*) FROM law_cases")
            .fetch_one(&self.pool)
            .await?)
    }

    async fn count_cases_by_status(&self, estado: CaseStatus) -> StoreResult<i64> {
        Ok(sqlx::query_scalar("SELECT COUNT(*) FROM law_cases WHERE estado = $1")
            .bind(estado.as_str())
            .fetch_one(&self.pool)
            .await?)
    }

    async fn recent_cases(&self, limit: usize) -> StoreResult<Vec<LawCase>> {
        Ok(sqlx::query_as::<_, LawCase>(&format!(
            "{} ORDER BY c.updated_at DESC, c.id DESC LIMIT $1",
            CASE_SELECT
        ))
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn create_actuacion(&self, new: NewActuacion, actor: i64) -> StoreResult<Actuacion> {
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO case_actuaciones (caso, fecha, descripcion, tipo, created_by) \
             VALUES ($1, $2, $3, $4, $5) RETURNING id",
        )
        .bind(new.caso)
        .bind(new.fecha)
        .bind(&new.descripcion)
        .bind(&new.tipo)
        .bind(actor)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_unique(e, "actuacion"))?;
        self.fetch_actuacion(id).await
    }

    async fn actuacion_by_id(&self, id: i64) -> StoreResult<Option<Actuacion>> {
        Ok(sqlx::query_as::<_, Actuacion>(&format!("{} WHERE a.id = $1", ACTUACION_SELECT))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn list_actuaciones(&self, caso: Option<i64>) -> StoreResult<Vec<Actuacion>> {
        Ok(sqlx::query_as::<_, Actuacion>(&format!(
            "{} WHERE ($1::BIGINT IS NULL OR a.caso = $1) ORDER BY a.fecha DESC, a.id DESC",
            ACTUACION_SELECT
        ))
        .bind(caso)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn update_actuacion(&self, id: i64, patch: ActuacionPatch) -> StoreResult<Actuacion> {
        let mut actuacion = self.fetch_actuacion(id).await?;
        patch.apply(&mut actuacion);
        sqlx::query(
            "UPDATE case_actuaciones SET caso = $2, fecha = $3, descripcion = $4, tipo = $5 WHERE id = $1",
        )
        .bind(id)
        .bind(actuacion.caso)
        .bind(actuacion.fecha)
        .bind(&actuacion.descripcion)
        .bind(&actuacion.tipo)
        .execute(&self.pool)
        .await
        .map_err(|e| map_unique(e, "actuacion"))?;
        self.fetch_actuacion(id).await
    }

    async fn delete_actuacion(&self, id: i64) -> StoreResult<()> {
        self.delete_from("case_actuaciones", id, "Actuacion").await
    }

    async fn create_alerta(&self, new: NewAlerta, actor: i64) -> StoreResult<Alerta> {
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO case_alertas (caso, titulo, resumen, hora, fecha_vencimiento, cumplida, \
             prioridad, created_by) VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING id",
        )
        .bind(new.caso)
        .bind(&new.titulo)
        .bind(&new.resumen)
        .bind(new.hora)
        .bind(new.fecha_vencimiento)
        .bind(new.cumplida)
        .bind(new.prioridad.as_str())
        .bind(actor)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_unique(e, "alerta"))?;
        self.fetch_alerta(id).await
    }

    async fn alerta_by_id(&self, id: i64) -> StoreResult<Option<Alerta>> {
        Ok(sqlx::query_as::<_, Alerta>(&format!("{} WHERE a.id = $1", ALERTA_SELECT))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn list_alertas(&self, filter: &AlertaFilter) -> StoreResult<Vec<Alerta>> {
        Ok(sqlx::query_as::<_, Alerta>(&format!(
            "{} WHERE ($1::BIGINT IS NULL OR a.caso = $1) AND ($2::BOOLEAN IS NULL OR a.cumplida = $2) \
             ORDER BY a.fecha_vencimiento, a.hora NULLS FIRST, a.id",
            ALERTA_SELECT
        ))
        .bind(filter.caso)
        .bind(filter.cumplida())
        .fetch_all(&self.pool)
        .await?)
    }

    async fn update_alerta(&self, id: i64, patch: AlertaPatch) -> StoreResult<Alerta> {
        let mut alerta = self.fetch_alerta(id).await?;
        patch.apply(&mut alerta);
        sqlx::query(
            "UPDATE case_alertas SET caso = $2, titulo = $3, resumen = $4, hora = $5, \
             fecha_vencimiento = $6, cumplida = $7, prioridad = $8 WHERE id = $1",
        )
        .bind(id)
        .bind(alerta.caso)
        .bind(&alerta.titulo)
        .bind(&alerta.resumen)
        .bind(alerta.hora)
        .bind(alerta.fecha_vencimiento)
        .bind(alerta.cumplida)
        .bind(alerta.prioridad.as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| map_unique(e, "alerta"))?;
        self.fetch_alerta(id).await
    }

    async fn toggle_alerta(&self, id: i64, actor: i64) -> StoreResult<Alerta> {
        let mut alerta = self.fetch_alerta(id).await?;
        alerta.toggle(actor, Utc::now());
        sqlx::query(
            "UPDATE case_alertas SET cumplida = $2, completed_by = $3, completed_at = $4 WHERE id = $1",
        )
        .bind(id)
        .bind(alerta.cumplida)
        .bind(alerta.completed_by)
        .bind(alerta.completed_at)
        .execute(&self.pool)
        .await?;
        self.fetch_alerta(id).await
    }

    async fn delete_alerta(&self, id: i64) -> StoreResult<()> {
        self.delete_from("case_alertas", id, "Alerta").await
    }

    async fn create_nota(&self, new: NewNota, actor: i64) -> StoreResult<Nota> {
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO case_notas (caso, titulo, contenido, etiqueta, created_by) \
             VALUES ($1, $2, $3, $4, $5) RETURNING id",
        )
        .bind(new.caso)
        .bind(&new.titulo)
        .bind(&new.contenido)
        .bind(&new.etiqueta)
        .bind(actor)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_unique(e, "nota"))?;
        self.fetch_nota(id).await
    }

    async fn nota_by_id(&self, id: i64) -> StoreResult<Option<Nota>> {
        Ok(sqlx::query_as::<_, Nota>(&format!("{} WHERE n.id = $1", NOTA_SELECT))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn list_notas(&self, caso: Option<i64>) -> StoreResult<Vec<Nota>> {
        Ok(sqlx::query_as::<_, Nota>(&format!(
            "{} WHERE ($1::BIGINT IS NULL OR n.caso = $1) ORDER BY n.created_at DESC, n.id DESC",
            NOTA_SELECT
        ))
        .bind(caso)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn update_nota(&self, id: i64, patch: NotaPatch) -> StoreResult<Nota> {
        let mut nota = self.fetch_nota(id).await?;
        patch.apply(&mut nota);
        sqlx::query(
            "UPDATE case_notas SET caso = $2, titulo = $3, contenido = $4, etiqueta = $5 WHERE id = $1",
        )
        .bind(id)
        .bind(nota.caso)
        .bind(&nota.titulo)
        .bind(&nota.contenido)
        .bind(&nota.etiqueta)
        .execute(&self.pool)
        .await
        .map_err(|e| map_unique(e, "nota"))?;
        self.fetch_nota(id).await
    }

    async fn delete_nota(&self, id: i64) -> StoreResult<()> {
        self.delete_from("case_notas", id, "Nota").await
    }
}
