use async_trait::async_trait;
use chrono::{Datelike, Utc};
use std::collections::BTreeMap;
use tokio::sync::RwLock;

use super::models::*;
use super::{Store, StoreError, StoreResult};
use crate::types::CaseStatus;

#[derive(Default)]
struct Sequences {
    user: i64,
    case: i64,
    actuacion: i64,
    alerta: i64,
    nota: i64,
}

fn next(seq: &mut i64) -> i64 {
    *seq += 1;
    *seq
}

#[derive(Default)]
struct Tables {
    seq: Sequences,
    users: BTreeMap<i64, User>,
    cases: BTreeMap<i64, LawCase>,
    actuaciones: BTreeMap<i64, Actuacion>,
    alertas: BTreeMap<i64, Alerta>,
    notas: BTreeMap<i64, Nota>,
}

impl Tables {
    fn username(&self, id: Option<i64>) -> Option<String> {
        id.and_then(|id| self.users.get(&id)).map(|u| u.username.clone())
    }

    fn case_view(&self, case: &LawCase) -> LawCase {
        let mut case = case.clone();
        case.created_by_username = self.username(case.created_by);
        case.last_modified_by_username = self.username(case.last_modified_by);
        case
    }

    fn actuacion_view(&self, actuacion: &Actuacion) -> Actuacion {
        let mut actuacion = actuacion.clone();
        actuacion.created_by_username = self.username(actuacion.created_by);
        actuacion
    }

    fn alerta_view(&self, alerta: &Alerta) -> Alerta {
        let mut alerta = alerta.clone();
        alerta.created_by_username = self.username(alerta.created_by);
        alerta.completed_by_username = self.username(alerta.completed_by);
        alerta
    }

    fn nota_view(&self, nota: &Nota) -> Nota {
        let mut nota = nota.clone();
        nota.created_by_username = self.username(nota.created_by);
        nota
    }

    fn ensure_case(&self, caso: i64) -> StoreResult<()> {
        if self.cases.contains_key(&caso) {
            Ok(())
        } else {
            Err(StoreError::NotFound("Case"))
        }
    }

    fn username_taken(&self, username: &str, except: Option<i64>) -> bool {
        self.users
            .values()
            .any(|u| u.username == username && Some(u.id) != except)
    }
}

/// Process-local store used when no database is configured, and by the tests
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }

    async fn create_user(&self, new: NewUser) -> StoreResult<User> {
        let mut t = self.tables.write().await;
        if t.username_taken(&new.username, None) {
            return Err(StoreError::Conflict(format!("username '{}' already exists", new.username)));
        }
        let user = User {
            id: next(&mut t.seq.user),
            username: new.username,
            password_hash: new.password_hash,
            is_admin: new.is_admin,
            is_staff: new.is_staff,
            is_active: true,
            date_joined: Utc::now(),
        };
        t.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn user_by_id(&self, id: i64) -> StoreResult<Option<User>> {
        Ok(self.tables.read().await.users.get(&id).cloned())
    }

    async fn user_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        let t = self.tables.read().await;
        Ok(t.users.values().find(|u| u.username == username).cloned())
    }

    async fn list_users(&self) -> StoreResult<Vec<User>> {
        Ok(self.tables.read().await.users.values().cloned().collect())
    }

    async fn update_user(&self, id: i64, patch: UserPatch) -> StoreResult<User> {
        let mut t = self.tables.write().await;
        if let Some(username) = &patch.username {
            if t.username_taken(username.trim(), Some(id)) {
                return Err(StoreError::Conflict(format!("username '{}' already exists", username)));
            }
        }
        let user = t.users.get_mut(&id).ok_or(StoreError::NotFound("User"))?;
        patch.apply(user);
        Ok(user.clone())
    }

    async fn delete_user(&self, id: i64) -> StoreResult<()> {
        let mut t = self.tables.write().await;
        t.users.remove(&id).ok_or(StoreError::NotFound("User"))?;

        let clear = |slot: &mut Option<i64>| {
            if *slot == Some(id) {
                *slot = None;
            }
        };
        for case in t.cases.values_mut() {
            clear(&mut case.created_by);
            clear(&mut case.last_modified_by);
        }
        for actuacion in t.actuaciones.values_mut() {
            clear(&mut actuacion.created_by);
        }
        for alerta in t.alertas.values_mut() {
            clear(&mut alerta.created_by);
            clear(&mut alerta.completed_by);
        }
        for nota in t.notas.values_mut() {
            clear(&mut nota.created_by);
        }
        Ok(())
    }

    async fn count_users(&self) -> StoreResult<i64> {
        Ok(self.tables.read().await.users.len() as i64)
    }

    async fn create_case(&self, input: CaseInput, actor: i64) -> StoreResult<LawCase> {
        let mut t = self.tables.write().await;
        let year = Utc::now().year();
        let mut sequence = t.cases.len() as i64 + 1;
        let mut codigo = internal_code(sequence, year);
        while t.cases.values().any(|c| c.codigo_interno == codigo) {
            sequence += 1;
            codigo = internal_code(sequence, year);
        }

        let now = Utc::now();
        let case = LawCase {
            id: next(&mut t.seq.case),
            codigo_interno: codigo,
            caratula: input.caratula,
            nro_expediente: input.nro_expediente,
            juzgado: input.juzgado,
            fuero: input.fuero,
            estado: input.estado,
            abogado_responsable: input.abogado_responsable,
            cliente_nombre: input.cliente_nombre,
            cliente_dni: input.cliente_dni,
            contraparte: input.contraparte,
            fecha_inicio: input.fecha_inicio,
            created_at: now,
            updated_at: now,
            created_by: Some(actor),
            last_modified_by: Some(actor),
            created_by_username: None,
            last_modified_by_username: None,
        };
        t.cases.insert(case.id, case.clone());
        Ok(t.case_view(&case))
    }

    async fn case_by_id(&self, id: i64) -> StoreResult<Option<LawCase>> {
        let t = self.tables.read().await;
        Ok(t.cases.get(&id).map(|c| t.case_view(c)))
    }

    async fn list_cases(&self, filter: &CaseFilter) -> StoreResult<Vec<LawCase>> {
        let t = self.tables.read().await;
        let mut cases: Vec<LawCase> = t
            .cases
            .values()
            .filter(|c| filter.matches(c))
            .map(|c| t.case_view(c))
            .collect();
        cases.sort_by(|a, b| b.updated_at.cmp(&a.updated_at).then(b.id.cmp(&a.id)));
        Ok(cases)
    }

    async fn update_case(&self, id: i64, patch: CasePatch, actor: i64) -> StoreResult<LawCase> {
        let mut t = self.tables.write().await;
        let case = t.cases.get_mut(&id).ok_or(StoreError::NotFound("Case"))?;
        patch.apply(case);
        case.last_modified_by = Some(actor);
        case.updated_at = Utc::now();
        let case = case.clone();
        Ok(t.case_view(&case))
    }

    async fn delete_case(&self, id: i64) -> StoreResult<()> {
        let mut t = self.tables.write().await;
        t.cases.remove(&id).ok_or(StoreError::NotFound("Case"))?;
        t.actuaciones.retain(|_, a| a.caso != id);
        t.alertas.retain(|_, a| a.caso != id);
        t.notas.retain(|_, n| n.caso != id);
        Ok(())
    }

    async fn count_cases(&self) -> StoreResult<i64> {
        Ok(self.tables.read().await.cases.len() as i64)
    }

    async fn count_cases_by_status(&self, estado: CaseStatus) -> StoreResult<i64> {
        let t = self.tables.read().await;
        Ok(t.cases.values().filter(|c| c.estado == estado).count() as i64)
    }

    async fn recent_cases(&self, limit: usize) -> StoreResult<Vec<LawCase>> {
        let mut cases = self.list_cases(&CaseFilter::default()).await?;
        cases.truncate(limit);
        Ok(cases)
    }

    async fn create_actuacion(&self, new: NewActuacion, actor: i64) -> StoreResult<Actuacion> {
        let mut t = self.tables.write().await;
        t.ensure_case(new.caso)?;
        let actuacion = Actuacion {
            id: next(&mut t.seq.actuacion),
            caso: new.caso,
            fecha: new.fecha,
            descripcion: new.descripcion,
            tipo: new.tipo,
            created_at: Utc::now(),
            created_by: Some(actor),
            created_by_username: None,
        };
        t.actuaciones.insert(actuacion.id, actuacion.clone());
        Ok(t.actuacion_view(&actuacion))
    }

    async fn actuacion_by_id(&self, id: i64) -> StoreResult<Option<Actuacion>> {
        let t = self.tables.read().await;
        Ok(t.actuaciones.get(&id).map(|a| t.actuacion_view(a)))
    }

    async fn list_actuaciones(&self, caso: Option<i64>) -> StoreResult<Vec<Actuacion>> {
        let t = self.tables.read().await;
        let mut list: Vec<Actuacion> = t
            .actuaciones
            .values()
            .filter(|a| caso.map_or(true, |caso| a.caso == caso))
            .map(|a| t.actuacion_view(a))
            .collect();
        list.sort_by(|a, b| b.fecha.cmp(&a.fecha).then(b.id.cmp(&a.id)));
        Ok(list)
    }

    async fn update_actuacion(&self, id: i64, patch: ActuacionPatch) -> StoreResult<Actuacion> {
        let mut t = self.tables.write().await;
        if let Some(caso) = patch.caso {
            t.ensure_case(caso)?;
        }
        let actuacion = t.actuaciones.get_mut(&id).ok_or(StoreError::NotFound("Actuacion"))?;
        patch.apply(actuacion);
        let actuacion = actuacion.clone();
        Ok(t.actuacion_view(&actuacion))
    }

    async fn delete_actuacion(&self, id: i64) -> StoreResult<()> {
        let mut t = self.tables.write().await;
        t.actuaciones.remove(&id).map(|_| ()).ok_or(StoreError::NotFound("Actuacion"))
    }

    async fn create_alerta(&self, new: NewAlerta, actor: i64) -> StoreResult<Alerta> {
        let mut t = self.tables.write().await;
        t.ensure_case(new.caso)?;
        let alerta = Alerta {
            id: next(&mut t.seq.alerta),
            caso: new.caso,
            titulo: new.titulo,
            resumen: new.resumen,
            hora: new.hora,
            fecha_vencimiento: new.fecha_vencimiento,
            cumplida: new.cumplida,
            prioridad: new.prioridad,
            created_at: Utc::now(),
            created_by: Some(actor),
            created_by_username: None,
            completed_by: None,
            completed_by_username: None,
            completed_at: None,
        };
        t.alertas.insert(alerta.id, alerta.clone());
        Ok(t.alerta_view(&alerta))
    }

    async fn alerta_by_id(&self, id: i64) -> StoreResult<Option<Alerta>> {
        let t = self.tables.read().await;
        Ok(t.alertas.get(&id).map(|a| t.alerta_view(a)))
    }

    async fn list_alertas(&self, filter: &AlertaFilter) -> StoreResult<Vec<Alerta>> {
        let t = self.tables.read().await;
        let mut list: Vec<Alerta> = t
            .alertas
            .values()
            .filter(|a| filter.matches(a))
            .map(|a| t.alerta_view(a))
            .collect();
        list.sort_by(|a, b| {
            a.fecha_vencimiento
                .cmp(&b.fecha_vencimiento)
                .then(a.hora.cmp(&b.hora))
                .then(a.id.cmp(&b.id))
        });
        Ok(list)
    }

    async fn update_alerta(&self, id: i64, patch: AlertaPatch) -> StoreResult<Alerta> {
        let mut t = self.tables.write().await;
        if let Some(caso) = patch.caso {
            t.ensure_case(caso)?;
        }
        let alerta = t.alertas.get_mut(&id).ok_or(StoreError::NotFound("Alerta"))?;
        patch.apply(alerta);
        let alerta = alerta.clone();
        Ok(t.alerta_view(&alerta))
    }

    async fn toggle_alerta(&self, id: i64, actor: i64) -> StoreResult<Alerta> {
        let mut t = self.tables.write().await;
        let alerta = t.alertas.get_mut(&id).ok_or(StoreError::NotFound("Alerta"))?;
        alerta.toggle(actor, Utc::now());
        let alerta = alerta.clone();
        Ok(t.alerta_view(&alerta))
    }

    async fn delete_alerta(&self, id: i64) -> StoreResult<()> {
        let mut t = self.tables.write().await;
        t.alertas.remove(&id).map(|_| ()).ok_or(StoreError::NotFound("Alerta"))
    }

    async fn create_nota(&self, new: NewNota, actor: i64) -> StoreResult<Nota> {
        let mut t = self.tables.write().await;
        t.ensure_case(new.caso)?;
        let nota = Nota {
            id: next(&mut t.seq.nota),
            caso: new.caso,
            titulo: new.titulo,
            contenido: new.contenido,
            etiqueta: new.etiqueta,
            created_at: Utc::now(),
            created_by: Some(actor),
            created_by_username: None,
        };
        t.notas.insert(nota.id, nota.clone());
        Ok(t.nota_view(&nota))
    }

    async fn nota_by_id(&self, id: i64) -> StoreResult<Option<Nota>> {
        let t = self.tables.read().await;
        Ok(t.notas.get(&id).map(|n| t.nota_view(n)))
    }

    async fn list_notas(&self, caso: Option<i64>) -> StoreResult<Vec<Nota>> {
        let t = self.tables.read().await;
        let mut list: Vec<Nota> = t
            .notas
            .values()
            .filter(|n| caso.map_or(true, |caso| n.caso == caso))
            .map(|n| t.nota_view(n))
            .collect();
        list.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(list)
    }

    async fn update_nota(&self, id: i64, patch: NotaPatch) -> StoreResult<Nota> {
        let mut t = self.tables.write().await;
        if let Some(caso) = patch.caso {
            t.ensure_case(caso)?;
        }
        let nota = t.notas.get_mut(&id).ok_or(StoreError::NotFound("Nota"))?;
        patch.apply(nota);
        let nota = nota.clone();
        Ok(t.nota_view(&nota))
    }

    async fn delete_nota(&self, id: i64) -> StoreResult<()> {
        let mut t = self.tables.write().await;
        t.notas.remove(&id).map(|_| ()).ok_or(StoreError::NotFound("Nota"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    async fn store_with_user() -> (MemoryStore, User) {
        let store = MemoryStore::new();
        let user = store
            .create_user(NewUser {
                username: "admin".into(),
                password_hash: String::new(),
                is_admin: true,
                is_staff: true,
            })
            .await
            .unwrap();
        (store, user)
    }

    fn case_input(caratula: &str) -> CaseInput {
        CaseInput {
            caratula: caratula.into(),
            cliente_nombre: "Cliente".into(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn internal_codes_follow_case_count() {
        let (store, user) = store_with_user().await;
        let year = Utc::now().year();

        let first = store.create_case(case_input("A c/ B"), user.id).await.unwrap();
        let second = store.create_case(case_input("C c/ D"), user.id).await.unwrap();
        assert_eq!(first.codigo_interno, internal_code(1, year));
        assert_eq!(second.codigo_interno, internal_code(2, year));
        assert_eq!(second.created_by_username.as_deref(), Some("admin"));
    }

    #[tokio::test]
    async fn internal_code_skips_taken_values_after_delete() {
        let (store, user) = store_with_user().await;
        let year = Utc::now().year();

        let first = store.create_case(case_input("A"), user.id).await.unwrap();
        store.create_case(case_input("B"), user.id).await.unwrap();
        store.delete_case(first.id).await.unwrap();

        // one case left, so count + 1 gives 2, which is still taken
        let third = store.create_case(case_input("C"), user.id).await.unwrap();
        assert_eq!(third.codigo_interno, internal_code(3, year));
    }

    #[tokio::test]
    async fn deleting_a_case_cascades_to_nested_records() {
        let (store, user) = store_with_user().await;
        let case = store.create_case(case_input("A"), user.id).await.unwrap();
        let fecha = NaiveDate::from_ymd_opt(2025, 3, 3).unwrap();

        store
            .create_actuacion(
                NewActuacion { caso: case.id, fecha, descripcion: "x".into(), tipo: String::new() },
                user.id,
            )
            .await
            .unwrap();
        store
            .create_nota(
                NewNota { caso: case.id, titulo: "t".into(), contenido: String::new(), etiqueta: String::new() },
                user.id,
            )
            .await
            .unwrap();

        store.delete_case(case.id).await.unwrap();
        assert!(store.list_actuaciones(None).await.unwrap().is_empty());
        assert!(store.list_notas(Some(case.id)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn nested_record_requires_existing_case() {
        let (store, user) = store_with_user().await;
        let err = store
            .create_nota(
                NewNota { caso: 42, titulo: "t".into(), contenido: String::new(), etiqueta: String::new() },
                user.id,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound("Case")));
    }

    #[tokio::test]
    async fn update_stamps_modifier_and_reorders_listing() {
        let (store, admin) = store_with_user().await;
        let editor = store
            .create_user(NewUser {
                username: "editor".into(),
                password_hash: String::new(),
                is_admin: false,
                is_staff: false,
            })
            .await
            .unwrap();

        let first = store.create_case(case_input("Primero"), admin.id).await.unwrap();
        store.create_case(case_input("Segundo"), admin.id).await.unwrap();

        let patch = CasePatch { estado: Some(CaseStatus::Closed), ..Default::default() };
        let updated = store.update_case(first.id, patch, editor.id).await.unwrap();
        assert_eq!(updated.last_modified_by_username.as_deref(), Some("editor"));
        assert_eq!(updated.created_by_username.as_deref(), Some("admin"));
        assert!(updated.updated_at >= first.updated_at);

        let recent = store.recent_cases(1).await.unwrap();
        assert_eq!(recent[0].id, first.id);
        assert_eq!(store.count_cases_by_status(CaseStatus::Closed).await.unwrap(), 1);
        assert_eq!(store.count_cases_by_status(CaseStatus::Open).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn deleting_a_user_clears_references() {
        let (store, admin) = store_with_user().await;
        let author = store
            .create_user(NewUser {
                username: "autor".into(),
                password_hash: String::new(),
                is_admin: false,
                is_staff: false,
            })
            .await
            .unwrap();
        let case = store.create_case(case_input("A"), author.id).await.unwrap();
        store.delete_user(author.id).await.unwrap();

        let case = store.case_by_id(case.id).await.unwrap().unwrap();
        assert_eq!(case.created_by, None);
        assert_eq!(case.created_by_username, None);
        assert!(store.user_by_id(admin.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn duplicate_username_conflicts() {
        let (store, _) = store_with_user().await;
        let err = store
            .create_user(NewUser {
                username: "admin".into(),
                password_hash: String::new(),
                is_admin: false,
                is_staff: false,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
    }

    #[tokio::test]
    async fn alertas_sort_by_due_date_and_toggle() {
        let (store, user) = store_with_user().await;
        let case = store.create_case(case_input("A"), user.id).await.unwrap();
        let alerta = |titulo: &str, day: u32| NewAlerta {
            caso: case.id,
            titulo: titulo.into(),
            resumen: String::new(),
            hora: None,
            fecha_vencimiento: NaiveDate::from_ymd_opt(2025, 7, day).unwrap(),
            cumplida: false,
            prioridad: Default::default(),
        };
        let late = store.create_alerta(alerta("tarde", 20), user.id).await.unwrap();
        store.create_alerta(alerta("pronto", 2), user.id).await.unwrap();

        let list = store.list_alertas(&AlertaFilter::default()).await.unwrap();
        assert_eq!(list[0].titulo, "pronto");

        let toggled = store.toggle_alerta(late.id, user.id).await.unwrap();
        assert!(toggled.cumplida);
        assert_eq!(toggled.completed_by_username.as_deref(), Some("admin"));

        let done = AlertaFilter { caso: Some(case.id), cumplida: Some("true".into()) };
        let list = store.list_alertas(&done).await.unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].id, late.id);
    }
}
