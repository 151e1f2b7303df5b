use serde::{Deserialize, Serialize};

use crate::database::models::{Alerta, AlertaFilter, CaseSummary};
use crate::database::{Store, StoreResult};
use crate::types::CaseStatus;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardStats {
    pub total_cases: i64,
    pub open_cases: i64,
    pub in_progress_cases: i64,
    pub paused_cases: i64,
    pub closed_cases: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dashboard {
    pub stats: DashboardStats,
    pub recent_cases: Vec<CaseSummary>,
    pub alertas: Vec<Alerta>,
}

/// Case counts per status, the latest updated cases and every alert
pub async fn dashboard(store: &dyn Store, recent_limit: usize) -> StoreResult<Dashboard> {
    let stats = DashboardStats {
        total_cases: store.count_cases().await?,
        open_cases: store.count_cases_by_status(CaseStatus::Open).await?,
        in_progress_cases: store.count_cases_by_status(CaseStatus::InProgress).await?,
        paused_cases: store.count_cases_by_status(CaseStatus::Paused).await?,
        closed_cases: store.count_cases_by_status(CaseStatus::Closed).await?,
    };

    let recent_cases = store
        .recent_cases(recent_limit)
        .await?
        .into_iter()
        .map(CaseSummary::from)
        .collect();

    let alertas = store.list_alertas(&AlertaFilter::default()).await?;

    Ok(Dashboard { stats, recent_cases, alertas })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::{CaseInput, CasePatch};
    use crate::database::MemoryStore;

    fn case(caratula: &str, estado: CaseStatus) -> CaseInput {
        CaseInput { caratula: caratula.into(), estado, ..Default::default() }
    }

    #[tokio::test]
    async fn counts_by_status_and_limits_recent() {
        let store = MemoryStore::new();
        for (i, estado) in [CaseStatus::Open, CaseStatus::Open, CaseStatus::InProgress, CaseStatus::Closed]
            .into_iter()
            .enumerate()
        {
            store.create_case(case(&format!("Caso {i}"), estado), 1).await.unwrap();
        }
        let first = store.list_cases(&Default::default()).await.unwrap().pop().unwrap();
        store
            .update_case(first.id, CasePatch { estado: Some(CaseStatus::Paused), ..Default::default() }, 1)
            .await
            .unwrap();

        let board = dashboard(&store, 3).await.unwrap();
        assert_eq!(
            board.stats,
            DashboardStats { total_cases: 4, open_cases: 1, in_progress_cases: 1, paused_cases: 1, closed_cases: 1 }
        );
        assert_eq!(board.recent_cases.len(), 3);
        assert_eq!(board.recent_cases[0].id, first.id);
        assert!(board.alertas.is_empty());
    }
}
