use crate::cli::config::build_client;
use crate::cli::utils::{output_record, truncate};
use crate::cli::OutputFormat;

pub async fn handle(output_format: OutputFormat) -> anyhow::Result<()> {
    let board = build_client(None)?.dashboard().await?;

    output_record(&output_format, &board, |board| {
        let stats = &board.stats;
        println!(
            "Cases: {} total, {} open, {} in progress, {} paused, {} closed",
            stats.total_cases, stats.open_cases, stats.in_progress_cases, stats.paused_cases, stats.closed_cases
        );

        if !board.recent_cases.is_empty() {
            println!("\nRecently updated:");
            for case in &board.recent_cases {
                println!("  {:<20} {:<11} {}", case.codigo_interno, case.estado, truncate(&case.caratula, 50));
            }
        }

        let pending: Vec<_> = board.alertas.iter().filter(|a| !a.cumplida).collect();
        if !pending.is_empty() {
            println!("\nPending alerts:");
            for alerta in pending {
                println!(
                    "  {} [{}] {} (case {})",
                    alerta.fecha_vencimiento,
                    alerta.prioridad,
                    truncate(&alerta.titulo, 50),
                    alerta.caso
                );
            }
        }
    })
}
