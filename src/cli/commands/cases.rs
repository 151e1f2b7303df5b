use chrono::NaiveDate;
use clap::{Args, Subcommand};
use serde_json::json;

use crate::cli::config::build_client;
use crate::cli::utils::{output_empty_collection, output_record, output_success, truncate};
use crate::cli::OutputFormat;
use crate::database::models::{CaseDetail, CaseInput, CasePatch};
use crate::types::CaseStatus;

#[derive(Subcommand)]
pub enum CaseCommands {
    #[command(about = "List cases, most recently updated first")]
    List {
        #[arg(long, help = "Search carátula, client, file number or internal code")]
        search: Option<String>,
        #[arg(long, help = "Only cases in this status (Abierto, En Trámite, Pausado, Cerrado)")]
        estado: Option<CaseStatus>,
    },

    #[command(about = "Show a case with its actions, alerts and notes")]
    Show {
        #[arg(help = "Case ID")]
        id: i64,
    },

    #[command(about = "Create a case")]
    Create {
        #[arg(help = "Carátula (case title)")]
        caratula: String,
        #[command(flatten)]
        fields: CaseFields,
    },

    #[command(about = "Update fields of a case")]
    Update {
        #[arg(help = "Case ID")]
        id: i64,
        #[arg(long, help = "New carátula")]
        caratula: Option<String>,
        #[command(flatten)]
        fields: CaseFields,
    },

    #[command(about = "Delete a case and everything recorded on it")]
    Delete {
        #[arg(help = "Case ID")]
        id: i64,
    },
}

#[derive(Args, Debug, Default)]
pub struct CaseFields {
    #[arg(long, help = "Court file number")]
    pub expediente: Option<String>,
    #[arg(long, help = "Court (juzgado)")]
    pub juzgado: Option<String>,
    #[arg(long, help = "Jurisdiction (fuero)")]
    pub fuero: Option<String>,
    #[arg(long, help = "Status")]
    pub estado: Option<CaseStatus>,
    #[arg(long, help = "Responsible lawyer")]
    pub abogado: Option<String>,
    #[arg(long, help = "Client name")]
    pub cliente: Option<String>,
    #[arg(long, help = "Client national ID")]
    pub dni: Option<String>,
    #[arg(long, help = "Opposing party")]
    pub contraparte: Option<String>,
    #[arg(long, help = "Start date (YYYY-MM-DD)")]
    pub fecha_inicio: Option<NaiveDate>,
}

impl CaseFields {
    fn into_input(self, caratula: String) -> CaseInput {
        CaseInput {
            caratula,
            nro_expediente: self.expediente.unwrap_or_default(),
            juzgado: self.juzgado.unwrap_or_default(),
            fuero: self.fuero.unwrap_or_default(),
            estado: self.estado.unwrap_or_default(),
            abogado_responsable: self.abogado.unwrap_or_default(),
            cliente_nombre: self.cliente.unwrap_or_default(),
            cliente_dni: self.dni.unwrap_or_default(),
            contraparte: self.contraparte.unwrap_or_default(),
            fecha_inicio: self.fecha_inicio,
        }
    }

    fn into_patch(self, caratula: Option<String>) -> CasePatch {
        CasePatch {
            caratula,
            nro_expediente: self.expediente,
            juzgado: self.juzgado,
            fuero: self.fuero,
            estado: self.estado,
            abogado_responsable: self.abogado,
            cliente_nombre: self.cliente,
            cliente_dni: self.dni,
            contraparte: self.contraparte,
            fecha_inicio: self.fecha_inicio.map(Some),
        }
    }
}

fn print_detail(detail: &CaseDetail) {
    let case = &detail.case;
    println!("{}  {}", case.codigo_interno, case.caratula);
    println!("  Estado:      {}", case.estado);
    let fields = [
        ("Expediente", &case.nro_expediente),
        ("Juzgado", &case.juzgado),
        ("Fuero", &case.fuero),
        ("Abogado", &case.abogado_responsable),
        ("Cliente", &case.cliente_nombre),
        ("DNI", &case.cliente_dni),
        ("Contraparte", &case.contraparte),
    ];
    for (label, value) in fields {
        if !value.is_empty() {
            println!("  {:<12} {}", format!("{}:", label), value);
        }
    }
    if let Some(fecha) = case.fecha_inicio {
        println!("  Inicio:      {}", fecha);
    }

    if !detail.actuaciones.is_empty() {
        println!("\nActuaciones:");
        for a in &detail.actuaciones {
            println!("  #{:<4} {} {}", a.id, a.fecha, truncate(&a.descripcion, 60));
        }
    }
    if !detail.alertas.is_empty() {
        println!("\nAlertas:");
        for a in &detail.alertas {
            let mark = if a.cumplida { "x" } else { " " };
            println!("  #{:<4} [{}] {} {:<5} {}", a.id, mark, a.fecha_vencimiento, a.prioridad, truncate(&a.titulo, 50));
        }
    }
    if !detail.notas.is_empty() {
        println!("\nNotas:");
        for n in &detail.notas {
            println!("  #{:<4} {}", n.id, truncate(&n.titulo, 60));
        }
    }
}

pub async fn handle(cmd: CaseCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    let client = build_client(None)?;

    match cmd {
        CaseCommands::List { search, estado } => {
            let cases = client.list_cases(search.as_deref(), estado).await?;
            if cases.is_empty() {
                return output_empty_collection(&output_format, "cases", "No cases found");
            }
            output_record(&output_format, &cases, |cases| {
                for case in cases {
                    println!(
                        "{:>5}  {:<20} {:<11} {}",
                        case.id,
                        case.codigo_interno,
                        case.estado,
                        truncate(&case.caratula, 60)
                    );
                }
            })
        }
        CaseCommands::Show { id } => {
            let detail = client.get_case(id).await?;
            output_record(&output_format, &detail, print_detail)
        }
        CaseCommands::Create { caratula, fields } => {
            let detail = client.create_case(&fields.into_input(caratula)).await?;
            output_success(
                &output_format,
                &format!("Created case {} (id {})", detail.case.codigo_interno, detail.case.id),
                Some(json!(detail)),
            )
        }
        CaseCommands::Update { id, caratula, fields } => {
            let detail = client.update_case(id, &fields.into_patch(caratula)).await?;
            output_success(
                &output_format,
                &format!("Updated case {}", detail.case.codigo_interno),
                Some(json!(detail)),
            )
        }
        CaseCommands::Delete { id } => {
            client.delete_case(id).await?;
            output_success(&output_format, &format!("Deleted case {}", id), None)
        }
    }
}
