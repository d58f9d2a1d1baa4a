use anyhow::Context;
use api_shared::wire::{
    page_request, DateRangeStatisticsRes, ExportDocumentRes, StatisticsRes,
};
use api_shared::HealthService;
use clap::{Parser, Subcommand};
use lawmark_core::search::parse_list;
use lawmark_core::{
    store, AnnotationService, CapabilitySet, CoreConfig, Document, DocumentId, DocumentService,
    SearchCriteria, SearchMode, SearchPage, SearchService, StatisticsService, StatusService,
};
use std::io::Write;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "lawmark")]
#[command(about = "Lawmark legal-document annotation CLI")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Check that the core services are reachable
    Health,
    /// Create the database schema if it does not exist
    Init,
    /// List documents, newest first
    List {
        /// Page number (1-based)
        #[arg(long)]
        page: Option<String>,
    },
    /// Search documents
    Search {
        /// Free-text query
        query: Option<String>,
        /// Field to match the query against: title, text or id
        #[arg(long = "by")]
        search_type: Option<String>,
        /// Comma-separated law types
        #[arg(long)]
        law_types: Option<String>,
        /// Comma-separated NPA codes
        #[arg(long)]
        npa: Option<String>,
        /// Comma-separated dominant justifications
        #[arg(long)]
        justifications: Option<String>,
        /// Comma-separated statuses
        #[arg(long)]
        status: Option<String>,
        /// Created on or after (YYYY-MM-DD)
        #[arg(long)]
        from: Option<String>,
        /// Created on or before (YYYY-MM-DD)
        #[arg(long)]
        to: Option<String>,
        /// Substring of the owner's username
        #[arg(long)]
        user: Option<String>,
        /// Page number (1-based)
        #[arg(long)]
        page: Option<String>,
    },
    /// Show a document and its annotations
    Show {
        /// Document id
        id: DocumentId,
    },
    /// Request a review status change
    Status {
        /// Document id
        id: DocumentId,
        /// UNMARKED, MARKED, GENERATED or CHECKED
        status: String,
        /// Comma-separated capabilities to act with
        #[arg(long, default_value = "")]
        capabilities: String,
    },
    /// Print statistics as JSON
    Stats {
        /// Restrict to documents created on or after this date (YYYY-MM-DD)
        #[arg(long, requires = "to")]
        from: Option<String>,
        /// Restrict to documents created on or before this date (YYYY-MM-DD)
        #[arg(long, requires = "from")]
        to: Option<String>,
    },
    /// List the NPA catalogue
    Npa,
    /// Print every document with its annotations as JSON
    Export,
}

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("lawmark_core=warn".parse()?),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let Some(command) = cli.command else {
        println!("Use 'lawmark --help' for commands");
        return Ok(());
    };

    let cfg = Arc::new(CoreConfig::from_env().context("invalid Lawmark configuration")?);
    store::initialise(&cfg).with_context(|| {
        format!(
            "failed to initialise database at {}",
            cfg.database_path().display()
        )
    })?;

    let stdout = std::io::stdout();
    run(command, cfg, &mut stdout.lock())
}

fn run(command: Commands, cfg: Arc<CoreConfig>, out: &mut impl Write) -> anyhow::Result<()> {
    match command {
        Commands::Health => {
            let res = HealthService::check_health();
            writeln!(out, "{}", res.message)?;
        }
        Commands::Init => {
            writeln!(out, "Database ready at {}", cfg.database_path().display())?;
        }
        Commands::List { page } => {
            let page = page_request(page.as_deref(), None)?;
            let result = DocumentService::new(cfg).list(page)?;
            print_page(out, result)?;
        }
        Commands::Search {
            query,
            search_type,
            law_types,
            npa,
            justifications,
            status,
            from,
            to,
            user,
            page,
        } => {
            let criteria = SearchCriteria {
                query,
                mode: SearchMode::from_param(search_type.as_deref()),
                law_types: parse_list(law_types.as_deref()),
                dominant_justifications: parse_list(justifications.as_deref()),
                npa_values: parse_list(npa.as_deref()),
                status_values: parse_list(status.as_deref()),
                from_date: from,
                to_date: to,
                user,
            };
            let service = SearchService::new(cfg);
            let page = if service.pagination_enabled() {
                Some(page_request(page.as_deref(), None)?)
            } else {
                None
            };
            print_page(out, service.search(&criteria, page)?)?;
        }
        Commands::Show { id } => {
            let document = DocumentService::new(cfg.clone()).get(id)?;
            let annotations = AnnotationService::new(cfg).list(Some(id))?;
            print_document(out, &document)?;
            writeln!(out, "{}", document.text)?;
            for a in annotations {
                writeln!(
                    out,
                    "  [{}..{}) {} {} \"{}\" ({})",
                    a.span.start(),
                    a.span.end(),
                    a.law_justification,
                    a.law_type,
                    a.orig_text,
                    a.id
                )?;
            }
        }
        Commands::Status {
            id,
            status,
            capabilities,
        } => {
            let capabilities = CapabilitySet::from_names(capabilities.split(','));
            let status = StatusService::new(cfg).request_transition(id, &status, &capabilities)?;
            writeln!(out, "Document {} is now {}", id, status)?;
        }
        Commands::Stats { from, to } => {
            let service = StatisticsService::new(cfg);
            let json = match (from, to) {
                (Some(from), Some(to)) => {
                    serde_json::to_string_pretty(&DateRangeStatisticsRes::from(
                        service.date_range(&from, &to)?,
                    ))?
                }
                _ => serde_json::to_string_pretty(&StatisticsRes::from(
                    service.document_statistics()?,
                ))?,
            };
            writeln!(out, "{}", json)?;
        }
        Commands::Npa => {
            for entry in cfg.npa_catalogue().entries() {
                writeln!(out, "{}\t{}", entry.code, entry.name)?;
            }
        }
        Commands::Export => {
            let exported: Vec<ExportDocumentRes> = DocumentService::new(cfg)
                .export_all()?
                .into_iter()
                .map(Into::into)
                .collect();
            writeln!(out, "{}", serde_json::to_string_pretty(&exported)?)?;
        }
    }

    Ok(())
}

fn print_document(out: &mut impl Write, doc: &Document) -> std::io::Result<()> {
    writeln!(
        out,
        "ID: {}, Title: {}, Owner: {}, Status: {}, Dominant: {}, Law type: {}, NPA: {}, Created: {}",
        doc.id,
        doc.title,
        doc.owner,
        doc.status,
        doc.dominant_justification,
        doc.law_type,
        doc.npa,
        doc.created_at.format("%Y-%m-%d %H:%M")
    )
}

fn print_page(out: &mut impl Write, page: SearchPage) -> anyhow::Result<()> {
    if page.items.is_empty() {
        writeln!(out, "No documents found.")?;
    }
    for doc in &page.items {
        print_document(out, doc)?;
    }
    match page.page {
        Some(info) => writeln!(
            out,
            "Page {} of {} ({} documents)",
            info.number, info.num_pages, page.total
        )?,
        None => writeln!(out, "{} documents", page.total)?,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use lawmark_core::{DocumentTitle, NewDocument, NpaCatalogue};
    use tempfile::TempDir;

    fn test_cfg(temp_dir: &TempDir) -> Arc<CoreConfig> {
        let cfg = CoreConfig::new(temp_dir.path().join("lawmark.db"), NpaCatalogue::builtin());
        store::initialise(&cfg).expect("initialise should succeed");
        Arc::new(cfg)
    }

    fn run_to_string(command: Commands, cfg: Arc<CoreConfig>) -> anyhow::Result<String> {
        let mut out = Vec::new();
        run(command, cfg, &mut out)?;
        Ok(String::from_utf8(out).expect("output should be UTF-8"))
    }

    fn seed(cfg: &Arc<CoreConfig>, title: &str) -> DocumentId {
        let new = NewDocument::new(
            DocumentTitle::new(title).expect("title should be valid"),
            "Статья 1. Запрещается курение.",
        );
        DocumentService::new(cfg.clone())
            .create("anna", new)
            .expect("create should succeed")
            .id
    }

    #[test]
    fn test_parse_search_arguments() {
        let cli = Cli::try_parse_from([
            "lawmark", "search", "закон", "--by", "text", "--status", "MARKED,CHECKED",
        ])
        .expect("arguments should parse");
        match cli.command {
            Some(Commands::Search {
                query,
                search_type,
                status,
                ..
            }) => {
                assert_eq!(query.as_deref(), Some("закон"));
                assert_eq!(search_type.as_deref(), Some("text"));
                assert_eq!(status.as_deref(), Some("MARKED,CHECKED"));
            }
            _ => panic!("expected search command"),
        }
    }

    #[test]
    fn test_stats_range_needs_both_bounds() {
        assert!(Cli::try_parse_from(["lawmark", "stats", "--from", "2024-01-01"]).is_err());
        assert!(Cli::try_parse_from([
            "lawmark", "stats", "--from", "2024-01-01", "--to", "2024-01-31"
        ])
        .is_ok());
    }

    #[test]
    fn test_list_and_search() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let cfg = test_cfg(&temp_dir);

        let empty = run_to_string(Commands::List { page: None }, cfg.clone())
            .expect("list should succeed");
        assert!(empty.contains("No documents found."));

        seed(&cfg, "Закон о курении");
        seed(&cfg, "Кодекс");

        let listed = run_to_string(Commands::List { page: None }, cfg.clone())
            .expect("list should succeed");
        assert!(listed.contains("Page 1 of 1 (2 documents)"));

        let found = run_to_string(
            Commands::Search {
                query: Some("КУРЕНИ".into()),
                search_type: None,
                law_types: None,
                npa: None,
                justifications: None,
                status: None,
                from: None,
                to: None,
                user: None,
                page: None,
            },
            cfg,
        )
        .expect("search should succeed");
        assert!(found.contains("Закон о курении"));
        assert!(!found.contains("Кодекс"));
    }

    #[test]
    fn test_status_requires_capability() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let cfg = test_cfg(&temp_dir);
        let id = seed(&cfg, "Закон");

        let denied = run_to_string(
            Commands::Status {
                id,
                status: "CHECKED".into(),
                capabilities: String::new(),
            },
            cfg.clone(),
        );
        assert!(denied.is_err());

        let out = run_to_string(
            Commands::Status {
                id,
                status: "CHECKED".into(),
                capabilities: "can_mark_as_checked".into(),
            },
            cfg,
        )
        .expect("status change should succeed");
        assert_eq!(out.trim(), format!("Document {} is now CHECKED", id));
    }

    #[test]
    fn test_npa_and_stats() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let cfg = test_cfg(&temp_dir);
        seed(&cfg, "Закон");

        let npa = run_to_string(Commands::Npa, cfg.clone()).expect("npa should succeed");
        assert!(npa.lines().next().is_some_and(|l| l.starts_with("NOTSELECTED\t")));

        let stats = run_to_string(Commands::Stats { from: None, to: None }, cfg)
            .expect("stats should succeed");
        let value: serde_json::Value =
            serde_json::from_str(&stats).expect("stats should be JSON");
        assert_eq!(value["total_documents"], 1);
    }
}
