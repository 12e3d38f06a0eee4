use anyhow::Result;
use catalog_core::{
    build_pipeline, Document, FilterCriteria, ItemId, ProductParams, ID_FIELD, PRICE_FIELD,
};
use catalog_storage::seed;
use chrono::Utc;
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use serde_json::{json, Value as JsonValue};

#[derive(Parser)]
#[command(name = "catalog")]
#[command(about = "Catalog admin CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand)]
enum Cmd {
    /// Print the pipeline a /products request with these parameters would run.
    Plan(PlanArgs),
    /// Validate a seed file before serving it.
    Check {
        seed: String,
        #[arg(long)]
        out: Option<String>,
    },
}

#[derive(Args)]
struct PlanArgs {
    #[arg(long)]
    search: Option<String>,
    #[arg(long)]
    brand: Option<String>,
    #[arg(long)]
    category: Option<String>,
    #[arg(long)]
    price: Option<String>,
    #[arg(long)]
    sort_price: Option<String>,
    #[arg(long)]
    sort_date: Option<String>,
    #[arg(long)]
    page: Option<String>,
    #[arg(long)]
    size: Option<String>,
}

impl From<PlanArgs> for ProductParams {
    fn from(a: PlanArgs) -> Self {
        ProductParams {
            search: a.search,
            brand: a.brand,
            category: a.category,
            price: a.price,
            sort_price: a.sort_price,
            sort_date: a.sort_date,
            page: a.page,
            size: a.size,
        }
    }
}

#[derive(Debug, Serialize)]
struct Violation {
    entry: usize,
    reason: String,
}

#[derive(Debug, Serialize)]
struct CheckReport {
    checked_at: String,
    documents: usize,
    /// `_id` values the loader will replace with fresh ULIDs.
    reassigned_ids: usize,
    violations: Vec<Violation>,
}

/// `regularPrice` must be text the search pipeline can convert to a
/// non-negative real number.
fn check_document(entry: usize, doc: &Document) -> Option<Violation> {
    let reason = match doc.get(PRICE_FIELD) {
        None => "missing regularPrice".to_string(),
        Some(JsonValue::String(s)) => match s.parse::<f64>() {
            Ok(p) if !p.is_finite() => format!("regularPrice {:?} is not finite", s),
            Ok(p) if p < 0.0 => format!("regularPrice {} is negative", p),
            Ok(_) => return None,
            Err(_) => format!("regularPrice {:?} is not a number", s),
        },
        Some(v) => format!("regularPrice is not text: {}", v),
    };
    Some(Violation { entry, reason })
}

/// Mirrors `InMemoryStore::insert`: anything but a ULID string is reassigned.
fn keeps_id(doc: &Document) -> bool {
    doc.get(ID_FIELD)
        .and_then(JsonValue::as_str)
        .is_some_and(|s| s.parse::<ItemId>().is_ok())
}

fn check(docs: &[Document]) -> CheckReport {
    CheckReport {
        checked_at: Utc::now().to_rfc3339(),
        documents: docs.len(),
        reassigned_ids: docs
            .iter()
            .filter(|d| d.contains_key(ID_FIELD) && !keeps_id(d))
            .count(),
        violations: docs
            .iter()
            .enumerate()
            .filter_map(|(i, d)| check_document(i + 1, d))
            .collect(),
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.cmd {
        Cmd::Plan(args) => {
            let criteria = FilterCriteria::from_params(&args.into());
            let pipeline = build_pipeline(&criteria);
            let out = json!({
                "fingerprint": pipeline.fingerprint(),
                "stages": pipeline.stages(),
            });
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
        Cmd::Check { seed, out } => {
            let docs = seed::read_documents(&seed)?;
            let report = check(&docs);
            let text = serde_json::to_string_pretty(&report)?;
            match out {
                Some(path) => std::fs::write(path, &text)?,
                None => println!("{}", text),
            }
            if !report.violations.is_empty() {
                anyhow::bail!(
                    "{} of {} documents violate the price invariant",
                    report.violations.len(),
                    report.documents
                );
            }
        }
    }
    Ok(())
}
