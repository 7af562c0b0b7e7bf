use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{info, info_span};

use dbo_ingest::{load_dataset, load_raw_workbook};
use dbo_match::FieldMatcher;
use dbo_model::RawRuleRecord;
use dbo_rules::{
    DescriptorCache, Extraction, HeuristicInterpreter, InterpretationOutcome, SplitPolicy,
    detect_conflicts, extract_rules,
};
use dbo_validate::{Engine, WorkbookReport, validate_workbook};

use crate::cli::{InterpretArgs, ValidateArgs};

/// Cache field slot for a whole-batch entry.
const BATCH_KEY: &str = "*";

pub struct InterpretOutput {
    pub extraction: Extraction,
    pub outcome: InterpretationOutcome,
}

pub struct ValidateOutput {
    pub interpret: InterpretOutput,
    pub report: WorkbookReport,
}

pub fn run_interpret(args: &InterpretArgs) -> Result<InterpretOutput> {
    let span = info_span!("interpret", rules = %args.rules.display());
    let _guard = span.enter();
    interpret_rules(&args.rules, args.force_reinterpret, args.cache.as_deref())
}

pub fn run_validate(args: &ValidateArgs) -> Result<ValidateOutput> {
    let span = info_span!("validate", rules = %args.rules.display(), data = %args.data.display());
    let _guard = span.enter();
    let interpret = interpret_rules(&args.rules, args.force_reinterpret, args.cache.as_deref())?;
    let sheets = load_dataset(&args.data)
        .with_context(|| format!("load dataset {}", args.data.display()))?;
    info!(sheets = sheets.len(), "dataset loaded");
    let engine = Engine::with_matcher(FieldMatcher::new(args.threshold));
    let report = validate_workbook(&engine, &sheets, &interpret.outcome.descriptors);
    Ok(ValidateOutput { interpret, report })
}

fn interpret_rules(
    rules_path: &Path,
    force_reinterpret: bool,
    cache_path: Option<&Path>,
) -> Result<InterpretOutput> {
    let sheets = load_raw_workbook(rules_path)
        .with_context(|| format!("load rule source {}", rules_path.display()))?;
    let extraction = extract_rules(&sheets, &SplitPolicy::default()).context("extract rules")?;
    info!(
        records = extraction.records.len(),
        raw_rows = extraction.total_raw_rows,
        "rules extracted"
    );

    let source_id = rules_path.display().to_string();
    let fingerprint = batch_fingerprint(&extraction.records);
    let mut cache = match cache_path {
        Some(path) if path.exists() => DescriptorCache::load(path)
            .with_context(|| format!("load descriptor cache {}", path.display()))?,
        _ => DescriptorCache::new(),
    };

    let cached = (!force_reinterpret)
        .then(|| cache.get(&source_id, BATCH_KEY, &fingerprint))
        .flatten()
        .map(<[_]>::to_vec);
    let outcome = match cached {
        Some(descriptors) => {
            info!(rules = descriptors.len(), "reusing cached interpretations");
            let conflicts = detect_conflicts(&descriptors);
            let summary = format!(
                "{} rules reloaded from cache, {} conflicts",
                descriptors.len(),
                conflicts.len()
            );
            InterpretationOutcome {
                descriptors,
                conflicts,
                summary,
                elapsed: Duration::ZERO,
            }
        }
        None => {
            let outcome = HeuristicInterpreter::new()
                .force_reinterpret(force_reinterpret)
                .interpret(&extraction.records);
            if let Some(path) = cache_path {
                cache.insert(&source_id, BATCH_KEY, &fingerprint, outcome.descriptors.clone());
                cache
                    .save(path)
                    .with_context(|| format!("save descriptor cache {}", path.display()))?;
            }
            outcome
        }
    };
    Ok(InterpretOutput {
        extraction,
        outcome,
    })
}

/// Stable identity of an extracted batch, insensitive to everything except
/// the (field, rule text) sequence interpretation depends on.
fn batch_fingerprint(records: &[RawRuleRecord]) -> String {
    let mut fingerprint = String::new();
    for record in records {
        fingerprint.push_str(&record.field_name);
        fingerprint.push('\u{1f}');
        fingerprint.push_str(&record.rule_text);
        fingerprint.push('\n');
    }
    fingerprint
}
