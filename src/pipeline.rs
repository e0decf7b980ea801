//! Pipeline orchestration: preprocess, detect, link, merge, plan, apply,
//! verify. The whole chain is a pure function of `(text, config, secret)`.

use tracing::{debug, info, warn};

use crate::audit::AuditBundle;
use crate::config::RedactionConfig;
use crate::constants::PERSON_SCORE_THRESHOLD;
use crate::detectors::ner::{ingest, CorefProvider, NerProvider};
use crate::detectors::run_rule_detectors;
use crate::error::{RedactError, Result};
use crate::linker::Linker;
use crate::merge::merge_spans;
use crate::plan::{apply_plan, Plan, Planner};
use crate::preprocess::normalize;
use crate::pseudonym::keys::{document_scope_id, KeyMaterial, GLOBAL_SCOPE};
use crate::pseudonym::Generator;
use crate::span::sort_spans;
use crate::verify::{verify, VerificationReport};

/// Injected ML capabilities. The pipeline functions without them.
#[derive(Default)]
pub struct Providers<'a> {
    pub ner: Option<&'a dyn NerProvider>,
    pub coref: Option<&'a dyn CorefProvider>,
}

/// Everything a run produces.
#[derive(Debug)]
pub struct SanitizeOutcome {
    pub sanitized_text: String,
    pub plan: Plan,
    pub audit: AuditBundle,
    pub verification: VerificationReport,
}

/// Sanitize a document with rule detectors only.
pub fn sanitize_document(
    raw_text: &str,
    config: &RedactionConfig,
    secret: Option<&[u8]>,
) -> Result<SanitizeOutcome> {
    sanitize_document_with_providers(raw_text, config, secret, &Providers::default())
}

/// Sanitize a document, consulting any injected NER/coref providers.
pub fn sanitize_document_with_providers(
    raw_text: &str,
    config: &RedactionConfig,
    secret: Option<&[u8]>,
    providers: &Providers<'_>,
) -> Result<SanitizeOutcome> {
    config.validate()?;
    if config.pseudonyms.require_secret && secret.is_none() {
        return Err(RedactError::Config(
            "pseudonyms.require_secret is set but no secret was supplied".into(),
        ));
    }

    let normalized = normalize(raw_text);
    debug!(
        raw_len = raw_text.len(),
        normalized_len = normalized.text.len(),
        "document normalized"
    );

    let mut warnings: Vec<String> = Vec::new();
    let mut spans = run_rule_detectors(&normalized.text, config);

    if config.detectors.ner.enable {
        match providers.ner {
            Some(provider) if provider.probe() => {
                match provider.extract(&normalized.text) {
                    Ok(raw) => {
                        let ingested = ingest(&normalized.text, raw, PERSON_SCORE_THRESHOLD);
                        debug!(count = ingested.len(), "ner spans ingested");
                        spans.extend(ingested);
                    }
                    Err(e) if config.detectors.ner.require => {
                        return Err(RedactError::Detector {
                            name: "ner".into(),
                            source: e,
                        });
                    }
                    Err(e) => {
                        warn!("ner provider failed, continuing with rule detectors: {e}");
                        warnings.push(format!("ner provider failed and was skipped: {e}"));
                    }
                }
            }
            _ if config.detectors.ner.require => {
                return Err(RedactError::Detector {
                    name: "ner".into(),
                    source: anyhow::anyhow!("required ner provider is unavailable"),
                });
            }
            _ => {
                warnings.push("ner enabled but no provider is available; skipped".into());
            }
        }
    }
    sort_spans(&mut spans);

    if config.detectors.coref.enable && providers.coref.is_none() {
        warnings.push("coref enabled but no provider is available; skipped".into());
    }
    let linker = match providers.coref {
        Some(coref) => Linker::with_coref(coref),
        None => Linker::new(),
    };
    let linked = linker.link(&normalized.text, &mut spans, config)?;

    let merged = merge_spans(&normalized.text, spans, config);
    debug!(spans = merged.len(), "spans merged");

    let scope: Vec<u8> = if config.pseudonyms.cross_doc_consistency {
        GLOBAL_SCOPE.to_vec()
    } else {
        document_scope_id(&normalized.text).to_vec()
    };
    let keys = KeyMaterial::derive(secret, &scope);
    let generator = Generator::new(keys, config);

    let planner = Planner::new(config, &generator);
    let (plan, mut plan_warnings) = planner.build(&normalized.text, &merged, &linked)?;
    warnings.append(&mut plan_warnings);

    let sanitized_text = apply_plan(&normalized.text, &plan)?;

    let audit = AuditBundle::from_plan(
        &normalized.text,
        &plan,
        &normalized.char_map,
        generator.seed_present(),
        warnings,
    );
    let verification = verify(&sanitized_text, &plan, config, generator.seed_present());

    info!(
        replacements = plan.entries.len(),
        residuals = verification.residuals.len(),
        "sanitization complete"
    );

    if config.verification.fail_on_residual && !verification.residuals.is_empty() {
        return Err(RedactError::Verification {
            report: Box::new(verification),
        });
    }

    Ok(SanitizeOutcome {
        sanitized_text,
        plan,
        audit,
        verification,
    })
}
