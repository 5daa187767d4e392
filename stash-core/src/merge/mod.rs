//! Builds one effective request block per request from Defaults, Forced and
//! the request itself, running dynamic value resolution on the merged maps.

mod resolved;
mod snapshot;

pub use resolved::{MaterializedRequest, ResolvedConfig, ResolvedRequest, ResolvedSequence};
pub use snapshot::ResolvedSnapshot;

use crate::dynamics::{ResolveContext, ResolvedMap};
use crate::error::MergeError;
use crate::secrets::SecretMap;
use crate::types::{Field, RequestEntry, RetryPolicy, StashConfig, ValueMap};

/// Resolves every request of `config`.
///
/// Any unknown reference or malformed placeholder fails the whole call, including
/// references that are only evaluated at request time.
pub fn resolve_config(
    config: &StashConfig,
    secrets: &SecretMap,
    redact: bool,
) -> Result<ResolvedConfig, MergeError> {
    let mut ctx = ResolveContext::new(config.dynamics.as_ref(), secrets, redact);

    let mut sequences = Vec::with_capacity(config.sequences.len());
    for (seq_idx, seq) in config.sequences.iter().enumerate() {
        let mut requests = Vec::with_capacity(seq.requests.len());
        for (req_idx, entry) in seq.requests.iter().enumerate() {
            let path = format!("Sequences[{seq_idx}].Requests[{req_idx}].{}", entry.key);
            requests.push(resolve_request(config, entry, req_idx, path, &mut ctx)?);
        }
        sequences.push(ResolvedSequence {
            index: seq_idx,
            name: seq.name.clone(),
            kind: seq.kind,
            concurrency_limit: seq.concurrency_limit,
            requests,
        });
    }

    Ok(ResolvedConfig {
        name: config.name.clone(),
        url_root: config.defaults.url_root.clone(),
        retry: config.retry.clone(),
        defaults: config.defaults.clone(),
        forced: config.forced.clone(),
        sequences,
    })
}

fn resolve_request(
    config: &StashConfig,
    entry: &RequestEntry,
    index: usize,
    path: String,
    ctx: &mut ResolveContext<'_>,
) -> Result<ResolvedRequest, MergeError> {
    let defaults = &config.defaults;
    let forced = config.forced.as_ref();
    let spec = &entry.spec;

    let url_root = defaults.url_root.trim();
    if url_root.is_empty() {
        return Err(MergeError::MissingUrlRoot { path });
    }

    let headers = merge_section(
        spec.headers.as_ref(),
        defaults.headers.as_ref(),
        forced.and_then(|f| f.headers.as_ref()),
    );
    let body = merge_section(
        spec.body.as_ref(),
        defaults.body.as_ref(),
        forced.and_then(|f| f.body.as_ref()),
    );
    let query = merge_section(
        spec.query.as_ref(),
        defaults.query.as_ref(),
        forced.and_then(|f| f.query.as_ref()),
    );

    Ok(ResolvedRequest {
        headers: resolve_section(ctx, &path, "Headers", headers)?,
        body: resolve_section(ctx, &path, "Body", body)?,
        query: resolve_section(ctx, &path, "Query", query)?,
        retry: effective_retry(config, &spec.retry),
        flow: spec
            .flow_control
            .clone()
            .unwrap_or_default()
            .overlay(defaults.flow_control.as_ref()),
        insecure_tls: spec.insecure_tls.or(defaults.insecure_tls).unwrap_or(false),
        response: spec.response.clone().or_else(|| defaults.response.clone()),
        index,
        key: entry.key.clone(),
        path,
        method: spec.method,
        url_root: defaults.url_root.clone(),
        url_path: spec.url_path.clone(),
    })
}

/// Request section if present, else the defaults section; Forced is overlaid key by key.
fn merge_section(
    request: Option<&ValueMap>,
    defaults: Option<&ValueMap>,
    forced: Option<&ValueMap>,
) -> Option<ValueMap> {
    let base = request.or(defaults).cloned();
    match forced {
        None => base,
        Some(forced) => {
            let mut merged = base.unwrap_or_default();
            for (k, v) in forced {
                merged.insert(k.clone(), v.clone());
            }
            Some(merged)
        }
    }
}

fn resolve_section(
    ctx: &mut ResolveContext<'_>,
    path: &str,
    section: &str,
    map: Option<ValueMap>,
) -> Result<Option<ResolvedMap>, MergeError> {
    let Some(map) = map else {
        return Ok(None);
    };
    let mut out = ResolvedMap::with_capacity(map.len());
    for (k, v) in &map {
        let resolved = ctx.resolve_value(v).map_err(|source| MergeError::Dynamic {
            path: format!("{path}.{section}.{k}"),
            source,
        })?;
        out.insert(k.clone(), resolved);
    }
    Ok(Some(out))
}

/// Forced.Retry wins when declared; otherwise the closest declared level of
/// request, Defaults and the root section, with an explicit null counting as declared.
fn effective_retry(config: &StashConfig, request: &Field<RetryPolicy>) -> Field<RetryPolicy> {
    if let Some(forced) = config.forced.as_ref().filter(|f| f.retry.is_declared()) {
        return forced.retry.clone();
    }
    request
        .clone()
        .or_declared(config.defaults.retry.clone())
        .or_declared(config.retry.clone())
}
