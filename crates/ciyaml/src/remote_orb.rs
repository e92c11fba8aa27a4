//! Remote orb resolution.
//!
//! Registry orbs declared by a document are fetched once, parsed as orb
//! documents and stored in the shared [`Caches`] under their `name@version`
//! id, so the document's orb queries can see their commands, jobs and
//! executors.

use std::{collections::HashMap, sync::Arc};

use log::{debug, info, warn};

use ciyaml_core::{
    params,
    semantic::{OrbInfo, OrbUrl},
};
use ciyaml_parser::{Document, cache::Caches};

use crate::{
    registry::{OrbRegistry, RegistryError},
    version::VersionInfo,
};

/// Resolution failures, keyed by the orb's local name.
pub type OrbFailures = HashMap<String, RegistryError>;

/// Fetch every registry orb of `document` missing from `caches`.
///
/// Orbs whose version contains a parameter substitution cannot be resolved
/// and are skipped. Failures are returned rather than reported so that the
/// validation pass can turn them into diagnostics.
pub fn resolve_remote_orbs(
    document: &Document,
    caches: &Caches,
    registry: &dyn OrbRegistry,
) -> OrbFailures {
    let remote: Vec<_> = document
        .orbs()
        .values()
        .filter(|orb| !orb.url.is_local && !params::contains_substitution(&orb.url.version))
        .collect();
    info!(orbs = remote.len(); "Resolving remote orbs");

    let mut failures = OrbFailures::new();
    for orb in remote {
        if let Err(err) = get_or_fetch_orb(&orb.url, caches, registry) {
            warn!(orb = orb.name.as_str(), err:% = err; "Cannot resolve orb");
            failures.insert(orb.name.clone(), err);
        }
    }
    failures
}

/// The cached contents of `url`, fetched from `registry` on a miss.
///
/// # Errors
///
/// Returns the registry error, or [`RegistryError::InvalidSource`] if the
/// published source cannot be parsed.
pub fn get_or_fetch_orb(
    url: &OrbUrl,
    caches: &Caches,
    registry: &dyn OrbRegistry,
) -> Result<Arc<OrbInfo>, RegistryError> {
    let id = url.id();
    if let Some(info) = caches.orb(&id) {
        debug!(id = id.as_str(); "Orb cache hit");
        return Ok(info);
    }

    debug!(id = id.as_str(); "Orb cache miss, fetching");
    let fetched = registry.fetch(&url.name, &url.version)?;
    let document = Document::parse_orb(fetched.source.as_str())
        .map_err(|_| RegistryError::InvalidSource(id.clone()))?;

    let mut info = document.to_orb_info(id.as_str(), fetched.version.as_str());
    if let Some(versions) = VersionInfo::compute(&fetched.version, &fetched.versions) {
        info.latest_version = Some(versions.latest);
        info.latest_minor_version = Some(versions.latest_minor);
        info.latest_patch_version = Some(versions.latest_patch);
    }

    Ok(caches.insert_orb(info))
}
