//! Implementation of `multiver targets`.

use serde::Serialize;

use crate::core::variant::SourceVariantClass;
use crate::core::version::TargetVersionKey;
use crate::core::workspace::Workspace;

/// One registry row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TargetInfo {
    pub target: TargetVersionKey,
    pub mapping_id: String,
    pub companion_version: String,
    pub variant: SourceVariantClass,
    /// Whether the optional dependency may be linked at run time
    pub runtime_compatible: bool,
}

/// The registry in build order.
pub fn list_targets(ws: &Workspace) -> Vec<TargetInfo> {
    let manifest = ws.manifest();
    let allow_list: &[TargetVersionKey] = manifest
        .optional_dependency
        .as_ref()
        .map(|d| d.runtime_compatible.as_slice())
        .unwrap_or_default();

    manifest
        .registry
        .iter()
        .map(|(target, spec)| TargetInfo {
            target: target.clone(),
            mapping_id: spec.mapping_id.clone(),
            companion_version: spec.companion_version.clone(),
            variant: manifest.variants.classify(target.as_str()),
            runtime_compatible: allow_list.contains(target),
        })
        .collect()
}

/// Render the listing as an aligned table.
pub fn format_targets(targets: &[TargetInfo]) -> String {
    let width = |f: fn(&TargetInfo) -> usize, header: &str| {
        targets.iter().map(f).max().unwrap_or(0).max(header.len())
    };
    let tw = width(|t| t.target.as_str().len(), "TARGET");
    let mw = width(|t| t.mapping_id.len(), "MAPPING");
    let cw = width(|t| t.companion_version.len(), "COMPANION");

    let mut out = format!(
        "{:tw$}  {:mw$}  {:cw$}  {:7}  RUNTIME\n",
        "TARGET", "MAPPING", "COMPANION", "VARIANT"
    );
    for t in targets {
        out.push_str(&format!(
            "{:tw$}  {:mw$}  {:cw$}  {:7}  {}\n",
            t.target.as_str(),
            t.mapping_id,
            t.companion_version,
            t.variant.dir_name(),
            if t.runtime_compatible { "yes" } else { "no" }
        ));
    }
    out
}
