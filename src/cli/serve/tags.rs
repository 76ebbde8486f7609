//! Script and stylesheet tag generation.
//!
//! With precaching off, every manifest entry gets its own tag in
//! dependency order. With precaching on, a single tag per bundle is
//! emitted instead.

use crate::bundle::AssetType;
use crate::config::PipelineConfig;
use crate::resolver::Snapshot;

/// Render the head tags for the current snapshot.
pub fn html_tags(snapshot: &Snapshot, config: &PipelineConfig) -> String {
    let prefix = &config.assets.path_prefix;
    let mut tags = String::new();

    if config.precache.enabled() {
        for kind in [AssetType::Script, AssetType::Style] {
            if snapshot.manifest.iter().any(|uri| kind.matches_uri(uri)) {
                tags.push_str(&tag_for(kind, prefix, kind.bundle_uri()));
            }
        }
    } else {
        for uri in &snapshot.manifest {
            for kind in [AssetType::Script, AssetType::Style] {
                if kind.matches_uri(uri) {
                    tags.push_str(&tag_for(kind, prefix, uri));
                }
            }
        }
    }

    tags
}

fn tag_for(kind: AssetType, prefix: &str, uri: &str) -> String {
    match kind {
        AssetType::Script => {
            format!("<script src=\"{prefix}{uri}\" type=\"text/javascript\"></script>")
        }
        AssetType::Style => {
            format!("<link rel=\"stylesheet\" type=\"text/css\" href=\"{prefix}{uri}\"/>")
        }
    }
}
