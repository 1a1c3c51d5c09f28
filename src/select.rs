use crate::catalog::same_version;
use crate::error::InstallError;
use crate::platform::PlatformTag;
use crate::types::{ReleaseAsset, ReleaseListing};
use std::cmp::Ordering;

/// Pick the wheel for `platform` out of `listing`.
///
/// Only wheels built for the listing's release version are candidates.
/// Tags are tried in `platform.search_order()`; each is an exact match
/// against the elements of an asset's platform tag set. When a catalog
/// publishes more than one wheel for the same tag, the most recently built
/// one wins and file name breaks any remaining tie.
pub fn select_asset<'a>(
    listing: &'a ReleaseListing,
    platform: PlatformTag,
) -> Result<&'a ReleaseAsset, InstallError> {
    let attempted = platform.search_order();

    for tag in &attempted {
        let mut matches: Vec<&ReleaseAsset> = listing
            .assets
            .iter()
            .filter(|asset| built_for_release(listing, asset))
            .filter(|asset| asset.has_platform_tag(tag.as_str()))
            .collect();

        if matches.is_empty() {
            tracing::debug!("No {} wheel for {}", listing.tool, tag);
            continue;
        }

        matches.sort_by(|a, b| newest_first(a, b));
        if matches.len() > 1 {
            tracing::warn!(
                "Catalog lists {} wheels for {} on {}: {}. Using {}",
                matches.len(),
                listing.tool,
                tag,
                matches
                    .iter()
                    .map(|a| a.name.as_str())
                    .collect::<Vec<_>>()
                    .join(", "),
                matches[0].name
            );
        }
        if tag != &platform {
            tracing::info!("No {} wheel, falling back to {}", platform, tag);
        }

        tracing::info!("Found wheel: '{}'", matches[0].name);
        return Ok(matches[0]);
    }

    Err(InstallError::AssetNotFound {
        tool: listing.tool.to_string(),
        version: listing.version_label().to_string(),
        platforms: attempted.iter().map(|t| t.to_string()).collect(),
    })
}

fn built_for_release(listing: &ReleaseListing, asset: &ReleaseAsset) -> bool {
    listing
        .version
        .as_deref()
        .map_or(true, |v| same_version(&asset.version, v))
}

fn newest_first(a: &ReleaseAsset, b: &ReleaseAsset) -> Ordering {
    b.built_at
        .cmp(&a.built_at)
        .then_with(|| a.name.cmp(&b.name))
}

/// Distinct platform fields in `listing`, sorted.
pub fn platform_listing(listing: &ReleaseListing) -> Vec<&str> {
    let mut platforms: Vec<&str> = listing
        .assets
        .iter()
        .filter(|a| built_for_release(listing, a))
        .map(|a| a.platform.as_str())
        .collect();
    platforms.sort_unstable();
    platforms.dedup();
    platforms
}
