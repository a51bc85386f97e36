//! Region to province lookup.
//!
//! Events only carry a region reference. The province name comes from one
//! bulk fetch of regions and provinces, built into a map once per
//! environment and shared by every page visit.

use crate::types::ProvinceLabel;
use heritage_client::{ApiResult, EventApi, Province, ProvinceId, Region, RegionId};
use std::collections::HashMap;
use tokio::sync::OnceCell;

/// Region → province name map.
#[derive(Debug, Clone, Default)]
pub struct RegionDirectory {
    region_provinces: HashMap<RegionId, ProvinceId>,
    province_names: HashMap<ProvinceId, String>,
}

impl RegionDirectory {
    /// Build the map from the bulk listings.
    #[must_use]
    pub fn new(regions: Vec<Region>, provinces: Vec<Province>) -> Self {
        Self {
            region_provinces: regions.into_iter().map(|r| (r.id, r.province_id)).collect(),
            province_names: provinces.into_iter().map(|p| (p.id, p.name)).collect(),
        }
    }

    /// Province name for a region, if both are known.
    #[must_use]
    pub fn province_name(&self, region_id: RegionId) -> Option<&str> {
        self.region_provinces
            .get(&region_id)
            .and_then(|province_id| self.province_names.get(province_id))
            .map(String::as_str)
    }

    /// Label for a region; unknown regions and provinces read as unknown.
    #[must_use]
    pub fn label(&self, region_id: RegionId) -> ProvinceLabel {
        self.province_name(region_id)
            .map_or(ProvinceLabel::Unknown, |name| ProvinceLabel::Known(name.to_string()))
    }
}

/// Lazily built, shared [`RegionDirectory`].
///
/// A failed build is not cached; the next lookup tries again.
#[derive(Debug, Default)]
pub struct DirectoryCache {
    cell: OnceCell<RegionDirectory>,
}

impl DirectoryCache {
    /// Empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Cache pre-filled with a directory.
    #[must_use]
    pub fn with_directory(directory: RegionDirectory) -> Self {
        Self {
            cell: OnceCell::new_with(Some(directory)),
        }
    }

    /// Whether the directory has been built.
    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.cell.initialized()
    }

    /// The directory, fetching regions and provinces concurrently on first use.
    ///
    /// # Errors
    ///
    /// Returns the first failure of the two bulk fetches.
    pub async fn directory<A: EventApi>(&self, api: &A) -> ApiResult<&RegionDirectory> {
        self.cell
            .get_or_try_init(|| async {
                let (regions, provinces) =
                    futures::join!(api.fetch_regions(), api.fetch_provinces());
                let directory = RegionDirectory::new(regions?, provinces?);
                tracing::debug!(
                    regions = directory.region_provinces.len(),
                    provinces = directory.province_names.len(),
                    "Region directory built"
                );
                Ok(directory)
            })
            .await
    }

    /// Resolve a region to a province label. Any failure yields unknown.
    pub async fn resolve<A: EventApi>(&self, api: &A, region_id: RegionId) -> ProvinceLabel {
        match self.directory(api).await {
            Ok(directory) => directory.label(region_id),
            Err(error) => {
                tracing::warn!(%region_id, %error, "Province lookup failed");
                ProvinceLabel::Unknown
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use heritage_client::ApiError;
    use heritage_testing::{MockEventApi, Operation};

    fn geography() -> (Vec<Region>, Vec<Province>) {
        (
            vec![
                Region {
                    id: RegionId(3),
                    name: "Riverlands".to_string(),
                    province_id: ProvinceId(1),
                },
                Region {
                    id: RegionId(4),
                    name: "Orphan".to_string(),
                    province_id: ProvinceId(99),
                },
            ],
            vec![Province {
                id: ProvinceId(1),
                name: "North".to_string(),
            }],
        )
    }

    #[test]
    fn test_label_lookup() {
        let (regions, provinces) = geography();
        let directory = RegionDirectory::new(regions, provinces);

        assert_eq!(directory.label(RegionId(3)), ProvinceLabel::Known("North".to_string()));
        assert_eq!(directory.label(RegionId(4)), ProvinceLabel::Unknown);
        assert_eq!(directory.label(RegionId(5)), ProvinceLabel::Unknown);
    }

    #[tokio::test]
    async fn test_directory_is_fetched_once() {
        let (regions, provinces) = geography();
        let api = MockEventApi::new().with_geography(regions, provinces);
        let cache = DirectoryCache::new();

        assert_eq!(cache.resolve(&api, RegionId(3)).await.as_str(), "North");
        assert_eq!(cache.resolve(&api, RegionId(3)).await.as_str(), "North");

        assert!(cache.is_loaded());
        assert_eq!(api.call_count(Operation::FetchRegions), 1);
        assert_eq!(api.call_count(Operation::FetchProvinces), 1);
    }

    #[tokio::test]
    async fn test_failed_build_is_retried() {
        let (regions, provinces) = geography();
        let api = MockEventApi::new().with_geography(regions.clone(), provinces);
        api.set_regions(Err(ApiError::ServiceUnavailable("down".to_string())));
        let cache = DirectoryCache::new();

        assert_eq!(cache.resolve(&api, RegionId(3)).await, ProvinceLabel::Unknown);
        assert!(!cache.is_loaded());

        api.set_regions(Ok(regions));
        assert_eq!(cache.resolve(&api, RegionId(3)).await.as_str(), "North");
        assert_eq!(api.call_count(Operation::FetchRegions), 2);
    }
}
