use super::{link_source::LinkLoadSummary, Link, LinkFieldNames, LinkId, LinkSource};
use crate::{model::DatasetError, util::geo_utils};
use geo::Coord;
use itertools::Itertools;
use rstar::{
    primitives::{GeomWithData, Line},
    RTree,
};
use std::{collections::HashMap, path::Path};

/// a single straight piece of a link polyline, tagged with the link's index.
pub type LinkSegment = GeomWithData<Line<[f64; 2]>, usize>;

/// read-only collection of the links of one dataset load, indexed by id and by
/// location.
#[derive(Debug)]
pub struct GeometryStore {
    source: String,
    links: Vec<Link>,
    lookup: HashMap<LinkId, usize>,
    rtree: RTree<LinkSegment>,
    summary: LinkLoadSummary,
}

impl GeometryStore {
    /// loads a link dataset. unparseable and degenerate records are skipped with a
    /// warning; a dataset with zero usable links is malformed.
    pub fn load(path: &Path, fields: &LinkFieldNames) -> Result<GeometryStore, DatasetError> {
        if !path.exists() {
            return Err(DatasetError::DatasetNotFound(
                path.to_string_lossy().to_string(),
            ));
        }
        let source = LinkSource::from_path(path, fields)?;
        let rows = source.read()?;
        let rows_read = rows.len();
        let mut links = Vec::with_capacity(rows_read);
        let mut skipped = 0;
        for row in rows.into_iter() {
            match row {
                Ok(link) => links.push(link),
                Err(e) => {
                    skipped += 1;
                    log::warn!("skipping link record in {}: {e}", source.file());
                }
            }
        }
        let mut store = GeometryStore::from_links(source.file(), links)?;
        store.summary.rows_read = rows_read;
        store.summary.skipped += skipped;
        log::info!(
            "loaded {} links from {} ({} of {} records skipped)",
            store.summary.loaded,
            store.source,
            store.summary.skipped,
            rows_read
        );
        Ok(store)
    }

    /// builds a store from already-parsed links. later links with a repeated id are
    /// skipped with a warning.
    pub fn from_links(source: &str, links: Vec<Link>) -> Result<GeometryStore, DatasetError> {
        let rows_read = links.len();
        let mut lookup: HashMap<LinkId, usize> = HashMap::with_capacity(rows_read);
        let mut kept: Vec<Link> = Vec::with_capacity(rows_read);
        let mut skipped = 0;
        for link in links.into_iter() {
            if lookup.contains_key(&link.id) {
                log::warn!("skipping duplicate link id '{}' in {source}", link.id);
                skipped += 1;
                continue;
            }
            lookup.insert(link.id.clone(), kept.len());
            kept.push(link);
        }
        if kept.is_empty() {
            return Err(DatasetError::DatasetMalformed {
                path: source.to_string(),
                msg: String::from("no valid link records found"),
            });
        }

        let segments = kept
            .iter()
            .enumerate()
            .flat_map(|(idx, link)| {
                link.geometry
                    .0
                    .iter()
                    .tuple_windows()
                    .map(move |(a, b)| GeomWithData::new(Line::new([a.x, a.y], [b.x, b.y]), idx))
            })
            .collect_vec();
        let rtree = RTree::bulk_load(segments);

        let summary = LinkLoadSummary {
            rows_read,
            loaded: kept.len(),
            skipped,
        };
        Ok(GeometryStore {
            source: source.to_string(),
            links: kept,
            lookup,
            rtree,
            summary,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn summary(&self) -> &LinkLoadSummary {
        &self.summary
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    pub fn links(&self) -> &[Link] {
        &self.links
    }

    pub fn contains(&self, id: &LinkId) -> bool {
        self.lookup.contains_key(id)
    }

    pub fn get(&self, id: &LinkId) -> Option<&Link> {
        self.lookup.get(id).map(|idx| &self.links[*idx])
    }

    /// finds the link nearest to a coordinate by great-circle distance. ties are
    /// broken by link id so results do not depend on rtree layout.
    ///
    /// planar order in degrees differs from metric order away from the equator, so
    /// the planar nearest segment only bounds the search: every link within that
    /// link's distance is ranked.
    pub fn nearest_link(&self, coord: Coord<f64>) -> Option<(&Link, f64)> {
        let planar = self.rtree.nearest_neighbor(&[coord.x, coord.y])?;
        let (_, bound) =
            geo_utils::closest_point_meters(&self.links[planar.data].geometry, coord)?;
        self.links_within(coord, bound).into_iter().next()
    }

    /// nearest link no farther than `tolerance_meters`.
    pub fn nearest_link_within(
        &self,
        coord: Coord<f64>,
        tolerance_meters: f64,
    ) -> Option<(&Link, f64)> {
        self.links_within(coord, tolerance_meters)
            .into_iter()
            .next()
    }

    /// all links passing within `radius_meters` of a coordinate, nearest first.
    pub fn links_within(&self, coord: Coord<f64>, radius_meters: f64) -> Vec<(&Link, f64)> {
        let envelope = geo_utils::envelope_around(coord, radius_meters);
        let candidates = self
            .rtree
            .locate_in_envelope_intersecting(&envelope)
            .map(|segment| segment.data)
            .unique()
            .collect_vec();
        self.rank_by_distance(candidates, coord)
            .into_iter()
            .filter(|(_, d)| *d <= radius_meters)
            .collect()
    }

    fn rank_by_distance(&self, candidates: Vec<usize>, coord: Coord<f64>) -> Vec<(&Link, f64)> {
        candidates
            .into_iter()
            .filter_map(|idx| {
                let link = &self.links[idx];
                geo_utils::closest_point_meters(&link.geometry, coord).map(|(_, d)| (link, d))
            })
            .sorted_by(|(a, da), (b, db)| da.total_cmp(db).then_with(|| a.id.cmp(&b.id)))
            .collect()
    }
}
