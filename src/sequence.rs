//! Greedy nearest-neighbour visit order within one crew.

use crate::haversine::distance_km;
use crate::site::Site;

/// A site with its 1-based position in the crew's visit order.
#[derive(Debug, Clone, Copy)]
pub struct SequencedSite<'a> {
    pub position: usize,
    pub site: &'a Site,
}

impl SequencedSite<'_> {
    /// Location coordinates (lat, lng). Sites without one sort as the origin.
    pub fn location(&self) -> (f64, f64) {
        self.site.location().unwrap_or_default()
    }
}

/// Orders `sites` by repeatedly visiting the closest unvisited site,
/// starting from `origin`. Ties go to the site listed first.
pub fn sequence_sites<'a>(sites: &[&'a Site], origin: (f64, f64)) -> Vec<SequencedSite<'a>> {
    let mut pool: Vec<(&'a Site, (f64, f64))> = sites
        .iter()
        .filter_map(|site| Some((*site, site.location()?)))
        .collect();
    let mut ordered = Vec::with_capacity(pool.len());
    let mut current = origin;

    while !pool.is_empty() {
        let mut best_index = 0;
        let mut best_distance = f64::INFINITY;
        for (index, (_, location)) in pool.iter().enumerate() {
            let distance = distance_km(current, *location);
            if distance < best_distance {
                best_distance = distance;
                best_index = index;
            }
        }

        let (site, location) = pool.remove(best_index);
        current = location;
        ordered.push(SequencedSite {
            position: ordered.len() + 1,
            site,
        });
    }

    ordered
}

/// Straight-line length between consecutive sequenced sites, excluding the
/// leg from the origin.
pub fn internal_distance_km(sequence: &[SequencedSite<'_>]) -> f64 {
    sequence
        .windows(2)
        .map(|pair| distance_km(pair[0].location(), pair[1].location()))
        .sum()
}
