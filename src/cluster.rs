//! Crew assignment by sweeping around the origin.
//!
//! Sites are ordered by bearing from the origin (distance breaks ties) and
//! the ordered list is cut into contiguous blocks, one per crew. Neighbouring
//! bearings end up in the same block, so crews do not criss-cross the map.

use crate::haversine::{bearing_deg, distance_km};
use crate::site::Site;

/// Splits `sites` into `crews` blocks of at most `ceil(len / crews)` sites
/// each. Trailing blocks may be short or empty; never more blocks than sites.
///
/// Sites without a location are skipped. Returns no blocks when there are
/// no sites or no crews.
pub fn assign_crews<'a>(sites: &[&'a Site], crews: usize, origin: (f64, f64)) -> Vec<Vec<&'a Site>> {
    let mut keyed: Vec<(f64, f64, &'a Site)> = sites
        .iter()
        .filter_map(|site| {
            let location = site.location()?;
            Some((bearing_deg(origin, location), distance_km(origin, location), *site))
        })
        .collect();

    if keyed.is_empty() || crews == 0 {
        return Vec::new();
    }

    // Stable: identical keys keep input order
    keyed.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.total_cmp(&b.1)));

    let keyed_len = keyed.len();
    let block_size = keyed_len.div_ceil(crews);
    let mut ordered = keyed.into_iter().map(|(_, _, site)| site);

    (0..crews.min(keyed_len))
        .map(|_| ordered.by_ref().take(block_size).collect())
        .collect()
}
