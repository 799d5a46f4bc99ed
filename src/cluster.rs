//! Pre-clusterer: reduce a large candidate DC set to `K` representatives
//! via UPGMA agglomerative clustering on the inter-DC distance matrix,
//! picking the highest-demand DC per cluster (spec §4.3).

use std::collections::BTreeMap;

use kodama::{linkage, Method};
use log::debug;

use crate::error::{Error, Result};
use crate::geo::{haversine_km, round_km};
use crate::model::{DcId, Instance};

/// Select exactly `k` representative DCs out of `instance.dcs`.
///
/// Deterministic: identical inputs always produce identical output. Ties
/// in nearest-DC assignment and in per-cluster demand scores are broken by
/// first occurrence in `instance.dcs`' iteration order.
pub fn pre_cluster(instance: &Instance, k: usize) -> Result<Vec<DcId>> {
    let dc_ids: Vec<DcId> = instance.dcs.keys().cloned().collect();
    let n = dc_ids.len();

    if k == 0 {
        return Err(Error::invalid_input("cluster count K must be positive"));
    }
    if k > n {
        return Err(Error::invalid_input(format!(
            "cluster count K={k} exceeds candidate DC count N={n}"
        )));
    }

    debug!("pre-clustering {n} candidate DCs down to {k}");

    let scores = demand_scores(instance, &dc_ids);

    if k == n {
        // Every cluster is a singleton; no agglomeration needed.
        return Ok(dc_ids);
    }

    let mut condensed = condensed_distance_matrix(instance, &dc_ids);
    let dendrogram = linkage(&mut condensed, n, Method::Average);

    let clusters = cut_to_k_clusters(&dendrogram, n, k);
    debug_assert_eq!(clusters.len(), k);

    let mut representatives = Vec::with_capacity(k);
    for cluster in &clusters {
        let mut best_idx = cluster[0];
        let mut best_score = scores[best_idx];
        for &idx in &cluster[1..] {
            if scores[idx] > best_score {
                best_score = scores[idx];
                best_idx = idx;
            }
        }
        representatives.push(dc_ids[best_idx].clone());
    }

    Ok(representatives)
}

/// `M[a,b] = floor(km(dc_a, dc_b) + 0.5)`, condensed (row-major upper
/// triangle, excluding the diagonal) as `kodama::linkage` expects.
fn condensed_distance_matrix(instance: &Instance, dc_ids: &[DcId]) -> Vec<f64> {
    let n = dc_ids.len();
    let mut condensed = Vec::with_capacity(n * n.saturating_sub(1) / 2);
    for row in 0..n {
        let loc_row = instance.dcs[&dc_ids[row]];
        for col in row + 1..n {
            let loc_col = instance.dcs[&dc_ids[col]];
            condensed.push(round_km(haversine_km(loc_row, loc_col)) as f64);
        }
    }
    condensed
}

/// Nearest-DC hard assignment: each customer's total demand is credited to
/// the geographically closest DC, ties broken by first occurrence.
fn demand_scores(instance: &Instance, dc_ids: &[DcId]) -> Vec<f64> {
    let mut scores = vec![0.0; dc_ids.len()];
    for (k, &cust_loc) in &instance.customers {
        let mut best_idx = 0;
        let mut best_dist = i64::MAX;
        for (idx, dc_id) in dc_ids.iter().enumerate() {
            let dist = round_km(haversine_km(cust_loc, instance.dcs[dc_id]));
            if dist < best_dist {
                best_dist = dist;
                best_idx = idx;
            }
        }
        scores[best_idx] += instance.total_demand(k);
    }
    scores
}

/// Cut a UPGMA dendrogram to exactly `k` flat clusters over `n`
/// observations by replaying the first `n - k` (lowest-dissimilarity)
/// merge steps through a union-find over observation indices.
fn cut_to_k_clusters(dendrogram: &kodama::Dendrogram<f64>, n: usize, k: usize) -> Vec<Vec<usize>> {
    let capacity = 2 * n - 1;
    let mut parent: Vec<usize> = (0..capacity).collect();

    fn find(parent: &mut [usize], x: usize) -> usize {
        let mut root = x;
        while parent[root] != root {
            root = parent[root];
        }
        let mut cur = x;
        while parent[cur] != root {
            let next = parent[cur];
            parent[cur] = root;
            cur = next;
        }
        root
    }

    let merges_to_apply = n - k;
    for step_idx in 0..merges_to_apply {
        let step = &dendrogram[step_idx];
        let a = find(&mut parent, step.cluster1);
        let b = find(&mut parent, step.cluster2);
        let root = if a != b {
            parent[a] = b;
            b
        } else {
            a
        };
        // kodama numbers the cluster formed at this step `n + step_idx`;
        // later steps reference it by that label, so it must resolve to
        // the same root as its constituents.
        parent[n + step_idx] = root;
    }

    let mut groups: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
    for obs in 0..n {
        let root = find(&mut parent, obs);
        groups.entry(root).or_default().push(obs);
    }
    groups.into_values().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Location, Product};
    use indexmap::IndexMap;
    use std::collections::HashMap as Map;

    fn dc(lat: f64, lon: f64) -> Location {
        Location::new(lat, lon).unwrap()
    }

    fn instance_with_dcs(dcs: Vec<(&str, f64, f64)>, customers: Vec<(&str, f64, f64, f64)>) -> Instance {
        let mut dc_map = IndexMap::new();
        for (id, lat, lon) in dcs {
            dc_map.insert(id.to_string(), dc(lat, lon));
        }
        let mut cust_map = IndexMap::new();
        let mut demand = Map::new();
        for (id, lat, lon, d) in customers {
            cust_map.insert(id.to_string(), dc(lat, lon));
            demand.insert((id.to_string(), "P01".to_string()), d);
        }
        let dc_ub: Map<_, _> = dc_map.keys().map(|j| (j.clone(), 100.0)).collect();
        let dc_lb: Map<_, _> = dc_map.keys().map(|j| (j.clone(), 0.0)).collect();
        Instance {
            name: "t".into(),
            plants: IndexMap::from([("i1".to_string(), dc(0.0, 0.0))]),
            dcs: dc_map,
            customers: cust_map,
            products: vec![Product { id: "P01".into(), weight: 1 }],
            customer_name: Map::new(),
            dc_lb,
            dc_ub,
            demand,
            plant_ub: Map::from([(("i1".to_string(), "P01".to_string()), 1000.0)]),
        }
    }

    #[test]
    fn k_equals_n_returns_permutation() {
        let instance = instance_with_dcs(
            vec![("j1", 0.0, 0.0), ("j2", 1.0, 1.0), ("j3", 2.0, 2.0)],
            vec![("k1", 0.0, 0.0, 5.0)],
        );
        let mut out = pre_cluster(&instance, 3).unwrap();
        out.sort();
        let mut expected: Vec<String> = instance.dcs.keys().cloned().collect();
        expected.sort();
        assert_eq!(out, expected);
    }

    #[test]
    fn k_equals_one_picks_max_demand_dc() {
        let instance = instance_with_dcs(
            vec![("j1", 0.0, 0.0), ("j2", 10.0, 10.0)],
            vec![("k1", 0.0, 0.1, 5.0), ("k2", 10.0, 10.1, 50.0)],
        );
        let out = pre_cluster(&instance, 1).unwrap();
        assert_eq!(out.len(), 1);
        // j2 is nearest to the higher-demand customer k2 (demand 50 vs 5),
        // so the single surviving cluster's representative must be j2.
        assert_eq!(out[0], "j2");
    }

    #[test]
    fn output_length_and_distinctness() {
        let instance = instance_with_dcs(
            vec![
                ("j1", 0.0, 0.0),
                ("j2", 0.1, 0.1),
                ("j3", 10.0, 10.0),
                ("j4", 10.1, 10.1),
            ],
            vec![("k1", 0.0, 0.0, 1.0), ("k2", 10.0, 10.0, 1.0)],
        );
        let out = pre_cluster(&instance, 2).unwrap();
        assert_eq!(out.len(), 2);
        let unique: std::collections::HashSet<_> = out.iter().collect();
        assert_eq!(unique.len(), 2);
        for id in &out {
            assert!(instance.dcs.contains_key(id));
        }
    }

    #[test]
    fn geographic_groups_yield_one_dc_each() {
        let instance = instance_with_dcs(
            vec![
                ("j1", 0.0, 0.0),
                ("j2", 0.05, 0.05),
                ("j3", 50.0, 50.0),
                ("j4", 50.05, 50.05),
            ],
            vec![("k1", 0.0, 0.0, 1.0), ("k2", 50.0, 50.0, 1.0)],
        );
        let out = pre_cluster(&instance, 2).unwrap();
        let in_group_a = out.iter().any(|id| id == "j1" || id == "j2");
        let in_group_b = out.iter().any(|id| id == "j3" || id == "j4");
        assert!(in_group_a && in_group_b);
    }

    #[test]
    fn deterministic_across_runs() {
        let instance = instance_with_dcs(
            vec![("j1", 0.0, 0.0), ("j2", 1.0, 1.0), ("j3", 5.0, 5.0), ("j4", 6.0, 6.0)],
            vec![("k1", 0.0, 0.0, 3.0), ("k2", 5.5, 5.5, 7.0)],
        );
        let first = pre_cluster(&instance, 2).unwrap();
        let second = pre_cluster(&instance, 2).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn rejects_invalid_k() {
        let instance = instance_with_dcs(vec![("j1", 0.0, 0.0)], vec![("k1", 0.0, 0.0, 1.0)]);
        assert!(pre_cluster(&instance, 0).is_err());
        assert!(pre_cluster(&instance, 2).is_err());
    }
}
