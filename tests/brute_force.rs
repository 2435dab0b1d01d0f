use kdsearch::{KdTree, Periodicity, QueryOptions};
use rand::prelude::*;
use rand::rngs::StdRng;

fn random_points(rng: &mut StdRng, n: usize, dims: usize, scale: f64) -> Vec<f64> {
    (0..n * dims).map(|_| rng.gen_range(0.0..scale)).collect()
}

/// Sorted squared distances from `query` to every point.
fn brute_force(points: &[f64], dims: usize, query: &[f64], periodic: &Periodicity) -> Vec<(f64, usize)> {
    let mut all: Vec<(f64, usize)> = points
        .chunks_exact(dims)
        .enumerate()
        .map(|(i, p)| (periodic.dist_sq(p, query), i))
        .collect();
    all.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
    all
}

#[test]
fn test_nearest_matches_brute_force() {
    let mut rng = StdRng::seed_from_u64(1);
    for &(n, dims, leafsize) in &[(1, 1, 1), (50, 2, 1), (500, 3, 8), (2000, 3, 16), (300, 5, 4)] {
        let points = random_points(&mut rng, n, dims, 100.0);
        let queries = random_points(&mut rng, 200, dims, 120.0);
        let tree = KdTree::build(points.clone(), dims, leafsize, None).unwrap();
        let result = tree
            .query(&queries, dims, &QueryOptions::new().squared_distances(true))
            .unwrap();

        for (q, (idx, dist)) in queries.chunks_exact(dims).zip(result.rows()) {
            let expected = brute_force(&points, dims, q, &Periodicity::none());
            assert_eq!(dist[0], expected[0].0, "n {} dims {} query {:?}", n, dims, q);
            let found = &points[idx[0] * dims..(idx[0] + 1) * dims];
            assert_eq!(Periodicity::none().dist_sq(found, q), expected[0].0);
        }
    }
}

#[test]
fn test_k_nearest_matches_brute_force() {
    let mut rng = StdRng::seed_from_u64(2);
    let dims = 3;
    let points = random_points(&mut rng, 1500, dims, 10.0);
    let queries = random_points(&mut rng, 100, dims, 10.0);
    let tree = KdTree::build(points.clone(), dims, 10, None).unwrap();

    for k in [1, 2, 5, 17] {
        let options = QueryOptions::new().k(k).squared_distances(true);
        let result = tree.query(&queries, dims, &options).unwrap();
        for (q, (_, dist)) in queries.chunks_exact(dims).zip(result.rows()) {
            let expected: Vec<f64> = brute_force(&points, dims, q, &Periodicity::none())
                .iter()
                .take(k)
                .map(|e| e.0)
                .collect();
            assert_eq!(dist, &expected[..]);
        }
    }
}

#[test]
fn test_periodic_nearest_matches_brute_force() {
    let mut rng = StdRng::seed_from_u64(3);
    let dims = 3;
    let lengths = [10.0, 0.0, 7.5];
    let periodic = Periodicity::new(&lengths, dims).unwrap();

    let mut points = Vec::new();
    for _ in 0..800 {
        points.push(rng.gen_range(0.0..10.0));
        points.push(rng.gen_range(0.0..10.0));
        points.push(rng.gen_range(0.0..7.5));
    }
    // Queries deliberately include coordinates outside the primary cell.
    let queries = random_points(&mut rng, 300, dims, 15.0)
        .into_iter()
        .map(|v| v - 2.5)
        .collect::<Vec<_>>();

    let tree = KdTree::build(points.clone(), dims, 6, Some(&lengths)).unwrap();
    for k in [1, 4] {
        let options = QueryOptions::new().k(k).squared_distances(true);
        let result = tree.query(&queries, dims, &options).unwrap();
        for (q, (_, dist)) in queries.chunks_exact(dims).zip(result.rows()) {
            let expected: Vec<f64> = brute_force(&points, dims, q, &periodic)
                .iter()
                .take(k)
                .map(|e| e.0)
                .collect();
            assert_eq!(dist, &expected[..], "query {:?}", q);
        }
    }
}

#[test]
fn test_distances_are_non_decreasing() {
    let mut rng = StdRng::seed_from_u64(4);
    let points = random_points(&mut rng, 400, 2, 1.0);
    let queries = random_points(&mut rng, 150, 2, 1.0);
    let tree = KdTree::build(points, 2, 5, None).unwrap();
    let result = tree.query(&queries, 2, &QueryOptions::new().k(12)).unwrap();

    for (_, dist) in result.rows() {
        assert!(dist.windows(2).all(|w| w[0] <= w[1]), "{:?}", dist);
    }
}

#[test]
fn test_approximate_search_within_eps() {
    let mut rng = StdRng::seed_from_u64(5);
    let dims = 4;
    let points = random_points(&mut rng, 3000, dims, 1.0);
    let queries = random_points(&mut rng, 200, dims, 1.0);
    let tree = KdTree::build(points.clone(), dims, 8, None).unwrap();

    for eps in [0.1, 0.5, 2.0] {
        let k = 3;
        let options = QueryOptions::new().k(k).eps(eps).squared_distances(true);
        let result = tree.query(&queries, dims, &options).unwrap();
        let factor = (1.0 + eps) * (1.0 + eps);

        for (q, (idx, dist)) in queries.chunks_exact(dims).zip(result.rows()) {
            let exact = brute_force(&points, dims, q, &Periodicity::none());
            assert!(dist[0] <= factor * exact[0].0 + 1e-12);
            for j in 0..k {
                assert!(idx[j] < tree.len());
                assert!(dist[j] <= factor * exact[j].0 + 1e-12, "eps {} slot {}", eps, j);
            }
        }
    }
}

#[test]
fn test_upper_bound_matches_brute_force() {
    let mut rng = StdRng::seed_from_u64(6);
    let points = random_points(&mut rng, 600, 2, 10.0);
    let queries = random_points(&mut rng, 100, 2, 10.0);
    let tree = KdTree::build(points.clone(), 2, 4, None).unwrap();
    let bound = 0.4;
    let k = 8;

    let result = tree
        .query(&queries, 2, &QueryOptions::new().k(k).distance_upper_bound(bound))
        .unwrap();
    for (q, (idx, dist)) in queries.chunks_exact(2).zip(result.rows()) {
        let within = brute_force(&points, 2, q, &Periodicity::none())
            .iter()
            .filter(|e| e.0 <= bound * bound)
            .count()
            .min(k);
        for j in 0..k {
            if j < within {
                assert!(idx[j] < tree.len());
                assert!(dist[j] <= bound);
            } else {
                assert_eq!(idx[j], tree.missing_index());
                assert_eq!(dist[j], f64::INFINITY);
            }
        }
    }
}
