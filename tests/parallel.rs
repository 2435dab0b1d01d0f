use kdsearch::{KdTree, QueryOptions};
use rand::prelude::*;
use rand::rngs::StdRng;

fn clustered_points(rng: &mut StdRng, n: usize) -> Vec<f64> {
    // Half uniform, half packed into a small cluster so query cost is uneven.
    let mut points = Vec::with_capacity(n * 3);
    for i in 0..n {
        let spread = if i % 2 == 0 { 100.0 } else { 1.0 };
        for _ in 0..3 {
            points.push(rng.gen_range(0.0..spread));
        }
    }
    points
}

#[test]
fn test_parallel_matches_sequential() {
    let mut rng = StdRng::seed_from_u64(42);
    let points = clustered_points(&mut rng, 20_000);
    let queries = clustered_points(&mut rng, 5_000);
    let tree = KdTree::build(points, 3, 12, None).unwrap();

    let base = QueryOptions::new().k(6).eps(0.05);
    let sequential = tree.query(&queries, 3, &base.clone().threads(1)).unwrap();

    for threads in [2, 3, 8] {
        for chunk in [1, 7, 100, 4096] {
            let options = base.clone().threads(threads).chunk_size(chunk);
            let parallel = tree.query(&queries, 3, &options).unwrap();
            assert_eq!(parallel.indices(), sequential.indices(), "threads {} chunk {}", threads, chunk);
            let a: Vec<u64> = parallel.distances().iter().map(|d| d.to_bits()).collect();
            let b: Vec<u64> = sequential.distances().iter().map(|d| d.to_bits()).collect();
            assert_eq!(a, b, "threads {} chunk {}", threads, chunk);
        }
    }

    // Global pool.
    let global = tree.query(&queries, 3, &base.clone().chunk_size(16)).unwrap();
    assert_eq!(global, sequential);
}

#[test]
fn test_parallel_periodic_with_bound() {
    let mut rng = StdRng::seed_from_u64(7);
    let points: Vec<f64> = (0..6000).map(|_| rng.gen_range(0.0..1.0)).collect();
    let queries: Vec<f64> = (0..3000).map(|_| rng.gen_range(-0.5..1.5)).collect();
    let tree = KdTree::build(points, 2, 8, Some(&[1.0, 1.0])).unwrap();

    let base = QueryOptions::new().k(10).distance_upper_bound(0.02);
    let sequential = tree.query(&queries, 2, &base.clone().threads(1)).unwrap();
    let parallel = tree.query(&queries, 2, &base.clone().threads(4).chunk_size(10)).unwrap();
    assert_eq!(parallel, sequential);

    // A tight bound leaves some rows partially filled.
    assert!(sequential.indices().iter().any(|&i| i == tree.missing_index()));
}
