// Each test binary uses a subset of these helpers.
#![allow(dead_code)]

use affinage_core::{AffinityBuilder, AffinityKernel};

pub type TestResult = Result<(), Box<dyn std::error::Error>>;

pub fn kernel(max_distance: f64) -> AffinityKernel {
    AffinityBuilder::new(max_distance)
        .build()
        .expect("kernel configuration is valid")
}

/// Parses the body of a classic dendrogram file into `(parent, child0, child1)`.
pub fn dendrogram_lines(text: &str) -> Vec<(i64, i64, i64)> {
    text.lines()
        .skip(1)
        .map(|line| {
            let fields: Vec<i64> = line
                .split_whitespace()
                .take(3)
                .map(|token| token.parse().expect("integer field"))
                .collect();
            match fields.as_slice() {
                &[parent, first, second] => (parent, first, second),
                other => panic!("malformed dendrogram line {other:?}"),
            }
        })
        .collect()
}
