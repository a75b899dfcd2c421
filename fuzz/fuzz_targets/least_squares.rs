#![no_main]

use libfuzzer_sys::fuzz_target;
use veredicto::linalg::solve_least_squares;
use veredicto::math::incomplete_beta;

fuzz_target!(|data: &[u8]| {
    // Interpret the bytes as f64 values and build a 3-column design matrix
    let values: Vec<f64> = data
        .chunks_exact(8)
        .map(|chunk| {
            let mut bytes = [0u8; 8];
            bytes.copy_from_slice(chunk);
            f64::from_le_bytes(bytes)
        })
        .collect();

    if values.len() >= 3 {
        let _ = incomplete_beta(values[0], values[1].abs(), values[2].abs());
    }

    let rows: Vec<Vec<f64>> = values.chunks_exact(4).map(|c| vec![1.0, c[0], c[1]]).collect();
    let response: Vec<f64> = values.chunks_exact(4).map(|c| c[2]).collect();

    // Singular or non-finite systems must come back as errors, never panics
    let _ = solve_least_squares(&rows, &response);
});
