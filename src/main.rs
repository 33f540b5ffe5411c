//! Benchmark runner: times `multiply` across a few square sizes and prints
//! achieved GFLOPS per detected ISA tag.

use densekernel::{multiply, zeros, IsaTag};
use std::time::Instant;

fn main() {
    println!("=== densekernel multiply benchmark ===\n");
    println!("Detected ISA: {:?}\n", IsaTag::detect());

    let sizes = [256usize, 512, 1024];
    let iterations = 3;

    for &size in &sizes {
        let (m, n, p) = (size, size, size);
        let mut a = vec![0.0f64; m * n];
        let mut b = vec![0.0f64; n * p];
        zeros("bench", &mut a, m, n).unwrap();
        for (i, v) in a.iter_mut().enumerate() {
            *v = (i % 100) as f64;
        }
        zeros("bench", &mut b, n, p).unwrap();
        for (i, v) in b.iter_mut().enumerate() {
            *v = (i % 100) as f64;
        }

        let mut total = 0.0f64;
        for _ in 0..iterations {
            let mut c = vec![0.0f64; m * p];
            let start = Instant::now();
            multiply("multiply", &a, &b, &mut c, m, n, p).unwrap();
            total += start.elapsed().as_secs_f64();
        }
        let avg = total / iterations as f64;
        let gflops = 2.0 * (m * n * p) as f64 / avg / 1e9;
        println!("{size}x{size}: {:.2} ms  {:.2} GFLOPS", avg * 1000.0, gflops);
    }
}
