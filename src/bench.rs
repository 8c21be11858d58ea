//! Simple performance benchmarks for jsrt
//!
//! Run with: cargo run --release --bin jsrt-bench

use jsrt::{
    config::{BENCHMARK_LOOP_ITERATIONS, BENCHMARK_REPETITIONS},
    lexer, parser, Engine,
};
use std::time::{Duration, Instant};

const ERROR_HANDLING_SPEC: &str = include_str!("../specs/errorHandlingSpec.js");

fn main() {
    println!("\njsrt Performance Benchmarks");
    println!("===========================\n");

    bench_front_end();
    bench_evaluation();
    bench_exceptions();
    bench_specs();

    println!("\n✅ All benchmarks completed\n");
}

/// Time a single operation and print the result
fn time_operation<F, R>(name: &str, mut f: F) -> (Duration, R)
where
    F: FnMut() -> R,
{
    let start = Instant::now();
    let result = f();
    let duration = start.elapsed();
    println!(
        "  {:<40} {:>12.3} ms",
        format!("{}:", name),
        duration.as_secs_f64() * 1000.0
    );
    (duration, result)
}

/// Time an operation multiple times and report average
fn time_operation_avg<F>(name: &str, iterations: usize, mut f: F) -> Duration
where
    F: FnMut(),
{
    let start = Instant::now();
    for _ in 0..iterations {
        f();
    }
    let total = start.elapsed();
    let avg = total / iterations as u32;
    println!(
        "  {:<40} {:>12.3} ms (avg of {} runs)",
        format!("{}:", name),
        avg.as_secs_f64() * 1000.0,
        iterations
    );
    avg
}

/// A script exercising closures, arrays, objects and string building.
fn workload_script(iterations: usize) -> String {
    format!(
        r#"
        function Counter(start) {{ this.value = start; }}
        Counter.prototype.bump = function(by) {{ this.value += by; return this; }};
        var counter = new Counter(0);
        var items = [];
        for (var i = 0; i < {iterations}; i++) {{
            counter.bump(i % 7);
            if (i % 100 === 0) {{ items.push({{ index: i, label: "item" + i }}); }}
        }}
        var labels = items.map(function(item) {{ return item.label; }}).join(",");
        JSON.stringify({{ total: counter.value, count: items.length, size: labels.length }});
        "#
    )
}

fn bench_front_end() {
    println!("Front end");
    println!("---------");

    let source = workload_script(BENCHMARK_LOOP_ITERATIONS).repeat(50);
    time_operation_avg(
        &format!("Tokenize {} KB", source.len() / 1024),
        BENCHMARK_REPETITIONS,
        || {
            let _ = lexer::tokenize(&source).unwrap();
        },
    );
    time_operation_avg(
        &format!("Parse {} KB", source.len() / 1024),
        BENCHMARK_REPETITIONS,
        || {
            let _ = parser::parse(&source).unwrap();
        },
    );

    println!();
}

fn bench_evaluation() {
    println!("Evaluation");
    println!("----------");

    let source = workload_script(BENCHMARK_LOOP_ITERATIONS);
    let (_, value) = time_operation("First run (fresh realm)", || {
        Engine::new().eval(&source).unwrap()
    });
    println!("  result: {:?}", value);

    time_operation_avg(
        &format!("Loop of {} iterations", BENCHMARK_LOOP_ITERATIONS),
        BENCHMARK_REPETITIONS,
        || {
            let _ = Engine::new().eval(&source).unwrap();
        },
    );

    let recursion = "function fib(n) { return n < 2 ? n : fib(n - 1) + fib(n - 2); } fib(20);";
    time_operation_avg("Recursive fib(20)", BENCHMARK_REPETITIONS, || {
        let _ = Engine::new().eval(recursion).unwrap();
    });

    println!();
}

fn bench_exceptions() {
    println!("Exceptions");
    println!("----------");

    let source = format!(
        r#"
        var caught = 0;
        for (var i = 0; i < {}; i++) {{
            try {{ var foo = {{}}; foo.bar.foobar(); }} catch (e) {{ caught++; }}
        }}
        caught;
        "#,
        BENCHMARK_LOOP_ITERATIONS
    );
    time_operation_avg(
        &format!("Throw/catch {} TypeErrors", BENCHMARK_LOOP_ITERATIONS),
        BENCHMARK_REPETITIONS,
        || {
            let _ = Engine::new().eval(&source).unwrap();
        },
    );

    time_operation_avg("Uncaught error outcome", BENCHMARK_REPETITIONS, || {
        let outcome = Engine::new()
            .try_eval("var foo = {}; foo.bar.foobar();")
            .unwrap();
        assert!(outcome.message_contains("foobar"));
    });

    println!();
}

fn bench_specs() {
    println!("Spec runner");
    println!("-----------");

    let (_, report) = time_operation("errorHandlingSpec.js", || {
        Engine::new().run_specs(ERROR_HANDLING_SPEC).unwrap()
    });
    println!(
        "  {} passed, {} failed",
        report.passed(),
        report.failed()
    );

    time_operation_avg("errorHandlingSpec.js", BENCHMARK_REPETITIONS, || {
        let _ = Engine::new().run_specs(ERROR_HANDLING_SPEC).unwrap();
    });

    println!();
}
