use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use ippcode_core::load_program;
use ippcode_vm::VM;
use serde_json::json;

/// A counting loop with one arithmetic op, one stack round trip and one
/// conditional jump per iteration.
fn loop_program(iterations: u32) -> String {
    let var = |name: &str| json!({"type": "var", "text": name});
    let int = |n: u32| json!({"type": "int", "text": n.to_string()});
    let label = json!({"type": "label", "text": "loop"});
    let body = vec![
        ("DEFVAR", vec![var("GF@i")]),
        ("DEFVAR", vec![var("GF@t")]),
        ("MOVE", vec![var("GF@i"), int(0)]),
        ("LABEL", vec![label.clone()]),
        ("ADD", vec![var("GF@i"), var("GF@i"), int(1)]),
        ("PUSHS", vec![var("GF@i")]),
        ("POPS", vec![var("GF@t")]),
        ("JUMPIFNEQ", vec![label, var("GF@i"), int(iterations)]),
    ];
    let instructions: Vec<_> = body
        .into_iter()
        .enumerate()
        .map(|(i, (opcode, args))| json!({"order": i + 1, "opcode": opcode, "args": args}))
        .collect();
    json!({"language": "IPPcode19", "instructions": instructions}).to_string()
}

fn dispatch_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("dispatch");

    for iterations in [100u32, 1_000, 10_000] {
        let source = loop_program(iterations);
        let program = load_program(&source).expect("load failed");

        // Execution only
        group.bench_with_input(
            BenchmarkId::new("execute", iterations),
            &program,
            |b, program| {
                b.iter(|| {
                    let mut vm = VM::new();
                    vm.load(program.clone());
                    black_box(vm.execute())
                });
            },
        );

        // Load + execute
        group.bench_with_input(
            BenchmarkId::new("load_and_execute", iterations),
            &source,
            |b, source| {
                b.iter(|| {
                    let program = load_program(black_box(source)).unwrap();
                    let mut vm = VM::new();
                    vm.load(program);
                    black_box(vm.execute())
                });
            },
        );
    }

    group.finish();
}

criterion_group!(benches, dispatch_benchmark);
criterion_main!(benches);
