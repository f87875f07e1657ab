use criterion::{black_box, criterion_group, criterion_main, Criterion};
use weavetree::mdp::compile_yaml_str;
use weavetree::search::{ReturnType, SearchConfig, SearchTree};
use weavetree::simulator::MdpSimulator;

const BRANCHING_YAML: &str = r#"
start: s0
states:
  - id: s0
    actions:
      - id: a0
        outcomes:
          - next: s1
            prob: 0.5
            reward: 0.0
          - next: s2
            prob: 0.5
            reward: 1.0
      - id: a1
        outcomes:
          - next: s2
            prob: 0.5
            reward: 0.0
          - next: s3
            prob: 0.5
            reward: 2.0
  - id: s1
    actions:
      - id: a0
        outcomes:
          - next: s4
            prob: 1.0
            reward: 0.0
  - id: s2
    actions:
      - id: a0
        outcomes:
          - next: s4
            prob: 1.0
            reward: 0.0
  - id: s3
    actions:
      - id: a0
        outcomes:
          - next: s4
            prob: 1.0
            reward: 0.0
  - id: s4
    terminal: true
"#;

fn mcts_search() {
    let compiled = compile_yaml_str(BRANCHING_YAML).expect("benchmark document must compile");
    let mut sim = MdpSimulator::new(compiled.clone(), 123);
    let start = compiled.start_state_key();
    let mut tree = SearchTree::new(start, compiled.is_terminal(start));
    let config = SearchConfig {
        iterations: 500,
        c: 1.4,
        gamma: 1.0,
        max_steps: 10,
        return_type: ReturnType::Discounted,
        fixed_horizon_steps: None,
    };
    tree.run(&mut sim, &config, None, None)
        .expect("benchmark search must not error");
}

fn criterion_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("mcts-search");
    group.sample_size(20);
    group.bench_function("mcts-search", |b| b.iter(|| black_box(mcts_search())));
    group.finish();
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
