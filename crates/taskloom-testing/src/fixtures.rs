//! Fixture Suites/Tasks for exercising the benchmark runner without a real
//! task corpus, grounded on `agtrace-testing::fixtures`'s sample-data role.

use std::collections::HashMap;

use taskloom_types::{Suite, Task, VerificationDirective};

/// A one-task suite whose verification is satisfied by a setup file alone —
/// useful for exercising the runner's plumbing without any real agent work.
pub fn trivial_suite() -> Suite {
    Suite {
        name: "fixture-smoke".to_string(),
        version: "1.0.0".to_string(),
        description: Some("Single pre-satisfied task for runner smoke tests".to_string()),
        source_repo: None,
        tasks: vec![hello_world_task()],
    }
}

pub fn hello_world_task() -> Task {
    Task {
        id: "hello-world".to_string(),
        name: "Write hello.txt".to_string(),
        description: "Create hello.txt containing exactly 'hi'".to_string(),
        difficulty: Some("trivial".to_string()),
        category: Some("filesystem".to_string()),
        timeout_seconds: 30,
        max_turns: 5,
        verification: VerificationDirective::Output {
            command: "cat hello.txt".to_string(),
            expected: "hi".to_string(),
        },
        setup_files: HashMap::from([("hello.txt".to_string(), "hi".to_string())]),
        setup_commands: vec![],
        source_path: None,
    }
}

/// A task whose verification is guaranteed to fail, for exercising the
/// runner's failure/timeout classification paths.
pub fn unsatisfiable_task() -> Task {
    Task {
        id: "unsatisfiable".to_string(),
        name: "Impossible task".to_string(),
        description: "Verification always fails".to_string(),
        difficulty: None,
        category: None,
        timeout_seconds: 30,
        max_turns: 3,
        verification: VerificationDirective::Custom {
            script: "false".to_string(),
        },
        setup_files: HashMap::new(),
        setup_commands: vec![],
        source_path: None,
    }
}
