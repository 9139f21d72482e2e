use std::fs;

use gijigo::run_source;
use walkdir::WalkDir;

#[test]
fn demo_programs_work() {
    let mut count = 0;

    for entry in
        WalkDir::new("demos").into_iter()
                             .filter_map(Result::ok)
                             .filter(|e| e.path().extension().is_some_and(|ext| ext == "txt"))
    {
        let path = entry.path();
        let source =
            fs::read_to_string(path).unwrap_or_else(|e| panic!("Failed to read {path:?}: {e}"));

        let (program, _) = run_source(&source).unwrap_or_else(|e| {
                                                   panic!("Demo {path:?} failed:\n{source}\nError: {e}")
                                               });
        let store = program.main().store();

        for (name, expected) in extract_expectations(&source) {
            count += 1;
            let actual = store.get(&name)
                              .unwrap_or_else(|| panic!("Demo {path:?} left '{name}' unbound"));
            assert_eq!(actual.to_string(), expected, "'{name}' in {path:?}");
        }
    }

    assert!(count > 0, "No expectations found in demos");
}

fn extract_expectations(source: &str) -> Vec<(String, String)> {
    source.lines()
          .filter_map(|line| line.trim_start().strip_prefix("// expect:"))
          .filter_map(|rest| rest.split_once('='))
          .map(|(name, value)| (name.trim().to_string(), value.trim().to_string()))
          .collect()
}
