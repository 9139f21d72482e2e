use std::fs;

use gijigo::{
    engine::step::StepOutcome,
    error::{Error, RuntimeError},
    interpreter::value::core::Value,
    manager::{Manager, ManagerConfig},
    program::Program,
};

const SOURCE: &str = "\
○整数型の配列: squares(整数型: n)
    整数型の配列: out ← {}
    for (i を 1 から n まで)
        outの末尾に i * i を追加する
    endfor
    return out
整数型の配列: s ← squares(4)
整数型: total ← 0
for (k を 1 から sの要素数 まで)
    total ← total + s[k]
endfor
";

#[test]
fn reloaded_programs_finish_with_the_same_bindings() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("program.json");

    let mut original = Program::compile(SOURCE).unwrap();
    fs::write(&path, original.to_json().unwrap()).unwrap();
    let mut reloaded = Program::from_json(&fs::read_to_string(&path).unwrap()).unwrap();

    original.run().unwrap();
    reloaded.run().unwrap();
    assert_eq!(original.main().store(), reloaded.main().store());
    assert_eq!(original.main().store().get("total"), Some(&Value::Integer(30)));
}

#[test]
fn records_are_stable_across_reloads() {
    let program = Program::compile(SOURCE).unwrap();
    let record = program.to_record().unwrap();
    let reloaded = Program::from_record(record.clone()).unwrap();
    assert_eq!(reloaded.to_record().unwrap(), record);
}

#[test]
fn stepping_survives_save_and_restore() {
    let dir = tempfile::tempdir().unwrap();
    let record = dir.path().join("execution_info.json");

    let mut program = Program::compile(SOURCE).unwrap();
    let mut entered = false;
    for _ in 0..6 {
        entered |= matches!(program.step().unwrap(), StepOutcome::EnteredCall { .. });
    }
    assert!(entered);
    fs::write(&record, program.to_json().unwrap()).unwrap();

    let mut manager = Manager::new(ManagerConfig { record_path: record });
    manager.restore(None).unwrap();
    assert_eq!(manager.program().and_then(Program::position), program.position());

    let result = manager.run_all().unwrap();
    assert_eq!(result, None);
    let total = manager.program().and_then(|p| p.bindings(None)).and_then(|s| s.get("total"));
    assert_eq!(total, Some(&Value::Integer(30)));
}

#[test]
fn malformed_records_are_rejected() {
    assert!(matches!(Program::from_json("{\"main\": 3}"), Err(Error::Record(_))));

    let mut record = Program::compile(SOURCE).unwrap().to_record().unwrap();
    record["main"]["init_state"] = "nowhere".into();
    assert!(Program::from_record(record).is_err());
}

#[test]
fn growing_reals_stop_before_they_cannot_be_saved() {
    let source = "実数型: x ← 10.0\nwhile (x > 0)\n    x ← x * x\nendwhile\n";
    assert!(matches!(gijigo::run_source(source),
                     Err(Error::Runtime(RuntimeError::Overflow { line: 3 }))));

    let mut program = Program::compile(source).unwrap();
    let error = loop {
        if let Err(error) = program.step() {
            break error;
        }
    };
    assert_eq!(error, RuntimeError::Overflow { line: 3 });

    let before = program.bindings(None).and_then(|s| s.get("x")).cloned();
    assert!(matches!(before, Some(Value::Real(x)) if x.is_finite() && x > 1e255));
    let reloaded = Program::from_json(&program.to_json().unwrap()).unwrap();
    assert_eq!(reloaded.bindings(None).and_then(|s| s.get("x")), before.as_ref());
}
