#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;

use spm_core::types::PacketFields;
use spm_mapdb::{MapDb, Rule, RuleCommand, RuleRequest, RuleType, TableConfig};

#[derive(Arbitrary, Debug)]
struct FuzzOp {
    command: u8,
    id: u8,
    rule_type: u8,
    precedence: u8,
    output: u8,
}

fuzz_target!(|ops: Vec<FuzzOp>| {
    let db = MapDb::new(TableConfig {
        rule_max: 16,
        default_pcp: 0,
    });

    for op in ops.iter().take(256) {
        let rule_type = RuleType::ALL[usize::from(op.rule_type) % RuleType::ALL.len()];
        let rule = Rule::builder(u32::from(op.id % 32))
            .rule_type(rule_type)
            .precedence(op.precedence)
            .output(op.output)
            .always_true()
            .build();
        let request = RuleRequest {
            command: RuleCommand::from_code(op.command % 3),
            rule,
        };
        let _ = db.apply(&request);

        assert!(db.count() <= 16);
        assert_eq!(db.dump().count() as u32, db.count());
    }

    // 분류는 어떤 테이블 상태에서도 실패하지 않아야 함
    let fields = PacketFields::default();
    let _ = db.classify_mesh(&fields);
    let _ = db.classify_sawf(&fields);
    let _ = db.classify_scs(&fields);
    let _ = db.classify_mscs(&fields);
    let _ = db.get_latency_params(&fields);
});
