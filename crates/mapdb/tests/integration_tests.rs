//! 통합 테스트 -- 규칙 파일 로드부터 분류까지의 전체 흐름 검증

use std::net::Ipv4Addr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use spm_core::types::{MacAddr, NetworkLayer, PacketFields};
use spm_mapdb::{
    MapDb, PriorityDecision, Rule, RuleLoader, RuleRequest, RuleType, TableConfig, UpdateError,
    UpdateOutcome,
};

const RULES: &str = r#"
[[rules]]
id = 1
type = "mesh"
precedence = 10
output = 6
dscp = 46

[[rules]]
id = 2
type = "mesh"
precedence = 3
output = 2
always_true = true

[[rules]]
id = 10
type = "sawf"
precedence = 50
output = 5
protocol = 17
dst_port_range = [5000, 5100]
service_class_id = 7
dscp_remark = 40

[[rules]]
id = 20
type = "mscs"
mscs_tid_bitmap = 0x30
src_mac = "02:00:00:00:00:01"

[[rules]]
id = 30
type = "scs"
precedence = 100
output = 4
spi = 0x0000_1234
spi_mask = 0x0000_FFFF
"#;

fn udp(dscp: u8, dst_port: u16) -> PacketFields {
    PacketFields {
        src_mac: MacAddr::new([2, 0, 0, 0, 0, 1]),
        network: NetworkLayer::Ipv4 {
            src: Ipv4Addr::new(10, 0, 0, 1),
            dst: Ipv4Addr::new(10, 0, 0, 9),
        },
        protocol: 17,
        src_port: 40000,
        dst_port,
        dscp,
        ..Default::default()
    }
}

async fn loaded_table() -> MapDb {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("rules.toml");
    tokio::fs::write(&path, RULES).await.unwrap();

    let db = MapDb::default();
    let requests = RuleLoader::default().load_file(&path).await.unwrap();
    let results = db.load_requests(&requests);
    assert!(results.iter().all(|(_, r)| *r == Ok(UpdateOutcome::AddedNew)));
    db
}

/// 파일 로드 -> 각 분류 API 흐름 테스트
#[tokio::test]
async fn test_load_and_classify_flow() {
    let db = loaded_table().await;
    assert_eq!(db.count(), 5);

    // MESH: 높은 우선순위의 DSCP 규칙, 아니면 always_true 규칙
    assert_eq!(db.classify_mesh(&udp(46, 80)), 6);
    assert_eq!(db.classify_mesh(&udp(0, 80)), 2);

    // SAWF: 포트 범위 안에서만 매칭
    let hit = db.classify_sawf(&udp(0, 5050));
    assert_eq!(hit.rule_id, 10);
    assert_eq!(hit.service_class_id, 7);
    assert_eq!(hit.dscp_remark, 40);
    assert!(!db.classify_sawf(&udp(0, 6000)).is_match());

    // SCS: SPI 마스크 매칭
    let mut fields = udp(0, 80);
    fields.spi = 0xABCD_1234;
    assert_eq!(
        db.classify_scs(&fields),
        PriorityDecision {
            priority: 4,
            rule_id: 30
        }
    );

    // MSCS: TID 4, 5만 허용
    fields.priority = 5;
    assert_eq!(db.classify_mscs(&fields).rule_id, 20);
    fields.priority = 3;
    assert!(!db.classify_mscs(&fields).is_match());
}

/// 덤프는 높은 우선순위부터, 모든 살아 있는 규칙을 한 번씩
#[tokio::test]
async fn test_dump_matches_count_and_order() {
    let db = loaded_table().await;
    let rules: Vec<Rule> = db.dump().collect();
    assert_eq!(rules.len() as u32, db.count());

    let precedences: Vec<u8> = rules.iter().map(|r| r.precedence).collect();
    let mut sorted = precedences.clone();
    sorted.sort_unstable_by(|a, b| b.cmp(a));
    assert_eq!(precedences, sorted);
}

/// 덤프 JSON 직렬화
#[tokio::test]
async fn test_dump_serializes_to_json() {
    let db = loaded_table().await;
    let json = serde_json::to_value(db.query(10, RuleType::Sawf).unwrap()).unwrap();
    assert_eq!(json["rule_type"], "sawf");
    assert_eq!(json["precedence"], 50);
}

/// 우선순위 10 규칙과 3 규칙이 모두 매칭되면 항상 10이 이김
#[test]
fn test_precedence_ordering() {
    let db = MapDb::default();
    for (id, precedence, output) in [(1, 3, 1), (2, 10, 7)] {
        let rule = Rule::builder(id)
            .rule_type(RuleType::Mesh)
            .precedence(precedence)
            .mesh_protocol(17, false)
            .output(output)
            .build();
        db.apply(&RuleRequest::add(rule)).unwrap();
    }
    assert_eq!(db.classify_mesh(&udp(0, 80)), 7);

    // 높은 규칙을 낮은 버킷으로 옮기면 결과가 바뀜
    let moved = Rule::builder(2)
        .rule_type(RuleType::Mesh)
        .precedence(1)
        .mesh_protocol(17, false)
        .output(7)
        .build();
    db.apply(&RuleRequest::add(moved)).unwrap();
    assert_eq!(db.classify_mesh(&udp(0, 80)), 1);
}

/// 테이블 용량 초과
#[test]
fn test_rule_max_is_never_exceeded() {
    let db = MapDb::new(TableConfig {
        rule_max: 3,
        default_pcp: 0,
    });
    let results: Vec<_> = (0..5)
        .map(|id| db.apply(&RuleRequest::add(Rule::builder(id).build())))
        .collect();
    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 3);
    assert_eq!(results[4], Err(UpdateError::TableFull));
    assert_eq!(db.count(), 3);
}

/// 분류 중 writer가 같은 버킷에서 규칙을 이동/삭제해도 reader는 일관된 결과만 봄
#[test]
fn test_concurrent_readers_during_updates() {
    let db = Arc::new(MapDb::default());
    db.apply(&RuleRequest::add(
        Rule::builder(1)
            .rule_type(RuleType::Mesh)
            .precedence(0)
            .always_true()
            .output(1)
            .build(),
    ))
    .unwrap();

    let stop = AtomicBool::new(false);
    std::thread::scope(|s| {
        for _ in 0..4 {
            s.spawn(|| {
                let fields = udp(0, 80);
                while !stop.load(Ordering::Relaxed) {
                    let pcp = db.classify_mesh(&fields);
                    assert!(pcp == 1 || pcp == 6, "unexpected pcp {pcp}");
                }
            });
        }

        for round in 0..2_000u32 {
            let precedence = if round % 2 == 0 { 7 } else { 3 };
            let rule = Rule::builder(2)
                .rule_type(RuleType::Mesh)
                .precedence(precedence)
                .always_true()
                .output(6)
                .build();
            db.apply(&RuleRequest::add(rule)).unwrap();
            if round % 5 == 0 {
                db.apply(&RuleRequest::delete(2, RuleType::Mesh)).unwrap();
            }
        }
        stop.store(true, Ordering::Relaxed);
    });

    assert!(db.count() >= 1);
}

/// 여러 writer가 동시에 시도하면 일부는 WriterBusy로 거절되지만 상태는 일관됨
#[test]
fn test_concurrent_writers_keep_count_consistent() {
    let db = MapDb::new(TableConfig {
        rule_max: 10_000,
        default_pcp: 0,
    });

    let accepted: u32 = std::thread::scope(|s| {
        let handles: Vec<_> = (0..4u32)
            .map(|t| {
                let db = &db;
                s.spawn(move || {
                    let mut ok = 0u32;
                    for i in 0..500u32 {
                        let rule = Rule::builder(t * 1_000 + i).build();
                        match db.apply(&RuleRequest::add(rule)) {
                            Ok(_) => ok += 1,
                            Err(UpdateError::WriterBusy) => {}
                            Err(e) => panic!("unexpected error: {e}"),
                        }
                    }
                    ok
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).sum()
    });

    assert_eq!(db.count(), accepted);
    assert_eq!(db.dump().count() as u32, accepted);
}
