#![no_main]

use libfuzzer_sys::fuzz_target;
use spm_mapdb::{MapDb, RuleLoader};

fuzz_target!(|data: &[u8]| {
    // TOML 파서는 &str을 받으므로 UTF-8 변환 필요
    if let Ok(toml_str) = std::str::from_utf8(data) {
        let loader = RuleLoader::new(64);
        if let Ok(requests) = loader.parse_toml(toml_str, "fuzz-input.toml") {
            // 검증을 통과한 요청은 테이블 불변식을 깨지 않아야 함
            let db = MapDb::default();
            let _ = db.load_requests(&requests);
            assert_eq!(db.dump().count() as u32, db.count());
        }
    }
});
