#![no_main]

use ctmon_accounting::EventParser;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let parser = EventParser::new();
    let line = String::from_utf8_lossy(data);

    // 크래시나 패닉 없이 Ok 또는 Err을 반환해야 한다
    if let Ok(flow) = parser.parse(&line) {
        // 합계는 포화 연산이므로 각 방향 값보다 작을 수 없다
        assert!(flow.total_packets() >= flow.original.packets);
        assert!(flow.total_bytes() >= flow.reply.bytes);
    }
});
