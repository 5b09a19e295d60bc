use ossprint_core::{
    fingerprint_content, fingerprint_file, md5_hex, record_to_wfp, RequestAssembler, ScanRequestBatch,
    WinnowConfig,
};
use proptest::prelude::*;

fn small_config(gram: usize, window: usize) -> WinnowConfig {
    WinnowConfig { gram, window, min_file_size: 0, ..WinnowConfig::default() }
}

/// 由少量字符组成的文本，容易产生重复 gram 与并列最小值
fn texty() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(prop::sample::select(b"ab{}(); \t\n\r".to_vec()), 0..600)
}

proptest! {
    #[test]
    fn shorter_than_one_gram_is_empty(data in prop::collection::vec(any::<u8>(), 0..30)) {
        prop_assert!(fingerprint_content(&data, &WinnowConfig::default()).is_empty());
    }

    #[test]
    fn lines_never_decrease_and_neighbours_differ(
        data in texty(),
        gram in 1usize..8,
        window in 1usize..12,
    ) {
        let fp = fingerprint_content(&data, &small_config(gram, window));
        for pair in fp.snippets().windows(2) {
            prop_assert!(pair[0].line <= pair[1].line);
            prop_assert_ne!(pair[0], pair[1]);
        }
    }

    #[test]
    fn fingerprinting_is_deterministic(data in prop::collection::vec(any::<u8>(), 0..2048)) {
        let cfg = small_config(30, 64);
        prop_assert_eq!(fingerprint_content(&data, &cfg), fingerprint_content(&data, &cfg));
        let a = fingerprint_file("x.c", &data, &WinnowConfig::default());
        let b = fingerprint_file("x.c", &data, &WinnowConfig::default());
        prop_assert_eq!(a, b);
    }

    #[test]
    fn horizontal_whitespace_does_not_matter(
        tokens in prop::collection::vec("[a-z0-9_(){};=+]{1,12}", 1..120),
        gaps in prop::collection::vec(prop::sample::select(vec![" ", "  ", "\t", " \t ", "\x0b", "\x0c"]), 120),
    ) {
        let tight = tokens.join(" ");
        let mut loose = String::new();
        for (i, token) in tokens.iter().enumerate() {
            loose.push_str(token);
            loose.push_str(gaps[i]);
        }
        let cfg = small_config(30, 64);
        prop_assert_eq!(
            fingerprint_content(tight.as_bytes(), &cfg),
            fingerprint_content(loose.as_bytes(), &cfg)
        );
        if tight != loose {
            prop_assert_ne!(md5_hex(tight.as_bytes()), md5_hex(loose.as_bytes()));
        }
    }

    #[test]
    fn batches_respect_limit_and_order(
        docs in prop::collection::vec(texty(), 1..40),
        limit in 64usize..2048,
    ) {
        let cfg = small_config(4, 4);
        let records: Vec<_> = docs
            .iter()
            .enumerate()
            .map(|(i, d)| fingerprint_file(&format!("dir/{i}.c"), d, &cfg))
            .collect();
        let expected: String = records.iter().map(record_to_wfp).collect();

        let mut asm = RequestAssembler::new(limit);
        let mut out: Vec<ScanRequestBatch> = Vec::new();
        for r in records {
            asm.push(r, &mut out).unwrap();
        }
        asm.finish(&mut out).unwrap();

        for batch in &out {
            prop_assert!(batch.records() > 0);
            if batch.is_oversized() {
                prop_assert_eq!(batch.records(), 1);
                prop_assert!(batch.size() > limit);
            } else {
                prop_assert!(batch.size() <= limit);
            }
        }
        let joined: String = out.iter().map(|b| b.payload()).collect();
        prop_assert_eq!(joined, expected);
    }
}
