//! Store, merge, dedup and relevance filtering over a results directory

use corpus_sieve::classify::{filter_relevant, parse_reply};
use corpus_sieve::dataset::merge_documents;
use corpus_sieve::dedup::{filter_duplicates, similarity_matrix, DropPolicy, SimilarityMethod};
use corpus_sieve::store::{RecordStore, SimilarityCache};
use corpus_sieve::{DatasetKey, DatasetKind, Record, RecordDocument, Stage};
use tempfile::tempdir;

fn article(url: &str, text: &str, tokens: &[&str]) -> Record {
    Record::new(url, url).with_text(text).with_tokens(tokens.iter().copied())
}

#[test]
fn test_legacy_url_field_is_read() {
    let dir = tempdir().unwrap();
    let store = RecordStore::new(dir.path());
    let key = DatasetKey::new(DatasetKind::Forum, Stage::Search, Some("환자 의견"));

    std::fs::write(
        store.path_for(&key),
        r#"{
            "keyword": "환자 의견",
            "items": [{ "url_naver": "https://kin.naver.com/qna/detail.naver?dirId=7&docId=1",
                        "title": "질문", "postdate": "20230314" }],
            "total": 1
        }"#,
    )
    .unwrap();

    let document = store.load(&key).unwrap();
    assert_eq!(document.len(), 1);
    assert_eq!(
        document.items[0].url,
        "https://kin.naver.com/qna/detail.naver?dirId=7&docId=1"
    );
    assert_eq!(document.items[0].extra["postdate"], "20230314");
    assert_eq!(document.extra["total"], 1);

    // unknown fields are written back; the legacy key is normalized to `url`
    store.save(&key, &document).unwrap();
    let raw = std::fs::read_to_string(store.path_for(&key)).unwrap();
    assert!(raw.contains("\"postdate\""));
    assert!(raw.contains("\"total\""));
    assert!(raw.contains("\"url\": \"https://kin.naver.com/qna/detail.naver?dirId=7&docId=1\""));
    assert!(!raw.contains("url_naver"));
}

#[test]
fn test_merge_dedup_and_filter() {
    let dir = tempdir().unwrap();
    let store = RecordStore::new(dir.path().join("results"));
    let cache = SimilarityCache::open(&dir.path().join("cache").join("similarity.db")).unwrap();

    let first = DatasetKey::new(DatasetKind::News, Stage::CrawlWithText, Some("환자 권리"));
    let second = DatasetKey::new(DatasetKind::News, Stage::CrawlWithText, Some("환자 참여"));
    store
        .save(
            &first,
            &RecordDocument::new(
                Some("환자 권리".into()),
                vec![
                    article("https://a.com/1", "짧은 기사", &["환자", "권리", "병원"]),
                    article("https://a.com/2", "스포츠", &["축구", "경기"]),
                ],
            ),
        )
        .unwrap();
    store
        .save(
            &second,
            &RecordDocument::new(
                Some("환자 참여".into()),
                vec![article(
                    "https://b.com/1",
                    "같은 사건을 다룬 조금 더 긴 기사",
                    &["환자", "권리", "병원"],
                )],
            ),
        )
        .unwrap();

    let parts = vec![
        (first.clone(), store.load(&first).unwrap()),
        (second.clone(), store.load(&second).unwrap()),
    ];
    let merged = merge_documents(parts);
    let processed = DatasetKey::new(DatasetKind::News, Stage::Processed, None);
    store.save(&processed, &merged).unwrap();

    let mut document = store.load(&processed).unwrap();
    assert_eq!(document.len(), 3);
    assert_eq!(document.items[2].keyword.as_deref(), Some("환자 참여"));

    let matrix = similarity_matrix(
        &cache,
        DatasetKind::News,
        &document.items,
        SimilarityMethod::Jaccard,
        false,
    )
    .unwrap();
    assert_eq!(matrix.get(0, 2), 1.0);

    let report = filter_duplicates(
        &mut document.items,
        &matrix,
        0.5,
        DropPolicy::for_kind(DatasetKind::News),
    );
    assert_eq!(report.before, 3);
    assert_eq!(report.after, 2);
    assert_eq!(report.removed, vec!["https://a.com/1".to_string()]);

    let unique = processed.at_stage(Stage::Unique);
    store.save(&unique, &document).unwrap();

    let document = store.load(&unique).unwrap();
    let judgements = vec![parse_reply("N\n이유: 스포츠"), parse_reply("Y\n이유: 환자 권리")];
    let related = filter_relevant(document, "환자 권리", &judgements);

    assert_eq!(related.keyword.as_deref(), Some("환자 권리"));
    assert_eq!(related.len(), 1);
    assert_eq!(related.items[0].url, "https://b.com/1");
    assert_eq!(related.extra["relatedness"], serde_json::json!([false, true]));
    assert_eq!(related.extra["reasons"], serde_json::json!(["스포츠", "환자 권리"]));
}

#[test]
fn test_cached_matrix_survives_reopen() {
    let dir = tempdir().unwrap();
    let db = dir.path().join("similarity.db");
    let records = vec![
        Record::new("https://kin.naver.com/qna/detail.naver?dirId=7&docId=1", "a"),
        Record::new("https://kin.naver.com/qna/detail.naver?docId=1&dirId=7", "b"),
    ];

    {
        let cache = SimilarityCache::open(&db).unwrap();
        similarity_matrix(&cache, DatasetKind::Forum, &records, SimilarityMethod::UrlIdentity, false)
            .unwrap();
    }

    let cache = SimilarityCache::open(&db).unwrap();
    let cached = cache
        .load(DatasetKind::Forum, SimilarityMethod::UrlIdentity)
        .unwrap()
        .expect("Matrix should be cached");
    assert_eq!(cached.matrix.size(), 2);
    assert_eq!(cached.matrix.get(0, 1), 1.0);

    let mut records = records;
    let report = filter_duplicates(
        &mut records,
        &cached.matrix,
        0.5,
        DropPolicy::for_kind(DatasetKind::Forum),
    );
    assert_eq!(report.after, 1);
    assert_eq!(records[0].title, "a");
}
