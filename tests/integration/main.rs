//! Integration tests for filecache

mod memoize_tests {
    use filecache::{Args, CacheError, FileCache, Lookup, MemoizeError, Unkeyed};
    use filetime::{set_file_mtime, FileTime};
    use std::convert::Infallible;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;
    use std::time::Duration;
    use tempfile::TempDir;

    /// Counting operation: returns how many times it has run
    fn counter() -> (Arc<AtomicU32>, impl Fn((u32,)) -> Result<u32, Infallible>) {
        let count = Arc::new(AtomicU32::new(0));
        let inner = Arc::clone(&count);
        let op = move |(_n,): (u32,)| Ok(inner.fetch_add(1, Ordering::SeqCst) + 1);
        (count, op)
    }

    #[test]
    fn memoizes_identical_calls() {
        let temp = TempDir::new().unwrap();
        let cache = FileCache::open(temp.path()).unwrap();
        let (count, op) = counter();
        let f = cache.wrap("f", op);

        let first = f.call((5,)).unwrap();
        let second = f.call((5,)).unwrap();

        assert_eq!(first, second);
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn distinct_arguments_compute_independently() {
        let temp = TempDir::new().unwrap();
        let cache = FileCache::open(temp.path()).unwrap();
        let (count, op) = counter();
        let f = cache.wrap("f", op);

        let five = f.call((5,)).unwrap();
        let six = f.call((6,)).unwrap();

        assert_ne!(five, six);
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn survives_reopening() {
        let temp = TempDir::new().unwrap();
        let (count, op) = counter();
        {
            let cache = FileCache::open(temp.path()).unwrap();
            cache.wrap("f", &op).call((1,)).unwrap();
        }

        let cache = FileCache::open(temp.path()).unwrap();
        assert_eq!(cache.wrap("f", &op).call((1,)).unwrap(), 1);
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn identities_do_not_collide() {
        let temp = TempDir::new().unwrap();
        let cache = FileCache::open(temp.path()).unwrap();
        let double = cache.wrap("double", |(n,): (u32,)| Ok::<_, Infallible>(n * 2));
        let triple = cache.wrap("triple", |(n,): (u32,)| Ok::<_, Infallible>(n * 3));

        assert_eq!(double.call((4,)).unwrap(), 8);
        assert_eq!(triple.call((4,)).unwrap(), 12);
        assert_eq!(cache.list_entries().unwrap().len(), 2);
    }

    #[test]
    fn failure_then_retry() {
        let temp = TempDir::new().unwrap();
        let cache = FileCache::open(temp.path()).unwrap();
        let attempts = AtomicU32::new(0);
        let f = cache.wrap("f", |(n,): (u32,)| {
            if attempts.fetch_add(1, Ordering::SeqCst) == 0 {
                Err(std::io::Error::other("transient"))
            } else {
                Ok(n)
            }
        });

        match f.call((9,)) {
            Err(MemoizeError::Operation(e)) => assert_eq!(e.to_string(), "transient"),
            other => panic!("expected operation error, got {:?}", other),
        }
        assert!(cache.list_entries().unwrap().is_empty());

        assert_eq!(f.call((9,)).unwrap(), 9);
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
        assert_eq!(cache.list_entries().unwrap().len(), 1);
    }

    #[test]
    fn excluded_first_argument() {
        struct Database {
            _url: String,
        }

        let temp = TempDir::new().unwrap();
        let cache = FileCache::open(temp.path()).unwrap();
        let lookup = cache
            .wrap("lookup", |(_db, id): (Unkeyed<&Database>, u64)| {
                Ok::<_, Infallible>(format!("row {}", id))
            })
            .exclude_first(true);

        let primary = Database {
            _url: "postgres://primary".into(),
        };
        let replica = Database {
            _url: "postgres://replica".into(),
        };

        assert_eq!(
            lookup.record_name(&(Unkeyed(&primary), 7)).unwrap(),
            lookup.record_name(&(Unkeyed(&replica), 7)).unwrap()
        );
        assert_ne!(
            lookup.record_name(&(Unkeyed(&primary), 7)).unwrap(),
            lookup.record_name(&(Unkeyed(&primary), 8)).unwrap()
        );
    }

    #[test]
    fn named_argument_order_is_irrelevant() {
        let temp = TempDir::new().unwrap();
        let cache = FileCache::open(temp.path()).unwrap();
        let f = cache.wrap("f", |args: Args| Ok::<_, Infallible>(args.named_values().len()));

        let xy = Args::new().named("x", &1).unwrap().named("y", &2).unwrap();
        let yx = Args::new().named("y", &2).unwrap().named("x", &1).unwrap();
        assert_eq!(f.record_name(&xy).unwrap(), f.record_name(&yx).unwrap());
    }

    #[test]
    fn listing_round_trip() {
        let temp = TempDir::new().unwrap();
        let cache = FileCache::open(temp.path()).unwrap();

        cache.store("k", &vec![1.5, 2.5]).unwrap();
        assert!(cache.list_entries().unwrap().contains("k"));
        assert_eq!(cache.load::<Vec<f64>>("k").unwrap(), vec![1.5, 2.5]);

        cache.remove("k").unwrap();
        assert!(!cache.list_entries().unwrap().contains("k"));

        cache.store("k", &1).unwrap();
        cache.clear(None).unwrap();
        assert!(!cache.list_entries().unwrap().contains("k"));
    }

    #[test]
    fn eviction_by_date() {
        let temp = TempDir::new().unwrap();
        let cache = FileCache::open(temp.path()).unwrap();
        let cutoff_date = chrono::NaiveDate::from_ymd_opt(2025, 1, 10).unwrap();
        let cutoff = filecache::cache::local_midnight(cutoff_date).unwrap();

        for (name, at) in [
            ("t1", cutoff - Duration::from_secs(86_400)),
            ("t2", cutoff + Duration::from_secs(86_400)),
        ] {
            cache.store(name, &name).unwrap();
            let path = cache.records().record_path(name).unwrap();
            set_file_mtime(path, FileTime::from_system_time(at)).unwrap();
        }

        let removed = cache.clear(Some(cutoff_date)).unwrap();
        assert_eq!(removed, vec!["t1".to_string()]);
        assert_eq!(
            cache.list_entries().unwrap().into_iter().collect::<Vec<_>>(),
            vec!["t2".to_string()]
        );

        cache.clear(None).unwrap();
        assert!(cache.list_entries().unwrap().is_empty());
    }

    #[test]
    fn eviction_forces_recompute() {
        let temp = TempDir::new().unwrap();
        let cache = FileCache::open(temp.path()).unwrap();
        let (count, op) = counter();
        let f = cache.wrap("f", op);

        f.call((1,)).unwrap();
        cache.clear(None).unwrap();
        f.call((1,)).unwrap();

        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn listing_lookup_from_cache_handle() {
        let temp = TempDir::new().unwrap();
        let cache = FileCache::open(temp.path())
            .unwrap()
            .with_lookup(Lookup::Listing);
        let (count, op) = counter();
        let f = cache.wrap("f", op);

        f.call((3,)).unwrap();
        f.call((3,)).unwrap();
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn shared_across_threads() {
        let temp = TempDir::new().unwrap();
        let cache = FileCache::open(temp.path()).unwrap();
        let (count, op) = counter();
        let f = Arc::new(cache.wrap("f", op));

        // Warm the record first so every thread hits
        f.call((42,)).unwrap();

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let f = Arc::clone(&f);
                std::thread::spawn(move || f.call((42,)).unwrap())
            })
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap(), 1);
        }
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn load_missing_record() {
        let temp = TempDir::new().unwrap();
        let cache = FileCache::open(temp.path()).unwrap();
        assert!(matches!(
            cache.load::<u32>("absent"),
            Err(CacheError::NotFound(_))
        ));
    }
}

mod fingerprint_props {
    use filecache::cache::derive;
    use proptest::prelude::*;
    use serde_json::{Map, Value};

    fn arb_scalar() -> impl Strategy<Value = Value> {
        prop_oneof![
            Just(Value::Null),
            any::<bool>().prop_map(Value::Bool),
            any::<i64>().prop_map(Value::from),
            "[a-zA-Z0-9 éü😀]{0,12}".prop_map(Value::String),
        ]
    }

    proptest! {
        #[test]
        fn named_insertion_order_is_irrelevant(
            entries in proptest::collection::btree_map("[a-z]{1,6}", arb_scalar(), 0..8)
        ) {
            let forward: Map<String, Value> = entries.clone().into_iter().collect();
            let backward: Map<String, Value> = entries.into_iter().rev().collect();
            prop_assert_eq!(derive(&[], &forward), derive(&[], &backward));
        }

        #[test]
        fn derivation_is_deterministic(
            positional in proptest::collection::vec(arb_scalar(), 0..6)
        ) {
            let a = derive(&positional, &Map::new());
            let b = derive(&positional.clone(), &Map::new());
            prop_assert_eq!(a.as_str().len(), 64);
            prop_assert_eq!(a, b);
        }

        #[test]
        fn distinct_integers_have_distinct_fingerprints(x in any::<i64>(), y in any::<i64>()) {
            prop_assume!(x != y);
            prop_assert_ne!(
                derive(&[Value::from(x)], &Map::new()),
                derive(&[Value::from(y)], &Map::new())
            );
        }
    }
}

mod record_props {
    use filecache::FileCache;
    use proptest::collection::{btree_map, vec};
    use proptest::option;
    use proptest::prelude::*;
    use std::collections::BTreeMap;
    use std::convert::Infallible;
    use tempfile::TempDir;

    fn fresh_cache() -> (FileCache, TempDir) {
        let temp = TempDir::new().unwrap();
        let cache = FileCache::open(temp.path()).unwrap();
        (cache, temp)
    }

    proptest! {
        #[test]
        fn stored_floats_read_back_exactly(x in proptest::num::f64::ANY) {
            let (cache, _temp) = fresh_cache();
            match cache.store("x", &x) {
                Ok(()) => {
                    prop_assert!(x.is_finite());
                    prop_assert_eq!(cache.load::<f64>("x").unwrap().to_bits(), x.to_bits());
                }
                Err(e) => {
                    prop_assert!(!x.is_finite());
                    prop_assert!(e.is_storage());
                    prop_assert!(cache.list_entries().unwrap().is_empty());
                }
            }
        }

        #[test]
        fn memoized_floats_are_stable(x in proptest::num::f64::ANY) {
            let (cache, _temp) = fresh_cache();
            let op = cache.wrap("constant", |(_n,): (u8,)| Ok::<_, Infallible>(x));

            let first = op.call((0,)).unwrap();
            let second = op.call((0,)).unwrap();
            prop_assert_eq!(first.to_bits(), x.to_bits());
            prop_assert_eq!(second.to_bits(), x.to_bits());
        }

        #[test]
        fn nested_options_never_change(v in option::of(option::of(any::<i32>()))) {
            let (cache, _temp) = fresh_cache();
            match cache.store("v", &v) {
                Ok(()) => prop_assert_eq!(cache.load::<Option<Option<i32>>>("v").unwrap(), v),
                Err(_) => prop_assert_eq!(v, Some(None)),
            }

            let op = cache.wrap("constant", |(_n,): (u8,)| Ok::<_, Infallible>(v));
            prop_assert_eq!(op.call((0,)).unwrap(), v);
            prop_assert_eq!(op.call((0,)).unwrap(), v);
        }

        #[test]
        fn nested_maps_read_back(
            m in btree_map("[a-z]{1,5}", vec(option::of(-1e9f64..1e9), 0..4), 0..5)
        ) {
            let (cache, _temp) = fresh_cache();
            cache.store("m", &m).unwrap();
            prop_assert_eq!(cache.load::<BTreeMap<String, Vec<Option<f64>>>>("m").unwrap(), m);
        }
    }
}

mod cli_tests {
    use assert_cmd::{cargo::cargo_bin_cmd, Command};
    use filecache::FileCache;
    use predicates::prelude::*;
    use std::convert::Infallible;
    use tempfile::TempDir;

    fn filecache(dir: &TempDir) -> Command {
        let mut cmd = cargo_bin_cmd!("filecache");
        cmd.env("FILECACHE_DIR", dir.path())
            .env("FILECACHE_CONFIG", dir.path().join("config.toml"))
            .env_remove("RUST_LOG");
        cmd
    }

    #[test]
    fn help_displays() {
        let temp = TempDir::new().unwrap();
        filecache(&temp)
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("memoization cache"));
    }

    #[test]
    fn version_displays() {
        let temp = TempDir::new().unwrap();
        filecache(&temp)
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("filecache"));
    }

    #[test]
    fn list_empty() {
        let temp = TempDir::new().unwrap();
        filecache(&temp)
            .arg("list")
            .assert()
            .success()
            .stdout(predicate::str::contains("No cached records"));
    }

    #[test]
    fn list_shows_memoized_records() {
        let temp = TempDir::new().unwrap();
        let cache = FileCache::open(temp.path()).unwrap();
        let square = cache.wrap("square", |(n,): (u64,)| Ok::<_, Infallible>(n * n));
        square.call((5,)).unwrap();
        let name = square.record_name(&(5,)).unwrap();

        filecache(&temp)
            .args(["list", "--format", "plain"])
            .assert()
            .success()
            .stdout(predicate::str::diff(format!("{}\n", name)));

        filecache(&temp)
            .args(["list", "--format", "json"])
            .assert()
            .success()
            .stdout(predicate::str::contains(name.as_str()));
    }

    #[test]
    fn show_record_value() {
        let temp = TempDir::new().unwrap();
        let cache = FileCache::open(temp.path()).unwrap();
        cache.store("greeting", &"hello").unwrap();

        filecache(&temp)
            .args(["show", "greeting", "--value-only"])
            .assert()
            .success()
            .stdout(predicate::str::diff("\"hello\"\n"));

        filecache(&temp)
            .args(["show", "greeting"])
            .assert()
            .success()
            .stdout(predicate::str::contains("\"format\": \"filecache\""));
    }

    #[test]
    fn show_missing_record() {
        let temp = TempDir::new().unwrap();
        filecache(&temp)
            .args(["show", "nonexistent"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Cache record not found"));
    }

    #[test]
    fn remove_record() {
        let temp = TempDir::new().unwrap();
        let cache = FileCache::open(temp.path()).unwrap();
        cache.store("doomed", &1).unwrap();

        filecache(&temp)
            .args(["remove", "doomed", "never-existed"])
            .assert()
            .success()
            .stdout(predicate::str::contains("removed doomed"))
            .stdout(predicate::str::contains("never-existed (not present)"));

        assert!(!cache.contains("doomed").unwrap());
    }

    #[test]
    fn clear_dry_run_keeps_records() {
        let temp = TempDir::new().unwrap();
        let cache = FileCache::open(temp.path()).unwrap();
        cache.store("a", &1).unwrap();

        filecache(&temp)
            .args(["clear", "--dry-run"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Dry run"));

        assert!(cache.contains("a").unwrap());
    }

    #[test]
    fn clear_with_yes() {
        let temp = TempDir::new().unwrap();
        let cache = FileCache::open(temp.path()).unwrap();
        cache.store("a", &1).unwrap();
        cache.store("b", &2).unwrap();

        filecache(&temp)
            .args(["clear", "--yes"])
            .assert()
            .success()
            .stdout(predicate::str::contains("removed 2 record(s)"));

        assert!(cache.list_entries().unwrap().is_empty());
    }

    #[test]
    fn clear_before_old_date_keeps_fresh_records() {
        let temp = TempDir::new().unwrap();
        let cache = FileCache::open(temp.path()).unwrap();
        cache.store("fresh", &1).unwrap();

        filecache(&temp)
            .args(["clear", "--before", "2000-01-01", "--yes"])
            .assert()
            .success()
            .stdout(predicate::str::contains("No records older than 2000-01-01"));

        assert!(cache.contains("fresh").unwrap());
    }

    #[test]
    fn key_matches_library() {
        let temp = TempDir::new().unwrap();
        let cache = FileCache::open(temp.path()).unwrap();
        let op = cache.wrap("square", |(n,): (u64,)| Ok::<_, Infallible>(n * n));
        let name = op.record_name(&(5,)).unwrap();

        filecache(&temp)
            .args(["key", "square", "5"])
            .assert()
            .success()
            .stdout(predicate::str::contains(name.as_str()))
            .stdout(predicate::str::contains("not cached"));

        op.call((5,)).unwrap();
        filecache(&temp)
            .args(["key", "square", "5"])
            .assert()
            .success()
            .stdout(predicate::str::contains("[cached]"));
    }

    #[test]
    fn config_path() {
        let temp = TempDir::new().unwrap();
        filecache(&temp)
            .args(["config", "path"])
            .assert()
            .success()
            .stdout(predicate::str::contains("config.toml"));
    }

    #[test]
    fn config_init_then_show() {
        let temp = TempDir::new().unwrap();
        filecache(&temp)
            .args(["config", "init"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Configuration initialized"));

        filecache(&temp)
            .args(["config", "set", "cache.lookup", "listing"])
            .assert()
            .success();

        filecache(&temp)
            .args(["config", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("lookup = \"listing\""));
    }

    #[test]
    fn invalid_config_fails_with_hint() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("config.toml"), "[cache\n").unwrap();

        filecache(&temp)
            .arg("list")
            .assert()
            .failure()
            .stderr(predicate::str::contains("Invalid configuration"))
            .stderr(predicate::str::contains("Hint:"));
    }
}
