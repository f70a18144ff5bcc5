use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use twinkv::store::{self, Engine, KvStore, StoreError};

const ENGINES: [Engine; 2] = [Engine::Channel, Engine::RwMutex];

fn open(engine: Engine, max_size: usize) -> Arc<dyn KvStore> {
    store::open(engine, max_size, 1)
}

#[tokio::test]
async fn bound_of_one_scenario() {
    for engine in ENGINES {
        let kv = open(engine, 1);
        let c = CancellationToken::new();

        assert_eq!(kv.set(&c, "a", "1".into()).await, Ok(()), "{engine}");
        assert_eq!(
            kv.set(&c, "b", "2".into()).await,
            Err(StoreError::MaxCapacity { max_size: 1 }),
            "{engine}"
        );
        assert_eq!(kv.get(&c, "a").await, Ok("1".to_string()), "{engine}");
        assert_eq!(kv.delete(&c, "a").await, Ok(()), "{engine}");
        assert_eq!(kv.get(&c, "a").await, Err(StoreError::NotFound("a".into())));
        assert_eq!(
            kv.update(&c, "a", "x".into()).await,
            Err(StoreError::NotFound("a".into()))
        );
        kv.shutdown().await;
    }
}

#[tokio::test]
async fn capacity_holds_at_the_bound() {
    const N: usize = 32;
    for engine in ENGINES {
        let kv = open(engine, N);
        let c = CancellationToken::new();

        for i in 0..N {
            kv.set(&c, &format!("k{i}"), i.to_string()).await.unwrap();
        }
        assert!(matches!(
            kv.set(&c, "overflow", "x".into()).await,
            Err(StoreError::MaxCapacity { .. })
        ));

        // Existing keys can still be rewritten either way.
        kv.set(&c, "k0", "again".into()).await.unwrap();
        kv.update(&c, "k1", "updated".into()).await.unwrap();
        assert_eq!(kv.len(&c).await, Ok(N));
        assert_eq!(kv.get(&c, "k0").await.unwrap(), "again");
        kv.shutdown().await;
    }
}

#[tokio::test]
async fn zero_capacity_rejects_every_insert() {
    for engine in ENGINES {
        let kv = open(engine, 0);
        let c = CancellationToken::new();
        assert!(matches!(
            kv.set(&c, "foo", "bar".into()).await,
            Err(StoreError::MaxCapacity { max_size: 0 })
        ));
        kv.shutdown().await;
    }
}

#[tokio::test]
async fn missing_keys_never_mutate() {
    for engine in ENGINES {
        let kv = open(engine, 4);
        let c = CancellationToken::new();
        kv.set(&c, "present", "v".into()).await.unwrap();
        kv.set(&c, "gone", "v".into()).await.unwrap();
        kv.delete(&c, "gone").await.unwrap();

        for key in ["never", "gone"] {
            assert!(matches!(kv.get(&c, key).await, Err(StoreError::NotFound(_))));
            assert!(matches!(
                kv.update(&c, key, "x".into()).await,
                Err(StoreError::NotFound(_))
            ));
            assert!(matches!(kv.delete(&c, key).await, Err(StoreError::NotFound(_))));
        }
        assert_eq!(kv.len(&c).await, Ok(1));
        assert_eq!(kv.get(&c, "present").await.unwrap(), "v");
        kv.shutdown().await;
    }
}

#[tokio::test]
async fn round_trips() {
    for engine in ENGINES {
        let kv = open(engine, 8);
        let c = CancellationToken::new();

        kv.set(&c, "k", "v1".into()).await.unwrap();
        assert_eq!(kv.get(&c, "k").await.unwrap(), "v1");

        kv.update(&c, "k", "v2".into()).await.unwrap();
        assert_eq!(kv.get(&c, "k").await.unwrap(), "v2");

        kv.set(&c, "empty", String::new()).await.unwrap();
        assert_eq!(kv.get(&c, "empty").await.unwrap(), "");

        kv.delete(&c, "k").await.unwrap();
        assert!(matches!(kv.get(&c, "k").await, Err(StoreError::NotFound(_))));
        kv.shutdown().await;
    }
}

#[derive(Debug, Clone)]
enum Op {
    Set(&'static str, &'static str),
    Update(&'static str, &'static str),
    Delete(&'static str),
    Get(&'static str),
}

async fn apply(kv: &dyn KvStore, ops: &[Op]) -> Vec<Result<Option<String>, StoreError>> {
    let c = CancellationToken::new();
    let mut out = Vec::new();
    for op in ops {
        let res = match op {
            Op::Set(k, v) => kv.set(&c, k, v.to_string()).await.map(|_| None),
            Op::Update(k, v) => kv.update(&c, k, v.to_string()).await.map(|_| None),
            Op::Delete(k) => kv.delete(&c, k).await.map(|_| None),
            Op::Get(k) => kv.get(&c, k).await.map(Some),
        };
        out.push(res);
    }
    out
}

#[tokio::test]
async fn engines_agree_on_sequential_workloads() {
    let ops = vec![
        Op::Get("a"),
        Op::Set("a", "1"),
        Op::Set("b", "2"),
        Op::Set("c", "3"),
        Op::Set("d", "4"),
        Op::Update("d", "4"),
        Op::Set("a", "10"),
        Op::Delete("b"),
        Op::Set("d", "4"),
        Op::Update("b", "x"),
        Op::Delete("b"),
        Op::Get("a"),
        Op::Set("e", "5"),
        Op::Update("c", "30"),
        Op::Get("c"),
        Op::Delete("a"),
        Op::Get("a"),
    ];
    let keys = ["a", "b", "c", "d", "e"];

    let actor = open(Engine::Channel, 3);
    let locked = open(Engine::RwMutex, 3);

    let actor_out = apply(actor.as_ref(), &ops).await;
    let locked_out = apply(locked.as_ref(), &ops).await;
    assert_eq!(actor_out, locked_out);

    let c = CancellationToken::new();
    for key in keys {
        assert_eq!(actor.get(&c, key).await, locked.get(&c, key).await, "{key}");
    }
    assert_eq!(actor.len(&c).await, locked.len(&c).await);
    actor.shutdown().await;
}

#[tokio::test]
async fn cancelled_calls_report_cancelled_and_do_nothing() {
    for engine in ENGINES {
        let kv = open(engine, 4);
        let live = CancellationToken::new();
        kv.set(&live, "k", "v".into()).await.unwrap();

        let dead = CancellationToken::new();
        dead.cancel();
        assert_eq!(kv.set(&dead, "new", "v".into()).await, Err(StoreError::Cancelled));
        assert_eq!(kv.update(&dead, "k", "x".into()).await, Err(StoreError::Cancelled));
        assert_eq!(kv.delete(&dead, "k").await, Err(StoreError::Cancelled));
        assert_eq!(kv.get(&dead, "k").await, Err(StoreError::Cancelled));

        assert_eq!(kv.len(&live).await, Ok(1));
        assert_eq!(kv.get(&live, "k").await.unwrap(), "v");
        kv.shutdown().await;
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_distinct_sets_respect_the_bound() {
    const BOUND: usize = 50;
    for engine in ENGINES {
        let kv = open(engine, BOUND);

        let mut tasks = Vec::new();
        for i in 0..200 {
            let kv = kv.clone();
            tasks.push(tokio::spawn(async move {
                let c = CancellationToken::new();
                kv.set(&c, &format!("k{i}"), "v".into()).await
            }));
        }

        let mut ok = 0;
        for task in tasks {
            match task.await.unwrap() {
                Ok(()) => ok += 1,
                Err(StoreError::MaxCapacity { .. }) => {}
                Err(e) => panic!("unexpected error from {engine}: {e}"),
            }
        }
        assert_eq!(ok, BOUND, "{engine}");
        let c = CancellationToken::new();
        assert_eq!(kv.len(&c).await, Ok(BOUND));
        kv.shutdown().await;
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_readers_complete() {
    for engine in ENGINES {
        let kv = open(engine, 16);
        let c = CancellationToken::new();
        kv.set(&c, "shared", "v".into()).await.unwrap();

        let mut tasks = Vec::new();
        for _ in 0..100 {
            let kv = kv.clone();
            tasks.push(tokio::spawn(async move {
                let c = CancellationToken::new();
                kv.get(&c, "shared").await
            }));
        }

        let all = async {
            for task in tasks {
                assert_eq!(task.await.unwrap().unwrap(), "v");
            }
        };
        tokio::time::timeout(Duration::from_secs(5), all)
            .await
            .expect("readers stalled");
        kv.shutdown().await;
    }
}
