//! Transactions and driver registration.

mod common;

use std::future::Future;
use std::pin::pin;
use std::task::{Context, Waker};

use asupersync::runtime::RuntimeBuilder;
use common::{DATABASE, User, namespace, user_row};
use sqlmeta::TransactionState;
use sqlmeta::prelude::*;
use sqlmeta_core::testing::MemoryDriver;

#[test]
fn insert_inside_transaction_commits_once() {
    let rt = RuntimeBuilder::current_thread()
        .build()
        .expect("create asupersync runtime");
    let cx = Cx::for_testing();
    let ns = namespace();
    let mut drivers = DriverRegistry::new();
    let driver = drivers.insert(DATABASE, MemoryDriver::new(DATABASE));
    driver.push_rows(vec![user_row(4, "grace")]);

    let mut user = User::default()
        .with("login", "grace")
        .unwrap()
        .with("password", "secret")
        .unwrap()
        .with("email", "grace@example.com")
        .unwrap();

    rt.block_on(async {
        let mut tx = Transaction::from_registry(&drivers, DATABASE).unwrap();
        assert_eq!(tx.state(), TransactionState::Unopened);
        match Insert::new(&mut user).run_on(&cx, &ns, &mut tx).await {
            Outcome::Ok(()) => {}
            other => panic!("insert failed: {other:?}"),
        }
        assert!(tx.is_open());
        match tx.commit(&cx).await {
            Outcome::Ok(()) => {}
            other => panic!("commit failed: {other:?}"),
        }
        assert_eq!(tx.state(), TransactionState::Closed);
    });

    assert_eq!(user.get("id"), Value::Int(4));
    let statements = driver.statements();
    assert_eq!(statements.len(), 3);
    assert_eq!(statements[0], "BEGIN");
    assert!(statements[1].starts_with("INSERT INTO \"user\" "));
    assert_eq!(statements[2], "COMMIT");
    assert_eq!(driver.acquired(), 1);
    assert_eq!(driver.outstanding(), 0);
}

#[test]
fn failed_commit_still_returns_the_connection() {
    let rt = RuntimeBuilder::current_thread()
        .build()
        .expect("create asupersync runtime");
    let cx = Cx::for_testing();
    let driver = MemoryDriver::new(DATABASE);
    driver.fail_on("COMMIT");

    rt.block_on(async {
        let mut tx = Transaction::new(&driver);
        assert!(matches!(tx.begin(&cx).await, Outcome::Ok(())));
        assert!(matches!(tx.commit(&cx).await, Outcome::Err(_)));
        assert!(matches!(
            tx.rollback(&cx).await,
            Outcome::Err(Error::TransactionNotStarted)
        ));
    });
    assert_eq!(driver.outstanding(), 0);
}

#[test]
fn abandoned_begin_returns_the_connection() {
    let cx = Cx::for_testing();
    let driver = MemoryDriver::new(DATABASE);
    driver.stall_on("BEGIN");
    let mut tx = Transaction::new(&driver);

    {
        let mut begin = pin!(tx.begin(&cx));
        let mut task = Context::from_waker(Waker::noop());
        assert!(begin.as_mut().poll(&mut task).is_pending());
        assert_eq!(driver.outstanding(), 1);
    }

    assert_eq!(driver.acquired(), 1);
    assert_eq!(driver.outstanding(), 0);
    assert_eq!(tx.state(), TransactionState::Unopened);
}

#[test]
fn registry_connects_by_url() {
    let rt = RuntimeBuilder::current_thread()
        .build()
        .expect("create asupersync runtime");
    let cx = Cx::for_testing();
    let mut drivers: DriverRegistry<MemoryDriver> = DriverRegistry::new();

    rt.block_on(async {
        match drivers
            .connect(&cx, "memory://app:pw@db.internal:1234/sample", None)
            .await
        {
            Outcome::Ok(driver) => assert_eq!(driver.database(), DATABASE),
            other => panic!("connect failed: {other:?}"),
        }
        assert_eq!(drivers.names(), vec![DATABASE]);

        match drivers.connect(&cx, "mysql://localhost/sample", None).await {
            Outcome::Err(Error::InvalidScheme { scheme }) => assert_eq!(scheme, "mysql"),
            other => panic!("unexpected outcome: {other:?}"),
        }

        assert!(matches!(
            drivers.disconnect(&cx, DATABASE).await,
            Outcome::Ok(())
        ));
    });

    assert!(matches!(
        drivers.get(DATABASE),
        Err(Error::DriverNotRegistered { .. })
    ));
}
